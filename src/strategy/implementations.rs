// src/strategy/implementations.rs

use crate::error::{Result, SimError};
use crate::model::store::{DemandMap, OrderPlan, StockLedger};
use crate::strategy::optimization::{CostParams, Problem, CAP_PENALTY_PER_UNIT};
use crate::strategy::traits::OrderOptimizer;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

// =========================================================================
// 1. Greedy Policy (closed form + proportional rationing)
// =========================================================================

/// Orders exactly each store's shortfall `max(demand - stock, 0)`.
///
/// Leftover stock is never reduced by ordering, so with a positive shortage
/// cost the shortfall is the per-store minimum of the cost function. When the
/// shortfalls together exceed `q_max` (and a unit of shortage is cheaper than
/// a unit of cap violation) the cap is split across stores in proportion to
/// their shortfall, with largest-remainder rounding.
#[derive(Debug, Clone, Default)]
pub struct GreedyOptimizer;

impl GreedyOptimizer {
    pub fn new() -> Self {
        Self
    }

    /// Order vector for `problem`, aligned with `problem.stores`.
    pub fn solve(problem: &Problem) -> Vec<u32> {
        let CostParams { alpha, q_max, .. } = problem.params;

        // Shortage is free: ordering anything can only add overage.
        if alpha == 0.0 {
            return vec![0; problem.len()];
        }

        let shortfall = problem.shortfall();

        if alpha > CAP_PENALTY_PER_UNIT {
            shortfall.into_iter().map(|q| q.min(q_max)).collect()
        } else {
            // Shares are taken from the raw shortfall; each stays <= q_max.
            ration(&shortfall, q_max)
        }
    }
}

impl OrderOptimizer for GreedyOptimizer {
    fn optimize(
        &mut self,
        demands: &DemandMap,
        stock: &StockLedger,
        params: &CostParams,
    ) -> Result<OrderPlan> {
        params.validate()?;
        let problem = Problem::new(demands, stock, *params);
        let orders = Self::solve(&problem);
        Ok(problem.stores.iter().copied().zip(orders).collect())
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}

/// Scales `wanted` down so it sums to at most `cap`.
///
/// Each entry gets `floor(cap * w / total)`; the units lost to rounding go to
/// the largest fractional parts, ties to the earlier entry.
pub fn ration(wanted: &[u32], cap: u32) -> Vec<u32> {
    let total: u64 = wanted.iter().map(|&w| u64::from(w)).sum();
    if total <= u64::from(cap) {
        return wanted.to_vec();
    }

    let cap = u64::from(cap);
    let mut shares: Vec<u32> = Vec::with_capacity(wanted.len());
    let mut remainders: Vec<(u64, usize)> = Vec::with_capacity(wanted.len());
    for (i, &w) in wanted.iter().enumerate() {
        let scaled = cap * u64::from(w);
        // scaled / total <= w, so this fits
        shares.push((scaled / total) as u32);
        remainders.push((scaled % total, i));
    }

    let assigned: u64 = shares.iter().map(|&s| u64::from(s)).sum();
    let leftover = (cap - assigned) as usize;

    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, i) in remainders.iter().take(leftover) {
        shares[i] += 1;
    }
    shares
}

// =========================================================================
// 2. Genetic Policy (population-based search)
// =========================================================================

/// Search parameters for [`GeneticOptimizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    pub population_size: usize,
    pub generations: usize,
    /// Probability that a pair of offspring is crossed over.
    pub crossover_prob: f64,
    /// Probability that an offspring is mutated.
    pub mutation_prob: f64,
    /// Per-gene resample probability inside a mutation.
    pub gene_mutation_prob: f64,
    pub tournament_size: usize,
    pub seed: u64,
    /// Put the greedy solution into the initial population.
    pub seed_with_greedy: bool,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 40,
            crossover_prob: 0.5,
            mutation_prob: 0.2,
            gene_mutation_prob: 0.2,
            tournament_size: 3,
            seed: 42,
            seed_with_greedy: true,
        }
    }
}

impl GeneticConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(SimError::Config("population_size must be at least 1".into()));
        }
        if self.tournament_size == 0 {
            return Err(SimError::Config("tournament_size must be at least 1".into()));
        }
        for (name, p) in [
            ("crossover_prob", self.crossover_prob),
            ("mutation_prob", self.mutation_prob),
            ("gene_mutation_prob", self.gene_mutation_prob),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(SimError::Config(format!("{name} must be within [0, 1], got {p}")));
            }
        }
        Ok(())
    }
}

/// Result of one genetic search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub orders: Vec<u32>,
    pub cost: f64,
    /// Best cost seen so far, recorded after initialization and after every
    /// generation. Never increases.
    pub best_cost_by_generation: Vec<f64>,
}

/// Evolutionary search over integer order vectors in `[0, q_max]^n`.
///
/// Tournament selection, uniform crossover and uniform-integer mutation; the
/// best individual ever evaluated is kept aside and returned. The generator is
/// owned by the optimizer and seeded from the config, so a run is reproducible.
#[derive(Debug, Clone)]
pub struct GeneticOptimizer {
    config: GeneticConfig,
    rng: ChaCha8Rng,
}

impl GeneticOptimizer {
    pub fn new(config: GeneticConfig) -> Result<Self> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self { config, rng })
    }

    pub fn with_rng(config: GeneticConfig, rng: ChaCha8Rng) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    pub fn search(&mut self, problem: &Problem) -> SearchOutcome {
        if problem.is_empty() {
            return SearchOutcome {
                orders: Vec::new(),
                cost: 0.0,
                best_cost_by_generation: vec![0.0],
            };
        }

        let cfg = &self.config;
        let rng = &mut self.rng;
        let n = problem.len();
        let q_max = problem.params.q_max;

        let mut population: Vec<Vec<u32>> = (0..cfg.population_size)
            .map(|_| (0..n).map(|_| rng.gen_range(0..=q_max)).collect())
            .collect();
        if cfg.seed_with_greedy {
            population[0] = GreedyOptimizer::solve(problem);
        }
        let mut fitness: Vec<f64> = population.iter().map(|ind| problem.cost(ind)).collect();

        let (mut best, mut best_cost) = fittest(&population, &fitness);
        let mut history = Vec::with_capacity(cfg.generations + 1);
        history.push(best_cost);

        for generation in 0..cfg.generations {
            let mut offspring: Vec<Vec<u32>> = (0..cfg.population_size)
                .map(|_| population[tournament(&fitness, cfg.tournament_size, rng)].clone())
                .collect();

            for pair in offspring.chunks_mut(2) {
                if let [a, b] = pair {
                    if rng.gen_bool(cfg.crossover_prob) {
                        uniform_crossover(a, b, rng);
                    }
                }
            }
            for individual in &mut offspring {
                if rng.gen_bool(cfg.mutation_prob) {
                    mutate_uniform(individual, q_max, cfg.gene_mutation_prob, rng);
                }
            }

            fitness = offspring.iter().map(|ind| problem.cost(ind)).collect();
            population = offspring;

            let (gen_best, gen_cost) = fittest(&population, &fitness);
            if gen_cost < best_cost {
                best = gen_best;
                best_cost = gen_cost;
            }
            history.push(best_cost);
            debug!(generation, best_cost, "genetic search step");
        }

        SearchOutcome {
            orders: best,
            cost: best_cost,
            best_cost_by_generation: history,
        }
    }
}

impl OrderOptimizer for GeneticOptimizer {
    fn optimize(
        &mut self,
        demands: &DemandMap,
        stock: &StockLedger,
        params: &CostParams,
    ) -> Result<OrderPlan> {
        params.validate()?;
        let problem = Problem::new(demands, stock, *params);
        let outcome = self.search(&problem);
        Ok(problem.stores.iter().copied().zip(outcome.orders).collect())
    }

    fn name(&self) -> &'static str {
        "genetic"
    }
}

fn fittest(population: &[Vec<u32>], fitness: &[f64]) -> (Vec<u32>, f64) {
    let mut best = 0;
    for (i, &cost) in fitness.iter().enumerate() {
        if cost < fitness[best] {
            best = i;
        }
    }
    (population[best].clone(), fitness[best])
}

/// Index of the cheapest of `size` uniformly drawn individuals.
fn tournament<R: Rng>(fitness: &[f64], size: usize, rng: &mut R) -> usize {
    let mut winner = rng.gen_range(0..fitness.len());
    for _ in 1..size {
        let challenger = rng.gen_range(0..fitness.len());
        if fitness[challenger] < fitness[winner] {
            winner = challenger;
        }
    }
    winner
}

fn uniform_crossover<R: Rng>(a: &mut [u32], b: &mut [u32], rng: &mut R) {
    for (x, y) in a.iter_mut().zip(b.iter_mut()) {
        if rng.gen_bool(0.5) {
            std::mem::swap(x, y);
        }
    }
}

fn mutate_uniform<R: Rng>(individual: &mut [u32], q_max: u32, gene_prob: f64, rng: &mut R) {
    for gene in individual.iter_mut() {
        if rng.gen_bool(gene_prob) {
            *gene = rng.gen_range(0..=q_max);
        }
    }
}

// =========================================================================
// 3. Selection from configuration
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    Greedy,
    #[default]
    Genetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OptimizerConfig {
    pub kind: OptimizerKind,
    pub genetic: GeneticConfig,
}

pub fn build_optimizer(config: &OptimizerConfig) -> Result<Box<dyn OrderOptimizer>> {
    Ok(match config.kind {
        OptimizerKind::Greedy => Box::new(GreedyOptimizer::new()),
        OptimizerKind::Genetic => Box::new(GeneticOptimizer::new(config.genetic.clone())?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::store::StoreId;

    fn plan_for(
        optimizer: &mut dyn OrderOptimizer,
        demand: &[(u32, u32)],
        stock: &[(u32, u32)],
        params: CostParams,
    ) -> OrderPlan {
        let demands: DemandMap = demand.iter().map(|&(s, d)| (StoreId(s), d)).collect();
        let stock = StockLedger::from_levels(stock.iter().map(|&(s, q)| (StoreId(s), q)));
        optimizer.optimize(&demands, &stock, &params).unwrap()
    }

    #[test]
    fn greedy_covers_shortfall_under_cap() {
        let params = CostParams::new(5.0, 1.0, 2000).unwrap();
        let plan = plan_for(
            &mut GreedyOptimizer::new(),
            &[(1, 700), (2, 700), (3, 100)],
            &[(1, 300), (2, 300), (3, 400)],
            params,
        );
        assert_eq!(plan[&StoreId(1)], 400);
        assert_eq!(plan[&StoreId(2)], 400);
        assert_eq!(plan[&StoreId(3)], 0);
    }

    #[test]
    fn greedy_rations_when_cap_is_tight() {
        let params = CostParams::new(5.0, 1.0, 100).unwrap();
        let plan = plan_for(
            &mut GreedyOptimizer::new(),
            &[(1, 300), (2, 100)],
            &[(1, 0), (2, 0)],
            params,
        );
        assert_eq!(plan[&StoreId(1)], 75);
        assert_eq!(plan[&StoreId(2)], 25);
    }

    #[test]
    fn rationing_uses_shortfall_beyond_the_cap() {
        // Both shortfalls exceed the cap on their own; the split still
        // follows their 3:1 ratio.
        let params = CostParams::new(5.0, 1.0, 400).unwrap();
        let plan = plan_for(
            &mut GreedyOptimizer::new(),
            &[(1, 1500), (2, 500)],
            &[(1, 300), (2, 100)],
            params,
        );
        assert_eq!(plan[&StoreId(1)], 300);
        assert_eq!(plan[&StoreId(2)], 100);
    }

    #[test]
    fn dear_shortage_orders_each_shortfall_up_to_the_cap() {
        let params = CostParams::new(2000.0, 1.0, 100).unwrap();
        let plan = plan_for(
            &mut GreedyOptimizer::new(),
            &[(1, 300), (2, 60)],
            &[(1, 0), (2, 0)],
            params,
        );
        assert_eq!(plan[&StoreId(1)], 100);
        assert_eq!(plan[&StoreId(2)], 60);
    }

    #[test]
    fn ration_hands_rounding_units_to_largest_remainders() {
        assert_eq!(ration(&[1, 1, 1], 2), vec![1, 1, 0]);
        assert_eq!(ration(&[10, 20, 30], 100), vec![10, 20, 30]);
        let shares = ration(&[7, 13, 5], 10);
        assert_eq!(shares.iter().sum::<u32>(), 10);
        assert!(shares.iter().zip([7, 13, 5]).all(|(s, w)| *s <= w));
    }

    #[test]
    fn zero_shortage_cost_orders_nothing() {
        let params = CostParams::new(0.0, 1.0, 100).unwrap();
        let plan = plan_for(&mut GreedyOptimizer::new(), &[(1, 50)], &[(1, 0)], params);
        assert_eq!(plan[&StoreId(1)], 0);
    }

    #[test]
    fn empty_inputs_give_empty_plan() {
        let params = CostParams::new(5.0, 1.0, 100).unwrap();
        let mut genetic = GeneticOptimizer::new(GeneticConfig::default()).unwrap();
        assert!(plan_for(&mut GreedyOptimizer::new(), &[], &[], params).is_empty());
        assert!(plan_for(&mut genetic, &[], &[], params).is_empty());
    }

    #[test]
    fn negative_cost_rejected_by_optimizer() {
        let bad = CostParams { alpha: -1.0, beta: 1.0, q_max: 10 };
        let mut greedy = GreedyOptimizer::new();
        let result = greedy.optimize(&DemandMap::new(), &StockLedger::new(), &bad);
        assert!(matches!(result, Err(SimError::CostParams(_))));
    }

    #[test]
    fn genetic_search_is_reproducible_and_monotone() {
        let config = GeneticConfig {
            seed_with_greedy: false,
            ..GeneticConfig::default()
        };
        let demands: DemandMap = [(StoreId(1), 120), (StoreId(2), 80), (StoreId(3), 40)]
            .into_iter()
            .collect();
        let stock = StockLedger::from_levels([(StoreId(1), 20), (StoreId(2), 10), (StoreId(3), 0)]);
        let problem = Problem::new(&demands, &stock, CostParams::new(5.0, 1.0, 200).unwrap());

        let first = GeneticOptimizer::new(config.clone()).unwrap().search(&problem);
        let second = GeneticOptimizer::new(config).unwrap().search(&problem);
        assert_eq!(first, second);

        assert!(first
            .best_cost_by_generation
            .windows(2)
            .all(|w| w[1] <= w[0]));
        assert!(first.orders.iter().all(|&q| q <= 200));
        assert_eq!(first.cost, problem.cost(&first.orders));
    }

    #[test]
    fn genetic_never_worse_than_greedy_when_seeded() {
        let demands: DemandMap = [(StoreId(1), 500), (StoreId(2), 900)].into_iter().collect();
        let stock = StockLedger::from_levels([(StoreId(1), 100), (StoreId(2), 50)]);
        let problem = Problem::new(&demands, &stock, CostParams::new(5.0, 1.0, 1000).unwrap());

        let greedy_cost = problem.cost(&GreedyOptimizer::solve(&problem));
        let outcome = GeneticOptimizer::new(GeneticConfig::default())
            .unwrap()
            .search(&problem);
        assert!(outcome.cost <= greedy_cost);
        assert!(outcome.orders.iter().all(|&q| q <= 1000));
    }

    #[test]
    fn injected_generator_drives_the_search() {
        let demands: DemandMap = [(StoreId(1), 300), (StoreId(2), 150)].into_iter().collect();
        let stock = StockLedger::from_levels([(StoreId(1), 20), (StoreId(2), 40)]);
        let problem = Problem::new(&demands, &stock, CostParams::new(5.0, 1.0, 250).unwrap());
        let config = GeneticConfig {
            seed: 1,
            seed_with_greedy: false,
            ..GeneticConfig::default()
        };

        let mut injected =
            GeneticOptimizer::with_rng(config.clone(), ChaCha8Rng::seed_from_u64(99)).unwrap();
        let mut reseeded = GeneticOptimizer::new(GeneticConfig { seed: 99, ..config }).unwrap();
        assert_eq!(injected.config().seed, 1);
        assert_eq!(injected.search(&problem), reseeded.search(&problem));
    }

    #[test]
    fn bad_probabilities_are_rejected() {
        let config = GeneticConfig {
            mutation_prob: 1.5,
            ..GeneticConfig::default()
        };
        assert!(GeneticOptimizer::new(config).is_err());
    }

    #[test]
    fn build_optimizer_follows_kind() {
        let mut config = OptimizerConfig::default();
        assert_eq!(build_optimizer(&config).unwrap().name(), "genetic");
        config.kind = OptimizerKind::Greedy;
        assert_eq!(build_optimizer(&config).unwrap().name(), "greedy");
    }
}
