use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use replenish_sim::io::demand::{generate_sales_history, load_sales_history, write_sales_history};
use replenish_sim::io::forecast::{validate_forecast, Forecaster, HistoricalForecaster};
use replenish_sim::io::reporting;
use replenish_sim::io::stock::{generate_initial_stock, load_initial_stock, write_initial_stock};
use replenish_sim::strategy::implementations::{build_optimizer, OptimizerKind};
use replenish_sim::simulation::engine::DAYS_PER_WEEK;
use replenish_sim::{DemandMap, InventorySimulation, Result, SimError, SimulationConfig, StoreId};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Retail replenishment simulator
#[derive(Parser, Debug)]
#[command(name = "replenish")]
#[command(about = "Forecast, optimize and simulate weekly store replenishment")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full weekly simulation and write the results table
    Simulate {
        /// TOML file with simulation settings (defaults when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Initial stock table (Store,InitialStock)
        #[arg(long, default_value = "initial_stock.csv")]
        initial_stock: PathBuf,
        /// Sales history the forecaster is trained on (Store,Date,Sales)
        #[arg(long, default_value = "sales_history.csv")]
        sales_history: PathBuf,
        #[arg(long, default_value = "simulation_results.csv")]
        output: PathBuf,
        /// Override the optimizer seed
        #[arg(long)]
        seed: Option<u64>,
        /// Use the closed-form optimizer instead of the genetic search
        #[arg(long, default_value_t = false)]
        greedy: bool,
    },
    /// Print a store's daily demand forecast
    Forecast {
        #[arg(long, default_value = "sales_history.csv")]
        sales_history: PathBuf,
        #[arg(long)]
        store: u32,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long, default_value_t = 14)]
        horizon: u32,
    },
    /// Optimize one week of orders against the initial stock
    Optimize {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = "initial_stock.csv")]
        initial_stock: PathBuf,
        #[arg(long, default_value = "sales_history.csv")]
        sales_history: PathBuf,
        /// First day of the week to plan for
        #[arg(long)]
        week_start: NaiveDate,
    },
    /// Generate a random initial stock table for the stores in a sales history
    GenStock {
        #[arg(long, default_value = "sales_history.csv")]
        sales_history: PathBuf,
        #[arg(long, default_value_t = 300)]
        low: u32,
        #[arg(long, default_value_t = 500)]
        high: u32,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value = "initial_stock.csv")]
        output: PathBuf,
    },
    /// Generate a synthetic daily sales history
    GenHistory {
        #[arg(long, default_value_t = 10)]
        stores: u32,
        #[arg(long, default_value = "2024-01-01")]
        start: NaiveDate,
        #[arg(long, default_value_t = 365)]
        days: u32,
        #[arg(long, default_value_t = 4000.0)]
        mean: f64,
        #[arg(long, default_value_t = 800.0)]
        std_dev: f64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value = "sales_history.csv")]
        output: PathBuf,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    if let Err(e) = run(Cli::parse()) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    match path {
        Some(path) => SimulationConfig::from_toml_file(path),
        None => Ok(SimulationConfig::default()),
    }
}

fn train_forecaster(sales_history: &Path) -> Result<HistoricalForecaster> {
    let history = load_sales_history(sales_history)?;
    tracing::info!(rows = history.len(), path = %sales_history.display(), "sales history loaded");
    Ok(HistoricalForecaster::fit(&history)?)
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Simulate {
            config,
            initial_stock,
            sales_history,
            output,
            seed,
            greedy,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(seed) = seed {
                config.optimizer.genetic.seed = seed;
            }
            if greedy {
                config.optimizer.kind = OptimizerKind::Greedy;
            }

            let stock = load_initial_stock(&initial_stock)?;
            let forecaster = train_forecaster(&sales_history)?;
            let mut sim = InventorySimulation::new(config, stock, forecaster)?;
            sim.run()?;

            // Results are only persisted for a complete run.
            reporting::write_simulation_log(&output, &sim.history)?;

            println!("\n=== Run Summary ===");
            for record in &sim.history {
                println!(
                    "Week {}: cost=${:.2}, fill_rate={:.3}",
                    record.week_start, record.total_cost, record.fill_rate
                );
            }
            println!("Total cost: ${:.2}", sim.total_cost());
            println!("Mean fill rate: {:.3}", sim.mean_fill_rate());
        }
        Command::Forecast {
            sales_history,
            store,
            start,
            horizon,
        } => {
            let forecaster = train_forecaster(&sales_history)?;
            let values = forecaster.predict(StoreId(store), start, horizon)?;
            for (offset, value) in values.iter().enumerate() {
                let day = start + chrono::Duration::days(offset as i64);
                println!("{day}: {value:.1}");
            }
        }
        Command::Optimize {
            config,
            initial_stock,
            sales_history,
            week_start,
        } => {
            let config = load_config(config.as_deref())?;
            let stock = load_initial_stock(&initial_stock)?;
            let forecaster = train_forecaster(&sales_history)?;

            let mut demands = DemandMap::new();
            for store in stock.stores() {
                let daily = forecaster.predict(store, week_start, DAYS_PER_WEEK)?;
                validate_forecast(store, &daily, DAYS_PER_WEEK)?;
                demands.insert(store, daily.iter().sum::<f64>() as u32);
            }

            let mut optimizer = build_optimizer(&config.optimizer)?;
            let plan = optimizer.optimize(&demands, &stock, &config.cost_params())?;

            println!("store,stock,demand,qty_to_order");
            for (store, qty) in &plan {
                println!("{},{},{},{}", store, stock.level(*store), demands[store], qty);
            }
        }
        Command::GenStock {
            sales_history,
            low,
            high,
            seed,
            output,
        } => {
            let history = load_sales_history(&sales_history)?;
            let stores: Vec<StoreId> = history
                .iter()
                .map(|r| r.store)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            if stores.is_empty() {
                return Err(SimError::Config(format!(
                    "no stores found in {}",
                    sales_history.display()
                )));
            }
            let rows = generate_initial_stock(&stores, low, high, seed)?;
            write_initial_stock(BufWriter::new(File::create(&output)?), &rows)?;
            println!("Initial stock for {} stores written to {}", rows.len(), output.display());
        }
        Command::GenHistory {
            stores,
            start,
            days,
            mean,
            std_dev,
            seed,
            output,
        } => {
            let ids: Vec<StoreId> = (1..=stores).map(StoreId).collect();
            let history = generate_sales_history(&ids, start, days, mean, std_dev, seed)?;
            write_sales_history(BufWriter::new(File::create(&output)?), &history)?;
            println!("{} sales rows written to {}", history.len(), output.display());
        }
    }
    Ok(())
}
