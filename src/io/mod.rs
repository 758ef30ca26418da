pub mod demand;
pub mod forecast;
pub mod reporting;
pub mod stock;
