//! Tabular input and output for synthsim.

pub mod csv;

pub use self::csv::{
    parse_date, read_prices, read_prices_file, read_rates, read_rates_file, read_results,
    read_results_file, write_results, write_results_file, RateUnits,
};
