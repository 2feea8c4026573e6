//! TOML run configuration.
//!
//! ```toml
//! [simulation]
//! initial_cash = 30000
//! roll_interval_months = 6
//! margin_breach_policy = "top_up"
//!
//! [data]
//! prices_csv = "SPY.csv"
//! rates_csv = "IRX.csv"
//! rate_units = "percent"
//!
//! [[data.benchmarks]]
//! name = "SSO"
//! csv = "SSO.csv"
//!
//! [carry]
//! reference_spot = 689.56
//! roll_cost_per_contract = 1.3
//! points = [
//!   { tenor_months = 3, net_debit = 747.0 },
//!   { tenor_months = 6, net_debit = 1232.0 },
//! ]
//! ```
//!
//! Relative paths are resolved against the config file's directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::carry::curve::{CarryCurve, CarryPoint};
use crate::carry::overlay::CarryOverlay;
use crate::core::error::{Result, SimError};
use crate::core::timeseries::{RateSeries, TimeSeries};
use crate::core::types::{Date, PriceSeries};
use crate::io::csv::{read_prices_file, read_rates_file, RateUnits};
use crate::simulation::benchmark::BenchmarkReport;
use crate::simulation::params::SimulationParameters;

/// Complete description of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub simulation: SimulationParameters,
    pub data: DataConfig,
    #[serde(default)]
    pub carry: Option<CarryConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Input files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    pub prices_csv: PathBuf,
    #[serde(default)]
    pub rates_csv: Option<PathBuf>,
    #[serde(default)]
    pub rate_units: RateUnits,
    /// Inclusive window applied to the price table.
    #[serde(default)]
    pub start: Option<Date>,
    #[serde(default)]
    pub end: Option<Date>,
    /// Extra instruments compared on an equal-cash basis.
    #[serde(default)]
    pub benchmarks: Vec<BenchmarkConfig>,
}

/// A named adjusted-close table, e.g. a leveraged ETF.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BenchmarkConfig {
    pub name: String,
    pub csv: PathBuf,
}

/// Carry overlay inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CarryConfig {
    /// Underlying price when the debits were quoted.
    pub reference_spot: f64,
    /// Tenor to read the carry at; defaults to the roll interval.
    #[serde(default)]
    pub target_tenor_months: Option<f64>,
    #[serde(default)]
    pub roll_cost_per_contract: f64,
    pub points: Vec<CarryPoint>,
}

/// Where results go.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default)]
    pub results_csv: Option<PathBuf>,
    #[serde(default)]
    pub json: bool,
}

impl RunConfig {
    /// Parse and validate a config from TOML text. Paths are left as written.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| SimError::parse(format!("invalid run config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file and resolve its relative paths.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        tracing::debug!(path = %path.display(), "loaded run config");
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.data.prices_csv);
        if let Some(rates) = self.data.rates_csv.as_mut() {
            resolve(rates);
        }
        for benchmark in &mut self.data.benchmarks {
            resolve(&mut benchmark.csv);
        }
        if let Some(out) = self.output.results_csv.as_mut() {
            resolve(out);
        }
    }

    /// Check parameters and the carry section.
    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        if let (Some(start), Some(end)) = (self.data.start, self.data.end) {
            if start > end {
                return Err(SimError::configuration(format!(
                    "data.start {start} is after data.end {end}"
                )));
            }
        }
        for (i, benchmark) in self.data.benchmarks.iter().enumerate() {
            let name = benchmark.name.trim();
            if name.is_empty() {
                return Err(SimError::configuration("data.benchmarks name must not be empty"));
            }
            if self.data.benchmarks[..i].iter().any(|b| b.name.trim() == name) {
                return Err(SimError::configuration(format!(
                    "duplicate benchmark name {name}"
                )));
            }
        }
        if let Some(carry) = &self.carry {
            if !carry.roll_cost_per_contract.is_finite() || carry.roll_cost_per_contract < 0.0 {
                return Err(SimError::configuration(
                    "carry.roll_cost_per_contract must be non-negative",
                ));
            }
            if let Some(tenor) = carry.target_tenor_months {
                if !tenor.is_finite() || tenor <= 0.0 {
                    return Err(SimError::configuration(
                        "carry.target_tenor_months must be positive",
                    ));
                }
            }
            self.carry_curve()?;
        }
        Ok(())
    }

    /// Load the price table, cut to the configured window.
    pub fn load_prices(&self) -> Result<PriceSeries> {
        let prices = read_prices_file(&self.data.prices_csv)?;
        match (self.data.start, self.data.end) {
            (None, None) => Ok(prices),
            (start, end) => prices.between(
                start.unwrap_or_else(|| prices.first_date()),
                end.unwrap_or_else(|| prices.last_date()),
            ),
        }
    }

    /// Load the rate table when one is configured.
    pub fn load_rates(&self) -> Result<Option<RateSeries>> {
        self.data
            .rates_csv
            .as_ref()
            .map(|path| read_rates_file(path, self.data.rate_units))
            .transpose()
    }

    /// Equal-cash reports for every configured benchmark over `dates`.
    ///
    /// A benchmark whose table shares no date with the run is unavailable.
    pub fn benchmark_reports(&self, dates: &[Date]) -> Result<Vec<BenchmarkReport>> {
        self.data
            .benchmarks
            .iter()
            .map(|benchmark| {
                let prices = read_prices_file(&benchmark.csv)?;
                let adj_close = TimeSeries::from_adj_close(&prices);
                BenchmarkReport::build(
                    benchmark.name.trim(),
                    dates,
                    &adj_close,
                    self.simulation.initial_cash,
                )
                .ok_or_else(|| SimError::data_unavailable(&benchmark.name))
            })
            .collect()
    }

    /// Carry curve quoted for this run's position size.
    pub fn carry_curve(&self) -> Result<Option<CarryCurve>> {
        self.carry
            .as_ref()
            .map(|carry| {
                CarryCurve::from_debits(
                    &carry.points,
                    carry.reference_spot,
                    self.simulation.contracts,
                    self.simulation.contract_multiplier,
                )
            })
            .transpose()
    }

    /// Overlay at the target tenor, or at the roll interval when none is set.
    pub fn carry_overlay(&self) -> Result<Option<CarryOverlay>> {
        let (Some(carry), Some(curve)) = (self.carry.as_ref(), self.carry_curve()?) else {
            return Ok(None);
        };
        let tenor = carry
            .target_tenor_months
            .unwrap_or(self.simulation.roll_interval_months as f64);
        Ok(Some(
            CarryOverlay::new(curve.annual_rate(tenor))
                .with_roll_friction(carry.roll_cost_per_contract, self.simulation.contracts),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::params::MarginBreachPolicy;

    const SAMPLE: &str = r#"
[simulation]
initial_cash = 50000
roll_interval_months = 3
margin_breach_policy = "liquidate"

[data]
prices_csv = "SPY.csv"
rate_units = "percent"
start = "2015-01-02"

[carry]
reference_spot = 689.56
roll_cost_per_contract = 1.3
points = [
  { tenor_months = 3, net_debit = 747.0 },
  { tenor_months = 6, net_debit = 1232.0 },
]
"#;

    #[test]
    fn test_parse_sample() {
        let config = RunConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.simulation.initial_cash, 50_000.0);
        assert_eq!(config.simulation.margin_pct, 0.25);
        assert_eq!(
            config.simulation.margin_breach_policy,
            MarginBreachPolicy::Liquidate
        );
        assert_eq!(config.data.rate_units, RateUnits::Percent);
        assert!(config.data.rates_csv.is_none());
        assert!(!config.output.json);

        let overlay = config.carry_overlay().unwrap().unwrap();
        let expected = 747.0 / 68_956.0 / 0.25;
        assert!((overlay.annual_carry_rate - expected).abs() < 1e-12);
        assert!((overlay.cost_per_roll - 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_field_is_parse_error() {
        let err = RunConfig::from_toml_str("[data]\nprices_csv = \"a.csv\"\nbogus = 1\n").unwrap_err();
        assert!(matches!(err, SimError::Parse { .. }));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let text = "[simulation]\nroll_interval_months = 0\n[data]\nprices_csv = \"a.csv\"\n";
        assert!(RunConfig::from_toml_str(text).unwrap_err().is_configuration());

        let text = "[data]\nprices_csv = \"a.csv\"\n[carry]\nreference_spot = 100.0\npoints = []\n";
        assert!(RunConfig::from_toml_str(text).unwrap_err().is_configuration());
    }

    #[test]
    fn test_benchmark_names_checked() {
        let twice = r#"
[data]
prices_csv = "SPY.csv"

[[data.benchmarks]]
name = "SSO"
csv = "SSO.csv"

[[data.benchmarks]]
name = "SSO"
csv = "other/SSO.csv"
"#;
        assert!(RunConfig::from_toml_str(twice).unwrap_err().is_configuration());

        let blank = "[data]\nprices_csv = \"a.csv\"\nbenchmarks = [{ name = \" \", csv = \"b.csv\" }]\n";
        assert!(RunConfig::from_toml_str(blank).unwrap_err().is_configuration());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(
            &path,
            "[data]\nprices_csv = \"SPY.csv\"\nrates_csv = \"/abs/IRX.csv\"\n\
             benchmarks = [{ name = \"UPRO\", csv = \"etf/UPRO.csv\" }]\n",
        )
        .unwrap();

        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.data.prices_csv, dir.path().join("SPY.csv"));
        assert_eq!(config.data.rates_csv, Some(PathBuf::from("/abs/IRX.csv")));
        assert_eq!(config.data.benchmarks[0].csv, dir.path().join("etf/UPRO.csv"));
    }
}
