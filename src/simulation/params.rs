//! Simulation parameters and their validation.

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};

/// What happens when account equity falls below the margin requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginBreachPolicy {
    /// Inject the shortfall as fresh cash.
    #[default]
    TopUp,
    /// Close the position and freeze the account.
    Liquidate,
}

/// Configuration of one synthetic funding simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// Starting cash in the margin account.
    pub initial_cash: f64,
    /// Number of synthetic contracts held.
    pub contracts: u32,
    /// Units of underlying per contract.
    pub contract_multiplier: u32,
    /// Margin requirement as a fraction of notional.
    pub margin_pct: f64,
    /// Annual risk-free rate used when no rate series is supplied.
    pub fallback_annual_rate: f64,
    /// Roll frequency in calendar months.
    pub roll_interval_months: u32,
    /// Annual dividend yield the synthetic does not receive.
    pub annual_dividend_drag: f64,
    /// Breach handling.
    pub margin_breach_policy: MarginBreachPolicy,
    /// Cap on cumulative top-ups; exceeding it forces liquidation.
    pub max_total_topup: Option<f64>,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            initial_cash: 30_000.0,
            contracts: 1,
            contract_multiplier: 100,
            margin_pct: 0.25,
            fallback_annual_rate: 0.045,
            roll_interval_months: 6,
            annual_dividend_drag: 0.012,
            margin_breach_policy: MarginBreachPolicy::TopUp,
            max_total_topup: None,
        }
    }
}

impl SimulationParameters {
    /// Units of underlying controlled by the whole position.
    #[inline]
    pub fn position_units(&self) -> f64 {
        self.contracts as f64 * self.contract_multiplier as f64
    }

    /// Set the breach policy.
    pub fn with_policy(mut self, policy: MarginBreachPolicy) -> Self {
        self.margin_breach_policy = policy;
        self
    }

    /// Set the top-up cap.
    pub fn with_max_total_topup(mut self, cap: f64) -> Self {
        self.max_total_topup = Some(cap);
        self
    }

    /// Check every parameter before a run starts.
    pub fn validate(&self) -> Result<()> {
        if !self.initial_cash.is_finite() || self.initial_cash <= 0.0 {
            return Err(SimError::invalid_input(format!(
                "initial_cash must be positive, got {}",
                self.initial_cash
            )));
        }
        if self.contracts == 0 {
            return Err(SimError::invalid_input("contracts must be a positive integer"));
        }
        if self.contract_multiplier == 0 {
            return Err(SimError::invalid_input(
                "contract_multiplier must be a positive integer",
            ));
        }
        if self.margin_pct.is_nan() || self.margin_pct <= 0.0 || self.margin_pct > 1.0 {
            return Err(SimError::invalid_input(format!(
                "margin_pct must be in (0, 1], got {}",
                self.margin_pct
            )));
        }

        if self.roll_interval_months == 0 {
            return Err(SimError::configuration("roll_interval_months must be at least 1"));
        }
        if let Some(cap) = self.max_total_topup {
            if !cap.is_finite() || cap < 0.0 {
                return Err(SimError::configuration(format!(
                    "max_total_topup must be non-negative, got {cap}"
                )));
            }
        }
        if !self.annual_dividend_drag.is_finite() || self.annual_dividend_drag < 0.0 {
            return Err(SimError::configuration(format!(
                "annual_dividend_drag must be non-negative, got {}",
                self.annual_dividend_drag
            )));
        }
        validate_annual_rate("fallback_annual_rate", self.fallback_annual_rate)?;

        Ok(())
    }
}

/// Annual rates must stay above -100% for the daily conversion to be real.
pub(crate) fn validate_annual_rate(name: &str, rate: f64) -> Result<()> {
    if !rate.is_finite() || rate <= -1.0 {
        return Err(SimError::configuration(format!(
            "{name} must be a finite rate above -100%, got {rate}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SimulationParameters::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_input_cases() {
        let cases = [
            SimulationParameters { initial_cash: 0.0, ..Default::default() },
            SimulationParameters { contracts: 0, ..Default::default() },
            SimulationParameters { contract_multiplier: 0, ..Default::default() },
            SimulationParameters { margin_pct: 0.0, ..Default::default() },
            SimulationParameters { margin_pct: 1.01, ..Default::default() },
        ];
        for params in cases {
            assert!(params.validate().unwrap_err().is_invalid_input(), "{params:?}");
        }
    }

    #[test]
    fn test_configuration_cases() {
        let cases = [
            SimulationParameters { roll_interval_months: 0, ..Default::default() },
            SimulationParameters { max_total_topup: Some(-1.0), ..Default::default() },
            SimulationParameters { annual_dividend_drag: -0.01, ..Default::default() },
            SimulationParameters { fallback_annual_rate: -1.0, ..Default::default() },
        ];
        for params in cases {
            assert!(params.validate().unwrap_err().is_configuration(), "{params:?}");
        }
    }

    #[test]
    fn test_full_margin_is_allowed() {
        let params = SimulationParameters { margin_pct: 1.0, ..Default::default() };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_policy_serde_names() {
        let json = serde_json::to_string(&MarginBreachPolicy::TopUp).unwrap();
        assert_eq!(json, "\"top_up\"");
        let parsed: MarginBreachPolicy = serde_json::from_str("\"liquidate\"").unwrap();
        assert_eq!(parsed, MarginBreachPolicy::Liquidate);
    }
}
