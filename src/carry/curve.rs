//! Annualized carry curve built from observed option net debits.
//!
//! A synthetic long opened for tenor `T` costs a net debit (call premium minus
//! put premium). Dividing by the reference notional and by `T/12` gives an
//! annualized carry rate per tenor; rates for other roll frequencies are
//! linearly interpolated and clamped to the table's ends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};

/// One observed quote: net debit in dollars for a synthetic of the given tenor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarryPoint {
    pub tenor_months: u32,
    pub net_debit: f64,
}

/// Sorted (tenor, annual carry) curve.
#[derive(Debug, Clone, PartialEq)]
pub struct CarryCurve {
    points: Vec<(u32, f64)>,
}

impl CarryCurve {
    /// Build the curve from a debit table.
    ///
    /// # Arguments
    /// * `table` - Observed net debits by tenor
    /// * `reference_spot` - Underlying price when the debits were observed
    /// * `contracts` - Contracts the debits were quoted for
    /// * `multiplier` - Units per contract
    pub fn from_debits(
        table: &[CarryPoint],
        reference_spot: f64,
        contracts: u32,
        multiplier: u32,
    ) -> Result<Self> {
        if table.is_empty() {
            return Err(SimError::configuration("carry table is empty"));
        }
        if !reference_spot.is_finite() || reference_spot <= 0.0 {
            return Err(SimError::configuration(format!(
                "carry reference spot must be positive, got {reference_spot}"
            )));
        }
        if contracts == 0 || multiplier == 0 {
            return Err(SimError::configuration(
                "carry contracts and multiplier must be positive",
            ));
        }

        let reference_notional = reference_spot * multiplier as f64 * contracts as f64;
        let mut by_tenor = BTreeMap::new();
        for point in table {
            if point.tenor_months == 0 {
                return Err(SimError::configuration("carry tenor must be at least one month"));
            }
            if !point.net_debit.is_finite() {
                return Err(SimError::configuration(format!(
                    "carry debit for {}m is not a number",
                    point.tenor_months
                )));
            }
            let debit_fraction = point.net_debit / reference_notional;
            let annual = debit_fraction / (point.tenor_months as f64 / 12.0);
            if by_tenor.insert(point.tenor_months, annual).is_some() {
                return Err(SimError::configuration(format!(
                    "duplicate carry tenor {}m",
                    point.tenor_months
                )));
            }
        }

        Ok(Self {
            points: by_tenor.into_iter().collect(),
        })
    }

    /// Build from a `{tenor_months: net_debit}` map.
    pub fn from_map(
        table: &BTreeMap<u32, f64>,
        reference_spot: f64,
        contracts: u32,
        multiplier: u32,
    ) -> Result<Self> {
        let points: Vec<CarryPoint> = table
            .iter()
            .map(|(&tenor_months, &net_debit)| CarryPoint {
                tenor_months,
                net_debit,
            })
            .collect();
        Self::from_debits(&points, reference_spot, contracts, multiplier)
    }

    /// The (tenor, annual carry) knots in tenor order.
    #[inline]
    pub fn points(&self) -> &[(u32, f64)] {
        &self.points
    }

    /// Annualized carry for an arbitrary tenor in months.
    pub fn annual_rate(&self, tenor_months: f64) -> f64 {
        let (first_tenor, first_rate) = self.points[0];
        let (last_tenor, last_rate) = self.points[self.points.len() - 1];

        if tenor_months <= first_tenor as f64 {
            return first_rate;
        }
        if tenor_months >= last_tenor as f64 {
            return last_rate;
        }

        for pair in self.points.windows(2) {
            let (t0, r0) = pair[0];
            let (t1, r1) = pair[1];
            let (t0f, t1f) = (t0 as f64, t1 as f64);
            if tenor_months == t0f {
                return r0;
            }
            if tenor_months < t1f {
                let w = (tenor_months - t0f) / (t1f - t0f);
                return r0 + w * (r1 - r0);
            }
        }
        last_rate
    }
}
