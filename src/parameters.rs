//! The parameters describing a wine production plan.
//!
//! A [`Parameters`] object holds everything needed to build the optimisation problem. It is
//! filled in either from the interactive prompts or from a TOML file and is not modified after
//! that.
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Whether a wine is a standard or a premium wine
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum WineKind {
    /// Produced without any activation decision
    Standard,
    /// Production requires paying a fixed activation cost
    Premium,
}

/// All of the user-supplied data for one production plan.
///
/// Coefficient vectors `revenue`, `saturation` and `variable_cost` have one entry per wine, with
/// the standard wines first followed by the premium wines. Premium wines reuse these vectors and
/// additionally have an entry in `fixed_cost`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Parameters {
    /// Number of standard wines (N)
    pub num_standard: usize,
    /// Number of premium wines (M)
    pub num_premium: usize,
    /// Linear revenue coefficients (A)
    pub revenue: Vec<f64>,
    /// Quadratic market saturation coefficients (B)
    pub saturation: Vec<f64>,
    /// Variable cost per unit (C)
    pub variable_cost: Vec<f64>,
    /// Fixed activation cost for each premium wine (F)
    #[serde(default)]
    pub fixed_cost: Vec<f64>,
    /// Availability of each resource (R)
    #[serde(default)]
    pub availability: Vec<f64>,
    /// Consumption rate of each resource by each wine (r), one row per resource
    #[serde(default)]
    pub consumption: Vec<Vec<f64>>,
    /// Big-M constant linking premium production to activation
    pub big_m: f64,
}

/// A disagreement between the declared counts and the supplied coefficient collections
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    /// A per-item vector has the wrong number of entries
    #[error("{name} has {actual} entries, but {expected} were expected")]
    Length {
        /// Name of the offending collection
        name: String,
        /// Length implied by the declared counts
        expected: usize,
        /// Length actually supplied
        actual: usize,
    },
}

impl Parameters {
    /// Total number of wines (N + M)
    pub fn num_wines(&self) -> usize {
        self.num_standard + self.num_premium
    }

    /// Number of resource types (K)
    pub fn num_resources(&self) -> usize {
        self.availability.len()
    }

    /// Whether the wine with the given global index is standard or premium
    pub fn wine_kind(&self, wine: usize) -> WineKind {
        if wine < self.num_standard {
            WineKind::Standard
        } else {
            WineKind::Premium
        }
    }

    /// Global wine index of the given premium wine
    pub fn premium_wine_index(&self, premium: usize) -> usize {
        self.num_standard + premium
    }

    /// Check that every collection agrees with the declared counts.
    pub fn check_shape(&self) -> Result<(), ShapeError> {
        let num_wines = self.num_wines();
        check_length("revenue", num_wines, self.revenue.len())?;
        check_length("saturation", num_wines, self.saturation.len())?;
        check_length("variable_cost", num_wines, self.variable_cost.len())?;
        check_length("fixed_cost", self.num_premium, self.fixed_cost.len())?;
        check_length("consumption", self.num_resources(), self.consumption.len())?;
        for (k, row) in self.consumption.iter().enumerate() {
            check_length(&format!("consumption[{k}]"), num_wines, row.len())?;
        }

        Ok(())
    }

    /// The largest quantity of a wine that could sensibly be produced.
    ///
    /// This is the tightest of the resource limits (`R_k / r_k,i` for every resource the wine
    /// consumes) and the point beyond which market saturation makes more production
    /// unprofitable. `None` if neither gives a finite limit.
    pub fn production_cap(&self, wine: usize) -> Option<f64> {
        let resource_caps = self
            .availability
            .iter()
            .zip(&self.consumption)
            .filter(|(_, row)| row[wine] > 0.0)
            .map(|(available, row)| available / row[wine]);

        let saturation = self.saturation[wine];
        let margin = self.revenue[wine] - self.variable_cost[wine];
        let saturation_cap = (saturation > 0.0).then(|| (margin / (2.0 * saturation)).max(0.0));

        resource_caps.chain(saturation_cap).reduce(f64::min)
    }

    /// Indices of premium wines for which Big-M may cut off production.
    ///
    /// Big-M is used as given when building the model, so a value that is too small silently
    /// limits how much of a premium wine can be made.
    pub fn premium_wines_limited_by_big_m(&self) -> Vec<usize> {
        (0..self.num_premium)
            .filter(|&j| {
                self.production_cap(self.premium_wine_index(j))
                    .is_none_or(|cap| cap > self.big_m)
            })
            .collect_vec()
    }
}

fn check_length(name: &str, expected: usize, actual: usize) -> Result<(), ShapeError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ShapeError::Length {
            name: name.to_string(),
            expected,
            actual,
        })
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} wines ({} standard + {} premium), {} resources, Big-M = {}",
            self.num_wines(),
            self.num_standard,
            self.num_premium,
            self.num_resources(),
            self.big_m
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{single_wine, wine_portfolio};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_check_shape_ok(wine_portfolio: Parameters) {
        wine_portfolio.check_shape().unwrap();
    }

    #[rstest]
    fn test_check_shape_revenue(mut wine_portfolio: Parameters) {
        wine_portfolio.revenue.pop();
        assert_eq!(
            wine_portfolio.check_shape().unwrap_err().to_string(),
            "revenue has 2 entries, but 3 were expected"
        );
    }

    #[rstest]
    fn test_check_shape_fixed_cost(mut wine_portfolio: Parameters) {
        wine_portfolio.fixed_cost.push(1.0);
        assert_eq!(
            wine_portfolio.check_shape(),
            Err(ShapeError::Length {
                name: "fixed_cost".into(),
                expected: 1,
                actual: 2
            })
        );
    }

    #[rstest]
    fn test_check_shape_consumption_rows(mut wine_portfolio: Parameters) {
        wine_portfolio.consumption.pop();
        assert_eq!(
            wine_portfolio.check_shape().unwrap_err().to_string(),
            "consumption has 1 entries, but 2 were expected"
        );
    }

    #[rstest]
    fn test_check_shape_consumption_columns(mut wine_portfolio: Parameters) {
        wine_portfolio.consumption[1].push(0.0);
        assert_eq!(
            wine_portfolio.check_shape().unwrap_err().to_string(),
            "consumption[1] has 4 entries, but 3 were expected"
        );
    }

    #[rstest]
    fn test_wine_kind(wine_portfolio: Parameters) {
        assert_eq!(wine_portfolio.wine_kind(0), WineKind::Standard);
        assert_eq!(wine_portfolio.wine_kind(1), WineKind::Standard);
        assert_eq!(wine_portfolio.wine_kind(2), WineKind::Premium);
        assert_eq!(wine_portfolio.premium_wine_index(0), 2);
    }

    #[rstest]
    fn test_production_cap(single_wine: Parameters) {
        // Saturation peak is (10 - 2) / 0.2 = 40, below the resource limit of 100
        assert_approx_eq!(f64, single_wine.production_cap(0).unwrap(), 40.0, epsilon = 1e-9);
    }

    #[rstest]
    fn test_production_cap_resource_limited(mut single_wine: Parameters) {
        single_wine.consumption[0][0] = 4.0;
        assert_approx_eq!(f64, single_wine.production_cap(0).unwrap(), 25.0);
    }

    #[rstest]
    fn test_production_cap_unbounded(mut single_wine: Parameters) {
        single_wine.saturation[0] = 0.0;
        single_wine.consumption[0][0] = 0.0;
        assert!(single_wine.production_cap(0).is_none());
    }

    #[rstest]
    fn test_premium_wines_limited_by_big_m(mut wine_portfolio: Parameters) {
        assert!(wine_portfolio.premium_wines_limited_by_big_m().is_empty());

        wine_portfolio.big_m = 5.0;
        assert_eq!(wine_portfolio.premium_wines_limited_by_big_m(), [0]);
    }

    #[test]
    fn test_deserialise_rejects_unknown_fields() {
        let toml = "num_standard = 1\nnum_premium = 0\nrevenue = [1.0]\nsaturation = [0.0]\n\
                    variable_cost = [0.0]\nbig_m = 1.0\nbig_n = 2.0\n";
        assert!(toml::from_str::<Parameters>(toml).is_err());
    }
}
