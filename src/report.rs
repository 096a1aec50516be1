//! The report printed after a plan has been solved.
use crate::model::WineVariables;
use crate::parameters::{Parameters, WineKind};
use crate::solver::Solution;
use std::fmt;

/// Width of the separator lines in the report
const RULE_WIDTH: usize = 70;

/// The production of one wine
#[derive(Debug, Clone, PartialEq)]
pub struct WineLine {
    /// Whether the wine is standard or premium
    pub kind: WineKind,
    /// Units produced
    pub quantity: u64,
    /// Revenue before saturation (A*X)
    pub revenue: f64,
    /// Market saturation penalty (B*X^2)
    pub saturation: f64,
    /// Variable costs (C*X)
    pub variable_cost: f64,
}

impl WineLine {
    /// Contribution to profit before fixed costs
    pub fn net_contribution(&self) -> f64 {
        self.revenue - self.saturation - self.variable_cost
    }
}

/// The activation decision for one premium wine
#[derive(Debug, Clone, PartialEq)]
pub struct PremiumLine {
    /// Global index of the wine
    pub wine: usize,
    /// Whether production of the wine was activated
    pub active: bool,
    /// Fixed cost incurred (zero unless active)
    pub fixed_cost: f64,
}

/// How much of one resource is used
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceLine {
    /// Amount consumed by production
    pub used: f64,
    /// Amount available
    pub available: f64,
}

impl ResourceLine {
    /// Amount left over
    pub fn remaining(&self) -> f64 {
        self.available - self.used
    }

    /// Percentage of the resource used (zero if none is available)
    pub fn percent_used(&self) -> f64 {
        if self.available > 0.0 {
            self.used / self.available * 100.0
        } else {
            0.0
        }
    }
}

/// The profit breakdown and resource utilisation of a solved plan
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Name of the backend which solved the problem
    pub backend: &'static str,
    /// One line per wine
    pub wines: Vec<WineLine>,
    /// One line per premium wine
    pub premium: Vec<PremiumLine>,
    /// One line per resource
    pub resources: Vec<ResourceLine>,
}

impl Report {
    /// Build the report for a solution.
    ///
    /// Quantities and activation decisions are rounded to whole numbers before anything is
    /// calculated from them.
    pub fn new(params: &Parameters, variables: &WineVariables, solution: &Solution) -> Self {
        let quantities: Vec<u64> = variables
            .quantities
            .iter()
            .map(|&var| solution.value(var).round().max(0.0) as u64)
            .collect();

        let wines = quantities
            .iter()
            .enumerate()
            .map(|(i, &quantity)| {
                let x = quantity as f64;
                WineLine {
                    kind: params.wine_kind(i),
                    quantity,
                    revenue: params.revenue[i] * x,
                    saturation: params.saturation[i] * x * x,
                    variable_cost: params.variable_cost[i] * x,
                }
            })
            .collect();

        let premium = variables
            .activations
            .iter()
            .zip(&params.fixed_cost)
            .enumerate()
            .map(|(j, (&var, &fixed_cost))| {
                let active = solution.value(var).round() >= 1.0;
                PremiumLine {
                    wine: params.premium_wine_index(j),
                    active,
                    fixed_cost: if active { fixed_cost } else { 0.0 },
                }
            })
            .collect();

        let resources = params
            .consumption
            .iter()
            .zip(&params.availability)
            .map(|(row, &available)| ResourceLine {
                used: row
                    .iter()
                    .zip(&quantities)
                    .map(|(rate, &quantity)| rate * quantity as f64)
                    .sum(),
                available,
            })
            .collect();

        Self {
            backend: solution.backend(),
            wines,
            premium,
            resources,
        }
    }

    /// Total revenue before saturation
    pub fn total_revenue(&self) -> f64 {
        self.wines.iter().map(|wine| wine.revenue).sum()
    }

    /// Total market saturation penalty
    pub fn total_saturation(&self) -> f64 {
        self.wines.iter().map(|wine| wine.saturation).sum()
    }

    /// Total variable costs
    pub fn total_variable_cost(&self) -> f64 {
        self.wines.iter().map(|wine| wine.variable_cost).sum()
    }

    /// Total fixed costs of activated premium wines
    pub fn total_fixed_cost(&self) -> f64 {
        self.premium.iter().map(|line| line.fixed_cost).sum()
    }

    /// Net profit, i.e. the objective value of the rounded solution
    pub fn profit(&self) -> f64 {
        self.wines
            .iter()
            .map(WineLine::net_contribution)
            .sum::<f64>()
            - self.total_fixed_cost()
    }
}

/// Write a line of the given character across the report
fn rule(f: &mut fmt::Formatter<'_>, c: char) -> fmt::Result {
    writeln!(f, "{}", c.to_string().repeat(RULE_WIDTH))
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        rule(f, '=')?;
        writeln!(f, "OPTIMAL SOLUTION FOUND")?;
        rule(f, '=')?;
        writeln!(f, "Solver: {}", self.backend)?;
        writeln!(f, "Maximum profit: {:.2}", self.profit())?;

        writeln!(f)?;
        rule(f, '-')?;
        writeln!(f, "PRODUCTION QUANTITIES:")?;
        rule(f, '-')?;
        for (i, wine) in self.wines.iter().enumerate() {
            writeln!(f, "\nWine {} ({}):", i + 1, wine.kind)?;
            writeln!(f, "  Production quantity:    {} units", wine.quantity)?;
            writeln!(f, "  Revenue (A*X):          {:>12.2}", wine.revenue)?;
            writeln!(f, "  Saturation (B*X^2):     {:>12.2}", wine.saturation)?;
            writeln!(f, "  Variable costs (C*X):   {:>12.2}", wine.variable_cost)?;
            writeln!(f, "  Net contribution:       {:>12.2}", wine.net_contribution())?;
        }

        if !self.premium.is_empty() {
            writeln!(f)?;
            rule(f, '-')?;
            writeln!(f, "PREMIUM WINE DECISIONS:")?;
            rule(f, '-')?;
            for (j, line) in self.premium.iter().enumerate() {
                let status = if line.active {
                    "PRODUCING"
                } else {
                    "NOT PRODUCING"
                };
                writeln!(f, "\nPremium wine {}:", line.wine + 1)?;
                writeln!(f, "  Decision Y[{}] = {} ({status})", j + 1, u8::from(line.active))?;
                writeln!(
                    f,
                    "  Quantity X[{}] = {} units",
                    line.wine + 1,
                    self.wines[line.wine].quantity
                )?;
                if line.active {
                    writeln!(f, "  Fixed cost (F*Y):       {:>12.2}", line.fixed_cost)?;
                }
            }
        }

        writeln!(f)?;
        rule(f, '=')?;
        writeln!(f, "PROFIT BREAKDOWN:")?;
        rule(f, '=')?;
        writeln!(f, "Total revenue (A*X):            {:>12.2}", self.total_revenue())?;
        writeln!(f, "  - Saturation (B*X^2):         {:>12.2}", self.total_saturation())?;
        writeln!(f, "  - Variable costs (C*X):       {:>12.2}", self.total_variable_cost())?;
        writeln!(f, "  - Fixed costs (F*Y):          {:>12.2}", self.total_fixed_cost())?;
        writeln!(f, "  {}", "=".repeat(44))?;
        writeln!(f, "  = NET PROFIT:                 {:>12.2}", self.profit())?;

        if !self.resources.is_empty() {
            writeln!(f)?;
            rule(f, '-')?;
            writeln!(f, "RESOURCE UTILISATION:")?;
            rule(f, '-')?;
            for (k, line) in self.resources.iter().enumerate() {
                writeln!(f, "\nResource {}:", k + 1)?;
                writeln!(
                    f,
                    "  Used:      {:>10.2} / {:.2} ({:>5.1}%)",
                    line.used,
                    line.available,
                    line.percent_used()
                )?;
                writeln!(f, "  Remaining: {:>10.2}", line.remaining())?;
            }
        }

        rule(f, '=')
    }
}
