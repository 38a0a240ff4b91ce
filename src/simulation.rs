// 🔮 Scenario Simulation - Forward projection of revenue, cost and inventory
//
// Each metric starts from a base value scaled by its scenario multiplier and
// compounds monthly at annual_rate / 12 / 100:
//   value[i] = round(base * multiplier * (1 + annual_rate / 1200)^i)
//
// Projection starts the month after the run date and covers years * 12 months.
// Profit and profitability are derived per month exactly as for history.

use crate::period::{Period, PeriodError};
use crate::reconcile::profitability;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on the projection horizon
pub const MAX_SIMULATION_YEARS: u32 = 50;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("years must be at most {max}, got {years}")]
    TooManyYears { years: u32, max: u32 },

    #[error("{field} must be a finite number")]
    NonFiniteAssumption { field: &'static str },

    #[error("projected {field} at {period} is not finite")]
    NonFiniteProjection { field: &'static str, period: Period },

    #[error("run date cannot start a projection: {0}")]
    Start(#[from] PeriodError),
}

// ============================================================================
// INPUT
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Conservative,
    #[default]
    Neutral,
    Aggressive,
}

impl Scenario {
    pub fn multiplier(&self) -> f64 {
        match self {
            Scenario::Conservative => 0.9,
            Scenario::Neutral => 1.0,
            Scenario::Aggressive => 1.1,
        }
    }
}

/// Assumptions for one metric. Growth rate is annual, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricAssumption {
    pub base_value: f64,
    #[serde(default)]
    pub growth_rate: f64,
    #[serde(default)]
    pub scenario: Scenario,
}

impl MetricAssumption {
    pub fn new(base_value: f64) -> Self {
        MetricAssumption {
            base_value,
            ..Default::default()
        }
    }

    pub fn with_growth_rate(mut self, growth_rate: f64) -> Self {
        self.growth_rate = growth_rate;
        self
    }

    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = scenario;
        self
    }
}

/// A missing metric projects as zero for every month
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationInput {
    #[serde(default)]
    pub revenue: Option<MetricAssumption>,
    #[serde(default)]
    pub cost: Option<MetricAssumption>,
    #[serde(default)]
    pub inventory: Option<MetricAssumption>,
    pub years: u32,
}

// ============================================================================
// OUTPUT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub period: Period,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub revenue: Vec<ProjectedPoint>,
    pub cost: Vec<ProjectedPoint>,
    pub inventory: Vec<ProjectedPoint>,
    pub profit: Vec<ProjectedPoint>,
    pub profitability: Vec<ProjectedPoint>,
}

// ============================================================================
// SIMULATION
// ============================================================================

/// Project every metric over `input.years` starting the month after `as_of`
pub fn simulate(input: &SimulationInput, as_of: NaiveDate) -> Result<SimulationResult, SimulationError> {
    if input.years > MAX_SIMULATION_YEARS {
        return Err(SimulationError::TooManyYears {
            years: input.years,
            max: MAX_SIMULATION_YEARS,
        });
    }

    let periods = projection_periods(as_of, input.years)?;

    let revenue = project("revenue", input.revenue, &periods)?;
    let cost = project("cost", input.cost, &periods)?;
    let inventory = project("inventory", input.inventory, &periods)?;

    let mut profit = Vec::with_capacity(periods.len());
    let mut margin = Vec::with_capacity(periods.len());
    for (r, c) in revenue.iter().zip(&cost) {
        let value = r.value - c.value;
        let pct = profitability(value, r.value);
        if !value.is_finite() || !pct.is_finite() {
            return Err(SimulationError::NonFiniteProjection {
                field: "profit",
                period: r.period,
            });
        }
        profit.push(ProjectedPoint { period: r.period, value });
        margin.push(ProjectedPoint { period: r.period, value: pct });
    }

    Ok(SimulationResult {
        revenue,
        cost,
        inventory,
        profit,
        profitability: margin,
    })
}

/// Consecutive months after `as_of`, twelve per year
pub fn projection_periods(as_of: NaiveDate, years: u32) -> Result<Vec<Period>, SimulationError> {
    let current = Period::from_date(as_of)?;
    let months = years * 12;

    let mut periods = Vec::with_capacity(months as usize);
    let mut period = current;
    for _ in 0..months {
        let next = period.succ();
        if next == period {
            // ran past 9999-12
            return Err(SimulationError::Start(PeriodError::YearOutOfRange(period.year() + 1)));
        }
        period = next;
        periods.push(period);
    }
    Ok(periods)
}

fn project(
    field: &'static str,
    assumption: Option<MetricAssumption>,
    periods: &[Period],
) -> Result<Vec<ProjectedPoint>, SimulationError> {
    let assumption = assumption.unwrap_or_default();
    if !assumption.base_value.is_finite() || !assumption.growth_rate.is_finite() {
        return Err(SimulationError::NonFiniteAssumption { field });
    }

    let base = assumption.base_value * assumption.scenario.multiplier();
    let monthly_rate = assumption.growth_rate / 12.0 / 100.0;

    periods
        .iter()
        .enumerate()
        .map(|(index, &period)| {
            let value = round_half_up(base * (1.0 + monthly_rate).powi(index as i32));
            if value.is_finite() {
                Ok(ProjectedPoint { period, value })
            } else {
                Err(SimulationError::NonFiniteProjection { field, period })
            }
        })
        .collect()
}

/// Nearest integer, ties toward positive infinity (-2.5 -> -2, 2.5 -> 3)
fn round_half_up(value: f64) -> f64 {
    let rounded = value.round();
    if value - rounded == 0.5 {
        rounded + 1.0
    } else {
        rounded
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn values(points: &[ProjectedPoint]) -> Vec<f64> {
        points.iter().map(|p| p.value).collect()
    }

    #[test]
    fn test_periods_start_next_month() {
        let periods = projection_periods(date(2026, 10, 16), 1).unwrap();

        assert_eq!(periods.len(), 12);
        assert_eq!(periods[0].to_string(), "2026-11");
        assert_eq!(periods[1].to_string(), "2026-12");
        assert_eq!(periods[2].to_string(), "2027-01");
        assert_eq!(periods[11].to_string(), "2027-10");
    }

    #[test]
    fn test_scenario_multipliers() {
        let as_of = date(2026, 10, 16);
        let run = |scenario| {
            let input = SimulationInput {
                revenue: Some(MetricAssumption::new(1000.0).with_scenario(scenario)),
                years: 1,
                ..Default::default()
            };
            simulate(&input, as_of).unwrap().revenue[0].value
        };

        assert_eq!(run(Scenario::Conservative), 900.0);
        assert_eq!(run(Scenario::Neutral), 1000.0);
        assert_eq!(run(Scenario::Aggressive), 1100.0);
    }

    #[test]
    fn test_monthly_compounding_is_rounded() {
        let input = SimulationInput {
            revenue: Some(MetricAssumption::new(1_000_000.0).with_growth_rate(12.0)),
            years: 1,
            ..Default::default()
        };

        let result = simulate(&input, date(2026, 10, 16)).unwrap();
        let revenue = values(&result.revenue);

        // 12% a year is 1% a month
        assert_eq!(revenue[0], 1_000_000.0);
        assert_eq!(revenue[1], 1_010_000.0);
        assert_eq!(revenue[2], 1_020_100.0);
        assert_eq!(revenue[11], (1_000_000.0 * 1.01f64.powi(11)).round());
        assert!(revenue.iter().all(|v| v.fract() == 0.0));
    }

    #[test]
    fn test_profit_and_profitability_derived() {
        let input = SimulationInput {
            revenue: Some(MetricAssumption::new(1000.0)),
            cost: Some(MetricAssumption::new(600.0).with_scenario(Scenario::Aggressive)),
            inventory: Some(MetricAssumption::new(50.0)),
            years: 2,
        };

        let result = simulate(&input, date(2026, 10, 16)).unwrap();

        assert_eq!(result.profit.len(), 24);
        assert_eq!(result.profit[0].value, 340.0);
        assert!((result.profitability[0].value - 34.0).abs() < 1e-9);
        assert_eq!(result.inventory[23].value, 50.0);
        assert_eq!(result.profit[23].period, result.revenue[23].period);
    }

    #[test]
    fn test_missing_metrics_project_as_zero() {
        let input = SimulationInput {
            cost: Some(MetricAssumption::new(200.0)),
            years: 1,
            ..Default::default()
        };

        let result = simulate(&input, date(2026, 10, 16)).unwrap();

        assert!(values(&result.revenue).iter().all(|v| *v == 0.0));
        assert!(values(&result.inventory).iter().all(|v| *v == 0.0));
        assert_eq!(result.profit[0].value, -200.0);
        assert_eq!(result.profitability[0].value, 0.0);
    }

    #[test]
    fn test_zero_years_is_empty() {
        let input = SimulationInput {
            revenue: Some(MetricAssumption::new(1000.0)),
            ..Default::default()
        };
        let result = simulate(&input, date(2026, 10, 16)).unwrap();
        assert_eq!(result, SimulationResult::default());
    }

    #[test]
    fn test_invalid_requests_rejected() {
        let as_of = date(2026, 10, 16);

        let too_long = SimulationInput {
            years: MAX_SIMULATION_YEARS + 1,
            ..Default::default()
        };
        assert!(matches!(simulate(&too_long, as_of), Err(SimulationError::TooManyYears { .. })));

        let nan = SimulationInput {
            cost: Some(MetricAssumption::new(f64::NAN)),
            years: 1,
            ..Default::default()
        };
        assert_eq!(
            simulate(&nan, as_of),
            Err(SimulationError::NonFiniteAssumption { field: "cost" })
        );

        let explosive = SimulationInput {
            revenue: Some(MetricAssumption::new(f64::MAX).with_growth_rate(1e6)),
            years: 1,
            ..Default::default()
        };
        assert!(matches!(
            simulate(&explosive, as_of),
            Err(SimulationError::NonFiniteProjection { field: "revenue", .. })
        ));

        let late = SimulationInput {
            years: 1,
            ..Default::default()
        };
        assert!(simulate(&late, date(9999, 6, 1)).is_err());
    }

    #[test]
    fn test_rounding_ties_go_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-2.6), -3.0);
        assert_eq!(round_half_up(0.4), 0.0);
    }

    #[test]
    fn test_input_json_shape() {
        let input: SimulationInput = serde_json::from_str(
            r#"{"revenue":{"baseValue":1000,"growthRate":6,"scenario":"conservative"},
                "cost":{"baseValue":500},
                "years":3}"#,
        )
        .unwrap();

        assert_eq!(
            input.revenue,
            Some(MetricAssumption::new(1000.0).with_growth_rate(6.0).with_scenario(Scenario::Conservative))
        );
        assert_eq!(input.cost, Some(MetricAssumption::new(500.0)));
        assert_eq!(input.inventory, None);
        assert_eq!(input.years, 3);

        let result = simulate(&input, date(2026, 10, 16)).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["revenue"][0]["period"], "2026-11");
        assert_eq!(json["revenue"][0]["value"], 900.0);
    }
}
