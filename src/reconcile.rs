// ⚖️ Reconciliation Engine - Merge three monthly series into one
//
// Full outer join on Period with zero-fill:
//   every period seen in ANY input becomes exactly one record,
//   a metric absent for that period contributes 0.
//
// Derived fields are recomputed on every call:
//   profit        = revenue - cost
//   profitability = profit / revenue * 100   (0 when revenue == 0)
//
// Profitability is 0 only when revenue is exactly 0. A loss-making month keeps
// its negative profitability; downstream reads 0 as "undefined".

use crate::period::Period;
use crate::series::{Metric, RawSeriesPoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    #[error("{metric} series contains period {period} more than once")]
    DuplicatePeriod { metric: Metric, period: Period },

    #[error("{metric} series has a non-finite value ({value}) at {period}")]
    NonFiniteValue {
        metric: Metric,
        period: Period,
        value: f64,
    },

    #[error("derived profit or profitability at {period} is not finite")]
    NonFiniteDerived { period: Period },
}

// ============================================================================
// RECONCILED RECORD
// ============================================================================

/// One output row. Field order is the export column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledRecord {
    pub period: Period,
    pub revenue: f64,
    pub item_count: u64,
    pub cost: f64,
    pub inventory: f64,
    pub profit: f64,
    pub profitability: f64,
}

impl ReconciledRecord {
    /// Build a record, deriving profit and profitability
    pub fn derive(period: Period, revenue: f64, item_count: u64, cost: f64, inventory: f64) -> Self {
        let profit = revenue - cost;
        ReconciledRecord {
            period,
            revenue,
            item_count,
            cost,
            inventory,
            profit,
            profitability: profitability(profit, revenue),
        }
    }
}

/// Percentage margin, 0 when revenue is 0
pub fn profitability(profit: f64, revenue: f64) -> f64 {
    if revenue == 0.0 {
        0.0
    } else {
        profit / revenue * 100.0
    }
}

// ============================================================================
// RECONCILER
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
struct Slot {
    revenue: f64,
    item_count: u64,
    cost: f64,
    inventory: f64,
}

/// Outer-join the three series on Period, zero-fill, derive.
///
/// Fails fast on malformed input (a period repeated within one series, or a
/// non-finite value); no partial output is returned. A record whose derived
/// profit or profitability overflows (e.g. a subnormal revenue) is an error too.
///
/// Example:
/// ```
/// use brand_history::{reconcile, Period, RawSeriesPoint};
///
/// let jan = Period::new(2023, 1).unwrap();
/// let feb = Period::new(2023, 2).unwrap();
///
/// let records = reconcile(
///     &[RawSeriesPoint::new(jan, 1000.0)],
///     &[RawSeriesPoint::new(jan, 600.0), RawSeriesPoint::new(feb, 200.0)],
///     &[],
/// )
/// .unwrap();
///
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[0].profitability, 40.0);
/// assert_eq!(records[1].profit, -200.0);
/// assert_eq!(records[1].profitability, 0.0);
/// ```
pub fn reconcile(
    sales: &[RawSeriesPoint],
    cost: &[RawSeriesPoint],
    inventory: &[RawSeriesPoint],
) -> Result<Vec<ReconciledRecord>, ReconcileError> {
    let mut slots: BTreeMap<Period, Slot> = BTreeMap::new();

    merge(&mut slots, Metric::Sales, sales, |slot, point| {
        slot.revenue = point.value;
        slot.item_count = point.item_count.unwrap_or(0);
    })?;
    merge(&mut slots, Metric::Cost, cost, |slot, point| {
        slot.cost = point.value;
    })?;
    merge(&mut slots, Metric::Inventory, inventory, |slot, point| {
        slot.inventory = point.value;
    })?;

    // BTreeMap iterates in ascending Period order
    slots
        .into_iter()
        .map(|(period, s)| {
            let record = ReconciledRecord::derive(period, s.revenue, s.item_count, s.cost, s.inventory);
            if record.profit.is_finite() && record.profitability.is_finite() {
                Ok(record)
            } else {
                Err(ReconcileError::NonFiniteDerived { period })
            }
        })
        .collect()
}

fn merge(
    slots: &mut BTreeMap<Period, Slot>,
    metric: Metric,
    points: &[RawSeriesPoint],
    apply: impl Fn(&mut Slot, &RawSeriesPoint),
) -> Result<(), ReconcileError> {
    let mut seen = std::collections::HashSet::with_capacity(points.len());

    for point in points {
        if !point.value.is_finite() {
            return Err(ReconcileError::NonFiniteValue {
                metric,
                period: point.period,
                value: point.value,
            });
        }
        if !seen.insert(point.period) {
            return Err(ReconcileError::DuplicatePeriod {
                metric,
                period: point.period,
            });
        }

        apply(slots.entry(point.period).or_default(), point);
    }

    Ok(())
}

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub first_period: Option<Period>,
    pub last_period: Option<Period>,
    pub record_count: usize,
    pub total_revenue: f64,
    pub total_cost: f64,
    pub total_profit: f64,
    pub overall_profitability: f64,
}

impl ReconciliationSummary {
    pub fn from_records(records: &[ReconciledRecord]) -> Self {
        let total_revenue: f64 = records.iter().map(|r| r.revenue).sum();
        let total_cost: f64 = records.iter().map(|r| r.cost).sum();
        let total_profit = total_revenue - total_cost;

        ReconciliationSummary {
            first_period: records.first().map(|r| r.period),
            last_period: records.last().map(|r| r.period),
            record_count: records.len(),
            total_revenue,
            total_cost,
            total_profit,
            overall_profitability: profitability(total_profit, total_revenue),
        }
    }

    pub fn summary(&self) -> String {
        let range = match (self.first_period, self.last_period) {
            (Some(first), Some(last)) => format!("{} ~ {}", first, last),
            _ => "empty".to_string(),
        };
        format!(
            "Period {}: {} records, revenue {:.2}, cost {:.2}, profit {:.2} ({:.1}%)",
            range,
            self.record_count,
            self.total_revenue,
            self.total_cost,
            self.total_profit,
            self.overall_profitability
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
