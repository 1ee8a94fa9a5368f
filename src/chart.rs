//! Portfolio value series for the season chart.
//!
//! Snapshots are pivoted into one point per timestamp with a value per model,
//! gaps are forward-filled, the flat pre-trading prefix is trimmed and long
//! series are thinned while keeping decision points.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::arena::ModelSnapshot;
use crate::countdown::is_decision_day;
use crate::error::ArenaError;
use crate::store::ArenaStore;

pub const DEFAULT_MAX_CHART_POINTS: usize = 50;

/// Values within this distance of the starting balance count as untouched.
const VARIATION_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);
/// Snapshots up to this UTC hour on a decision day are flagged.
const DECISION_WINDOW_LAST_HOUR: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartModel {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub is_decision_point: bool,
    pub values: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ChartSeries {
    /// Ordered by value at the latest point, highest first.
    pub models: Vec<ChartModel>,
    pub points: Vec<ChartPoint>,
    /// Positions in `points` flagged as decision points.
    pub decision_indices: Vec<usize>,
}

pub fn is_decision_time(ts: DateTime<Utc>) -> bool {
    is_decision_day(ts.weekday()) && ts.hour() <= DECISION_WINDOW_LAST_HOUR
}

pub fn build_chart_series(
    snapshots: &[ModelSnapshot],
    initial_balance: Decimal,
    max_points: usize,
) -> ChartSeries {
    if snapshots.is_empty() {
        return ChartSeries::default();
    }

    let mut model_order: Vec<ChartModel> = Vec::new();
    let mut by_time: BTreeMap<DateTime<Utc>, HashMap<String, Decimal>> = BTreeMap::new();
    for snapshot in snapshots {
        let name = &snapshot.model.display_name;
        if !model_order.iter().any(|model| &model.name == name) {
            model_order.push(ChartModel {
                name: name.clone(),
                color: snapshot.model.color.clone(),
            });
        }
        by_time
            .entry(snapshot.snapshot_timestamp)
            .or_default()
            .insert(name.clone(), snapshot.total_value);
    }

    let mut last_known: HashMap<&str, Decimal> = model_order
        .iter()
        .map(|model| (model.name.as_str(), initial_balance))
        .collect();

    let mut points: Vec<ChartPoint> = Vec::with_capacity(by_time.len());
    for (idx, (timestamp, observed)) in by_time.iter().enumerate() {
        let mut values = BTreeMap::new();
        for model in &model_order {
            let value = match observed.get(&model.name) {
                Some(value) => {
                    last_known.insert(model.name.as_str(), *value);
                    *value
                }
                None => last_known
                    .get(model.name.as_str())
                    .copied()
                    .unwrap_or(initial_balance),
            };
            values.insert(model.name.clone(), value);
        }
        points.push(ChartPoint {
            index: idx,
            timestamp: *timestamp,
            is_decision_point: is_decision_time(*timestamp),
            values,
        });
    }

    if let Some(latest) = points.last() {
        model_order.sort_by(|a, b| {
            let value_a = latest.values.get(&a.name).copied().unwrap_or_default();
            let value_b = latest.values.get(&b.name).copied().unwrap_or_default();
            value_b.cmp(&value_a)
        });
    }

    let mut points = thin_points(trim_flat_prefix(points, initial_balance), max_points);
    for (idx, point) in points.iter_mut().enumerate() {
        point.index = idx;
    }
    let decision_indices = points
        .iter()
        .filter(|point| point.is_decision_point)
        .map(|point| point.index)
        .collect();

    ChartSeries {
        models: model_order,
        points,
        decision_indices,
    }
}

/// Drops leading points where no model has moved off the starting balance,
/// keeping one of them for context. A series that never moves keeps its last
/// two points.
fn trim_flat_prefix(points: Vec<ChartPoint>, initial_balance: Decimal) -> Vec<ChartPoint> {
    let has_variation = |point: &ChartPoint| {
        point
            .values
            .values()
            .any(|value| (*value - initial_balance).abs() > VARIATION_EPSILON)
    };

    let first_variation = points
        .iter()
        .position(has_variation)
        .unwrap_or(points.len().saturating_sub(1));
    let start = first_variation.saturating_sub(1);

    points.into_iter().skip(start).collect()
}

/// Keeps every `ceil(len / max_points)`-th point, the last point and all
/// decision points when the series is longer than `max_points`.
fn thin_points(points: Vec<ChartPoint>, max_points: usize) -> Vec<ChartPoint> {
    if max_points == 0 || points.len() <= max_points {
        return points;
    }

    let step = points.len().div_ceil(max_points);
    let last = points.len() - 1;
    points
        .into_iter()
        .enumerate()
        .filter(|(idx, point)| idx % step == 0 || *idx == last || point.is_decision_point)
        .map(|(_, point)| point)
        .collect()
}

/// Chart series for the active season; empty when there is none.
pub fn load_chart_series(
    store: &dyn ArenaStore,
    max_points: usize,
) -> Result<ChartSeries, ArenaError> {
    let Some(season) = store
        .active_season()
        .map_err(ArenaError::fetch("active season"))?
    else {
        return Ok(ChartSeries::default());
    };

    let snapshots = store
        .season_snapshots(&season.id)
        .map_err(ArenaError::fetch("season snapshots"))?;
    let series = build_chart_series(&snapshots, season.initial_balance, max_points);

    info!(
        component = "chart",
        event = "chart.computed",
        season_id = %season.id,
        snapshot_count = snapshots.len(),
        point_count = series.points.len()
    );

    Ok(series)
}
