//! Rank-change ("drama") detection over hourly portfolio snapshots.
//!
//! Snapshots are bucketed by UTC hour, each bucket is ranked by total value,
//! and every improvement between consecutive buckets becomes an event. Only
//! the newest [`MAX_RANK_CHANGES`] events are kept.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::arena::ModelSnapshot;
use crate::error::ArenaError;
use crate::store::ArenaStore;

pub const RANK_CHANGE_LOOKBACK_HOURS: i64 = 48;
pub const MAX_RANK_CHANGES: usize = 5;

const BUCKET_SECONDS: i64 = 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankChange {
    pub agent_id: String,
    pub model_id: String,
    pub model_name: String,
    pub model_color: String,
    pub previous_rank: usize,
    pub current_rank: usize,
    pub previous_value: Decimal,
    pub current_value: Decimal,
    pub overtook_model: Option<String>,
    pub overtook_model_color: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// One hour bucket ranked by value; `ranked[i]` holds rank `i + 1`.
struct BucketRanking<'a> {
    first_timestamp: DateTime<Utc>,
    ranked: Vec<&'a ModelSnapshot>,
    rank_by_agent: HashMap<&'a str, usize>,
}

impl<'a> BucketRanking<'a> {
    fn new(snapshots: &[&'a ModelSnapshot]) -> Option<Self> {
        let first_timestamp = snapshots.first()?.snapshot_timestamp;

        // Last writer wins when an agent snapshots twice in one hour.
        let mut latest: HashMap<&'a str, &'a ModelSnapshot> = HashMap::new();
        for &snapshot in snapshots {
            latest
                .entry(snapshot.agent_id.as_str())
                .and_modify(|kept| {
                    if snapshot.snapshot_timestamp > kept.snapshot_timestamp {
                        *kept = snapshot;
                    }
                })
                .or_insert(snapshot);
        }

        let mut ranked: Vec<&'a ModelSnapshot> = latest.into_values().collect();
        ranked.sort_by(|a, b| {
            b.total_value
                .cmp(&a.total_value)
                .then_with(|| a.agent_id.cmp(&b.agent_id))
        });

        let rank_by_agent = ranked
            .iter()
            .enumerate()
            .map(|(idx, snapshot)| (snapshot.agent_id.as_str(), idx + 1))
            .collect();

        Some(Self {
            first_timestamp,
            ranked,
            rank_by_agent,
        })
    }

    fn rank_of(&self, agent_id: &str) -> Option<usize> {
        self.rank_by_agent.get(agent_id).copied()
    }
}

/// Truncates a timestamp to the start of its UTC hour.
pub fn hour_bucket(ts: DateTime<Utc>) -> DateTime<Utc> {
    let start = ts.timestamp().div_euclid(BUCKET_SECONDS) * BUCKET_SECONDS;
    Utc.timestamp_opt(start, 0).single().unwrap_or(ts)
}

/// Detects rank improvements between consecutive hour buckets.
///
/// `snapshots` should be ordered oldest first; a bucket's event timestamp is
/// the first snapshot seen in it. Returns at most [`MAX_RANK_CHANGES`]
/// events, newest first.
pub fn detect_rank_changes(snapshots: &[ModelSnapshot]) -> Vec<RankChange> {
    let mut buckets: BTreeMap<DateTime<Utc>, Vec<&ModelSnapshot>> = BTreeMap::new();
    for snapshot in snapshots {
        buckets
            .entry(hour_bucket(snapshot.snapshot_timestamp))
            .or_default()
            .push(snapshot);
    }

    if buckets.len() < 2 {
        return Vec::new();
    }

    let rankings: Vec<BucketRanking<'_>> = buckets
        .values()
        .filter_map(|bucket| BucketRanking::new(bucket))
        .collect();

    let mut changes = Vec::new();
    for pair in rankings.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);

        for (idx, mover) in current.ranked.iter().enumerate() {
            let current_rank = idx + 1;
            let Some(previous_rank) = previous.rank_of(&mover.agent_id) else {
                continue;
            };
            if current_rank >= previous_rank {
                continue;
            }

            let overtaken = previous
                .ranked
                .get(current_rank - 1)
                .filter(|other| other.agent_id != mover.agent_id)
                .filter(|other| {
                    current
                        .rank_of(&other.agent_id)
                        .is_some_and(|rank| rank > current_rank)
                });

            let previous_value = previous.ranked[previous_rank - 1].total_value;

            changes.push(RankChange {
                agent_id: mover.agent_id.clone(),
                model_id: mover.model.id.clone(),
                model_name: mover.model.display_name.clone(),
                model_color: mover.model.color.clone(),
                previous_rank,
                current_rank,
                previous_value,
                current_value: mover.total_value,
                overtook_model: overtaken.map(|other| other.model.display_name.clone()),
                overtook_model_color: overtaken.map(|other| other.model.color.clone()),
                timestamp: current.first_timestamp,
            });
        }
    }

    changes.reverse();
    changes.truncate(MAX_RANK_CHANGES);
    changes
}

/// Loads snapshots from the lookback window ending at `now` and detects rank
/// changes. Store failures are returned, never degraded.
pub fn load_rank_changes(
    store: &dyn ArenaStore,
    now: DateTime<Utc>,
    lookback_hours: i64,
) -> Result<Vec<RankChange>, ArenaError> {
    let cutoff = now - ChronoDuration::hours(lookback_hours);
    let snapshots = store
        .snapshots_since(cutoff)
        .map_err(ArenaError::fetch("portfolio snapshots"))?;

    let changes = detect_rank_changes(&snapshots);
    info!(
        component = "rank_changes",
        event = "rank_changes.computed",
        snapshot_count = snapshots.len(),
        change_count = changes.len(),
        lookback_hours
    );

    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ModelIdentity;
    use rust_decimal_macros::dec;

    fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
    }

    fn snap(agent: &str, value: Decimal, at: DateTime<Utc>) -> ModelSnapshot {
        ModelSnapshot {
            agent_id: agent.to_string(),
            model: ModelIdentity {
                id: format!("model-{agent}"),
                display_name: format!("Model {agent}"),
                provider: "Lab".to_string(),
                color: format!("#{agent}{agent}{agent}"),
            },
            total_value: value,
            snapshot_timestamp: at,
        }
    }

    #[test]
    fn hour_bucket_discards_minutes_and_seconds() {
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 14, 59, 59).unwrap();
        assert_eq!(hour_bucket(at), ts(14, 0));
    }

    #[test]
    fn single_bucket_yields_no_changes() {
        let snapshots = vec![
            snap("a", dec!(100), ts(10, 0)),
            snap("b", dec!(200), ts(10, 30)),
            snap("a", dec!(300), ts(10, 45)),
        ];
        assert!(detect_rank_changes(&snapshots).is_empty());
        assert!(detect_rank_changes(&[]).is_empty());
    }

    #[test]
    fn three_agent_swap_reports_mover_and_overtaken() {
        let snapshots = vec![
            snap("a", dec!(10000), ts(10, 0)),
            snap("b", dec!(10050), ts(10, 0)),
            snap("c", dec!(9900), ts(10, 1)),
            snap("a", dec!(10000), ts(11, 0)),
            snap("b", dec!(9990), ts(11, 0)),
            snap("c", dec!(10100), ts(11, 2)),
        ];

        let changes = detect_rank_changes(&snapshots);

        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.agent_id, "c");
        assert_eq!(change.previous_rank, 3);
        assert_eq!(change.current_rank, 1);
        assert_eq!(change.previous_value, dec!(9900));
        assert_eq!(change.current_value, dec!(10100));
        assert_eq!(change.overtook_model.as_deref(), Some("Model b"));
        assert_eq!(change.overtook_model_color.as_deref(), Some("#bbb"));
        assert_eq!(change.timestamp, ts(11, 0));
    }

    #[test]
    fn latest_snapshot_in_bucket_decides_rank() {
        let snapshots = vec![
            snap("a", dec!(200), ts(10, 0)),
            snap("b", dec!(100), ts(10, 0)),
            snap("b", dec!(150), ts(11, 0)),
            snap("a", dec!(200), ts(11, 5)),
            snap("b", dec!(250), ts(11, 50)),
        ];

        let changes = detect_rank_changes(&snapshots);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].agent_id, "b");
        assert_eq!(changes[0].current_value, dec!(250));
        assert_eq!(changes[0].overtook_model.as_deref(), Some("Model a"));
    }

    #[test]
    fn overtaken_is_empty_when_previous_holder_is_gone() {
        let snapshots = vec![
            snap("a", dec!(300), ts(10, 0)),
            snap("b", dec!(200), ts(10, 0)),
            snap("b", dec!(250), ts(11, 0)),
        ];

        let changes = detect_rank_changes(&snapshots);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].previous_rank, 2);
        assert_eq!(changes[0].current_rank, 1);
        assert_eq!(changes[0].overtook_model, None);
    }

    #[test]
    fn agents_missing_from_previous_bucket_are_skipped() {
        let snapshots = vec![
            snap("a", dec!(100), ts(10, 0)),
            snap("a", dec!(100), ts(11, 0)),
            snap("new", dec!(500), ts(11, 0)),
        ];

        assert!(detect_rank_changes(&snapshots).is_empty());
    }

    #[test]
    fn equal_values_rank_by_agent_id() {
        let snapshots = vec![
            snap("b", dec!(100), ts(10, 0)),
            snap("a", dec!(90), ts(10, 0)),
            snap("b", dec!(100), ts(11, 0)),
            snap("a", dec!(100), ts(11, 0)),
        ];

        let changes = detect_rank_changes(&snapshots);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].agent_id, "a");
        assert_eq!(changes[0].overtook_model.as_deref(), Some("Model b"));
    }

    #[test]
    fn keeps_five_newest_changes_newest_first() {
        let mut snapshots = Vec::new();
        for hour in 0..8u32 {
            let (a, b) = if hour % 2 == 0 {
                (dec!(200), dec!(100))
            } else {
                (dec!(100), dec!(200))
            };
            snapshots.push(snap("a", a, ts(hour, 0)));
            snapshots.push(snap("b", b, ts(hour, 0)));
        }

        let changes = detect_rank_changes(&snapshots);

        assert_eq!(changes.len(), MAX_RANK_CHANGES);
        let hours: Vec<DateTime<Utc>> = changes.iter().map(|c| c.timestamp).collect();
        assert_eq!(hours, vec![ts(7, 0), ts(6, 0), ts(5, 0), ts(4, 0), ts(3, 0)]);
        assert_eq!(changes[0].agent_id, "b");
        assert_eq!(changes[1].agent_id, "a");
    }

    #[test]
    fn unchanged_ranks_emit_nothing() {
        let snapshots = vec![
            snap("a", dec!(300), ts(10, 0)),
            snap("b", dec!(200), ts(10, 0)),
            snap("a", dec!(310), ts(12, 0)),
            snap("b", dec!(100), ts(12, 0)),
        ];

        assert!(detect_rank_changes(&snapshots).is_empty());
    }
}
