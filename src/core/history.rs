//! Record of transitions applied by the worker.
//!
//! The history is bounded: once `capacity` records are held the oldest one
//! is evicted. A capacity of zero keeps nothing but still counts transitions.

use super::{EventId, StateId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// A single applied transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// 1-based position of this transition since the machine was created
    pub sequence: u64,
    /// The state that was left
    pub from: StateId,
    /// The event that fired the rule
    pub event: EventId,
    /// The state that was entered
    pub to: StateId,
    /// When the new state was installed
    pub timestamp: DateTime<Utc>,
}

/// Bounded, ordered history of applied transitions.
///
/// # Example
///
/// ```rust
/// use waypoint::TransitionHistory;
///
/// let mut history = TransitionHistory::with_capacity(2);
/// history.record("idle".into(), "on".into(), "power_up".into());
/// history.record("power_up".into(), "maintain_speed".into(), "speed_control".into());
/// history.record("speed_control".into(), "off".into(), "power_down".into());
///
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.total_recorded(), 3);
/// let path: Vec<&str> = history.get_path().into_iter().map(|id| id.as_str()).collect();
/// assert_eq!(path, vec!["power_up", "speed_control", "power_down"]);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransitionHistory {
    capacity: usize,
    total: u64,
    records: VecDeque<TransitionRecord>,
}

impl TransitionHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            total: 0,
            records: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    /// Append a transition stamped with the current time, evicting the
    /// oldest record when full. Returns the sequence number assigned.
    pub fn record(&mut self, from: StateId, event: EventId, to: StateId) -> u64 {
        self.total += 1;
        if self.capacity == 0 {
            return self.total;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(TransitionRecord {
            sequence: self.total,
            from,
            event,
            to,
            timestamp: Utc::now(),
        });
        self.total
    }

    /// Path of states covered by the retained records: the `from` of the
    /// oldest record, then the `to` of each record.
    pub fn get_path(&self) -> Vec<&StateId> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(first) = self.records.front() {
            path.push(&first.from);
        }
        path.extend(self.records.iter().map(|record| &record.to));
        path
    }

    /// Events of the retained records, oldest first.
    pub fn events(&self) -> Vec<&EventId> {
        self.records.iter().map(|record| &record.event).collect()
    }

    /// Time between the oldest and newest retained record.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.records.front()?, self.records.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn records(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Transitions recorded since creation, including evicted ones.
    pub fn total_recorded(&self) -> u64 {
        self.total
    }
}
