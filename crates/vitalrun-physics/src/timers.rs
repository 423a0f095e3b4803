//! Deferred platform transitions.
//!
//! Timed effects (malfunction end, alarm lockout, noise cooldown, bubble
//! pop...) are queued here instead of running as free-standing callbacks.
//! The world drains the queue once per tick right after support resolution,
//! so every transition happens at a fixed point in the pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use vitalrun_core::Millis;

use crate::platform::PlatformId;

/// What happens to a platform when its timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerAction {
    EndMalfunction,
    RestoreAfterNoise,
    ResetAlarm,
    PopBubble,
    RespawnBubble,
    StartFalling,
    ReflexDrop,
    ReflexRestore,
}

/// A pending transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    pub platform: PlatformId,
    pub due: Millis,
    pub action: TimerAction,
    /// Insertion order, breaks ties between timers due at the same instant.
    pub seq: u64,
}

/// At most one pending timer per platform; scheduling replaces.
///
/// Keyed by a `BTreeMap` so snapshots serialize in a stable order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimerQueue {
    pending: BTreeMap<PlatformId, Timer>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` for `platform` at `due`, cancelling whatever was
    /// pending for the same platform.
    pub fn schedule(&mut self, platform: PlatformId, due: Millis, action: TimerAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        if let Some(prev) = self.pending.insert(
            platform,
            Timer {
                platform,
                due,
                action,
                seq,
            },
        ) {
            tracing::debug!(?platform, replaced = ?prev.action, with = ?action, "Timer replaced");
        }
    }

    pub fn cancel(&mut self, platform: PlatformId) -> Option<Timer> {
        self.pending.remove(&platform)
    }

    pub fn pending_for(&self, platform: PlatformId) -> Option<&Timer> {
        self.pending.get(&platform)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return every timer due at or before `now`, ordered by
    /// `(due, seq)`.
    pub fn drain_due(&mut self, now: Millis) -> Vec<Timer> {
        let mut due: Vec<Timer> = self
            .pending
            .values()
            .filter(|t| t.due <= now)
            .copied()
            .collect();
        for t in &due {
            self.pending.remove(&t.platform);
        }
        due.sort_by_key(|t| (t.due, t.seq));
        due
    }

    /// Drop timers whose platform no longer exists.
    pub fn retain_platforms(&mut self, mut alive: impl FnMut(PlatformId) -> bool) {
        self.pending.retain(|id, _| alive(*id));
    }
}
