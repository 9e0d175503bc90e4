use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    LoadingDelay,
    RevealDelay,
    DownloadProcessing,
    CelebrationEnd,
}

impl TimerKind {
    pub const ALL: [TimerKind; 4] = [
        TimerKind::LoadingDelay,
        TimerKind::RevealDelay,
        TimerKind::DownloadProcessing,
        TimerKind::CelebrationEnd,
    ];

    /// The stage that schedules this timer. Leaving it cancels the timer.
    pub const fn owner_stage(self) -> Stage {
        match self {
            TimerKind::LoadingDelay => Stage::Loading,
            TimerKind::RevealDelay => Stage::CardReveal,
            TimerKind::DownloadProcessing => Stage::TicketView,
            TimerKind::CelebrationEnd => Stage::Final,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    kind: TimerKind,
    deadline: Duration,
    seq: u64,
}

/// Deterministic timer queue on a virtual clock. At most one pending timer per kind.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_seq: u64,
    pending: Vec<PendingTimer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedules `kind` after `delay`, replacing any pending timer of the same kind.
    pub fn schedule(&mut self, kind: TimerKind, delay: Duration) {
        self.cancel(kind);
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        self.pending.push(PendingTimer {
            kind,
            deadline: self.now.saturating_add(delay),
            seq,
        });
    }

    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.kind != kind);
        before != self.pending.len()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.pending.iter().any(|timer| timer.kind == kind)
    }

    pub fn remaining(&self, kind: TimerKind) -> Option<Duration> {
        self.pending
            .iter()
            .find(|timer| timer.kind == kind)
            .map(|timer| timer.deadline.saturating_sub(self.now))
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Removes the earliest timer due at or before `until` and moves the clock to
    /// its deadline. Ties fire in scheduling order.
    pub fn pop_due(&mut self, until: Duration) -> Option<TimerKind> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.deadline <= until)
            .min_by_key(|(_, timer)| (timer.deadline, timer.seq))
            .map(|(index, _)| index)?;
        let timer = self.pending.swap_remove(index);
        self.now = self.now.max(timer.deadline);
        Some(timer.kind)
    }

    pub fn advance_clock_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Moves the clock forward by `dt` and drains every timer that came due.
    pub fn advance(&mut self, dt: Duration) -> Vec<TimerKind> {
        let until = self.now.saturating_add(dt);
        let mut fired = Vec::new();
        while let Some(kind) = self.pop_due(until) {
            fired.push(kind);
        }
        self.advance_clock_to(until);
        fired
    }
}
