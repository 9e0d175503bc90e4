use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "loading")]
    Loading,
    #[serde(rename = "tutorial")]
    Tutorial,
    #[serde(rename = "envelope-drop")]
    EnvelopeDrop,
    #[serde(rename = "envelope-hover")]
    EnvelopeHover,
    #[serde(rename = "card-reveal")]
    CardReveal,
    #[serde(rename = "card-3d")]
    Card3d,
    #[serde(rename = "ticket-view")]
    TicketView,
    #[serde(rename = "final")]
    Final,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::Loading,
        Stage::Tutorial,
        Stage::EnvelopeDrop,
        Stage::EnvelopeHover,
        Stage::CardReveal,
        Stage::Card3d,
        Stage::TicketView,
        Stage::Final,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Stage::Loading => "loading",
            Stage::Tutorial => "tutorial",
            Stage::EnvelopeDrop => "envelope-drop",
            Stage::EnvelopeHover => "envelope-hover",
            Stage::CardReveal => "card-reveal",
            Stage::Card3d => "card-3d",
            Stage::TicketView => "ticket-view",
            Stage::Final => "final",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-time achievements shown by the progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Milestone {
    EnvelopeOpened,
    CardRevealed,
    CardOpened,
    TicketFound,
    GiftDownloaded,
}

impl Milestone {
    pub const ALL: [Milestone; 5] = [
        Milestone::EnvelopeOpened,
        Milestone::CardRevealed,
        Milestone::CardOpened,
        Milestone::TicketFound,
        Milestone::GiftDownloaded,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Milestone::EnvelopeOpened => "envelope-opened",
            Milestone::CardRevealed => "card-revealed",
            Milestone::CardOpened => "card-opened",
            Milestone::TicketFound => "ticket-found",
            Milestone::GiftDownloaded => "gift-downloaded",
        }
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grow-only set of milestones for one session. Only a full restart empties it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedStages {
    milestones: BTreeSet<Milestone>,
}

impl CompletedStages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the milestone was not recorded before.
    pub fn insert(&mut self, milestone: Milestone) -> bool {
        self.milestones.insert(milestone)
    }

    pub fn contains(&self, milestone: Milestone) -> bool {
        self.milestones.contains(&milestone)
    }

    pub fn len(&self) -> usize {
        self.milestones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.milestones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Milestone> + '_ {
        self.milestones.iter().copied()
    }

    pub fn percent(&self) -> u8 {
        let total = Milestone::ALL.len() as f32;
        ((self.len() as f32 / total) * 100.0).round() as u8
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionFlags {
    pub envelope_opened: bool,
    pub card_open: bool,
}
