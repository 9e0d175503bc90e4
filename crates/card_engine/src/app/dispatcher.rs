use super::{Stage, StageView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    DownloadFailed,
}

impl Notice {
    pub const fn message(self) -> &'static str {
        match self {
            Notice::DownloadFailed => "Certificate could not be saved",
        }
    }
}

/// Which visual to mount for the current stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Presentation {
    Loading,
    Tutorial {
        step: usize,
        step_count: usize,
    },
    Envelope {
        opened: bool,
        dragging: bool,
        progress: f32,
    },
    CardReveal,
    Card {
        open: bool,
    },
    Ticket {
        downloading: bool,
    },
    Final {
        celebrating: bool,
        notice: Option<Notice>,
    },
}

pub fn present(view: &StageView) -> Presentation {
    match view.stage {
        Stage::Loading => Presentation::Loading,
        Stage::Tutorial => Presentation::Tutorial {
            step: view.tutorial_step,
            step_count: view.tutorial_step_count,
        },
        Stage::EnvelopeDrop | Stage::EnvelopeHover => Presentation::Envelope {
            opened: view.flags.envelope_opened,
            dragging: view.dragging,
            progress: view.drag_progress,
        },
        Stage::CardReveal => Presentation::CardReveal,
        Stage::Card3d => Presentation::Card {
            open: view.flags.card_open,
        },
        Stage::TicketView => Presentation::Ticket {
            downloading: view.download_pending,
        },
        Stage::Final => Presentation::Final {
            celebrating: view.celebrating,
            notice: view.download_failed.then_some(Notice::DownloadFailed),
        },
    }
}

pub fn progress_label(stage: Stage) -> &'static str {
    match stage {
        Stage::EnvelopeDrop | Stage::EnvelopeHover => "Opening envelope...",
        Stage::CardReveal | Stage::Card3d => "Exploring card...",
        Stage::TicketView => "Claiming surprise...",
        Stage::Loading | Stage::Tutorial | Stage::Final => "Loading...",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressIndicator {
    pub label: &'static str,
    pub percent: u8,
    /// Hidden on the splash, the tutorial overlay and the final screen.
    pub visible: bool,
}

pub fn progress_indicator(view: &StageView) -> ProgressIndicator {
    ProgressIndicator {
        label: progress_label(view.stage),
        percent: view.completed.percent(),
        visible: !matches!(
            view.stage,
            Stage::Loading | Stage::Tutorial | Stage::Final
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{CompletedStages, InteractionFlags, Milestone};

    fn view(stage: Stage) -> StageView {
        StageView {
            stage,
            tutorial_step: 0,
            tutorial_step_count: 5,
            drag_progress: 0.0,
            dragging: false,
            flags: InteractionFlags::default(),
            completed: CompletedStages::new(),
            download_pending: false,
            celebrating: false,
            download_failed: false,
        }
    }

    #[test]
    fn both_envelope_stages_share_a_presentation() {
        let mut hover = view(Stage::EnvelopeHover);
        hover.flags.envelope_opened = true;
        hover.dragging = true;
        hover.drag_progress = 0.4;
        assert_eq!(
            present(&hover),
            Presentation::Envelope {
                opened: true,
                dragging: true,
                progress: 0.4,
            }
        );
        assert!(matches!(
            present(&view(Stage::EnvelopeDrop)),
            Presentation::Envelope { opened: false, .. }
        ));
    }

    #[test]
    fn final_surfaces_failed_download_notice() {
        let mut failed = view(Stage::Final);
        failed.download_failed = true;
        failed.celebrating = true;
        assert_eq!(
            present(&failed),
            Presentation::Final {
                celebrating: true,
                notice: Some(Notice::DownloadFailed),
            }
        );
        assert_eq!(
            present(&view(Stage::Final)),
            Presentation::Final {
                celebrating: false,
                notice: None,
            }
        );
    }

    #[test]
    fn every_stage_has_a_label() {
        for stage in Stage::ALL {
            assert!(progress_label(stage).ends_with("..."), "{stage}");
        }
        assert_eq!(progress_label(Stage::TicketView), "Claiming surprise...");
    }

    #[test]
    fn indicator_tracks_milestones() {
        let mut card = view(Stage::Card3d);
        card.completed.insert(Milestone::EnvelopeOpened);
        card.completed.insert(Milestone::CardRevealed);
        let indicator = progress_indicator(&card);
        assert_eq!(indicator.label, "Exploring card...");
        assert_eq!(indicator.percent, 40);
        assert!(indicator.visible);
        assert!(!progress_indicator(&view(Stage::Loading)).visible);
    }
}
