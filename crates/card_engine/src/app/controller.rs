use serde::{Deserialize, Serialize};

use crate::config::{PostDragStage, StageConfig};

use super::{
    CompletedStages, HapticPattern, InteractionFlags, Milestone, SideEffect, SoundEffect, Stage,
    TimerKind,
};

const SEAL_HAPTIC_MS: u32 = 50;
const CARD_HAPTIC_MS: u32 = 100;
const RETURN_HAPTIC_MS: u32 = 50;
const TICKET_HAPTIC_PATTERN: [u32; 3] = [50, 25, 50];
const DOWNLOAD_HAPTIC_PATTERN: [u32; 3] = [100, 50, 100];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageEvent {
    LoadingElapsed { skip_tutorial: bool },
    TutorialNext,
    TutorialPrevious,
    TutorialSkip,
    SealHover,
    DragStart,
    DragMove { client_y: f32 },
    DragEnd,
    RevealElapsed,
    CardClick,
    TicketClick,
    ReturnToCard,
    DownloadRequested,
    DownloadFinished { succeeded: bool },
    CelebrationElapsed,
    Restart,
}

/// Read-only snapshot handed to the dispatcher and the host.
#[derive(Debug, Clone, PartialEq)]
pub struct StageView {
    pub stage: Stage,
    pub tutorial_step: usize,
    pub tutorial_step_count: usize,
    pub drag_progress: f32,
    pub dragging: bool,
    pub flags: InteractionFlags,
    pub completed: CompletedStages,
    pub download_pending: bool,
    pub celebrating: bool,
    pub download_failed: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct SessionState {
    stage: Stage,
    tutorial_step: usize,
    drag_progress: f32,
    dragging: bool,
    flags: InteractionFlags,
    completed: CompletedStages,
    download_pending: bool,
    celebrating: bool,
    download_failed: bool,
}

impl SessionState {
    fn fresh() -> Self {
        Self {
            stage: Stage::Loading,
            tutorial_step: 0,
            drag_progress: 0.0,
            dragging: false,
            flags: InteractionFlags::default(),
            completed: CompletedStages::new(),
            download_pending: false,
            celebrating: false,
            download_failed: false,
        }
    }
}

/// Owns the stage machine for one session. `handle` is the reducer: it applies an
/// event to the session state and returns the side effects to run, in order.
/// Events that have no edge from the current stage change nothing.
#[derive(Debug, Clone)]
pub struct StageController {
    config: StageConfig,
    tutorial_step_count: usize,
    state: SessionState,
}

impl StageController {
    pub fn new(config: StageConfig, tutorial_step_count: usize) -> Self {
        Self {
            config,
            tutorial_step_count,
            state: SessionState::fresh(),
        }
    }

    /// Effects to run when the controller is mounted. Re-arms the timer the
    /// current stage is waiting on, so a remount resumes where it left off.
    pub fn start(&self) -> Vec<SideEffect> {
        let pending = match self.state.stage {
            Stage::Loading => Some(TimerKind::LoadingDelay),
            Stage::CardReveal => Some(TimerKind::RevealDelay),
            Stage::TicketView if self.state.download_pending => {
                Some(TimerKind::DownloadProcessing)
            }
            Stage::Final if self.state.celebrating => Some(TimerKind::CelebrationEnd),
            _ => None,
        };
        pending.map(|kind| self.schedule(kind)).into_iter().collect()
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    pub fn drag_progress(&self) -> f32 {
        self.state.drag_progress
    }

    pub fn is_dragging(&self) -> bool {
        self.state.dragging
    }

    pub fn flags(&self) -> InteractionFlags {
        self.state.flags
    }

    pub fn completed(&self) -> &CompletedStages {
        &self.state.completed
    }

    pub fn is_download_pending(&self) -> bool {
        self.state.download_pending
    }

    pub fn view(&self) -> StageView {
        let state = &self.state;
        StageView {
            stage: state.stage,
            tutorial_step: state.tutorial_step,
            tutorial_step_count: self.tutorial_step_count,
            drag_progress: state.drag_progress,
            dragging: state.dragging,
            flags: state.flags,
            completed: state.completed.clone(),
            download_pending: state.download_pending,
            celebrating: state.celebrating,
            download_failed: state.download_failed,
        }
    }

    pub fn handle(&mut self, event: &StageEvent) -> Vec<SideEffect> {
        let mut effects = Vec::new();
        match (self.state.stage, event) {
            (Stage::Loading, StageEvent::LoadingElapsed { skip_tutorial }) => {
                let next = if *skip_tutorial || self.tutorial_step_count == 0 {
                    Stage::EnvelopeDrop
                } else {
                    Stage::Tutorial
                };
                self.state.tutorial_step = 0;
                self.enter(next, &mut effects);
            }
            (Stage::Tutorial, StageEvent::TutorialNext) => {
                if self.state.tutorial_step + 1 >= self.tutorial_step_count {
                    self.enter(Stage::EnvelopeDrop, &mut effects);
                } else {
                    self.state.tutorial_step += 1;
                }
            }
            (Stage::Tutorial, StageEvent::TutorialPrevious) => {
                self.state.tutorial_step = self.state.tutorial_step.saturating_sub(1);
            }
            (Stage::Tutorial, StageEvent::TutorialSkip) => {
                effects.push(SideEffect::PersistSkipTutorial(true));
                self.enter(Stage::EnvelopeDrop, &mut effects);
            }
            (Stage::EnvelopeDrop, StageEvent::SealHover) => {
                self.enter(Stage::EnvelopeHover, &mut effects);
                self.state.flags.envelope_opened = true;
                effects.push(SideEffect::PlaySound(SoundEffect::Open));
                effects.push(SideEffect::Vibrate(HapticPattern::pulse(SEAL_HAPTIC_MS)));
                self.state.completed.insert(Milestone::EnvelopeOpened);
            }
            (Stage::EnvelopeHover, StageEvent::DragStart) if !self.state.dragging => {
                self.state.dragging = true;
                effects.push(SideEffect::PlaySound(SoundEffect::Drag));
            }
            (Stage::EnvelopeHover, StageEvent::DragMove { client_y }) if self.state.dragging => {
                self.drag_to(*client_y, &mut effects);
            }
            (Stage::EnvelopeHover, StageEvent::DragEnd) if self.state.dragging => {
                self.state.dragging = false;
                if !self.config.drag.is_complete(self.state.drag_progress) {
                    self.state.drag_progress = 0.0;
                }
            }
            (Stage::CardReveal, StageEvent::RevealElapsed) => {
                self.enter(Stage::Card3d, &mut effects);
            }
            (Stage::Card3d, StageEvent::CardClick) => {
                let open = !self.state.flags.card_open;
                self.state.flags.card_open = open;
                effects.push(SideEffect::PlaySound(SoundEffect::Click));
                effects.push(SideEffect::Vibrate(HapticPattern::pulse(CARD_HAPTIC_MS)));
                if open {
                    self.state.completed.insert(Milestone::CardOpened);
                }
            }
            (Stage::Card3d, StageEvent::TicketClick) if self.state.flags.card_open => {
                self.enter(Stage::TicketView, &mut effects);
                effects.push(SideEffect::PlaySound(SoundEffect::Success));
                effects.push(SideEffect::Vibrate(HapticPattern::sequence(
                    &TICKET_HAPTIC_PATTERN,
                )));
                self.state.completed.insert(Milestone::TicketFound);
            }
            (Stage::TicketView, StageEvent::ReturnToCard) => {
                self.enter(Stage::Card3d, &mut effects);
                effects.push(SideEffect::Vibrate(HapticPattern::pulse(RETURN_HAPTIC_MS)));
                effects.push(SideEffect::PlaySound(SoundEffect::Success));
            }
            (Stage::TicketView, StageEvent::DownloadRequested)
                if !self.state.download_pending =>
            {
                self.state.download_pending = true;
                effects.push(SideEffect::Vibrate(HapticPattern::sequence(
                    &DOWNLOAD_HAPTIC_PATTERN,
                )));
                effects.push(SideEffect::BeginDownload);
            }
            (Stage::TicketView, StageEvent::DownloadFinished { succeeded })
                if self.state.download_pending =>
            {
                self.enter(Stage::Final, &mut effects);
                self.state.celebrating = true;
                self.state.download_failed = !*succeeded;
                if *succeeded {
                    self.state.completed.insert(Milestone::GiftDownloaded);
                    effects.push(SideEffect::PlaySound(SoundEffect::Success));
                }
                effects.push(self.schedule(TimerKind::CelebrationEnd));
            }
            (Stage::Final, StageEvent::CelebrationElapsed) => {
                self.state.celebrating = false;
            }
            (Stage::Final, StageEvent::ReturnToCard) => {
                self.enter(Stage::Card3d, &mut effects);
                effects.push(SideEffect::PlaySound(SoundEffect::Success));
            }
            (Stage::Final, StageEvent::Restart) => {
                self.enter(Stage::Loading, &mut effects);
                self.state = SessionState::fresh();
                effects.push(self.schedule(TimerKind::LoadingDelay));
            }
            _ => {}
        }
        effects
    }

    fn drag_to(&mut self, client_y: f32, effects: &mut Vec<SideEffect>) {
        let drag = self.config.drag;
        let progress = drag.progress_for(client_y);
        self.state.drag_progress = progress;
        if !drag.is_complete(progress) {
            return;
        }

        self.state.dragging = false;
        let next = self.config.post_drag_stage.stage();
        self.enter(next, effects);
        effects.push(SideEffect::PlaySound(SoundEffect::Success));
        self.state.completed.insert(Milestone::CardRevealed);
        if self.config.post_drag_stage == PostDragStage::CardReveal {
            effects.push(self.schedule(TimerKind::RevealDelay));
        }
    }

    /// Moves to `next`, cancelling timers owned by the stage being left and
    /// clearing per-stage transient state.
    fn enter(&mut self, next: Stage, effects: &mut Vec<SideEffect>) {
        let previous = self.state.stage;
        if previous == next {
            return;
        }
        effects.extend(
            TimerKind::ALL
                .into_iter()
                .filter(|kind| kind.owner_stage() == previous)
                .map(SideEffect::CancelTimer),
        );
        match previous {
            Stage::TicketView => self.state.download_pending = false,
            Stage::Final => {
                self.state.celebrating = false;
                self.state.download_failed = false;
            }
            _ => {}
        }
        self.state.stage = next;
    }

    fn schedule(&self, kind: TimerKind) -> SideEffect {
        let delay = match kind {
            TimerKind::LoadingDelay => self.config.loading_delay(),
            TimerKind::RevealDelay => self.config.reveal_delay(),
            TimerKind::DownloadProcessing => self.config.download_processing_delay(),
            TimerKind::CelebrationEnd => self.config.celebration_duration(),
        };
        SideEffect::ScheduleTimer { kind, delay }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const TUTORIAL_STEPS: usize = 3;

    fn controller() -> StageController {
        StageController::new(StageConfig::default(), TUTORIAL_STEPS)
    }

    fn reveal_controller() -> StageController {
        StageController::new(
            StageConfig {
                post_drag_stage: PostDragStage::CardReveal,
                ..StageConfig::default()
            },
            TUTORIAL_STEPS,
        )
    }

    fn drive(controller: &mut StageController, events: &[StageEvent]) -> Vec<SideEffect> {
        events
            .iter()
            .flat_map(|event| controller.handle(event))
            .collect()
    }

    fn at_envelope_hover(controller: &mut StageController) {
        drive(
            controller,
            &[
                StageEvent::LoadingElapsed {
                    skip_tutorial: true,
                },
                StageEvent::SealHover,
            ],
        );
        assert_eq!(controller.stage(), Stage::EnvelopeHover);
    }

    fn at_card(controller: &mut StageController) {
        at_envelope_hover(controller);
        drive(
            controller,
            &[StageEvent::DragStart, StageEvent::DragMove { client_y: 400.0 }],
        );
        assert_eq!(controller.stage(), Stage::Card3d);
    }

    fn at_ticket(controller: &mut StageController) {
        at_card(controller);
        drive(controller, &[StageEvent::CardClick, StageEvent::TicketClick]);
        assert_eq!(controller.stage(), Stage::TicketView);
    }

    fn sounds(effects: &[SideEffect]) -> Vec<SoundEffect> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                SideEffect::PlaySound(sound) => Some(*sound),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn start_schedules_loading_delay() {
        let effects = controller().start();
        assert_eq!(
            effects,
            vec![SideEffect::ScheduleTimer {
                kind: TimerKind::LoadingDelay,
                delay: Duration::from_millis(2000),
            }]
        );
    }

    #[test]
    fn loading_goes_to_tutorial_unless_flag_set() {
        let mut first_visit = controller();
        first_visit.handle(&StageEvent::LoadingElapsed {
            skip_tutorial: false,
        });
        assert_eq!(first_visit.stage(), Stage::Tutorial);

        let mut returning = controller();
        returning.handle(&StageEvent::LoadingElapsed {
            skip_tutorial: true,
        });
        assert_eq!(returning.stage(), Stage::EnvelopeDrop);
    }

    #[test]
    fn empty_tutorial_is_never_entered() {
        let mut controller = StageController::new(StageConfig::default(), 0);
        controller.handle(&StageEvent::LoadingElapsed {
            skip_tutorial: false,
        });
        assert_eq!(controller.stage(), Stage::EnvelopeDrop);
    }

    #[test]
    fn tutorial_steps_forward_and_back_then_completes() {
        let mut controller = controller();
        controller.handle(&StageEvent::LoadingElapsed {
            skip_tutorial: false,
        });
        controller.handle(&StageEvent::TutorialPrevious);
        assert_eq!(controller.view().tutorial_step, 0);

        controller.handle(&StageEvent::TutorialNext);
        controller.handle(&StageEvent::TutorialNext);
        assert_eq!(controller.view().tutorial_step, 2);
        controller.handle(&StageEvent::TutorialPrevious);
        assert_eq!(controller.view().tutorial_step, 1);
        controller.handle(&StageEvent::TutorialNext);

        let effects = controller.handle(&StageEvent::TutorialNext);
        assert_eq!(controller.stage(), Stage::EnvelopeDrop);
        assert!(!effects.contains(&SideEffect::PersistSkipTutorial(true)));
    }

    #[test]
    fn skipping_tutorial_persists_flag() {
        let mut controller = controller();
        controller.handle(&StageEvent::LoadingElapsed {
            skip_tutorial: false,
        });
        let effects = controller.handle(&StageEvent::TutorialSkip);
        assert_eq!(controller.stage(), Stage::EnvelopeDrop);
        assert!(effects.contains(&SideEffect::PersistSkipTutorial(true)));
    }

    #[test]
    fn seal_hover_opens_envelope_once() {
        let mut controller = controller();
        controller.handle(&StageEvent::LoadingElapsed {
            skip_tutorial: true,
        });
        let first = controller.handle(&StageEvent::SealHover);
        assert_eq!(controller.stage(), Stage::EnvelopeHover);
        assert!(controller.flags().envelope_opened);
        assert!(controller.completed().contains(Milestone::EnvelopeOpened));
        assert_eq!(sounds(&first), vec![SoundEffect::Open]);

        let second = controller.handle(&StageEvent::SealHover);
        assert!(second.is_empty());
        assert_eq!(controller.stage(), Stage::EnvelopeHover);
        assert_eq!(controller.completed().len(), 1);
    }

    #[test]
    fn drag_past_threshold_transitions_exactly_once() {
        let mut controller = controller();
        at_envelope_hover(&mut controller);

        let start = controller.handle(&StageEvent::DragStart);
        assert_eq!(sounds(&start), vec![SoundEffect::Drag]);
        assert!(controller.is_dragging());

        controller.handle(&StageEvent::DragMove { client_y: 220.0 });
        assert!((controller.drag_progress() - 0.1).abs() < 1e-6);
        controller.handle(&StageEvent::DragMove { client_y: 280.0 });
        assert!((controller.drag_progress() - 0.4).abs() < 1e-6);

        let finish = controller.handle(&StageEvent::DragMove { client_y: 370.0 });
        assert_eq!(controller.stage(), Stage::Card3d);
        assert!(!controller.is_dragging());
        assert_eq!(sounds(&finish), vec![SoundEffect::Success]);
        assert!(controller.completed().contains(Milestone::CardRevealed));

        let after = drive(
            &mut controller,
            &[
                StageEvent::DragMove { client_y: 390.0 },
                StageEvent::DragMove { client_y: 400.0 },
                StageEvent::DragEnd,
            ],
        );
        assert!(after.is_empty());
        assert_eq!(controller.stage(), Stage::Card3d);
    }

    #[test]
    fn abandoned_drag_snaps_back_without_effects() {
        let mut controller = controller();
        at_envelope_hover(&mut controller);
        controller.handle(&StageEvent::DragStart);
        controller.handle(&StageEvent::DragMove { client_y: 300.0 });
        controller.handle(&StageEvent::DragMove { client_y: 360.0 });
        assert!((controller.drag_progress() - 0.8).abs() < 1e-6);

        let effects = controller.handle(&StageEvent::DragEnd);
        assert!(effects.is_empty());
        assert_eq!(controller.drag_progress(), 0.0);
        assert!(!controller.is_dragging());
        assert_eq!(controller.stage(), Stage::EnvelopeHover);
    }

    #[test]
    fn progress_can_fall_while_dragging() {
        let mut controller = controller();
        at_envelope_hover(&mut controller);
        controller.handle(&StageEvent::DragStart);
        controller.handle(&StageEvent::DragMove { client_y: 340.0 });
        controller.handle(&StageEvent::DragMove { client_y: 100.0 });
        assert_eq!(controller.drag_progress(), 0.0);
        assert!(controller.is_dragging());
    }

    #[test]
    fn moves_without_drag_start_are_ignored() {
        let mut controller = controller();
        at_envelope_hover(&mut controller);
        let effects = controller.handle(&StageEvent::DragMove { client_y: 400.0 });
        assert!(effects.is_empty());
        assert_eq!(controller.drag_progress(), 0.0);
        assert_eq!(controller.stage(), Stage::EnvelopeHover);
    }

    #[test]
    fn second_drag_start_is_ignored() {
        let mut controller = controller();
        at_envelope_hover(&mut controller);
        controller.handle(&StageEvent::DragStart);
        assert!(controller.handle(&StageEvent::DragStart).is_empty());
    }

    #[test]
    fn reveal_variant_waits_for_reveal_timer() {
        let mut controller = reveal_controller();
        at_envelope_hover(&mut controller);
        controller.handle(&StageEvent::DragStart);
        let effects = controller.handle(&StageEvent::DragMove { client_y: 400.0 });
        assert_eq!(controller.stage(), Stage::CardReveal);
        assert!(effects.contains(&SideEffect::ScheduleTimer {
            kind: TimerKind::RevealDelay,
            delay: Duration::from_millis(1200),
        }));

        controller.handle(&StageEvent::RevealElapsed);
        assert_eq!(controller.stage(), Stage::Card3d);
    }

    #[test]
    fn card_click_toggles_and_records_first_open() {
        let mut controller = controller();
        at_card(&mut controller);

        let open = controller.handle(&StageEvent::CardClick);
        assert!(controller.flags().card_open);
        assert!(controller.completed().contains(Milestone::CardOpened));
        assert!(open.contains(&SideEffect::Vibrate(HapticPattern::pulse(100))));
        assert_eq!(sounds(&open), vec![SoundEffect::Click]);

        controller.handle(&StageEvent::CardClick);
        assert!(!controller.flags().card_open);
        assert!(controller.completed().contains(Milestone::CardOpened));
        assert_eq!(controller.stage(), Stage::Card3d);
    }

    #[test]
    fn ticket_requires_open_card() {
        let mut controller = controller();
        at_card(&mut controller);
        assert!(controller.handle(&StageEvent::TicketClick).is_empty());
        assert_eq!(controller.stage(), Stage::Card3d);

        controller.handle(&StageEvent::CardClick);
        let effects = controller.handle(&StageEvent::TicketClick);
        assert_eq!(controller.stage(), Stage::TicketView);
        assert!(controller.completed().contains(Milestone::TicketFound));
        assert!(effects.contains(&SideEffect::Vibrate(HapticPattern::sequence(&[50, 25, 50]))));
    }

    #[test]
    fn download_is_debounced_until_finished() {
        let mut controller = controller();
        at_ticket(&mut controller);

        let first = controller.handle(&StageEvent::DownloadRequested);
        assert!(first.contains(&SideEffect::BeginDownload));
        assert!(controller.is_download_pending());
        assert!(controller.handle(&StageEvent::DownloadRequested).is_empty());

        let finished = controller.handle(&StageEvent::DownloadFinished { succeeded: true });
        assert_eq!(controller.stage(), Stage::Final);
        assert!(controller.completed().contains(Milestone::GiftDownloaded));
        assert!(controller.view().celebrating);
        assert!(finished.contains(&SideEffect::ScheduleTimer {
            kind: TimerKind::CelebrationEnd,
            delay: Duration::from_millis(3000),
        }));
    }

    #[test]
    fn finish_without_request_is_ignored() {
        let mut controller = controller();
        at_ticket(&mut controller);
        let effects = controller.handle(&StageEvent::DownloadFinished { succeeded: true });
        assert!(effects.is_empty());
        assert_eq!(controller.stage(), Stage::TicketView);
    }

    #[test]
    fn failed_download_reaches_final_with_notice() {
        let mut controller = controller();
        at_ticket(&mut controller);
        controller.handle(&StageEvent::DownloadRequested);
        let effects = controller.handle(&StageEvent::DownloadFinished { succeeded: false });
        assert_eq!(controller.stage(), Stage::Final);
        assert!(controller.view().download_failed);
        assert!(!controller.completed().contains(Milestone::GiftDownloaded));
        assert!(sounds(&effects).is_empty());
    }

    #[test]
    fn leaving_ticket_view_cancels_pending_download() {
        let mut controller = controller();
        at_ticket(&mut controller);
        controller.handle(&StageEvent::DownloadRequested);

        let effects = controller.handle(&StageEvent::ReturnToCard);
        assert_eq!(controller.stage(), Stage::Card3d);
        assert!(effects.contains(&SideEffect::CancelTimer(TimerKind::DownloadProcessing)));
        assert!(!controller.is_download_pending());
        assert!(controller.flags().card_open);
    }

    #[test]
    fn final_can_return_to_card() {
        let mut controller = controller();
        at_ticket(&mut controller);
        drive(
            &mut controller,
            &[
                StageEvent::DownloadRequested,
                StageEvent::DownloadFinished { succeeded: true },
            ],
        );
        let effects = controller.handle(&StageEvent::ReturnToCard);
        assert_eq!(controller.stage(), Stage::Card3d);
        assert!(effects.contains(&SideEffect::CancelTimer(TimerKind::CelebrationEnd)));
        assert!(!controller.view().celebrating);
    }

    #[test]
    fn restart_resets_session_but_never_touches_flag() {
        let mut controller = controller();
        at_ticket(&mut controller);
        drive(
            &mut controller,
            &[
                StageEvent::DownloadRequested,
                StageEvent::DownloadFinished { succeeded: true },
            ],
        );

        let effects = controller.handle(&StageEvent::Restart);
        assert_eq!(controller.stage(), Stage::Loading);
        assert_eq!(controller.drag_progress(), 0.0);
        assert_eq!(controller.flags(), InteractionFlags::default());
        assert!(controller.completed().is_empty());
        assert!(!effects
            .iter()
            .any(|effect| matches!(effect, SideEffect::PersistSkipTutorial(_))));
        assert!(effects.contains(&SideEffect::ScheduleTimer {
            kind: TimerKind::LoadingDelay,
            delay: Duration::from_millis(2000),
        }));
    }

    #[test]
    fn milestones_never_shrink_before_restart() {
        let mut controller = controller();
        let events = [
            StageEvent::LoadingElapsed {
                skip_tutorial: true,
            },
            StageEvent::SealHover,
            StageEvent::SealHover,
            StageEvent::DragStart,
            StageEvent::DragMove { client_y: 400.0 },
            StageEvent::CardClick,
            StageEvent::CardClick,
            StageEvent::CardClick,
            StageEvent::TicketClick,
            StageEvent::ReturnToCard,
            StageEvent::TicketClick,
            StageEvent::DownloadRequested,
            StageEvent::DownloadFinished { succeeded: true },
            StageEvent::CelebrationElapsed,
        ];
        let mut last = 0;
        for event in &events {
            controller.handle(event);
            let size = controller.completed().len();
            assert!(size >= last, "milestones shrank after {event:?}");
            last = size;
        }
        assert_eq!(last, Milestone::ALL.len());
    }

    #[test]
    fn unrelated_events_are_inert_in_every_stage() {
        let mut controller = controller();
        let effects = drive(
            &mut controller,
            &[
                StageEvent::SealHover,
                StageEvent::DragStart,
                StageEvent::CardClick,
                StageEvent::TicketClick,
                StageEvent::DownloadRequested,
                StageEvent::Restart,
                StageEvent::RevealElapsed,
            ],
        );
        assert!(effects.is_empty());
        assert_eq!(controller.stage(), Stage::Loading);
    }

    fn scheduled(effects: &[SideEffect]) -> Vec<TimerKind> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                SideEffect::ScheduleTimer { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn start_rearms_the_timer_the_stage_waits_on() {
        let mut revealing = reveal_controller();
        at_envelope_hover(&mut revealing);
        drive(
            &mut revealing,
            &[StageEvent::DragStart, StageEvent::DragMove { client_y: 400.0 }],
        );
        assert_eq!(scheduled(&revealing.start()), vec![TimerKind::RevealDelay]);

        let mut downloading = controller();
        at_ticket(&mut downloading);
        assert!(downloading.start().is_empty());
        downloading.handle(&StageEvent::DownloadRequested);
        assert_eq!(scheduled(&downloading.start()), vec![TimerKind::DownloadProcessing]);

        downloading.handle(&StageEvent::DownloadFinished { succeeded: true });
        assert_eq!(scheduled(&downloading.start()), vec![TimerKind::CelebrationEnd]);
        downloading.handle(&StageEvent::CelebrationElapsed);
        assert!(downloading.start().is_empty());
    }

    fn every_event() -> Vec<StageEvent> {
        vec![
            StageEvent::LoadingElapsed {
                skip_tutorial: false,
            },
            StageEvent::LoadingElapsed {
                skip_tutorial: true,
            },
            StageEvent::TutorialNext,
            StageEvent::TutorialPrevious,
            StageEvent::TutorialSkip,
            StageEvent::SealHover,
            StageEvent::DragStart,
            StageEvent::DragMove { client_y: 400.0 },
            StageEvent::DragEnd,
            StageEvent::RevealElapsed,
            StageEvent::CardClick,
            StageEvent::TicketClick,
            StageEvent::ReturnToCard,
            StageEvent::DownloadRequested,
            StageEvent::DownloadFinished { succeeded: true },
            StageEvent::DownloadFinished { succeeded: false },
            StageEvent::CelebrationElapsed,
            StageEvent::Restart,
        ]
    }

    fn controller_in(stage: Stage) -> StageController {
        let mut controller = match stage {
            Stage::CardReveal => reveal_controller(),
            _ => controller(),
        };
        match stage {
            Stage::Loading => {}
            Stage::Tutorial => {
                controller.handle(&StageEvent::LoadingElapsed {
                    skip_tutorial: false,
                });
            }
            Stage::EnvelopeDrop => {
                controller.handle(&StageEvent::LoadingElapsed {
                    skip_tutorial: true,
                });
            }
            Stage::EnvelopeHover => at_envelope_hover(&mut controller),
            Stage::CardReveal => {
                at_envelope_hover(&mut controller);
                drive(
                    &mut controller,
                    &[StageEvent::DragStart, StageEvent::DragMove { client_y: 400.0 }],
                );
            }
            Stage::Card3d => at_card(&mut controller),
            Stage::TicketView => at_ticket(&mut controller),
            Stage::Final => {
                at_ticket(&mut controller);
                drive(
                    &mut controller,
                    &[
                        StageEvent::DownloadRequested,
                        StageEvent::DownloadFinished { succeeded: true },
                    ],
                );
            }
        }
        assert_eq!(controller.stage(), stage);
        controller
    }

    fn has_edge(stage: Stage, event: &StageEvent) -> bool {
        match stage {
            Stage::Loading => matches!(event, StageEvent::LoadingElapsed { .. }),
            Stage::Tutorial => matches!(
                event,
                StageEvent::TutorialNext | StageEvent::TutorialPrevious | StageEvent::TutorialSkip
            ),
            Stage::EnvelopeDrop => matches!(event, StageEvent::SealHover),
            Stage::EnvelopeHover => matches!(
                event,
                StageEvent::DragStart | StageEvent::DragMove { .. } | StageEvent::DragEnd
            ),
            Stage::CardReveal => matches!(event, StageEvent::RevealElapsed),
            Stage::Card3d => matches!(event, StageEvent::CardClick | StageEvent::TicketClick),
            Stage::TicketView => matches!(
                event,
                StageEvent::ReturnToCard
                    | StageEvent::DownloadRequested
                    | StageEvent::DownloadFinished { .. }
            ),
            Stage::Final => matches!(
                event,
                StageEvent::CelebrationElapsed | StageEvent::ReturnToCard | StageEvent::Restart
            ),
        }
    }

    #[test]
    fn every_event_from_every_stage_respects_the_table() {
        for stage in Stage::ALL {
            let start = controller_in(stage);
            for event in every_event() {
                let mut controller = start.clone();
                let effects = controller.handle(&event);
                let after = controller.stage();
                assert!(Stage::ALL.contains(&after));

                if !has_edge(stage, &event) {
                    assert_eq!(after, stage, "{event:?} moved {stage}");
                    assert!(effects.is_empty(), "{event:?} in {stage} had effects");
                    assert_eq!(controller.view(), start.view(), "{event:?} in {stage}");
                    continue;
                }

                let full_reset = stage == Stage::Final && event == StageEvent::Restart;
                if full_reset {
                    assert!(controller.completed().is_empty());
                } else {
                    for milestone in start.completed().iter() {
                        assert!(
                            controller.completed().contains(milestone),
                            "{event:?} in {stage} dropped {milestone}"
                        );
                    }
                }
            }
        }
    }
}
