use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::StageConfig;
use crate::services::{ServiceError, Services};

use super::{
    vertical_coordinate, PointerSample, SideEffect, Stage, StageController, StageEvent, StageView,
    TimerKind, TimerQueue,
};

/// Runs the controller against real collaborators: executes its side effects,
/// owns the timer queue and turns fired timers back into events.
pub struct StageRuntime {
    controller: StageController,
    timers: TimerQueue,
    services: Services,
    mounted: bool,
}

impl StageRuntime {
    pub fn new(config: StageConfig, tutorial_step_count: usize, services: Services) -> Self {
        Self {
            controller: StageController::new(config, tutorial_step_count),
            timers: TimerQueue::new(),
            services,
            mounted: false,
        }
    }

    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        info!(stage = %self.controller.stage(), "stage_mounted");
        let effects = self.controller.start();
        self.execute(effects);
    }

    /// Cancels every pending timer so nothing fires against a torn-down session.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.timers.cancel_all();
        info!(stage = %self.controller.stage(), "stage_unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Returns true when the event changed the current stage.
    pub fn dispatch(&mut self, event: StageEvent) -> bool {
        let before = self.controller.stage();
        let effects = self.controller.handle(&event);
        let after = self.controller.stage();
        if before != after {
            info!(from = %before, to = %after, event = ?event, "stage_changed");
        } else if effects.is_empty() {
            debug!(stage = %before, event = ?event, "event_ignored");
        }
        self.execute(effects);
        before != after
    }

    /// Feeds a raw pointer reading through the input normalizer. Samples with
    /// no usable coordinate are dropped.
    pub fn pointer_moved(&mut self, sample: &PointerSample) -> bool {
        match vertical_coordinate(sample) {
            Some(client_y) => self.dispatch(StageEvent::DragMove { client_y }),
            None => false,
        }
    }

    /// Advances the virtual clock and handles every timer that comes due,
    /// including timers scheduled by earlier handlers within the same window.
    pub fn advance(&mut self, dt: Duration) -> Vec<TimerKind> {
        let mut fired = Vec::new();
        if !self.mounted {
            return fired;
        }
        let until = self.timers.now().saturating_add(dt);
        while let Some(kind) = self.timers.pop_due(until) {
            fired.push(kind);
            self.on_timer(kind);
        }
        self.timers.advance_clock_to(until);
        fired
    }

    pub fn view(&self) -> StageView {
        self.controller.view()
    }

    pub fn stage(&self) -> Stage {
        self.controller.stage()
    }

    pub fn controller(&self) -> &StageController {
        &self.controller
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn config(&self) -> &StageConfig {
        self.controller.config()
    }

    fn on_timer(&mut self, kind: TimerKind) {
        debug!(timer = ?kind, stage = %self.controller.stage(), "timer_fired");
        let event = match kind {
            TimerKind::LoadingDelay => StageEvent::LoadingElapsed {
                skip_tutorial: self.services.flags.skip_tutorial(),
            },
            TimerKind::RevealDelay => StageEvent::RevealElapsed,
            TimerKind::DownloadProcessing => {
                let succeeded = match self.services.certificate.generate_and_download() {
                    Ok(path) => {
                        debug!(path = %path.display(), "download_completed");
                        true
                    }
                    Err(error) => {
                        warn!(error = %error, "certificate_failed");
                        false
                    }
                };
                StageEvent::DownloadFinished { succeeded }
            }
            TimerKind::CelebrationEnd => StageEvent::CelebrationElapsed,
        };
        self.dispatch(event);
    }

    fn execute(&mut self, effects: Vec<SideEffect>) {
        for effect in effects {
            match effect {
                SideEffect::PlaySound(sound) => {
                    if let Err(error) = self.services.sound.play(sound) {
                        log_service_error("sound", &error);
                    }
                }
                SideEffect::Vibrate(pattern) => {
                    if let Err(error) = self.services.haptics.vibrate(&pattern) {
                        log_service_error("haptics", &error);
                    }
                }
                SideEffect::ScheduleTimer { kind, delay } => {
                    self.timers.schedule(kind, delay);
                }
                SideEffect::CancelTimer(kind) => {
                    if self.timers.cancel(kind) {
                        debug!(timer = ?kind, "timer_cancelled");
                    }
                }
                SideEffect::BeginDownload => {
                    let delay = self.controller.config().download_processing_delay();
                    self.timers.schedule(TimerKind::DownloadProcessing, delay);
                }
                SideEffect::PersistSkipTutorial(value) => {
                    if let Err(error) = self.services.flags.set_skip_tutorial(value) {
                        warn!(error = %error, "flag_store_write_failed");
                    }
                }
            }
        }
    }
}

fn log_service_error(service: &'static str, error: &ServiceError) {
    match error {
        ServiceError::Unsupported(_) => debug!(service, error = %error, "service_unavailable"),
        ServiceError::Failed { .. } => warn!(service, error = %error, "service_failed"),
    }
}
