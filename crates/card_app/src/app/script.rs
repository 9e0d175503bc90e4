use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use card_engine::{
    certificate_serial, CardContent, CertificateError, CertificateService, LoggingHaptics,
    LoggingSoundPlayer, MemoryFlagStore, Milestone, Services, Stage, StageConfig, StageEvent,
    StageRuntime, TimerKind,
};
use serde::Deserialize;
use tracing::info;

/// One scripted input: wait `after_ms` of virtual time, then deliver `event`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScriptStep {
    #[serde(default)]
    pub(crate) after_ms: u64,
    pub(crate) event: StageEvent,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Transition {
    pub(crate) at_ms: u64,
    pub(crate) stage: Stage,
    pub(crate) cause: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReplaySummary {
    pub(crate) transitions: Vec<Transition>,
    pub(crate) final_stage: Stage,
    pub(crate) percent: u8,
    pub(crate) milestones: Vec<Milestone>,
}

/// Reports where the certificate would go without touching the disk.
#[derive(Debug, Clone)]
struct DryRunCertificate {
    path: PathBuf,
    serial: String,
}

impl CertificateService for DryRunCertificate {
    fn generate_and_download(&mut self) -> Result<PathBuf, CertificateError> {
        info!(path = %self.path.display(), serial = %self.serial, "certificate_dry_run");
        Ok(self.path.clone())
    }
}

pub(crate) fn load_script(path: &Path) -> Result<Vec<ScriptStep>, String> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("failed to read script {}: {error}", path.display()))?;
    parse_script(&raw)
}

pub(crate) fn parse_script(raw: &str) -> Result<Vec<ScriptStep>, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, Vec<ScriptStep>>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        let path = if path.is_empty() { ".".to_string() } else { path };
        format!("parse script json at {path}: {}", error.into_inner())
    })
}

fn replay_services(content: &CardContent, downloads_dir: &Path) -> Services {
    Services::silent()
        .with_sound(LoggingSoundPlayer)
        .with_haptics(LoggingHaptics)
        .with_certificate(DryRunCertificate {
            path: downloads_dir.join(card_engine::services::CERTIFICATE_FILE_NAME),
            serial: certificate_serial(content),
        })
        .with_flags(MemoryFlagStore::default())
}

/// Replays `steps` on a virtual clock, then lets pending timers run out.
pub(crate) fn replay(
    steps: &[ScriptStep],
    config: StageConfig,
    content: &CardContent,
    downloads_dir: &Path,
) -> ReplaySummary {
    let services = replay_services(content, downloads_dir);
    let mut runtime = StageRuntime::new(config, content.tutorial.len(), services);
    let mut clock = ReplayClock::default();
    runtime.mount();

    for step in steps {
        clock.run_for(&mut runtime, Duration::from_millis(step.after_ms));
        let cause = event_name(&step.event);
        if runtime.dispatch(step.event.clone()) {
            clock.record(runtime.stage(), cause);
        }
    }
    clock.settle(&mut runtime);

    let view = runtime.view();
    runtime.unmount();
    ReplaySummary {
        transitions: clock.transitions,
        final_stage: view.stage,
        percent: view.completed.percent(),
        milestones: view.completed.iter().collect(),
    }
}

pub(crate) fn write_summary(summary: &ReplaySummary, out: &mut impl Write) -> io::Result<()> {
    for transition in &summary.transitions {
        writeln!(
            out,
            "{:>7} ms  {:<15} ({})",
            transition.at_ms,
            transition.stage.to_string(),
            transition.cause
        )?;
    }
    let milestones = summary
        .milestones
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    writeln!(
        out,
        "final stage: {}, progress: {}%, milestones: [{}]",
        summary.final_stage,
        summary.percent,
        milestones.join(", ")
    )
}

#[derive(Debug, Default)]
struct ReplayClock {
    elapsed: Duration,
    transitions: Vec<Transition>,
}

impl ReplayClock {
    fn record(&mut self, stage: Stage, cause: String) {
        self.transitions.push(Transition {
            at_ms: self.elapsed.as_millis() as u64,
            stage,
            cause,
        });
    }

    /// Advances timer by timer so each timed transition is stamped with its own deadline.
    fn run_for(&mut self, runtime: &mut StageRuntime, window: Duration) {
        let mut left = window;
        loop {
            match next_deadline(runtime) {
                Some(due) if due <= left => {
                    let before = runtime.stage();
                    let fired = runtime.advance(due);
                    self.elapsed += due;
                    left -= due;
                    if runtime.stage() != before {
                        let cause = fired
                            .last()
                            .map(|kind| format!("{kind:?} timer"))
                            .unwrap_or_else(|| "timer".to_string());
                        self.record(runtime.stage(), cause);
                    }
                    if fired.is_empty() {
                        break;
                    }
                }
                _ => {
                    runtime.advance(left);
                    self.elapsed += left;
                    break;
                }
            }
        }
    }

    fn settle(&mut self, runtime: &mut StageRuntime) {
        for _ in 0..=TimerKind::ALL.len() {
            match next_deadline(runtime) {
                Some(due) => self.run_for(runtime, due),
                None => break,
            }
        }
    }
}

fn next_deadline(runtime: &StageRuntime) -> Option<Duration> {
    TimerKind::ALL
        .iter()
        .filter_map(|kind| runtime.timers().remaining(*kind))
        .min()
}

fn event_name(event: &StageEvent) -> String {
    serde_json::to_value(event)
        .ok()
        .and_then(|value| value.get("type").and_then(|kind| kind.as_str()).map(str::to_string))
        .unwrap_or_else(|| "event".to_string())
}
