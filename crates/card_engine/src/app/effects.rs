use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::TimerKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundEffect {
    Open,
    Drag,
    Success,
    Click,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration_secs: f32,
}

impl SoundEffect {
    pub const fn name(self) -> &'static str {
        match self {
            SoundEffect::Open => "open",
            SoundEffect::Drag => "drag",
            SoundEffect::Success => "success",
            SoundEffect::Click => "click",
        }
    }

    /// C5, E5, G5 and C6.
    pub const fn tone(self) -> Tone {
        match self {
            SoundEffect::Open => Tone {
                frequency_hz: 523.0,
                duration_secs: 0.2,
            },
            SoundEffect::Drag => Tone {
                frequency_hz: 659.0,
                duration_secs: 0.1,
            },
            SoundEffect::Success => Tone {
                frequency_hz: 783.0,
                duration_secs: 0.3,
            },
            SoundEffect::Click => Tone {
                frequency_hz: 1047.0,
                duration_secs: 0.4,
            },
        }
    }
}

/// Alternating vibrate/pause durations in milliseconds, starting with a vibration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HapticPattern(Vec<u32>);

impl HapticPattern {
    pub fn pulse(ms: u32) -> Self {
        Self(vec![ms])
    }

    pub fn sequence(durations_ms: &[u32]) -> Self {
        Self(durations_ms.to_vec())
    }

    pub fn durations_ms(&self) -> &[u32] {
        &self.0
    }

    pub fn total_ms(&self) -> u32 {
        self.0.iter().fold(0u32, |total, ms| total.saturating_add(*ms))
    }
}

/// Requests emitted by the controller. Executed in order by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    PlaySound(SoundEffect),
    Vibrate(HapticPattern),
    ScheduleTimer { kind: TimerKind, delay: Duration },
    CancelTimer(TimerKind),
    BeginDownload,
    PersistSkipTutorial(bool),
}
