mod controller;
mod dispatcher;
mod drag;
mod effects;
mod input;
mod interaction;
mod loop_runner;
pub(crate) mod rendering;
mod runtime;
mod stage;
mod timer;

pub use controller::{StageController, StageEvent, StageView};
pub use dispatcher::{
    present, progress_indicator, progress_label, Notice, Presentation, ProgressIndicator,
};
pub use drag::{
    drag_progress, DragSettings, DEFAULT_COMPLETION_THRESHOLD, DEFAULT_DRAG_ORIGIN_PX,
    DEFAULT_DRAG_SPAN_PX,
};
pub use effects::{HapticPattern, SideEffect, SoundEffect, Tone};
pub use input::{vertical_coordinate, ActiveTouches, PointerSample, TouchPoint};
pub use interaction::{
    keyboard_events, pointer_events, KeyTrigger, Layout, PointerAction, Rect, Vec2,
};
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use rendering::Renderer;
pub use runtime::StageRuntime;
pub use stage::{CompletedStages, InteractionFlags, Milestone, Stage};
pub use timer::{TimerKind, TimerQueue};
