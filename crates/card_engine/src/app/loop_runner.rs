use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{debug, info, warn};
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, TouchPhase, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::content::CardContent;

use super::rendering::{FrameData, Renderer};
use super::{
    keyboard_events, pointer_events, present, progress_indicator, ActiveTouches, KeyTrigger,
    Layout, PointerAction, PointerSample, Stage, StageRuntime, Vec2,
};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub logical_width: u32,
    pub logical_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Birthday Card".to_string(),
            logical_width: 480,
            logical_height: 800,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the card window and drives `runtime` until the window closes.
pub fn run_app(
    config: LoopConfig,
    mut runtime: StageRuntime,
    content: CardContent,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.logical_width as f64,
                config.logical_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta = if config.max_frame_delta.is_zero() {
        Duration::from_millis(250)
    } else {
        config.max_frame_delta
    };
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        logical_width = config.logical_width,
        logical_height = config.logical_height,
        "loop_config"
    );

    let mut input = InputCollector::new(window.scale_factor());
    let mut layout = logical_layout(&window);
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut frame_index = 0u64;
    let mut last_stage: Option<Stage> = None;

    runtime.mount();

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    layout = logical_layout(&window);
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                    input.set_scale_factor(scale_factor);
                    layout = logical_layout(&window);
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::CursorMoved { position, .. } => input.cursor_moved(position),
                WindowEvent::CursorLeft { .. } => input.cursor_left(),
                WindowEvent::MouseInput { state, button, .. } => {
                    input.handle_mouse_input(button, state);
                }
                WindowEvent::Touch(touch) => {
                    input.handle_touch(touch.id, touch.phase, touch.location);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input.handle_key(event.physical_key, event.state, event.repeat);
                    if input.quit_requested() {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    for action in input.take_pointer_actions() {
                        for stage_event in pointer_events(&action, &runtime.view(), &layout) {
                            runtime.dispatch(stage_event);
                        }
                    }
                    for trigger in input.take_key_triggers() {
                        let view = runtime.view();
                        for stage_event in keyboard_events(trigger, &view, &runtime.config().drag)
                        {
                            runtime.dispatch(stage_event);
                        }
                    }

                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;
                    accumulator = accumulator.saturating_add(raw_frame_dt.min(max_frame_delta));

                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    for _ in 0..step_plan.ticks_to_run {
                        runtime.advance(fixed_dt);
                    }
                    accumulator = step_plan.remaining_accumulator;
                    if step_plan.dropped_backlog > Duration::ZERO {
                        debug!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame,
                            "sim_clamp_triggered"
                        );
                    }

                    let view = runtime.view();
                    if last_stage != Some(view.stage) {
                        window.set_title(&format!("{} - {}", config.window_title, view.stage));
                        last_stage = Some(view.stage);
                    }
                    let frame = FrameData {
                        presentation: present(&view),
                        indicator: progress_indicator(&view),
                        content: &content,
                        layout: &layout,
                        scale_factor: window.scale_factor() as f32,
                        frame_index,
                    };
                    if let Err(error) = renderer.render(&frame) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    frame_index = frame_index.wrapping_add(1);
                }
                _ => {}
            },
            Event::AboutToWait => window.request_redraw(),
            Event::LoopExiting => {
                runtime.unmount();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn logical_layout(window: &winit::window::Window) -> Layout {
    let size: LogicalSize<f32> = window.inner_size().to_logical(window.scale_factor());
    Layout::for_viewport(size.width, size.height)
}

/// Turns raw window input into pointer actions and key triggers, in logical
/// pixels, queued until the next frame drains them.
#[derive(Debug)]
struct InputCollector {
    scale_factor: f64,
    cursor: Option<Vec2>,
    left_mouse_is_down: bool,
    touches: ActiveTouches,
    pointer_actions: Vec<PointerAction>,
    key_triggers: Vec<KeyTrigger>,
    quit_requested: bool,
}

impl InputCollector {
    fn new(scale_factor: f64) -> Self {
        Self {
            scale_factor: if scale_factor > 0.0 { scale_factor } else { 1.0 },
            cursor: None,
            left_mouse_is_down: false,
            touches: ActiveTouches::default(),
            pointer_actions: Vec::new(),
            key_triggers: Vec::new(),
            quit_requested: false,
        }
    }

    fn set_scale_factor(&mut self, scale_factor: f64) {
        if scale_factor > 0.0 {
            self.scale_factor = scale_factor;
        }
    }

    fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    fn to_logical(&self, position: PhysicalPosition<f64>) -> Vec2 {
        let logical = position.to_logical::<f32>(self.scale_factor);
        Vec2 {
            x: logical.x,
            y: logical.y,
        }
    }

    fn cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        let position = self.to_logical(position);
        self.cursor = Some(position);
        self.pointer_actions.push(PointerAction::Moved {
            position,
            sample: PointerSample::Mouse {
                client_x: position.x,
                client_y: position.y,
            },
        });
    }

    fn cursor_left(&mut self) {
        self.cursor = None;
        self.pointer_actions.push(PointerAction::Left);
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed => {
                if !self.left_mouse_is_down {
                    if let Some(position) = self.cursor {
                        self.pointer_actions
                            .push(PointerAction::Pressed { position });
                    }
                }
                self.left_mouse_is_down = true;
            }
            ElementState::Released => {
                if self.left_mouse_is_down {
                    self.pointer_actions.push(PointerAction::Released);
                }
                self.left_mouse_is_down = false;
            }
        }
    }

    /// Only the first active touch drives the pointer.
    fn handle_touch(&mut self, id: u64, phase: TouchPhase, location: PhysicalPosition<f64>) {
        let position = self.to_logical(location);
        match phase {
            TouchPhase::Started => {
                self.touches.start(id, position.x, position.y);
                if self.touches.is_primary(id) {
                    self.pointer_actions
                        .push(PointerAction::Pressed { position });
                }
            }
            TouchPhase::Moved => {
                if self.touches.update(id, position.x, position.y) && self.touches.is_primary(id) {
                    self.pointer_actions.push(PointerAction::Moved {
                        position,
                        sample: self.touches.sample(),
                    });
                }
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                let was_primary = self.touches.is_primary(id);
                if self.touches.end(id) && was_primary {
                    self.pointer_actions.push(PointerAction::Released);
                }
            }
        }
    }

    fn handle_key(&mut self, key: PhysicalKey, state: ElementState, repeat: bool) {
        if state != ElementState::Pressed || repeat {
            return;
        }
        match key {
            PhysicalKey::Code(KeyCode::Enter | KeyCode::NumpadEnter | KeyCode::Space) => {
                self.key_triggers.push(KeyTrigger::Primary);
            }
            PhysicalKey::Code(KeyCode::Backspace) => self.key_triggers.push(KeyTrigger::Back),
            PhysicalKey::Code(KeyCode::Escape) => self.quit_requested = true,
            _ => {}
        }
    }

    fn take_pointer_actions(&mut self) -> Vec<PointerAction> {
        std::mem::take(&mut self.pointer_actions)
    }

    fn take_key_triggers(&mut self) -> Vec<KeyTrigger> {
        std::mem::take(&mut self.key_triggers)
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;
    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}
