use super::{vertical_coordinate, DragSettings, PointerSample, Stage, StageEvent, StageView};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// Axis-aligned rectangle in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn centered(center: Vec2, width: f32, height: f32) -> Self {
        Self::new(
            center.x - width * 0.5,
            center.y - height * 0.5,
            width,
            height,
        )
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2 {
            x: self.x + self.width * 0.5,
            y: self.y + self.height * 0.5,
        }
    }

    pub fn scaled(&self, factor: f32) -> Rect {
        Rect::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }
}

/// Hit regions for every interactive element, derived from the logical viewport.
/// The envelope sits near the top so that pulling the card down towards the
/// drag origin and span reads naturally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub viewport: Vec2,
    pub envelope: Rect,
    pub seal: Rect,
    pub card_handle: Rect,
    pub card: Rect,
    pub ticket: Rect,
    pub back_button: Rect,
    pub download_button: Rect,
    pub return_button: Rect,
    pub restart_button: Rect,
    pub tutorial_previous: Rect,
    pub tutorial_skip: Rect,
    pub tutorial_next: Rect,
}

const BUTTON_WIDTH: f32 = 240.0;
const BUTTON_HEIGHT: f32 = 56.0;
const TUTORIAL_BUTTON_WIDTH: f32 = 120.0;

impl Layout {
    pub fn for_viewport(width: f32, height: f32) -> Self {
        let width = width.max(1.0);
        let height = height.max(1.0);
        let center_x = width * 0.5;
        let envelope = Rect::new(center_x - 160.0, 160.0, 320.0, 220.0);
        let card = Rect::new(center_x - 170.0, 120.0, 340.0, 440.0);
        let tutorial_y = height - 120.0;
        let tutorial_gap = 12.0;

        Self {
            viewport: Vec2 {
                x: width,
                y: height,
            },
            envelope,
            seal: Rect::centered(
                Vec2 {
                    x: center_x,
                    y: envelope.y + envelope.height * 0.5,
                },
                72.0,
                72.0,
            ),
            card_handle: Rect::new(center_x - 140.0, envelope.y - 40.0, 280.0, 120.0),
            card,
            ticket: Rect::new(center_x - 110.0, card.y + card.height - 150.0, 220.0, 90.0),
            back_button: Rect::new(24.0, 24.0, 140.0, 48.0),
            download_button: Rect::new(
                center_x - BUTTON_WIDTH * 0.5,
                height - 160.0,
                BUTTON_WIDTH,
                BUTTON_HEIGHT,
            ),
            return_button: Rect::new(
                center_x - BUTTON_WIDTH * 0.5,
                height - 220.0,
                BUTTON_WIDTH,
                BUTTON_HEIGHT,
            ),
            restart_button: Rect::new(
                center_x - BUTTON_WIDTH * 0.5,
                height - 150.0,
                BUTTON_WIDTH,
                BUTTON_HEIGHT,
            ),
            tutorial_previous: Rect::new(
                center_x - TUTORIAL_BUTTON_WIDTH * 1.5 - tutorial_gap,
                tutorial_y,
                TUTORIAL_BUTTON_WIDTH,
                BUTTON_HEIGHT,
            ),
            tutorial_skip: Rect::new(
                center_x - TUTORIAL_BUTTON_WIDTH * 0.5,
                tutorial_y,
                TUTORIAL_BUTTON_WIDTH,
                BUTTON_HEIGHT,
            ),
            tutorial_next: Rect::new(
                center_x + TUTORIAL_BUTTON_WIDTH * 0.5 + tutorial_gap,
                tutorial_y,
                TUTORIAL_BUTTON_WIDTH,
                BUTTON_HEIGHT,
            ),
        }
    }
}

/// A pointer edge from the host, already converted to logical pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerAction {
    Moved {
        position: Vec2,
        sample: PointerSample,
    },
    Pressed {
        position: Vec2,
    },
    Released,
    Left,
}

pub fn pointer_events(
    action: &PointerAction,
    view: &StageView,
    layout: &Layout,
) -> Vec<StageEvent> {
    match action {
        PointerAction::Moved { position, sample } => match view.stage {
            Stage::EnvelopeDrop if layout.seal.contains(*position) => vec![StageEvent::SealHover],
            Stage::EnvelopeHover if view.dragging => vertical_coordinate(sample)
                .map(|client_y| StageEvent::DragMove { client_y })
                .into_iter()
                .collect(),
            _ => Vec::new(),
        },
        PointerAction::Pressed { position } => pressed_events(*position, view, layout)
            .into_iter()
            .collect(),
        PointerAction::Released | PointerAction::Left => {
            if view.stage == Stage::EnvelopeHover && view.dragging {
                vec![StageEvent::DragEnd]
            } else {
                Vec::new()
            }
        }
    }
}

fn pressed_events(position: Vec2, view: &StageView, layout: &Layout) -> Option<StageEvent> {
    let hit = |rect: Rect| rect.contains(position);
    match view.stage {
        Stage::Tutorial if hit(layout.tutorial_previous) => Some(StageEvent::TutorialPrevious),
        Stage::Tutorial if hit(layout.tutorial_skip) => Some(StageEvent::TutorialSkip),
        Stage::Tutorial if hit(layout.tutorial_next) => Some(StageEvent::TutorialNext),
        Stage::EnvelopeDrop if hit(layout.seal) => Some(StageEvent::SealHover),
        Stage::EnvelopeHover if hit(layout.card_handle) => Some(StageEvent::DragStart),
        Stage::Card3d if view.flags.card_open && hit(layout.ticket) => {
            Some(StageEvent::TicketClick)
        }
        Stage::Card3d if hit(layout.card) => Some(StageEvent::CardClick),
        Stage::TicketView if hit(layout.back_button) => Some(StageEvent::ReturnToCard),
        Stage::TicketView if hit(layout.download_button) => Some(StageEvent::DownloadRequested),
        Stage::Final if hit(layout.return_button) => Some(StageEvent::ReturnToCard),
        Stage::Final if hit(layout.restart_button) => Some(StageEvent::Restart),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTrigger {
    /// Enter or Space.
    Primary,
    /// Backspace.
    Back,
}

pub fn keyboard_events(
    trigger: KeyTrigger,
    view: &StageView,
    drag: &DragSettings,
) -> Vec<StageEvent> {
    match (trigger, view.stage) {
        (KeyTrigger::Primary, Stage::Tutorial) => vec![StageEvent::TutorialNext],
        (KeyTrigger::Primary, Stage::EnvelopeDrop) => vec![StageEvent::SealHover],
        (KeyTrigger::Primary, Stage::EnvelopeHover) => {
            let full_pull = StageEvent::DragMove {
                client_y: drag.full_pull_client_y(),
            };
            if view.dragging {
                vec![full_pull]
            } else {
                vec![StageEvent::DragStart, full_pull]
            }
        }
        (KeyTrigger::Primary, Stage::Card3d) if view.flags.card_open => {
            vec![StageEvent::TicketClick]
        }
        (KeyTrigger::Primary, Stage::Card3d) => vec![StageEvent::CardClick],
        (KeyTrigger::Primary, Stage::TicketView) => vec![StageEvent::DownloadRequested],
        (KeyTrigger::Primary, Stage::Final) => vec![StageEvent::Restart],
        (KeyTrigger::Back, Stage::Tutorial) => vec![StageEvent::TutorialPrevious],
        (KeyTrigger::Back, Stage::Card3d) if view.flags.card_open => vec![StageEvent::CardClick],
        (KeyTrigger::Back, Stage::TicketView | Stage::Final) => vec![StageEvent::ReturnToCard],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{CompletedStages, InteractionFlags, StageController};
    use crate::config::StageConfig;

    const WIDTH: f32 = 480.0;
    const HEIGHT: f32 = 800.0;

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

    fn mouse_at(position: Vec2) -> PointerAction {
        PointerAction::Moved {
            position,
            sample: PointerSample::Mouse {
                client_x: position.x,
                client_y: position.y,
            },
        }
    }

    #[test]
    fn rect_contains_is_half_open() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(rect.contains(Vec2 { x: 10.0, y: 10.0 }));
        assert!(!rect.contains(Vec2 { x: 30.0, y: 15.0 }));
        assert_eq!(rect.center(), Vec2 { x: 20.0, y: 20.0 });
        assert_eq!(rect.scaled(2.0), Rect::new(20.0, 20.0, 40.0, 40.0));
    }

    #[test]
    fn hovering_seal_opens_envelope() {
        let layout = Layout::for_viewport(WIDTH, HEIGHT);
        let events = pointer_events(
            &mouse_at(layout.seal.center()),
            &view(Stage::EnvelopeDrop),
            &layout,
        );
        assert_eq!(events, vec![StageEvent::SealHover]);

        let away = pointer_events(
            &mouse_at(Vec2 { x: 2.0, y: 2.0 }),
            &view(Stage::EnvelopeDrop),
            &layout,
        );
        assert!(away.is_empty());
    }

    #[test]
    fn drag_moves_use_normalized_vertical_coordinate() {
        let layout = Layout::for_viewport(WIDTH, HEIGHT);
        let mut dragging = view(Stage::EnvelopeHover);
        dragging.dragging = true;

        let touch = PointerAction::Moved {
            position: Vec2 { x: 240.0, y: 330.0 },
            sample: PointerSample::Touch {
                touches: vec![crate::app::TouchPoint {
                    id: 1,
                    client_x: 240.0,
                    client_y: 330.0,
                }],
            },
        };
        assert_eq!(
            pointer_events(&touch, &dragging, &layout),
            vec![StageEvent::DragMove { client_y: 330.0 }]
        );

        let lifted = PointerAction::Moved {
            position: Vec2 { x: 240.0, y: 330.0 },
            sample: PointerSample::Touch {
                touches: Vec::new(),
            },
        };
        assert!(pointer_events(&lifted, &dragging, &layout).is_empty());
        assert_eq!(
            pointer_events(&PointerAction::Left, &dragging, &layout),
            vec![StageEvent::DragEnd]
        );
        assert!(pointer_events(
            &PointerAction::Released,
            &view(Stage::EnvelopeHover),
            &layout
        )
        .is_empty());
    }

    #[test]
    fn ticket_hit_only_counts_when_card_open() {
        let layout = Layout::for_viewport(WIDTH, HEIGHT);
        let press = PointerAction::Pressed {
            position: layout.ticket.center(),
        };
        assert_eq!(
            pointer_events(&press, &view(Stage::Card3d), &layout),
            vec![StageEvent::CardClick]
        );

        let mut open = view(Stage::Card3d);
        open.flags.card_open = true;
        assert_eq!(
            pointer_events(&press, &open, &layout),
            vec![StageEvent::TicketClick]
        );
    }

    #[test]
    fn tutorial_buttons_do_not_overlap() {
        let layout = Layout::for_viewport(WIDTH, HEIGHT);
        let tutorial = view(Stage::Tutorial);
        let pressed = [
            layout.tutorial_previous,
            layout.tutorial_skip,
            layout.tutorial_next,
        ]
        .map(|rect| {
            let press = PointerAction::Pressed {
                position: rect.center(),
            };
            pointer_events(&press, &tutorial, &layout)
        });
        assert_eq!(
            pressed,
            [
                vec![StageEvent::TutorialPrevious],
                vec![StageEvent::TutorialSkip],
                vec![StageEvent::TutorialNext],
            ]
        );
    }

    #[test]
    fn keyboard_can_complete_the_whole_experience() {
        let config = StageConfig::default();
        let mut controller = StageController::new(config, 2);
        controller.handle(&StageEvent::LoadingElapsed {
            skip_tutorial: false,
        });

        let mut guard = 0;
        while controller.stage() != Stage::TicketView && guard < 16 {
            for event in keyboard_events(KeyTrigger::Primary, &controller.view(), &config.drag) {
                controller.handle(&event);
            }
            guard += 1;
        }
        assert_eq!(controller.stage(), Stage::TicketView);

        for event in keyboard_events(KeyTrigger::Back, &controller.view(), &config.drag) {
            controller.handle(&event);
        }
        assert_eq!(controller.stage(), Stage::Card3d);
    }

    #[test]
    fn back_key_is_inert_where_nothing_to_return_to() {
        let drag = DragSettings::default();
        assert!(keyboard_events(KeyTrigger::Back, &view(Stage::Loading), &drag).is_empty());
        assert!(keyboard_events(KeyTrigger::Back, &view(Stage::EnvelopeHover), &drag).is_empty());
    }
}
