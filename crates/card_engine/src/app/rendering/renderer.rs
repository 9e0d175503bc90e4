use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::{Layout, Presentation, ProgressIndicator, Rect};
use crate::content::CardContent;

use super::canvas::{line_height, text_width, wrap_text, Canvas, Rgba};

const BACKGROUND_TOP: Rgba = [88, 28, 135, 255];
const BACKGROUND_BOTTOM: Rgba = [219, 39, 119, 255];
const TEXT_LIGHT: Rgba = [255, 255, 255, 255];
const TEXT_DARK: Rgba = [68, 32, 20, 255];
const TEXT_DIM: Rgba = [255, 255, 255, 190];
const PANEL: Rgba = [255, 255, 255, 60];
const ENVELOPE: Rgba = [245, 222, 179, 255];
const ENVELOPE_FLAP: Rgba = [222, 184, 135, 255];
const SEAL: Rgba = [185, 28, 28, 255];
const CARD_FRONT: Rgba = [254, 243, 199, 255];
const CARD_INSIDE: Rgba = [255, 251, 235, 255];
const CARD_EDGE: Rgba = [217, 119, 6, 255];
const TICKET: Rgba = [250, 204, 21, 255];
const TICKET_EDGE: Rgba = [180, 83, 9, 255];
const BUTTON: Rgba = [255, 255, 255, 230];
const BUTTON_BUSY: Rgba = [200, 200, 200, 230];
const NOTICE: Rgba = [254, 202, 202, 255];
const BAR_TRACK: Rgba = [255, 255, 255, 80];
const CONFETTI: [Rgba; 4] = [
    [250, 204, 21, 255],
    [96, 165, 250, 255],
    [52, 211, 153, 255],
    [248, 113, 113, 255],
];

/// Everything one frame needs, in logical pixels.
pub(crate) struct FrameData<'a> {
    pub presentation: Presentation,
    pub indicator: ProgressIndicator,
    pub content: &'a CardContent,
    pub layout: &'a Layout,
    pub scale_factor: f32,
    pub frame_index: u64,
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    width: u32,
    height: u32,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            width: size.width,
            height: size.height,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width.max(1), height.max(1), surface)
    }

    pub(crate) fn render(&mut self, frame: &FrameData<'_>) -> Result<(), Error> {
        if self.width == 0 || self.height == 0 {
            return Ok(());
        }
        let mut canvas = Canvas::new(self.pixels.frame_mut(), self.width, self.height);
        draw_frame(&mut canvas, frame);
        self.pixels.render()
    }
}

pub(crate) fn draw_frame(canvas: &mut Canvas<'_>, frame: &FrameData<'_>) {
    let mut painter = Painter {
        canvas,
        scale: frame.scale_factor.max(0.1),
    };
    painter.canvas.vertical_gradient(BACKGROUND_TOP, BACKGROUND_BOTTOM);

    let layout = frame.layout;
    let content = frame.content;
    match frame.presentation {
        Presentation::Loading => draw_loading(&mut painter, layout, frame.frame_index),
        Presentation::Tutorial { step, step_count } => {
            draw_tutorial(&mut painter, layout, content, step, step_count)
        }
        Presentation::Envelope {
            opened,
            dragging,
            progress,
        } => draw_envelope(&mut painter, layout, opened, dragging, progress),
        Presentation::CardReveal => {
            painter.fill(layout.card, CARD_FRONT);
            painter.outline(layout.card, 4.0, CARD_EDGE);
            painter.centered_text(layout.card.center().y, 4, &content.greeting, TEXT_DARK);
        }
        Presentation::Card { open } => draw_card(&mut painter, layout, content, open),
        Presentation::Ticket { downloading } => {
            draw_ticket(&mut painter, layout, content, downloading)
        }
        Presentation::Final {
            celebrating,
            notice,
        } => {
            if celebrating {
                draw_confetti(&mut painter, layout, frame.frame_index);
            }
            painter.centered_text(220.0, 6, &content.greeting, TEXT_LIGHT);
            painter.centered_text(290.0, 3, "Enjoy your surprise!", TEXT_DIM);
            if let Some(notice) = notice {
                painter.centered_text(340.0, 3, notice.message(), NOTICE);
            }
            painter.button(layout.return_button, "Back to Card", BUTTON);
            painter.button(layout.restart_button, "Restart", BUTTON);
        }
    }

    if frame.indicator.visible {
        draw_indicator(&mut painter, layout, &frame.indicator);
    }
}

struct Painter<'c, 'f> {
    canvas: &'c mut Canvas<'f>,
    scale: f32,
}

impl Painter<'_, '_> {
    fn px(&self, value: f32) -> i32 {
        (value * self.scale).round() as i32
    }

    fn text_scale(&self, scale: i32) -> i32 {
        ((scale as f32) * self.scale).round().max(1.0) as i32
    }

    fn fill(&mut self, rect: Rect, color: Rgba) {
        let r = rect.scaled(self.scale);
        self.canvas.fill_rect(
            r.x.round() as i32,
            r.y.round() as i32,
            r.width.round() as i32,
            r.height.round() as i32,
            color,
        );
    }

    fn outline(&mut self, rect: Rect, thickness: f32, color: Rgba) {
        let r = rect.scaled(self.scale);
        let thickness = self.px(thickness).max(1);
        self.canvas.outline_rect(
            r.x.round() as i32,
            r.y.round() as i32,
            r.width.round() as i32,
            r.height.round() as i32,
            thickness,
            color,
        );
    }

    fn circle(&mut self, center_x: f32, center_y: f32, radius: f32, color: Rgba) {
        let (x, y, r) = (self.px(center_x), self.px(center_y), self.px(radius));
        self.canvas.fill_circle(x, y, r, color);
    }

    fn text(&mut self, x: f32, y: f32, scale: i32, text: &str, color: Rgba) {
        let (x, y, scale) = (self.px(x), self.px(y), self.text_scale(scale));
        self.canvas.text(x, y, scale, text, color);
    }

    fn centered_text(&mut self, y: f32, scale: i32, text: &str, color: Rgba) {
        let center_x = self.canvas.width() as i32 / 2;
        let (y, scale) = (self.px(y), self.text_scale(scale));
        self.canvas.centered_text(center_x, y, scale, text, color);
    }

    /// Word-wrapped block centered on the viewport; returns the logical y below it.
    fn paragraph(&mut self, y: f32, scale: i32, max_chars: usize, text: &str, color: Rgba) -> f32 {
        let mut y = y;
        for line in wrap_text(text, max_chars) {
            self.centered_text(y, scale, &line, color);
            y += line_height(scale) as f32;
        }
        y
    }

    fn button(&mut self, rect: Rect, label: &str, color: Rgba) {
        self.fill(rect, color);
        self.outline(rect, 2.0, TEXT_DARK);
        let scale = 3;
        let label_width = text_width(label, scale) as f32;
        let label_height = line_height(scale) as f32;
        self.text(
            rect.center().x - label_width * 0.5,
            rect.center().y - label_height * 0.35,
            scale,
            label,
            TEXT_DARK,
        );
    }
}

fn draw_loading(painter: &mut Painter<'_, '_>, layout: &Layout, frame_index: u64) {
    let center = layout.viewport.y * 0.45;
    painter.centered_text(center - 60.0, 5, "Loading...", TEXT_LIGHT);
    let active = (frame_index / 20 % 3) as usize;
    for dot in 0..3 {
        let color = if dot == active { TEXT_LIGHT } else { TEXT_DIM };
        let x = layout.viewport.x * 0.5 + (dot as f32 - 1.0) * 32.0;
        painter.circle(x, center + 20.0, 8.0, color);
    }
}

fn draw_tutorial(
    painter: &mut Painter<'_, '_>,
    layout: &Layout,
    content: &CardContent,
    step: usize,
    step_count: usize,
) {
    let panel = Rect::new(24.0, 120.0, layout.viewport.x - 48.0, layout.viewport.y - 280.0);
    painter.fill(panel, PANEL);
    painter.outline(panel, 2.0, TEXT_DIM);

    let Some(current) = content.tutorial.get(step) else {
        return;
    };
    let after_title = painter.paragraph(170.0, 4, 24, &current.title, TEXT_LIGHT);
    painter.paragraph(after_title + 30.0, 3, 32, &current.body, TEXT_DIM);
    painter.centered_text(
        panel.y + panel.height - 50.0,
        3,
        &format!("{} / {}", step + 1, step_count),
        TEXT_DIM,
    );

    if step > 0 {
        painter.button(layout.tutorial_previous, "Back", BUTTON);
    }
    painter.button(layout.tutorial_skip, "Skip", BUTTON);
    painter.button(layout.tutorial_next, &current.action, BUTTON);
}

fn draw_envelope(
    painter: &mut Painter<'_, '_>,
    layout: &Layout,
    opened: bool,
    dragging: bool,
    progress: f32,
) {
    let envelope = layout.envelope;
    if opened {
        let pulled = Rect {
            y: layout.card_handle.y + progress * 200.0,
            ..layout.card_handle
        };
        painter.fill(pulled, CARD_FRONT);
        painter.outline(pulled, 3.0, CARD_EDGE);
    }

    painter.fill(envelope, ENVELOPE);
    painter.outline(envelope, 3.0, ENVELOPE_FLAP);
    if !opened {
        let flap = Rect::new(envelope.x, envelope.y, envelope.width, envelope.height * 0.45);
        painter.fill(flap, ENVELOPE_FLAP);
        let seal = layout.seal.center();
        painter.circle(seal.x, seal.y, layout.seal.width * 0.5, SEAL);
        painter.centered_text(envelope.y + envelope.height + 40.0, 3, "Hover the seal", TEXT_LIGHT);
    } else if dragging {
        painter.centered_text(
            envelope.y + envelope.height + 40.0,
            3,
            &format!("{}%", (progress * 100.0).round() as u32),
            TEXT_LIGHT,
        );
    } else {
        painter.centered_text(
            envelope.y + envelope.height + 40.0,
            3,
            "Drag the card down",
            TEXT_LIGHT,
        );
    }
}

fn draw_card(painter: &mut Painter<'_, '_>, layout: &Layout, content: &CardContent, open: bool) {
    let card = layout.card;
    if !open {
        painter.fill(card, CARD_FRONT);
        painter.outline(card, 4.0, CARD_EDGE);
        painter.paragraph(card.y + 140.0, 5, 12, &content.greeting, TEXT_DARK);
        painter.centered_text(card.y + card.height - 60.0, 2, "Click to open", TEXT_DARK);
        return;
    }

    painter.fill(card, CARD_INSIDE);
    painter.outline(card, 4.0, CARD_EDGE);
    painter.centered_text(card.y + 30.0, 4, "A Special Note!", TEXT_DARK);
    painter.centered_text(card.y + 80.0, 3, &format!("Dear {},", content.recipient), TEXT_DARK);
    painter.paragraph(card.y + 120.0, 2, 34, &content.message, TEXT_DARK);

    painter.fill(layout.ticket, TICKET);
    painter.outline(layout.ticket, 3.0, TICKET_EDGE);
    painter.centered_text(layout.ticket.y + 22.0, 2, &content.ticket, TEXT_DARK);
    painter.centered_text(layout.ticket.y + 52.0, 2, "Click me!", TEXT_DARK);
}

fn draw_ticket(
    painter: &mut Painter<'_, '_>,
    layout: &Layout,
    content: &CardContent,
    downloading: bool,
) {
    painter.button(layout.back_button, "Back", BUTTON);
    painter.centered_text(120.0, 5, "Your Golden Ticket!", TEXT_LIGHT);

    let ticket = Rect::new(40.0, 200.0, layout.viewport.x - 80.0, 300.0);
    painter.fill(ticket, TICKET);
    painter.outline(ticket, 4.0, TICKET_EDGE);
    let below = painter.paragraph(ticket.y + 40.0, 4, 18, &content.ticket, TEXT_DARK);
    if let Some(line) = content.certificate.lines.first() {
        painter.paragraph(below + 20.0, 2, 34, line, TEXT_DARK);
    }

    if downloading {
        painter.button(layout.download_button, "Preparing...", BUTTON_BUSY);
    } else {
        painter.button(layout.download_button, "Download", BUTTON);
    }
}

fn draw_confetti(painter: &mut Painter<'_, '_>, layout: &Layout, frame_index: u64) {
    for piece in 0..48u64 {
        let seed = piece.wrapping_mul(2_654_435_761) % 1000;
        let x = (seed as f32 / 1000.0) * layout.viewport.x;
        let fall = ((frame_index + piece * 17) % 240) as f32 / 240.0;
        let y = fall * layout.viewport.y;
        let color = CONFETTI[(piece % CONFETTI.len() as u64) as usize];
        painter.fill(Rect::new(x, y, 8.0, 12.0), color);
    }
}

fn draw_indicator(painter: &mut Painter<'_, '_>, layout: &Layout, indicator: &ProgressIndicator) {
    let bar = Rect::new(layout.viewport.x * 0.5 - 100.0, 60.0, 200.0, 10.0);
    painter.centered_text(24.0, 2, indicator.label, TEXT_LIGHT);
    painter.fill(bar, BAR_TRACK);
    let filled = Rect {
        width: bar.width * f32::from(indicator.percent) / 100.0,
        ..bar
    };
    painter.fill(filled, TEXT_LIGHT);
    painter.text(
        bar.x + bar.width + 12.0,
        bar.y - 2.0,
        2,
        &format!("{}%", indicator.percent),
        TEXT_LIGHT,
    );
}
