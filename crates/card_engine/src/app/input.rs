use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: u64,
    pub client_x: f32,
    pub client_y: f32,
}

/// A raw pointer reading before it reaches any stage logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointerSample {
    Mouse { client_x: f32, client_y: f32 },
    Touch { touches: Vec<TouchPoint> },
}

/// Vertical coordinate used for drag progress. The first active touch counts as
/// the mouse; an empty touch list yields nothing and the sample is ignored.
pub fn vertical_coordinate(sample: &PointerSample) -> Option<f32> {
    match sample {
        PointerSample::Mouse { client_y, .. } => Some(*client_y),
        PointerSample::Touch { touches } => touches.first().map(|touch| touch.client_y),
    }
}

/// Active touches in the order they went down.
#[derive(Debug, Clone, Default)]
pub struct ActiveTouches {
    touches: Vec<TouchPoint>,
}

impl ActiveTouches {
    pub fn start(&mut self, id: u64, client_x: f32, client_y: f32) {
        self.touches.retain(|touch| touch.id != id);
        self.touches.push(TouchPoint {
            id,
            client_x,
            client_y,
        });
    }

    pub fn update(&mut self, id: u64, client_x: f32, client_y: f32) -> bool {
        match self.touches.iter_mut().find(|touch| touch.id == id) {
            Some(touch) => {
                touch.client_x = client_x;
                touch.client_y = client_y;
                true
            }
            None => false,
        }
    }

    pub fn end(&mut self, id: u64) -> bool {
        let before = self.touches.len();
        self.touches.retain(|touch| touch.id != id);
        before != self.touches.len()
    }

    pub fn is_primary(&self, id: u64) -> bool {
        self.touches.first().is_some_and(|touch| touch.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.touches.is_empty()
    }

    pub fn sample(&self) -> PointerSample {
        PointerSample::Touch {
            touches: self.touches.clone(),
        }
    }
}
