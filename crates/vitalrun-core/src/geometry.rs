use serde::{Deserialize, Serialize};

/// Axis-aligned box in screen orientation (y grows downward, `y` is the top edge).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Strict horizontal overlap; touching edges do not count.
    pub fn overlaps_x(&self, other: &Aabb) -> bool {
        self.left() < other.right() && self.right() > other.left()
    }

    /// Strict overlap on both axes.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.overlaps_x(other) && self.top() < other.bottom() && self.bottom() > other.top()
    }

    /// Same box shifted horizontally by `-offset` (world space to screen space).
    pub fn translated_x(&self, offset: f32) -> Aabb {
        Aabb {
            x: self.x - offset,
            ..*self
        }
    }
}

/// Half-open interval `[x, x + width)` on the horizontal axis.
pub fn span_contains(x: f32, width: f32, point: f32) -> bool {
    point >= x && point < x + width
}

/// Euclidean distance between two points.
pub fn distance(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let dx = ax - bx;
    let dy = ay - by;
    (dx * dx + dy * dy).sqrt()
}
