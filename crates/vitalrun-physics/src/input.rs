use serde::{Deserialize, Serialize};

/// Input sampled by the host for a single tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// -1 (left), 0, +1 (right). Non-finite values count as 0.
    pub move_dir: f32,
    /// "Up" went down this tick (edge). Starts jumps and double jumps.
    pub jump_pressed: bool,
    /// "Up" is held. Drives gliding.
    pub up_held: bool,
    /// "Down" is held. Crouches while grounded.
    pub down_held: bool,
}

impl TickInput {
    pub fn right() -> Self {
        Self {
            move_dir: 1.0,
            ..Default::default()
        }
    }

    pub fn left() -> Self {
        Self {
            move_dir: -1.0,
            ..Default::default()
        }
    }

    pub fn jump() -> Self {
        Self {
            jump_pressed: true,
            up_held: true,
            ..Default::default()
        }
    }

    /// Held direction as -1, 0 or +1, optionally mirrored.
    pub fn direction(&self, inverted: bool) -> f32 {
        let dir = if self.move_dir.is_finite() {
            self.move_dir
        } else {
            0.0
        };
        let dir = if dir > 0.0 {
            1.0
        } else if dir < 0.0 {
            -1.0
        } else {
            0.0
        };
        if inverted { -dir } else { dir }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_is_normalized() {
        let input = TickInput {
            move_dir: 0.3,
            ..Default::default()
        };
        assert_eq!(input.direction(false), 1.0);
        assert_eq!(input.direction(true), -1.0);
        assert_eq!(TickInput::default().direction(false), 0.0);
    }

    #[test]
    fn nan_direction_treated_as_zero() {
        let input = TickInput {
            move_dir: f32::NAN,
            ..Default::default()
        };
        assert_eq!(input.direction(false), 0.0);
        let input = TickInput {
            move_dir: f32::INFINITY,
            ..Default::default()
        };
        assert_eq!(input.direction(false), 0.0);
    }
}
