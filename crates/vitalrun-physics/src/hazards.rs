//! Terrain queries, fall-death reporting and the screen boundary.
//!
//! Pits and slip zones live in world space; the player lives in screen
//! space. Everything here converts with `world_x` explicitly.

use serde::{Deserialize, Serialize};

use vitalrun_core::geometry::span_contains;

use crate::config::WorldConfig;
use crate::events::PhysicsEvent;
use crate::player::Player;

/// Gap in the ground, `[x, x + width)` in world space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pit {
    pub x: f32,
    pub width: f32,
}

/// Slippery ground, `[x, x + width)` in world space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlipZone {
    pub x: f32,
    pub width: f32,
}

/// Immutable ground geometry of a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terrain {
    pub ground_y: f32,
    pub world_length: f32,
    pub pits: Vec<Pit>,
    pub slip_zones: Vec<SlipZone>,
}

impl Terrain {
    /// Whether world-space `x` lies over a pit.
    pub fn in_pit(&self, x: f32) -> bool {
        self.pits.iter().any(|p| span_contains(p.x, p.width, x))
    }

    /// Whether world-space `x` lies over a slip zone.
    pub fn on_slip(&self, x: f32) -> bool {
        self.slip_zones
            .iter()
            .any(|s| span_contains(s.x, s.width, x))
    }
}

/// Player center x in world space.
pub fn player_world_x(player: &Player, world_x: f32) -> f32 {
    player.center().0 + world_x
}

/// Report the fall-death crossing (bottom edge past the viewport by the
/// margin) once. `reported` latches until the player respawns.
pub fn check_fall(
    player: &Player,
    world: &WorldConfig,
    reported: &mut bool,
) -> Option<PhysicsEvent> {
    if *reported || player.bottom() <= world.viewport_height + world.fall_death_margin {
        return None;
    }
    *reported = true;
    tracing::debug!(y = player.y, "Player fell out of the world");
    Some(PhysicsEvent::FellOutOfWorld { y: player.y })
}

/// Scroll the world forward when the player passes the threshold, pulling
/// the player back by the same amount. Never scrolls backward. Returns the
/// shift applied.
pub fn scroll_forward(
    player: &mut Player,
    world_x: &mut f32,
    terrain: &Terrain,
    world: &WorldConfig,
) -> f32 {
    let excess = player.x - world.scroll_threshold_x;
    let room = (terrain.world_length - world.viewport_width - *world_x).max(0.0);
    if excess <= 0.0 || room <= 0.0 {
        return 0.0;
    }
    let shift = excess.min(room);
    *world_x += shift;
    player.x -= shift;
    shift
}

/// Keep the player horizontally inside the viewport.
pub fn clamp_to_viewport(player: &mut Player, world: &WorldConfig) {
    let max_x = (world.viewport_width - player.width()).max(0.0);
    if player.x < 0.0 {
        player.x = 0.0;
        player.vx = player.vx.max(0.0);
    } else if player.x > max_x {
        player.x = max_x;
        player.vx = player.vx.min(0.0);
    }
}
