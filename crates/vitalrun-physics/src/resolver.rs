//! Support resolution: which surface, if any, holds the player up after
//! kinetics.
//!
//! Platforms are one-way. A landing needs the previous bottom edge at or
//! above the surface and the current bottom edge at or below it, so the
//! player passes through platforms from below and from the side.

use serde::{Deserialize, Serialize};

use crate::config::PhysicsConfig;
use crate::hazards::{Terrain, player_world_x};
use crate::platform::{PlatformId, PlatformSet, is_platform_solid};
use crate::player::Player;

/// What the player stands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Support {
    Platform(PlatformId),
    Ground,
    Air,
}

impl Support {
    /// Support as currently recorded on the player.
    pub fn of(player: &Player) -> Self {
        match (player.grounded, player.on_platform) {
            (true, Some(id)) => Support::Platform(id),
            (true, None) => Support::Ground,
            (false, _) => Support::Air,
        }
    }
}

/// One-sided landing test against a surface at `top`.
fn lands_on(player: &Player, top: f32, tolerance: f32) -> bool {
    player.prev_bottom() <= top + tolerance && player.bottom() >= top
}

/// Decide support for the candidate position and snap onto it.
///
/// Platforms are tested in array order and the first qualifying one wins,
/// even when a later one is higher. The ground catches any bottom edge at or
/// below it, except while the player's world-space center is over a pit.
/// Gaining support re-arms the double jump.
pub fn resolve_support(
    player: &mut Player,
    platforms: &PlatformSet,
    terrain: &Terrain,
    world_x: f32,
    cfg: &PhysicsConfig,
) -> Support {
    let tolerance = cfg.landing_tolerance;
    let player_box = player.aabb();

    let landing = platforms.iter().find(|p| {
        if !is_platform_solid(p) {
            return false;
        }
        let b = p.screen_aabb(world_x);
        player_box.overlaps_x(&b) && lands_on(player, b.top(), tolerance)
    });

    if let Some(p) = landing {
        player.y = p.body.y - player.height();
        player.vy = 0.0;
        player.grounded = true;
        player.on_platform = Some(p.id);
        player.double_jump_used = false;
        return Support::Platform(p.id);
    }

    player.on_platform = None;
    let over_pit = terrain.in_pit(player_world_x(player, world_x));
    // The ground is solid from below too: anything sunk past it pops back up.
    if !over_pit && player.bottom() >= terrain.ground_y {
        player.y = terrain.ground_y - player.height();
        player.grounded = true;
        player.double_jump_used = false;
        return Support::Ground;
    }

    player.grounded = false;
    Support::Air
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hazards::Pit;
    use crate::platform::{Body, PlatformKind};

    const GROUND: f32 = 500.0;

    fn terrain() -> Terrain {
        Terrain {
            ground_y: GROUND,
            world_length: 4000.0,
            pits: vec![Pit {
                x: 300.0,
                width: 100.0,
            }],
            slip_zones: Vec::new(),
        }
    }

    fn resolve(p: &mut Player, set: &PlatformSet, world_x: f32) -> Support {
        resolve_support(p, set, &terrain(), world_x, &PhysicsConfig::default())
    }

    /// Player whose bottom moved from `prev_bottom` to `bottom` this tick.
    fn falling_player(x: f32, prev_bottom: f32, bottom: f32) -> Player {
        let mut p = Player::new(x, bottom - 60.0, &PhysicsConfig::default());
        p.prev_y = prev_bottom - 60.0;
        p.vy = bottom - prev_bottom;
        p
    }

    #[test]
    fn lands_on_platform_from_above() {
        let mut set = PlatformSet::new();
        let id = set.insert(Body::new(100.0, 300.0, 200.0, 20.0), PlatformKind::default());
        let mut p = falling_player(150.0, 295.0, 305.0);
        let s = resolve(&mut p, &set, 0.0);
        assert_eq!(s, Support::Platform(id));
        assert_eq!(p.bottom(), 300.0);
        assert_eq!(p.vy, 0.0);
        assert!(p.grounded);
        assert_eq!(p.on_platform, Some(id));
    }

    #[test]
    fn passes_through_from_below() {
        let mut set = PlatformSet::new();
        set.insert(Body::new(100.0, 300.0, 200.0, 20.0), PlatformKind::default());
        let mut p = falling_player(150.0, 320.0, 305.0);
        let s = resolve(&mut p, &set, 0.0);
        assert_eq!(s, Support::Air);
        assert_eq!(p.bottom(), 305.0);
    }

    #[test]
    fn uses_screen_space_for_platforms() {
        let mut set = PlatformSet::new();
        set.insert(Body::new(1100.0, 300.0, 200.0, 20.0), PlatformKind::default());
        let mut p = falling_player(150.0, 295.0, 305.0);
        let s = resolve(&mut p, &set, 1000.0);
        assert!(matches!(s, Support::Platform(_)));

        let mut p = falling_player(150.0, 295.0, 305.0);
        let s = resolve(&mut p, &set, 0.0);
        assert_eq!(s, Support::Air);
    }

    #[test]
    fn non_solid_platforms_are_ignored() {
        let mut set = PlatformSet::new();
        let id = set.insert(Body::new(100.0, 300.0, 200.0, 20.0), PlatformKind::default());
        if let Some(p) = set.get_mut(id) {
            p.body.visible = false;
        }
        let mut p = falling_player(150.0, 295.0, 305.0);
        let s = resolve(&mut p, &set, 0.0);
        assert_eq!(s, Support::Air);
    }

    #[test]
    fn first_platform_in_array_order_wins() {
        // Two overlapping platforms both qualify; the later one is higher.
        let mut set = PlatformSet::new();
        let low = set.insert(Body::new(100.0, 300.0, 200.0, 20.0), PlatformKind::default());
        let _high = set.insert(Body::new(100.0, 296.0, 200.0, 20.0), PlatformKind::default());
        let mut p = falling_player(150.0, 290.0, 305.0);
        let s = resolve(&mut p, &set, 0.0);
        assert_eq!(s, Support::Platform(low));
        assert_eq!(p.bottom(), 300.0);
    }

    #[test]
    fn resting_on_ground_keeps_fall_speed() {
        let mut p = falling_player(100.0, GROUND, GROUND + 0.8);
        p.vy = 0.8;
        let s = resolve(&mut p, &PlatformSet::new(), 0.0);
        assert_eq!(s, Support::Ground);
        assert_eq!(p.bottom(), GROUND);
        assert_eq!(p.vy, 0.8);
        assert!(p.can_jump(GROUND, 0.01));
    }

    #[test]
    fn pit_suppresses_ground() {
        // Center at world x = 340 + 20 = 360, inside [300, 400).
        let mut p = falling_player(340.0, GROUND, GROUND + 0.8);
        let s = resolve(&mut p, &PlatformSet::new(), 0.0);
        assert_eq!(s, Support::Air);
        assert!(!p.grounded);
        assert!(!p.can_jump(GROUND, 0.01));
    }

    #[test]
    fn pit_is_tested_in_world_space() {
        // Screen center 160 + world_x 200 = 360: over the pit.
        let mut p = falling_player(140.0, GROUND, GROUND + 0.8);
        let s = resolve(&mut p, &PlatformSet::new(), 200.0);
        assert_eq!(s, Support::Air);
    }

    #[test]
    fn sunk_player_leaving_a_pit_is_caught_by_ground() {
        // Center at 282 is just past the pit's near side, feet 5 units under.
        let mut p = falling_player(262.0, GROUND + 5.0, GROUND + 5.8);
        let s = resolve(&mut p, &PlatformSet::new(), 0.0);
        assert_eq!(s, Support::Ground);
        assert_eq!(p.bottom(), GROUND);
        assert!(p.grounded);
    }

    #[test]
    fn support_rearms_double_jump() {
        let mut p = falling_player(100.0, GROUND - 2.0, GROUND + 1.0);
        p.double_jump_used = true;
        assert_eq!(resolve(&mut p, &PlatformSet::new(), 0.0), Support::Ground);
        assert!(!p.double_jump_used);

        let mut set = PlatformSet::new();
        set.insert(Body::new(100.0, 300.0, 200.0, 20.0), PlatformKind::default());
        let mut p = falling_player(150.0, 295.0, 305.0);
        p.double_jump_used = true;
        assert!(matches!(resolve(&mut p, &set, 0.0), Support::Platform(_)));
        assert!(!p.double_jump_used);
    }

    #[test]
    fn support_of_reads_player_flags() {
        let mut p = Player::new(0.0, 0.0, &PhysicsConfig::default());
        assert_eq!(Support::of(&p), Support::Air);
        p.grounded = true;
        assert_eq!(Support::of(&p), Support::Ground);
        p.on_platform = Some(PlatformId(3));
        assert_eq!(Support::of(&p), Support::Platform(PlatformId(3)));
    }
}
