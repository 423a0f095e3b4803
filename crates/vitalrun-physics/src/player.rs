use serde::{Deserialize, Serialize};

use vitalrun_core::Aabb;

use crate::config::PhysicsConfig;
use crate::input::TickInput;
use crate::platform::PlatformId;

/// Movement modifiers owned by the ability collaborator.
///
/// Read every tick by kinetics; external systems may change them freely
/// between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Abilities {
    pub speed_multiplier: f32,
    pub jump_multiplier: f32,
    pub size_scale: f32,
    pub can_double_jump: bool,
    pub can_glide: bool,
    pub inverted_controls: bool,
}

impl Default for Abilities {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            jump_multiplier: 1.0,
            size_scale: 1.0,
            can_double_jump: false,
            can_glide: false,
            inverted_controls: false,
        }
    }
}

/// Treat non-finite or non-positive multipliers as neutral.
fn factor(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        1.0
    }
}

/// The player. Position is screen space with y pointing down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub base_width: f32,
    pub base_height: f32,
    /// +1 facing right, -1 facing left.
    pub facing: f32,
    pub grounded: bool,
    /// Supporting platform handle. Never owns the platform.
    pub on_platform: Option<PlatformId>,
    pub crouching: bool,
    pub double_jump_used: bool,
    /// Top edge at the start of the last kinetics step.
    pub prev_y: f32,
    pub crouch_height_factor: f32,
    pub abilities: Abilities,
}

impl Player {
    pub fn new(x: f32, y: f32, cfg: &PhysicsConfig) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            base_width: cfg.player_width,
            base_height: cfg.player_height,
            facing: 1.0,
            grounded: false,
            on_platform: None,
            crouching: false,
            double_jump_used: false,
            prev_y: y,
            crouch_height_factor: cfg.crouch_height_factor,
            abilities: Abilities::default(),
        }
    }

    pub fn width(&self) -> f32 {
        self.base_width * factor(self.abilities.size_scale)
    }

    /// Standing height, ignoring crouch.
    pub fn standing_height(&self) -> f32 {
        self.base_height * factor(self.abilities.size_scale)
    }

    pub fn height(&self) -> f32 {
        if self.crouching {
            self.standing_height() * self.crouch_height_factor
        } else {
            self.standing_height()
        }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height()
    }

    /// Bottom edge at the start of the last kinetics step.
    pub fn prev_bottom(&self) -> f32 {
        self.prev_y + self.height()
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.width(), self.height())
    }

    /// Center in screen space.
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width() / 2.0, self.y + self.height() / 2.0)
    }

    /// Grounded and supported by a platform or by the ground line itself.
    /// Never true while dropping through a pit at ground height.
    pub fn can_jump(&self, ground_y: f32, tolerance: f32) -> bool {
        self.grounded && (self.on_platform.is_some() || self.bottom() <= ground_y + tolerance)
    }

    /// Move to `(x, y)` and clear all motion state. Abilities survive.
    pub fn reset(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
        self.prev_y = y;
        self.vx = 0.0;
        self.vy = 0.0;
        self.facing = 1.0;
        self.grounded = false;
        self.on_platform = None;
        self.crouching = false;
        self.double_jump_used = false;
    }

    /// Drop support, e.g. when the supporting platform vanished.
    pub fn detach(&mut self) {
        self.grounded = false;
        self.on_platform = None;
    }

    /// Crouch while grounded and down is held, keeping the feet in place.
    fn update_crouch(&mut self, down_held: bool) {
        let want = down_held && self.grounded;
        if want == self.crouching {
            return;
        }
        let bottom = self.bottom();
        self.crouching = want;
        self.y = bottom - self.height();
    }

    /// One tick of player motion.
    ///
    /// `slipping` is whether the player's center is over a slip zone;
    /// `ground_y` and the config's tolerance gate the jump.
    pub fn integrate(
        &mut self,
        input: &TickInput,
        cfg: &PhysicsConfig,
        slipping: bool,
        ground_y: f32,
    ) {
        let start = (self.x, self.y);
        self.update_crouch(input.down_held);
        self.prev_y = self.y;

        // Resting contact: support cancels accumulated fall speed.
        if self.grounded && self.vy > 0.0 {
            self.vy = 0.0;
        }

        let jump_power = cfg.base_jump_power * factor(self.abilities.jump_multiplier);
        if input.jump_pressed {
            if self.can_jump(ground_y, cfg.landing_tolerance) {
                self.vy = -jump_power;
                self.grounded = false;
                self.on_platform = None;
                self.double_jump_used = false;
                self.update_crouch(false);
                self.prev_y = self.y;
            } else if !self.grounded
                && self.abilities.can_double_jump
                && !self.double_jump_used
            {
                self.vy = -jump_power * cfg.double_jump_factor;
                self.double_jump_used = true;
            }
        }

        self.vy += cfg.gravity;
        if !self.grounded && self.vy > 0.0 && self.abilities.can_glide && input.up_held {
            self.vy = self.vy.min(cfg.glide_max_fall_speed);
        }
        self.y += self.vy;

        let dir = input.direction(self.abilities.inverted_controls);
        if dir != 0.0 && !self.crouching {
            self.vx = dir * cfg.base_speed * factor(self.abilities.speed_multiplier);
            self.facing = dir;
        } else if slipping && self.grounded {
            self.vx *= cfg.slip_growth;
            if self.vx.abs() < cfg.min_slip_speed {
                let sign = if self.vx != 0.0 {
                    self.vx.signum()
                } else {
                    self.facing
                };
                self.vx = cfg.min_slip_speed * sign;
            }
        } else {
            self.vx *= cfg.friction;
        }
        self.x += self.vx;

        if !(self.x.is_finite() && self.y.is_finite() && self.vx.is_finite() && self.vy.is_finite())
        {
            tracing::warn!(x = self.x, y = self.y, "Non-finite player state, reverting tick");
            (self.x, self.y) = start;
            self.vx = 0.0;
            self.vy = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUND: f32 = 500.0;

    fn cfg() -> PhysicsConfig {
        PhysicsConfig::default()
    }

    fn grounded_player() -> Player {
        let mut p = Player::new(100.0, GROUND - 60.0, &cfg());
        p.grounded = true;
        p
    }

    #[test]
    fn jump_sets_negative_velocity_and_leaves_ground() {
        let mut p = grounded_player();
        p.integrate(&TickInput::jump(), &cfg(), false, GROUND);
        assert!(!p.grounded);
        assert_eq!(p.vy, -15.0 + 0.8);
        assert_eq!(p.on_platform, None);
    }

    #[test]
    fn airborne_two_ticks_accumulate_gravity() {
        let mut p = Player::new(100.0, 200.0, &cfg());
        p.vy = -15.0;
        p.integrate(&TickInput::default(), &cfg(), false, GROUND);
        p.integrate(&TickInput::default(), &cfg(), false, GROUND);
        assert!((p.vy - -13.4).abs() < 1e-5, "vy was {}", p.vy);
    }

    #[test]
    fn double_jump_only_once_per_airborne_phase() {
        let mut p = Player::new(100.0, 200.0, &cfg());
        p.abilities.can_double_jump = true;
        p.vy = 3.0;
        p.integrate(&TickInput::jump(), &cfg(), false, GROUND);
        assert!((p.vy - (-12.0 + 0.8)).abs() < 1e-5);
        assert!(p.double_jump_used);

        let before = p.vy;
        p.integrate(&TickInput::jump(), &cfg(), false, GROUND);
        assert!((p.vy - (before + 0.8)).abs() < 1e-5, "Second air jump ignored");
    }

    #[test]
    fn no_jump_without_support() {
        let mut p = Player::new(100.0, 200.0, &cfg());
        p.integrate(&TickInput::jump(), &cfg(), false, GROUND);
        assert_eq!(p.vy, 0.8);
    }

    #[test]
    fn grounded_but_below_ground_line_cannot_jump() {
        // Falling through a pit at ground height.
        let mut p = Player::new(100.0, GROUND - 60.0 + 5.0, &cfg());
        p.grounded = true;
        assert!(!p.can_jump(GROUND, 0.01));
        p.on_platform = Some(PlatformId(1));
        assert!(p.can_jump(GROUND, 0.01));
    }

    #[test]
    fn glide_caps_fall_speed() {
        let mut p = Player::new(100.0, 200.0, &cfg());
        p.abilities.can_glide = true;
        p.vy = 6.0;
        let held = TickInput {
            up_held: true,
            ..Default::default()
        };
        p.integrate(&held, &cfg(), false, GROUND);
        assert_eq!(p.vy, 1.5);
        p.integrate(&TickInput::default(), &cfg(), false, GROUND);
        assert!((p.vy - 2.3).abs() < 1e-5, "Releasing up stops the glide");
    }

    #[test]
    fn input_sets_speed_and_friction_decays_it() {
        let mut p = grounded_player();
        p.abilities.speed_multiplier = 2.0;
        p.integrate(&TickInput::right(), &cfg(), false, GROUND);
        assert_eq!(p.vx, 10.0);
        assert_eq!(p.x, 110.0);
        p.integrate(&TickInput::default(), &cfg(), false, GROUND);
        assert_eq!(p.vx, 8.0);
    }

    #[test]
    fn inverted_controls_mirror_direction() {
        let mut p = grounded_player();
        p.abilities.inverted_controls = true;
        p.integrate(&TickInput::right(), &cfg(), false, GROUND);
        assert_eq!(p.vx, -5.0);
        assert_eq!(p.facing, -1.0);
    }

    #[test]
    fn slip_grows_speed_with_floor() {
        let mut p = grounded_player();
        p.facing = -1.0;
        p.integrate(&TickInput::default(), &cfg(), true, GROUND);
        assert_eq!(p.vx, -2.0, "Floors at min slip speed in facing direction");
        p.vx = 4.0;
        p.integrate(&TickInput::default(), &cfg(), true, GROUND);
        assert!((p.vx - 4.2).abs() < 1e-5);
    }

    #[test]
    fn crouch_keeps_feet_planted() {
        let mut p = grounded_player();
        let down = TickInput {
            down_held: true,
            move_dir: 1.0,
            ..Default::default()
        };
        let bottom = p.bottom();
        p.integrate(&down, &cfg(), false, GROUND);
        assert!(p.crouching);
        assert_eq!(p.height(), 36.0);
        assert_eq!(p.prev_bottom(), bottom);
        assert_eq!(p.vx, 0.0, "No walking while crouched");

        p.integrate(&TickInput::default(), &cfg(), false, GROUND);
        assert!(!p.crouching);
        assert_eq!(p.height(), 60.0);
    }

    #[test]
    fn size_scale_changes_box() {
        let mut p = grounded_player();
        p.abilities.size_scale = 0.5;
        assert_eq!((p.width(), p.height()), (20.0, 30.0));
        p.abilities.size_scale = f32::NAN;
        assert_eq!(p.width(), 40.0);
    }

    #[test]
    fn reset_keeps_abilities() {
        let mut p = grounded_player();
        p.abilities.can_glide = true;
        p.vx = 3.0;
        p.on_platform = Some(PlatformId(2));
        p.reset(10.0, 20.0);
        assert_eq!((p.x, p.y, p.vx, p.vy), (10.0, 20.0, 0.0, 0.0));
        assert_eq!(p.on_platform, None);
        assert!(p.abilities.can_glide);
    }
}
