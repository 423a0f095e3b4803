//! Platforms that move on their own: elevators, shuttles, orbits,
//! malfunctions and falling ledges.

use serde::{Deserialize, Serialize};

use vitalrun_core::Millis;

use crate::events::PhysicsEvent;
use crate::platform::behavior::{PlatformBehavior, TickContext};
use crate::platform::{Body, PlatformId};
use crate::timers::TimerAction;

/// Movement axis for shuttles and malfunctions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Axis {
    #[default]
    Horizontal,
    Vertical,
}

impl Axis {
    fn get(self, body: &Body) -> f32 {
        match self {
            Axis::Horizontal => body.x,
            Axis::Vertical => body.y,
        }
    }

    fn set(self, body: &mut Body, value: f32) {
        match self {
            Axis::Horizontal => body.x = value,
            Axis::Vertical => body.y = value,
        }
    }
}

/// Vertical ping-pong between `start_y` and `end_y`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Elevator {
    pub start_y: f32,
    pub end_y: f32,
    /// Signed units per tick; positive moves down the screen.
    pub speed: f32,
}

impl PlatformBehavior for Elevator {
    fn step_motion(&mut self, _id: PlatformId, body: &mut Body, _ctx: &mut TickContext<'_>) {
        if self.speed == 0.0 {
            return;
        }
        // Point the speed at end_y if the level authored it backwards.
        if self.speed * (self.end_y - body.y) < 0.0 {
            self.speed = -self.speed;
        }
        body.y += self.speed;
        let reached = (self.speed > 0.0 && body.y >= self.end_y)
            || (self.speed < 0.0 && body.y <= self.end_y);
        if reached {
            body.y = self.end_y;
            std::mem::swap(&mut self.start_y, &mut self.end_y);
            self.speed = -self.speed;
        }
    }
}

/// Shuttle between `start` and `end` on one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Moving {
    pub axis: Axis,
    pub start: f32,
    pub end: f32,
    /// Units per tick, unsigned.
    pub speed: f32,
    /// +1 toward the larger bound, -1 toward the smaller.
    pub direction: f32,
}

impl Default for Moving {
    fn default() -> Self {
        Self {
            axis: Axis::Horizontal,
            start: 0.0,
            end: 0.0,
            speed: 0.0,
            direction: 1.0,
        }
    }
}

impl PlatformBehavior for Moving {
    fn step_motion(&mut self, _id: PlatformId, body: &mut Body, _ctx: &mut TickContext<'_>) {
        let lo = self.start.min(self.end);
        let hi = self.start.max(self.end);
        if self.speed == 0.0 || hi - lo <= 0.0 {
            return;
        }
        let dir = if self.direction < 0.0 { -1.0 } else { 1.0 };
        let mut pos = self.axis.get(body) + self.speed.abs() * dir;
        if pos >= hi {
            pos = hi;
            self.direction = -1.0;
        } else if pos <= lo {
            pos = lo;
            self.direction = 1.0;
        }
        self.axis.set(body, pos);
    }
}

/// Elliptical orbit around a center. Strictly periodic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Orbiting {
    pub center_x: f32,
    pub center_y: f32,
    pub radius_x: f32,
    pub radius_y: f32,
    /// Radians per tick.
    #[serde(alias = "speed")]
    pub angular_speed: f32,
    /// Current angle, radians. Only ever used through sin/cos.
    #[serde(alias = "start_angle")]
    pub angle: f32,
}

impl PlatformBehavior for Orbiting {
    fn step_motion(&mut self, _id: PlatformId, body: &mut Body, _ctx: &mut TickContext<'_>) {
        self.angle += self.angular_speed;
        body.x = self.center_x + self.angle.cos() * self.radius_x;
        body.y = self.center_y + self.angle.sin() * self.radius_y;
    }
}

/// Wobbles for a fixed time after the player first lands on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Malfunctioning {
    pub axis: Axis,
    /// Wobble amplitude in units.
    pub malfunction_speed: f32,
    pub active: bool,
    pub malfunction_start_time: Option<Millis>,
    /// Position captured when the malfunction began.
    pub origin: Option<(f32, f32)>,
}

impl Malfunctioning {
    /// Start the malfunction. No-op while one is already running, so
    /// repeated contact never extends it.
    pub fn trigger(&mut self, id: PlatformId, body: &Body, ctx: &mut TickContext<'_>) {
        if self.active {
            return;
        }
        self.active = true;
        self.malfunction_start_time = Some(ctx.now);
        self.origin = Some((body.x, body.y));
        let duration = ctx.tuning.malfunction_duration_ms;
        ctx.schedule(id, duration, TimerAction::EndMalfunction);
        ctx.emit(PhysicsEvent::MalfunctionStarted { platform: id });
        tracing::debug!(?id, duration, "Platform malfunction started");
    }
}

impl PlatformBehavior for Malfunctioning {
    fn step_motion(&mut self, _id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        if !self.active {
            return;
        }
        let (Some(start), Some((ox, oy))) = (self.malfunction_start_time, self.origin) else {
            return;
        };
        let elapsed = ctx.now.saturating_sub(start) as f32;
        let offset = (elapsed * ctx.tuning.malfunction_frequency).sin() * self.malfunction_speed;
        match self.axis {
            Axis::Horizontal => body.x = ox + offset,
            Axis::Vertical => body.y = oy + offset,
        }
    }

    fn on_land(&mut self, id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        self.trigger(id, body, ctx);
    }

    fn on_timer(
        &mut self,
        id: PlatformId,
        body: &mut Body,
        action: TimerAction,
        ctx: &mut TickContext<'_>,
    ) {
        if action != TimerAction::EndMalfunction {
            return;
        }
        if let Some((ox, oy)) = self.origin.take() {
            body.x = ox;
            body.y = oy;
        }
        self.active = false;
        self.malfunction_start_time = None;
        ctx.emit(PhysicsEvent::MalfunctionEnded { platform: id });
        tracing::debug!(?id, "Platform malfunction ended");
    }
}

/// Drops away `delay_ms` after first contact, accelerating until it leaves
/// the screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Falling {
    pub delay_ms: Millis,
    pub triggered: bool,
    pub falling: bool,
    pub fall_speed: f32,
}

impl PlatformBehavior for Falling {
    fn step_motion(&mut self, id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        if !self.falling {
            return;
        }
        self.fall_speed += ctx.tuning.falling_accel;
        body.y += self.fall_speed;
        if body.y > ctx.world.viewport_height + ctx.world.fall_death_margin {
            body.activated = false;
            tracing::debug!(?id, "Falling platform left the screen");
        }
    }

    fn on_land(&mut self, id: PlatformId, _body: &mut Body, ctx: &mut TickContext<'_>) {
        if self.triggered {
            return;
        }
        self.triggered = true;
        ctx.schedule(id, self.delay_ms, TimerAction::StartFalling);
    }

    fn on_timer(
        &mut self,
        id: PlatformId,
        _body: &mut Body,
        action: TimerAction,
        ctx: &mut TickContext<'_>,
    ) {
        if action == TimerAction::StartFalling && !self.falling {
            self.falling = true;
            ctx.emit(PhysicsEvent::PlatformFell { platform: id });
            tracing::debug!(?id, "Platform released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::test_support::Harness;

    #[test]
    fn elevator_ping_pongs() {
        let mut h = Harness::new();
        let mut body = Body::new(0.0, 100.0, 80.0, 10.0);
        let mut e = Elevator {
            start_y: 100.0,
            end_y: 110.0,
            speed: 4.0,
        };
        let id = PlatformId(0);
        e.step_motion(id, &mut body, &mut h.ctx(0));
        assert_eq!(body.y, 104.0);
        e.step_motion(id, &mut body, &mut h.ctx(0));
        assert_eq!(body.y, 108.0);
        e.step_motion(id, &mut body, &mut h.ctx(0));
        assert_eq!(body.y, 110.0, "Snaps onto end_y");
        assert_eq!(e.speed, -4.0);
        assert_eq!(e.end_y, 100.0);
        assert_eq!(e.start_y, 110.0);
        e.step_motion(id, &mut body, &mut h.ctx(0));
        assert_eq!(body.y, 106.0);
    }

    #[test]
    fn elevator_with_backwards_speed_still_heads_to_end() {
        let mut h = Harness::new();
        let mut body = Body::new(0.0, 100.0, 80.0, 10.0);
        let mut e = Elevator {
            start_y: 100.0,
            end_y: 50.0,
            speed: 2.0,
        };
        e.step_motion(PlatformId(0), &mut body, &mut h.ctx(0));
        assert_eq!(body.y, 98.0);
    }

    #[test]
    fn moving_reverses_at_bounds() {
        let mut h = Harness::new();
        let mut body = Body::new(0.0, 0.0, 80.0, 10.0);
        let mut m = Moving {
            axis: Axis::Horizontal,
            start: 0.0,
            end: 5.0,
            speed: 2.0,
            direction: 1.0,
        };
        let id = PlatformId(0);
        let mut xs = Vec::new();
        for _ in 0..6 {
            m.step_motion(id, &mut body, &mut h.ctx(0));
            xs.push(body.x);
        }
        assert_eq!(xs, vec![2.0, 4.0, 5.0, 3.0, 1.0, 0.0]);
    }

    #[test]
    fn moving_without_params_is_a_no_op() {
        let mut h = Harness::new();
        let mut body = Body::new(30.0, 40.0, 80.0, 10.0);
        let mut m = Moving::default();
        m.step_motion(PlatformId(0), &mut body, &mut h.ctx(0));
        assert_eq!((body.x, body.y), (30.0, 40.0));
    }

    #[test]
    fn orbit_offset_after_one_step() {
        let mut h = Harness::new();
        let mut body = Body::new(0.0, 0.0, 60.0, 10.0);
        let mut o = Orbiting {
            center_x: 300.0,
            center_y: 200.0,
            radius_x: 40.0,
            radius_y: 100.0,
            angular_speed: 0.05,
            angle: 0.0,
        };
        o.step_motion(PlatformId(0), &mut body, &mut h.ctx(0));
        assert!((body.x - 300.0 - 40.0 * 0.05f32.cos()).abs() < 1e-4);
        assert!((body.y - 200.0 - 100.0 * 0.05f32.sin()).abs() < 1e-4);
    }

    #[test]
    fn orbit_missing_center_degrades_to_origin() {
        let mut h = Harness::new();
        let mut body = Body::new(10.0, 10.0, 60.0, 10.0);
        let mut o: Orbiting = serde_json::from_str(r#"{"radius_x": 10.0}"#).unwrap();
        o.step_motion(PlatformId(0), &mut body, &mut h.ctx(0));
        assert!(body.x.is_finite() && body.y.is_finite());
        assert_eq!(body.x, 10.0);
        assert_eq!(body.y, 0.0);
    }

    #[test]
    fn malfunction_trigger_is_idempotent() {
        let mut h = Harness::new();
        let mut body = Body::new(100.0, 200.0, 80.0, 10.0);
        let mut m = Malfunctioning {
            axis: Axis::Horizontal,
            malfunction_speed: 20.0,
            ..Default::default()
        };
        let id = PlatformId(3);
        m.on_land(id, &mut body, &mut h.ctx(1_000));
        let due = h.timers.pending_for(id).map(|t| t.due);
        assert_eq!(due, Some(4_000));

        // Later contacts must not reset the start or push the timer back.
        m.on_land(id, &mut body, &mut h.ctx(2_500));
        assert_eq!(m.malfunction_start_time, Some(1_000));
        assert_eq!(h.timers.pending_for(id).map(|t| t.due), Some(4_000));
        assert_eq!(h.events.len(), 1);
    }

    #[test]
    fn malfunction_wobbles_then_restores_origin() {
        let mut h = Harness::new();
        let mut body = Body::new(100.0, 200.0, 80.0, 10.0);
        let mut m = Malfunctioning {
            axis: Axis::Vertical,
            malfunction_speed: 20.0,
            ..Default::default()
        };
        let id = PlatformId(0);
        m.on_land(id, &mut body, &mut h.ctx(0));
        m.step_motion(id, &mut body, &mut h.ctx(157));
        let expected = 200.0 + (157.0f32 * 0.01).sin() * 20.0;
        assert!((body.y - expected).abs() < 1e-3);
        assert_eq!(body.x, 100.0);

        m.on_timer(id, &mut body, TimerAction::EndMalfunction, &mut h.ctx(3_000));
        assert!(!m.active);
        assert_eq!((body.x, body.y), (100.0, 200.0));
    }

    #[test]
    fn falling_waits_for_its_timer() {
        let mut h = Harness::new();
        let mut body = Body::new(0.0, 300.0, 80.0, 10.0);
        let mut f = Falling {
            delay_ms: 500,
            ..Default::default()
        };
        let id = PlatformId(1);
        f.on_land(id, &mut body, &mut h.ctx(0));
        f.step_motion(id, &mut body, &mut h.ctx(100));
        assert_eq!(body.y, 300.0);
        assert_eq!(h.timers.pending_for(id).map(|t| t.due), Some(500));

        f.on_timer(id, &mut body, TimerAction::StartFalling, &mut h.ctx(500));
        f.step_motion(id, &mut body, &mut h.ctx(516));
        f.step_motion(id, &mut body, &mut h.ctx(532));
        assert_eq!(body.y, 301.5);
        for _ in 0..100 {
            f.step_motion(id, &mut body, &mut h.ctx(600));
        }
        assert!(!body.activated, "Platform deactivates once off screen");
    }
}
