//! Platforms that react to the player standing on them or coming near.

use serde::{Deserialize, Serialize};

use vitalrun_core::Millis;

use crate::events::PhysicsEvent;
use crate::platform::behavior::{PlatformBehavior, TickContext, fade};
use crate::platform::{Body, PlatformId};
use crate::timers::TimerAction;

/// Tips toward the side the rider stands on. Past `max_angle` it sheds
/// the rider until it relaxes again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tilting {
    pub max_angle: f32,
    /// Degrees per tick.
    pub tilt_speed: f32,
    pub angle: f32,
}

impl PlatformBehavior for Tilting {
    fn advance(&mut self, id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        if ctx.is_ridden(id) {
            let (cx, _) = body.center();
            let side = (ctx.player_center.0 - cx).signum();
            self.angle += self.tilt_speed * side;
            if self.max_angle > 0.0 {
                self.angle = self.angle.clamp(-self.max_angle, self.max_angle);
            }
        } else if self.angle.abs() <= self.tilt_speed {
            self.angle = 0.0;
        } else {
            self.angle -= self.tilt_speed * self.angle.signum();
        }
        body.visible = self.max_angle <= 0.0 || self.angle.abs() < self.max_angle;
    }
}

/// Sinks under the rider, floats back up when left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Balance {
    /// Units per tick.
    pub sink_speed: f32,
    pub max_sink: f32,
    pub sunk: f32,
    pub base_y: Option<f32>,
}

impl PlatformBehavior for Balance {
    fn advance(&mut self, id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        let base = *self.base_y.get_or_insert(body.y);
        let speed = self.sink_speed.max(0.0);
        self.sunk = if ctx.is_ridden(id) {
            (self.sunk + speed).min(self.max_sink.max(0.0))
        } else {
            (self.sunk - speed).max(0.0)
        };
        body.y = base + self.sunk;
    }
}

/// Bobs in place; pops a while after first contact and respawns later.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bubble {
    pub lifetime_ms: Millis,
    pub respawn_ms: Millis,
    pub amplitude: f32,
    pub base_y: Option<f32>,
    /// A pop is pending or the bubble is gone.
    pub popping: bool,
}

impl PlatformBehavior for Bubble {
    fn advance(&mut self, _id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        let base = *self.base_y.get_or_insert(body.y);
        // Epoch milliseconds lose all sub-second precision in f32.
        let bob = (ctx.now as f64 * 0.002).sin() * self.amplitude as f64;
        body.y = base + bob as f32;
    }

    fn on_land(&mut self, id: PlatformId, _body: &mut Body, ctx: &mut TickContext<'_>) {
        if self.popping {
            return;
        }
        self.popping = true;
        ctx.schedule(id, self.lifetime_ms, TimerAction::PopBubble);
    }

    fn on_timer(
        &mut self,
        id: PlatformId,
        body: &mut Body,
        action: TimerAction,
        ctx: &mut TickContext<'_>,
    ) {
        match action {
            TimerAction::PopBubble => {
                body.visible = false;
                body.opacity = 0.0;
                ctx.emit(PhysicsEvent::BubblePopped { platform: id });
                ctx.schedule(id, self.respawn_ms, TimerAction::RespawnBubble);
                tracing::debug!(?id, "Bubble popped");
            }
            TimerAction::RespawnBubble => {
                body.visible = true;
                body.opacity = 1.0;
                self.popping = false;
                ctx.emit(PhysicsEvent::BubbleRespawned { platform: id });
            }
            _ => {}
        }
    }
}

/// Drops out `reaction_ms` after the player lands, returns `reset_ms` later.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflexTest {
    pub reaction_ms: Millis,
    pub reset_ms: Millis,
    pub armed: bool,
}

impl PlatformBehavior for ReflexTest {
    fn on_land(&mut self, id: PlatformId, _body: &mut Body, ctx: &mut TickContext<'_>) {
        if self.armed {
            return;
        }
        self.armed = true;
        ctx.schedule(id, self.reaction_ms, TimerAction::ReflexDrop);
    }

    fn on_timer(
        &mut self,
        id: PlatformId,
        body: &mut Body,
        action: TimerAction,
        ctx: &mut TickContext<'_>,
    ) {
        match action {
            TimerAction::ReflexDrop => {
                body.visible = false;
                ctx.emit(PhysicsEvent::PlatformFell { platform: id });
                ctx.schedule(id, self.reset_ms, TimerAction::ReflexRestore);
                tracing::debug!(?id, "Reflex platform dropped");
            }
            TimerAction::ReflexRestore => {
                body.visible = true;
                self.armed = false;
            }
            _ => {}
        }
    }
}

/// Raises an alarm when stepped on, then stays quiet for a lockout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Alarm {
    /// Overrides the tuned lockout.
    pub lockout_ms: Option<Millis>,
    pub triggered: bool,
    pub alarm_time: Option<Millis>,
}

impl PlatformBehavior for Alarm {
    fn on_land(&mut self, id: PlatformId, _body: &mut Body, ctx: &mut TickContext<'_>) {
        if self.triggered {
            return;
        }
        self.triggered = true;
        self.alarm_time = Some(ctx.now);
        let lockout = self.lockout_ms.unwrap_or(ctx.tuning.alarm_lockout_ms);
        ctx.schedule(id, lockout, TimerAction::ResetAlarm);
        ctx.emit(PhysicsEvent::AlarmTriggered {
            platform: id,
            at: ctx.now,
        });
        tracing::debug!(?id, lockout, "Alarm triggered");
    }

    fn on_timer(
        &mut self,
        id: PlatformId,
        _body: &mut Body,
        action: TimerAction,
        ctx: &mut TickContext<'_>,
    ) {
        if action != TimerAction::ResetAlarm {
            return;
        }
        self.triggered = false;
        ctx.emit(PhysicsEvent::AlarmReset { platform: id });
    }
}

/// Wears thin while stood on and recovers when left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Withdrawal {
    /// Opacity lost per second of contact.
    pub decay_per_sec: f32,
    /// Opacity regained per second without contact.
    pub recover_per_sec: f32,
}

impl PlatformBehavior for Withdrawal {
    fn advance(&mut self, id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        let secs = ctx.elapsed_ms() as f32 / 1000.0;
        let delta = if ctx.is_ridden(id) {
            -self.decay_per_sec * secs
        } else {
            self.recover_per_sec * secs
        };
        fade(body, body.opacity + delta, ctx.tuning.opacity_cutoff);
    }
}

/// Invisible until the player comes within `reveal_radius`, then stays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hidden {
    pub reveal_radius: f32,
    pub revealed: bool,
}

impl PlatformBehavior for Hidden {
    fn init(&mut self, body: &mut Body) {
        if !self.revealed {
            body.visible = false;
            body.opacity = 0.0;
        }
    }

    fn advance(&mut self, id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        if !self.revealed {
            let (cx, cy) = body.center();
            let (px, py) = ctx.player_center;
            let near = vitalrun_core::geometry::distance(cx, cy, px, py) <= self.reveal_radius;
            if self.reveal_radius <= 0.0 || near {
                self.revealed = true;
                tracing::debug!(?id, "Hidden platform revealed");
            }
        }
        body.visible = self.revealed;
        body.opacity = if self.revealed { 1.0 } else { 0.0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::test_support::Harness;

    #[test]
    fn tilting_sheds_rider_past_max_angle() {
        let mut h = Harness::new();
        let mut body = Body::new(0.0, 300.0, 100.0, 10.0);
        let id = PlatformId(0);
        let mut t = Tilting {
            max_angle: 10.0,
            tilt_speed: 4.0,
            angle: 0.0,
        };
        h.rider = Some(id);
        h.player_center = (80.0, 270.0);
        t.advance(id, &mut body, &mut h.ctx(0));
        t.advance(id, &mut body, &mut h.ctx(0));
        assert_eq!(t.angle, 8.0);
        assert!(body.visible);
        t.advance(id, &mut body, &mut h.ctx(0));
        assert_eq!(t.angle, 10.0);
        assert!(!body.visible);

        h.rider = None;
        t.advance(id, &mut body, &mut h.ctx(0));
        assert_eq!(t.angle, 6.0);
        assert!(body.visible);
        t.advance(id, &mut body, &mut h.ctx(0));
        t.advance(id, &mut body, &mut h.ctx(0));
        assert_eq!(t.angle, 0.0);
    }

    #[test]
    fn tilting_leans_left_for_left_rider() {
        let mut h = Harness::new();
        let mut body = Body::new(0.0, 300.0, 100.0, 10.0);
        let id = PlatformId(0);
        let mut t = Tilting {
            max_angle: 30.0,
            tilt_speed: 2.0,
            angle: 0.0,
        };
        h.rider = Some(id);
        h.player_center = (10.0, 270.0);
        t.advance(id, &mut body, &mut h.ctx(0));
        assert_eq!(t.angle, -2.0);
    }

    #[test]
    fn balance_sinks_and_recovers() {
        let mut h = Harness::new();
        let mut body = Body::new(0.0, 300.0, 100.0, 10.0);
        let id = PlatformId(0);
        let mut b = Balance {
            sink_speed: 2.0,
            max_sink: 5.0,
            ..Default::default()
        };
        h.rider = Some(id);
        for _ in 0..4 {
            b.advance(id, &mut body, &mut h.ctx(0));
        }
        assert_eq!(body.y, 305.0, "Sinking stops at max_sink");
        h.rider = None;
        b.advance(id, &mut body, &mut h.ctx(0));
        assert_eq!(body.y, 303.0);
        for _ in 0..5 {
            b.advance(id, &mut body, &mut h.ctx(0));
        }
        assert_eq!(body.y, 300.0);
    }

    #[test]
    fn bubble_pops_and_respawns() {
        let mut h = Harness::new();
        let mut body = Body::new(0.0, 300.0, 60.0, 10.0);
        let id = PlatformId(7);
        let mut b = Bubble {
            lifetime_ms: 1_000,
            respawn_ms: 2_000,
            ..Default::default()
        };
        b.on_land(id, &mut body, &mut h.ctx(100));
        b.on_land(id, &mut body, &mut h.ctx(400));
        let timer = h.timers.pending_for(id).copied();
        assert_eq!(timer.map(|t| (t.due, t.action)), Some((1_100, TimerAction::PopBubble)));

        b.on_timer(id, &mut body, TimerAction::PopBubble, &mut h.ctx(1_100));
        assert!(!body.visible);
        assert_eq!(
            h.timers.pending_for(id).map(|t| (t.due, t.action)),
            Some((3_100, TimerAction::RespawnBubble))
        );

        b.on_timer(id, &mut body, TimerAction::RespawnBubble, &mut h.ctx(3_100));
        assert!(body.visible);
        assert!(!b.popping);
        assert_eq!(
            h.events,
            vec![
                PhysicsEvent::BubblePopped { platform: id },
                PhysicsEvent::BubbleRespawned { platform: id },
            ]
        );
    }

    #[test]
    fn bubble_bob_is_bounded_at_epoch_scale() {
        let mut h = Harness::new();
        let mut body = Body::new(0.0, 300.0, 60.0, 10.0);
        let mut b = Bubble {
            amplitude: 8.0,
            ..Default::default()
        };
        for now in [1_700_000_000_000u64, 1_700_000_000_016, 1_700_000_000_785] {
            b.advance(PlatformId(0), &mut body, &mut h.ctx(now));
            assert!((body.y - 300.0).abs() <= 8.0);
        }
    }

    #[test]
    fn reflex_drops_after_reaction_window() {
        let mut h = Harness::new();
        let mut body = Body::new(0.0, 300.0, 60.0, 10.0);
        let id = PlatformId(2);
        let mut r = ReflexTest {
            reaction_ms: 300,
            reset_ms: 1_500,
            armed: false,
        };
        r.on_land(id, &mut body, &mut h.ctx(0));
        assert_eq!(h.timers.pending_for(id).map(|t| t.due), Some(300));
        r.on_timer(id, &mut body, TimerAction::ReflexDrop, &mut h.ctx(300));
        assert!(!body.visible);
        assert_eq!(h.events, vec![PhysicsEvent::PlatformFell { platform: id }]);
        r.on_timer(id, &mut body, TimerAction::ReflexRestore, &mut h.ctx(1_800));
        assert!(body.visible);
        assert!(!r.armed);
    }

    #[test]
    fn alarm_is_one_shot_until_reset() {
        let mut h = Harness::new();
        let mut body = Body::new(0.0, 300.0, 60.0, 10.0);
        let id = PlatformId(4);
        let mut a = Alarm::default();
        a.on_land(id, &mut body, &mut h.ctx(5_000));
        a.on_land(id, &mut body, &mut h.ctx(5_016));
        assert_eq!(
            h.events,
            vec![PhysicsEvent::AlarmTriggered {
                platform: id,
                at: 5_000
            }]
        );
        assert_eq!(h.timers.pending_for(id).map(|t| t.due), Some(15_000));

        a.on_timer(id, &mut body, TimerAction::ResetAlarm, &mut h.ctx(15_000));
        assert!(!a.triggered);
        a.on_land(id, &mut body, &mut h.ctx(15_016));
        assert!(a.triggered);
        assert_eq!(a.alarm_time, Some(15_016));
    }

    #[test]
    fn withdrawal_uses_wall_clock_time() {
        let mut h = Harness::new();
        let mut body = Body::new(0.0, 300.0, 60.0, 10.0);
        let id = PlatformId(0);
        let mut w = Withdrawal {
            decay_per_sec: 0.5,
            recover_per_sec: 0.25,
        };
        h.rider = Some(id);
        w.advance(id, &mut body, &mut h.ctx_span(0, 1_000));
        assert_eq!(body.opacity, 0.5);
        assert!(body.visible);
        w.advance(id, &mut body, &mut h.ctx_span(1_000, 1_500));
        assert_eq!(body.opacity, 0.25);
        assert!(!body.visible);

        h.rider = None;
        w.advance(id, &mut body, &mut h.ctx_span(1_500, 3_500));
        assert_eq!(body.opacity, 0.75);
        assert!(body.visible);
    }

    #[test]
    fn hidden_reveals_once_near() {
        let mut h = Harness::new();
        let mut body = Body::new(500.0, 300.0, 60.0, 10.0);
        let id = PlatformId(0);
        let mut hd = Hidden {
            reveal_radius: 100.0,
            revealed: false,
        };
        hd.init(&mut body);
        assert!(!body.visible);

        h.player_center = (100.0, 300.0);
        hd.advance(id, &mut body, &mut h.ctx(0));
        assert!(!body.visible);

        h.player_center = (480.0, 300.0);
        hd.advance(id, &mut body, &mut h.ctx(0));
        assert!(body.visible);

        h.player_center = (0.0, 0.0);
        hd.advance(id, &mut body, &mut h.ctx(0));
        assert!(body.visible, "Reveal is permanent");
    }
}
