use rand::rngs::StdRng;

use vitalrun_core::Millis;

use crate::config::{PlatformTuning, WorldConfig};
use crate::environment::ZoneReadings;
use crate::events::PhysicsEvent;
use crate::platform::noise::NoiseField;
use crate::platform::{Body, PlatformId};
use crate::timers::{TimerAction, TimerQueue};

/// Everything a platform handler may read or schedule during one tick.
///
/// Built once per pipeline stage; every platform in the tick sees the same
/// `now`.
pub struct TickContext<'a> {
    pub now: Millis,
    /// `now` of the previous tick (equal to `now` on the first tick).
    pub prev_now: Millis,
    pub tick: u64,
    pub zone: &'a ZoneReadings,
    pub tuning: &'a PlatformTuning,
    pub world: &'a WorldConfig,
    pub noise: &'a NoiseField,
    /// Platform the player stood on at the end of the previous tick.
    pub rider: Option<PlatformId>,
    /// Player center in world space.
    pub player_center: (f32, f32),
    pub rng: &'a mut StdRng,
    pub timers: &'a mut TimerQueue,
    pub events: &'a mut Vec<PhysicsEvent>,
}

impl TickContext<'_> {
    /// Wall-clock milliseconds since the previous tick.
    pub fn elapsed_ms(&self) -> Millis {
        self.now.saturating_sub(self.prev_now)
    }

    pub fn is_ridden(&self, id: PlatformId) -> bool {
        self.rider == Some(id)
    }

    pub fn schedule(&mut self, id: PlatformId, delay_ms: Millis, action: TimerAction) {
        self.timers
            .schedule(id, self.now.saturating_add(delay_ms), action);
    }

    pub fn emit(&mut self, event: PhysicsEvent) {
        self.events.push(event);
    }
}

/// Per-variant handler. Every platform variant implements this; the
/// `PlatformKind` match is the lookup table from tag to handler.
///
/// All hooks default to no-ops so a variant only overrides what it uses.
pub trait PlatformBehavior {
    /// Called once when the platform streams into the world.
    fn init(&mut self, _body: &mut Body) {}

    /// Internal clock-driven state (phase, fade, size). Runs for every
    /// activated platform before kinematics.
    fn advance(&mut self, _id: PlatformId, _body: &mut Body, _ctx: &mut TickContext<'_>) {}

    /// Autonomous movement for this tick.
    fn step_motion(&mut self, _id: PlatformId, _body: &mut Body, _ctx: &mut TickContext<'_>) {}

    /// The player is supported by this platform this tick. Runs on every
    /// supported tick, so one-shot effects guard themselves.
    fn on_land(&mut self, _id: PlatformId, _body: &mut Body, _ctx: &mut TickContext<'_>) {}

    /// A timer scheduled by this platform fired.
    fn on_timer(
        &mut self,
        _id: PlatformId,
        _body: &mut Body,
        _action: TimerAction,
        _ctx: &mut TickContext<'_>,
    ) {
    }

    /// Whether the player can stand on it.
    fn is_solid(&self, body: &Body) -> bool {
        body.activated && body.visible
    }

    /// Whether the rider is translated by this platform's per-tick delta.
    fn carries_rider(&self) -> bool {
        true
    }
}

/// Linear ramp from 0 at `zero_at` to 1 at `one_at`, clamped. A degenerate
/// ramp is a step at `zero_at`.
pub fn ramp(value: f32, zero_at: f32, one_at: f32) -> f32 {
    if (one_at - zero_at).abs() < f32::EPSILON {
        return if value >= zero_at { 1.0 } else { 0.0 };
    }
    ((value - zero_at) / (one_at - zero_at)).clamp(0.0, 1.0)
}

/// Apply an opacity and derive visibility from the cutoff.
pub fn fade(body: &mut Body, opacity: f32, cutoff: f32) {
    let opacity = if opacity.is_finite() { opacity } else { 1.0 };
    body.opacity = opacity.clamp(0.0, 1.0);
    body.visible = body.opacity >= cutoff;
}

/// Phase in `[0, 1)` of `now + offset` within a cycle of `period` ms.
pub fn cycle_phase(now: Millis, offset: i64, period: Millis) -> f32 {
    if period == 0 {
        return 0.0;
    }
    let t = (now as i64).wrapping_add(offset).rem_euclid(period as i64);
    t as f32 / period as f32
}
