use rand::SeedableRng;
use rand::rngs::StdRng;

use vitalrun_core::Millis;

use crate::config::{PlatformTuning, WorldConfig};
use crate::environment::ZoneReadings;
use crate::events::PhysicsEvent;
use crate::platform::PlatformId;
use crate::platform::behavior::TickContext;
use crate::platform::noise::NoiseField;
use crate::timers::TimerQueue;

/// Owns everything a `TickContext` borrows so handlers can be driven one
/// call at a time.
pub(crate) struct Harness {
    pub zone: ZoneReadings,
    pub tuning: PlatformTuning,
    pub world: WorldConfig,
    pub noise: NoiseField,
    pub rng: StdRng,
    pub timers: TimerQueue,
    pub events: Vec<PhysicsEvent>,
    pub rider: Option<PlatformId>,
    pub player_center: (f32, f32),
}

impl Harness {
    pub fn new() -> Self {
        Self {
            zone: ZoneReadings::default(),
            tuning: PlatformTuning::default(),
            world: WorldConfig::default(),
            noise: NoiseField::default(),
            rng: StdRng::seed_from_u64(42),
            timers: TimerQueue::new(),
            events: Vec::new(),
            rider: None,
            player_center: (0.0, 0.0),
        }
    }

    /// Context for a tick at `now` with no elapsed time.
    pub fn ctx(&mut self, now: Millis) -> TickContext<'_> {
        self.ctx_span(now, now)
    }

    /// Context for a tick at `now` following one at `prev_now`.
    pub fn ctx_span(&mut self, prev_now: Millis, now: Millis) -> TickContext<'_> {
        TickContext {
            now,
            prev_now,
            tick: 0,
            zone: &self.zone,
            tuning: &self.tuning,
            world: &self.world,
            noise: &self.noise,
            rider: self.rider,
            player_center: self.player_center,
            rng: &mut self.rng,
            timers: &mut self.timers,
            events: &mut self.events,
        }
    }
}
