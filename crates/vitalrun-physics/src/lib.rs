pub mod config;
pub mod environment;
pub mod events;
pub mod hazards;
pub mod input;
pub mod level;
pub mod platform;
pub mod player;
pub mod resolver;
pub mod timers;

use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use vitalrun_core::simulation_snapshot_boilerplate;
use vitalrun_core::{Millis, Simulation};

pub use config::SimConfig;
pub use environment::{Organ, PlatformColor, ZoneReadings};
pub use events::PhysicsEvent;
pub use input::TickInput;
pub use level::{Level, LevelError, PlatformDescriptor, load_level_from_file};
pub use platform::{Platform, PlatformId, PlatformKind, PlatformSet, is_platform_solid};
pub use player::{Abilities, Player};
pub use resolver::Support;

use hazards::{Terrain, player_world_x};
use level::LevelStream;
use platform::{NoiseField, TickContext};
use timers::TimerQueue;

/// Serializable world state handed to renderers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub last_now: Option<Millis>,
    pub world_x: f32,
    pub player: Player,
    pub platforms: Vec<Platform>,
    pub next_platform_id: u64,
    pub timers: TimerQueue,
    pub zone: ZoneReadings,
    pub stream: LevelStream,
    pub fall_reported: bool,
}

/// The movement simulation: one player, the streamed platform set and the
/// level terrain, advanced one fixed tick at a time.
pub struct World {
    config: SimConfig,
    level: Level,
    terrain: Terrain,
    stream: LevelStream,
    player: Player,
    platforms: PlatformSet,
    timers: TimerQueue,
    zone: ZoneReadings,
    rng: StdRng,
    world_x: f32,
    tick: u64,
    last_now: Option<Millis>,
    fall_reported: bool,
    paused: bool,
}

/// Build the per-stage context from disjoint field borrows of `World`.
macro_rules! tick_context {
    ($world:ident, $events:ident, $noise:expr, $now:expr, $prev_now:expr) => {
        TickContext {
            now: $now,
            prev_now: $prev_now,
            tick: $world.tick,
            zone: &$world.zone,
            tuning: &$world.config.platforms,
            world: &$world.config.world,
            noise: $noise,
            rider: $world.player.on_platform,
            player_center: (
                player_world_x(&$world.player, $world.world_x),
                $world.player.center().1,
            ),
            rng: &mut $world.rng,
            timers: &mut $world.timers,
            events: &mut $events,
        }
    };
}

impl World {
    pub fn new(level: Level, config: SimConfig) -> Self {
        let terrain = level.terrain();
        let player = Player::new(level.spawn_x, level.spawn_y, &config.physics);
        let rng = StdRng::seed_from_u64(config.rng_seed);
        let mut world = Self {
            config,
            level,
            terrain,
            stream: LevelStream::new(),
            player,
            platforms: PlatformSet::new(),
            timers: TimerQueue::new(),
            zone: ZoneReadings::default(),
            rng,
            world_x: 0.0,
            tick: 0,
            last_now: None,
            fall_reported: false,
            paused: false,
        };
        world.stream_window(&mut Vec::new());
        world
    }

    pub fn from_level_file(path: impl AsRef<Path>, config: SimConfig) -> Result<Self, LevelError> {
        Ok(Self::new(load_level_from_file(path)?, config))
    }

    /// Clear every platform, timer and scroll offset and start `level` from
    /// its spawn point. Abilities carry over.
    pub fn load_level(&mut self, level: Level) {
        let abilities = self.player.abilities.clone();
        *self = Self::new(level, self.config.clone());
        self.player.abilities = abilities;
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Mutable player access for the ability collaborator.
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn platforms(&self) -> &PlatformSet {
        &self.platforms
    }

    pub fn platform(&self, id: PlatformId) -> Option<&Platform> {
        self.platforms.get(id)
    }

    pub fn world_x(&self) -> f32 {
        self.world_x
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn zone(&self) -> &ZoneReadings {
        &self.zone
    }

    /// Zone readings, set by the zone collaborator between ticks.
    pub fn zone_mut(&mut self) -> &mut ZoneReadings {
        &mut self.zone
    }

    pub fn can_jump(&self) -> bool {
        self.player
            .can_jump(self.terrain.ground_y, self.config.physics.landing_tolerance)
    }

    /// Alarms currently raised, with the instant each was triggered.
    pub fn triggered_alarms(&self) -> Vec<(PlatformId, Millis)> {
        self.platforms
            .iter()
            .filter_map(|p| match &p.kind {
                PlatformKind::Alarm(a) if a.triggered => a.alarm_time.map(|t| (p.id, t)),
                _ => None,
            })
            .collect()
    }

    /// Put the player back at the level spawn in the current screen and
    /// re-arm fall-death reporting.
    pub fn respawn_player(&mut self) {
        self.player.reset(self.level.spawn_x, self.level.spawn_y);
        self.fall_reported = false;
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            last_now: self.last_now,
            world_x: self.world_x,
            player: self.player.clone(),
            platforms: self.platforms.as_slice().to_vec(),
            next_platform_id: self.platforms.next_id(),
            timers: self.timers.clone(),
            zone: self.zone.clone(),
            stream: self.stream.clone(),
            fall_reported: self.fall_reported,
        }
    }

    pub fn restore(&mut self, s: WorldSnapshot) {
        self.tick = s.tick;
        self.last_now = s.last_now;
        self.world_x = s.world_x;
        self.player = s.player;
        self.platforms = PlatformSet::from_parts(s.platforms, s.next_platform_id);
        self.timers = s.timers;
        self.zone = s.zone;
        self.stream = s.stream;
        self.fall_reported = s.fall_reported;
    }

    /// One fixed tick. Stage order is load-bearing: carry needs the
    /// platform's move before kinetics, and landing hooks need resolution
    /// before timers fire.
    fn step(&mut self, now: Millis, input: &TickInput) -> Vec<PhysicsEvent> {
        let mut events = Vec::new();
        let prev_now = self.last_now.unwrap_or(now);
        self.last_now = Some(now);
        self.tick += 1;

        let support_before = Support::of(&self.player);
        let noise = NoiseField::sample(self.platforms.iter());

        // State machine and kinematics.
        let carry = {
            let rider = self.player.on_platform;
            let mut ctx = tick_context!(self, events, &noise, now, prev_now);
            advance_platforms(&mut self.platforms, rider, &mut ctx)
        };
        if let Some((dx, dy)) = carry {
            self.player.x += dx;
            self.player.y += dy;
        }

        // Player kinetics.
        let slipping = self
            .terrain
            .on_slip(player_world_x(&self.player, self.world_x));
        self.player.integrate(
            input,
            &self.config.physics,
            slipping,
            self.terrain.ground_y,
        );

        // Support resolution and landing hooks.
        let support = resolver::resolve_support(
            &mut self.player,
            &self.platforms,
            &self.terrain,
            self.world_x,
            &self.config.physics,
        );
        if let Support::Platform(id) = support {
            let mut ctx = tick_context!(self, events, &noise, now, prev_now);
            if let Some(p) = self.platforms.get_mut(id) {
                p.kind.behavior_mut().on_land(id, &mut p.body, &mut ctx);
            }
        }
        if support != support_before && support != Support::Air {
            let platform = match support {
                Support::Platform(id) => Some(id),
                _ => None,
            };
            events.push(PhysicsEvent::Landed { platform });
        }

        // Deferred transitions. A handler that moves the rider's platform
        // carries the rider too.
        let due = self.timers.drain_due(now);
        if !due.is_empty() {
            let rider = self.player.on_platform;
            let rider_start = rider_position(&self.platforms, rider);
            let mut ctx = tick_context!(self, events, &noise, now, prev_now);
            for timer in due {
                match self.platforms.get_mut(timer.platform) {
                    Some(p) => {
                        p.kind
                            .behavior_mut()
                            .on_timer(timer.platform, &mut p.body, timer.action, &mut ctx);
                    },
                    None => tracing::debug!(
                        platform = ?timer.platform,
                        action = ?timer.action,
                        "Dropped timer for removed platform"
                    ),
                }
            }
            if let (Some((sx, sy)), Some((ex, ey))) =
                (rider_start, rider_position(&self.platforms, rider))
            {
                self.player.x += ex - sx;
                self.player.y += ey - sy;
            }
        }

        // Hazards, boundary and streaming.
        if let Some(e) =
            hazards::check_fall(&self.player, &self.config.world, &mut self.fall_reported)
        {
            events.push(e);
        }
        hazards::scroll_forward(
            &mut self.player,
            &mut self.world_x,
            &self.terrain,
            &self.config.world,
        );
        hazards::clamp_to_viewport(&mut self.player, &self.config.world);
        self.stream_window(&mut events);

        tracing::trace!(
            tick = self.tick,
            world_x = self.world_x,
            events = events.len(),
            "Tick"
        );
        events
    }

    /// Spawn descriptors entering the window and drop platforms left behind.
    fn stream_window(&mut self, events: &mut Vec<PhysicsEvent>) {
        let spawned = self.stream.spawn_due(
            &self.level.platforms,
            self.world_x,
            &self.config.world,
            &mut self.platforms,
        );
        let removed = level::despawn_passed(&mut self.platforms, self.world_x, &self.config.world);
        if !removed.is_empty() {
            if let Some(id) = self.player.on_platform
                && !self.platforms.contains(id)
            {
                self.player.detach();
            }
            let platforms = &self.platforms;
            self.timers.retain_platforms(|id| platforms.contains(id));
        }
        events.extend(
            spawned
                .into_iter()
                .map(|platform| PhysicsEvent::PlatformSpawned { platform }),
        );
        events.extend(
            removed
                .into_iter()
                .map(|platform| PhysicsEvent::PlatformDespawned { platform }),
        );
    }
}

fn rider_position(platforms: &PlatformSet, rider: Option<PlatformId>) -> Option<(f32, f32)> {
    rider
        .and_then(|id| platforms.get(id))
        .map(|p| (p.body.x, p.body.y))
}

/// Run the state machine, then kinematics, over every activated platform.
/// Returns the rider's carry delta when its platform carries.
fn advance_platforms(
    platforms: &mut PlatformSet,
    rider: Option<PlatformId>,
    ctx: &mut TickContext<'_>,
) -> Option<(f32, f32)> {
    let start = rider_position(platforms, rider);

    for p in platforms.iter_mut().filter(|p| p.body.activated) {
        p.kind.behavior_mut().advance(p.id, &mut p.body, ctx);
    }
    for p in platforms.iter_mut().filter(|p| p.body.activated) {
        p.kind.behavior_mut().step_motion(p.id, &mut p.body, ctx);
    }

    let (sx, sy) = start?;
    let p = platforms.get(rider?)?;
    p.kind
        .behavior()
        .carries_rider()
        .then(|| (p.body.x - sx, p.body.y - sy))
}

impl Simulation for World {
    type Input = TickInput;
    type Event = PhysicsEvent;

    fn tick(&mut self, now: Millis, input: &TickInput) -> Vec<PhysicsEvent> {
        if self.paused {
            return Vec::new();
        }
        self.step(now, input)
    }

    fn tick_count(&self) -> u64 {
        self.tick
    }

    fn tick_rate(&self) -> f32 {
        self.config.tick_rate_hz
    }

    simulation_snapshot_boilerplate!(snapshot: WorldSnapshot);
}
