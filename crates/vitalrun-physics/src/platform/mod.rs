//! Platform data model and the per-variant handler lookup.
//!
//! A platform is a `Body` (world-space box plus the flags collision reads)
//! and a `PlatformKind` carrying the variant's parameters and runtime
//! state. Adding a variant means adding an enum arm, a struct, and its
//! `PlatformBehavior` impl; nothing else dispatches on the tag.

pub mod behavior;
pub mod contact;
pub mod cycle;
pub mod motion;
pub mod noise;
pub mod zone;

#[cfg(test)]
pub(crate) mod test_support;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use vitalrun_core::Aabb;

pub use behavior::{PlatformBehavior, TickContext};
pub use contact::{Alarm, Balance, Bubble, Hidden, ReflexTest, Tilting, Withdrawal};
pub use cycle::{Breathing, Disappearing, GrowthSpurt, Pulsing, Rhythmic};
pub use motion::{Axis, Elevator, Falling, Malfunctioning, Moving, Orbiting};
pub use noise::{NoiseField, NoiseSensitive};
pub use zone::{
    Colored, FluidSensitive, Milestone, OrganSystem, OxygenDependent, PhSensitive, Temperature,
};

/// Stable handle into a `PlatformSet`. Never reused within a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlatformId(pub u64);

/// World-space geometry and the flags collision and rendering read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Enabled by the level or a trigger. Deactivated platforms are frozen.
    pub activated: bool,
    /// Present this tick (phases, fades, pops).
    pub visible: bool,
    /// Render hint, 0..=1.
    pub opacity: f32,
    /// Noise emitted for noise-sensitive neighbours. 0 = silent.
    pub noise: f32,
}

impl Body {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            activated: true,
            visible: true,
            opacity: 1.0,
            noise: 0.0,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Stationary platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixed {}

impl PlatformBehavior for Fixed {}

/// Every platform variant. Internally tagged by `"type"` in level files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PlatformKind {
    Static(Fixed),
    Elevator(Elevator),
    Moving(Moving),
    Orbiting(Orbiting),
    Malfunctioning(Malfunctioning),
    Rhythmic(Rhythmic),
    Breathing(Breathing),
    OxygenDependent(OxygenDependent),
    FluidSensitive(FluidSensitive),
    Tilting(Tilting),
    Temperature(Temperature),
    NoiseSensitive(NoiseSensitive),
    Pulsing(Pulsing),
    Milestone(Milestone),
    GrowthSpurt(GrowthSpurt),
    Bubble(Bubble),
    Balance(Balance),
    ReflexTest(ReflexTest),
    OrganSystem(OrganSystem),
    PhSensitive(PhSensitive),
    Alarm(Alarm),
    Disappearing(Disappearing),
    Falling(Falling),
    Colored(Colored),
    Withdrawal(Withdrawal),
    Hidden(Hidden),
}

impl Default for PlatformKind {
    fn default() -> Self {
        PlatformKind::Static(Fixed::default())
    }
}

impl PlatformKind {
    /// Handler for this variant.
    pub fn behavior(&self) -> &dyn PlatformBehavior {
        match self {
            PlatformKind::Static(b) => b,
            PlatformKind::Elevator(b) => b,
            PlatformKind::Moving(b) => b,
            PlatformKind::Orbiting(b) => b,
            PlatformKind::Malfunctioning(b) => b,
            PlatformKind::Rhythmic(b) => b,
            PlatformKind::Breathing(b) => b,
            PlatformKind::OxygenDependent(b) => b,
            PlatformKind::FluidSensitive(b) => b,
            PlatformKind::Tilting(b) => b,
            PlatformKind::Temperature(b) => b,
            PlatformKind::NoiseSensitive(b) => b,
            PlatformKind::Pulsing(b) => b,
            PlatformKind::Milestone(b) => b,
            PlatformKind::GrowthSpurt(b) => b,
            PlatformKind::Bubble(b) => b,
            PlatformKind::Balance(b) => b,
            PlatformKind::ReflexTest(b) => b,
            PlatformKind::OrganSystem(b) => b,
            PlatformKind::PhSensitive(b) => b,
            PlatformKind::Alarm(b) => b,
            PlatformKind::Disappearing(b) => b,
            PlatformKind::Falling(b) => b,
            PlatformKind::Colored(b) => b,
            PlatformKind::Withdrawal(b) => b,
            PlatformKind::Hidden(b) => b,
        }
    }

    pub fn behavior_mut(&mut self) -> &mut dyn PlatformBehavior {
        match self {
            PlatformKind::Static(b) => b,
            PlatformKind::Elevator(b) => b,
            PlatformKind::Moving(b) => b,
            PlatformKind::Orbiting(b) => b,
            PlatformKind::Malfunctioning(b) => b,
            PlatformKind::Rhythmic(b) => b,
            PlatformKind::Breathing(b) => b,
            PlatformKind::OxygenDependent(b) => b,
            PlatformKind::FluidSensitive(b) => b,
            PlatformKind::Tilting(b) => b,
            PlatformKind::Temperature(b) => b,
            PlatformKind::NoiseSensitive(b) => b,
            PlatformKind::Pulsing(b) => b,
            PlatformKind::Milestone(b) => b,
            PlatformKind::GrowthSpurt(b) => b,
            PlatformKind::Bubble(b) => b,
            PlatformKind::Balance(b) => b,
            PlatformKind::ReflexTest(b) => b,
            PlatformKind::OrganSystem(b) => b,
            PlatformKind::PhSensitive(b) => b,
            PlatformKind::Alarm(b) => b,
            PlatformKind::Disappearing(b) => b,
            PlatformKind::Falling(b) => b,
            PlatformKind::Colored(b) => b,
            PlatformKind::Withdrawal(b) => b,
            PlatformKind::Hidden(b) => b,
        }
    }

    /// Level-file tag of this variant.
    pub fn tag(&self) -> &'static str {
        match self {
            PlatformKind::Static(_) => "static",
            PlatformKind::Elevator(_) => "elevator",
            PlatformKind::Moving(_) => "moving",
            PlatformKind::Orbiting(_) => "orbiting",
            PlatformKind::Malfunctioning(_) => "malfunctioning",
            PlatformKind::Rhythmic(_) => "rhythmic",
            PlatformKind::Breathing(_) => "breathing",
            PlatformKind::OxygenDependent(_) => "oxygen-dependent",
            PlatformKind::FluidSensitive(_) => "fluid-sensitive",
            PlatformKind::Tilting(_) => "tilting",
            PlatformKind::Temperature(_) => "temperature",
            PlatformKind::NoiseSensitive(_) => "noise-sensitive",
            PlatformKind::Pulsing(_) => "pulsing",
            PlatformKind::Milestone(_) => "milestone",
            PlatformKind::GrowthSpurt(_) => "growth-spurt",
            PlatformKind::Bubble(_) => "bubble",
            PlatformKind::Balance(_) => "balance",
            PlatformKind::ReflexTest(_) => "reflex-test",
            PlatformKind::OrganSystem(_) => "organ-system",
            PlatformKind::PhSensitive(_) => "ph-sensitive",
            PlatformKind::Alarm(_) => "alarm",
            PlatformKind::Disappearing(_) => "disappearing",
            PlatformKind::Falling(_) => "falling",
            PlatformKind::Colored(_) => "colored",
            PlatformKind::Withdrawal(_) => "withdrawal",
            PlatformKind::Hidden(_) => "hidden",
        }
    }

    /// Noise a variant emits when its descriptor does not say.
    pub fn default_noise(&self) -> f32 {
        match self {
            PlatformKind::Pulsing(_) => 0.6,
            _ => 0.0,
        }
    }
}

/// A platform in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: PlatformId,
    pub body: Body,
    pub kind: PlatformKind,
}

impl Platform {
    /// Box in screen space for the given scroll offset.
    pub fn screen_aabb(&self, world_x: f32) -> Aabb {
        self.body.aabb().translated_x(world_x)
    }
}

/// Whether the player can currently stand on `platform`.
///
/// Pure function of the variant and its `activated`/`visible` flags.
pub fn is_platform_solid(platform: &Platform) -> bool {
    platform.kind.behavior().is_solid(&platform.body)
}

/// Ordered platform storage with an id index.
///
/// Array order is collision resolution order. Ids are handed out
/// monotonically and never reused, so a removed id simply stops resolving.
#[derive(Debug, Clone, Default)]
pub struct PlatformSet {
    platforms: Vec<Platform>,
    /// O(1) lookup companion for `platforms`.
    index: HashMap<PlatformId, usize>,
    next_id: u64,
}

impl PlatformSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from snapshot parts.
    pub fn from_parts(platforms: Vec<Platform>, next_id: u64) -> Self {
        let mut set = Self {
            platforms,
            index: HashMap::new(),
            next_id,
        };
        set.reindex();
        set
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Add a platform at the end of the resolution order.
    pub fn insert(&mut self, mut body: Body, mut kind: PlatformKind) -> PlatformId {
        let id = PlatformId(self.next_id);
        self.next_id += 1;
        kind.behavior_mut().init(&mut body);
        self.index.insert(id, self.platforms.len());
        self.platforms.push(Platform { id, body, kind });
        id
    }

    pub fn remove(&mut self, id: PlatformId) -> Option<Platform> {
        let idx = self.index.remove(&id)?;
        let platform = self.platforms.remove(idx);
        self.reindex();
        Some(platform)
    }

    /// Keep platforms matching `keep`; returns the ids removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&Platform) -> bool) -> Vec<PlatformId> {
        let mut removed = Vec::new();
        self.platforms.retain(|p| {
            let k = keep(p);
            if !k {
                removed.push(p.id);
            }
            k
        });
        if !removed.is_empty() {
            self.reindex();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.platforms.clear();
        self.index.clear();
    }

    pub fn get(&self, id: PlatformId) -> Option<&Platform> {
        self.index.get(&id).map(|&i| &self.platforms[i])
    }

    pub fn get_mut(&mut self, id: PlatformId) -> Option<&mut Platform> {
        let i = *self.index.get(&id)?;
        self.platforms.get_mut(i)
    }

    pub fn contains(&self, id: PlatformId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Platform> {
        self.platforms.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Platform> {
        self.platforms.iter_mut()
    }

    pub fn as_slice(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    fn reindex(&mut self) {
        self.index = self
            .platforms
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect();
    }
}
