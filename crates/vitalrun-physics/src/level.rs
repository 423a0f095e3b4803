//! Level descriptors, loading, streaming and jump validation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{PhysicsConfig, WorldConfig};
use crate::hazards::{Pit, SlipZone, Terrain};
use crate::platform::{Body, PlatformId, PlatformKind, PlatformSet};

/// Errors from loading a level.
#[derive(Debug)]
pub enum LevelError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for LevelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read level: {e}"),
            Self::Parse(e) => write!(f, "failed to parse level: {e}"),
            Self::Invalid(m) => write!(f, "invalid level: {m}"),
        }
    }
}

impl std::error::Error for LevelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for LevelError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for LevelError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}

fn default_true() -> bool {
    true
}

/// One platform as authored in a level file.
///
/// The variant tag and its parameters sit next to the geometry:
/// `{"type": "elevator", "x": 300, "y": 400, "width": 120, "height": 20,
/// "start_y": 400, "end_y": 200, "speed": -2}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformDescriptor {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default = "default_true")]
    pub activated: bool,
    /// Emitted noise. Defaults per variant.
    #[serde(default)]
    pub noise: Option<f32>,
    #[serde(flatten)]
    pub kind: PlatformKind,
}

impl PlatformDescriptor {
    pub fn new(x: f32, y: f32, width: f32, height: f32, kind: PlatformKind) -> Self {
        Self {
            x,
            y,
            width,
            height,
            activated: true,
            noise: None,
            kind,
        }
    }

    /// Insert a live copy into `set`.
    pub fn spawn(&self, set: &mut PlatformSet) -> PlatformId {
        let mut body = Body::new(self.x, self.y, self.width, self.height);
        body.activated = self.activated;
        body.noise = self.noise.unwrap_or_else(|| self.kind.default_noise());
        set.insert(body, self.kind.clone())
    }
}

/// A level: terrain plus platform descriptors sorted by x.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Level {
    pub name: String,
    pub ground_y: f32,
    pub world_length: f32,
    pub spawn_x: f32,
    pub spawn_y: f32,
    pub platforms: Vec<PlatformDescriptor>,
    pub pits: Vec<Pit>,
    pub slip_zones: Vec<SlipZone>,
}

impl Default for Level {
    fn default() -> Self {
        Self {
            name: "untitled".to_string(),
            ground_y: 500.0,
            world_length: 3200.0,
            spawn_x: 100.0,
            spawn_y: 440.0,
            platforms: Vec::new(),
            pits: Vec::new(),
            slip_zones: Vec::new(),
        }
    }
}

/// Replace a non-finite or negative value with zero, warning once per field.
fn sanitize(value: &mut f32, allow_negative: bool, level: &str, field: &str) {
    if !value.is_finite() || (!allow_negative && *value < 0.0) {
        tracing::warn!(level, field, value = *value, "Sanitized level value to 0");
        *value = 0.0;
    }
}

impl Level {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let mut level: Level = serde_json::from_str(json)?;
        level.normalize()?;
        Ok(level)
    }

    /// Reject unusable levels, zero out malformed geometry and sort the
    /// descriptors for streaming.
    pub fn normalize(&mut self) -> Result<(), LevelError> {
        if !self.world_length.is_finite() || self.world_length <= 0.0 {
            return Err(LevelError::Invalid(format!(
                "world_length must be positive, got {}",
                self.world_length
            )));
        }
        if !self.ground_y.is_finite() {
            return Err(LevelError::Invalid("ground_y must be finite".to_string()));
        }
        let name = self.name.clone();
        sanitize(&mut self.spawn_x, true, &name, "spawn_x");
        sanitize(&mut self.spawn_y, true, &name, "spawn_y");
        for d in &mut self.platforms {
            sanitize(&mut d.x, true, &name, "platform.x");
            sanitize(&mut d.y, true, &name, "platform.y");
            sanitize(&mut d.width, false, &name, "platform.width");
            sanitize(&mut d.height, false, &name, "platform.height");
        }
        for pit in &mut self.pits {
            sanitize(&mut pit.x, true, &name, "pit.x");
            sanitize(&mut pit.width, false, &name, "pit.width");
        }
        for zone in &mut self.slip_zones {
            sanitize(&mut zone.x, true, &name, "slip_zone.x");
            sanitize(&mut zone.width, false, &name, "slip_zone.width");
        }
        self.platforms.sort_by(|a, b| a.x.total_cmp(&b.x));
        Ok(())
    }

    pub fn terrain(&self) -> Terrain {
        Terrain {
            ground_y: self.ground_y,
            world_length: self.world_length,
            pits: self.pits.clone(),
            slip_zones: self.slip_zones.clone(),
        }
    }

    /// Pits a standing jump cannot clear with default abilities.
    pub fn untraversable_pits(&self, cfg: &PhysicsConfig) -> Vec<Pit> {
        let reach = max_jump_distance(cfg);
        self.pits
            .iter()
            .filter(|p| p.width > reach)
            .copied()
            .collect()
    }
}

/// Load and normalize a level from a JSON file.
pub fn load_level_from_file(path: impl AsRef<Path>) -> Result<Level, LevelError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let level = Level::from_json(&json)?;
    tracing::info!(
        path = %path.display(),
        name = %level.name,
        platforms = level.platforms.len(),
        "Loaded level"
    );
    Ok(level)
}

/// Horizontal distance covered at base speed while strictly airborne on a
/// full jump from flat ground, stepping the same discrete arc as kinetics.
///
/// A pit no wider than this is cleared by jumping with the center up to one
/// tick of travel before its near edge.
pub fn max_jump_distance(cfg: &PhysicsConfig) -> f32 {
    if cfg.gravity <= 0.0 || cfg.base_jump_power <= 0.0 {
        return 0.0;
    }
    let mut vy = -cfg.base_jump_power;
    let mut y = 0.0f32;
    let mut airborne_ticks = 0u32;
    loop {
        vy += cfg.gravity;
        y += vy;
        if y >= 0.0 || airborne_ticks >= 10_000 {
            break;
        }
        airborne_ticks += 1;
    }
    airborne_ticks as f32 * cfg.base_speed
}

/// Streams descriptors into the platform set as the window advances.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelStream {
    /// Next descriptor to spawn. Descriptors are sorted by x, so everything
    /// before the cursor has already streamed in.
    cursor: usize,
}

impl LevelStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Spawn every descriptor whose left edge entered the stream window.
    pub fn spawn_due(
        &mut self,
        descriptors: &[PlatformDescriptor],
        world_x: f32,
        world: &WorldConfig,
        set: &mut PlatformSet,
    ) -> Vec<PlatformId> {
        let horizon = world_x + world.viewport_width + world.stream_ahead;
        let mut spawned = Vec::new();
        while let Some(d) = descriptors.get(self.cursor) {
            if d.x >= horizon {
                break;
            }
            let id = d.spawn(set);
            tracing::debug!(?id, kind = d.kind.tag(), x = d.x, "Platform streamed in");
            spawned.push(id);
            self.cursor += 1;
        }
        spawned
    }
}

/// Remove platforms that scrolled far enough behind the window.
pub fn despawn_passed(set: &mut PlatformSet, world_x: f32, world: &WorldConfig) -> Vec<PlatformId> {
    let limit = world_x - world.despawn_behind;
    let removed = set.retain(|p| p.body.x + p.body.width >= limit);
    for id in &removed {
        tracing::debug!(?id, "Platform streamed out");
    }
    removed
}
