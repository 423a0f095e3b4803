use serde::{Deserialize, Serialize};

/// Default environment variable naming the config file.
const CONFIG_ENV: &str = "VITALRUN_CONFIG";
/// Fallback config path relative to the working directory.
const CONFIG_PATH: &str = "config/vitalrun.toml";

/// Player movement constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration (units/tick^2).
    pub gravity: f32,
    /// Horizontal speed while a direction is held (units/tick).
    pub base_speed: f32,
    /// Initial upward speed of a jump (units/tick).
    pub base_jump_power: f32,
    /// Per-tick horizontal decay without input.
    pub friction: f32,
    /// Per-tick horizontal growth inside a slip zone.
    pub slip_growth: f32,
    /// Minimum |vx| inside a slip zone.
    pub min_slip_speed: f32,
    /// Fraction of the jump power granted by a double jump.
    pub double_jump_factor: f32,
    /// Maximum fall speed while gliding.
    pub glide_max_fall_speed: f32,
    pub player_width: f32,
    pub player_height: f32,
    /// Height multiplier while crouching.
    pub crouch_height_factor: f32,
    /// Slack on the previous-bottom test so riders of moving platforms keep
    /// their footing despite float rounding.
    pub landing_tolerance: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.8,
            base_speed: 5.0,
            base_jump_power: 15.0,
            friction: 0.8,
            slip_growth: 1.05,
            min_slip_speed: 2.0,
            double_jump_factor: 0.8,
            glide_max_fall_speed: 1.5,
            player_width: 40.0,
            player_height: 60.0,
            crouch_height_factor: 0.6,
            landing_tolerance: 0.01,
        }
    }
}

/// Viewport, scrolling and streaming parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Distance below the viewport bottom at which a fall is fatal.
    pub fall_death_margin: f32,
    /// Screen x beyond which the world scrolls instead of the player moving.
    pub scroll_threshold_x: f32,
    /// How far past the right screen edge descriptors are streamed in.
    pub stream_ahead: f32,
    /// How far behind the left screen edge platforms are dropped.
    pub despawn_behind: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            viewport_width: 800.0,
            viewport_height: 600.0,
            fall_death_margin: 100.0,
            scroll_threshold_x: 400.0,
            stream_ahead: 200.0,
            despawn_behind: 400.0,
        }
    }
}

/// Timings and thresholds shared by the platform behaviors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformTuning {
    pub malfunction_duration_ms: u64,
    /// Angular frequency of the malfunction wobble (radians per ms).
    pub malfunction_frequency: f32,
    pub noise_radius: f32,
    pub noise_threshold: f32,
    /// Consecutive loud ticks before a noise-sensitive platform breaks.
    pub noise_break_ticks: u32,
    pub noise_cooldown_ms: u64,
    /// Opacity below which fading platforms stop being solid.
    pub opacity_cutoff: f32,
    /// Fraction of a beat during which a regular rhythmic platform is solid.
    pub rhythm_solid_fraction: f32,
    /// A fibrillating platform is solid when a uniform draw exceeds this.
    pub fibrillation_threshold: f32,
    pub alarm_lockout_ms: u64,
    /// Per-tick acceleration of a released falling platform.
    pub falling_accel: f32,
}

impl Default for PlatformTuning {
    fn default() -> Self {
        Self {
            malfunction_duration_ms: 3000,
            malfunction_frequency: 0.01,
            noise_radius: 500.0,
            noise_threshold: 1.0,
            noise_break_ticks: 60,
            noise_cooldown_ms: 3000,
            opacity_cutoff: 0.3,
            rhythm_solid_fraction: 0.6,
            fibrillation_threshold: 0.3,
            alarm_lockout_ms: 10_000,
            falling_accel: 0.5,
        }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub physics: PhysicsConfig,
    pub world: WorldConfig,
    pub platforms: PlatformTuning,
    pub tick_rate_hz: f32,
    /// Seed for the irregular-rhythm draws.
    pub rng_seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            world: WorldConfig::default(),
            platforms: PlatformTuning::default(),
            tick_rate_hz: 60.0,
            rng_seed: 42,
        }
    }
}

impl SimConfig {
    /// Load config from `VITALRUN_CONFIG` or `config/vitalrun.toml`, falling
    /// back to defaults if neither is present or parseable.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV)
            && let Some(config) = Self::load_from_path(&path)
        {
            return config;
        }
        Self::load_from_path(CONFIG_PATH).unwrap_or_default()
    }

    /// Parse a TOML file, returning `None` if it is missing or invalid.
    pub fn load_from_path(path: &str) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match Self::from_toml(&content) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                tracing::warn!("Failed to parse {path}: {e}, using defaults");
                None
            },
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<SimConfig>(content)
    }
}
