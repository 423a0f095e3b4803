use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Body system tracked by organ-system platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Organ {
    Heart,
    Lungs,
    Liver,
    Kidneys,
    Brain,
    Stomach,
}

/// Color channel for colored platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformColor {
    Red,
    Green,
    Blue,
    Yellow,
}

/// Scalars published by the zone subsystem between ticks.
///
/// The simulation only reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneReadings {
    /// Blood oxygen, 0..=100.
    pub oxygen: f32,
    /// Fluid level, 0..=1.
    pub fluid_level: f32,
    /// Degrees Celsius.
    pub temperature: f32,
    pub ph: f32,
    /// Developmental milestones reached so far.
    pub milestones: u32,
    pub active_color: Option<PlatformColor>,
    /// Health per organ, 0..=100. Missing organs read as healthy.
    pub organ_health: BTreeMap<Organ, f32>,
}

impl Default for ZoneReadings {
    fn default() -> Self {
        Self {
            oxygen: 100.0,
            fluid_level: 0.0,
            temperature: 37.0,
            ph: 7.4,
            milestones: 0,
            active_color: None,
            organ_health: BTreeMap::new(),
        }
    }
}

impl ZoneReadings {
    pub fn organ(&self, organ: Organ) -> f32 {
        self.organ_health.get(&organ).copied().unwrap_or(100.0)
    }
}
