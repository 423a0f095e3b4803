//! Platforms driven by zone readings (oxygen, fluid, temperature, organ
//! health, pH, milestones, color). Each reads one external scalar and turns
//! it into an opacity or a vertical offset.

use serde::{Deserialize, Serialize};

use crate::environment::{Organ, PlatformColor};
use crate::platform::behavior::{PlatformBehavior, TickContext, fade, ramp};
use crate::platform::{Body, PlatformId};

/// Fades out as blood oxygen drops.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OxygenDependent {
    /// Oxygen at which the platform is fully transparent.
    pub min_oxygen: f32,
    /// Oxygen at which it is fully opaque.
    pub full_oxygen: f32,
}

impl PlatformBehavior for OxygenDependent {
    fn advance(&mut self, _id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        let opacity = ramp(ctx.zone.oxygen, self.min_oxygen, self.full_oxygen);
        fade(body, opacity, ctx.tuning.opacity_cutoff);
    }
}

/// Floats upward with the fluid level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidSensitive {
    /// Units of rise per unit of fluid level.
    pub buoyancy: f32,
    /// Upper bound on the rise; 0 means unbounded.
    pub max_rise: f32,
    /// Resting y, captured on the first update.
    pub base_y: Option<f32>,
}

impl PlatformBehavior for FluidSensitive {
    fn advance(&mut self, _id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        let base = *self.base_y.get_or_insert(body.y);
        let mut rise = (ctx.zone.fluid_level * self.buoyancy).max(0.0);
        if self.max_rise > 0.0 {
            rise = rise.min(self.max_rise);
        }
        if rise.is_finite() {
            body.y = base - rise;
        }
    }
}

/// Solid only inside a temperature band, fading near its edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Temperature {
    /// Melts at or above this temperature.
    pub melt_above: Option<f32>,
    /// Freezes solid-through (vanishes) at or below this temperature.
    pub freeze_below: Option<f32>,
    /// Degrees over which the platform fades near a bound; 0 is a hard edge.
    pub fade_band: f32,
}

impl PlatformBehavior for Temperature {
    fn advance(&mut self, _id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        let t = ctx.zone.temperature;
        let mut margin = f32::INFINITY;
        if let Some(melt) = self.melt_above {
            margin = margin.min(melt - t);
        }
        if let Some(freeze) = self.freeze_below {
            margin = margin.min(t - freeze);
        }
        let opacity = if margin.is_infinite() {
            1.0
        } else if self.fade_band > 0.0 {
            (margin / self.fade_band).clamp(0.0, 1.0)
        } else if margin > 0.0 {
            1.0
        } else {
            0.0
        };
        fade(body, opacity, ctx.tuning.opacity_cutoff);
    }
}

/// Mirrors the health of one organ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganSystem {
    pub organ: Organ,
    /// Health below which the platform is gone regardless of opacity.
    pub min_health: f32,
}

impl Default for OrganSystem {
    fn default() -> Self {
        Self {
            organ: Organ::Heart,
            min_health: 0.0,
        }
    }
}

impl PlatformBehavior for OrganSystem {
    fn advance(&mut self, _id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        let health = ctx.zone.organ(self.organ);
        fade(body, health / 100.0, ctx.tuning.opacity_cutoff);
        if health < self.min_health {
            body.visible = false;
        }
    }
}

/// Fades as pH drifts from its optimum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhSensitive {
    pub optimal_ph: Option<f32>,
    /// pH distance at which the platform is fully transparent.
    pub tolerance: f32,
}

impl PlatformBehavior for PhSensitive {
    fn advance(&mut self, _id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        let Some(optimal) = self.optimal_ph else {
            return;
        };
        if self.tolerance <= 0.0 {
            return;
        }
        let deviation = (ctx.zone.ph - optimal).abs();
        fade(body, 1.0 - deviation / self.tolerance, ctx.tuning.opacity_cutoff);
    }
}

/// Appears once enough milestones are reached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Milestone {
    pub required: u32,
}

impl PlatformBehavior for Milestone {
    fn advance(&mut self, _id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        body.visible = ctx.zone.milestones >= self.required;
        body.opacity = if body.visible { 1.0 } else { 0.0 };
    }
}

/// Solid only while its color is the active one. Colorless is always solid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Colored {
    pub color: Option<PlatformColor>,
}

impl PlatformBehavior for Colored {
    fn advance(&mut self, _id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        body.visible = match self.color {
            Some(color) => ctx.zone.active_color == Some(color),
            None => true,
        };
        body.opacity = if body.visible { 1.0 } else { 0.3 };
    }
}
