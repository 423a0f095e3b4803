//! Clock-driven platforms: heartbeats, pulses, blinking, breathing and
//! growth. All phases come from the tick's wall-clock `now`.

use std::f32::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use vitalrun_core::Millis;

use crate::platform::behavior::{PlatformBehavior, TickContext, cycle_phase, fade};
use crate::platform::{Body, PlatformId};

/// Solid for the first part of every beat, or at random when fibrillating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rhythmic {
    pub beat_interval: Millis,
    /// Phase shift in ms; may be negative.
    pub offset: i64,
    /// Fibrillating: solidity is a fresh random draw every tick.
    pub irregular: bool,
    /// Last computed phase in `[0, 1)`.
    pub beat_phase: f32,
}

impl PlatformBehavior for Rhythmic {
    fn advance(&mut self, _id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        if self.beat_interval == 0 {
            body.visible = true;
            return;
        }
        self.beat_phase = cycle_phase(ctx.now, self.offset, self.beat_interval);
        body.visible = if self.irregular {
            ctx.rng.random::<f32>() > ctx.tuning.fibrillation_threshold
        } else {
            self.beat_phase < ctx.tuning.rhythm_solid_fraction
        };
    }
}

/// Opacity follows a sine pulse; solid while bright enough.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pulsing {
    pub period_ms: Millis,
    pub offset_ms: i64,
}

impl PlatformBehavior for Pulsing {
    fn advance(&mut self, _id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        if self.period_ms == 0 {
            return;
        }
        let phase = cycle_phase(ctx.now, self.offset_ms, self.period_ms);
        let opacity = 0.5 + 0.5 * (TAU * phase).sin();
        fade(body, opacity, ctx.tuning.opacity_cutoff);
    }
}

/// Visible for `visible_ms`, then gone for `hidden_ms`, repeating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Disappearing {
    pub visible_ms: Millis,
    pub hidden_ms: Millis,
    pub offset_ms: i64,
}

impl PlatformBehavior for Disappearing {
    fn advance(&mut self, _id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        let cycle = self.visible_ms + self.hidden_ms;
        if cycle == 0 {
            body.visible = true;
            return;
        }
        let t = (ctx.now as i64)
            .wrapping_add(self.offset_ms)
            .rem_euclid(cycle as i64) as Millis;
        body.visible = t < self.visible_ms;
        body.opacity = if body.visible { 1.0 } else { 0.0 };
    }
}

/// Width swells and shrinks around a fixed center.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Breathing {
    pub min_width: f32,
    pub max_width: f32,
    pub period_ms: Millis,
    /// Captured on the first update.
    pub original_x: Option<f32>,
    pub original_width: Option<f32>,
}

impl PlatformBehavior for Breathing {
    fn advance(&mut self, _id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        let ox = *self.original_x.get_or_insert(body.x);
        let ow = *self.original_width.get_or_insert(body.width);
        if self.period_ms == 0 || self.max_width <= 0.0 {
            return;
        }
        let (lo, hi) = if self.min_width <= self.max_width {
            (self.min_width, self.max_width)
        } else {
            (self.max_width, self.min_width)
        };
        let phase = cycle_phase(ctx.now, 0, self.period_ms);
        let s = (TAU * phase).sin();
        body.width = lo + (hi - lo) * (s + 1.0) / 2.0;
        body.x = ox - (body.width - ow) / 2.0;
    }

    fn carries_rider(&self) -> bool {
        false
    }
}

/// Grows to `target_width` over `duration_ms` once first stood on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthSpurt {
    pub target_width: f32,
    pub duration_ms: Millis,
    pub started_at: Option<Millis>,
    pub original_x: Option<f32>,
    pub original_width: Option<f32>,
}

impl PlatformBehavior for GrowthSpurt {
    fn advance(&mut self, _id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        let (Some(start), Some(ox), Some(ow)) =
            (self.started_at, self.original_x, self.original_width)
        else {
            return;
        };
        if self.target_width <= 0.0 {
            return;
        }
        let progress = if self.duration_ms == 0 {
            1.0
        } else {
            (ctx.now.saturating_sub(start) as f32 / self.duration_ms as f32).min(1.0)
        };
        body.width = ow + (self.target_width - ow) * progress;
        body.x = ox - (body.width - ow) / 2.0;
    }

    fn on_land(&mut self, id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        if self.started_at.is_some() {
            return;
        }
        self.started_at = Some(ctx.now);
        self.original_x = Some(body.x);
        self.original_width = Some(body.width);
        tracing::debug!(?id, target = self.target_width, "Growth spurt started");
    }

    fn carries_rider(&self) -> bool {
        false
    }
}
