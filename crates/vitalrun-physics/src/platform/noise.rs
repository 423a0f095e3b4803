//! Noise propagation between platforms.
//!
//! Noisy platforms (pulsing ones by default) are sampled once per tick into
//! a `NoiseField`; noise-sensitive platforms read the summed, linearly
//! attenuated level at their center.

use serde::{Deserialize, Serialize};

use vitalrun_core::geometry::distance;

use crate::events::PhysicsEvent;
use crate::platform::behavior::{PlatformBehavior, TickContext};
use crate::platform::{Body, Platform, PlatformId};
use crate::timers::TimerAction;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseSource {
    pub id: PlatformId,
    pub x: f32,
    pub y: f32,
    pub level: f32,
}

/// Noise emitters captured at the start of a tick.
#[derive(Debug, Clone, Default)]
pub struct NoiseField {
    sources: Vec<NoiseSource>,
}

impl NoiseField {
    /// Collect every activated platform with a positive noise level.
    pub fn sample<'a>(platforms: impl IntoIterator<Item = &'a Platform>) -> Self {
        let sources = platforms
            .into_iter()
            .filter(|p| p.body.activated && p.body.noise > 0.0)
            .map(|p| {
                let (x, y) = p.body.center();
                NoiseSource {
                    id: p.id,
                    x,
                    y,
                    level: p.body.noise,
                }
            })
            .collect();
        Self { sources }
    }

    pub fn sources(&self) -> &[NoiseSource] {
        &self.sources
    }

    /// Summed level at `(x, y)`, each source attenuated linearly to zero at
    /// `radius`. `exclude` skips the listener itself.
    pub fn level_at(&self, x: f32, y: f32, radius: f32, exclude: Option<PlatformId>) -> f32 {
        if radius <= 0.0 {
            return 0.0;
        }
        self.sources
            .iter()
            .filter(|s| Some(s.id) != exclude)
            .map(|s| {
                let d = distance(x, y, s.x, s.y);
                if d < radius {
                    s.level * (1.0 - d / radius)
                } else {
                    0.0
                }
            })
            .sum()
    }
}

/// Gives way after sustained loud noise, returning after a cooldown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSensitive {
    /// Overrides the tuned threshold.
    pub threshold: Option<f32>,
    /// Consecutive ticks above the threshold.
    pub loud_ticks: u32,
    pub broken: bool,
}

impl PlatformBehavior for NoiseSensitive {
    fn advance(&mut self, id: PlatformId, body: &mut Body, ctx: &mut TickContext<'_>) {
        if self.broken {
            return;
        }
        let (cx, cy) = body.center();
        let level = ctx.noise.level_at(cx, cy, ctx.tuning.noise_radius, Some(id));
        let threshold = self.threshold.unwrap_or(ctx.tuning.noise_threshold);
        if level > threshold {
            self.loud_ticks += 1;
        } else {
            self.loud_ticks = 0;
        }
        if self.loud_ticks >= ctx.tuning.noise_break_ticks {
            self.broken = true;
            self.loud_ticks = 0;
            body.activated = false;
            ctx.schedule(id, ctx.tuning.noise_cooldown_ms, TimerAction::RestoreAfterNoise);
            ctx.emit(PhysicsEvent::PlatformBroken { platform: id });
            tracing::debug!(?id, level, "Platform broke from noise");
        }
    }

    fn on_timer(
        &mut self,
        id: PlatformId,
        body: &mut Body,
        action: TimerAction,
        ctx: &mut TickContext<'_>,
    ) {
        if action != TimerAction::RestoreAfterNoise {
            return;
        }
        self.broken = false;
        body.activated = true;
        ctx.emit(PhysicsEvent::PlatformRestored { platform: id });
        tracing::debug!(?id, "Platform restored after noise");
    }
}
