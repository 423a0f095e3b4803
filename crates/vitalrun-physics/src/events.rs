use serde::{Deserialize, Serialize};

use vitalrun_core::Millis;

use crate::platform::PlatformId;

/// Events reported to the out-of-scope game-state, audio and spawner layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PhysicsEvent {
    /// Support changed to a platform (`Some`) or the ground (`None`).
    Landed { platform: Option<PlatformId> },
    MalfunctionStarted { platform: PlatformId },
    MalfunctionEnded { platform: PlatformId },
    AlarmTriggered { platform: PlatformId, at: Millis },
    AlarmReset { platform: PlatformId },
    /// A noise-sensitive platform gave way.
    PlatformBroken { platform: PlatformId },
    PlatformRestored { platform: PlatformId },
    BubblePopped { platform: PlatformId },
    BubbleRespawned { platform: PlatformId },
    /// A falling or reflex platform dropped away.
    PlatformFell { platform: PlatformId },
    /// The player crossed the fall-death line. Reported once per life.
    FellOutOfWorld { y: f32 },
    PlatformSpawned { platform: PlatformId },
    PlatformDespawned { platform: PlatformId },
}
