use std::cell::Cell;

/// Wall-clock instant in epoch milliseconds.
pub type Millis = u64;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> Millis {
    let dur = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    dur.as_millis() as Millis
}

/// Source of the single timestamp captured at the start of each tick.
pub trait Clock {
    fn now(&self) -> Millis;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Millis {
        now_millis()
    }
}

/// Clock that only moves when told to. Used by tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Millis>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, ms: Millis) {
        self.now.set(self.now.get().saturating_add(ms));
    }

    pub fn set(&self, ms: Millis) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        self.now.get()
    }
}
