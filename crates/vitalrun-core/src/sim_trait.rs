use crate::clock::{Clock, Millis};

/// Core trait for a fixed-cadence simulation.
///
/// The host loop owns the simulation exclusively. Renderers on other
/// threads only ever see the bytes produced by `serialize_state`.
pub trait Simulation {
    /// Per-tick input sampled by the host.
    type Input;
    /// Events reported to out-of-scope collaborators.
    type Event;

    /// Advance one tick. `now` is captured once by the caller so every
    /// system inside the tick observes the same instant.
    fn tick(&mut self, now: Millis, input: &Self::Input) -> Vec<Self::Event>;

    /// Capture `now` from `clock` once and advance one tick.
    fn run_frame(&mut self, clock: &dyn Clock, input: &Self::Input) -> Vec<Self::Event> {
        let now = clock.now();
        self.tick(now, input)
    }

    /// Number of ticks executed so far.
    fn tick_count(&self) -> u64;

    /// Nominal tick rate in Hz.
    fn tick_rate(&self) -> f32 {
        60.0
    }

    /// Serialize the authoritative state as a snapshot.
    fn serialize_state(&self) -> Vec<u8>;

    /// Replace state with a snapshot. Undecodable bytes are ignored.
    fn apply_state(&mut self, state: &[u8]);

    fn pause(&mut self);

    fn resume(&mut self);

    fn is_paused(&self) -> bool;
}

/// Generates the snapshot and pause methods shared by every `Simulation`.
///
/// Requires the implementing struct to have a `paused: bool` field and
/// inherent `snapshot(&self) -> $Snapshot` / `restore(&mut self, $Snapshot)`
/// methods. The calling crate must depend on `rmp-serde`.
#[macro_export]
macro_rules! simulation_snapshot_boilerplate {
    (snapshot: $Snapshot:ty) => {
        fn serialize_state(&self) -> Vec<u8> {
            rmp_serde::to_vec_named(&self.snapshot())
                .expect("simulation snapshot serialization must succeed")
        }

        fn apply_state(&mut self, state: &[u8]) {
            if let Ok(s) = rmp_serde::from_slice::<$Snapshot>(state) {
                self.restore(s);
            }
        }

        fn pause(&mut self) {
            self.paused = true;
        }

        fn resume(&mut self) {
            self.paused = false;
        }

        fn is_paused(&self) -> bool {
            self.paused
        }
    };
}
