pub mod clock;
pub mod geometry;
pub mod sim_trait;

pub use clock::{Clock, ManualClock, Millis, SystemClock, now_millis};
pub use geometry::Aabb;
pub use sim_trait::Simulation;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::clock::Millis;
    use crate::sim_trait::Simulation;

    /// Nominal frame length used by the helpers (60 Hz).
    pub const FRAME_MS: Millis = 16;

    /// Run `n` ticks with the same input starting at `start`, spacing them
    /// `FRAME_MS` apart. Returns all accumulated events and the last `now`.
    pub fn run_ticks<S: Simulation>(
        sim: &mut S,
        start: Millis,
        n: usize,
        input: &S::Input,
    ) -> (Vec<S::Event>, Millis) {
        let mut now = start;
        let mut all_events = Vec::new();
        for _ in 0..n {
            all_events.extend(sim.tick(now, input));
            now += FRAME_MS;
        }
        (all_events, now)
    }

    // ================================================================
    // Simulation Contract Tests
    // ================================================================
    // Every Simulation implementation must pass these. Crates call them
    // from their own #[cfg(test)] modules with a concrete instance.

    /// tick() must advance the tick counter and change the snapshot.
    pub fn contract_tick_advances_state<S: Simulation>(sim: &mut S, now: Millis, input: &S::Input) {
        let before = sim.serialize_state();
        let count = sim.tick_count();
        sim.tick(now, input);
        assert_eq!(sim.tick_count(), count + 1, "tick() must bump tick_count");
        assert_ne!(
            before,
            sim.serialize_state(),
            "tick() must advance simulation state"
        );
    }

    /// serialize → apply → serialize must be stable.
    pub fn contract_state_roundtrip_preserves<S: Simulation>(sim: &mut S) {
        let state_a = sim.serialize_state();
        sim.apply_state(&state_a);
        let state_b = sim.serialize_state();
        sim.apply_state(&state_b);
        let state_c = sim.serialize_state();
        assert_eq!(state_a, state_b, "State must survive a snapshot roundtrip");
        assert_eq!(state_b, state_c, "State must be stable after roundtrip");
    }

    /// Garbage snapshot bytes must leave state untouched.
    pub fn contract_apply_garbage_ignored<S: Simulation>(sim: &mut S) {
        let before = sim.serialize_state();
        sim.apply_state(&[0xc1, 0xff, 0x00, 0x13]);
        assert_eq!(before, sim.serialize_state(), "Garbage must be ignored");
    }

    /// pause() must freeze state, resume() must unfreeze it.
    pub fn contract_pause_stops_updates<S: Simulation>(sim: &mut S, now: Millis, input: &S::Input) {
        sim.pause();
        assert!(sim.is_paused());
        let before = sim.serialize_state();
        sim.tick(now, input);
        let during_pause = sim.serialize_state();
        assert_eq!(before, during_pause, "State must not change while paused");

        sim.resume();
        sim.tick(now + FRAME_MS, input);
        let after_resume = sim.serialize_state();
        assert_ne!(during_pause, after_resume, "State must change after resume");
    }
}
