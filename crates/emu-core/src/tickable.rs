//! Trait for components advanced by the machine's cycle loop.

/// A component driven by CPU cycles.
///
/// The machine loop calls `advance` once per instruction or micro-batch with
/// the number of cycles that elapsed. Components must handle any batch size,
/// including zero.
pub trait Tickable {
    /// Advance the component by `cycles` CPU cycles.
    fn advance(&mut self, cycles: u32);

    /// Advance the component by a single cycle.
    fn tick(&mut self) {
        self.advance(1);
    }
}
