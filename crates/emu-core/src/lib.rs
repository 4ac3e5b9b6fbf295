//! Core traits and types shared by the emulated components.
//!
//! Components are driven in CPU cycles by the owning machine loop and are
//! accessed by the processor through memory-mapped registers.

mod bus;
mod interrupt;
mod observable;
mod tickable;

pub use bus::Bus;
pub use interrupt::InterruptLines;
pub use observable::{Observable, Value};
pub use tickable::Tickable;
