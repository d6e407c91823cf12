//! Host-driven time: frames, fixed-period timers and a trace of what
//! happened on each frame.

pub mod event_bus;
pub mod frame;
pub mod timer;

pub use event_bus::*;
pub use frame::*;
pub use timer::*;
