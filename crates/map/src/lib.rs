//! The map-library contract the viewer drives, plus an in-memory backend.
//!
//! [`MapBackend`] mirrors the subset of the MapLibre GL API the viewer uses.
//! [`HeadlessMap`] implements it without rendering: it keeps layer order,
//! filters, feature state and popups, and animates the camera by simulated
//! time, which is enough to run the viewer in tests and from the CLI.

pub mod backend;
pub mod camera;
pub mod headless;
pub mod spec;

pub use backend::*;
pub use camera::*;
pub use headless::HeadlessMap;
pub use spec::*;
