//! Application core of the accessibility map.
//!
//! Everything here is host-agnostic: it talks to the map through
//! [`map::MapBackend`] and is driven by explicit calls (pointer events,
//! control changes, elapsed time). The wasm front end and the `impd` CLI are
//! thin hosts around [`Viewer`].

pub mod bootstrap;
pub mod config;
pub mod controls;
pub mod error;
pub mod fetch;
pub mod filters;
pub mod interaction;
pub mod materializer;
pub mod rotation;
pub mod slider;
pub mod viewer;

pub use config::ViewerConfig;
pub use error::{FetchError, ViewerError};
pub use filters::FilterCombinator;
pub use viewer::Viewer;
