//! Layer Registry: the declarative description of every overlay the map shows.
//!
//! The registry is ordered bottom layer first; that order is the z-order the
//! materializer reproduces on the map.

pub mod barcelona;
pub mod descriptor;
pub mod popup;
pub mod registry;
pub mod symbology;

pub use descriptor::*;
pub use popup::*;
pub use registry::*;
pub use symbology::*;
