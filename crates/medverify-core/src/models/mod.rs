//! Domain models for the medverify system.

mod activity;
mod analysis;
mod registry;
mod verification;

pub use activity::*;
pub use analysis::*;
pub use registry::*;
pub use verification::*;
