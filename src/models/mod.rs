//! Entity types shared across the repository, service, and API layers.

pub mod client;
pub mod enums;
pub mod program;

pub use client::*;
pub use enums::*;
pub use program::*;
