//! Data models for the application
//!
//! This module contains all data structures used throughout the application,
//! organized by domain: classification groups, in-flight file descriptors,
//! and the durable upload/derivative records.

mod descriptor;
mod group;
mod upload;
mod variant;

pub use descriptor::*;
pub use group::*;
pub use upload::*;
pub use variant::*;
