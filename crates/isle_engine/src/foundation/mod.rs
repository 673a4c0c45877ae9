//! Foundation utilities shared across the engine
//!
//! Math types and logging setup. Everything here is dependency-light and
//! usable from any other module.

pub mod logging;
pub mod math;
