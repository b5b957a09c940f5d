//! Warmcache Application Layer
//!
//! Ports implemented by the infrastructure crate, plus the use cases that
//! orchestrate them.
pub mod ports;
pub mod services;
pub mod use_cases;
