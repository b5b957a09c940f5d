//! Warmcache Infrastructure Layer
//!
//! Response cache, wire codec, UDP upstream, and the early-refresh
//! identity directories.
pub mod directory;
pub mod dns;
pub mod system;
