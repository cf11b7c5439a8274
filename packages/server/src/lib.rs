//! Hiroba relay server library.
//!
//! Accepts raw TCP connections, upgrades them to WebSocket text channels and
//! rebroadcasts every message to all other participants, replaying a bounded
//! backlog to newcomers.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
