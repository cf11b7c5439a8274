//! Infrastructure layer: wire protocol, in-memory state and frame delivery.

pub mod dto;
pub mod message_pusher;
pub mod protocol;
pub mod repository;
