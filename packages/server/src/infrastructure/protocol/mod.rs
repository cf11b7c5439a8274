//! WebSocket wire protocol (RFC 6455 subset): upgrade handshake and frame codec.

pub mod frame;
pub mod handshake;

pub use frame::{Frame, Opcode, apply_mask, decode, encode, encode_frame, frame_len, parse_frame};
pub use handshake::{HandshakeError, HandshakeLimits, Upgraded, accept_token, negotiate};
