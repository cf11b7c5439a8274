//! Utilities shared by the Hiroba relay server and the terminal client.

pub mod logger;
pub mod time;
