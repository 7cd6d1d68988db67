//! Protocol module for host communication
//!
//! Defines the message types for the stdio protocol: JSON-RPC 2.0 framing
//! carrying Model Context Protocol requests, one JSON object per line.

mod messages;
mod version;

pub use messages::*;
pub use version::*;
