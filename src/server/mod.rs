//! Stdio server exposing the persona tools and prompts to a host.

mod dispatch;
pub mod handlers;
mod stdio;
pub mod tools;

pub use dispatch::{McpServer, Reply};
pub use handlers::PersonaHandlers;
pub use stdio::{run_stdio, serve};
