//! persona-switcher — manage persona files and serve them to a host over stdio.
//!
//! A persona is a Markdown file with a small metadata block and a body of
//! instructions. The [`persona::PersonaStore`] owns the directory of those
//! files; [`server`] exposes list/activate/create/edit/delete as tools and
//! every persona as a prompt.

pub mod config;
pub mod error;
pub mod logging;
pub mod persona;
pub mod protocol;
pub mod server;
pub mod storage;
pub mod version;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use persona::PersonaStore;
