//! Domain types and in-process state

pub mod access;
pub mod config;
pub mod models;
pub mod sessions;
pub mod store;

pub use access::{Access, AccessFilter};
pub use sessions::NoteSessions;
pub use store::WorkUnitStore;
