//! Processing pipeline and message delivery

pub mod deliver;
pub mod pipeline;

pub use deliver::Rendered;
pub use pipeline::Pipeline;

/// Neutral answer for presses against units that are gone or never existed.
pub const STALE_ACTION_MESSAGE: &str = "This action is no longer available.";
