//! Inbound side: update parsing, routing and the event handlers

pub mod event_handler;
pub mod handler;
pub mod interactive_handler;
pub mod parsing;
pub mod poller;
pub mod private_handler;

pub use handler::EventRouter;
pub use interactive_handler::Interaction;
