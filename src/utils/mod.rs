//! Pure text helpers shared across modules

pub mod html;
pub mod links;
pub mod text;

pub use links::extract_first_url;
pub use text::truncate_chars;
