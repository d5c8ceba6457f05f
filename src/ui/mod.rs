//! Terminal chat interface

pub mod app;
pub mod composer;
pub mod history;
pub mod quick_replies;
pub mod theme;

pub use app::App;
