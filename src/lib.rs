//! ragchat library.
//!
//! This module exports public APIs for testing and extension.

pub mod api;
pub mod chat;
pub mod cli;
pub mod config;
pub mod session;
pub mod timestamp;
pub mod ui_state;
pub mod util;
