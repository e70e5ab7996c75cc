//! Busan points-of-interest collector and chat-completion probe.

pub mod api;
pub mod collector;
pub mod config;
pub mod llm;
pub mod models;
pub mod utils;
