//! Vendor wire formats

pub mod anthropic;
pub mod chat;
pub mod gemini;
pub mod responses;
