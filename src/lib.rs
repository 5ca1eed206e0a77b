// src/lib.rs

//! Pastewatch Library
//!
//! Polls a paste feed, matches new pastes against keyword and CIDR rules
//! and forwards matches to a notifier.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod rules;
pub mod services;
pub mod utils;
