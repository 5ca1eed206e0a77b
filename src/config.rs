// src/config.rs

//! Configuration loading utilities.
//!
//! Startup is all-or-nothing: an unreadable file, an invalid setting or a
//! rule that does not compile aborts before any polling starts.

use std::path::Path;

use crate::error::Result;
use crate::models::Config;
use crate::rules::RuleSet;

/// Load, validate and compile the configuration at `path`.
pub fn load_all(path: &Path) -> Result<(Config, RuleSet)> {
    let config = Config::load(path)?;
    let rules = prepare(&config)?;
    Ok((config, rules))
}

/// Validate a loaded configuration and compile its rules.
pub fn prepare(config: &Config) -> Result<RuleSet> {
    config.validate()?;

    let rules = RuleSet::compile(&config.keywords)?;
    if rules.is_empty() {
        log::warn!("No keywords configured, nothing will ever match");
    }
    Ok(rules)
}
