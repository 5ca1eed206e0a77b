//! Rule compilation.
//!
//! Turns the `[[keywords]]` definitions from the config file into a
//! [`RuleSet`] that [`evaluate`] runs against paste bodies:
//!
//! - `literal` rules capture every line containing the keyword,
//!   case-insensitively, with the keyword escaped.
//! - `cidr` rules capture dotted-quad candidates and test them against
//!   an IPv4 network.
//!
//! The set is built once at startup and shared read-only afterwards.

mod cidr;
mod matcher;

use std::collections::HashMap;

use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::{KeywordConfig, KeywordType};

pub use cidr::{CidrParseError, Ipv4Network};
pub use matcher::evaluate;

/// Dotted-quad candidates (IPv4 only).
const IPV4_CANDIDATE: &str = r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b";

/// How a rule finds candidate text.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Whole lines containing the keyword
    Literal { pattern: Regex },
    /// Dotted-quads inside a network
    CidrRange {
        candidates: Regex,
        network: Ipv4Network,
    },
}

/// A compiled rule.
#[derive(Debug, Clone)]
pub struct Rule {
    /// The configured keyword or CIDR string
    pub id: String,
    pub kind: RuleKind,
    /// Substrings that suppress a literal match of this rule
    pub exceptions: Vec<String>,
}

impl Rule {
    /// Compile a single rule definition.
    pub fn compile(def: &KeywordConfig) -> Result<Self> {
        if def.keyword.is_empty() {
            return Err(AppError::config("empty keyword in rule definition"));
        }

        let kind = match def.kind {
            KeywordType::Cidr => {
                let network: Ipv4Network = def.keyword.parse().map_err(|e| {
                    AppError::config(format!("could not parse cidr {}: {e}", def.keyword))
                })?;
                let candidates = Regex::new(IPV4_CANDIDATE)
                    .map_err(|e| AppError::pattern(&def.keyword, e))?;
                RuleKind::CidrRange {
                    candidates,
                    network,
                }
            }
            KeywordType::Literal => {
                let source = format!(r"(?im)^(.*{}.*)$", regex::escape(&def.keyword));
                let pattern = Regex::new(&source).map_err(|e| AppError::pattern(&def.keyword, e))?;
                RuleKind::Literal { pattern }
            }
        };

        Ok(Self {
            id: def.keyword.clone(),
            kind,
            exceptions: def.exceptions.clone(),
        })
    }

    /// First exception contained in `text`, if any.
    pub fn exception_in(&self, text: &str) -> Option<&str> {
        self.exceptions
            .iter()
            .map(String::as_str)
            .find(|x| text.contains(x))
    }
}

/// Immutable mapping from rule identifier to compiled rule.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: HashMap<String, Rule>,
}

impl RuleSet {
    /// Compile every definition; any failure rejects the whole set.
    pub fn compile(defs: &[KeywordConfig]) -> Result<Self> {
        let mut rules = HashMap::with_capacity(defs.len());
        for def in defs {
            let rule = Rule::compile(def)?;
            if rules.contains_key(&rule.id) {
                return Err(AppError::config(format!(
                    "duplicate keyword {:?}",
                    rule.id
                )));
            }
            rules.insert(rule.id.clone(), rule);
        }
        Ok(Self { rules })
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
