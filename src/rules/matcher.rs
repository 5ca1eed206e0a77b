//! Evaluation of paste bodies against a [`RuleSet`].

use std::net::Ipv4Addr;

use crate::models::MatchResult;

use super::{Rule, RuleKind, RuleSet};

/// Run every rule against `body` and collect the matches.
///
/// Rules are independent. Each looks only at its first candidate in the
/// body and contributes at most one entry.
pub fn evaluate(body: &str, rules: &RuleSet) -> MatchResult {
    let mut result = MatchResult::default();
    for rule in rules.iter() {
        if let Some(text) = first_match(body, rule) {
            result.record(rule.id.clone(), text);
        }
    }
    result
}

fn first_match(body: &str, rule: &Rule) -> Option<String> {
    match &rule.kind {
        RuleKind::Literal { pattern } => {
            let line = pattern.captures(body)?.get(1)?.as_str().trim();
            if is_excepted(rule, line) {
                return None;
            }
            Some(line.to_string())
        }
        RuleKind::CidrRange {
            candidates,
            network,
        } => {
            let candidate = candidates.find(body)?.as_str().trim();
            let Ok(ip) = candidate.parse::<Ipv4Addr>() else {
                log::debug!("{candidate:?} is not a valid ip");
                return None;
            };
            if !network.contains(ip) {
                return None;
            }
            log::debug!("{network} contains {ip}");
            Some(candidate.to_string())
        }
    }
}

fn is_excepted(rule: &Rule, text: &str) -> bool {
    match rule.exception_in(text) {
        Some(x) => {
            log::debug!("String {text:?} contains exception {x:?}");
            true
        }
        None => false,
    }
}
