//! Built-in scenario catalog.
//!
//! The catalog is built once per run from the configuration: the Activities
//! scenarios adapt their payloads and type assertions to the configured id
//! and dueDate representations, and the authenticated GitHub scenarios are
//! only emitted when a token is configured.

pub mod activities;
pub mod github;

use crate::config::RunConfig;
use crate::scenario::Scenario;

pub fn catalog(config: &RunConfig) -> Vec<Scenario> {
    let mut scenarios = activities::scenarios(config);
    scenarios.extend(github::scenarios(config));
    scenarios
}

/// Keep only scenarios whose name matches the `*`-wildcard pattern.
pub fn filter(scenarios: Vec<Scenario>, pattern: Option<&str>) -> Vec<Scenario> {
    match pattern {
        Some(pattern) => scenarios
            .into_iter()
            .filter(|scenario| name_matches(pattern, &scenario.name))
            .collect(),
        None => scenarios,
    }
}

/// Case-insensitive glob match where `*` spans any run of characters.
pub fn name_matches(pattern: &str, name: &str) -> bool {
    fn matches(pattern: &[char], name: &[char]) -> bool {
        match pattern.split_first() {
            None => name.is_empty(),
            Some(('*', rest)) => (0..=name.len()).any(|skip| matches(rest, &name[skip..])),
            Some((ch, rest)) => name
                .split_first()
                .is_some_and(|(first, tail)| first == ch && matches(rest, tail)),
        }
    }

    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let name: Vec<char> = name.to_lowercase().chars().collect();
    matches(&pattern, &name)
}
