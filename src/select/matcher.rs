//! Target Matching
//!
//! Resolves a parsed target to the step indices it names, using the
//! lookup maps built by the indexer. Literal output targets are tried in
//! raw, slash-cleaned, and normalized form; regex targets run over the
//! raw/slash-cleaned map in insertion order so paths match as declared.

use log::debug;
use regex::Regex;

use crate::error::Error;
use crate::fs::slash_clean;
use crate::select::target::{MatchKind, Target};
use crate::workflow::tree::{ParseTree, StepLookup};

/// The wildcard body matching every step.
pub const WILDCARD: &str = "...";

/// Returns the indices of the steps a target names, in declaration
/// order, or [`Error::TargetNotFound`] when there are none.
pub fn match_target(tree: &ParseTree, target: &Target) -> Result<Vec<usize>, Error> {
    let (literal, regexed): (&StepLookup, &StepLookup) = match target.kind {
        MatchKind::Tag => (&tree.by_output_tag, &tree.by_output_tag),
        MatchKind::Method => (&tree.by_method, &tree.by_method),
        MatchKind::Output => (&tree.output_lookup, &tree.output_regex_lookup),
    };

    let dots = target.pattern == WILDCARD;
    let is_regex = target.pattern.starts_with('@');

    let found = if target.kind == MatchKind::Output && dots && !is_regex {
        (0..tree.len()).collect()
    } else if !is_regex && !dots {
        match_literal(tree, target, literal)
    } else {
        match_pattern(target, regexed, dots)?
    };

    debug!("target {} matched {} steps", target.name, found.len());
    if found.is_empty() {
        return Err(Error::TargetNotFound(target.name.clone()));
    }
    Ok(found)
}

/// Exact-key lookup. Output targets are additionally tried under their
/// slash-cleaned and normalized forms, unioned preserving the order of
/// first appearance.
fn match_literal(tree: &ParseTree, target: &Target, literal: &StepLookup) -> Vec<usize> {
    let mut keys = vec![target.pattern.clone()];
    if target.kind == MatchKind::Output {
        keys.push(slash_clean(&target.pattern));
        keys.push(tree.fs().normalize(&target.pattern));
    }

    let mut found = Vec::new();
    for key in &keys {
        if let Some(indices) = literal.get(key) {
            for &index in indices {
                if !found.contains(&index) {
                    found.push(index);
                }
            }
        }
    }
    found
}

/// Regex or `...` matching over the map keys, in insertion order. The
/// collected indices are sorted so steps come back in declaration order.
fn match_pattern(target: &Target, regexed: &StepLookup, dots: bool) -> Result<Vec<usize>, Error> {
    let re = if dots {
        None
    } else {
        let source = &target.pattern[1..];
        let re = Regex::new(source).map_err(|source_err| Error::InvalidRegex {
            pattern: source.to_string(),
            source: source_err,
        })?;
        Some(re)
    };

    let mut found: Vec<usize> = regexed
        .iter()
        .filter(|(key, _)| re.as_ref().map_or(true, |re| re.is_match(key)))
        .flat_map(|(_, indices)| indices.iter().copied())
        .collect();
    found.sort_unstable();
    found.dedup();
    Ok(found)
}
