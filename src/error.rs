//! Engine Error Types
//!
//! Every failure the selection engine can produce, with the exact
//! messages surfaced to the caller. A `select_steps` call either returns
//! a full ordered plan or one of these; there is no partial result.

use std::error::Error as StdError;
use std::fmt;

/// Errors raised while building a parse tree or selecting steps.
#[derive(Debug, Clone)]
pub enum Error {
    /// A target expression matched no step.
    TargetNotFound(String),

    /// The dependency relation loops. Carries the rendered chain,
    /// e.g. `"a -> b -> a"`.
    CycleDetected(String),

    /// Two selected steps produce the same normalized output.
    DuplicatedOutputs(Vec<String>),

    /// The configured workflow directory root leaves no room for step
    /// names under the path length bound.
    DirTooLong(String),

    /// An `@`-pattern in a target failed to compile.
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetNotFound(name) => write!(f, "target not found: {}", name),
            Self::CycleDetected(chain) => {
                write!(f, "cycle dependency detected: {}", chain)
            }
            Self::DuplicatedOutputs(outputs) => {
                write!(f, "duplicated outputs: {}", outputs.join(", "))
            }
            Self::DirTooLong(dir) => {
                write!(f, "workflow directory name {} is too long.", dir)
            }
            Self::InvalidRegex { pattern, source } => {
                write!(f, "invalid regular expression '{}': {}", pattern, source)
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::InvalidRegex { source, .. } => Some(source),
            _ => None,
        }
    }
}
