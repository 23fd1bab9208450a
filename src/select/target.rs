//! Target Expression Parsing
//!
//! User-typed target strings are peeled left to right: an optional build
//! qualifier (`+` forced, `-` exclude), an optional tree qualifier
//! (`^` down-tree, `=` this step only), then the match body. A body
//! starting with `%` names a tag, one ending in `()` names a method,
//! anything else is an output path. Inside the body, a leading `@` marks
//! a regular expression and `...` matches everything.

/// How a selected step should be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Run regardless of timestamps.
    Forced,
    /// Remove the step from the plan.
    Exclude,
    /// Let the executor decide from timestamps.
    #[default]
    Timestamped,
}

/// How far the selection spreads from a matched step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeMode {
    /// The step and everything it depends on.
    Up,
    /// The step and everything depending on it.
    Down,
    /// The step alone.
    Only,
}

/// Which index a target is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Match by output path.
    Output,
    /// Match by output tag.
    Tag,
    /// Match by method name.
    Method,
}

/// A parsed target expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// The expression with build and tree qualifiers stripped, used in
    /// "target not found" messages.
    pub name: String,

    /// Build qualifier, `Timestamped` when none was written.
    pub build: BuildMode,

    /// Tree qualifier, `None` when no sigil was written. Unqualified
    /// additive targets climb up-tree; unqualified exclusions remove
    /// only the matched steps.
    pub tree: Option<TreeMode>,

    /// Index family to match against.
    pub kind: MatchKind,

    /// The match body: a literal, an `@`-prefixed regex, or `...`.
    pub pattern: String,
}

impl Target {
    /// Parses a raw target expression.
    ///
    /// # Example
    ///
    /// ```
    /// use datamake::{BuildMode, MatchKind, Target, TreeMode};
    ///
    /// let target = Target::parse("+^%reports");
    /// assert_eq!(target.build, BuildMode::Forced);
    /// assert_eq!(target.tree, Some(TreeMode::Down));
    /// assert_eq!(target.kind, MatchKind::Tag);
    /// assert_eq!(target.pattern, "reports");
    /// ```
    pub fn parse(raw: &str) -> Self {
        let (build, rest) = match raw.strip_prefix('+') {
            Some(rest) => (BuildMode::Forced, rest),
            None => match raw.strip_prefix('-') {
                Some(rest) => (BuildMode::Exclude, rest),
                None => (BuildMode::Timestamped, raw),
            },
        };

        let (tree, rest) = match rest.strip_prefix('^') {
            Some(rest) => (Some(TreeMode::Down), rest),
            None => match rest.strip_prefix('=') {
                Some(rest) => (Some(TreeMode::Only), rest),
                None => (None, rest),
            },
        };

        let (kind, pattern) = if let Some(tag) = rest.strip_prefix('%') {
            (MatchKind::Tag, tag)
        } else if let Some(method) = rest.strip_suffix("()") {
            (MatchKind::Method, method)
        } else {
            (MatchKind::Output, rest)
        };

        Self {
            name: rest.to_string(),
            build,
            tree,
            kind,
            pattern: pattern.to_string(),
        }
    }
}
