//! datamake - Step Selection for Data Workflows
//!
//! A "make for data" planning engine: given a workflow of steps with
//! input/output dependencies and a list of user target expressions,
//! computes the ordered list of steps that must run. The engine never
//! executes anything; it hands an ordered plan to an executor host.
//!
//! # Architecture
//!
//! The library is organized into two main modules:
//!
//! - [`workflow`]: Data structures, YAML loading, and indexing of
//!   workflow definitions into a queryable parse tree
//! - [`select`]: Target expression parsing, matching, dependency-tree
//!   expansion, and merging into an ordered selection
//!
//! # Target expressions
//!
//! A target names steps by output path (`data/clean.csv`), output tag
//! (`%reports`), or method (`scrub()`); `@` introduces a regex body and
//! `...` matches everything. A leading `+` forces the build, `-`
//! excludes the step; `^` spreads the selection to dependents, `=`
//! restricts it to the matched step, and an unqualified target pulls in
//! everything the step depends on.
//!
//! # Example
//!
//! ```
//! use datamake::{select_steps, Config, LocalFileSystem, ParseTree, Step, Workflow};
//!
//! let workflow = Workflow::from_steps(vec![
//!     Step::new().with_output("data/raw.csv").with_method("fetch"),
//!     Step::new()
//!         .with_input("data/raw.csv")
//!         .with_output("data/clean.csv"),
//!     Step::new()
//!         .with_input("data/clean.csv")
//!         .with_output("report.txt"),
//! ]);
//! let tree = ParseTree::build(
//!     workflow,
//!     Box::new(LocalFileSystem::new("/project")),
//!     &Config::default(),
//! )?;
//!
//! // The report and everything it depends on, but skip the cleaner.
//! let plan = select_steps(&tree, &["report.txt", "-data/clean.csv"])?;
//! let indices: Vec<usize> = plan.iter().map(|s| s.index).collect();
//! assert_eq!(indices, vec![0, 2]);
//! # Ok::<(), datamake::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod fs;
pub mod select;
pub mod workflow;

// Re-export commonly used types
pub use config::Config;
pub use error::Error;
pub use fs::{slash_clean, FileSystem, LocalFileSystem};
pub use select::{select_steps, BuildMode, MatchKind, SelectedStep, Target, TreeMode};
pub use workflow::model::{Step, Workflow};
pub use workflow::parser::{load_workflow, save_workflow};
pub use workflow::tree::ParseTree;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_module_exports_step() {
        let step = Step::new().with_output("out.csv");
        assert_eq!(step.raw_outputs, vec!["out.csv"]);
    }

    #[test]
    fn test_module_exports_workflow() {
        let workflow = Workflow::new();
        assert!(workflow.is_empty());
    }

    #[test]
    fn test_end_to_end_selection() {
        let workflow = Workflow::from_steps(vec![
            Step::new().with_output("raw"),
            Step::new().with_input("raw").with_output("clean"),
        ]);
        let tree = ParseTree::build(
            workflow,
            Box::new(LocalFileSystem::new("/project")),
            &Config::default(),
        )
        .unwrap();

        let plan = select_steps(&tree, &["clean"]).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].index, 1);
        assert_eq!(plan[1].build, BuildMode::Timestamped);
    }
}
