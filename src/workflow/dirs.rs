//! Step Directory Naming
//!
//! Assigns each step a unique working directory under the configured
//! temporary root, derived from its outputs and output tags. Names are
//! bounded to [`MAX_PATH`] characters; steps whose truncated names
//! collide are disambiguated with numeric suffixes in declaration order.

use indexmap::IndexMap;
use log::debug;

use crate::config::Config;
use crate::error::Error;
use crate::fs::FileSystem;
use crate::workflow::model::Step;

/// Upper bound on generated directory name length.
pub const MAX_PATH: usize = 200;

/// Assigns a unique `dir` to every step.
///
/// Fails when the absolute temporary root alone reaches [`MAX_PATH`],
/// since no step name could fit under it.
pub fn assign_dirs(steps: &mut [Step], fs: &dyn FileSystem, config: &Config) -> Result<(), Error> {
    let root = fs.absolute_path(&config.tmpdir);
    if root.len() >= MAX_PATH {
        return Err(Error::DirTooLong(root));
    }

    let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (index, step) in steps.iter().enumerate() {
        let parts: Vec<String> = step
            .raw_outputs
            .iter()
            .chain(step.output_tags.iter())
            .map(|part| part.replace('/', "_"))
            .collect();
        let mut name = format!("{}/{}", root, parts.join(","));
        if name.chars().count() > MAX_PATH {
            name = name.chars().take(MAX_PATH).collect();
        }
        groups.entry(name).or_default().push(index);
    }

    for (name, members) in groups {
        if members.len() == 1 {
            steps[members[0]].dir = name;
        } else {
            debug!("{} steps share directory name {}", members.len(), name);
            for (suffix, &index) in members.iter().enumerate() {
                steps[index].dir = format!("{}.{}", name, suffix);
            }
        }
    }

    Ok(())
}
