//! Workflow Parser
//!
//! Handles loading and saving workflow definitions from YAML files.
//! Dependencies are not declared in the file; they are derived from
//! input/output path and tag matching when the workflow is indexed into
//! a parse tree.

use std::error::Error;
use std::fs;

use log::{debug, info};

use super::model::Workflow;

/// Loads a workflow from a YAML file.
///
/// # Arguments
///
/// * `path` - Path to the workflow YAML file
///
/// # Returns
///
/// * `Ok(Workflow)` - Successfully loaded workflow
/// * `Err` - Read or parse error
///
/// # Example
///
/// ```rust,no_run
/// use datamake::load_workflow;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let workflow = load_workflow("pipeline.yaml")?;
///     println!("Loaded {} steps", workflow.len());
///     Ok(())
/// }
/// ```
pub fn load_workflow(path: &str) -> Result<Workflow, Box<dyn Error>> {
    info!("Loading workflow from: {}", path);

    let yaml_content = fs::read_to_string(path).map_err(|e| {
        format!(
            "Failed to read workflow file '{}': {}. Check that the file exists and is readable.",
            path, e
        )
    })?;

    debug!("YAML content loaded ({} bytes)", yaml_content.len());

    let workflow: Workflow = serde_yaml::from_str(&yaml_content).map_err(|e| {
        format!(
            "Failed to parse workflow YAML: {}. Check the file format.",
            e
        )
    })?;

    info!("Parsed {} steps", workflow.len());

    Ok(workflow)
}

/// Saves a workflow to a YAML file.
///
/// Only the declared fields are written; derived annotations (parents,
/// children, directories) are omitted.
pub fn save_workflow(workflow: &Workflow, path: &str) -> Result<(), Box<dyn Error>> {
    let yaml_content = serde_yaml::to_string(workflow)?;
    fs::write(path, yaml_content)?;
    info!("Workflow saved to: {}", path);
    Ok(())
}
