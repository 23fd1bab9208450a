//! Workflow Data Model
//!
//! Core data structures representing workflow steps and their
//! input/output contracts.
//!
//! # Example YAML Format
//!
//! ```yaml
//! steps:
//!   - outputs: data/clean.csv
//!     inputs: data/raw.csv
//!     method: scrub
//!
//!   - outputs:
//!       - report/summary.txt
//!     inputs: data/clean.csv
//!     output_tags: [report]
//! ```

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single unit of work in a workflow.
///
/// The declared fields come from the workflow definition; the derived
/// fields are populated when the step is indexed into a
/// [`ParseTree`](crate::workflow::tree::ParseTree).
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Step {
    /// Output paths exactly as written in the workflow definition.
    #[serde(
        rename = "outputs",
        deserialize_with = "single_or_vec",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub raw_outputs: Vec<String>,

    /// Input paths exactly as written.
    #[serde(
        rename = "inputs",
        deserialize_with = "single_or_vec",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub raw_inputs: Vec<String>,

    /// Symbolic labels on this step's outputs, targetable as `%tag` and
    /// consumable by other steps' input tags.
    #[serde(
        deserialize_with = "single_or_vec",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub output_tags: Vec<String>,

    /// Symbolic labels this step consumes.
    #[serde(
        deserialize_with = "single_or_vec",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub input_tags: Vec<String>,

    /// Named handler for this step, targetable as `name()`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Output paths after any parser-side expansion. Defaults to the raw
    /// declarations when the parser provides none.
    #[serde(skip)]
    pub outputs: Vec<String>,

    /// Input paths after any parser-side expansion.
    #[serde(skip)]
    pub inputs: Vec<String>,

    /// Canonical absolute forms of `outputs`.
    #[serde(skip)]
    pub norm_outputs: Vec<String>,

    /// Canonical absolute forms of `inputs`.
    #[serde(skip)]
    pub norm_inputs: Vec<String>,

    /// Indices of steps whose outputs this step consumes (by path or tag).
    #[serde(skip)]
    pub parents: Vec<usize>,

    /// Indices of steps consuming this step's outputs.
    #[serde(skip)]
    pub children: Vec<usize>,

    /// Unique working directory assigned to this step.
    #[serde(skip)]
    pub dir: String,
}

/// Deserializes either a single string or array of strings into Vec<String>
fn single_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    match val {
        Value::Null => Ok(Vec::new()),
        Value::String(s) if s.is_empty() => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s]),
        Value::Array(arr) => arr
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(s),
                _ => Err(de::Error::custom("Expected string in array")),
            })
            .collect(),
        _ => Err(de::Error::custom("Expected string or array of strings")),
    }
}

impl Step {
    /// Creates an empty step.
    ///
    /// # Example
    ///
    /// ```
    /// use datamake::Step;
    ///
    /// let step = Step::new()
    ///     .with_input("data/raw.csv")
    ///     .with_output("data/clean.csv")
    ///     .with_method("scrub");
    ///
    /// assert_eq!(step.raw_outputs, vec!["data/clean.csv"]);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output path for this step.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.raw_outputs = vec![output.into()];
        self
    }

    /// Sets multiple output paths for this step.
    pub fn with_outputs(mut self, outputs: Vec<String>) -> Self {
        self.raw_outputs = outputs;
        self
    }

    /// Sets the input path for this step.
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.raw_inputs = vec![input.into()];
        self
    }

    /// Sets multiple input paths for this step.
    pub fn with_inputs(mut self, inputs: Vec<String>) -> Self {
        self.raw_inputs = inputs;
        self
    }

    /// Adds an output tag.
    pub fn with_output_tag(mut self, tag: impl Into<String>) -> Self {
        self.output_tags.push(tag.into());
        self
    }

    /// Adds an input tag.
    pub fn with_input_tag(mut self, tag: impl Into<String>) -> Self {
        self.input_tags.push(tag.into());
        self
    }

    /// Sets the method handler for this step.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }
}

/// A complete workflow: an ordered sequence of steps.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Workflow {
    /// Steps in declaration order. Step indices throughout the engine
    /// refer to positions in this sequence.
    pub steps: Vec<Step>,
}

impl Workflow {
    /// Creates a new empty workflow.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a workflow from a list of steps.
    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Returns the number of steps in the workflow.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the workflow has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_builders() {
        let step = Step::new()
            .with_input("in.csv")
            .with_output("out.csv")
            .with_output_tag("stage1")
            .with_method("scrub");

        assert_eq!(step.raw_inputs, vec!["in.csv"]);
        assert_eq!(step.raw_outputs, vec!["out.csv"]);
        assert_eq!(step.output_tags, vec!["stage1"]);
        assert_eq!(step.method.as_deref(), Some("scrub"));
        assert!(step.parents.is_empty());
        assert!(step.dir.is_empty());
    }

    #[test]
    fn test_step_multiple_inputs_outputs() {
        let step = Step::new()
            .with_inputs(vec!["a.csv".to_string(), "b.csv".to_string()])
            .with_outputs(vec!["x.csv".to_string(), "y.csv".to_string()]);

        assert_eq!(step.raw_inputs.len(), 2);
        assert_eq!(step.raw_outputs.len(), 2);
    }

    #[test]
    fn test_step_tags_accumulate() {
        let step = Step::new().with_input_tag("a").with_input_tag("b");
        assert_eq!(step.input_tags, vec!["a", "b"]);
    }

    #[test]
    fn test_workflow_from_steps() {
        let workflow = Workflow::from_steps(vec![
            Step::new().with_output("a"),
            Step::new().with_output("b"),
        ]);
        assert_eq!(workflow.len(), 2);
        assert!(!workflow.is_empty());
    }

    #[test]
    fn test_workflow_empty() {
        let workflow = Workflow::new();
        assert!(workflow.is_empty());
        assert_eq!(workflow.len(), 0);
    }

    #[test]
    fn test_deserialize_single_string_fields() {
        let yaml = r#"
steps:
  - outputs: out.csv
    inputs: in.csv
    output_tags: done
"#;
        let workflow: Workflow = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(workflow.steps[0].raw_outputs, vec!["out.csv"]);
        assert_eq!(workflow.steps[0].raw_inputs, vec!["in.csv"]);
        assert_eq!(workflow.steps[0].output_tags, vec!["done"]);
    }

    #[test]
    fn test_deserialize_list_fields() {
        let yaml = r#"
steps:
  - outputs: [a.csv, b.csv]
    inputs:
      - c.csv
"#;
        let workflow: Workflow = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(workflow.steps[0].raw_outputs, vec!["a.csv", "b.csv"]);
        assert_eq!(workflow.steps[0].raw_inputs, vec!["c.csv"]);
    }

    #[test]
    fn test_deserialize_defaults() {
        let yaml = r#"
steps:
  - outputs: only.csv
"#;
        let workflow: Workflow = serde_yaml::from_str(yaml).unwrap();
        let step = &workflow.steps[0];
        assert!(step.raw_inputs.is_empty());
        assert!(step.output_tags.is_empty());
        assert!(step.method.is_none());
    }

    #[test]
    fn test_deserialize_rejects_non_string_list() {
        let yaml = r#"
steps:
  - outputs: [1, 2]
"#;
        let result: Result<Workflow, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_skips_derived_fields() {
        let mut step = Step::new().with_output("out.csv");
        step.parents = vec![3];
        step.dir = "/tmp/x".to_string();

        let yaml = serde_yaml::to_string(&Workflow::from_steps(vec![step])).unwrap();
        assert!(yaml.contains("out.csv"));
        assert!(!yaml.contains("parents"));
        assert!(!yaml.contains("/tmp/x"));
    }
}
