// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{DEFAULT_BUFFER_SIZE, DEFAULT_CHECKPOINT_INTERVAL, DEFAULT_COPIES};
use crate::config::StepGraph;
use crate::errors::StopMode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main configuration structure for a step graph.
///
/// This struct represents the complete configuration for one run: run-wide
/// options, the step nodes and the hops connecting them. It is typically
/// loaded from a YAML (or TOML) file.
///
/// # Fields
/// * `run` - Run-wide options (optional, every field has a default)
/// * `steps` - Step nodes, in declaration order
/// * `hops` - Directed row channels between steps
///
/// # Example
/// ```yaml
/// run:
///   buffer_size: 1000
///   safe_mode: true
/// steps:
///   - id: numbers
///     type: row_generator
///     options:
///       fields: [{ name: n, type: integer }]
///       rows: [[1], [2], [3]]
///   - id: out
///     type: write_to_log
/// hops:
///   - { from: numbers, to: out }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub run: RunOptions,
    pub steps: Vec<StepConfig>,
    #[serde(default)]
    pub hops: Vec<HopConfig>,
}

/// Run-wide options.
///
/// # Fields
/// * `buffer_size` - Capacity of every rowset unless a hop overrides it (default 10 000)
/// * `safe_mode` - Check producer layouts at every merge point before launch
/// * `safe_mode_per_row` - Also check every row read at a merge point and every row put
/// * `checkpoint_interval` - Rows between progress checkpoints, 0 disables (default 50 000)
/// * `on_error` - How the run stops when a step fails (default `hard`)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    pub buffer_size: usize,
    pub safe_mode: bool,
    pub safe_mode_per_row: bool,
    pub checkpoint_interval: u64,
    pub on_error: StopMode,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            safe_mode: false,
            safe_mode_per_row: false,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            on_error: StopMode::Hard,
        }
    }
}

/// How rows entering a step are spread over its copies.
///
/// # Variants
/// * `Copy` - Round-robin: every row goes to exactly one copy, in rotation
/// * `Distribute` - Same behavior as `Copy`; kept as a separate name for graph files that use it
/// * `Clone` - Broadcast: every copy receives its own copy of every row
/// * `Partition` - Rows with equal values in `field` always go to the same copy
///
/// ```yaml
/// distribution: { partition: { field: customer } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionPolicy {
    #[default]
    Copy,
    Distribute,
    Clone,
    Partition { field: String },
}

impl DistributionPolicy {
    pub fn partition(field: impl Into<String>) -> Self {
        DistributionPolicy::Partition {
            field: field.into(),
        }
    }
}

/// How a step copy with several input rowsets interleaves them.
///
/// # Variants
/// * `RoundRobin` - Rotate over inputs that have rows, dropping inputs as they finish
/// * `Priority` - Drain inputs strictly in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    #[default]
    RoundRobin,
    Priority,
}

/// Configuration for a single step node.
///
/// # Fields
/// * `id` - Unique identifier for this step
/// * `type_id` - Registered step type that implements it
/// * `copies` - Number of parallel copies (default 1)
/// * `distribution` - How incoming rows are spread over the copies
/// * `merge` - Input interleaving; when absent the step type decides
/// * `checkpoint_interval` - Overrides the run-wide checkpoint interval
/// * `error_handling` - Error hop and rejection limits (optional)
/// * `options` - Step-type specific options
///
/// # Example
/// ```yaml
/// id: check_amount
/// type: field_validator
/// copies: 2
/// error_handling:
///   target: rejects
///   max_errors: 100
///   descriptions_field: error_text
/// options:
///   field: amount
///   expect: integer
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub type_id: String,
    #[serde(default = "default_copies")]
    pub copies: usize,
    #[serde(default)]
    pub distribution: DistributionPolicy,
    #[serde(default)]
    pub merge: Option<MergePolicy>,
    #[serde(default)]
    pub checkpoint_interval: Option<u64>,
    #[serde(default)]
    pub error_handling: Option<ErrorHandling>,
    #[serde(default)]
    pub options: HashMap<String, serde_yaml::Value>,
}

fn default_copies() -> usize {
    DEFAULT_COPIES
}

impl StepConfig {
    pub fn new(id: impl Into<String>, type_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_id: type_id.into(),
            copies: DEFAULT_COPIES,
            distribution: DistributionPolicy::default(),
            merge: None,
            checkpoint_interval: None,
            error_handling: None,
            options: HashMap::new(),
        }
    }

    pub fn with_copies(mut self, copies: usize) -> Self {
        self.copies = copies;
        self
    }

    pub fn with_distribution(mut self, distribution: DistributionPolicy) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn with_merge(mut self, merge: MergePolicy) -> Self {
        self.merge = Some(merge);
        self
    }

    pub fn with_checkpoint_interval(mut self, interval: u64) -> Self {
        self.checkpoint_interval = Some(interval);
        self
    }

    pub fn with_error_handling(mut self, error_handling: ErrorHandling) -> Self {
        self.error_handling = Some(error_handling);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<serde_yaml::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Deserialize the step's options into a typed struct.
    pub fn options_as<T: DeserializeOwned>(&self) -> Result<T, String> {
        let mapping: serde_yaml::Mapping = self
            .options
            .iter()
            .map(|(key, value)| (serde_yaml::Value::String(key.clone()), value.clone()))
            .collect();
        serde_yaml::from_value(serde_yaml::Value::Mapping(mapping))
            .map_err(|e| format!("invalid options for step '{}': {}", self.id, e))
    }
}

/// Error hop and rejection limits for a step.
///
/// Rows a step rejects are extended with the configured error fields and sent
/// to `target`. Limits of 0 mean "unlimited".
///
/// # Example
/// ```yaml
/// error_handling:
///   target: rejects
///   max_errors: 10
///   max_percent_errors: 5
///   min_rows_for_percent: 1000
///   nr_errors_field: error_count
///   descriptions_field: error_text
///   fields_field: error_fields
///   codes_field: error_codes
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorHandling {
    pub target: String,
    #[serde(default)]
    pub max_errors: u64,
    #[serde(default)]
    pub max_percent_errors: u64,
    #[serde(default)]
    pub min_rows_for_percent: u64,
    #[serde(default)]
    pub nr_errors_field: Option<String>,
    #[serde(default)]
    pub descriptions_field: Option<String>,
    #[serde(default)]
    pub fields_field: Option<String>,
    #[serde(default)]
    pub codes_field: Option<String>,
}

impl ErrorHandling {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            max_errors: 0,
            max_percent_errors: 0,
            min_rows_for_percent: 0,
            nr_errors_field: None,
            descriptions_field: None,
            fields_field: None,
            codes_field: None,
        }
    }

    pub fn with_max_errors(mut self, max_errors: u64) -> Self {
        self.max_errors = max_errors;
        self
    }

    pub fn with_max_percent_errors(mut self, percent: u64, min_rows: u64) -> Self {
        self.max_percent_errors = percent;
        self.min_rows_for_percent = min_rows;
        self
    }

    pub fn with_nr_errors_field(mut self, name: impl Into<String>) -> Self {
        self.nr_errors_field = Some(name.into());
        self
    }

    pub fn with_descriptions_field(mut self, name: impl Into<String>) -> Self {
        self.descriptions_field = Some(name.into());
        self
    }

    pub fn with_fields_field(mut self, name: impl Into<String>) -> Self {
        self.fields_field = Some(name.into());
        self
    }

    pub fn with_codes_field(mut self, name: impl Into<String>) -> Self {
        self.codes_field = Some(name.into());
        self
    }
}

/// A directed main hop between two steps.
///
/// # Fields
/// * `from` - Producing step
/// * `to` - Consuming step
/// * `buffer_size` - Rowset capacity for this hop, overriding the run-wide value
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HopConfig {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub buffer_size: Option<usize>,
}

impl HopConfig {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            buffer_size: None,
        }
    }
}

/// Load a graph config from a YAML file, or a TOML file when the extension is `.toml`
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GraphConfig, Box<dyn std::error::Error>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("toml"));

    let cfg: GraphConfig = if is_toml {
        toml::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(cfg)
}

/// Load a graph config and validate it into a [`StepGraph`]
///
/// This function loads the configuration and validates the graph to ensure
/// every hop resolves and no cycle exists.
pub fn load_and_validate_config<P: AsRef<Path>>(
    path: P,
) -> Result<StepGraph, Box<dyn std::error::Error>> {
    let cfg = load_config(path)?;

    StepGraph::from_config(&cfg).map_err(|validation_errors| {
        // Convert validation errors into a single error message
        let error_messages: Vec<String> = validation_errors.iter().map(|e| e.to_string()).collect();
        format!(
            "Configuration validation failed:\n{}",
            error_messages.join("\n")
        )
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
steps:
  - id: numbers
    type: row_generator
  - id: out
    type: pass_through
    copies: 3
    distribution: clone
  - id: by_customer
    type: pass_through
    copies: 2
    distribution: { partition: { field: customer } }
hops:
  - from: numbers
    to: out
"#;

        let cfg: GraphConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.steps.len(), 3);
        assert_eq!(cfg.steps[0].copies, 1);
        assert_eq!(cfg.steps[1].copies, 3);
        assert_eq!(cfg.steps[1].distribution, DistributionPolicy::Clone);
        assert_eq!(
            cfg.steps[2].distribution,
            DistributionPolicy::partition("customer")
        );
        assert_eq!(cfg.hops, vec![HopConfig::new("numbers", "out")]);
        assert_eq!(cfg.run, RunOptions::default());
    }

    #[test]
    fn parse_run_options_and_error_handling() {
        let yaml = r#"
run:
  buffer_size: 25
  safe_mode: true
  on_error: safe
steps:
  - id: check
    type: field_validator
    merge: priority
    error_handling:
      target: rejects
      max_errors: 3
      codes_field: code
    options:
      field: amount
      expect: integer
  - id: rejects
    type: pass_through
hops: []
"#;

        let cfg: GraphConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.run.buffer_size, 25);
        assert!(cfg.run.safe_mode);
        assert!(!cfg.run.safe_mode_per_row);
        assert_eq!(cfg.run.on_error, StopMode::Safe);
        assert_eq!(cfg.run.checkpoint_interval, DEFAULT_CHECKPOINT_INTERVAL);

        let check = &cfg.steps[0];
        assert_eq!(check.merge, Some(MergePolicy::Priority));
        let handling = check.error_handling.as_ref().unwrap();
        assert_eq!(handling.target, "rejects");
        assert_eq!(handling.max_errors, 3);
        assert_eq!(handling.codes_field.as_deref(), Some("code"));
        assert_eq!(handling.descriptions_field, None);
    }

    #[test]
    fn test_options_as_typed_struct() {
        #[derive(Debug, Deserialize)]
        struct Opts {
            field: String,
            limit: u64,
        }

        let step = StepConfig::new("s", "t")
            .with_option("field", "amount")
            .with_option("limit", 5u64);
        let opts: Opts = step.options_as().unwrap();
        assert_eq!(opts.field, "amount");
        assert_eq!(opts.limit, 5);

        let err = StepConfig::new("s", "t").options_as::<Opts>().unwrap_err();
        assert!(err.contains("invalid options for step 's'"));
    }

    #[test]
    fn test_load_toml_config() {
        let toml_text = r#"
[run]
buffer_size = 5

[[steps]]
id = "numbers"
type = "row_generator"

[[steps]]
id = "out"
type = "pass_through"

[[hops]]
from = "numbers"
to = "out"
"#;
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(toml_text.as_bytes()).unwrap();

        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.run.buffer_size, 5);
        assert_eq!(cfg.steps.len(), 2);
        assert_eq!(cfg.hops[0].to, "out");
    }

    #[test]
    fn test_load_and_validate_valid_config() {
        let yaml = r#"
steps:
  - id: a
    type: row_generator
  - id: b
    type: pass_through
hops:
  - { from: a, to: b }
"#;
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let graph = load_and_validate_config(file.path()).unwrap();
        assert_eq!(graph.steps().len(), 2);
    }

    #[test]
    fn test_load_and_validate_cyclic_config() {
        let yaml = r#"
steps:
  - id: a
    type: pass_through
  - id: b
    type: pass_through
hops:
  - { from: a, to: b }
  - { from: b, to: a }
"#;
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let error_msg = load_and_validate_config(file.path()).unwrap_err().to_string();
        assert!(error_msg.contains("Cyclic hop detected"));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_config("/definitely/not/here.yaml").is_err());
    }
}
