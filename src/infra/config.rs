// ============================================================
// Layer 6 — Configuration Loader
// ============================================================
// Reads the YAML run configuration and answers dotted-key
// lookups such as "runner.use_gpu".
//
// Two keys are injected after parsing so later steps can resolve
// relative paths the same way regardless of the working directory:
//
//   yaml_path       — the config path exactly as given on the CLI
//   config_abs_dir  — absolute directory containing the config
//
// A config may spell keys either nested:
//
//   runner:
//     use_gpu: 0
//
// or flat ("runner.use_gpu": 0). `get` accepts both.
//
// Reference: serde_yaml documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::error::InferError;

/// Accumulator names the bundled AUC ops write to; zeroed before each checkpoint.
pub const DEFAULT_ACCUMULATOR_VARS: [&str; 4] = [
    "_generated_var_0",
    "_generated_var_1",
    "_generated_var_2",
    "_generated_var_3",
];

// ─── YamlConfig ───────────────────────────────────────────────────────────────
/// Parsed configuration document. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct YamlConfig {
    root: Mapping,
    abs_dir: PathBuf,
}

impl YamlConfig {
    /// Load and parse the YAML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            InferError::Config(format!("cannot read '{}': {e}", path.display()))
        })?;
        let abs_dir = fs::canonicalize(path)
            .with_context(|| format!("cannot resolve '{}'", path.display()))?
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut config = Self::parse_str(&text, abs_dir)?;
        config.root.insert(
            Value::from("yaml_path"),
            Value::from(path.display().to_string()),
        );
        Ok(config)
    }

    /// Parse a YAML document; relative paths will resolve against `abs_dir`.
    pub fn parse_str(text: &str, abs_dir: impl Into<PathBuf>) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text)
            .map_err(|e| InferError::Config(format!("invalid YAML: {e}")))?;

        let mut root = match value {
            Value::Mapping(m) => m,
            // An empty file parses to Null; treat it as an empty document
            Value::Null => Mapping::new(),
            other => {
                return Err(InferError::Config(format!(
                    "top level must be a mapping, found {}",
                    type_name(&other)
                ))
                .into())
            }
        };

        let abs_dir = abs_dir.into();
        root.insert(
            Value::from("config_abs_dir"),
            Value::from(abs_dir.display().to_string()),
        );
        Ok(Self { root, abs_dir })
    }

    /// Look up a dotted key, walking nested mappings.
    pub fn get(&self, key: &str) -> Option<&Value> {
        lookup(&self.root, key)
    }

    /// Required string value
    pub fn require_str(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(wrong_type(key, "a string", other)),
            None => Err(missing(key)),
        }
    }

    /// Required integer value
    pub fn require_usize(&self, key: &str) -> Result<usize> {
        match self.get(key) {
            Some(v) => as_usize(key, v),
            None => Err(missing(key)),
        }
    }

    /// Optional string with a default
    pub fn str_or(&self, key: &str, default: &str) -> Result<String> {
        match self.get(key) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(wrong_type(key, "a string", other)),
            None => Ok(default.to_string()),
        }
    }

    /// Decode a sub-tree into a typed struct
    pub fn section<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<T> {
        let value = self.get(key).ok_or_else(|| missing(key))?;
        serde_yaml::from_value(value.clone())
            .map_err(|e| InferError::Config(format!("'{key}': {e}")).into())
    }

    /// Resolve a config-relative path. Absolute paths are kept as-is.
    pub fn resolve(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.abs_dir.join(rel)
    }

    /// All leaf entries as (dotted key, rendered value), sorted by key.
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        flatten_into(&self.root, "", &mut out);
        out.sort();
        out
    }

    /// Log the whole configuration, one key per line.
    pub fn print(&self) {
        tracing::info!("**************Common Configuration**************");
        for (key, value) in self.flatten() {
            tracing::info!("{key}: {value}");
        }
        tracing::info!("************************************************");
    }
}

// ─── RunnerConfig ─────────────────────────────────────────────────────────────
/// Typed view over the `runner.*` keys that the driver needs.
///
/// `example_count_method` is carried as the raw string and validated
/// when the reader is built, so an unsupported value surfaces as
/// InferError::InvalidValue rather than a config error.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub use_gpu: bool,
    /// Already resolved against the config directory
    pub model_save_path: PathBuf,
    pub print_interval: usize,
    pub example_count_method: String,
    /// Already resolved against the config directory
    pub test_data_dir: PathBuf,
    pub infer_batch_size: usize,
    pub accumulator_vars: Vec<String>,
}

impl RunnerConfig {
    pub fn from_yaml(cfg: &YamlConfig) -> Result<Self> {
        let use_gpu = match cfg.get("runner.use_gpu") {
            Some(Value::Bool(b)) => *b,
            Some(v) => as_usize("runner.use_gpu", v)? != 0,
            None => return Err(missing("runner.use_gpu")),
        };

        let model_save_path = cfg.resolve(cfg.require_str("runner.model_save_path")?);

        let print_interval = cfg.require_usize("runner.print_interval")?;
        if print_interval == 0 {
            return Err(InferError::Config(
                "runner.print_interval must be greater than 0".to_string(),
            )
            .into());
        }

        let example_count_method = cfg.str_or("runner.example_count_method", "example")?;
        let test_data_dir = cfg.resolve(cfg.require_str("runner.test_data_dir")?);

        let infer_batch_size = match cfg.get("runner.infer_batch_size") {
            Some(v) => as_usize("runner.infer_batch_size", v)?,
            None => 1,
        };
        if infer_batch_size == 0 {
            return Err(InferError::Config(
                "runner.infer_batch_size must be greater than 0".to_string(),
            )
            .into());
        }

        let accumulator_vars = match cfg.get("runner.accumulator_vars") {
            Some(_) => cfg.section::<Vec<String>>("runner.accumulator_vars")?,
            None => DEFAULT_ACCUMULATOR_VARS.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Self {
            use_gpu,
            model_save_path,
            print_interval,
            example_count_method,
            test_data_dir,
            infer_batch_size,
            accumulator_vars,
        })
    }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn lookup<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
    // A literal (possibly dotted) key wins over nested traversal
    if let Some(v) = map.get(key) {
        return Some(v);
    }
    let (head, rest) = key.split_once('.')?;
    match map.get(head)? {
        Value::Mapping(inner) => lookup(inner, rest),
        _ => None,
    }
}

fn flatten_into(map: &Mapping, prefix: &str, out: &mut Vec<(String, String)>) {
    for (k, v) in map {
        let key = match k {
            Value::String(s) => s.clone(),
            other => render(other),
        };
        let full = if prefix.is_empty() { key } else { format!("{prefix}.{key}") };
        match v {
            Value::Mapping(inner) => flatten_into(inner, &full, out),
            leaf => out.push((full, render(leaf))),
        }
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().replace('\n', " "))
            .unwrap_or_default(),
    }
}

fn as_usize(key: &str, value: &Value) -> Result<usize> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| wrong_type(key, "a non-negative integer", value)),
        // Quoted numbers show up in hand-written configs
        Value::String(s) => s
            .trim()
            .parse::<usize>()
            .map_err(|_| wrong_type(key, "a non-negative integer", value)),
        other => Err(wrong_type(key, "a non-negative integer", other)),
    }
}

fn missing(key: &str) -> anyhow::Error {
    InferError::Config(format!("missing required key '{key}'")).into()
}

fn wrong_type(key: &str, expected: &str, found: &Value) -> anyhow::Error {
    InferError::Config(format!("'{key}' must be {expected}, found {}", type_name(found))).into()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
