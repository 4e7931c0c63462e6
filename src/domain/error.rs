// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every layer returns anyhow::Result. When a failure belongs to
// one of the categories below it is raised as an InferError, so
// callers (and tests) can recover the category with
// `err.downcast_ref::<InferError>()`.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum InferError {
    /// Config file missing or unparsable, or a required key absent / mistyped.
    Config(String),
    /// A directory the run depends on cannot be listed.
    Path(String),
    /// A checkpoint holds no valid serialized program.
    Load(String),
    /// The engine failed while running a batch.
    Execution(String),
    /// A config value is outside the accepted set.
    InvalidValue(String),
    /// An evaluation data line could not be parsed into the feed slots.
    Data(String),
}

impl fmt::Display for InferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config error: {msg}"),
            Self::Path(msg) => write!(f, "path error: {msg}"),
            Self::Load(msg) => write!(f, "load error: {msg}"),
            Self::Execution(msg) => write!(f, "execution error: {msg}"),
            Self::InvalidValue(msg) => write!(f, "invalid value: {msg}"),
            Self::Data(msg) => write!(f, "data error: {msg}"),
        }
    }
}

impl std::error::Error for InferError {}
