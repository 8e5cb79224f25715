//! Stream engine error types

use crate::config::ConfigError;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use thiserror::Error;

/// Errors returned by engine setup and registration
#[derive(Error, Debug)]
pub enum EngineError {
    /// Registration attempted after ingestion began
    #[error("Cannot register {kind} '{name}': ingestion has already started")]
    RegistrationClosed { kind: RegistrantKind, name: String },

    /// Worker pool could not be built
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<rayon::ThreadPoolBuildError> for EngineError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        EngineError::ThreadPool(err.to_string())
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrantKind {
    Indexer,
    Analyzer,
}

impl fmt::Display for RegistrantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrantKind::Indexer => write!(f, "indexer"),
            RegistrantKind::Analyzer => write!(f, "analyzer"),
        }
    }
}

/// Stage of a `put` in which a registrant panicked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    DeriveKey,
    Gate,
    Analyze,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::DeriveKey => write!(f, "derive_key"),
            Stage::Gate => write!(f, "gate"),
            Stage::Analyze => write!(f, "analyze"),
        }
    }
}

/// A panic caught inside one registrant while isolating faults
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fault {
    pub registrant: String,
    pub stage: Stage,
    pub message: String,
}

impl Fault {
    pub(crate) fn from_panic(registrant: &str, stage: Stage, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };

        Self {
            registrant: registrant.to_string(),
            stage,
            message,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} panicked in {}: {}", self.registrant, self.stage, self.message)
    }
}
