//! Error types for component pruning builds.

use thiserror::Error;

use crate::build::BuildStage;
use crate::document::NodeId;

/// Stable error codes surfaced in build failure messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// V001: The enabled map was rejected before any mutation
    InvalidInput,
    /// B001: The cached source component is gone and could not be reacquired
    StaleSource,
    /// B002: The working copy could not be produced
    CloneFailed,
    /// B003: The pruned component could not be placed on the canvas
    RenderFailed,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "B001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "V001",
            ErrorCode::StaleSource => "B001",
            ErrorCode::CloneFailed => "B002",
            ErrorCode::RenderFailed => "B003",
        }
    }
}

/// Rejection of a raw enabled map during the validating stage.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("[V001] enabled map must be an object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("[V001] enabled map is empty")]
    Empty,

    #[error("[V001] enabled map has {count} keys (maximum {max})")]
    TooManyKeys { count: usize, max: usize },

    #[error("[V001] key {key:?} is {len} characters long (maximum {max})")]
    KeyTooLong { key: String, len: usize, max: usize },

    #[error("[V001] key {raw:?} is empty after sanitizing")]
    EmptyKey { raw: String },

    #[error("[V001] keys {first:?} and {second:?} collide after sanitizing")]
    DuplicateKey { first: String, second: String },

    #[error("[V001] value for {key:?} cannot be read as a boolean: {found}")]
    NotCoercible { key: String, found: String },
}

/// Failure reported by a document port operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    #[error("node {0} does not exist")]
    NodeNotFound(NodeId),

    #[error("node {0} has been removed from the document")]
    NodeRemoved(NodeId),

    #[error("node {0} has no property definition table")]
    MissingDefinitions(NodeId),

    #[error("host rejected the operation: {0}")]
    Host(String),
}

/// One variant axis or property that could not be pruned.
///
/// These never abort a build; they are collected into the result.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to prune {item:?}: {message}")]
pub struct PruneItemError {
    /// Axis name or property key that was skipped.
    pub item: String,
    /// Underlying failure.
    pub message: String,
}

impl PruneItemError {
    pub(crate) fn new(item: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self {
            item: item.into(),
            message: err.to_string(),
        }
    }
}

/// Fatal failure of a build.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("[B001] source component is no longer available: {reason}")]
    StaleSource { reason: String },

    #[error("[B001] no refresh acknowledgement within {after_ms}ms")]
    RefreshTimedOut { after_ms: u64 },

    #[error("[B002] could not clone source component: {reason}")]
    Clone { reason: String },

    #[error(
        "[B003] pruned component {component} was produced but could not be placed on the canvas: {reason}"
    )]
    Render { component: NodeId, reason: String },
}

impl BuildError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BuildError::Validation(_) => ErrorCode::InvalidInput,
            BuildError::StaleSource { .. } | BuildError::RefreshTimedOut { .. } => {
                ErrorCode::StaleSource
            }
            BuildError::Clone { .. } => ErrorCode::CloneFailed,
            BuildError::Render { .. } => ErrorCode::RenderFailed,
        }
    }

    /// Returns the stage the build was in when it failed.
    pub fn stage(&self) -> BuildStage {
        match self {
            BuildError::Validation(_) => BuildStage::Validating,
            BuildError::StaleSource { .. } | BuildError::RefreshTimedOut { .. } => {
                BuildStage::Refreshing
            }
            BuildError::Clone { .. } => BuildStage::Cloning,
            BuildError::Render { .. } => BuildStage::Rendering,
        }
    }
}
