//! Error Types
//!
//! A single error enum covers descriptor construction, runtime dispatch and
//! registry access. Build-time variants abort the whole descriptor; runtime
//! variants are scoped to the one call that produced them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::ValueType;

/// Boxed cause carried by [`ManagementError::InvocationFailure`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used across the crate
pub type ManagementResult<T> = Result<T, ManagementError>;

/// What kind of member a lookup was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Attribute,
    Operation,
    MBean,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Attribute => write!(f, "attribute"),
            MemberKind::Operation => write!(f, "operation"),
            MemberKind::MBean => write!(f, "MBean"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ManagementError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Method {method} is annotated as ManagedAttribute but doesn't look like a valid getter or setter")]
    AnnotationMismatch { method: String },

    #[error("Annotation conflict: {0}")]
    AnnotationConflict(String),

    #[error("No MBean registry available")]
    RegistryUnavailable,

    #[error("MBean already registered under {0}")]
    AlreadyExists(String),

    #[error("No {kind} named '{name}'")]
    NotFound { kind: MemberKind, name: String },

    #[error("Attribute '{0}' is not readable")]
    NotReadable(String),

    #[error("Attribute '{0}' is not writable")]
    NotWritable(String),

    #[error("Invocation of '{member}' failed: {source}")]
    InvocationFailure {
        member: String,
        #[source]
        source: BoxError,
    },

    #[error("Operation '{name}' is ambiguous between {candidates} overloads")]
    AmbiguousOperation { name: String, candidates: usize },

    #[error("Malformed object name '{name}': {reason}")]
    MalformedObjectName { name: String, reason: String },
}

impl ManagementError {
    pub(crate) fn not_found(kind: MemberKind, name: impl Into<String>) -> Self {
        ManagementError::NotFound { kind, name: name.into() }
    }

    pub(crate) fn invocation(member: impl Into<String>, source: BoxError) -> Self {
        ManagementError::InvocationFailure { member: member.into(), source }
    }

    /// True for the errors that can only come out of descriptor construction
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            ManagementError::AnnotationMismatch { .. } | ManagementError::AnnotationConflict(_)
        )
    }
}

/// Error raised by a bound invoker itself, before the wrapped method runs
#[derive(Debug, Error)]
pub enum InvokerError {
    #[error("expected {expected} argument(s), got {actual}")]
    ArgumentCount { expected: usize, actual: usize },

    #[error("argument {index}: {source}")]
    ArgumentType {
        index: usize,
        #[source]
        source: TypeMismatch,
    },

    #[error("method panicked: {0}")]
    Panicked(String),
}

/// A dynamic value that does not have the shape its declared type requires
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, found {found}")]
pub struct TypeMismatch {
    pub expected: ValueType,
    pub found: &'static str,
}

impl TypeMismatch {
    pub fn new(expected: ValueType, value: &Value) -> Self {
        let found = match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(n) if n.is_f64() => "floating point number",
            Value::Number(n) if n.is_u64() => "unsigned integer",
            Value::Number(_) => "integer",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        };
        Self { expected, found }
    }
}
