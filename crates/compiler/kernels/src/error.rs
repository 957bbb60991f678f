//! Errors raised by kernel extraction.
//!
//! Only internal-consistency failures are errors. A binding that cannot be
//! distributed is reported as `Ok(None)` by the operation that tried.

use lumen_compiler_ir::VName;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DistributeError {
    #[error("Nesting stack has depth {nestings} but target stack has depth {targets}")]
    DepthMismatch { nestings: usize, targets: usize },

    #[error("Name {name} is not bound in the type environment")]
    UnboundName { name: VName },

    #[error("Cannot build a kernel nest over zero nesting levels")]
    EmptyNestingStack,

    #[error("{what}: pattern has {pattern} elements but result has {result} values")]
    ArityMismatch {
        what: &'static str,
        pattern: usize,
        result: usize,
    },

    #[error("Invalid distribution configuration: {0}")]
    Config(String),
}

/// Result type for kernel extraction operations
pub type DistributeResult<T> = Result<T, DistributeError>;
