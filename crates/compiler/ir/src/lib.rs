//! # Lumen Intermediate Representation
//!
//! This crate defines the IR on which Lumen's parallelism passes operate: a
//! pure, array-oriented language in normalized binding form, where every
//! operation is bound to names before it is used.
//!
//! ## Architecture
//!
//! ```text
//! Body
//! stms: Vec<Stm>          one operation per statement
//! result: Vec<SubExp>
//!
//! Stm
//! pattern: Pattern        the names and types it binds
//! exp: Exp                BasicOp | Update | DoLoop | Map | Kernel
//! ```
//!
//! `Map`, `DoLoop` and `Kernel` carry nested bodies. A `Kernel` is the
//! flattened form of a nest of maps: one explicit iteration space, explicit
//! per-thread inputs, and a body run once per point of the space.
//!
//! ## Names
//!
//! Names are globally unique. New names come from a [`NameSource`] threaded
//! through each transformation by `&mut`; [`rename::rename_stm`] restores
//! uniqueness after a statement is duplicated or moved.

pub use name::{NameSource, Names, VName};
pub use pattern::{Param, PatElem, Pattern};
pub use scope::{LocalScope, Scope, TypeEnv};
pub use stm::{
    BasicOp, BinOp, Body, Exp, Indices, KernelExp, KernelInput, Lambda, LoopForm, Stm,
};
pub use types::{DimChange, Type, Uniqueness};
pub use value::{Certificates, PrimType, PrimValue, SubExp};

pub mod free;
pub mod name;
pub mod pattern;
pub mod pretty;
pub mod rename;
pub mod scope;
pub mod stm;
pub mod types;
pub mod value;

#[cfg(any(test, feature = "testing"))]
pub mod testing;


// --- Pretty Printing Support ---

/// Trait for pretty-printing IR constructs
pub trait PrettyPrint {
    fn pretty_print(&self, indent: usize) -> String;
}

/// Helper function to create indentation
pub(crate) fn indent_str(level: usize) -> String {
    "  ".repeat(level)
}
