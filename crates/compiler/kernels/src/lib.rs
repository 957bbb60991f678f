//! # Kernel Extraction
//!
//! This crate turns nests of parallel maps into flat kernels. Given a binding
//! somewhere inside a nest of maps, it decides whether the binding can be
//! pulled out into a kernel of its own, builds that kernel, and rewrites the
//! surrounding levels so the rest of the program still computes what it did.
//! When a sequential loop blocks extraction, the loop can instead be
//! interchanged outward past the maps.
//!
//! ## Pipeline
//!
//! ```text
//! stms ──► DistributionBody ──► create_kernel_nest ──► construct_kernel ──► optimize_kernel
//!                                      │ None
//!                                      ▼
//!                             caller falls back to interchange_loops
//! ```
//!
//! The enclosing pass keeps two stacks in lockstep while it walks the program:
//! a [`NestingStack`] of the maps it has entered and a [`Targets`] stack of
//! what each of those maps must still produce. Both must have the same depth
//! whenever a distribution is attempted.
//!
//! ## Failure
//!
//! An attempt that would create an irregular array returns `Ok(None)`. An
//! `Err` means the program or the stacks handed in were inconsistent.

pub use config::DistributionConfig;
pub use construct::construct_kernel;
pub use distribution_body::{DistributionBody, IdentityMap};
pub use driver::{try_distribute, try_distribute_binding, try_interchange, Distributor};
pub use error::{DistributeError, DistributeResult};
pub use interchange::{interchange_loop, interchange_loops, SeqLoop};
pub use kernel_nest::create_kernel_nest;
pub use nesting::{KernelNest, LoopNesting, Nesting, NestingStack};
pub use optimize::optimize_kernel;
pub use target::{Target, Targets};

pub mod config;
pub mod construct;
pub mod distribution_body;
pub mod driver;
pub mod error;
pub mod interchange;
pub mod kernel_nest;
pub mod nesting;
pub mod optimize;
pub mod target;
