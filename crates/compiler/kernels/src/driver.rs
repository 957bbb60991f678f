//! # Distribution Driver
//!
//! Entry points for the enclosing optimization pass. Each attempt either
//! succeeds, returning the rewritten target stack and the statements to emit,
//! or returns `None` so the caller can fall back to interchanging a loop or
//! leaving the bindings where they are.

use lumen_compiler_ir::rename::rename_stm;
use lumen_compiler_ir::{Body, NameSource, PrettyPrint, Stm, SubExp, TypeEnv};

use crate::config::DistributionConfig;
use crate::construct::construct_kernel;
use crate::distribution_body::DistributionBody;
use crate::error::DistributeResult;
use crate::interchange::{interchange_loops, SeqLoop};
use crate::kernel_nest::create_kernel_nest;
use crate::nesting::{KernelNest, NestingStack};
use crate::optimize::optimize_kernel;
use crate::target::Targets;

/// Distributes `stms` out of `nesting` into a kernel.
///
/// An empty `stms` trivially succeeds and leaves `targets` unchanged. On
/// success the emitted statements are the width computations followed by the
/// kernel (or the layout operation it was reduced to).
pub fn try_distribute<E: TypeEnv + ?Sized>(
    names: &mut NameSource,
    env: &E,
    config: &DistributionConfig,
    nesting: &NestingStack,
    targets: &Targets,
    stms: &[Stm],
) -> DistributeResult<Option<(Targets, Vec<Stm>)>> {
    if stms.is_empty() {
        return Ok(Some((targets.clone(), Vec::new())));
    }

    let dist_body = DistributionBody::from_stms(targets, stms);
    let Some((new_targets, nest)) = create_kernel_nest(names, env, nesting, &dist_body)? else {
        return Ok(None);
    };

    let result = innermost_result(&dist_body, &nest);
    let (mut emitted, kernel) = construct_kernel(names, &nest, Body::new(stms.to_vec(), result))?;
    let kernel = if config.rename_kernels {
        rename_stm(&kernel, names)
    } else {
        kernel
    };
    let kernel = if config.optimize_kernels {
        optimize_kernel(kernel)
    } else {
        kernel
    };

    if config.trace_distribution {
        tracing::debug!(
            "distributed\n{}\nas\n{}\ndue to targets\n{}\nand new targets\n{}",
            pretty_stms(stms),
            kernel.pretty_print(1),
            targets.pretty_print(1),
            new_targets.pretty_print(1)
        );
    } else {
        tracing::debug!(
            "Distributed {} bindings into a kernel nest of depth {}",
            stms.len(),
            nest.depth()
        );
    }

    emitted.push(kernel);
    Ok(Some((new_targets, emitted)))
}

/// Builds the kernel nest for a single binding without constructing the kernel.
///
/// Also returns the values the binding contributes to the innermost target,
/// ordered to match the innermost level's pattern.
pub fn try_distribute_binding<E: TypeEnv + ?Sized>(
    names: &mut NameSource,
    env: &E,
    nesting: &NestingStack,
    targets: &Targets,
    stm: &Stm,
) -> DistributeResult<Option<(Vec<SubExp>, Targets, KernelNest)>> {
    let dist_body = DistributionBody::from_stm(targets, stm);
    let Some((new_targets, nest)) = create_kernel_nest(names, env, nesting, &dist_body)? else {
        return Ok(None);
    };
    let result = innermost_result(&dist_body, &nest);
    Ok(Some((result, new_targets, nest)))
}

/// Moves the loop bound by `stm` outside `nesting`.
///
/// `None` if `stm` is not a loop, or if the loop can be neither distributed
/// nor interchanged.
pub fn try_interchange<E: TypeEnv + ?Sized>(
    names: &mut NameSource,
    env: &E,
    config: &DistributionConfig,
    nesting: &NestingStack,
    targets: &Targets,
    stm: &Stm,
) -> DistributeResult<Option<(Targets, Vec<Stm>)>> {
    let Some(seq_loop) = SeqLoop::from_stm(stm.clone()) else {
        return Ok(None);
    };
    let Some((result, new_targets, nest)) = try_distribute_binding(names, env, nesting, targets, stm)?
    else {
        return Ok(None);
    };
    let Some(seq_loop) = seq_loop.aligned_with(&result) else {
        return Ok(None);
    };
    Ok(interchange_loops(names, env, config, &nest, seq_loop)?.map(|stms| (new_targets, stms)))
}

/// The innermost target's results in the order of the innermost kernel level's pattern
fn innermost_result(dist_body: &DistributionBody, nest: &KernelNest) -> Vec<SubExp> {
    let target = dist_body.inner_target();
    nest.innermost()
        .pattern
        .names()
        .filter_map(|name| target.pattern.position(name))
        .map(|pos| target.result[pos].clone())
        .collect()
}

fn pretty_stms(stms: &[Stm]) -> String {
    stms.iter()
        .map(|stm| stm.pretty_print(1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The external collaborators of a distribution pass bundled with its configuration
pub struct Distributor<'a, E: TypeEnv + ?Sized> {
    names: &'a mut NameSource,
    env: &'a E,
    config: DistributionConfig,
}

impl<'a, E: TypeEnv + ?Sized> Distributor<'a, E> {
    pub fn new(names: &'a mut NameSource, env: &'a E) -> Self {
        Self {
            names,
            env,
            config: DistributionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DistributionConfig) -> Self {
        self.config = config;
        self
    }

    pub const fn config(&self) -> &DistributionConfig {
        &self.config
    }

    pub fn try_distribute(
        &mut self,
        nesting: &NestingStack,
        targets: &Targets,
        stms: &[Stm],
    ) -> DistributeResult<Option<(Targets, Vec<Stm>)>> {
        try_distribute(self.names, self.env, &self.config, nesting, targets, stms)
    }

    pub fn try_distribute_binding(
        &mut self,
        nesting: &NestingStack,
        targets: &Targets,
        stm: &Stm,
    ) -> DistributeResult<Option<(Vec<SubExp>, Targets, KernelNest)>> {
        try_distribute_binding(self.names, self.env, nesting, targets, stm)
    }

    pub fn try_interchange(
        &mut self,
        nesting: &NestingStack,
        targets: &Targets,
        stm: &Stm,
    ) -> DistributeResult<Option<(Targets, Vec<Stm>)>> {
        try_interchange(self.names, self.env, &self.config, nesting, targets, stm)
    }

    pub fn create_kernel_nest(
        &mut self,
        nesting: &NestingStack,
        body: &DistributionBody,
    ) -> DistributeResult<Option<(Targets, KernelNest)>> {
        create_kernel_nest(self.names, self.env, nesting, body)
    }

    pub fn construct_kernel(
        &mut self,
        nest: &KernelNest,
        body: Body,
    ) -> DistributeResult<(Vec<Stm>, Stm)> {
        construct_kernel(self.names, nest, body)
    }

    pub fn interchange_loops(
        &mut self,
        nest: &KernelNest,
        seq_loop: SeqLoop,
    ) -> DistributeResult<Option<Vec<Stm>>> {
        interchange_loops(self.names, self.env, &self.config, nest, seq_loop)
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
