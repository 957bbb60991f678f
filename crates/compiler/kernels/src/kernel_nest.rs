//! # Kernel Nest Builder
//!
//! Turns the nesting stack around a set of bindings into the [`KernelNest`] of
//! the kernel that will compute them, and rewrites the target stack so that the
//! program left behind still produces everything the kernel does not.
//!
//! Levels are processed innermost first. At each level:
//!
//! 1. parameters the inner levels do not read are dropped;
//! 2. names the kernel reads that are let-bound at this level (or produced by
//!    the level below) are *captured*: the level's target is extended to return
//!    them as arrays, and the kernel reads those arrays as extra inputs;
//! 3. parameters whose values the kernel does not consume lose their
//!    uniqueness;
//! 4. the level is rejected if any parameter or output type has a dimension
//!    bound inside the nest, since such an array would be irregular.
//!
//! The free and consumed name sets are then threaded out to the next level.

use lumen_compiler_ir::{
    LocalScope, NameSource, Names, Param, PatElem, Pattern, SubExp, Type, TypeEnv, VName,
};

use crate::distribution_body::DistributionBody;
use crate::error::{DistributeError, DistributeResult};
use crate::nesting::{KernelNest, LoopNesting, NestingStack};
use crate::target::{Target, Targets};

/// Builds the kernel nest for the bindings summarized by `body`.
///
/// Returns `Ok(None)` if some level would produce an irregular array. The
/// nesting stack and the target stack must have the same depth.
pub fn create_kernel_nest<E: TypeEnv + ?Sized>(
    names: &mut NameSource,
    env: &E,
    nesting: &NestingStack,
    body: &DistributionBody,
) -> DistributeResult<Option<(Targets, KernelNest)>> {
    let depth = nesting.depth();
    if depth != body.targets.depth() {
        return Err(DistributeError::DepthMismatch {
            nestings: depth,
            targets: body.targets.depth(),
        });
    }

    let bound_in_nest = nesting.bound_in_nest();
    let mut scope = LocalScope::new(env);
    let mut free: Names = body.free.intersection(&bound_in_nest).cloned().collect();
    let mut consumed: Names = body
        .consumed
        .intersection(&bound_in_nest)
        .cloned()
        .collect();

    let levels: Vec<_> = nesting.iter_outer_first().collect();
    let old_targets = body.targets.clone().into_outer_first();

    // Both built innermost first.
    let mut built: Vec<LoopNesting> = Vec::with_capacity(depth);
    let mut new_targets: Vec<Target> = Vec::with_capacity(depth);

    for k in (0..depth).rev() {
        let nesting_level = levels[k];
        let innermost = k + 1 == depth;

        let (pattern, mut target) = match built.last() {
            None => (
                old_targets[k].pattern.clone(),
                Target {
                    pattern: Pattern::default(),
                    result: Vec::new(),
                },
            ),
            Some(inner) => {
                let split = split_target(
                    names,
                    &mut scope,
                    &old_targets[k],
                    &inner.pattern,
                    &nesting_level.loop_nesting.width,
                );
                for level in &mut built {
                    level.pattern = permute(&level.pattern, &split.order);
                }
                (split.pattern, split.remaining)
            }
        };

        // Names produced by the level just inside this one are bound in this level's body.
        let produced_below: Names = new_targets
            .last()
            .map(|t| t.pattern.names().cloned().collect())
            .unwrap_or_default();

        let mut nest = nesting_level.loop_nesting.clone().remove_unused(&free);
        let own = nest.bound_names();
        let mut needed = nest.free_names();
        needed.extend(free.iter().filter(|n| !own.contains(*n)).cloned());

        let required: Vec<VName> = needed
            .into_iter()
            .filter(|n| nesting_level.let_bound.contains(n) || produced_below.contains(n))
            .collect();

        for name in required {
            let ty = scope
                .lookup_type(&name)
                .ok_or_else(|| DistributeError::UnboundName { name: name.clone() })?;
            let carrier = if innermost {
                body.identity_map.carrier(&name)
            } else {
                None
            };
            let param = Param::new(name.clone(), ty.clone());
            match carrier {
                Some(carrier) => nest.params_and_arrays.push((param, carrier.name.clone())),
                None => {
                    let arr = names.new_name_suffixed(&name, "_r");
                    let arr_ty = Type::array_of_row(&ty, nest.width.clone());
                    scope.insert(arr.clone(), arr_ty.clone());
                    target.pattern.elems.push(PatElem::new(arr.clone(), arr_ty));
                    target.result.push(SubExp::Var(name));
                    nest.params_and_arrays.push((param, arr));
                }
            }
        }

        for (param, _) in &mut nest.params_and_arrays {
            if !consumed.contains(&param.name) {
                *param = param.nonunique();
            }
        }

        let irregular = nest
            .params()
            .map(|p| (&p.name, &p.ty))
            .chain(pattern.elems.iter().map(|pe| (&pe.name, &pe.ty)))
            .find(|(_, ty)| !ty.free_in_dims().is_disjoint(&bound_in_nest));
        if let Some((name, ty)) = irregular {
            tracing::trace!(
                "Not distributing at nesting level {}: {} would have irregular type {}",
                k,
                name,
                ty
            );
            return Ok(None);
        }

        nest.pattern = pattern;

        let own = nest.bound_names();
        let mut next_free = nest.free_names();
        next_free.extend(free.iter().filter(|n| !own.contains(*n)).cloned());
        let mut next_consumed: Names = consumed
            .iter()
            .filter(|n| !own.contains(*n))
            .cloned()
            .collect();
        next_consumed.extend(nest.consumed_names());
        free = next_free;
        consumed = next_consumed;

        if innermost {
            target = body.expand_target(target);
        }
        built.push(nest);
        new_targets.push(target);
    }

    built.reverse();
    new_targets.reverse();
    let kernel_nest = KernelNest::from_levels(built).ok_or(DistributeError::EmptyNestingStack)?;
    let targets = Targets::from_outer_first(new_targets).ok_or(DistributeError::EmptyNestingStack)?;
    Ok(Some((targets, kernel_nest)))
}

/// A level's target divided between the kernel and the program left behind
struct SplitTarget {
    /// The arrays the kernel binds at this level, positionally matching the inner pattern after `order`
    pattern: Pattern,
    /// Target entries the kernel does not produce
    remaining: Target,
    /// Inner pattern positions in their new order
    order: Vec<usize>,
}

/// Matches a level's target against the kernel pattern of the level inside it.
///
/// Target entries returning an inner pattern name are taken over by the kernel,
/// in target order. Inner names the level never returned get fresh arrays and
/// sort last.
fn split_target<E: TypeEnv + ?Sized>(
    names: &mut NameSource,
    scope: &mut LocalScope<'_, E>,
    target: &Target,
    inner: &Pattern,
    width: &SubExp,
) -> SplitTarget {
    let mut order = Vec::with_capacity(inner.len());
    let mut elems = Vec::with_capacity(inner.len());
    let mut remaining = Target {
        pattern: Pattern::default(),
        result: Vec::new(),
    };

    for (pe, res) in target.pattern.elems.iter().zip(&target.result) {
        let pos = res
            .as_var()
            .and_then(|v| inner.position(v))
            .filter(|pos| !order.contains(pos));
        match pos {
            Some(pos) => {
                order.push(pos);
                elems.push(pe.clone());
            }
            None => {
                remaining.pattern.elems.push(pe.clone());
                remaining.result.push(res.clone());
            }
        }
    }

    for (pos, pe) in inner.elems.iter().enumerate() {
        if order.contains(&pos) {
            continue;
        }
        let arr = names.new_name_suffixed(&pe.name, "_r");
        let ty = Type::array_of_row(&pe.ty, width.clone());
        scope.insert(arr.clone(), ty.clone());
        elems.push(PatElem::new(arr, ty));
        order.push(pos);
    }

    SplitTarget {
        pattern: Pattern::new(elems),
        remaining,
        order,
    }
}

fn permute(pattern: &Pattern, order: &[usize]) -> Pattern {
    order
        .iter()
        .filter_map(|&pos| pattern.elems.get(pos).cloned())
        .collect()
}
