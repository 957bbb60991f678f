//! # Loop Interchange
//!
//! A sequential loop inside a nest of maps cannot itself become a kernel.
//! Interchange moves the loop outside the maps instead:
//!
//! ```text
//! map i < w (x <- xs):                 loop (acc' = replicate(w, init)) for j < n:
//!   loop (acc = init) for j < n:   =>    map i < w (x <- xs, acc <- acc'):
//!     body                                 body
//! ```
//!
//! Every loop-carried value gains a leading dimension of the map's width, and
//! the map runs once per loop iteration. Arrays the body updates in place are
//! copied before each map so an iteration never writes into data visible
//! outside itself.

use lumen_compiler_ir::free::free_in_body;
use lumen_compiler_ir::{
    Body, Exp, Lambda, LocalScope, LoopForm, NameSource, Names, Param, PatElem, Pattern, Stm,
    SubExp, Type, TypeEnv, Uniqueness, VName,
};

use crate::config::DistributionConfig;
use crate::error::{DistributeError, DistributeResult};
use crate::nesting::{KernelNest, LoopNesting};

/// A sequential loop binding in a form convenient for interchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqLoop {
    pub pattern: Pattern,
    /// Merge parameters whose final values the pattern binds
    pub ret: Vec<VName>,
    pub merge: Vec<(Param, SubExp)>,
    pub form: LoopForm,
    pub body: Body,
}

impl SeqLoop {
    /// Views a loop statement as a `SeqLoop`; `None` for any other statement
    pub fn from_stm(stm: Stm) -> Option<Self> {
        match stm.exp {
            Exp::DoLoop {
                ret,
                merge,
                form,
                body,
            } => Some(Self {
                pattern: stm.pattern,
                ret,
                merge,
                form,
                body,
            }),
            _ => None,
        }
    }

    pub fn into_stm(self) -> Stm {
        Stm::new(
            self.pattern,
            Exp::DoLoop {
                ret: self.ret,
                merge: self.merge,
                form: self.form,
                body: self.body,
            },
        )
    }

    /// Reorders the pattern and returned values so the loop binds exactly the
    /// names of `result`, in that order.
    ///
    /// `None` if some entry of `result` is not bound by the loop.
    pub fn aligned_with(self, result: &[SubExp]) -> Option<Self> {
        let mut elems = Vec::with_capacity(result.len());
        let mut ret = Vec::with_capacity(result.len());
        for res in result {
            let pos = self.pattern.position(res.as_var()?)?;
            elems.push(self.pattern.elems[pos].clone());
            ret.push(self.ret.get(pos)?.clone());
        }
        Some(Self {
            pattern: Pattern::new(elems),
            ret,
            ..self
        })
    }

    /// Names the loop body reads, including those in merge parameter shapes
    fn body_free_names(&self) -> Names {
        let mut names = free_in_body(&self.body);
        for (param, _) in &self.merge {
            names.extend(param.ty.free_in_dims());
        }
        names
    }
}

/// Moves `seq_loop` outside every level of `nest`, innermost level first.
///
/// Returns the replicates of loop-carried initial values followed by the
/// interchanged loop, or `None` if the loop cannot be moved past some level.
pub fn interchange_loops<E: TypeEnv + ?Sized>(
    names: &mut NameSource,
    env: &E,
    config: &DistributionConfig,
    nest: &KernelNest,
    seq_loop: SeqLoop,
) -> DistributeResult<Option<Vec<Stm>>> {
    let mut scope = LocalScope::new(env);
    let mut stms = Vec::new();
    let mut current = seq_loop;
    for (depth, level) in nest.levels().collect::<Vec<_>>().into_iter().enumerate().rev() {
        let Some((prelude, next)) = interchange_loop(names, &mut scope, config, level, current)? else {
            return Ok(None);
        };
        tracing::debug!(
            "Interchanged loop with nesting level {} of width {} ({} replicates)",
            depth,
            level.width,
            prelude.len()
        );
        stms.extend(prelude);
        current = next;
    }
    stms.push(current.into_stm());
    Ok(Some(stms))
}

/// Moves `seq_loop` outside the single map `level`.
///
/// The result's pattern is the level's pattern. `None` if the loop is a
/// while-loop or its trip count depends on the level. Fails if a returned name
/// is not a merge parameter, or if the returned values do not line up with the
/// level's pattern.
pub fn interchange_loop<E: TypeEnv + ?Sized>(
    names: &mut NameSource,
    scope: &mut LocalScope<'_, E>,
    config: &DistributionConfig,
    level: &LoopNesting,
    seq_loop: SeqLoop,
) -> DistributeResult<Option<(Vec<Stm>, SeqLoop)>> {
    let level_bound = level.bound_names();
    match &seq_loop.form {
        LoopForm::For { bound, .. } => {
            if bound.as_var().is_some_and(|v| level_bound.contains(v)) {
                tracing::trace!("Loop bound {} is bound by the map; not interchanging", bound);
                return Ok(None);
            }
        }
        LoopForm::While { cond } => {
            tracing::trace!("Cannot interchange while-loop on {}", cond);
            return Ok(None);
        }
    }

    let free_in_loop = seq_loop.body_free_names();
    let mut prelude = Vec::new();

    // Expanded merge parameters and their initial values.
    let mut expanded_merge = Vec::with_capacity(seq_loop.merge.len());
    for (param, init) in &seq_loop.merge {
        let expanded_ty = Type::array_of_row(&param.ty, level.width.clone());
        let expanded = names.new_name_suffixed(&param.name, "_expanded");
        scope.insert(expanded.clone(), expanded_ty.clone());

        let from_level = init.as_var().and_then(|v| {
            level
                .params_and_arrays
                .iter()
                .find(|(p, _)| &p.name == v)
                .map(|(_, array)| array.clone())
        });
        let expanded_init = match from_level {
            Some(array) => SubExp::Var(array),
            None => {
                let replicated = names.new_name_suffixed(&param.name, "_expanded_init");
                let ty = expanded_ty.with_uniqueness(Uniqueness::Unique);
                scope.insert(replicated.clone(), ty.clone());
                prelude.push(Stm::replicate(
                    replicated.clone(),
                    ty,
                    level.width.clone(),
                    init.clone(),
                ));
                SubExp::Var(replicated)
            }
        };
        expanded_merge.push((Param::new(expanded, expanded_ty), expanded_init));
    }

    // Captured inputs still read by the loop, copied if the loop updates them.
    let mut copies = Vec::new();
    let mut map_inputs: Vec<(Param, VName)> = Vec::new();
    for (param, array) in &level.params_and_arrays {
        if !free_in_loop.contains(&param.name) {
            continue;
        }
        if param.ty.is_unique() && config.copy_consumed_inputs {
            let ty = Type::array_of_row(&param.ty, level.width.clone())
                .with_uniqueness(Uniqueness::Unique);
            let copy = names.new_name_suffixed(array, "_copy");
            scope.insert(copy.clone(), ty.clone());
            copies.push(Stm::copy(copy.clone(), ty, array.clone()));
            map_inputs.push((param.clone(), copy));
        } else {
            map_inputs.push((param.clone(), array.clone()));
        }
    }
    for ((param, _), (expanded, _)) in seq_loop.merge.iter().zip(&expanded_merge) {
        map_inputs.push((param.clone(), expanded.name.clone()));
    }

    let map_pattern: Pattern = expanded_merge
        .iter()
        .map(|(expanded, _)| {
            let name = names.new_name_suffixed(&expanded.name, "_res");
            PatElem::new(name, expanded.ty.clone())
        })
        .collect();
    let (params, arrays): (Vec<Param>, Vec<VName>) = map_inputs.into_iter().unzip();
    let map = Stm::new(
        map_pattern.clone(),
        Exp::Map {
            cs: level.cs.clone(),
            width: level.width.clone(),
            lambda: Lambda {
                index: level.index.clone(),
                params,
                body: seq_loop.body,
                return_types: seq_loop.merge.iter().map(|(p, _)| p.ty.clone()).collect(),
            },
            arrays,
        },
    );

    let ret = seq_loop
        .ret
        .iter()
        .map(|r| {
            seq_loop
                .merge
                .iter()
                .zip(&expanded_merge)
                .find(|((p, _), _)| &p.name == r)
                .map(|(_, (expanded, _))| expanded.name.clone())
                .ok_or_else(|| DistributeError::UnboundName { name: r.clone() })
        })
        .collect::<DistributeResult<Vec<_>>>()?;
    if ret.len() != level.pattern.len() {
        return Err(DistributeError::ArityMismatch {
            what: "interchanged loop",
            pattern: level.pattern.len(),
            result: ret.len(),
        });
    }

    let mut stms = copies;
    stms.push(map);
    let next = SeqLoop {
        pattern: level.pattern.clone(),
        ret,
        merge: expanded_merge,
        form: seq_loop.form,
        body: Body::new(stms, map_pattern.identity_result()),
    };
    Ok(Some((prelude, next)))
}

#[cfg(test)]
#[path = "interchange_tests.rs"]
mod tests;
