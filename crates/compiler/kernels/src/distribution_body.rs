//! # Distribution Body
//!
//! The per-attempt summary of the bindings being pulled out of a nest:
//! which names they read, which they consume, and which of the innermost
//! target's results are mere pass-throughs.
//!
//! A result `v` is an *identity* when `v` is not bound by the distributed
//! bindings. Such a value is already available; the kernel does not need to
//! compute it, so it is removed from the innermost target and remembered in
//! the identity map together with the array that carries it.

use lumen_compiler_ir::free::{bound_by_stms, consumed_in_stms, free_in_stms};
use lumen_compiler_ir::{Names, PatElem, Pattern, Stm, SubExp, VName};

use crate::target::{Target, Targets};

/// Results of the innermost target that pass a value through unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityMap {
    /// `(carrier, passed)`: the pattern element that received the value and the name passed
    entries: Vec<(PatElem, VName)>,
}

impl IdentityMap {
    /// The array that carries `name` across the innermost level, if `name` is an identity result
    pub fn carrier(&self, name: &VName) -> Option<&PatElem> {
        self.entries
            .iter()
            .find(|(_, passed)| passed == name)
            .map(|(carrier, _)| carrier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PatElem, &VName)> {
        self.entries.iter().map(|(c, v)| (c, v))
    }
}

/// What a distribution attempt knows about the bindings it is moving
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionBody {
    /// The target stack with identity results removed from the innermost target
    pub targets: Targets,
    /// Names the bindings read but do not bind
    pub free: Names,
    /// Names the bindings consume
    pub consumed: Names,
    pub identity_map: IdentityMap,
}

impl DistributionBody {
    /// Summarizes `stms` against the current target stack
    pub fn from_stms(targets: &Targets, stms: &[Stm]) -> Self {
        let bound = bound_by_stms(stms);
        let inner = targets.inner_target();

        let mut kept_pattern = Vec::new();
        let mut kept_result = Vec::new();
        let mut identities = Vec::new();
        for (pe, res) in inner.pattern.elems.iter().zip(&inner.result) {
            match res {
                SubExp::Var(v) if !bound.contains(v) => identities.push((pe.clone(), v.clone())),
                _ => {
                    kept_pattern.push(pe.clone());
                    kept_result.push(res.clone());
                }
            }
        }

        let mut stripped = targets.clone();
        *stripped.inner_target_mut() = Target {
            pattern: Pattern::new(kept_pattern),
            result: kept_result,
        };

        let mut free = free_in_stms(stms);
        for name in &bound {
            free.remove(name);
        }

        Self {
            targets: stripped,
            free,
            consumed: consumed_in_stms(stms),
            identity_map: IdentityMap {
                entries: identities,
            },
        }
    }

    pub fn from_stm(targets: &Targets, stm: &Stm) -> Self {
        Self::from_stms(targets, std::slice::from_ref(stm))
    }

    /// The innermost target with its identity results removed
    pub const fn inner_target(&self) -> &Target {
        self.targets.inner_target()
    }

    /// Appends the identity results back onto `target`
    pub fn expand_target(&self, mut target: Target) -> Target {
        for (carrier, passed) in &self.identity_map.entries {
            target.pattern.elems.push(carrier.clone());
            target.result.push(SubExp::var(passed));
        }
        target
    }
}
