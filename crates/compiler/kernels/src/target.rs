//! # Target Stack
//!
//! While a binding is distributed out of a nest of maps, every enclosing level
//! still has to produce its original outputs. A [`Target`] records, for one
//! level, the arrays that level binds (its pattern) and the values its body
//! returns into them (its result). [`Targets`] stacks one target per nesting
//! level, innermost on top.

use lumen_compiler_ir::{Names, Pattern, PrettyPrint, SubExp};

use crate::error::{DistributeError, DistributeResult};

/// The pattern bound by one nesting level and the result its body returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub pattern: Pattern,
    pub result: Vec<SubExp>,
}

impl Target {
    pub fn new(pattern: Pattern, result: Vec<SubExp>) -> DistributeResult<Self> {
        if pattern.len() != result.len() {
            return Err(DistributeError::ArityMismatch {
                what: "target",
                pattern: pattern.len(),
                result: result.len(),
            });
        }
        Ok(Self { pattern, result })
    }

    /// Appends pattern elements and their results
    pub fn extend(&mut self, other: Self) {
        self.pattern.extend(other.pattern);
        self.result.extend(other.result);
    }
}

/// One target per nesting level
///
/// `outer` is ordered outermost first; its last element is the immediate
/// parent of `inner`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Targets {
    inner: Target,
    outer: Vec<Target>,
}

impl Targets {
    /// A stack of depth one
    pub const fn single(target: Target) -> Self {
        Self {
            inner: target,
            outer: Vec::new(),
        }
    }

    /// Builds a stack from targets ordered outermost first
    pub fn from_outer_first(mut targets: Vec<Target>) -> Option<Self> {
        let inner = targets.pop()?;
        Some(Self {
            inner,
            outer: targets,
        })
    }

    /// Pushes a new innermost target; the old one becomes its parent
    pub fn push_inner(&mut self, target: Target) {
        let old = std::mem::replace(&mut self.inner, target);
        self.outer.push(old);
    }

    /// Pushes a new outermost target
    pub fn push_outer(&mut self, target: Target) {
        self.outer.insert(0, target);
    }

    /// Pops the innermost target; `None` if it is the only one
    pub fn pop_inner(&mut self) -> Option<Target> {
        let parent = self.outer.pop()?;
        Some(std::mem::replace(&mut self.inner, parent))
    }

    pub const fn inner_target(&self) -> &Target {
        &self.inner
    }

    pub fn inner_target_mut(&mut self) -> &mut Target {
        &mut self.inner
    }

    /// The outermost target
    pub fn outer_target(&self) -> &Target {
        self.outer.first().unwrap_or(&self.inner)
    }

    pub fn depth(&self) -> usize {
        self.outer.len() + 1
    }

    /// Iterates over the targets, outermost first
    pub fn iter_outer_first(&self) -> impl DoubleEndedIterator<Item = &Target> {
        self.outer.iter().chain(std::iter::once(&self.inner))
    }

    /// Consumes the stack, returning targets outermost first
    pub fn into_outer_first(self) -> Vec<Target> {
        let mut targets = self.outer;
        targets.push(self.inner);
        targets
    }

    /// Every name bound by some target's pattern
    pub fn bound_names(&self) -> Names {
        self.iter_outer_first()
            .flat_map(|t| t.pattern.names().cloned())
            .collect()
    }
}

impl PrettyPrint for Targets {
    fn pretty_print(&self, indent: usize) -> String {
        self.iter_outer_first()
            .enumerate()
            .map(|(depth, t)| {
                let res: Vec<String> = t.result.iter().map(ToString::to_string).collect();
                format!(
                    "{}{depth}: {} <- {{{}}}",
                    "  ".repeat(indent),
                    t.pattern,
                    res.join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_compiler_ir::testing::{i32_array, TestNames};

    fn target(t: &mut TestNames, base: &str) -> Target {
        let pat = t.name(base);
        let res = t.name("r");
        Target::new(
            Pattern::single(pat, i32_array([SubExp::i32(2)])),
            vec![SubExp::var(&res)],
        )
        .unwrap()
    }

    #[test]
    fn test_push_and_pop_inner() {
        let mut t = TestNames::new();
        let a = target(&mut t, "a");
        let b = target(&mut t, "b");
        let c = target(&mut t, "c");

        let mut targets = Targets::single(a.clone());
        targets.push_inner(b.clone());
        targets.push_inner(c.clone());
        assert_eq!(targets.depth(), 3);
        assert_eq!(targets.inner_target(), &c);
        assert_eq!(targets.outer_target(), &a);

        assert_eq!(targets.pop_inner(), Some(c));
        assert_eq!(targets.inner_target(), &b);
        assert_eq!(targets.pop_inner(), Some(b));
        assert_eq!(targets.pop_inner(), None);
        assert_eq!(targets.depth(), 1);
    }

    #[test]
    fn test_push_outer_goes_to_bottom() {
        let mut t = TestNames::new();
        let a = target(&mut t, "a");
        let b = target(&mut t, "b");
        let mut targets = Targets::single(a.clone());
        targets.push_outer(b.clone());
        let order: Vec<_> = targets.into_outer_first();
        assert_eq!(order, vec![b, a]);
    }

    #[test]
    fn test_arity_mismatch_is_an_error() {
        let mut t = TestNames::new();
        let a = t.name("a");
        let err = Target::new(Pattern::single(a, i32_array([SubExp::i32(2)])), vec![]).unwrap_err();
        assert!(matches!(err, DistributeError::ArityMismatch { .. }));
    }
}
