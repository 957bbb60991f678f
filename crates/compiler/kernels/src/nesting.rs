//! # Nesting Stack and Kernel Nests
//!
//! A [`LoopNesting`] describes one level of a nest of parallel maps: its
//! width, iteration index and the arrays its parameters are drawn from.
//!
//! Two stacks of loop nestings appear during extraction:
//!
//! - the [`NestingStack`] is the *source*: the maps enclosing the binding
//!   being distributed, together with the names let-bound in each map body;
//! - the [`KernelNest`] is the *result*: the levels of the kernel being built,
//!   stripped of unused inputs and extended with captured ones.

use lumen_compiler_ir::{
    Certificates, Names, Param, Pattern, PrettyPrint, SubExp, VName,
};

/// One level of parallel structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopNesting {
    /// The arrays this level produces
    pub pattern: Pattern,
    pub cs: Certificates,
    pub width: SubExp,
    pub index: VName,
    /// Per-iteration parameters and the arrays they are rows of
    pub params_and_arrays: Vec<(Param, VName)>,
}

impl LoopNesting {
    pub fn params(&self) -> impl Iterator<Item = &Param> {
        self.params_and_arrays.iter().map(|(p, _)| p)
    }

    pub fn arrays(&self) -> impl Iterator<Item = &VName> {
        self.params_and_arrays.iter().map(|(_, a)| a)
    }

    /// The index and parameter names
    pub fn bound_names(&self) -> Names {
        let mut names: Names = self.params().map(|p| p.name.clone()).collect();
        names.insert(self.index.clone());
        names
    }

    /// Names referenced by the width, certificates, parameter types and
    /// arrays, except the level's own index and parameters
    pub fn free_names(&self) -> Names {
        let mut names = Names::new();
        self.width.collect_free(&mut names);
        self.cs.collect_free(&mut names);
        for (param, array) in &self.params_and_arrays {
            names.extend(param.ty.free_in_dims());
            names.insert(array.clone());
        }
        for bound in self.bound_names() {
            names.remove(&bound);
        }
        names
    }

    /// Arrays bound to a parameter with in-place-update type
    pub fn consumed_names(&self) -> Names {
        self.params_and_arrays
            .iter()
            .filter(|(p, _)| p.ty.is_unique())
            .map(|(_, a)| a.clone())
            .collect()
    }

    /// Drops every parameter not in `used`
    pub fn remove_unused(mut self, used: &Names) -> Self {
        self.params_and_arrays.retain(|(p, _)| used.contains(&p.name));
        self
    }
}

impl PrettyPrint for LoopNesting {
    fn pretty_print(&self, indent: usize) -> String {
        let pairs: Vec<String> = self
            .params_and_arrays
            .iter()
            .map(|(p, a)| format!("{}: {} <- {}", p.name, p.ty, a))
            .collect();
        format!(
            "{}{} = {}map {} < {} ({})",
            "  ".repeat(indent),
            self.pattern,
            self.cs,
            self.index,
            self.width,
            pairs.join(", ")
        )
    }
}

/// A loop nesting plus the names let-bound inside its body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nesting {
    pub let_bound: Names,
    pub loop_nesting: LoopNesting,
}

impl Nesting {
    pub const fn new(let_bound: Names, loop_nesting: LoopNesting) -> Self {
        Self {
            let_bound,
            loop_nesting,
        }
    }

    /// Everything bound at this level: let-bound names, index and parameters
    pub fn bound_names(&self) -> Names {
        let mut names = self.let_bound.clone();
        names.extend(self.loop_nesting.bound_names());
        names
    }
}

/// The maps enclosing a binding, outermost first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestingStack {
    levels: Vec<Nesting>,
}

impl NestingStack {
    pub fn single(nesting: Nesting) -> Self {
        Self {
            levels: vec![nesting],
        }
    }

    /// Builds a stack from levels ordered outermost first
    pub fn from_outer_first(levels: Vec<Nesting>) -> Option<Self> {
        if levels.is_empty() {
            None
        } else {
            Some(Self { levels })
        }
    }

    /// Enters a new innermost level
    pub fn push_inner(&mut self, nesting: Nesting) {
        self.levels.push(nesting);
    }

    /// Records names as let-bound in the innermost level
    pub fn let_bind_in_inner(&mut self, names: impl IntoIterator<Item = VName>) {
        if let Some(inner) = self.levels.last_mut() {
            inner.let_bound.extend(names);
        }
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn iter_outer_first(&self) -> impl DoubleEndedIterator<Item = &Nesting> {
        self.levels.iter()
    }

    pub fn iter_inner_first(&self) -> impl Iterator<Item = &Nesting> {
        self.levels.iter().rev()
    }

    pub fn innermost(&self) -> &Nesting {
        &self.levels[self.levels.len() - 1]
    }

    /// Every name bound anywhere in the nest
    pub fn bound_in_nest(&self) -> Names {
        self.levels.iter().flat_map(Nesting::bound_names).collect()
    }
}

/// The levels of a kernel under construction, outermost first. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelNest {
    outer: LoopNesting,
    inner: Vec<LoopNesting>,
}

impl KernelNest {
    pub const fn single(level: LoopNesting) -> Self {
        Self {
            outer: level,
            inner: Vec::new(),
        }
    }

    pub const fn new(outer: LoopNesting, inner: Vec<LoopNesting>) -> Self {
        Self { outer, inner }
    }

    /// Builds a nest from levels ordered outermost first
    pub fn from_levels(mut levels: Vec<LoopNesting>) -> Option<Self> {
        if levels.is_empty() {
            return None;
        }
        let outer = levels.remove(0);
        Some(Self {
            outer,
            inner: levels,
        })
    }

    /// Adds a new outermost level
    pub fn push_outer(&mut self, level: LoopNesting) {
        let old = std::mem::replace(&mut self.outer, level);
        self.inner.insert(0, old);
    }

    pub const fn outermost(&self) -> &LoopNesting {
        &self.outer
    }

    pub fn innermost(&self) -> &LoopNesting {
        self.inner.last().unwrap_or(&self.outer)
    }

    pub fn levels(&self) -> impl DoubleEndedIterator<Item = &LoopNesting> {
        std::iter::once(&self.outer).chain(self.inner.iter())
    }

    pub fn into_levels(self) -> Vec<LoopNesting> {
        let mut levels = Vec::with_capacity(self.inner.len() + 1);
        levels.push(self.outer);
        levels.extend(self.inner);
        levels
    }

    pub fn depth(&self) -> usize {
        self.inner.len() + 1
    }

    /// Per-level widths, outermost first
    pub fn widths(&self) -> Vec<SubExp> {
        self.levels().map(|l| l.width.clone()).collect()
    }

    /// Indices and parameters of every level
    pub fn bound_names(&self) -> Names {
        self.levels().flat_map(LoopNesting::bound_names).collect()
    }
}

impl PrettyPrint for KernelNest {
    fn pretty_print(&self, indent: usize) -> String {
        self.levels()
            .enumerate()
            .map(|(depth, level)| level.pretty_print(indent + depth))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
