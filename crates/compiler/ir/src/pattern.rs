//! # Patterns and Parameters
//!
//! A [`Pattern`] lists the names a binding produces, together with their
//! types. Patterns are never edited in place; rewriting a binding builds a new
//! pattern.

use crate::{SubExp, Type, Uniqueness, VName};

/// A typed name bound as a lambda, loop or kernel parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: VName,
    pub ty: Type,
}

impl Param {
    pub const fn new(name: VName, ty: Type) -> Self {
        Self { name, ty }
    }

    /// Returns the same parameter with its type marked read-only
    pub fn nonunique(&self) -> Self {
        Self {
            name: self.name.clone(),
            ty: self.ty.with_uniqueness(Uniqueness::Nonunique),
        }
    }
}

/// One typed name produced by a binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatElem {
    pub name: VName,
    pub ty: Type,
}

impl PatElem {
    pub const fn new(name: VName, ty: Type) -> Self {
        Self { name, ty }
    }
}

impl From<Param> for PatElem {
    fn from(param: Param) -> Self {
        Self {
            name: param.name,
            ty: param.ty,
        }
    }
}

impl From<PatElem> for Param {
    fn from(pe: PatElem) -> Self {
        Self {
            name: pe.name,
            ty: pe.ty,
        }
    }
}

/// The ordered names produced by a binding. Names are unique within a pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern {
    pub elems: Vec<PatElem>,
}

impl Pattern {
    pub const fn new(elems: Vec<PatElem>) -> Self {
        Self { elems }
    }

    /// Builds a pattern binding a single name
    pub fn single(name: VName, ty: Type) -> Self {
        Self {
            elems: vec![PatElem::new(name, ty)],
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &VName> {
        self.elems.iter().map(|pe| &pe.name)
    }

    pub fn types(&self) -> impl Iterator<Item = &Type> {
        self.elems.iter().map(|pe| &pe.ty)
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Position of `name` in this pattern
    pub fn position(&self, name: &VName) -> Option<usize> {
        self.elems.iter().position(|pe| &pe.name == name)
    }

    /// The result that returns exactly the names of this pattern
    pub fn identity_result(&self) -> Vec<SubExp> {
        self.names().map(SubExp::var).collect()
    }

    /// Appends the elements of `other`
    pub fn extend(&mut self, other: impl IntoIterator<Item = PatElem>) {
        self.elems.extend(other);
    }
}

impl FromIterator<PatElem> for Pattern {
    fn from_iter<T: IntoIterator<Item = PatElem>>(iter: T) -> Self {
        Self {
            elems: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Pattern {
    type Item = PatElem;
    type IntoIter = std::vec::IntoIter<PatElem>;

    fn into_iter(self) -> Self::IntoIter {
        self.elems.into_iter()
    }
}

impl<'a> IntoIterator for &'a Pattern {
    type Item = &'a PatElem;
    type IntoIter = std::slice::Iter<'a, PatElem>;

    fn into_iter(self) -> Self::IntoIter {
        self.elems.iter()
    }
}
