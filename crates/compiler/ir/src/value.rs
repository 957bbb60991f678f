//! # IR Values
//!
//! This module defines the operands of IR operations: constants, variable
//! references and certificate sets.

use crate::{Names, VName};

/// Primitive scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimType {
    Bool,
    I32,
    I64,
    F32,
    F64,
    /// The type of certificates produced by runtime checks
    Cert,
}

/// Constant scalar values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimValue {
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    /// The certificate of a check that trivially holds
    Checked,
}

impl Eq for PrimValue {}

impl PrimValue {
    /// The type of this constant
    pub const fn prim_type(&self) -> PrimType {
        match self {
            Self::Bool(_) => PrimType::Bool,
            Self::I32(_) => PrimType::I32,
            Self::I64(_) => PrimType::I64,
            Self::F32(_) => PrimType::F32,
            Self::F64(_) => PrimType::F64,
            Self::Checked => PrimType::Cert,
        }
    }
}

/// An atomic operand: either a constant or a reference to a named value.
///
/// Operations never nest; every compound computation is bound to a name first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubExp {
    Const(PrimValue),
    Var(VName),
}

impl SubExp {
    /// Creates a variable reference
    pub fn var(name: &VName) -> Self {
        Self::Var(name.clone())
    }

    /// Creates an `i32` constant
    pub const fn i32(value: i32) -> Self {
        Self::Const(PrimValue::I32(value))
    }

    /// Returns the referenced name if this is a variable
    pub const fn as_var(&self) -> Option<&VName> {
        match self {
            Self::Var(name) => Some(name),
            Self::Const(_) => None,
        }
    }

    /// Adds the referenced name, if any, to `names`
    pub fn collect_free(&self, names: &mut Names) {
        if let Self::Var(name) = self {
            names.insert(name.clone());
        }
    }
}

impl From<VName> for SubExp {
    fn from(name: VName) -> Self {
        Self::Var(name)
    }
}

/// A set of certificates attached to an operation.
///
/// Each certificate stands for a runtime safety check (bounds, shape) that must
/// hold before the operation may execute. When an operation is moved, its
/// certificates move with it. Order carries no meaning but is preserved so the
/// generated code is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Certificates(pub Vec<VName>);

impl Certificates {
    /// The empty certificate set
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Returns true if no checks are attached
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Concatenates two certificate sets, `self` first
    pub fn concat(&self, other: &Self) -> Self {
        let mut certs = self.0.clone();
        certs.extend(other.0.iter().cloned());
        Self(certs)
    }

    /// Iterates over the certificate names
    pub fn iter(&self) -> impl Iterator<Item = &VName> {
        self.0.iter()
    }

    /// Adds the certificate names to `names`
    pub fn collect_free(&self, names: &mut Names) {
        names.extend(self.0.iter().cloned());
    }
}

impl FromIterator<VName> for Certificates {
    fn from_iter<T: IntoIterator<Item = VName>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certificate_concat_preserves_order() {
        let a = VName::new("a", 1);
        let b = VName::new("b", 2);
        let c = VName::new("c", 3);
        let outer = Certificates(vec![a.clone()]);
        let inner = Certificates(vec![b.clone(), c.clone()]);
        assert_eq!(outer.concat(&inner).0, vec![a, b, c]);
    }

    #[test]
    fn test_subexp_free_names() {
        let x = VName::new("x", 0);
        let mut names = Names::new();
        SubExp::i32(3).collect_free(&mut names);
        assert!(names.is_empty());
        SubExp::var(&x).collect_free(&mut names);
        assert!(names.contains(&x));
    }
}
