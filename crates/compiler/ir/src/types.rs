//! # IR Type System
//!
//! Types are scalars or regular multi-dimensional arrays. Array dimensions are
//! [`SubExp`]s, so a shape may depend on a named value; that dependency is
//! what makes an array irregular when the name is bound inside a loop nest.

use crate::{Names, PrimType, SubExp};

/// In-place-update annotation of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uniqueness {
    /// The value may be destructively updated; no other live alias exists
    Unique,
    /// The value is read-only
    Nonunique,
}

/// A value type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// A scalar
    Prim(PrimType),

    /// A regular array of scalars, outermost dimension first
    Array {
        elem: PrimType,
        shape: Vec<SubExp>,
        uniqueness: Uniqueness,
    },
}

impl Type {
    /// Creates a scalar type
    pub const fn prim(elem: PrimType) -> Self {
        Self::Prim(elem)
    }

    /// Creates a read-only array type
    pub const fn array(elem: PrimType, shape: Vec<SubExp>) -> Self {
        Self::Array {
            elem,
            shape,
            uniqueness: Uniqueness::Nonunique,
        }
    }

    /// Creates a unique array type
    pub const fn unique_array(elem: PrimType, shape: Vec<SubExp>) -> Self {
        Self::Array {
            elem,
            shape,
            uniqueness: Uniqueness::Unique,
        }
    }

    /// The array type whose rows have type `row` and whose outer size is `width`.
    ///
    /// The uniqueness of the result follows the row.
    pub fn array_of_row(row: &Self, width: SubExp) -> Self {
        match row {
            Self::Prim(elem) => Self::array(*elem, vec![width]),
            Self::Array {
                elem,
                shape,
                uniqueness,
            } => {
                let mut new_shape = Vec::with_capacity(shape.len() + 1);
                new_shape.push(width);
                new_shape.extend(shape.iter().cloned());
                Self::Array {
                    elem: *elem,
                    shape: new_shape,
                    uniqueness: *uniqueness,
                }
            }
        }
    }

    /// The type of one row of this array; scalars are returned unchanged
    pub fn row_type(&self) -> Self {
        self.strip_dims(1)
    }

    /// Drops the `n` outermost dimensions
    pub fn strip_dims(&self, n: usize) -> Self {
        match self {
            Self::Prim(_) => self.clone(),
            Self::Array {
                elem,
                shape,
                uniqueness,
            } => {
                if n >= shape.len() {
                    Self::Prim(*elem)
                } else {
                    Self::Array {
                        elem: *elem,
                        shape: shape[n..].to_vec(),
                        uniqueness: *uniqueness,
                    }
                }
            }
        }
    }

    /// Number of array dimensions
    pub fn rank(&self) -> usize {
        self.array_dims().len()
    }

    /// The dimension sizes, outermost first
    pub fn array_dims(&self) -> &[SubExp] {
        match self {
            Self::Prim(_) => &[],
            Self::Array { shape, .. } => shape,
        }
    }

    /// The outermost dimension size, if this is an array
    pub fn outer_dim(&self) -> Option<&SubExp> {
        self.array_dims().first()
    }

    /// Returns true if this type allows in-place updates
    pub const fn is_unique(&self) -> bool {
        matches!(
            self,
            Self::Array {
                uniqueness: Uniqueness::Unique,
                ..
            }
        )
    }

    /// Returns this type with the given uniqueness; scalars are unaffected
    pub fn with_uniqueness(&self, u: Uniqueness) -> Self {
        match self {
            Self::Prim(_) => self.clone(),
            Self::Array { elem, shape, .. } => Self::Array {
                elem: *elem,
                shape: shape.clone(),
                uniqueness: u,
            },
        }
    }

    /// Names referenced by the dimension sizes
    pub fn free_in_dims(&self) -> Names {
        let mut names = Names::new();
        for dim in self.array_dims() {
            dim.collect_free(&mut names);
        }
        names
    }
}

/// One dimension of a reshape target shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimChange {
    /// The dimension takes on this size
    Exact(SubExp),
    /// The dimension is asserted to already have this size
    Coercion(SubExp),
}

impl DimChange {
    /// The size of the dimension, regardless of kind
    pub const fn size(&self) -> &SubExp {
        match self {
            Self::Exact(se) | Self::Coercion(se) => se,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VName;

    #[test]
    fn test_array_of_row_prepends_dimension() {
        let n = VName::new("n", 0);
        let row = Type::array(PrimType::I32, vec![SubExp::var(&n)]);
        let arr = Type::array_of_row(&row, SubExp::i32(3));
        assert_eq!(arr.rank(), 2);
        assert_eq!(arr.array_dims()[0], SubExp::i32(3));
        assert_eq!(arr.row_type(), row);
    }

    #[test]
    fn test_row_of_vector_is_scalar() {
        let v = Type::array(PrimType::F32, vec![SubExp::i32(4)]);
        assert_eq!(v.row_type(), Type::prim(PrimType::F32));
        assert_eq!(Type::prim(PrimType::F32).row_type(), Type::prim(PrimType::F32));
    }

    #[test]
    fn test_free_in_dims() {
        let n = VName::new("n", 0);
        let m = VName::new("m", 1);
        let t = Type::array(PrimType::I32, vec![SubExp::var(&n), SubExp::i32(2), SubExp::var(&m)]);
        let free = t.free_in_dims();
        assert_eq!(free.len(), 2);
        assert!(free.contains(&n) && free.contains(&m));
    }

    #[test]
    fn test_uniqueness_roundtrip() {
        let t = Type::unique_array(PrimType::I32, vec![SubExp::i32(2)]);
        assert!(t.is_unique());
        let nt = t.with_uniqueness(Uniqueness::Nonunique);
        assert!(!nt.is_unique());
        assert_eq!(nt.array_dims(), t.array_dims());
    }
}
