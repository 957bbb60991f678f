//! # Testing Utilities for the IR
//!
//! Small builders that keep test setup readable. Available to this crate's
//! unit tests and, through the `testing` feature, to dependent crates.

use crate::{
    BasicOp, Body, Certificates, Exp, Lambda, NameSource, Param, Pattern, PrimType, Scope, Stm,
    SubExp, Type, VName,
};

/// A name source plus a scope that records every name it creates
#[derive(Debug, Default)]
pub struct TestNames {
    source: NameSource,
    scope: Scope,
}

impl TestNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh name with no recorded type
    pub fn name(&mut self, base: &str) -> VName {
        self.source.new_name(base)
    }

    /// A fresh name recorded in the scope with type `ty`
    pub fn typed(&mut self, base: &str, ty: Type) -> VName {
        let name = self.source.new_name(base);
        self.scope.insert(name.clone(), ty);
        name
    }

    /// A fresh parameter recorded in the scope
    pub fn param(&mut self, base: &str, ty: Type) -> Param {
        Param::new(self.typed(base, ty.clone()), ty)
    }

    pub fn source(&mut self) -> &mut NameSource {
        &mut self.source
    }

    /// Splits into the name source and scope so both can be borrowed at once
    pub fn parts(&mut self) -> (&mut NameSource, &Scope) {
        (&mut self.source, &self.scope)
    }
}

/// `i32`
pub const fn i32_t() -> Type {
    Type::prim(PrimType::I32)
}

/// A read-only `i32` array with the given dimensions
pub fn i32_array(dims: impl IntoIterator<Item = SubExp>) -> Type {
    Type::array(PrimType::I32, dims.into_iter().collect())
}

/// A unique `i32` array with the given dimensions
pub fn unique_i32_array(dims: impl IntoIterator<Item = SubExp>) -> Type {
    Type::unique_array(PrimType::I32, dims.into_iter().collect())
}

/// `let dest = rearrange(perm, array)` without certificates
pub fn rearrange(dest: VName, ty: Type, perm: Vec<usize>, array: VName) -> Stm {
    Stm::basic(
        dest,
        ty,
        BasicOp::Rearrange {
            cs: Certificates::empty(),
            perm,
            array,
        },
    )
}

/// `let dest = left + right` over `i32`
pub fn add(dest: VName, left: SubExp, right: SubExp) -> Stm {
    Stm::basic(
        dest,
        i32_t(),
        BasicOp::BinOp {
            op: crate::BinOp::Add(PrimType::I32),
            left,
            right,
        },
    )
}

/// `let pattern = map(width, \index params -> body, arrays)`
pub fn map_stm(
    pattern: Pattern,
    width: SubExp,
    index: VName,
    params_and_arrays: Vec<(Param, VName)>,
    body: Body,
) -> Stm {
    let return_types = pattern.types().map(Type::row_type).collect();
    let (params, arrays) = params_and_arrays.into_iter().unzip();
    Stm::new(
        pattern,
        Exp::Map {
            cs: Certificates::empty(),
            width,
            lambda: Lambda {
                index,
                params,
                body,
                return_types,
            },
            arrays,
        },
    )
}
