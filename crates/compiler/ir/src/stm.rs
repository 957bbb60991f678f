//! # IR Statements
//!
//! A [`Body`] is a straight-line sequence of statements followed by a result.
//! Each [`Stm`] binds a [`Pattern`] to the value of one [`Exp`]; operations
//! never nest except through the bodies of lambdas, loops and kernels.
//!
//! Three statement shapes matter to kernel extraction: ordinary let-bindings
//! (`BasicOp`, `Map`, `Kernel`), in-place updates (`Update`) and sequential
//! loops (`DoLoop`).

use smallvec::SmallVec;

use crate::{Certificates, DimChange, Param, Pattern, PrimType, SubExp, Type, VName};

/// Index lists are short; most kernels are at most a few levels deep
pub type Indices = SmallVec<[SubExp; 4]>;

/// Arithmetic on scalars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add(PrimType),
    Sub(PrimType),
    Mul(PrimType),
}

/// Primitive operations that do not contain bodies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BasicOp {
    /// `x`
    SubExp(SubExp),

    /// `x op y`
    BinOp { op: BinOp, left: SubExp, right: SubExp },

    /// `arr[i, j, ...]`
    Index {
        cs: Certificates,
        array: VName,
        indices: Vec<SubExp>,
    },

    /// `iota(n)`
    Iota(SubExp),

    /// `replicate(n, x)`: `n` copies of `x`
    Replicate { count: SubExp, value: SubExp },

    /// `rearrange((perm), arr)`: permutes the dimensions of `arr`
    Rearrange {
        cs: Certificates,
        perm: Vec<usize>,
        array: VName,
    },

    /// `reshape((shape), arr)`
    Reshape {
        cs: Certificates,
        shape: Vec<DimChange>,
        array: VName,
    },

    /// `copy(arr)`: a fresh array with the contents of `arr`
    Copy(VName),
}

/// A function of one iteration of a parallel map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lambda {
    /// The iteration index, bound in the body
    pub index: VName,
    /// One parameter per mapped array, bound to the current row
    pub params: Vec<Param>,
    pub body: Body,
    pub return_types: Vec<Type>,
}

/// How a sequential loop iterates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopForm {
    /// `for index < bound`
    For { index: VName, bound: SubExp },
    /// `while cond`, where `cond` is a merge parameter
    While { cond: VName },
}

/// One per-iteration input of a kernel: `param = array[indices]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelInput {
    pub param: Param,
    pub array: VName,
    pub indices: Indices,
}

impl KernelInput {
    pub fn new(param: Param, array: VName, indices: impl IntoIterator<Item = SubExp>) -> Self {
        Self {
            param,
            array,
            indices: indices.into_iter().collect(),
        }
    }

    pub const fn name(&self) -> &VName {
        &self.param.name
    }
}

/// A flattened parallel kernel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelExp {
    pub cs: Certificates,
    /// Total number of threads: the product of the iteration-space sizes
    pub width: SubExp,
    /// Flat thread index
    pub thread_index: VName,
    /// `(index, size)` per dimension, outermost first
    pub ispace: Vec<(VName, SubExp)>,
    pub inputs: Vec<KernelInput>,
    /// Per-thread result type and the iteration-space dimensions it ranges over
    pub returns: Vec<(Type, Vec<usize>)>,
    pub body: Body,
}

/// Right-hand side of a statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exp {
    BasicOp(BasicOp),

    /// `src with [indices] <- value`: consumes `src`
    Update {
        cs: Certificates,
        src: VName,
        indices: Vec<SubExp>,
        value: SubExp,
    },

    /// A sequential loop; the statement's pattern binds the final values of `ret`
    DoLoop {
        ret: Vec<VName>,
        merge: Vec<(Param, SubExp)>,
        form: LoopForm,
        body: Body,
    },

    /// `map(width, lambda, arrays)`
    Map {
        cs: Certificates,
        width: SubExp,
        lambda: Lambda,
        arrays: Vec<VName>,
    },

    Kernel(KernelExp),
}

/// `let pattern = exp`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stm {
    pub pattern: Pattern,
    pub exp: Exp,
}

impl Stm {
    pub const fn new(pattern: Pattern, exp: Exp) -> Self {
        Self { pattern, exp }
    }

    /// `let name = op`
    pub fn basic(name: VName, ty: Type, op: BasicOp) -> Self {
        Self::new(Pattern::single(name, ty), Exp::BasicOp(op))
    }

    /// `let dest = left * right`
    pub fn mul(dest: VName, ty: PrimType, left: SubExp, right: SubExp) -> Self {
        Self::basic(
            dest,
            Type::prim(ty),
            BasicOp::BinOp {
                op: BinOp::Mul(ty),
                left,
                right,
            },
        )
    }

    /// `let dest = copy(src)`
    pub fn copy(dest: VName, ty: Type, src: VName) -> Self {
        Self::basic(dest, ty, BasicOp::Copy(src))
    }

    /// `let dest = replicate(count, value)`
    pub fn replicate(dest: VName, ty: Type, count: SubExp, value: SubExp) -> Self {
        Self::basic(dest, ty, BasicOp::Replicate { count, value })
    }
}

/// A sequence of statements and the values it yields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    pub stms: Vec<Stm>,
    pub result: Vec<SubExp>,
}

impl Body {
    pub const fn new(stms: Vec<Stm>, result: Vec<SubExp>) -> Self {
        Self { stms, result }
    }

    /// A body of a single statement returning its whole pattern
    pub fn from_stm(stm: Stm) -> Self {
        let result = stm.pattern.identity_result();
        Self {
            stms: vec![stm],
            result,
        }
    }
}
