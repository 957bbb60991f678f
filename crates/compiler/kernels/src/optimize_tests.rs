use super::*;
use crate::construct::construct_kernel;
use crate::nesting::{KernelNest, LoopNesting};
use lumen_compiler_ir::testing::{i32_array, rearrange, TestNames};
use lumen_compiler_ir::{Body, Certificates, Param, Pattern, SubExp, Type, VName};

struct OneLevel {
    names: TestNames,
    big: VName,
    small: VName,
    index: VName,
    out: VName,
}

/// `out = map i < 3 (small <- big)` with `big: [3][4][5]i32`
fn one_level() -> OneLevel {
    let mut names = TestNames::new();
    let big = names.name("X");
    let small = names.name("x");
    let index = names.name("i");
    let out = names.name("Y");
    OneLevel {
        names,
        big,
        small,
        index,
        out,
    }
}

fn nest_of(l: &OneLevel, out_ty: Type, cs: Certificates) -> KernelNest {
    KernelNest::single(LoopNesting {
        pattern: Pattern::single(l.out.clone(), out_ty),
        cs,
        width: SubExp::i32(3),
        index: l.index.clone(),
        params_and_arrays: vec![(
            Param::new(l.small.clone(), i32_array([SubExp::i32(4), SubExp::i32(5)])),
            l.big.clone(),
        )],
    })
}

#[test]
fn test_rearrange_kernel_becomes_rearrange() {
    let mut l = one_level();
    let y = l.names.name("y");
    let c_outer = l.names.name("c");
    let c_inner = l.names.name("d");
    let body_stm = Stm::basic(
        y.clone(),
        i32_array([SubExp::i32(5), SubExp::i32(4)]),
        BasicOp::Rearrange {
            cs: Certificates(vec![c_inner.clone()]),
            perm: vec![1, 0],
            array: l.small.clone(),
        },
    );
    let nest = nest_of(
        &l,
        i32_array([SubExp::i32(3), SubExp::i32(5), SubExp::i32(4)]),
        Certificates(vec![c_outer.clone()]),
    );
    let body = Body::new(vec![body_stm], vec![SubExp::var(&y)]);
    let (prelude, kernel) = construct_kernel(l.names.source(), &nest, body).unwrap();
    assert!(prelude.is_empty());

    let Exp::Kernel(k) = &kernel.exp else {
        panic!("expected a kernel");
    };
    assert_eq!(k.ispace, vec![(l.index.clone(), SubExp::i32(3))]);
    assert_eq!(k.inputs.len(), 1);
    assert_eq!(k.inputs[0].indices.to_vec(), vec![SubExp::var(&l.index)]);

    let optimized = optimize_kernel(kernel);
    assert_eq!(optimized.pattern.names().collect::<Vec<_>>(), vec![&l.out]);
    assert_eq!(
        optimized.exp,
        Exp::BasicOp(BasicOp::Rearrange {
            cs: Certificates(vec![c_outer, c_inner]),
            perm: vec![0, 2, 1],
            array: l.big.clone(),
        })
    );
}

#[test]
fn test_reshape_kernel_keeps_outer_dims_as_coercions() {
    let mut l = one_level();
    let y = l.names.name("y");
    let body_stm = Stm::basic(
        y.clone(),
        i32_array([SubExp::i32(20)]),
        BasicOp::Reshape {
            cs: Certificates::empty(),
            shape: vec![DimChange::Exact(SubExp::i32(20))],
            array: l.small.clone(),
        },
    );
    let nest = nest_of(
        &l,
        i32_array([SubExp::i32(3), SubExp::i32(20)]),
        Certificates::empty(),
    );
    let body = Body::new(vec![body_stm], vec![SubExp::var(&y)]);
    let (_, kernel) = construct_kernel(l.names.source(), &nest, body).unwrap();

    assert_eq!(
        optimize_kernel(kernel).exp,
        Exp::BasicOp(BasicOp::Reshape {
            cs: Certificates::empty(),
            shape: vec![
                DimChange::Coercion(SubExp::i32(3)),
                DimChange::Exact(SubExp::i32(20)),
            ],
            array: l.big.clone(),
        })
    );
}

#[test]
fn test_copy_kernel_becomes_copy() {
    let mut l = one_level();
    let y = l.names.name("y");
    let body_stm = Stm::copy(
        y.clone(),
        i32_array([SubExp::i32(4), SubExp::i32(5)]),
        l.small.clone(),
    );
    let nest = nest_of(
        &l,
        i32_array([SubExp::i32(3), SubExp::i32(4), SubExp::i32(5)]),
        Certificates::empty(),
    );
    let body = Body::new(vec![body_stm], vec![SubExp::var(&y)]);
    let (_, kernel) = construct_kernel(l.names.source(), &nest, body).unwrap();

    assert_eq!(
        optimize_kernel(kernel).exp,
        Exp::BasicOp(BasicOp::Copy(l.big.clone()))
    );
}

#[test]
fn test_kernel_with_real_work_is_kept() {
    let mut l = one_level();
    let y = l.names.name("y");
    let z = l.names.name("z");
    let nest = nest_of(
        &l,
        i32_array([SubExp::i32(3), SubExp::i32(5), SubExp::i32(4)]),
        Certificates::empty(),
    );
    // Two statements: not a bare layout operation.
    let body = Body::new(
        vec![
            rearrange(y.clone(), i32_array([SubExp::i32(5), SubExp::i32(4)]), vec![1, 0], l.small.clone()),
            Stm::copy(z.clone(), i32_array([SubExp::i32(5), SubExp::i32(4)]), y),
        ],
        vec![SubExp::var(&z)],
    );
    let (_, kernel) = construct_kernel(l.names.source(), &nest, body).unwrap();
    let optimized = optimize_kernel(kernel.clone());
    assert_eq!(optimized, kernel);
}

#[test]
fn test_non_kernel_is_untouched() {
    let mut l = one_level();
    let y = l.names.name("y");
    let stm = rearrange(y, i32_array([SubExp::i32(5), SubExp::i32(4)]), vec![1, 0], l.small.clone());
    assert_eq!(optimize_kernel(stm.clone()), stm);
}
