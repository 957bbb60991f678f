//! # Kernel Constructor
//!
//! Flattens a [`KernelNest`] into a single kernel statement. The iteration
//! spaces of all levels are concatenated, their widths multiplied into one
//! thread count, and every level's parameters become kernel inputs indexed by
//! the iteration-space indices of the levels they pass through.

use lumen_compiler_ir::free::free_in_body;
use lumen_compiler_ir::{
    Body, Exp, KernelExp, KernelInput, NameSource, PrimType, Stm, SubExp,
};

use crate::error::{DistributeError, DistributeResult};
use crate::nesting::KernelNest;

/// Builds the kernel computing `body` once per point of `nest`'s iteration space.
///
/// Returns the statements computing the total width, outermost product first,
/// and the kernel statement itself. The kernel binds the outermost level's
/// pattern; `body.result` must match the innermost level's pattern.
pub fn construct_kernel(
    names: &mut NameSource,
    nest: &KernelNest,
    body: Body,
) -> DistributeResult<(Vec<Stm>, Stm)> {
    let innermost = nest.innermost();
    if innermost.pattern.len() != body.result.len() {
        return Err(DistributeError::ArityMismatch {
            what: "kernel body",
            pattern: innermost.pattern.len(),
            result: body.result.len(),
        });
    }

    let (prelude, width) = flatten_widths(names, &nest.widths());

    let ispace: Vec<_> = nest
        .levels()
        .map(|level| (level.index.clone(), level.width.clone()))
        .collect();

    let mut inputs: Vec<KernelInput> = Vec::new();
    for level in nest.levels().rev() {
        for input in &mut inputs {
            let owner = level
                .params_and_arrays
                .iter()
                .find(|(param, _)| param.name == input.array);
            if let Some((_, array)) = owner {
                input.array = array.clone();
                input.indices.insert(0, SubExp::var(&level.index));
            }
        }
        let mut own: Vec<KernelInput> = level
            .params_and_arrays
            .iter()
            .map(|(param, array)| {
                KernelInput::new(param.clone(), array.clone(), [SubExp::var(&level.index)])
            })
            .collect();
        own.append(&mut inputs);
        inputs = own;
    }

    let used = free_in_body(&body);
    inputs.retain(|input| used.contains(input.name()));

    let dims: Vec<usize> = (0..nest.depth()).collect();
    let returns = innermost
        .pattern
        .types()
        .map(|ty| (ty.row_type(), dims.clone()))
        .collect();

    let outermost = nest.outermost();
    let kernel = KernelExp {
        cs: outermost.cs.clone(),
        width,
        thread_index: names.new_name("global_thread_index"),
        ispace,
        inputs,
        returns,
        body,
    };
    Ok((prelude, Stm::new(outermost.pattern.clone(), Exp::Kernel(kernel))))
}

/// Left-folds `widths` into their product, binding each partial product to a fresh name
fn flatten_widths(names: &mut NameSource, widths: &[SubExp]) -> (Vec<Stm>, SubExp) {
    let mut prelude = Vec::new();
    let mut iter = widths.iter();
    let Some(first) = iter.next() else {
        return (prelude, SubExp::i32(1));
    };
    let mut acc = first.clone();
    for w in iter {
        let product = names.new_name("nesting_size");
        prelude.push(Stm::mul(product.clone(), PrimType::I32, acc, w.clone()));
        acc = SubExp::Var(product);
    }
    (prelude, acc)
}
