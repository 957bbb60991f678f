//! # Kernel Peephole Optimizer
//!
//! Flattening always produces a kernel, even when the kernel does nothing but
//! move data around. A kernel whose body is one rearrange, reshape or copy of
//! its only input, read at exactly the current iteration point, is replaced by
//! that operation applied to the whole input array.

use lumen_compiler_ir::{BasicOp, DimChange, Exp, KernelExp, KernelInput, Stm};

/// Rewrites `stm` to a layout operation if it is a degenerate kernel; returns it unchanged otherwise
pub fn optimize_kernel(stm: Stm) -> Stm {
    let replacement = match &stm.exp {
        Exp::Kernel(kernel) => degenerate_op(kernel).and_then(|(input, op)| {
            rearrange_kernel(kernel, input, op)
                .or_else(|| reshape_kernel(kernel, input, op))
                .or_else(|| copy_kernel(input, op))
        }),
        _ => None,
    };
    match replacement {
        Some(op) => {
            tracing::trace!("Replaced degenerate kernel by {}", op);
            Stm::new(stm.pattern, Exp::BasicOp(op))
        }
        None => stm,
    }
}

/// The sole input and sole operation of a kernel that returns that operation's
/// result directly and reads its input at the current iteration point
fn degenerate_op(kernel: &KernelExp) -> Option<(&KernelInput, &BasicOp)> {
    let [input] = kernel.inputs.as_slice() else {
        return None;
    };
    let [stm] = kernel.body.stms.as_slice() else {
        return None;
    };
    let [res] = kernel.body.result.as_slice() else {
        return None;
    };
    let [pe] = stm.pattern.elems.as_slice() else {
        return None;
    };
    if res.as_var() != Some(&pe.name) {
        return None;
    }
    let at_point = input.indices.len() == kernel.ispace.len()
        && input
            .indices
            .iter()
            .zip(&kernel.ispace)
            .all(|(idx, (var, _))| idx.as_var() == Some(var));
    if !at_point {
        return None;
    }
    match &stm.exp {
        Exp::BasicOp(op) => Some((input, op)),
        _ => None,
    }
}

fn rearrange_kernel(kernel: &KernelExp, input: &KernelInput, op: &BasicOp) -> Option<BasicOp> {
    let BasicOp::Rearrange { cs, perm, array } = op else {
        return None;
    };
    if array != input.name() {
        return None;
    }
    let outer = kernel.ispace.len();
    let perm = (0..outer).chain(perm.iter().map(|k| k + outer)).collect();
    Some(BasicOp::Rearrange {
        cs: kernel.cs.concat(cs),
        perm,
        array: input.array.clone(),
    })
}

fn reshape_kernel(kernel: &KernelExp, input: &KernelInput, op: &BasicOp) -> Option<BasicOp> {
    let BasicOp::Reshape { cs, shape, array } = op else {
        return None;
    };
    if array != input.name() {
        return None;
    }
    let shape = kernel
        .ispace
        .iter()
        .map(|(_, size)| DimChange::Coercion(size.clone()))
        .chain(shape.iter().cloned())
        .collect();
    Some(BasicOp::Reshape {
        cs: kernel.cs.concat(cs),
        shape,
        array: input.array.clone(),
    })
}

fn copy_kernel(input: &KernelInput, op: &BasicOp) -> Option<BasicOp> {
    match op {
        BasicOp::Copy(array) if array == input.name() => Some(BasicOp::Copy(input.array.clone())),
        _ => None,
    }
}

#[cfg(test)]
#[path = "optimize_tests.rs"]
mod tests;
