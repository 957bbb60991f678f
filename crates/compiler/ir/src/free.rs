//! # Free, Bound and Consumed Names
//!
//! Syntactic analyses over bodies and statements:
//!
//! - **free**: names referenced but not bound inside the construct, including
//!   names appearing in the shapes of bound types.
//! - **bound**: names introduced by statement patterns.
//! - **consumed**: names whose value the construct destroys through an
//!   in-place update, either directly or by passing them to a unique parameter.

use crate::{
    BasicOp, Body, Exp, KernelExp, Lambda, LoopForm, Names, Param, Stm, SubExp, Type,
};

fn add_type(ty: &Type, names: &mut Names) {
    for dim in ty.array_dims() {
        dim.collect_free(names);
    }
}

fn add_subexps<'a>(ses: impl IntoIterator<Item = &'a SubExp>, names: &mut Names) {
    for se in ses {
        se.collect_free(names);
    }
}

/// Names referenced by a primitive operation
pub fn free_in_basic_op(op: &BasicOp) -> Names {
    let mut names = Names::new();
    match op {
        BasicOp::SubExp(se) | BasicOp::Iota(se) => se.collect_free(&mut names),
        BasicOp::BinOp { left, right, .. } => {
            left.collect_free(&mut names);
            right.collect_free(&mut names);
        }
        BasicOp::Index { cs, array, indices } => {
            cs.collect_free(&mut names);
            names.insert(array.clone());
            add_subexps(indices, &mut names);
        }
        BasicOp::Replicate { count, value } => {
            count.collect_free(&mut names);
            value.collect_free(&mut names);
        }
        BasicOp::Rearrange { cs, array, .. } => {
            cs.collect_free(&mut names);
            names.insert(array.clone());
        }
        BasicOp::Reshape { cs, shape, array } => {
            cs.collect_free(&mut names);
            for dim in shape {
                dim.size().collect_free(&mut names);
            }
            names.insert(array.clone());
        }
        BasicOp::Copy(array) => {
            names.insert(array.clone());
        }
    }
    names
}

/// Names referenced by a lambda, excluding its index and parameters
pub fn free_in_lambda(lambda: &Lambda) -> Names {
    let mut names = free_in_body(&lambda.body);
    for param in &lambda.params {
        add_type(&param.ty, &mut names);
    }
    for ty in &lambda.return_types {
        add_type(ty, &mut names);
    }
    names.remove(&lambda.index);
    for param in &lambda.params {
        names.remove(&param.name);
    }
    names
}

/// Names referenced by a kernel, excluding everything it binds
pub fn free_in_kernel(kernel: &KernelExp) -> Names {
    let mut names = free_in_body(&kernel.body);
    kernel.cs.collect_free(&mut names);
    kernel.width.collect_free(&mut names);
    for (_, size) in &kernel.ispace {
        size.collect_free(&mut names);
    }
    for input in &kernel.inputs {
        names.insert(input.array.clone());
        add_subexps(&input.indices, &mut names);
        add_type(&input.param.ty, &mut names);
    }
    for (ty, _) in &kernel.returns {
        add_type(ty, &mut names);
    }
    for input in &kernel.inputs {
        names.remove(&input.param.name);
    }
    for (index, _) in &kernel.ispace {
        names.remove(index);
    }
    names.remove(&kernel.thread_index);
    names
}

/// Names referenced by an expression
pub fn free_in_exp(exp: &Exp) -> Names {
    match exp {
        Exp::BasicOp(op) => free_in_basic_op(op),
        Exp::Update {
            cs,
            src,
            indices,
            value,
        } => {
            let mut names = Names::new();
            cs.collect_free(&mut names);
            names.insert(src.clone());
            add_subexps(indices, &mut names);
            value.collect_free(&mut names);
            names
        }
        Exp::DoLoop {
            merge, form, body, ..
        } => {
            let mut names = free_in_body(body);
            for (param, _) in merge {
                add_type(&param.ty, &mut names);
            }
            if let LoopForm::For { index, .. } = form {
                names.remove(index);
            }
            for (param, _) in merge {
                names.remove(&param.name);
            }
            add_subexps(merge.iter().map(|(_, init)| init), &mut names);
            if let LoopForm::For { bound, .. } = form {
                bound.collect_free(&mut names);
            }
            names
        }
        Exp::Map {
            cs,
            width,
            lambda,
            arrays,
        } => {
            let mut names = free_in_lambda(lambda);
            cs.collect_free(&mut names);
            width.collect_free(&mut names);
            names.extend(arrays.iter().cloned());
            names
        }
        Exp::Kernel(kernel) => free_in_kernel(kernel),
    }
}

/// Names referenced by a statement, including the shapes in its pattern
pub fn free_in_stm(stm: &Stm) -> Names {
    let mut names = free_in_exp(&stm.exp);
    for ty in stm.pattern.types() {
        add_type(ty, &mut names);
    }
    names
}

/// Names referenced by a sequence of statements and not bound by an earlier one
pub fn free_in_stms(stms: &[Stm]) -> Names {
    let mut free = Names::new();
    let mut bound = Names::new();
    for stm in stms {
        for name in free_in_stm(stm) {
            if !bound.contains(&name) {
                free.insert(name);
            }
        }
        bound.extend(stm.pattern.names().cloned());
    }
    free
}

/// Names referenced by a body and not bound inside it
pub fn free_in_body(body: &Body) -> Names {
    let mut free = free_in_stms(&body.stms);
    let bound = bound_by_stms(&body.stms);
    for se in &body.result {
        if let SubExp::Var(name) = se {
            if !bound.contains(name) {
                free.insert(name.clone());
            }
        }
    }
    free
}

/// Names introduced by the patterns of `stms`
pub fn bound_by_stms(stms: &[Stm]) -> Names {
    stms.iter()
        .flat_map(|stm| stm.pattern.names().cloned())
        .collect()
}

fn consumed_through_params<'a>(
    pairs: impl IntoIterator<Item = (&'a Param, &'a crate::VName)>,
    names: &mut Names,
) {
    for (param, array) in pairs {
        if param.ty.is_unique() {
            names.insert(array.clone());
        }
    }
}

/// Names consumed by a statement
pub fn consumed_in_stm(stm: &Stm) -> Names {
    let mut names = Names::new();
    match &stm.exp {
        Exp::BasicOp(_) => {}
        Exp::Update { src, .. } => {
            names.insert(src.clone());
        }
        Exp::DoLoop { merge, body, .. } => {
            names = consumed_in_body(body);
            for (param, _) in merge {
                names.remove(&param.name);
            }
            for (param, init) in merge {
                if let (true, SubExp::Var(v)) = (param.ty.is_unique(), init) {
                    names.insert(v.clone());
                }
            }
        }
        Exp::Map { lambda, arrays, .. } => {
            names = consumed_in_body(&lambda.body);
            for param in &lambda.params {
                names.remove(&param.name);
            }
            consumed_through_params(lambda.params.iter().zip(arrays), &mut names);
        }
        Exp::Kernel(kernel) => {
            names = consumed_in_body(&kernel.body);
            for input in &kernel.inputs {
                names.remove(&input.param.name);
            }
            consumed_through_params(
                kernel.inputs.iter().map(|inp| (&inp.param, &inp.array)),
                &mut names,
            );
        }
    }
    names
}

/// Names consumed by a body that were bound outside it
pub fn consumed_in_body(body: &Body) -> Names {
    consumed_in_stms(&body.stms)
}

/// Names consumed by a sequence of statements that were bound outside it
pub fn consumed_in_stms(stms: &[Stm]) -> Names {
    let bound = bound_by_stms(stms);
    stms.iter()
        .flat_map(consumed_in_stm)
        .filter(|name| !bound.contains(name))
        .collect()
}
