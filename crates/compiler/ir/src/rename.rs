//! # Capture-Avoiding Renaming
//!
//! When a statement is copied or relocated, the names bound inside it must be
//! replaced by fresh ones so that the program keeps every name bound exactly
//! once. The statement's own pattern and its free names are left untouched.

use rustc_hash::FxHashMap;

use crate::{
    BasicOp, Body, Certificates, DimChange, Exp, KernelExp, KernelInput, Lambda, LoopForm,
    NameSource, Param, PatElem, Pattern, Stm, SubExp, Type, VName,
};

/// Gives fresh names to everything bound inside `stm`'s expression
pub fn rename_stm(stm: &Stm, names: &mut NameSource) -> Stm {
    let mut renamer = Renamer::new(names);
    Stm {
        pattern: renamer.pattern_uses(&stm.pattern),
        exp: renamer.exp(&stm.exp),
    }
}

struct Renamer<'a> {
    names: &'a mut NameSource,
    subst: FxHashMap<VName, VName>,
}

impl<'a> Renamer<'a> {
    fn new(names: &'a mut NameSource) -> Self {
        Self {
            names,
            subst: FxHashMap::default(),
        }
    }

    fn bind(&mut self, name: &VName) -> VName {
        let fresh = self.names.new_name_from(name);
        self.subst.insert(name.clone(), fresh.clone());
        fresh
    }

    fn name(&self, name: &VName) -> VName {
        self.subst.get(name).cloned().unwrap_or_else(|| name.clone())
    }

    fn subexp(&self, se: &SubExp) -> SubExp {
        match se {
            SubExp::Var(name) => SubExp::Var(self.name(name)),
            SubExp::Const(_) => se.clone(),
        }
    }

    fn subexps(&self, ses: &[SubExp]) -> Vec<SubExp> {
        ses.iter().map(|se| self.subexp(se)).collect()
    }

    fn certs(&self, cs: &Certificates) -> Certificates {
        cs.iter().map(|c| self.name(c)).collect()
    }

    fn ty(&self, ty: &Type) -> Type {
        match ty {
            Type::Prim(_) => ty.clone(),
            Type::Array {
                elem,
                shape,
                uniqueness,
            } => Type::Array {
                elem: *elem,
                shape: self.subexps(shape),
                uniqueness: *uniqueness,
            },
        }
    }

    fn bind_param(&mut self, param: &Param) -> Param {
        let ty = self.ty(&param.ty);
        Param::new(self.bind(&param.name), ty)
    }

    fn bind_pattern(&mut self, pattern: &Pattern) -> Pattern {
        pattern
            .elems
            .iter()
            .map(|pe| {
                let ty = self.ty(&pe.ty);
                PatElem::new(self.bind(&pe.name), ty)
            })
            .collect()
    }

    /// Substitutes inside the types of `pattern` without rebinding its names
    fn pattern_uses(&self, pattern: &Pattern) -> Pattern {
        pattern
            .elems
            .iter()
            .map(|pe| PatElem::new(pe.name.clone(), self.ty(&pe.ty)))
            .collect()
    }

    fn basic_op(&self, op: &BasicOp) -> BasicOp {
        match op {
            BasicOp::SubExp(se) => BasicOp::SubExp(self.subexp(se)),
            BasicOp::BinOp { op, left, right } => BasicOp::BinOp {
                op: *op,
                left: self.subexp(left),
                right: self.subexp(right),
            },
            BasicOp::Index { cs, array, indices } => BasicOp::Index {
                cs: self.certs(cs),
                array: self.name(array),
                indices: self.subexps(indices),
            },
            BasicOp::Iota(n) => BasicOp::Iota(self.subexp(n)),
            BasicOp::Replicate { count, value } => BasicOp::Replicate {
                count: self.subexp(count),
                value: self.subexp(value),
            },
            BasicOp::Rearrange { cs, perm, array } => BasicOp::Rearrange {
                cs: self.certs(cs),
                perm: perm.clone(),
                array: self.name(array),
            },
            BasicOp::Reshape { cs, shape, array } => BasicOp::Reshape {
                cs: self.certs(cs),
                shape: shape
                    .iter()
                    .map(|d| match d {
                        DimChange::Exact(se) => DimChange::Exact(self.subexp(se)),
                        DimChange::Coercion(se) => DimChange::Coercion(self.subexp(se)),
                    })
                    .collect(),
                array: self.name(array),
            },
            BasicOp::Copy(array) => BasicOp::Copy(self.name(array)),
        }
    }

    fn lambda(&mut self, lambda: &Lambda) -> Lambda {
        let index = self.bind(&lambda.index);
        let params = lambda.params.iter().map(|p| self.bind_param(p)).collect();
        let body = self.body(&lambda.body);
        Lambda {
            index,
            params,
            body,
            return_types: lambda.return_types.iter().map(|t| self.ty(t)).collect(),
        }
    }

    fn kernel(&mut self, kernel: &KernelExp) -> KernelExp {
        let cs = self.certs(&kernel.cs);
        let width = self.subexp(&kernel.width);
        let arrays: Vec<VName> = kernel.inputs.iter().map(|inp| self.name(&inp.array)).collect();
        let ispace = kernel
            .ispace
            .iter()
            .map(|(index, size)| {
                let size = self.subexp(size);
                (self.bind(index), size)
            })
            .collect();
        let thread_index = self.bind(&kernel.thread_index);
        let inputs = kernel
            .inputs
            .iter()
            .zip(arrays)
            .map(|(inp, array)| {
                let indices: Vec<SubExp> = self.subexps(&inp.indices);
                KernelInput::new(self.bind_param(&inp.param), array, indices)
            })
            .collect();
        let body = self.body(&kernel.body);
        KernelExp {
            cs,
            width,
            thread_index,
            ispace,
            inputs,
            returns: kernel
                .returns
                .iter()
                .map(|(t, dims)| (self.ty(t), dims.clone()))
                .collect(),
            body,
        }
    }

    fn exp(&mut self, exp: &Exp) -> Exp {
        match exp {
            Exp::BasicOp(op) => Exp::BasicOp(self.basic_op(op)),
            Exp::Update {
                cs,
                src,
                indices,
                value,
            } => Exp::Update {
                cs: self.certs(cs),
                src: self.name(src),
                indices: self.subexps(indices),
                value: self.subexp(value),
            },
            Exp::DoLoop {
                ret,
                merge,
                form,
                body,
            } => {
                let inits: Vec<SubExp> = merge.iter().map(|(_, init)| self.subexp(init)).collect();
                let merge: Vec<(Param, SubExp)> = merge
                    .iter()
                    .zip(inits)
                    .map(|((param, _), init)| (self.bind_param(param), init))
                    .collect();
                let form = match form {
                    LoopForm::For { index, bound } => {
                        let bound = self.subexp(bound);
                        LoopForm::For {
                            index: self.bind(index),
                            bound,
                        }
                    }
                    LoopForm::While { cond } => LoopForm::While {
                        cond: self.name(cond),
                    },
                };
                Exp::DoLoop {
                    ret: ret.iter().map(|r| self.name(r)).collect(),
                    merge,
                    form,
                    body: self.body(body),
                }
            }
            Exp::Map {
                cs,
                width,
                lambda,
                arrays,
            } => {
                let cs = self.certs(cs);
                let width = self.subexp(width);
                let arrays = arrays.iter().map(|a| self.name(a)).collect();
                Exp::Map {
                    cs,
                    width,
                    lambda: self.lambda(lambda),
                    arrays,
                }
            }
            Exp::Kernel(kernel) => Exp::Kernel(self.kernel(kernel)),
        }
    }

    fn body(&mut self, body: &Body) -> Body {
        let mut stms = Vec::with_capacity(body.stms.len());
        for stm in &body.stms {
            let exp = self.exp(&stm.exp);
            let pattern = self.bind_pattern(&stm.pattern);
            stms.push(Stm { pattern, exp });
        }
        Body {
            stms,
            result: self.subexps(&body.result),
        }
    }
}
