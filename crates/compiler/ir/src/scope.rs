//! # Type Environments
//!
//! Transformations ask a [`TypeEnv`] for the type of a name when they need to
//! build new bindings around it. A missing name means the program handed to
//! the transformation is malformed.

use rustc_hash::FxHashMap;

use crate::{Body, Exp, LoopForm, Param, Pattern, PrimType, Stm, Type, VName};

/// Lookup of the types of names in scope
pub trait TypeEnv {
    fn lookup_type(&self, name: &VName) -> Option<Type>;
}

/// A concrete name-to-type table
#[derive(Debug, Clone, Default)]
pub struct Scope {
    types: FxHashMap<VName, Type>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: VName, ty: Type) {
        self.types.insert(name, ty);
    }

    pub fn insert_params<'a>(&mut self, params: impl IntoIterator<Item = &'a Param>) {
        for param in params {
            self.insert(param.name.clone(), param.ty.clone());
        }
    }

    pub fn insert_pattern(&mut self, pattern: &Pattern) {
        for pe in pattern {
            self.insert(pe.name.clone(), pe.ty.clone());
        }
    }

    /// Adds every name bound by `stm`, including those bound in nested bodies
    pub fn insert_stm(&mut self, stm: &Stm) {
        self.insert_pattern(&stm.pattern);
        match &stm.exp {
            Exp::BasicOp(_) | Exp::Update { .. } => {}
            Exp::DoLoop {
                merge, form, body, ..
            } => {
                self.insert_params(merge.iter().map(|(p, _)| p));
                if let LoopForm::For { index, .. } = form {
                    self.insert(index.clone(), Type::prim(PrimType::I32));
                }
                self.insert_body(body);
            }
            Exp::Map { lambda, .. } => {
                self.insert(lambda.index.clone(), Type::prim(PrimType::I32));
                self.insert_params(&lambda.params);
                self.insert_body(&lambda.body);
            }
            Exp::Kernel(kernel) => {
                self.insert(kernel.thread_index.clone(), Type::prim(PrimType::I32));
                for (index, _) in &kernel.ispace {
                    self.insert(index.clone(), Type::prim(PrimType::I32));
                }
                self.insert_params(kernel.inputs.iter().map(|inp| &inp.param));
                self.insert_body(&kernel.body);
            }
        }
    }

    /// Adds every name bound anywhere in `body`
    pub fn insert_body(&mut self, body: &Body) {
        for stm in &body.stms {
            self.insert_stm(stm);
        }
    }

    pub fn contains(&self, name: &VName) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeEnv for Scope {
    fn lookup_type(&self, name: &VName) -> Option<Type> {
        self.types.get(name).cloned()
    }
}

impl<T: TypeEnv + ?Sized> TypeEnv for &T {
    fn lookup_type(&self, name: &VName) -> Option<Type> {
        (**self).lookup_type(name)
    }
}

/// A scope layered over another environment; local entries win
pub struct LocalScope<'a, E: TypeEnv + ?Sized> {
    local: Scope,
    outer: &'a E,
}

impl<'a, E: TypeEnv + ?Sized> LocalScope<'a, E> {
    pub fn new(outer: &'a E) -> Self {
        Self {
            local: Scope::new(),
            outer,
        }
    }

    pub fn insert(&mut self, name: VName, ty: Type) {
        self.local.insert(name, ty);
    }

    pub fn insert_pattern(&mut self, pattern: &Pattern) {
        self.local.insert_pattern(pattern);
    }
}

impl<E: TypeEnv + ?Sized> TypeEnv for LocalScope<'_, E> {
    fn lookup_type(&self, name: &VName) -> Option<Type> {
        self.local
            .lookup_type(name)
            .or_else(|| self.outer.lookup_type(name))
    }
}
