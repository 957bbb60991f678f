//! # Pretty Printing
//!
//! Textual rendering of the IR, used by diagnostic traces and tests.

use std::fmt;

use crate::{
    indent_str, BasicOp, BinOp, Body, Certificates, DimChange, Exp, KernelExp, Lambda, LoopForm,
    PrettyPrint, PrimType, PrimValue, Pattern, Stm, SubExp, Type, Uniqueness,
};

impl fmt::Display for PrimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bool => "bool",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Cert => "cert",
        };
        f.write_str(s)
    }
}

impl fmt::Display for PrimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}i64"),
            Self::F32(v) => write!(f, "{v}f32"),
            Self::F64(v) => write!(f, "{v}f64"),
            Self::Checked => f.write_str("checked"),
        }
    }
}

impl fmt::Display for SubExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(v) => write!(f, "{v}"),
            Self::Var(name) => write!(f, "{name}"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prim(t) => write!(f, "{t}"),
            Self::Array {
                elem,
                shape,
                uniqueness,
            } => {
                if *uniqueness == Uniqueness::Unique {
                    f.write_str("*")?;
                }
                for dim in shape {
                    write!(f, "[{dim}]")?;
                }
                write!(f, "{elem}")
            }
        }
    }
}

impl fmt::Display for Certificates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        f.write_str("<")?;
        write_list(f, self.iter())?;
        f.write_str("> ")
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, pe) in self.elems.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", pe.name, pe.ty)?;
        }
        f.write_str("}")
    }
}

fn write_list<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl IntoIterator<Item = T>,
) -> fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn list<T: fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for BasicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubExp(se) => write!(f, "{se}"),
            Self::BinOp { op, left, right } => {
                let (sym, t) = match op {
                    BinOp::Add(t) => ("+", t),
                    BinOp::Sub(t) => ("-", t),
                    BinOp::Mul(t) => ("*", t),
                };
                write!(f, "{left} {sym}{t} {right}")
            }
            Self::Index { cs, array, indices } => {
                write!(f, "{cs}{array}[{}]", list(indices))
            }
            Self::Iota(n) => write!(f, "iota({n})"),
            Self::Replicate { count, value } => write!(f, "replicate({count}, {value})"),
            Self::Rearrange { cs, perm, array } => {
                write!(f, "{cs}rearrange(({}), {array})", list(perm))
            }
            Self::Reshape { cs, shape, array } => {
                let dims = shape.iter().map(|d| match d {
                    DimChange::Exact(se) => se.to_string(),
                    DimChange::Coercion(se) => format!("~{se}"),
                });
                write!(f, "{cs}reshape(({}), {array})", list(dims))
            }
            Self::Copy(array) => write!(f, "copy({array})"),
        }
    }
}

impl PrettyPrint for Body {
    fn pretty_print(&self, indent: usize) -> String {
        let mut result = String::new();
        for stm in &self.stms {
            result.push_str(&stm.pretty_print(indent));
            result.push('\n');
        }
        result.push_str(&format!("{}in {{{}}}", indent_str(indent), list(&self.result)));
        result
    }
}

impl PrettyPrint for Stm {
    fn pretty_print(&self, indent: usize) -> String {
        format!(
            "{}let {} = {}",
            indent_str(indent),
            self.pattern,
            self.exp.pretty_print(indent)
        )
    }
}

impl PrettyPrint for Lambda {
    fn pretty_print(&self, indent: usize) -> String {
        let params = self
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty));
        format!(
            "fn {} ({}) : {{{}}} =>\n{}",
            self.index,
            list(params),
            list(&self.return_types),
            self.body.pretty_print(indent + 1)
        )
    }
}

impl PrettyPrint for KernelExp {
    fn pretty_print(&self, indent: usize) -> String {
        let mut result = format!(
            "{}kernel(thread {}, width {}) ",
            self.cs, self.thread_index, self.width
        );
        let ispace = self.ispace.iter().map(|(i, w)| format!("{i} < {w}"));
        result.push_str(&format!("over ({})\n", list(ispace)));
        for input in &self.inputs {
            result.push_str(&format!(
                "{}{}: {} <- {}[{}]\n",
                indent_str(indent + 1),
                input.param.name,
                input.param.ty,
                input.array,
                list(&input.indices)
            ));
        }
        let returns = self.returns.iter().map(|(t, dims)| format!("{t} over ({})", list(dims)));
        result.push_str(&format!("{}returns {{{}}}\n", indent_str(indent + 1), list(returns)));
        result.push_str(&self.body.pretty_print(indent + 1));
        result
    }
}

impl PrettyPrint for Exp {
    fn pretty_print(&self, indent: usize) -> String {
        match self {
            Self::BasicOp(op) => op.to_string(),
            Self::Update {
                cs,
                src,
                indices,
                value,
            } => format!("{cs}{src} with [{}] <- {value}", list(indices)),
            Self::DoLoop {
                ret,
                merge,
                form,
                body,
            } => {
                let merge = merge
                    .iter()
                    .map(|(p, init)| format!("{}: {} = {init}", p.name, p.ty));
                let form = match form {
                    LoopForm::For { index, bound } => format!("for {index} < {bound}"),
                    LoopForm::While { cond } => format!("while {cond}"),
                };
                format!(
                    "loop {{{}}} = ({}) {form} do\n{}",
                    list(ret),
                    list(merge),
                    body.pretty_print(indent + 1)
                )
            }
            Self::Map {
                cs,
                width,
                lambda,
                arrays,
            } => format!(
                "{cs}map({width}, {}, {})",
                list(arrays),
                lambda.pretty_print(indent)
            ),
            Self::Kernel(kernel) => kernel.pretty_print(indent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VName;

    #[test]
    fn test_type_display() {
        let n = VName::new("n", 1);
        let t = Type::unique_array(PrimType::I32, vec![SubExp::i32(3), SubExp::var(&n)]);
        assert_eq!(t.to_string(), "*[3][n_1]i32");
        assert_eq!(Type::prim(PrimType::F32).to_string(), "f32");
    }

    #[test]
    fn test_rearrange_display() {
        let xs = VName::new("xs", 0);
        let c = VName::new("c", 4);
        let op = BasicOp::Rearrange {
            cs: Certificates(vec![c]),
            perm: vec![0, 2, 1],
            array: xs,
        };
        assert_eq!(op.to_string(), "<c_4> rearrange((0, 2, 1), xs_0)");
    }

    #[test]
    fn test_stm_pretty_print() {
        let y = VName::new("y", 2);
        let x = VName::new("x", 1);
        let stm = Stm::copy(y, Type::array(PrimType::I32, vec![SubExp::i32(3)]), x);
        assert_eq!(stm.pretty_print(1), "  let {y_2: [3]i32} = copy(x_1)");
    }
}
