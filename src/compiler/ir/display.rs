use super::*;

/// Renders a quadruple in three-address form using symbol names
pub struct QuadDisplay<'a> {
    quad: &'a Quad,
    symbols: &'a SymbolTable,
}

impl Quad {
    pub fn display<'a>(&'a self, symbols: &'a SymbolTable) -> QuadDisplay<'a> {
        QuadDisplay {
            quad: self,
            symbols,
        }
    }
}

impl QuadDisplay<'_> {
    fn sym(&self, id: SymbolId) -> String {
        self.symbols.name(id)
    }

    fn op(&self, op: &Operand) -> String {
        match op {
            Operand::Symbol(id) => self.sym(*id),
            Operand::Const(value) => value.to_string(),
        }
    }
}

impl fmt::Display for QuadDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quad {
            Quad::Assign { op, dst, lhs, rhs } => write!(
                f,
                "{} := {} {} {}",
                self.sym(*dst),
                self.op(lhs),
                op,
                self.op(rhs)
            ),
            Quad::Unary { op, dst, src } => {
                write!(f, "{} := {}{}", self.sym(*dst), op, self.op(src))
            }
            Quad::Copy { dst, src } => write!(f, "{} := {}", self.sym(*dst), self.op(src)),
            Quad::ArrayLookup { dst, array, index } => write!(
                f,
                "{} := {}[{}]",
                self.sym(*dst),
                self.sym(*array),
                self.op(index)
            ),
            Quad::ArrayAssign {
                array,
                index,
                value,
            } => write!(
                f,
                "{}[{}] := {}",
                self.sym(*array),
                self.op(index),
                self.op(value)
            ),
            Quad::ArrayLength { dst, array } => {
                write!(f, "{} := length {}", self.sym(*dst), self.sym(*array))
            }
            Quad::NewArray { dst, len } => {
                write!(f, "{} := new int, {}", self.sym(*dst), self.op(len))
            }
            Quad::NewObject { dst, class } => write!(f, "{} := new {}", self.sym(*dst), class),
            Quad::Param { arg } => write!(f, "param {}", self.op(arg)),
            Quad::Call {
                dst,
                method,
                arg_count,
            } => {
                if let Some(dst) = dst {
                    write!(f, "{} := ", self.sym(*dst))?;
                }
                write!(f, "call {}, {}", self.sym(*method), arg_count)
            }
            Quad::CondJump { cond, target } => write!(f, "iffalse {} goto {}", self.op(cond), target),
            Quad::Jump { target } => write!(f, "goto {}", target),
            Quad::Label { name, .. } => write!(f, "{}:", name),
            Quad::Return { val: Some(val) } => write!(f, "return {}", self.op(val)),
            Quad::Return { val: None } => f.write_str("return"),
        }
    }
}
