use super::*;

impl Quad {
    /// Returns true if this statement may transfer control
    pub fn is_control_transfer(&self) -> bool {
        matches!(
            self,
            Quad::Jump { .. } | Quad::CondJump { .. } | Quad::Return { .. }
        )
    }

    pub fn is_label(&self) -> bool {
        matches!(self, Quad::Label { .. })
    }

    /// Procedure-entry marker carried by this statement, if any
    pub fn method_entry(&self) -> Option<&MethodEntry> {
        match self {
            Quad::Label { entry, .. } => entry.as_ref(),
            _ => None,
        }
    }

    /// Label jumped to by this statement
    pub fn jump_target(&self) -> Option<&str> {
        match self {
            Quad::Jump { target } | Quad::CondJump { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Symbols written by this statement
    pub fn defs(&self) -> Vec<SymbolId> {
        match self {
            Quad::Assign { dst, .. }
            | Quad::Unary { dst, .. }
            | Quad::Copy { dst, .. }
            | Quad::ArrayLookup { dst, .. }
            | Quad::ArrayLength { dst, .. }
            | Quad::NewArray { dst, .. }
            | Quad::NewObject { dst, .. } => vec![*dst],
            Quad::Call { dst, .. } => dst.iter().copied().collect(),
            Quad::ArrayAssign { .. }
            | Quad::Param { .. }
            | Quad::CondJump { .. }
            | Quad::Jump { .. }
            | Quad::Label { .. }
            | Quad::Return { .. } => Vec::new(),
        }
    }

    /// Symbols read by this statement. Constants are never reported.
    pub fn uses(&self) -> Vec<SymbolId> {
        let mut uses = Vec::new();
        let add = |uses: &mut Vec<SymbolId>, op: &Operand| {
            if let Operand::Symbol(sym) = op {
                uses.push(*sym);
            }
        };

        match self {
            Quad::Assign { lhs, rhs, .. } => {
                add(&mut uses, lhs);
                add(&mut uses, rhs);
            }
            Quad::Unary { src, .. } | Quad::Copy { src, .. } => add(&mut uses, src),
            Quad::ArrayLookup { array, index, .. } => {
                uses.push(*array);
                add(&mut uses, index);
            }
            // The stored value is read, not written
            Quad::ArrayAssign {
                array,
                index,
                value,
            } => {
                uses.push(*array);
                add(&mut uses, index);
                add(&mut uses, value);
            }
            Quad::ArrayLength { array, .. } => uses.push(*array),
            Quad::NewArray { len, .. } => add(&mut uses, len),
            Quad::Param { arg } => add(&mut uses, arg),
            Quad::CondJump { cond, .. } => add(&mut uses, cond),
            Quad::Return { val } => {
                if let Some(val) = val {
                    add(&mut uses, val);
                }
            }
            Quad::NewObject { .. } | Quad::Call { .. } | Quad::Jump { .. } | Quad::Label { .. } => {
            }
        }

        uses
    }

    /// (dst, src) for a register-to-register copy
    pub fn move_pair(&self) -> Option<(SymbolId, SymbolId)> {
        match self {
            Quad::Copy {
                dst,
                src: Operand::Symbol(src),
            } if dst != src => Some((*dst, *src)),
            _ => None,
        }
    }

    /// dst := constant
    pub fn is_constant_copy(&self) -> bool {
        matches!(
            self,
            Quad::Copy {
                src: Operand::Const(_),
                ..
            }
        )
    }

    pub fn is_def_of(&self, sym: SymbolId) -> bool {
        self.defs().contains(&sym)
    }

    pub fn is_usage_of(&self, sym: SymbolId) -> bool {
        self.uses().contains(&sym)
    }
}
