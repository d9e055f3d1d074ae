//! Three-address intermediate representation consumed by the backend
//!
//! The IR is produced upstream (IR generation and the IR optimizer) and is
//! handed to the backend as a flat list of quadruples per program:
//! - Symbols are opaque ids allocated once in a [`SymbolTable`]
//! - Operands are either symbols or integer constants
//! - Procedure boundaries are marked by labels carrying a [`MethodEntry`]

use std::fmt;

mod display;
mod inst_impl;

pub use display::QuadDisplay;

/// Symbol identifier - identity key for every map and set in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// What a symbol stands for in the source program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Local variable declared in a method body
    Local,
    /// Formal parameter
    Param,
    /// Compiler-generated temporary
    Temp,
    /// Instance field, accessed through the receiver
    Field,
    /// Method (target of calls and procedure entries)
    Method,
    /// The implicit `this` of an instance method
    Receiver,
    /// Class declaration; owns its fields
    Class,
}

#[derive(Debug, Clone)]
pub struct SymbolInfo {
    pub name: String,
    pub kind: SymbolKind,
    /// Declaring class of a field, or superclass of a class
    pub owner: Option<SymbolId>,
}

/// Arena of symbols declared by semantic analysis and IR generation
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<SymbolInfo>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new symbol. Equal names still produce distinct symbols.
    pub fn declare(&mut self, name: impl Into<String>, kind: SymbolKind) -> SymbolId {
        self.push(name.into(), kind, None)
    }

    /// Declare a class, optionally extending `parent`
    pub fn declare_class(&mut self, name: impl Into<String>, parent: Option<SymbolId>) -> SymbolId {
        self.push(name.into(), SymbolKind::Class, parent)
    }

    /// Declare an instance field of `class`
    pub fn declare_field(&mut self, name: impl Into<String>, class: SymbolId) -> SymbolId {
        self.push(name.into(), SymbolKind::Field, Some(class))
    }

    fn push(&mut self, name: String, kind: SymbolKind, owner: Option<SymbolId>) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(SymbolInfo { name, kind, owner });
        id
    }

    pub fn get(&self, id: SymbolId) -> Option<&SymbolInfo> {
        self.symbols.get(id.0 as usize)
    }

    /// Display name of a symbol, falling back to its id
    pub fn name(&self, id: SymbolId) -> String {
        match self.get(id) {
            Some(info) => info.name.clone(),
            None => id.to_string(),
        }
    }

    pub fn kind(&self, id: SymbolId) -> Option<SymbolKind> {
        self.get(id).map(|info| info.kind)
    }

    pub fn owner(&self, id: SymbolId) -> Option<SymbolId> {
        self.get(id).and_then(|info| info.owner)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &SymbolInfo)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, info)| (SymbolId(i as u32), info))
    }
}

/// Source operand of a quadruple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    Symbol(SymbolId),
    /// Integer or boolean literal (booleans are 0/1)
    Const(i64),
}

impl Operand {
    pub fn symbol(&self) -> Option<SymbolId> {
        match self {
            Operand::Symbol(sym) => Some(*sym),
            Operand::Const(_) => None,
        }
    }

    pub fn is_const(&self) -> bool {
        matches!(self, Operand::Const(_))
    }
}

impl From<SymbolId> for Operand {
    fn from(sym: SymbolId) -> Self {
        Operand::Symbol(sym)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    And,
    Lt,
}

impl fmt::Display for BinOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOpKind::Add => "+",
            BinOpKind::Sub => "-",
            BinOpKind::Mul => "*",
            BinOpKind::And => "&&",
            BinOpKind::Lt => "<",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOpKind {
    Not,
    Neg,
}

impl fmt::Display for UnaryOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOpKind::Not => f.write_str("!"),
            UnaryOpKind::Neg => f.write_str("-"),
        }
    }
}

/// Procedure-entry marker carried by a method label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodEntry {
    pub method: SymbolId,
    /// Formal parameters in declaration order
    pub params: Vec<SymbolId>,
    /// `this`, absent for the static entry point
    pub receiver: Option<SymbolId>,
}

/// One three-address statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quad {
    /// dst := lhs op rhs
    Assign {
        op: BinOpKind,
        dst: SymbolId,
        lhs: Operand,
        rhs: Operand,
    },
    /// dst := op src
    Unary {
        op: UnaryOpKind,
        dst: SymbolId,
        src: Operand,
    },
    /// dst := src
    Copy { dst: SymbolId, src: Operand },
    /// dst := array[index]
    ArrayLookup {
        dst: SymbolId,
        array: SymbolId,
        index: Operand,
    },
    /// array[index] := value (defines nothing)
    ArrayAssign {
        array: SymbolId,
        index: Operand,
        value: Operand,
    },
    /// dst := length array
    ArrayLength { dst: SymbolId, array: SymbolId },
    /// dst := new int[len]
    NewArray { dst: SymbolId, len: Operand },
    /// dst := new class
    NewObject { dst: SymbolId, class: String },
    /// param arg
    Param { arg: Operand },
    /// dst := call method, arg_count
    Call {
        dst: Option<SymbolId>,
        method: SymbolId,
        arg_count: usize,
    },
    /// iffalse cond goto target
    CondJump { cond: Operand, target: String },
    /// goto target
    Jump { target: String },
    /// name: (procedure entry when `entry` is set)
    Label {
        name: String,
        entry: Option<MethodEntry>,
    },
    /// return val
    Return { val: Option<Operand> },
}

/// Flat IR for a whole compilation unit
#[derive(Debug, Clone, Default)]
pub struct IrProgram {
    pub symbols: SymbolTable,
    pub quads: Vec<Quad>,
}

impl IrProgram {
    pub fn new(symbols: SymbolTable, quads: Vec<Quad>) -> Self {
        Self { symbols, quads }
    }
}
