//! Control Flow Graph construction and analysis
//!
//! This module partitions the flat IR of a program into one CFG per procedure
//! and provides the analyses the register allocator and the IR optimizer need:
//! - Predecessor/successor relationships
//! - Per-block def/use sets and liveness (live-in/live-out)
//! - Dominator tree and loop depth
//! - Statement lookups and "used before redefined" queries

use std::collections::{HashMap, HashSet};
use std::fmt;

use super::CompileError;
use super::ir::{IrProgram, MethodEntry, Quad, SymbolId, SymbolTable};

mod analysis;
mod builder;
mod display;
mod query;

pub use display::{CfgDisplay, LivenessDisplay};
pub(crate) use display::write_symbol_set;
pub use query::{contains_usage_before_def, find_statement, reducible_statements};

/// Basic block identifier, unique within one CFG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// A straight-line run of statements; only the last one may transfer control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    pub id: BlockId,
    /// Index of the first statement in the program's flat statement list
    pub start: usize,
    pub quads: Vec<Quad>,
}

impl BasicBlock {
    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Label this block starts with, if any
    pub fn label(&self) -> Option<&str> {
        match self.quads.first() {
            Some(Quad::Label { name, .. }) => Some(name),
            _ => None,
        }
    }

    pub fn terminator(&self) -> Option<&Quad> {
        self.quads.last()
    }

    /// Does this block hold the statement at program index `stmt`
    pub fn contains(&self, stmt: usize) -> bool {
        stmt >= self.start && stmt < self.start + self.quads.len()
    }

    /// Position of program statement `stmt` inside this block
    pub fn index_of(&self, stmt: usize) -> Option<usize> {
        self.contains(stmt).then(|| stmt - self.start)
    }

    /// Statements paired with their program index
    pub fn statements(&self) -> impl Iterator<Item = (usize, &Quad)> {
        self.quads
            .iter()
            .enumerate()
            .map(move |(i, quad)| (self.start + i, quad))
    }
}

/// Control Flow Graph of one procedure
#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    /// Name of the procedure-entry label
    pub name: String,
    /// Procedure-entry marker that opened this CFG
    pub method: MethodEntry,
    /// Entry block
    pub entry: BlockId,
    /// Blocks in program order, indexed by `BlockId`
    pub blocks: Vec<BasicBlock>,
    /// Successors for each block
    pub successors: HashMap<BlockId, Vec<BlockId>>,
    /// Predecessors for each block
    pub predecessors: HashMap<BlockId, Vec<BlockId>>,
    /// Immediate dominator for each reachable block except the entry
    pub idom: HashMap<BlockId, BlockId>,
    /// Reverse post-order traversal of reachable blocks
    pub rpo: Vec<BlockId>,
    /// Post-order traversal of reachable blocks
    pub post_order: Vec<BlockId>,
}

/// Per-block def/use sets
#[derive(Debug, Clone)]
pub struct BlockDefUse {
    /// Symbols written somewhere in the block
    pub defs: HashMap<BlockId, HashSet<SymbolId>>,
    /// Symbols read before any write inside the block
    pub uses: HashMap<BlockId, HashSet<SymbolId>>,
}

/// Liveness analysis results
#[derive(Debug, Clone)]
pub struct LivenessInfo {
    /// Symbols live at the start of each block
    pub live_in: HashMap<BlockId, HashSet<SymbolId>>,
    /// Symbols live at the end of each block
    pub live_out: HashMap<BlockId, HashSet<SymbolId>>,
    pub def_use: BlockDefUse,
    /// Full passes over the blocks until nothing changed
    pub iterations: usize,
}

/// Loop information
#[derive(Debug, Clone)]
pub struct LoopInfo {
    /// Natural loops: header -> set of blocks in loop
    pub loops: HashMap<BlockId, HashSet<BlockId>>,
    /// Loop depth for each block (0 = not in a loop)
    pub loop_depth: HashMap<BlockId, usize>,
}

impl ControlFlowGraph {
    /// Partition a program's flat statement list into one CFG per procedure
    pub fn build_all(quads: &[Quad]) -> Result<Vec<ControlFlowGraph>, CompileError> {
        builder::CfgBuilder::build(quads)
    }

    pub fn build_program(program: &IrProgram) -> Result<Vec<ControlFlowGraph>, CompileError> {
        Self::build_all(&program.quads)
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0 as usize]
    }

    pub fn has_block(&self, id: BlockId) -> bool {
        (id.0 as usize) < self.blocks.len()
    }

    pub fn successors(&self, id: BlockId) -> &[BlockId] {
        self.successors.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn predecessors(&self, id: BlockId) -> &[BlockId] {
        self.predecessors.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Receiver of the procedure, absent for the static entry point
    pub fn receiver(&self) -> Option<SymbolId> {
        self.method.receiver
    }

    /// Total number of statements across all blocks
    pub fn statement_count(&self) -> usize {
        self.blocks.iter().map(BasicBlock::len).sum()
    }
}
