//! Backend core: flow analysis and register allocation
//!
//! The pipeline runs once per procedure, strictly in this order:
//!
//! 1. **CFG**: partition the flat IR into basic blocks and wire edges
//! 2. **Liveness**: per-block def/use sets and the live-in/live-out fixpoint
//! 3. **Interference**: build the interference graph with move edges
//! 4. **Coloring**: simplify/coalesce/freeze/spill/select with K colors
//!
//! Procedures are allocated independently of one another. The resulting
//! symbol-to-register map is consumed by the code generator.

use std::collections::HashMap;

use thiserror::Error;

pub mod cfg;
pub mod config;
pub mod graph_coloring;
pub mod ir;
pub mod layout;

pub use cfg::{BasicBlock, BlockDefUse, BlockId, ControlFlowGraph, LivenessInfo, LoopInfo};
pub use config::{AllocConfig, SpillPolicy};
pub use graph_coloring::{
    ColoringResult, GraphColoringAllocator, InterferenceGraph, NodeId, allocate_registers,
};
pub use ir::{
    BinOpKind, IrProgram, MethodEntry, Operand, Quad, SymbolId, SymbolKind, SymbolTable,
    UnaryOpKind,
};
pub use layout::{ObjectLayout, ObjectLayoutManager};

/// Errors that can occur in the backend
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Malformed IR: jump to undefined label '{label}' in {procedure}")]
    UnresolvedLabel { label: String, procedure: String },

    #[error("Malformed IR: statement {index} precedes any procedure entry")]
    MissingProcedureEntry { index: usize },

    #[error("Malformed IR: label '{label}' defined twice in {procedure}")]
    DuplicateLabel { label: String, procedure: String },

    #[error("Malformed IR: class {class} is laid out before its superclass {parent}")]
    UnknownParentClass { class: String, parent: String },

    #[error("Register allocation failed in {procedure}: no register left for {symbol} ({spilled} spilled)")]
    RegisterSpill {
        symbol: String,
        procedure: String,
        spilled: usize,
    },

    #[error("Invalid allocator configuration: {0}")]
    InvalidConfig(String),
}

impl CompileError {
    /// Upstream contract violations, as opposed to allocation or config failures
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            CompileError::UnresolvedLabel { .. }
                | CompileError::MissingProcedureEntry { .. }
                | CompileError::DuplicateLabel { .. }
                | CompileError::UnknownParentClass { .. }
        )
    }
}

/// Register assignment of one procedure
#[derive(Debug)]
pub struct ProcedureAllocation {
    pub name: String,
    pub method: SymbolId,
    pub result: ColoringResult,
}

/// Register assignments of a whole compilation unit
#[derive(Debug, Default)]
pub struct ProgramAllocation {
    pub procedures: Vec<ProcedureAllocation>,
}

impl ProgramAllocation {
    pub fn procedure(&self, name: &str) -> Option<&ProcedureAllocation> {
        self.procedures.iter().find(|p| p.name == name)
    }

    /// Register of a symbol in whichever procedure it belongs to
    pub fn color_of(&self, sym: SymbolId) -> Option<usize> {
        self.procedures
            .iter()
            .find_map(|p| p.result.coloring.get(&sym).copied())
    }

    /// All assignments merged; symbols never span procedures
    pub fn coloring(&self) -> HashMap<SymbolId, usize> {
        self.procedures
            .iter()
            .flat_map(|p| p.result.coloring.iter().map(|(s, c)| (*s, *c)))
            .collect()
    }
}

/// Run the whole backend core over a program
///
/// Fails on malformed IR or on the first procedure that cannot be colored;
/// there is no spill-code rewriting.
pub fn allocate_program<L>(
    program: &IrProgram,
    layout: &L,
    config: &AllocConfig,
) -> Result<ProgramAllocation, CompileError>
where
    L: ObjectLayout + ?Sized,
{
    config.validate()?;
    let cfgs = ControlFlowGraph::build_program(program)?;

    let mut allocation = ProgramAllocation::default();
    for cfg in &cfgs {
        let _span = tracing::debug_span!("procedure", name = %cfg.name).entered();
        tracing::trace!("\n{}", cfg.display(&program.symbols));

        let result = allocate_registers(cfg, &program.symbols, layout, config)?;
        tracing::trace!("\n{}", result.display(&program.symbols));
        allocation.procedures.push(ProcedureAllocation {
            name: cfg.name.clone(),
            method: cfg.method.method,
            result,
        });
    }

    Ok(allocation)
}
