//! MiniJava compiler backend core
//!
//! Lowers the three-address IR of a small Java-like language towards machine
//! code. This crate holds the flow analysis and register allocation stages:
//! control-flow graphs, liveness, interference graphs and a Chaitin-Briggs
//! graph-coloring allocator. Parsing, semantic analysis, IR generation and
//! instruction emission live elsewhere.

pub mod compiler;

pub use compiler::{
    AllocConfig, CompileError, ProcedureAllocation, ProgramAllocation, SpillPolicy,
    allocate_program,
};
