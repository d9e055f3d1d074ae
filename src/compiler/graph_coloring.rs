//! Graph Coloring Register Allocator (Chaitin-Briggs with conservative coalescing)
//!
//! Colors the interference graph of one procedure with at most K colors.
//! A color is a register index in `[0, K)`; mapping it to a machine register
//! is the code generator's job.
//!
//! ## Algorithm Overview
//!
//! 1. **Build**: Construct the interference graph from block liveness
//! 2. **Simplify**: Remove low-degree non-move-related nodes (push to stack)
//! 3. **Coalesce**: Merge move-related nodes using the Briggs criterion
//! 4. **Freeze**: Give up coalescing on some low-degree move-related node
//! 5. **Spill**: Remove some node as a potential spill (push to stack anyway)
//! 6. **Select**: Pop from stack and assign the lowest free color
//!
//! A node that still has no free color in select is a true spill. There is
//! no spill-code rewriting, so a true spill fails the whole compilation.
//!
//! ## Graph representation
//!
//! Nodes live in an arena indexed by [`NodeId`]. Removing a node during
//! simplify or spill only marks it inactive, so its edges are still there
//! when select needs them. Coalesced nodes are remembered by their
//! representative and receive its color.
//!
//! ## References
//!
//! - Chaitin, G. "Register Allocation & Spilling via Graph Coloring" (1982)
//! - Briggs, P. et al. "Improvements to Graph Coloring Register Allocation" (1994)
//! - Appel, A. "Modern Compiler Implementation" Chapter 11

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use super::CompileError;
use super::cfg::{ControlFlowGraph, LivenessInfo, LoopInfo};
use super::config::{AllocConfig, SpillPolicy};
use super::ir::{SymbolId, SymbolTable};
use super::layout::ObjectLayout;

/// Interference graph node identifier, stable for the life of the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Where a node is in the reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    /// Still in the graph
    Active,
    /// Removed by simplify or spill, waiting on the select stack
    OnStack,
    /// Merged into another node
    Coalesced,
}

#[derive(Debug, Clone)]
struct GraphNode {
    symbol: SymbolId,
    /// Interference neighbors (active or not)
    adj: BTreeSet<NodeId>,
    /// Move neighbors
    moves: BTreeSet<NodeId>,
    move_related: bool,
    state: NodeState,
    /// Representative this node was merged into
    alias: Option<NodeId>,
    /// Every node merged into this one, transitively
    coalesced: Vec<NodeId>,
}

/// Interference graph for register allocation
#[derive(Debug, Clone, Default)]
pub struct InterferenceGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<SymbolId, NodeId>,
}

/// Result of graph coloring register allocation
#[derive(Debug, Clone, Default)]
pub struct ColoringResult {
    /// Symbol -> color, including coalesced aliases
    pub coloring: HashMap<SymbolId, usize>,
    /// Number of coalesced move pairs
    pub coalesced_moves: usize,
    /// Symbols removed by the spill phase
    pub potential_spills: Vec<SymbolId>,
    /// Symbols left without a color
    pub spilled: Vec<SymbolId>,
}

impl ColoringResult {
    pub fn color_of(&self, sym: SymbolId) -> Option<usize> {
        self.coloring.get(&sym).copied()
    }

    pub fn is_complete(&self) -> bool {
        self.spilled.is_empty()
    }
}

/// The main graph coloring allocator
pub struct GraphColoringAllocator {
    /// Number of available registers (K)
    k: usize,
    spill_policy: SpillPolicy,
    /// The interference graph, reduced in place
    graph: InterferenceGraph,
    /// Select stack: nodes removed during simplify and spill
    select_stack: Vec<NodeId>,
    /// Nodes pushed by the spill phase
    potential_spills: HashSet<NodeId>,
    /// Final coloring
    color: HashMap<NodeId, usize>,
    /// Nodes that found no color in select
    spilled_nodes: Vec<NodeId>,
    /// Spill cost for each node (uses and defs, weighted by loop depth)
    spill_cost: HashMap<NodeId, f64>,
    coalesced_moves: usize,
}

#[path = "graph_coloring/graph.rs"]
mod graph;

#[path = "graph_coloring/build.rs"]
mod build;

#[path = "graph_coloring/worklist.rs"]
mod worklist;

#[path = "graph_coloring/coalesce.rs"]
mod coalesce;

#[path = "graph_coloring/coloring.rs"]
mod coloring;

#[path = "graph_coloring/display.rs"]
mod display;

pub use display::{ColoringDisplay, GraphDisplay};

impl GraphColoringAllocator {
    /// Create an allocator that owns `graph`
    pub fn new(graph: InterferenceGraph, config: &AllocConfig) -> Self {
        Self {
            k: config.registers,
            spill_policy: config.spill_policy,
            graph,
            select_stack: Vec::new(),
            potential_spills: HashSet::new(),
            color: HashMap::new(),
            spilled_nodes: Vec::new(),
            spill_cost: HashMap::new(),
            coalesced_moves: 0,
        }
    }

    pub fn graph(&self) -> &InterferenceGraph {
        &self.graph
    }

    /// Run the full allocation algorithm
    pub fn allocate(&mut self) -> ColoringResult {
        // Main loop: simplify, coalesce, freeze, or select spill
        while !self.graph.is_empty() {
            if self.simplify() {
                continue;
            }
            if self.coalesce() {
                continue;
            }
            if self.freeze() {
                continue;
            }
            self.select_spill();
        }

        self.assign_colors();
        self.result()
    }

    fn result(&self) -> ColoringResult {
        let mut result = ColoringResult {
            coalesced_moves: self.coalesced_moves,
            ..ColoringResult::default()
        };

        for node in self.graph.node_ids() {
            if let Some(&color) = self.color.get(&node) {
                result.coloring.insert(self.graph.symbol(node), color);
            }
        }

        let mut potential: Vec<NodeId> = self.potential_spills.iter().copied().collect();
        potential.sort_unstable();
        result.potential_spills = potential.into_iter().map(|n| self.graph.symbol(n)).collect();
        result.spilled = self
            .spilled_nodes
            .iter()
            .map(|&n| self.graph.symbol(n))
            .collect();
        result
    }
}

/// Convenience function: liveness, interference and coloring for one procedure
///
/// A true spill is reported as [`CompileError::RegisterSpill`].
pub fn allocate_registers<L>(
    cfg: &ControlFlowGraph,
    symbols: &SymbolTable,
    layout: &L,
    config: &AllocConfig,
) -> Result<ColoringResult, CompileError>
where
    L: ObjectLayout + ?Sized,
{
    config.validate()?;

    let liveness = LivenessInfo::compute(cfg);
    tracing::trace!("\n{}", liveness.display(cfg, symbols));

    let graph = InterferenceGraph::build(cfg, &liveness, layout, config.pin_receiver);
    tracing::debug!(
        procedure = %cfg.name,
        nodes = graph.len(),
        "built interference graph"
    );
    tracing::trace!("\n{}", graph.display(symbols));

    let mut allocator = GraphColoringAllocator::new(graph, config);
    if config.spill_policy == SpillPolicy::LowestCost {
        let loops = LoopInfo::compute(cfg);
        allocator.compute_spill_costs(cfg, &loops);
    }

    let result = allocator.allocate();
    if let Some(&first) = result.spilled.first() {
        tracing::warn!(
            procedure = %cfg.name,
            symbol = %symbols.name(first),
            "true spill"
        );
        return Err(CompileError::RegisterSpill {
            symbol: symbols.name(first),
            procedure: cfg.name.clone(),
            spilled: result.spilled.len(),
        });
    }

    Ok(result)
}
