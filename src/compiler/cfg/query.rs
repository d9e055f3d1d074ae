//! Statement-level queries over a built CFG
//!
//! These walk the same def/use facts as liveness, forward along successors
//! with an explicit worklist and a visited bitset sized to the block count.

use super::*;

impl ControlFlowGraph {
    /// Block holding the statement at program index `stmt`
    pub fn block_of(&self, stmt: usize) -> Option<BlockId> {
        self.blocks.iter().find(|b| b.contains(stmt)).map(|b| b.id)
    }

    /// Statement at program index `stmt`, if this CFG owns it
    pub fn statement(&self, stmt: usize) -> Option<&Quad> {
        let block = self.block(self.block_of(stmt)?);
        block.index_of(stmt).map(|i| &block.quads[i])
    }
}

/// Owning CFG (index into `cfgs`) and block of a program statement
pub fn find_statement(cfgs: &[ControlFlowGraph], stmt: usize) -> Option<(usize, BlockId)> {
    cfgs.iter()
        .enumerate()
        .find_map(|(i, cfg)| cfg.block_of(stmt).map(|block| (i, block)))
}

/// Is `sym` read after statement `stmt` on some path before being redefined
pub fn contains_usage_before_def(cfg: &ControlFlowGraph, stmt: usize, sym: SymbolId) -> bool {
    let Some(start) = cfg.block_of(stmt) else {
        return false;
    };

    for (_, quad) in cfg.block(start).statements().filter(|(i, _)| *i > stmt) {
        // A statement that both reads and writes still reads first
        if quad.is_usage_of(sym) {
            return true;
        }
        if quad.is_def_of(sym) {
            return false;
        }
    }

    let mut visited = vec![false; cfg.blocks.len()];
    let mut worklist: Vec<BlockId> = cfg.successors(start).to_vec();

    while let Some(block) = worklist.pop() {
        if std::mem::replace(&mut visited[block.0 as usize], true) {
            continue;
        }

        let mut redefined = false;
        for quad in &cfg.block(block).quads {
            if quad.is_usage_of(sym) {
                return true;
            }
            if quad.is_def_of(sym) {
                redefined = true;
                break;
            }
        }

        if !redefined {
            worklist.extend(
                cfg.successors(block)
                    .iter()
                    .filter(|succ| !visited[succ.0 as usize]),
            );
        }
    }

    false
}

/// Statements the definition at `stmt` reaches as the only definition of its
/// target, in program order. Empty when `stmt` defines nothing.
pub fn reducible_statements(cfg: &ControlFlowGraph, stmt: usize) -> Vec<usize> {
    let mut reducibles = Vec::new();
    let Some(start) = cfg.block_of(stmt) else {
        return reducibles;
    };
    let Some(sym) = cfg.statement(stmt).and_then(|q| q.defs().first().copied()) else {
        return reducibles;
    };
    let conflicting = |idx: usize, quad: &Quad| idx != stmt && quad.is_def_of(sym);

    for (idx, quad) in cfg.block(start).statements().filter(|(i, _)| *i > stmt) {
        if conflicting(idx, quad) {
            return reducibles;
        }
        reducibles.push(idx);
    }

    let mut visited = vec![false; cfg.blocks.len()];
    visited[start.0 as usize] = true;
    let mut worklist: Vec<BlockId> = cfg.successors(start).to_vec();

    while let Some(block) = worklist.pop() {
        if std::mem::replace(&mut visited[block.0 as usize], true) {
            continue;
        }
        if other_definition_reaches(cfg, block, start, &conflicting) {
            continue;
        }

        let mut redefined = false;
        for (idx, quad) in cfg.block(block).statements() {
            if conflicting(idx, quad) {
                redefined = true;
                break;
            }
            reducibles.push(idx);
        }

        if !redefined {
            worklist.extend(
                cfg.successors(block)
                    .iter()
                    .filter(|succ| !visited[succ.0 as usize]),
            );
        }
    }

    reducibles.sort_unstable();
    reducibles
}

/// Can control reach the top of `block` without passing through `def_block`,
/// either from the procedure entry or from another definition
fn other_definition_reaches<F>(
    cfg: &ControlFlowGraph,
    block: BlockId,
    def_block: BlockId,
    conflicting: &F,
) -> bool
where
    F: Fn(usize, &Quad) -> bool,
{
    if block == cfg.entry {
        return true;
    }

    let mut visited = vec![false; cfg.blocks.len()];
    visited[def_block.0 as usize] = true;
    let mut worklist: Vec<BlockId> = cfg.predecessors(block).to_vec();

    while let Some(pred) = worklist.pop() {
        if std::mem::replace(&mut visited[pred.0 as usize], true) {
            continue;
        }
        if pred == cfg.entry {
            return true;
        }
        if cfg
            .block(pred)
            .statements()
            .any(|(idx, quad)| conflicting(idx, quad))
        {
            return true;
        }
        worklist.extend(cfg.predecessors(pred).iter().copied());
    }

    false
}
