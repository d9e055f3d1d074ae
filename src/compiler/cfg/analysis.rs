use std::collections::VecDeque;

use super::*;

impl ControlFlowGraph {
    /// Depth-first post-order from the entry block, using an explicit stack
    pub(super) fn compute_post_order(&mut self) {
        self.post_order.clear();
        self.rpo.clear();
        if self.blocks.is_empty() {
            return;
        }

        let mut visited = vec![false; self.blocks.len()];
        let mut post_order = Vec::with_capacity(self.blocks.len());
        let mut stack: Vec<(BlockId, usize)> = vec![(self.entry, 0)];
        visited[self.entry.0 as usize] = true;

        while let Some(top) = stack.last_mut() {
            let (block, next) = *top;
            let succs = self.successors(block);
            if next < succs.len() {
                top.1 += 1;
                let succ = succs[next];
                if !visited[succ.0 as usize] {
                    visited[succ.0 as usize] = true;
                    stack.push((succ, 0));
                }
            } else {
                post_order.push(block);
                stack.pop();
            }
        }

        self.rpo = post_order.iter().rev().copied().collect();
        self.post_order = post_order;
    }

    pub(super) fn compute_dominators(&mut self) {
        if self.blocks.is_empty() {
            return;
        }
        self.idom = compute_idom(self.blocks.len(), &self.predecessors, &self.rpo);
    }

    /// Check if block A dominates block B
    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        if a == b {
            return true;
        }
        let mut current = b;
        while let Some(&dom) = self.idom.get(&current) {
            if dom == a {
                return true;
            }
            if dom == current {
                break;
            }
            current = dom;
        }
        false
    }

    /// Blocks reachable from the entry
    pub fn reachable_blocks(&self) -> HashSet<BlockId> {
        self.rpo.iter().copied().collect()
    }
}

impl BlockDefUse {
    pub fn compute(cfg: &ControlFlowGraph) -> Self {
        let mut info = BlockDefUse {
            defs: HashMap::new(),
            uses: HashMap::new(),
        };

        for block in &cfg.blocks {
            let mut defs = HashSet::new();
            let mut uses = HashSet::new();

            for quad in &block.quads {
                // Operands are read before the result is written
                for sym in quad.uses() {
                    if !defs.contains(&sym) {
                        uses.insert(sym);
                    }
                }
                defs.extend(quad.defs());
            }

            info.defs.insert(block.id, defs);
            info.uses.insert(block.id, uses);
        }

        info
    }

    pub fn defs_of(&self, block: BlockId) -> impl Iterator<Item = SymbolId> + '_ {
        self.defs.get(&block).into_iter().flatten().copied()
    }

    pub fn uses_of(&self, block: BlockId) -> impl Iterator<Item = SymbolId> + '_ {
        self.uses.get(&block).into_iter().flatten().copied()
    }
}

impl LivenessInfo {
    /// Iterate the backward dataflow equations to a fixpoint
    pub fn compute(cfg: &ControlFlowGraph) -> Self {
        let def_use = BlockDefUse::compute(cfg);
        let mut info = LivenessInfo {
            live_in: HashMap::new(),
            live_out: HashMap::new(),
            def_use,
            iterations: 0,
        };

        for block in &cfg.blocks {
            info.live_in.insert(block.id, HashSet::new());
            info.live_out.insert(block.id, HashSet::new());
        }

        let mut changed = true;
        while changed {
            changed = false;
            info.iterations += 1;

            // Reverse program order converges fastest for a backward problem
            for block in cfg.blocks.iter().rev() {
                let live_out = info.equation_out(cfg, block.id);
                let live_in = info.equation_in(block.id, &live_out);

                if info.live_in.get(&block.id) != Some(&live_in)
                    || info.live_out.get(&block.id) != Some(&live_out)
                {
                    changed = true;
                    info.live_in.insert(block.id, live_in);
                    info.live_out.insert(block.id, live_out);
                }
            }
        }

        tracing::debug!(
            procedure = %cfg.name,
            blocks = cfg.blocks.len(),
            iterations = info.iterations,
            "liveness converged"
        );
        info
    }

    /// out(B) = union of in(S) over successors S
    fn equation_out(&self, cfg: &ControlFlowGraph, block: BlockId) -> HashSet<SymbolId> {
        let mut live_out = HashSet::new();
        for succ in cfg.successors(block) {
            if let Some(succ_in) = self.live_in.get(succ) {
                live_out.extend(succ_in.iter().copied());
            }
        }
        live_out
    }

    /// in(B) = use(B) + (out(B) - def(B))
    fn equation_in(&self, block: BlockId, live_out: &HashSet<SymbolId>) -> HashSet<SymbolId> {
        let defs = self.def_use.defs.get(&block);
        let mut live_in: HashSet<SymbolId> = live_out
            .iter()
            .copied()
            .filter(|sym| !defs.is_some_and(|d| d.contains(sym)))
            .collect();
        live_in.extend(self.def_use.uses_of(block));
        live_in
    }

    /// First block whose sets violate the dataflow equations, if any
    pub fn check_fixpoint(&self, cfg: &ControlFlowGraph) -> Option<BlockId> {
        let empty = HashSet::new();
        cfg.blocks.iter().map(|b| b.id).find(|&id| {
            let out = self.equation_out(cfg, id);
            let live_in = self.equation_in(id, &out);
            self.live_out.get(&id).unwrap_or(&empty) != &out
                || self.live_in.get(&id).unwrap_or(&empty) != &live_in
        })
    }

    pub fn is_live_in(&self, block: BlockId, sym: SymbolId) -> bool {
        self.live_in.get(&block).is_some_and(|s| s.contains(&sym))
    }

    pub fn is_live_out(&self, block: BlockId, sym: SymbolId) -> bool {
        self.live_out.get(&block).is_some_and(|s| s.contains(&sym))
    }
}

impl LoopInfo {
    pub fn compute(cfg: &ControlFlowGraph) -> Self {
        let mut info = LoopInfo {
            loops: HashMap::new(),
            loop_depth: HashMap::new(),
        };

        for block in &cfg.blocks {
            info.loop_depth.insert(block.id, 0);
        }

        let reachable = cfg.reachable_blocks();
        let mut back_edges: Vec<(BlockId, BlockId)> = Vec::new();
        for block in &cfg.blocks {
            if !reachable.contains(&block.id) {
                continue;
            }
            for &succ in cfg.successors(block.id) {
                if cfg.dominates(succ, block.id) {
                    back_edges.push((block.id, succ));
                }
            }
        }

        for (tail, header) in back_edges {
            let mut loop_blocks = HashSet::new();
            loop_blocks.insert(header);

            let mut worklist = VecDeque::new();
            if tail != header {
                loop_blocks.insert(tail);
                worklist.push_back(tail);
            }

            while let Some(block) = worklist.pop_front() {
                for &pred in cfg.predecessors(block) {
                    if loop_blocks.insert(pred) {
                        worklist.push_back(pred);
                    }
                }
            }

            info.loops.entry(header).or_default().extend(loop_blocks);
        }

        for blocks in info.loops.values() {
            for &block in blocks {
                *info.loop_depth.entry(block).or_insert(0) += 1;
            }
        }

        info
    }

    pub fn depth(&self, block: BlockId) -> usize {
        self.loop_depth.get(&block).copied().unwrap_or(0)
    }
}

/// Cooper-Harvey-Kennedy iterative dominators
///
/// Works on reverse post-order positions: position 0 is the entry, and a
/// dominator always has a smaller position than the blocks it dominates.
fn compute_idom(
    block_count: usize,
    predecessors: &HashMap<BlockId, Vec<BlockId>>,
    rpo: &[BlockId],
) -> HashMap<BlockId, BlockId> {
    let mut position = vec![None; block_count];
    for (pos, block) in rpo.iter().enumerate() {
        position[block.0 as usize] = Some(pos);
    }

    // Immediate dominator of each rpo position, once known
    let mut doms: Vec<Option<usize>> = vec![None; rpo.len()];
    if let Some(entry) = doms.first_mut() {
        *entry = Some(0);
    }

    let mut changed = true;
    while changed {
        changed = false;

        for (pos, block) in rpo.iter().enumerate().skip(1) {
            let mut new_idom = None;
            let preds = predecessors.get(block).map(Vec::as_slice).unwrap_or(&[]);
            for pred in preds {
                // Unreachable predecessors have no position
                let Some(pred_pos) = position[pred.0 as usize] else {
                    continue;
                };
                if doms[pred_pos].is_none() {
                    continue;
                }
                new_idom = Some(match new_idom {
                    None => pred_pos,
                    Some(current) => intersect(&doms, pred_pos, current),
                });
            }

            if new_idom.is_some() && doms[pos] != new_idom {
                doms[pos] = new_idom;
                changed = true;
            }
        }
    }

    doms.iter()
        .enumerate()
        .skip(1)
        .filter_map(|(pos, dom)| dom.map(|d| (rpo[pos], rpo[d])))
        .collect()
}

/// Walk both positions up the dominator tree until they meet
fn intersect(doms: &[Option<usize>], mut a: usize, mut b: usize) -> usize {
    while a != b {
        while a > b {
            match doms[a] {
                Some(up) => a = up,
                None => return b,
            }
        }
        while b > a {
            match doms[b] {
                Some(up) => b = up,
                None => return a,
            }
        }
    }
    a
}
