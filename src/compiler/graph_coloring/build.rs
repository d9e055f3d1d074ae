use super::*;

impl InterferenceGraph {
    /// Build the interference graph of one procedure from its liveness
    ///
    /// Two symbols interfere when both appear in the live-in set, or both in
    /// the live-out set, of some block. Copies with a non-constant source add
    /// move edges. Every written symbol gets a node even if nothing contends
    /// with it.
    pub fn build<L>(
        cfg: &ControlFlowGraph,
        liveness: &LivenessInfo,
        layout: &L,
        pin_receiver: bool,
    ) -> Self
    where
        L: ObjectLayout + ?Sized,
    {
        let mut graph = InterferenceGraph::new();

        if let Some(receiver) = cfg.receiver() {
            graph.add_node(receiver);
        }

        for block in &cfg.blocks {
            for quad in &block.quads {
                for def in quad.defs() {
                    graph.add_node(def);
                }
                if let Some((dst, src)) = quad.move_pair() {
                    let dst = graph.add_node(dst);
                    let src = graph.add_node(src);
                    graph.add_move(dst, src);
                }
            }

            if let Some(live_in) = liveness.live_in.get(&block.id) {
                graph.add_clique(live_in);
            }
            if let Some(live_out) = liveness.live_out.get(&block.id) {
                graph.add_clique(live_out);
            }
        }

        graph.patch_receiver(cfg, layout, pin_receiver);
        graph
    }

    /// Make every pair of a live set interfere
    fn add_clique(&mut self, live: &HashSet<SymbolId>) {
        // Sorted so node numbering does not depend on hash order
        let mut members: Vec<SymbolId> = live.iter().copied().collect();
        members.sort_unstable();

        let nodes: Vec<NodeId> = members.into_iter().map(|sym| self.add_node(sym)).collect();
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                self.add_edge(nodes[i], nodes[j]);
            }
        }
    }

    /// Field accesses dereference the receiver, so the receiver's register
    /// must stay valid wherever a field node lives
    fn patch_receiver<L>(&mut self, cfg: &ControlFlowGraph, layout: &L, pin_receiver: bool)
    where
        L: ObjectLayout + ?Sized,
    {
        let Some(receiver) = cfg.receiver() else {
            return;
        };
        let this = self.add_node(receiver);

        for node in self.node_ids() {
            if node == this {
                continue;
            }
            if pin_receiver || layout.is_instance_field(self.symbol(node)) {
                self.add_edge(this, node);
            }
        }
    }
}

impl GraphColoringAllocator {
    /// Compute spill costs for each node
    pub(super) fn compute_spill_costs(&mut self, cfg: &ControlFlowGraph, loops: &LoopInfo) {
        for node in self.graph.node_ids() {
            self.spill_cost.insert(node, 0.0);
        }

        for block in &cfg.blocks {
            let weight = 10.0_f64.powi(loops.depth(block.id) as i32);

            for quad in &block.quads {
                for sym in quad.defs().into_iter().chain(quad.uses()) {
                    if let Some(node) = self.graph.node_of(sym) {
                        *self.spill_cost.entry(node).or_insert(0.0) += weight;
                    }
                }
            }
        }
    }
}
