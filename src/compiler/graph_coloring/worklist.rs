use super::*;

impl GraphColoringAllocator {
    /// Simplify: remove low-degree non-move-related nodes until none is left
    ///
    /// Returns true if at least one node was removed.
    pub(super) fn simplify(&mut self) -> bool {
        let mut removed = false;
        while let Some(node) = self.simplify_candidate() {
            self.graph.remove_node(node);
            self.select_stack.push(node);
            removed = true;
        }
        removed
    }

    fn simplify_candidate(&self) -> Option<NodeId> {
        self.graph
            .active_nodes()
            .find(|&n| !self.graph.is_move_related(n) && self.graph.degree(n) < self.k)
    }

    /// Freeze: give up coalescing on a low-degree move-related node
    pub(super) fn freeze(&mut self) -> bool {
        // Lowest-numbered node for deterministic behavior
        let candidate = self
            .graph
            .active_nodes()
            .find(|&n| self.graph.is_move_related(n) && self.graph.degree(n) < self.k);

        match candidate {
            Some(node) => {
                tracing::trace!(node = %node, "freeze");
                self.graph.freeze(node);
                true
            }
            None => false,
        }
    }

    /// Select a node to spill and push it as a potential spill
    pub(super) fn select_spill(&mut self) {
        let victim = match self.spill_policy {
            SpillPolicy::FirstFound => self.graph.active_nodes().next(),
            SpillPolicy::LowestCost => self.cheapest_spill(),
        };
        let Some(node) = victim else {
            return;
        };

        tracing::debug!(
            node = %node,
            degree = self.graph.degree(node),
            "potential spill"
        );
        self.graph.freeze(node);
        self.graph.remove_node(node);
        self.potential_spills.insert(node);
        self.select_stack.push(node);
    }

    /// Spill the node with the lowest cost/degree ratio
    fn cheapest_spill(&self) -> Option<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;

        for node in self.graph.active_nodes() {
            let cost = self.spill_cost.get(&node).copied().unwrap_or(1.0);
            let degree = self.graph.degree(node).max(1) as f64;
            let priority = cost / degree; // Lower is better to spill

            match best {
                None => best = Some((node, priority)),
                Some((_, best_priority)) if priority < best_priority => {
                    best = Some((node, priority));
                }
                _ => {}
            }
        }

        best.map(|(node, _)| node)
    }
}
