use super::*;

impl GraphColoringAllocator {
    /// Coalesce: merge the first safe move-related pair
    ///
    /// Returns true if the graph changed, so the caller restarts from simplify.
    pub(super) fn coalesce(&mut self) -> bool {
        let candidates: Vec<NodeId> = self
            .graph
            .active_nodes()
            .filter(|&n| self.graph.is_move_related(n))
            .collect();

        for u in candidates {
            let partners: Vec<NodeId> = self.graph.move_neighbors(u).collect();
            for v in partners {
                if self.graph.interferes(u, v) {
                    // Constrained: these two can never share a register
                    self.graph.remove_move(u, v);
                    return true;
                }
                if self.can_coalesce(u, v) {
                    tracing::trace!(keep = %u, merge = %v, "coalesce");
                    self.combine(u, v);
                    return true;
                }
            }
        }

        false
    }

    /// Check if coalescing u and v is safe (Briggs criterion)
    pub(super) fn can_coalesce(&self, u: NodeId, v: NodeId) -> bool {
        if self.graph.interferes(u, v) {
            return false;
        }

        // Briggs: coalesce if resulting node has fewer than K high-degree neighbors
        let mut high_degree_neighbors = HashSet::new();
        for neighbor in self
            .graph
            .active_neighbors(u)
            .chain(self.graph.active_neighbors(v))
        {
            if neighbor != u && neighbor != v && self.graph.degree(neighbor) >= self.k {
                high_degree_neighbors.insert(neighbor);
            }
        }

        high_degree_neighbors.len() < self.k
    }

    /// Combine two nodes (coalesce v into u)
    pub(super) fn combine(&mut self, u: NodeId, v: NodeId) {
        self.graph.coalesce(u, v);
        self.coalesced_moves += 1;

        if let Some(cost) = self.spill_cost.remove(&v) {
            *self.spill_cost.entry(u).or_insert(0.0) += cost;
        }
    }
}
