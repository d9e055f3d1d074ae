use super::*;

impl GraphColoringAllocator {
    /// Assign colors (registers) to nodes
    pub(super) fn assign_colors(&mut self) {
        while let Some(node) = self.select_stack.pop() {
            // Only neighbors popped earlier have a color yet
            let used_colors: HashSet<usize> = self
                .graph
                .neighbors(node)
                .filter_map(|n| self.color.get(&n).copied())
                .collect();

            let Some(color) = (0..self.k).find(|c| !used_colors.contains(c)) else {
                if !self.potential_spills.contains(&node) {
                    tracing::warn!(node = %node, "simplified node found no free color");
                }
                self.spilled_nodes.push(node);
                continue;
            };

            self.color.insert(node, color);

            // Assign the same color to coalesced nodes
            for &alias in self.graph.coalesced_into(node) {
                self.color.insert(alias, color);
            }
        }
    }
}
