use super::*;

impl InterferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node for `symbol`, or return the existing one
    pub fn add_node(&mut self, symbol: SymbolId) -> NodeId {
        if let Some(&id) = self.index.get(&symbol) {
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(GraphNode {
            symbol,
            adj: BTreeSet::new(),
            moves: BTreeSet::new(),
            move_related: false,
            state: NodeState::Active,
            alias: None,
            coalesced: Vec::new(),
        });
        self.index.insert(symbol, id);
        id
    }

    /// Node created for `symbol`; coalesced symbols keep their own node
    pub fn node_of(&self, symbol: SymbolId) -> Option<NodeId> {
        self.index.get(&symbol).copied()
    }

    pub fn symbol(&self, node: NodeId) -> SymbolId {
        self.nodes[node.0 as usize].symbol
    }

    /// Every node ever added, in creation order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Nodes still in the graph, in creation order
    pub fn active_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.node_ids().filter(|&n| self.is_active(n))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// No node left to reduce
    pub fn is_empty(&self) -> bool {
        self.active_nodes().next().is_none()
    }

    pub fn is_active(&self, node: NodeId) -> bool {
        self.nodes[node.0 as usize].state == NodeState::Active
    }

    pub fn is_coalesced(&self, node: NodeId) -> bool {
        self.nodes[node.0 as usize].state == NodeState::Coalesced
    }

    /// Add an interference edge between two nodes
    pub fn add_edge(&mut self, u: NodeId, v: NodeId) {
        if u == v {
            return;
        }
        self.nodes[u.0 as usize].adj.insert(v);
        self.nodes[v.0 as usize].adj.insert(u);
    }

    pub fn remove_edge(&mut self, u: NodeId, v: NodeId) {
        self.nodes[u.0 as usize].adj.remove(&v);
        self.nodes[v.0 as usize].adj.remove(&u);
    }

    /// Check if two nodes interfere
    pub fn interferes(&self, u: NodeId, v: NodeId) -> bool {
        self.nodes[u.0 as usize].adj.contains(&v)
    }

    /// Add a move edge; both ends become move-related
    pub fn add_move(&mut self, u: NodeId, v: NodeId) {
        if u == v {
            return;
        }
        for (a, b) in [(u, v), (v, u)] {
            let node = &mut self.nodes[a.0 as usize];
            node.moves.insert(b);
            node.move_related = true;
        }
    }

    pub fn remove_move(&mut self, u: NodeId, v: NodeId) {
        self.nodes[u.0 as usize].moves.remove(&v);
        self.nodes[v.0 as usize].moves.remove(&u);
        self.refresh_move_related(u);
        self.refresh_move_related(v);
    }

    pub fn has_move(&self, u: NodeId, v: NodeId) -> bool {
        self.nodes[u.0 as usize].moves.contains(&v)
    }

    pub fn is_move_related(&self, node: NodeId) -> bool {
        self.nodes[node.0 as usize].move_related
    }

    fn refresh_move_related(&mut self, node: NodeId) {
        let node = &mut self.nodes[node.0 as usize];
        node.move_related = !node.moves.is_empty();
    }

    /// All interference neighbors, including removed ones
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[node.0 as usize].adj.iter().copied()
    }

    /// Interference neighbors still in the graph
    pub fn active_neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.neighbors(node).filter(|&n| self.is_active(n))
    }

    /// Move neighbors still in the graph
    pub fn move_neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[node.0 as usize]
            .moves
            .iter()
            .copied()
            .filter(|&n| self.is_active(n))
    }

    /// Number of interference neighbors still in the graph
    pub fn degree(&self, node: NodeId) -> usize {
        self.active_neighbors(node).count()
    }

    pub fn move_degree(&self, node: NodeId) -> usize {
        self.move_neighbors(node).count()
    }

    /// Take a node out of the graph; its edges stay recorded for select
    pub fn remove_node(&mut self, node: NodeId) {
        self.nodes[node.0 as usize].state = NodeState::OnStack;
    }

    /// Merge `b` into `a`
    ///
    /// Every edge of `b` is moved onto `a` and every other node's edges
    /// pointing at `b` are redirected to `a`. `b` leaves the graph for good
    /// and `a` remembers it for color propagation.
    pub fn coalesce(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }

        let b_adj = std::mem::take(&mut self.nodes[b.0 as usize].adj);
        for n in b_adj {
            self.nodes[n.0 as usize].adj.remove(&b);
            if n != a {
                self.add_edge(a, n);
            }
        }

        let b_moves = std::mem::take(&mut self.nodes[b.0 as usize].moves);
        for n in b_moves {
            self.nodes[n.0 as usize].moves.remove(&b);
            if n != a {
                self.add_move(a, n);
            }
            self.refresh_move_related(n);
        }
        self.refresh_move_related(a);

        let absorbed = std::mem::take(&mut self.nodes[b.0 as usize].coalesced);
        {
            let node = &mut self.nodes[b.0 as usize];
            node.state = NodeState::Coalesced;
            node.alias = Some(a);
            node.move_related = false;
        }
        let rep = &mut self.nodes[a.0 as usize];
        rep.coalesced.push(b);
        rep.coalesced.extend(absorbed);
    }

    /// Give up coalescing `node`: drop its move edges
    pub fn freeze(&mut self, node: NodeId) {
        let moves = std::mem::take(&mut self.nodes[node.0 as usize].moves);
        for n in moves {
            self.nodes[n.0 as usize].moves.remove(&node);
            self.refresh_move_related(n);
        }
        self.nodes[node.0 as usize].move_related = false;
    }

    /// Representative a node was merged into (itself if never merged)
    pub fn get_alias(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while let Some(alias) = self.nodes[current.0 as usize].alias {
            current = alias;
        }
        current
    }

    /// Nodes merged into `node`, transitively
    pub fn coalesced_into(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0 as usize].coalesced
    }
}
