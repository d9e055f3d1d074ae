use super::*;

/// Blocks and edges of the procedure currently being scanned
struct ProcedureBuilder {
    name: String,
    method: MethodEntry,
    blocks: Vec<BasicBlock>,
    edges: Vec<(BlockId, BlockId)>,
    labels: HashMap<String, BlockId>,
    /// Block that falls through into the next block created
    pending_fallthrough: Option<BlockId>,
}

impl ProcedureBuilder {
    fn new(name: String, method: MethodEntry) -> Self {
        Self {
            name,
            method,
            blocks: Vec::new(),
            edges: Vec::new(),
            labels: HashMap::new(),
            pending_fallthrough: None,
        }
    }

    fn add_edge(&mut self, from: BlockId, to: BlockId) {
        if !self.edges.contains(&(from, to)) {
            self.edges.push((from, to));
        }
    }

    fn push_block(&mut self, start: usize, quads: Vec<Quad>) -> Result<(), CompileError> {
        let id = BlockId(self.blocks.len() as u32);

        if let Some(prev) = self.pending_fallthrough.take() {
            self.add_edge(prev, id);
        }

        if let Some(Quad::Label { name, .. }) = quads.first()
            && self.labels.insert(name.clone(), id).is_some()
        {
            return Err(CompileError::DuplicateLabel {
                label: name.clone(),
                procedure: self.name.clone(),
            });
        }

        // Unconditional jumps and returns never fall through
        self.pending_fallthrough = match quads.last() {
            Some(Quad::Jump { .. }) | Some(Quad::Return { .. }) => None,
            _ => Some(id),
        };

        self.blocks.push(BasicBlock { id, start, quads });
        Ok(())
    }

    /// Resolve jump targets now that every label of the procedure is known
    fn finish(mut self) -> Result<ControlFlowGraph, CompileError> {
        let mut jump_edges = Vec::new();
        for block in &self.blocks {
            let Some(target) = block.terminator().and_then(Quad::jump_target) else {
                continue;
            };
            let Some(&succ) = self.labels.get(target) else {
                return Err(CompileError::UnresolvedLabel {
                    label: target.to_string(),
                    procedure: self.name.clone(),
                });
            };
            jump_edges.push((block.id, succ));
        }
        for (from, to) in jump_edges {
            self.add_edge(from, to);
        }

        let mut cfg = ControlFlowGraph {
            name: self.name,
            method: self.method,
            entry: BlockId(0),
            blocks: self.blocks,
            successors: HashMap::new(),
            predecessors: HashMap::new(),
            idom: HashMap::new(),
            rpo: Vec::new(),
            post_order: Vec::new(),
        };

        for block in &cfg.blocks {
            cfg.successors.insert(block.id, Vec::new());
            cfg.predecessors.insert(block.id, Vec::new());
        }
        for (from, to) in self.edges {
            cfg.successors.entry(from).or_default().push(to);
            cfg.predecessors.entry(to).or_default().push(from);
        }

        cfg.compute_post_order();
        cfg.compute_dominators();
        Ok(cfg)
    }
}

/// Scans a flat statement list, producing one CFG per procedure
pub(super) struct CfgBuilder {
    cfgs: Vec<ControlFlowGraph>,
    current: Option<ProcedureBuilder>,
    block: Vec<Quad>,
    block_start: usize,
}

impl CfgBuilder {
    pub(super) fn build(quads: &[Quad]) -> Result<Vec<ControlFlowGraph>, CompileError> {
        let mut builder = CfgBuilder {
            cfgs: Vec::new(),
            current: None,
            block: Vec::new(),
            block_start: 0,
        };

        for (idx, quad) in quads.iter().enumerate() {
            builder.visit(idx, quad)?;
        }
        builder.end_procedure()?;

        tracing::debug!(
            procedures = builder.cfgs.len(),
            statements = quads.len(),
            "built control flow graphs"
        );
        Ok(builder.cfgs)
    }

    fn visit(&mut self, idx: usize, quad: &Quad) -> Result<(), CompileError> {
        if let Quad::Label { name, entry } = quad {
            // Labels are jump targets, so they always open a fresh block
            self.end_block()?;
            if let Some(entry) = entry {
                self.end_procedure()?;
                self.current = Some(ProcedureBuilder::new(name.clone(), entry.clone()));
            }
        }

        if self.current.is_none() {
            return Err(CompileError::MissingProcedureEntry { index: idx });
        }

        if self.block.is_empty() {
            self.block_start = idx;
        }
        self.block.push(quad.clone());

        match quad {
            Quad::Jump { .. } | Quad::CondJump { .. } => self.end_block()?,
            Quad::Return { .. } => {
                self.end_block()?;
                self.end_procedure()?;
            }
            _ => {}
        }
        Ok(())
    }

    fn end_block(&mut self) -> Result<(), CompileError> {
        if self.block.is_empty() {
            return Ok(());
        }
        let quads = std::mem::take(&mut self.block);
        match self.current.as_mut() {
            Some(proc) => proc.push_block(self.block_start, quads),
            None => Err(CompileError::MissingProcedureEntry {
                index: self.block_start,
            }),
        }
    }

    fn end_procedure(&mut self) -> Result<(), CompileError> {
        self.end_block()?;
        if let Some(proc) = self.current.take()
            && !proc.blocks.is_empty()
        {
            let cfg = proc.finish()?;
            tracing::trace!(procedure = %cfg.name, blocks = cfg.blocks.len(), "finished cfg");
            self.cfgs.push(cfg);
        }
        Ok(())
    }
}
