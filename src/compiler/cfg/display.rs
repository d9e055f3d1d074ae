//! Textual renderings of CFGs and liveness for trace logs and tests

use super::*;

/// Renders blocks, their statements and successors using symbol names
pub struct CfgDisplay<'a> {
    cfg: &'a ControlFlowGraph,
    symbols: &'a SymbolTable,
}

/// Renders per-block live-in and live-out sets using symbol names
pub struct LivenessDisplay<'a> {
    info: &'a LivenessInfo,
    cfg: &'a ControlFlowGraph,
    symbols: &'a SymbolTable,
}

impl ControlFlowGraph {
    pub fn display<'a>(&'a self, symbols: &'a SymbolTable) -> CfgDisplay<'a> {
        CfgDisplay { cfg: self, symbols }
    }
}

impl LivenessInfo {
    pub fn display<'a>(
        &'a self,
        cfg: &'a ControlFlowGraph,
        symbols: &'a SymbolTable,
    ) -> LivenessDisplay<'a> {
        LivenessDisplay {
            info: self,
            cfg,
            symbols,
        }
    }
}

/// `{a, b}` in symbol-id order
pub(crate) fn write_symbol_set<'s>(
    f: &mut fmt::Formatter<'_>,
    symbols: &SymbolTable,
    set: impl IntoIterator<Item = &'s SymbolId>,
) -> fmt::Result {
    let mut sorted: Vec<SymbolId> = set.into_iter().copied().collect();
    sorted.sort_unstable();

    f.write_str("{")?;
    for (i, sym) in sorted.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        f.write_str(&symbols.name(sym))?;
    }
    f.write_str("}")
}

impl fmt::Display for CfgDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cfg {} (entry {})", self.cfg.name, self.cfg.entry)?;
        for block in &self.cfg.blocks {
            writeln!(f, "  {}:", block.id)?;
            for quad in &block.quads {
                writeln!(f, "    {}", quad.display(self.symbols))?;
            }
            f.write_str("    -> [")?;
            for (i, succ) in self.cfg.successors(block.id).iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", succ)?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}

impl fmt::Display for LivenessDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "liveness {} ({} passes)",
            self.cfg.name, self.info.iterations
        )?;
        let empty = HashSet::new();
        for block in &self.cfg.blocks {
            write!(f, "  {} in: ", block.id)?;
            let live_in = self.info.live_in.get(&block.id).unwrap_or(&empty);
            write_symbol_set(f, self.symbols, live_in)?;
            f.write_str(" out: ")?;
            let live_out = self.info.live_out.get(&block.id).unwrap_or(&empty);
            write_symbol_set(f, self.symbols, live_out)?;
            writeln!(f)?;
        }
        Ok(())
    }
}
