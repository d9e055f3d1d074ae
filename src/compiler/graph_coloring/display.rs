use super::*;
use crate::compiler::cfg::write_symbol_set;

/// Renders every node with its state, interference and move neighbors
pub struct GraphDisplay<'a> {
    graph: &'a InterferenceGraph,
    symbols: &'a SymbolTable,
}

/// Renders a symbol -> register assignment in symbol-id order
pub struct ColoringDisplay<'a> {
    result: &'a ColoringResult,
    symbols: &'a SymbolTable,
}

impl InterferenceGraph {
    pub fn display<'a>(&'a self, symbols: &'a SymbolTable) -> GraphDisplay<'a> {
        GraphDisplay {
            graph: self,
            symbols,
        }
    }
}

impl ColoringResult {
    pub fn display<'a>(&'a self, symbols: &'a SymbolTable) -> ColoringDisplay<'a> {
        ColoringDisplay {
            result: self,
            symbols,
        }
    }
}

impl fmt::Display for GraphDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (node, info) in self.graph.nodes.iter().enumerate() {
            write!(f, "{} {}", NodeId(node as u32), self.symbols.name(info.symbol))?;
            match (info.state, info.alias) {
                (NodeState::Coalesced, Some(alias)) => write!(f, " (merged into {})", alias)?,
                (NodeState::OnStack, _) => f.write_str(" (removed)")?,
                _ => {}
            }
            f.write_str(": interferes ")?;
            let adj: Vec<SymbolId> = info.adj.iter().map(|&n| self.graph.symbol(n)).collect();
            write_symbol_set(f, self.symbols, &adj)?;
            if !info.moves.is_empty() {
                f.write_str(" moves ")?;
                let moves: Vec<SymbolId> =
                    info.moves.iter().map(|&n| self.graph.symbol(n)).collect();
                write_symbol_set(f, self.symbols, &moves)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for ColoringDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut assigned: Vec<(SymbolId, usize)> = self
            .result
            .coloring
            .iter()
            .map(|(&sym, &color)| (sym, color))
            .collect();
        assigned.sort_unstable();

        for (sym, color) in assigned {
            writeln!(f, "{} -> r{}", self.symbols.name(sym), color)?;
        }
        if !self.result.potential_spills.is_empty() {
            f.write_str("potential spills ")?;
            write_symbol_set(f, self.symbols, &self.result.potential_spills)?;
            writeln!(f)?;
        }
        if !self.result.spilled.is_empty() {
            f.write_str("spilled ")?;
            write_symbol_set(f, self.symbols, &self.result.spilled)?;
            writeln!(f)?;
        }
        Ok(())
    }
}
