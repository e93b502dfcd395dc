use super::scope::{ScopeTree, Symbol, SymbolKind};

const HEADERS: [&str; 5] = ["Name", "Type", "Role", "Scope", "Attributes"];

/// One line of the symbol table report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRow {
    pub name: String,
    pub ty: String,
    pub role: String,
    pub scope: String,
    pub attributes: String,
}

impl SymbolRow {
    fn cells(&self) -> [&str; 5] {
        [
            &self.name,
            &self.ty,
            &self.role,
            &self.scope,
            &self.attributes,
        ]
    }
}

pub(crate) fn row_for(symbol: &Symbol, scopes: &ScopeTree) -> SymbolRow {
    let attributes = match symbol.kind {
        SymbolKind::Variable if symbol.mutable => "mutable".to_string(),
        SymbolKind::Variable => "const".to_string(),
        SymbolKind::Function => "params: 0".to_string(),
        SymbolKind::Builtin if !symbol.members.is_empty() => {
            format!("members: {}", symbol.member_names().join(", "))
        }
        SymbolKind::Builtin | SymbolKind::Parameter => "-".to_string(),
    };
    SymbolRow {
        name: symbol.name.clone(),
        ty: symbol.ty.to_string(),
        role: symbol.kind.label().to_string(),
        scope: scopes.label(symbol.scope).to_string(),
        attributes,
    }
}

/// Rows of every scope, scopes in creation order and symbols in insertion order.
pub(crate) fn rows(scopes: &ScopeTree) -> Vec<SymbolRow> {
    scopes
        .iter()
        .flat_map(|(_, scope)| scope.symbols())
        .map(|symbol| row_for(symbol, scopes))
        .collect()
}

/// Column-aligned text table with a header and a `-+-` separator line.
pub fn format_symbol_table(rows: &[SymbolRow]) -> String {
    if rows.is_empty() {
        return "Empty symbol table.".to_string();
    }

    let mut widths = HEADERS.map(|header| header.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |cells: [&str; 5]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let separator = widths
        .iter()
        .map(|&width| "-".repeat(width))
        .collect::<Vec<_>>()
        .join("-+-");

    let mut lines = vec![render(HEADERS), separator];
    lines.extend(rows.iter().map(|row| render(row.cells())));
    lines.join("\n")
}
