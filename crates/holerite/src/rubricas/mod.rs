//! Earnings/deduction line parsing.
//!
//! Two parsers share one notion of column roles: [`table`] maps the rows of a
//! recovered table grid by their header cells, [`lines`] reads layout text by
//! locating the header line and splitting rows on wide gaps.

mod lines;
mod table;

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

pub use lines::parse_lines;
pub use table::parse_tables;

use crate::models::{RubricaEntry, TableGrid};
use crate::utils::money::Money;
use crate::utils::text::fold;

/// What a rubrica column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Codigo,
    Descricao,
    Quantidade,
    Provento,
    Desconto,
}

impl Role {
    pub fn is_value(self) -> bool {
        matches!(self, Role::Quantidade | Role::Provento | Role::Desconto)
    }
}

static ROLE_PATTERNS: LazyLock<Vec<(Role, Regex)>> = LazyLock::new(|| {
    [
        (Role::Codigo, r"^(?:COD|CODIGO|CD|VERBA)\b"),
        (Role::Descricao, r"DESCRI|EVENTO|RUBRICA|HISTORICO|DISCRIMINACAO"),
        (Role::Quantidade, r"REFER|\bQTD|QUANT|HORAS|\bDIAS\b|\bREF\b"),
        (Role::Provento, r"VENC|PROVENTO|CREDITO"),
        (Role::Desconto, r"DESCONTO|DEBITO"),
    ]
    .into_iter()
    .map(|(role, pattern)| (role, Regex::new(pattern).unwrap()))
    .collect()
});

/// Role of a header cell, if it names one.
pub fn role_of(header: &str) -> Option<Role> {
    let folded = fold(header.trim());
    if folded.is_empty() {
        return None;
    }
    ROLE_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(&folded))
        .map(|(role, _)| *role)
}

static TOTAL_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:TOTA(?:L|IS)|VALOR\s+LIQUIDO|LIQUIDO)\b").unwrap());

/// Row labels that end the item block rather than name an item.
pub(crate) fn is_total_marker(text: &str) -> bool {
    TOTAL_MARKER.is_match(&fold(text))
}

/// Cells made only of rule characters.
pub(crate) fn is_separator(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| matches!(c, '-' | '=' | '_' | '*' | '.' | '|' | '+' | ' '))
}

/// Non-zero amount in a cell.
pub(crate) fn amount(cell: &str) -> Option<Money> {
    Money::parse(cell).filter(|m| !m.is_zero())
}

/// Rubrica entries from the best available evidence: structured tables when
/// they yield entries, otherwise the layout text.
pub fn parse_rubricas(text: &str, tables: &[TableGrid]) -> Vec<RubricaEntry> {
    let from_tables = parse_tables(tables);
    if !from_tables.is_empty() {
        debug!("Parsed {} rubricas from table grids", from_tables.len());
        return from_tables;
    }
    let from_lines = parse_lines(text);
    debug!("Parsed {} rubricas from text lines", from_lines.len());
    from_lines
}
