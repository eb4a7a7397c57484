//! Rubricas from recovered table grids.

use std::collections::HashSet;

use super::{amount, is_separator, is_total_marker, role_of, Role};
use crate::models::{RubricaEntry, TableGrid};

/// Rows searched for the header.
const HEADER_SCAN_ROWS: usize = 3;

/// Column layout of a table: header row index and the first column of each
/// role.
#[derive(Debug)]
struct Layout {
    header_row: usize,
    score: usize,
    columns: Vec<(Role, usize)>,
}

impl Layout {
    fn column(&self, role: Role) -> Option<usize> {
        self.columns
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, col)| *col)
    }

    fn is_usable(&self) -> bool {
        self.column(Role::Descricao).is_some()
            && (self.column(Role::Provento).is_some() || self.column(Role::Desconto).is_some())
    }
}

fn layout_of(table: &TableGrid) -> Option<Layout> {
    let mut best: Option<Layout> = None;
    for (row_idx, row) in table.rows.iter().take(HEADER_SCAN_ROWS).enumerate() {
        let mut columns: Vec<(Role, usize)> = Vec::new();
        for (col, cell) in row.iter().enumerate() {
            if let Some(role) = role_of(cell) {
                if !columns.iter().any(|(r, _)| *r == role) {
                    columns.push((role, col));
                }
            }
        }
        let score = columns.iter().map(|(r, _)| *r).collect::<HashSet<_>>().len();
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(Layout {
                header_row: row_idx,
                score,
                columns,
            });
        }
    }
    best.filter(Layout::is_usable)
}

fn cell<'a>(row: &'a [String], col: Option<usize>) -> Option<&'a str> {
    col.and_then(|c| row.get(c))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

fn entries_of(table: &TableGrid, layout: &Layout) -> Vec<RubricaEntry> {
    let mut entries = Vec::new();
    for row in table.rows.iter().skip(layout.header_row + 1) {
        let Some(descricao) = cell(row, layout.column(Role::Descricao)) else {
            continue;
        };
        if is_total_marker(descricao) || is_separator(descricao) {
            continue;
        }
        let codigo = cell(row, layout.column(Role::Codigo)).map(str::to_string);
        let quantidade = cell(row, layout.column(Role::Quantidade)).map(str::to_string);
        let provento = cell(row, layout.column(Role::Provento)).and_then(amount);
        let desconto = cell(row, layout.column(Role::Desconto)).and_then(amount);

        entries.extend(
            RubricaEntry::new(codigo, descricao, quantidade, provento, desconto)
                .filter(RubricaEntry::has_amount_or_code),
        );
    }
    entries
}

/// Entries from every table sharing the best header score. Tables whose
/// headers do not name a description and an amount column are ignored.
pub fn parse_tables(tables: &[TableGrid]) -> Vec<RubricaEntry> {
    let scored: Vec<(&TableGrid, Layout)> = tables
        .iter()
        .filter_map(|t| layout_of(t).map(|layout| (t, layout)))
        .collect();
    let Some(best) = scored.iter().map(|(_, l)| l.score).max() else {
        return Vec::new();
    };
    scored
        .iter()
        .filter(|(_, layout)| layout.score == best)
        .flat_map(|(table, layout)| entries_of(table, layout))
        .collect()
}
