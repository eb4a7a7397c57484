//! Structured evidence recovered from a document-analysis backend.

use serde::{Deserialize, Serialize};

use crate::utils::text::normalize_key;

/// One table: ordered rows of ordered cell strings.
///
/// Rows are padded so every row has the same width; missing cells are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableGrid {
    pub rows: Vec<Vec<String>>,
}

impl TableGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { rows }
    }

    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Key-value pairs and table grids from one structured acquisition attempt.
///
/// Always paired with the [`RawText`](super::RawText) of the same attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredEvidence {
    /// Label → value pairs in reading order. Labels may repeat.
    pub key_values: Vec<(String, String)>,
    pub tables: Vec<TableGrid>,
}

impl StructuredEvidence {
    pub fn is_empty(&self) -> bool {
        self.key_values.is_empty() && self.tables.is_empty()
    }

    /// Values whose label contains every word of `alias`, in order.
    pub fn values_for<'a>(&'a self, alias: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let alias_words: Vec<String> = normalize_key(alias)
            .split(' ')
            .map(str::to_string)
            .collect();
        self.key_values.iter().filter_map(move |(key, value)| {
            let key = normalize_key(key);
            contains_word_sequence(&key, &alias_words).then_some(value.as_str())
        })
    }

    /// Values whose label equals `label` after normalization.
    pub fn values_exact<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let wanted = normalize_key(label);
        self.key_values
            .iter()
            .filter(move |(key, _)| normalize_key(key) == wanted)
            .map(|(_, value)| value.as_str())
    }
}

/// True when `words` appear in `key` in order (other words may sit between).
fn contains_word_sequence(key: &str, words: &[String]) -> bool {
    let mut remaining = words.iter().peekable();
    for word in key.split(' ') {
        if remaining.peek().is_some_and(|w| *w == word) {
            remaining.next();
        }
    }
    remaining.peek().is_none() && !words.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence() -> StructuredEvidence {
        StructuredEvidence {
            key_values: vec![
                ("Total de Descontos:".to_string(), "150,00".to_string()),
                ("Nome".to_string(), "MARIA SOUZA".to_string()),
                ("Nome da Empresa".to_string(), "ACME LTDA".to_string()),
            ],
            tables: Vec::new(),
        }
    }

    #[test]
    fn test_values_for_matches_word_sequence() {
        let ev = evidence();
        let hits: Vec<&str> = ev.values_for("total descontos").collect();
        assert_eq!(hits, vec!["150,00"]);
        assert_eq!(ev.values_for("total proventos").count(), 0);
    }

    #[test]
    fn test_values_exact() {
        let ev = evidence();
        let hits: Vec<&str> = ev.values_exact("nome").collect();
        assert_eq!(hits, vec!["MARIA SOUZA"]);
    }

    #[test]
    fn test_table_grid_pads_rows() {
        let grid = TableGrid::new(vec![
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            vec!["d".to_string()],
        ]);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.rows[1], vec!["d", "", ""]);
    }
}
