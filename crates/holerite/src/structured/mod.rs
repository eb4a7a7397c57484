//! Block-graph recovery for document-analysis results.
//!
//! Cloud analysis returns a flat list of blocks linked by id: pages contain
//! lines, lines contain words, key blocks point at value blocks, tables
//! contain cells with row/column positions. This module mirrors that shape in
//! crate-owned types and rebuilds key-value pairs and table grids from it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{StructuredEvidence, TableGrid};

/// Kind of analysis block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    Page,
    Line,
    Word,
    KeyValueSet,
    Table,
    Cell,
    MergedCell,
    SelectionElement,
    Other,
}

/// Role of a KEY_VALUE_SET block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Key,
    Value,
    Other,
}

/// Kind of link between blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    Child,
    Value,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub kind: RelationshipType,
    pub ids: Vec<String>,
}

/// One block of an analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisBlock {
    pub id: String,
    pub block_type: BlockType,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub entity_types: Vec<EntityType>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub row_index: Option<u32>,
    #[serde(default)]
    pub column_index: Option<u32>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub selected: Option<bool>,
}

impl AnalysisBlock {
    pub fn new(id: impl Into<String>, block_type: BlockType) -> Self {
        Self {
            id: id.into(),
            block_type,
            text: None,
            entity_types: Vec::new(),
            relationships: Vec::new(),
            row_index: None,
            column_index: None,
            page: None,
            selected: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_entity(mut self, entity: EntityType) -> Self {
        self.entity_types.push(entity);
        self
    }

    pub fn with_children(self, ids: &[&str]) -> Self {
        self.with_relationship(RelationshipType::Child, ids)
    }

    pub fn with_value(self, ids: &[&str]) -> Self {
        self.with_relationship(RelationshipType::Value, ids)
    }

    pub fn with_cell_position(mut self, row: u32, column: u32) -> Self {
        self.row_index = Some(row);
        self.column_index = Some(column);
        self
    }

    fn with_relationship(mut self, kind: RelationshipType, ids: &[&str]) -> Self {
        self.relationships.push(Relationship {
            kind,
            ids: ids.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    fn related(&self, kind: RelationshipType) -> impl Iterator<Item = &str> {
        self.relationships
            .iter()
            .filter(move |r| r.kind == kind)
            .flat_map(|r| r.ids.iter().map(String::as_str))
    }

    fn is_key(&self) -> bool {
        self.block_type == BlockType::KeyValueSet && self.entity_types.contains(&EntityType::Key)
    }
}

/// A complete analysis result: blocks in service order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub blocks: Vec<AnalysisBlock>,
}

impl DocumentAnalysis {
    pub fn new(blocks: Vec<AnalysisBlock>) -> Self {
        Self { blocks }
    }

    /// Text of all LINE blocks in reading order, one per line.
    pub fn text_lines(&self) -> String {
        self.blocks
            .iter()
            .filter(|b| b.block_type == BlockType::Line)
            .filter_map(|b| b.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of PAGE blocks (at least 1 when any block exists).
    pub fn page_count(&self) -> u32 {
        let pages = self
            .blocks
            .iter()
            .filter(|b| b.block_type == BlockType::Page)
            .count() as u32;
        if pages == 0 && !self.blocks.is_empty() {
            1
        } else {
            pages
        }
    }
}

/// Rebuild key-value pairs and table grids from an analysis result.
pub fn recover(analysis: &DocumentAnalysis) -> StructuredEvidence {
    let index: HashMap<&str, &AnalysisBlock> = analysis
        .blocks
        .iter()
        .map(|b| (b.id.as_str(), b))
        .collect();

    let key_values = recover_key_values(analysis, &index);
    let tables = recover_tables(analysis, &index);

    debug!(
        "Recovered {} key-value pairs and {} tables from {} blocks",
        key_values.len(),
        tables.len(),
        analysis.blocks.len()
    );

    StructuredEvidence { key_values, tables }
}

/// Concatenate a block's child WORD text (and selection marks) in order.
fn child_text(block: &AnalysisBlock, index: &HashMap<&str, &AnalysisBlock>) -> String {
    let mut words: Vec<&str> = Vec::new();
    for id in block.related(RelationshipType::Child) {
        let Some(child) = index.get(id) else {
            continue;
        };
        match child.block_type {
            BlockType::Word => {
                if let Some(text) = child.text.as_deref() {
                    words.push(text);
                }
            }
            BlockType::SelectionElement if child.selected == Some(true) => words.push("X"),
            _ => {}
        }
    }
    words.join(" ")
}

fn recover_key_values(
    analysis: &DocumentAnalysis,
    index: &HashMap<&str, &AnalysisBlock>,
) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for key_block in analysis.blocks.iter().filter(|b| b.is_key()) {
        let key = child_text(key_block, index);
        let key = key.trim().trim_end_matches(':').trim().to_string();
        if key.is_empty() {
            continue;
        }
        let value = key_block
            .related(RelationshipType::Value)
            .filter_map(|id| index.get(id))
            .map(|value_block| child_text(value_block, index))
            .filter(|v| !v.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        pairs.push((key, value.trim().to_string()));
    }
    pairs
}

/// How much larger than its cell count a table's grid may be.
const SPARSE_GRID_FACTOR: usize = 4;
const MIN_GRID_AREA: usize = 64;

fn recover_tables(
    analysis: &DocumentAnalysis,
    index: &HashMap<&str, &AnalysisBlock>,
) -> Vec<TableGrid> {
    let mut tables = Vec::new();
    for table in analysis
        .blocks
        .iter()
        .filter(|b| b.block_type == BlockType::Table)
    {
        let cells: Vec<&AnalysisBlock> = table
            .related(RelationshipType::Child)
            .filter_map(|id| index.get(id).copied())
            .filter(|b| b.block_type == BlockType::Cell)
            .collect();

        let rows = cells.iter().filter_map(|c| c.row_index).max().unwrap_or(0) as usize;
        let cols = cells.iter().filter_map(|c| c.column_index).max().unwrap_or(0) as usize;
        if rows == 0 || cols == 0 {
            continue;
        }
        // Every grid position normally has its own cell block.
        let limit = cells.len().saturating_mul(SPARSE_GRID_FACTOR).max(MIN_GRID_AREA);
        if rows.saturating_mul(cols) > limit {
            warn!(
                "Skipping table {}: {}x{} grid from {} cells",
                table.id,
                rows,
                cols,
                cells.len()
            );
            continue;
        }

        let mut grid = vec![vec![String::new(); cols]; rows];
        for cell in cells {
            let (Some(row), Some(col)) = (cell.row_index, cell.column_index) else {
                continue;
            };
            // Positions are 1-based.
            if row == 0 || col == 0 {
                continue;
            }
            grid[row as usize - 1][col as usize - 1] = child_text(cell, index);
        }
        tables.push(TableGrid::new(grid));
    }
    tables
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(id: &str, text: &str) -> AnalysisBlock {
        AnalysisBlock::new(id, BlockType::Word).with_text(text)
    }

    #[test]
    fn test_key_value_pairs_join_words_in_order() {
        let analysis = DocumentAnalysis::new(vec![
            AnalysisBlock::new("k1", BlockType::KeyValueSet)
                .with_entity(EntityType::Key)
                .with_children(&["w1", "w2", "w3"])
                .with_value(&["v1"]),
            AnalysisBlock::new("v1", BlockType::KeyValueSet)
                .with_entity(EntityType::Value)
                .with_children(&["w4", "w5"]),
            word("w1", "Líquido"),
            word("w2", "a"),
            word("w3", "Receber:"),
            word("w4", "1.850,00"),
            word("w5", ""),
        ]);

        let evidence = recover(&analysis);
        assert_eq!(
            evidence.key_values,
            vec![("Líquido a Receber".to_string(), "1.850,00".to_string())]
        );
    }

    #[test]
    fn test_key_without_value_kept_empty() {
        let analysis = DocumentAnalysis::new(vec![
            AnalysisBlock::new("k1", BlockType::KeyValueSet)
                .with_entity(EntityType::Key)
                .with_children(&["w1"]),
            word("w1", "CPF"),
        ]);
        let evidence = recover(&analysis);
        assert_eq!(evidence.key_values, vec![("CPF".to_string(), String::new())]);
    }

    #[test]
    fn test_table_missing_cells_stay_empty() {
        let analysis = DocumentAnalysis::new(vec![
            AnalysisBlock::new("t1", BlockType::Table).with_children(&["c11", "c12", "c13", "c21", "c23"]),
            AnalysisBlock::new("c11", BlockType::Cell)
                .with_cell_position(1, 1)
                .with_children(&["w1"]),
            AnalysisBlock::new("c12", BlockType::Cell)
                .with_cell_position(1, 2)
                .with_children(&["w2"]),
            AnalysisBlock::new("c13", BlockType::Cell)
                .with_cell_position(1, 3)
                .with_children(&["w3"]),
            AnalysisBlock::new("c21", BlockType::Cell)
                .with_cell_position(2, 1)
                .with_children(&["w4", "w5"]),
            AnalysisBlock::new("c23", BlockType::Cell)
                .with_cell_position(2, 3)
                .with_children(&["w6"]),
            word("w1", "Descrição"),
            word("w2", "Referência"),
            word("w3", "Vencimentos"),
            word("w4", "SALARIO"),
            word("w5", "BASE"),
            word("w6", "2.000,00"),
        ]);

        let evidence = recover(&analysis);
        assert_eq!(evidence.tables.len(), 1);
        assert_eq!(
            evidence.tables[0].rows,
            vec![
                vec!["Descrição", "Referência", "Vencimentos"],
                vec!["SALARIO BASE", "", "2.000,00"],
            ]
        );
    }

    #[test]
    fn test_table_with_runaway_index_is_skipped() {
        let analysis = DocumentAnalysis::new(vec![
            AnalysisBlock::new("t1", BlockType::Table).with_children(&["c11", "cx"]),
            AnalysisBlock::new("c11", BlockType::Cell)
                .with_cell_position(1, 1)
                .with_children(&["w1"]),
            AnalysisBlock::new("cx", BlockType::Cell)
                .with_cell_position(u32::MAX, 2)
                .with_children(&["w2"]),
            AnalysisBlock::new("t2", BlockType::Table).with_children(&["d11", "d12"]),
            AnalysisBlock::new("d11", BlockType::Cell)
                .with_cell_position(1, 1)
                .with_children(&["w3"]),
            AnalysisBlock::new("d12", BlockType::Cell)
                .with_cell_position(1, 2)
                .with_children(&["w4"]),
            word("w1", "Descrição"),
            word("w2", "lixo"),
            word("w3", "SALARIO"),
            word("w4", "2.000,00"),
        ]);

        let evidence = recover(&analysis);
        assert_eq!(evidence.tables.len(), 1);
        assert_eq!(evidence.tables[0].rows, vec![vec!["SALARIO", "2.000,00"]]);
    }

    #[test]
    fn test_text_lines_and_pages() {
        let analysis = DocumentAnalysis::new(vec![
            AnalysisBlock::new("p1", BlockType::Page),
            AnalysisBlock::new("l1", BlockType::Line).with_text("ACME LTDA"),
            AnalysisBlock::new("l2", BlockType::Line).with_text("CNPJ 12.345.678/0001-90"),
        ]);
        assert_eq!(analysis.text_lines(), "ACME LTDA\nCNPJ 12.345.678/0001-90");
        assert_eq!(analysis.page_count(), 1);
    }
}
