//! Rubricas from layout text.
//!
//! The header line names the columns; rows below it are split into cells on
//! runs of two or more spaces. Value cells are assigned to the header column
//! nearest to them, which keeps rows aligned when a column is missing. Without
//! a header, code-led rows are read positionally.

use std::sync::LazyLock;

use regex::Regex;

use super::{amount, is_separator, is_total_marker, role_of, Role};
use crate::extract::chunks_of;
use crate::models::RubricaEntry;
use crate::utils::money::Money;
use crate::utils::text::fold;

/// Header: a description keyword followed later by an earnings keyword.
static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:DESCRI\w*|EVENTOS?|RUBRICAS?|VERBAS?|HISTORICO)\b.*\b(?:VENC\w*|PROVENTOS?|CREDITOS?)\b")
        .unwrap()
});

static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{1,6}[A-Za-z]?$").unwrap());

static VALUE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-(]?\d[\d.,:/%]*\)?-?$").unwrap());

static MONEY_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-(]?(?:\d{1,3}(?:\.\d{3})+|\d+),\d{2}\)?-?$").unwrap());

/// A cell of a data or header line, with its char span.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Cell {
    start: usize,
    end: usize,
    text: String,
}

impl Cell {
    fn is_value(&self) -> bool {
        VALUE_WORD.is_match(&self.text)
    }

    fn is_money(&self) -> bool {
        MONEY_CELL.is_match(&self.text)
    }

    fn distance(&self, other: &Cell) -> usize {
        self.start
            .abs_diff(other.start)
            .min(self.end.abs_diff(other.end))
    }
}

/// Split a line into cells. Within a column chunk, leading value-shaped
/// words and trailing ones ending in an amount become cells of their own, so
/// single-spaced OCR rows such as `001 SALARIO BASE 30 2.000,00` still
/// separate.
fn cells_of(line: &str) -> Vec<Cell> {
    let mut cells = Vec::new();
    for chunk in chunks_of(line) {
        let mut words: Vec<(usize, &str)> = Vec::new();
        let mut offset = 0;
        for word in chunk.text.split(' ') {
            words.push((chunk.column + offset, word));
            offset += word.chars().count() + 1;
        }
        let is_value = |w: &str| VALUE_WORD.is_match(w);
        let first_text = words.iter().position(|(_, w)| !is_value(w));
        // Trailing numbers stay in the text ("HORAS EXTRAS 50%") unless an
        // amount follows.
        let last_text = words
            .iter()
            .rposition(|(_, w)| !is_value(w))
            .map(|last| {
                let amount_follows = words[last + 1..]
                    .iter()
                    .any(|(_, w)| MONEY_CELL.is_match(w));
                if amount_follows {
                    last
                } else {
                    words.len() - 1
                }
            });

        let single = |(col, w): (usize, &str)| Cell {
            start: col,
            end: col + w.chars().count(),
            text: w.to_string(),
        };
        match (first_text, last_text) {
            (Some(first), Some(last)) => {
                cells.extend(words[..first].iter().copied().map(single));
                let (start, _) = words[first];
                let (last_col, last_word) = words[last];
                let text = words[first..=last]
                    .iter()
                    .map(|(_, w)| *w)
                    .collect::<Vec<_>>()
                    .join(" ");
                cells.push(Cell {
                    start,
                    end: last_col + last_word.chars().count(),
                    text,
                });
                cells.extend(words[last + 1..].iter().copied().map(single));
            }
            _ => cells.extend(words.into_iter().map(single)),
        }
    }
    cells
}

/// Header cells naming value columns.
fn value_columns(header: &str) -> Vec<(Role, Cell)> {
    chunks_of(header)
        .into_iter()
        .filter_map(|chunk| {
            let role = role_of(chunk.text)?;
            role.is_value().then(|| {
                (
                    role,
                    Cell {
                        start: chunk.column,
                        end: chunk.column + chunk.text.chars().count(),
                        text: chunk.text.to_string(),
                    },
                )
            })
        })
        .collect()
}

#[derive(Debug, Default)]
struct Row {
    codigo: Option<String>,
    descricao: Option<String>,
    quantidade: Option<String>,
    provento: Option<Money>,
    desconto: Option<Money>,
}

impl Row {
    fn into_entry(self) -> Option<RubricaEntry> {
        let descricao = self.descricao?;
        RubricaEntry::new(
            self.codigo,
            &descricao,
            self.quantidade,
            self.provento,
            self.desconto,
        )
        .filter(RubricaEntry::has_amount_or_code)
    }

    fn set_quantidade(&mut self, text: &str) {
        if self.quantidade.is_none() {
            self.quantidade = Some(text.to_string());
        }
    }
}

/// Split off the code and description; the remaining value cells are
/// returned for role assignment.
fn split_row(cells: Vec<Cell>) -> (Row, Vec<Cell>) {
    let mut row = Row::default();
    let mut iter = cells.into_iter().peekable();

    if let Some(first) = iter.peek() {
        if CODE.is_match(&first.text) {
            row.codigo = iter.next().map(|c| c.text);
        }
    }
    let mut values = Vec::new();
    for cell in iter {
        if row.descricao.is_none() && !cell.is_value() {
            row.descricao = Some(cell.text);
        } else if row.descricao.is_some() && cell.is_value() {
            values.push(cell);
        }
    }
    (row, values)
}

fn parse_with_header(cells: Vec<Cell>, columns: &[(Role, Cell)]) -> Option<RubricaEntry> {
    let (mut row, values) = split_row(cells);
    for cell in values {
        let role = columns
            .iter()
            .min_by_key(|(_, header)| cell.distance(header))
            .map(|(role, _)| *role);
        match role {
            Some(Role::Provento) if cell.is_money() => {
                row.provento = row.provento.or(amount(&cell.text));
            }
            Some(Role::Desconto) if cell.is_money() => {
                row.desconto = row.desconto.or(amount(&cell.text));
            }
            _ => row.set_quantidade(&cell.text),
        }
    }
    row.into_entry()
}

fn parse_positional(cells: Vec<Cell>) -> Option<RubricaEntry> {
    let (mut row, values) = split_row(cells);
    let money: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_money())
        .map(|(i, _)| i)
        .collect();
    let amounts: &[usize] = match money.len() {
        0 => &[],
        1 => &money[..],
        n => &money[n - 2..],
    };
    match amounts {
        [p] => row.provento = amount(&values[*p].text),
        [p, d] => {
            row.provento = amount(&values[*p].text);
            row.desconto = amount(&values[*d].text);
        }
        _ => {}
    }
    if let Some(q) = values
        .iter()
        .enumerate()
        .find(|(i, _)| !amounts.contains(i))
        .map(|(_, c)| c)
    {
        row.set_quantidade(&q.text);
    }
    row.into_entry()
}

fn skip_line(line: &str) -> bool {
    line.trim().is_empty() || is_separator(line)
}

/// Parse rubrica rows from layout text.
pub fn parse_lines(text: &str) -> Vec<RubricaEntry> {
    let lines: Vec<&str> = text.lines().collect();
    let header = lines.iter().position(|l| HEADER.is_match(&fold(l)));

    let mut entries = Vec::new();
    match header {
        Some(idx) => {
            let columns = value_columns(lines[idx]);
            for line in &lines[idx + 1..] {
                if is_total_marker(line) {
                    break;
                }
                if skip_line(line) {
                    continue;
                }
                let cells = cells_of(line);
                let entry = if columns.is_empty() {
                    parse_positional(cells)
                } else {
                    parse_with_header(cells, &columns)
                };
                entries.extend(entry);
            }
        }
        None => {
            for line in &lines {
                if is_total_marker(line) {
                    if entries.is_empty() {
                        continue;
                    }
                    break;
                }
                if skip_line(line) {
                    continue;
                }
                let cells = cells_of(line);
                if !cells.first().is_some_and(|c| CODE.is_match(&c.text)) {
                    continue;
                }
                // Without a header a leading number is not known to be a code.
                entries.extend(parse_positional(cells).filter(RubricaEntry::has_amount));
            }
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIP: &str = "\
Cód  Descrição                 Referência   Vencimentos    Descontos
001  SALARIO BASE                   30,00      2.000,00
210  COMISSOES                                   800,00
215  DSR S/ COMISSOES                 4,00       160,00
903  INSS                            9,00                     254,40
     ------------------------------------------------------------
     Total de Vencimentos                      2.960,00       254,40
999  NAO DEVE APARECER                           1,00";

    #[test]
    fn test_header_columns_assign_roles() {
        let entries = parse_lines(SLIP);
        assert_eq!(entries.len(), 4);

        assert_eq!(entries[0].codigo.as_deref(), Some("001"));
        assert_eq!(entries[0].descricao, "SALARIO BASE");
        assert_eq!(entries[0].quantidade.as_deref(), Some("30,00"));
        assert_eq!(entries[0].valor_provento, Some(Money::from_cents(200_000)));
        assert_eq!(entries[0].valor_desconto, None);

        assert_eq!(entries[1].quantidade, None);
        assert_eq!(entries[2].descricao, "DSR S/ COMISSOES");

        assert_eq!(entries[3].descricao, "INSS");
        assert_eq!(entries[3].valor_provento, None);
        assert_eq!(entries[3].valor_desconto, Some(Money::from_cents(25_440)));
    }

    #[test]
    fn test_missing_deductions_column() {
        let text = "\
COD  DESCRICAO         VENCIMENTOS
001  SALARIO BASE        2.000,00
002  HORAS EXTRAS 50%      300,00";
        let entries = parse_lines(text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].descricao, "HORAS EXTRAS 50%");
        assert_eq!(entries[1].valor_provento, Some(Money::from_cents(30_000)));
        assert!(entries.iter().all(|e| e.valor_desconto.is_none()));
    }

    #[test]
    fn test_positional_without_header() {
        let text = "\
ACME LTDA
001  SALARIO BASE  30  2.000,00
903  INSS  150,00  0,00
TOTAL  2.000,00";
        let entries = parse_lines(text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].quantidade.as_deref(), Some("30"));
        assert_eq!(entries[0].valor_provento, Some(Money::from_cents(200_000)));
        // Two money cells read as earnings then deductions.
        assert_eq!(entries[1].valor_provento, Some(Money::from_cents(15_000)));
        assert_eq!(entries[1].valor_desconto, None);
    }

    #[test]
    fn test_single_spaced_ocr_row() {
        let cells = cells_of("001 SALARIO BASE 30 2.000,00");
        let texts: Vec<&str> = cells.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["001", "SALARIO BASE", "30", "2.000,00"]);

        let entries = parse_lines("001 SALARIO BASE 30 2.000,00");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].codigo.as_deref(), Some("001"));
    }

    #[test]
    fn test_coded_row_without_amount_kept() {
        let text = "\
COD  DESCRICAO              VENCIMENTOS    DESCONTOS
001  SALARIO BASE             2.000,00
045  AUXILIO CRECHE
     OBSERVACAO INTERNA";
        let entries = parse_lines(text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].codigo.as_deref(), Some("045"));
        assert_eq!(entries[1].descricao, "AUXILIO CRECHE");
        assert!(!entries[1].has_amount());
    }

    #[test]
    fn test_headerless_row_needs_amount() {
        let text = "001  SALARIO BASE  2.000,00\n123  RUA DAS FLORES";
        let entries = parse_lines(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].descricao, "SALARIO BASE");
    }

    #[test]
    fn test_rows_without_description_dropped() {
        let text = "COD  DESCRICAO  VENCIMENTOS\n001             2.000,00";
        assert!(parse_lines(text).is_empty());
    }
}
