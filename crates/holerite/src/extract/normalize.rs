//! Value normalizers for field rules.
//!
//! A normalizer knows how to recognize a value of its kind inside a label
//! tail or a nearby line, and how to put it in canonical form.

use std::sync::LazyLock;

use regex::Regex;

use super::document::{chunks_of, TextLine};
use crate::utils::dates::{normalize_date, parse_period, DATE_PATTERN};
use crate::utils::money::{Money, MONEY_PATTERN};
use crate::utils::text::{collapse_whitespace, fold, CNPJ_PATTERN, CPF_PATTERN};

/// Words that start a label rather than a value.
const LABEL_WORDS: &[&str] = &[
    "ADMISSAO",
    "AGENCIA",
    "BANCO",
    "CARGO",
    "CBO",
    "CNPJ",
    "COD",
    "CODIGO",
    "COLABORADOR",
    "COMPETENCIA",
    "CONTA",
    "CPF",
    "DATA",
    "DEPARTAMENTO",
    "DEPTO",
    "DESCONTOS",
    "DESCRICAO",
    "EMPREGADO",
    "EMPRESA",
    "FUNCAO",
    "FUNCIONARIO",
    "LIQUIDO",
    "MATRICULA",
    "NOME",
    "PROVENTOS",
    "REFERENCIA",
    "SALARIO",
    "SETOR",
    "TOTAL",
    "VENCIMENTOS",
];

static LEADING_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s:\-–—.#ºª°=]+").unwrap());

static CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9./\-]{0,24}$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalizer {
    /// Person name: letters and spaces only.
    Name,
    /// Free text such as a company, job title, or department.
    Text,
    /// Short identifier with at least one digit.
    Code,
    Cnpj,
    Cpf,
    Money,
    Date,
    /// Display form of the pay period.
    Competencia,
    /// `YYYY-MM` pay period key.
    Mes,
}

impl Normalizer {
    /// Canonicalize a standalone raw value.
    pub fn apply(&self, raw: &str) -> Option<String> {
        let value = collapse_whitespace(LEADING_SEPARATORS.replace(raw, "").as_ref());
        let value = value.trim_end_matches([':', '-', ',', ';']).trim().to_string();
        if value.is_empty() {
            return None;
        }
        match self {
            Normalizer::Name => normalize_name(&value),
            Normalizer::Text => normalize_text(&value),
            Normalizer::Code => normalize_code(&value),
            Normalizer::Cnpj => format_digits(&value, 14, &[(2, "."), (5, "."), (8, "/"), (12, "-")]),
            Normalizer::Cpf => format_digits(&value, 11, &[(3, "."), (6, "."), (9, "-")]),
            Normalizer::Money => Money::parse(&value).map(Money::to_br_string),
            Normalizer::Date => normalize_date(&value),
            Normalizer::Competencia => parse_period(&value).map(|p| p.competencia()),
            Normalizer::Mes => parse_period(&value).map(|p| p.mes()),
        }
    }

    /// Pattern locating a value of this kind inside longer text.
    fn pattern(&self) -> Option<&'static Regex> {
        match self {
            Normalizer::Cnpj => Some(&*CNPJ_PATTERN),
            Normalizer::Cpf => Some(&*CPF_PATTERN),
            Normalizer::Money => Some(&*MONEY_PATTERN),
            Normalizer::Date => Some(&*DATE_PATTERN),
            _ => None,
        }
    }

    /// Find a value in `text`: pattern search for shaped values, whole-text
    /// period parsing, otherwise the first column chunk.
    pub fn find_in(&self, text: &str) -> Option<String> {
        if let Some(pattern) = self.pattern() {
            return pattern
                .find_iter(text)
                .find_map(|m| self.apply(m.as_str()));
        }
        match self {
            Normalizer::Competencia | Normalizer::Mes => self.apply(text),
            _ => {
                let stripped = LEADING_SEPARATORS.replace(text, "");
                let first = chunks_of(stripped.as_ref()).into_iter().next()?;
                self.apply(first.text)
            }
        }
    }

    /// Find a value on a following line, preferring the chunk closest to the
    /// label's column.
    pub fn find_near(&self, line: &TextLine, column: usize) -> Option<String> {
        let mut chunks = line.chunks();
        chunks.sort_by_key(|c| c.column.abs_diff(column));
        chunks.into_iter().find_map(|c| self.find_in(c.text))
    }
}

fn starts_with_label(value: &str) -> bool {
    let folded = fold(value);
    folded
        .split(|c: char| !c.is_ascii_alphanumeric())
        .find(|w| !w.is_empty())
        .is_some_and(|first| LABEL_WORDS.contains(&first))
}

fn normalize_name(value: &str) -> Option<String> {
    let letters = value.chars().filter(|c| c.is_alphabetic()).count();
    let valid = value
        .chars()
        .all(|c| c.is_alphabetic() || c == ' ' || c == '\'' || c == '.' || c == '-');
    if !valid || letters < 3 || starts_with_label(value) {
        return None;
    }
    Some(value.to_string())
}

fn normalize_text(value: &str) -> Option<String> {
    let letters = value.chars().filter(|c| c.is_alphabetic()).count();
    if letters < 2 || starts_with_label(value) || MONEY_PATTERN.is_match(value) {
        return None;
    }
    Some(value.to_string())
}

fn normalize_code(value: &str) -> Option<String> {
    let token = value.split_whitespace().next()?;
    if CODE.is_match(token) && token.chars().any(|c| c.is_ascii_digit()) {
        Some(token.to_string())
    } else {
        None
    }
}

/// Keep digits; require exactly `len` of them and insert separators at the
/// given positions.
fn format_digits(value: &str, len: usize, separators: &[(usize, &str)]) -> Option<String> {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    let non_digits = value
        .chars()
        .filter(|c| !c.is_ascii_digit() && !matches!(c, '.' | '/' | '-' | ' '))
        .count();
    if digits.len() != len || non_digits > 0 {
        return None;
    }
    let mut out = String::with_capacity(len + separators.len());
    for (i, c) in digits.chars().enumerate() {
        if let Some((_, sep)) = separators.iter().find(|(pos, _)| *pos == i) {
            out.push_str(sep);
        }
        out.push(c);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name() {
        assert_eq!(Normalizer::Name.apply(": JOAO  DA SILVA"), Some("JOAO DA SILVA".into()));
        assert_eq!(Normalizer::Name.apply("João D'Ávila"), Some("João D'Ávila".into()));
        assert_eq!(Normalizer::Name.apply("12345"), None);
        assert_eq!(Normalizer::Name.apply("Cargo"), None);
    }

    #[test]
    fn test_cnpj_and_cpf() {
        assert_eq!(
            Normalizer::Cnpj.apply("12345678000190"),
            Some("12.345.678/0001-90".into())
        );
        assert_eq!(
            Normalizer::Cnpj.apply("12.345.678/0001-90"),
            Some("12.345.678/0001-90".into())
        );
        assert_eq!(Normalizer::Cnpj.apply("12.345.678/0001"), None);
        assert_eq!(Normalizer::Cpf.apply("12345678909"), Some("123.456.789-09".into()));
    }

    #[test]
    fn test_code() {
        assert_eq!(Normalizer::Code.apply("#  004512 "), Some("004512".into()));
        assert_eq!(Normalizer::Code.apply("ABC"), None);
    }

    #[test]
    fn test_find_in_tail() {
        assert_eq!(
            Normalizer::Money.find_in("  30  2.000,00"),
            Some("2000,00".into())
        );
        assert_eq!(
            Normalizer::Cnpj.find_in(": 12.345.678/0001-90   Filial"),
            Some("12.345.678/0001-90".into())
        );
        assert_eq!(
            Normalizer::Text.find_in(":  VENDEDOR I    Depto: VENDAS"),
            Some("VENDEDOR I".into())
        );
        assert_eq!(
            Normalizer::Competencia.find_in(" Julho de 2024"),
            Some("Julho de 2024".into())
        );
    }

    #[test]
    fn test_find_near_prefers_closest_column() {
        let line = TextLine::new("JOAO DA SILVA              VENDEDOR");
        assert_eq!(Normalizer::Text.find_near(&line, 26), Some("VENDEDOR".into()));
        assert_eq!(Normalizer::Name.find_near(&line, 0), Some("JOAO DA SILVA".into()));
    }
}
