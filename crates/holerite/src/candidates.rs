//! Per-field candidate values.
//!
//! A [`FieldCandidates`] is an ordered set per field: values keep the order in
//! which they were discovered, duplicates are dropped on insert, and the
//! primary value of a field is its first candidate. Monetary fields compare by
//! amount, so `2.000,00` and `2000,00` are the same candidate.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::models::Field;
use crate::utils::money::Money;
use crate::utils::text::{collapse_whitespace, fold};

#[derive(Debug, Clone, PartialEq, Eq)]
enum CandidateKey {
    Amount(i64),
    Text(String),
}

fn candidate_key(field: Field, value: &str) -> CandidateKey {
    if field.is_money() {
        if let Some(money) = Money::parse(value) {
            return CandidateKey::Amount(money.cents());
        }
    }
    CandidateKey::Text(fold(&collapse_whitespace(value)))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCandidates {
    entries: BTreeMap<Field, Vec<String>>,
}

impl FieldCandidates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a candidate unless it is blank or already present.
    /// Returns whether it was added.
    pub fn push(&mut self, field: Field, value: impl Into<String>) -> bool {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return false;
        }
        let key = candidate_key(field, &value);
        let list = self.entries.entry(field).or_default();
        if list.iter().any(|existing| candidate_key(field, existing) == key) {
            return false;
        }
        list.push(value);
        true
    }

    pub fn extend<I, S>(&mut self, field: Field, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for value in values {
            self.push(field, value);
        }
    }

    /// Append every candidate of `other` after this set's own.
    pub fn merge(&mut self, other: &FieldCandidates) {
        for (field, values) in &other.entries {
            for value in values {
                self.push(*field, value.clone());
            }
        }
    }

    pub fn get(&self, field: Field) -> &[String] {
        self.entries.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First candidate, or empty string.
    pub fn primary(&self, field: Field) -> &str {
        self.get(field).first().map(String::as_str).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &[String])> {
        self.entries
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(f, v)| (*f, v.as_slice()))
    }

    /// Only fields with alternatives to pick from (two or more candidates).
    pub fn alternatives(&self) -> BTreeMap<&'static str, Vec<String>> {
        self.iter()
            .filter(|(_, values)| values.len() > 1)
            .map(|(field, values)| (field.as_str(), values.to_vec()))
            .collect()
    }

    pub fn primary_values(&self) -> PrimaryValues {
        PrimaryValues(
            self.iter()
                .map(|(field, values)| (field, values[0].clone()))
                .collect(),
        )
    }
}

impl Serialize for FieldCandidates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let non_empty: Vec<(Field, &[String])> = self.iter().collect();
        let mut map = serializer.serialize_map(Some(non_empty.len()))?;
        for (field, values) in non_empty {
            map.serialize_entry(field.as_str(), values)?;
        }
        map.end()
    }
}

/// Selected value per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimaryValues(BTreeMap<Field, String>);

impl PrimaryValues {
    pub fn get(&self, field: Field) -> &str {
        self.0.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn is_set(&self, field: Field) -> bool {
        !self.get(field).is_empty()
    }
}

/// Merge candidate lists in order, keeping first-seen order per field.
pub fn aggregate<I>(lists: I) -> (FieldCandidates, PrimaryValues)
where
    I: IntoIterator<Item = FieldCandidates>,
{
    let mut merged = FieldCandidates::new();
    for list in lists {
        merged.merge(&list);
    }
    let primary = merged.primary_values();
    (merged, primary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_preserves_first_seen_order() {
        let mut c = FieldCandidates::new();
        assert!(c.push(Field::Colaborador, "JOAO DA SILVA"));
        assert!(c.push(Field::Colaborador, "MARIA SOUZA"));
        assert!(!c.push(Field::Colaborador, "João  da Silva"));
        assert!(!c.push(Field::Colaborador, "   "));
        assert_eq!(c.get(Field::Colaborador), ["JOAO DA SILVA", "MARIA SOUZA"]);
        assert_eq!(c.primary(Field::Colaborador), "JOAO DA SILVA");
    }

    #[test]
    fn test_money_dedup_by_amount() {
        let mut c = FieldCandidates::new();
        c.push(Field::ValorLiquido, "1.850,00");
        c.push(Field::ValorLiquido, "1850,00");
        c.push(Field::ValorLiquido, "R$ 1850");
        c.push(Field::ValorLiquido, "1.900,00");
        assert_eq!(c.get(Field::ValorLiquido), ["1.850,00", "1.900,00"]);
    }

    #[test]
    fn test_aggregate_across_attempts() {
        let mut native = FieldCandidates::new();
        native.push(Field::CnpjEmpresa, "12.345.678/0001-90");
        let mut ocr = FieldCandidates::new();
        ocr.push(Field::CnpjEmpresa, "12.345.678/0001-90");
        ocr.push(Field::CnpjEmpresa, "12.345.678/0001-99");
        ocr.push(Field::Mes, "2024-07");

        let (merged, primary) = aggregate([native, ocr]);
        assert_eq!(
            merged.get(Field::CnpjEmpresa),
            ["12.345.678/0001-90", "12.345.678/0001-99"]
        );
        assert_eq!(primary.get(Field::CnpjEmpresa), "12.345.678/0001-90");
        assert_eq!(primary.get(Field::Mes), "2024-07");
        assert_eq!(primary.get(Field::Cargo), "");
    }

    #[test]
    fn test_alternatives_skip_single_candidates() {
        let mut c = FieldCandidates::new();
        c.push(Field::Mes, "2024-07");
        c.push(Field::Cargo, "VENDEDOR");
        c.push(Field::Cargo, "GERENTE");
        let alts = c.alternatives();
        assert_eq!(alts.len(), 1);
        assert_eq!(alts["cargo"], vec!["VENDEDOR", "GERENTE"]);
    }

    #[test]
    fn test_serialize_as_map() {
        let mut c = FieldCandidates::new();
        c.push(Field::Mes, "2024-07");
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"{"mes":["2024-07"]}"#);
    }
}
