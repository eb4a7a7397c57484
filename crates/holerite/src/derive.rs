//! Summary values computed from rubrica entries.
//!
//! Derived values only fill gaps: a field that already has a directly
//! extracted candidate keeps it as primary, and the derived value is appended
//! after it as an alternative.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::candidates::FieldCandidates;
use crate::models::{Field, RubricaEntry};
use crate::utils::money::Money;
use crate::utils::text::fold;

static BASE_SALARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bSALARIO\s+(?:BASE|MENSAL|CONTRATUAL)\b|\bSAL\.?\s+BASE\b").unwrap()
});

static COMMISSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bCOMISS").unwrap());

static REST_PAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bDSR\b|DESCANSO\s+SEMANAL\s+REMUNERADO|\bREP\.?\s*REM").unwrap()
});

/// Sums over rubrica entries. Entries without a description never count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RubricaTotals {
    pub proventos: Money,
    pub descontos: Money,
    pub comissao: Option<Money>,
    pub dsr: Option<Money>,
    pub dias_dsr: Option<String>,
    pub salario_base: Option<Money>,
}

fn net(entry: &RubricaEntry) -> Money {
    entry.valor_provento.unwrap_or(Money::ZERO) - entry.valor_desconto.unwrap_or(Money::ZERO)
}

fn sum_matching(entries: &[&RubricaEntry], matches: impl Fn(&str) -> bool) -> Option<Money> {
    let matching: Vec<&&RubricaEntry> = entries
        .iter()
        .filter(|e| matches(&fold(&e.descricao)))
        .collect();
    if matching.is_empty() {
        None
    } else {
        Some(matching.into_iter().map(|e| net(e)).sum())
    }
}

impl RubricaTotals {
    pub fn from_entries(entries: &[RubricaEntry]) -> Self {
        let counted: Vec<&RubricaEntry> = entries
            .iter()
            .filter(|e| !e.descricao.trim().is_empty())
            .collect();

        let proventos = counted.iter().filter_map(|e| e.valor_provento).sum();
        let descontos = counted.iter().filter_map(|e| e.valor_desconto).sum();

        let is_rest = |d: &str| REST_PAY.is_match(d);
        let comissao = sum_matching(&counted, |d| COMMISSION.is_match(d) && !is_rest(d));
        let dsr = sum_matching(&counted, is_rest);
        let dias_dsr = counted
            .iter()
            .find(|e| is_rest(&fold(&e.descricao)))
            .and_then(|e| e.quantidade.clone());
        let salario_base = counted
            .iter()
            .find(|e| BASE_SALARY.is_match(&fold(&e.descricao)))
            .and_then(|e| e.valor_provento);

        Self {
            proventos,
            descontos,
            comissao,
            dsr,
            dias_dsr,
            salario_base,
        }
    }
}

/// Fill summary fields from rubrica sums.
///
/// Earnings and deductions totals are derived only when there are entries;
/// net pay is `max(earnings - deductions, 0)` using the effective (extracted
/// or derived) totals. Returns the totals used.
pub fn derive_values(candidates: &mut FieldCandidates, entries: &[RubricaEntry]) -> RubricaTotals {
    let totals = RubricaTotals::from_entries(entries);
    if entries.iter().all(|e| e.descricao.trim().is_empty()) {
        return totals;
    }

    let effective = |candidates: &FieldCandidates, field: Field, derived: Money| {
        Money::parse(candidates.primary(field)).unwrap_or(derived)
    };

    add_derived(candidates, Field::TotalProventos, totals.proventos.to_br_string());
    add_derived(candidates, Field::TotalDescontos, totals.descontos.to_br_string());

    let proventos = effective(candidates, Field::TotalProventos, totals.proventos);
    let descontos = effective(candidates, Field::TotalDescontos, totals.descontos);
    add_derived(
        candidates,
        Field::ValorLiquido,
        proventos.floored_sub(descontos).to_br_string(),
    );
    add_derived(candidates, Field::ValorBruto, proventos.to_br_string());

    if let Some(value) = totals.salario_base {
        add_derived(candidates, Field::SalarioBase, value.to_br_string());
    }
    if let Some(value) = totals.comissao {
        add_derived(candidates, Field::Comissao, value.to_br_string());
    }
    if let Some(value) = totals.dsr {
        add_derived(candidates, Field::Dsr, value.to_br_string());
    }
    if let Some(days) = &totals.dias_dsr {
        add_derived(candidates, Field::DiasDsr, days.clone());
    }

    totals
}

fn add_derived(candidates: &mut FieldCandidates, field: Field, value: String) {
    let had_primary = !candidates.primary(field).is_empty();
    if candidates.push(field, value.clone()) && !had_primary {
        debug!("Derived {} = {}", field, value);
    }
}
