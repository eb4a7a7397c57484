//! Earnings/deduction line items.

use serde::{Deserialize, Serialize};

use crate::utils::money::Money;

/// One earnings or deduction line of a payslip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricaEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codigo: Option<String>,
    pub descricao: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantidade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valor_provento: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valor_desconto: Option<Money>,
}

impl RubricaEntry {
    /// Build an entry, rejecting rows without a description.
    pub fn new(
        codigo: Option<String>,
        descricao: &str,
        quantidade: Option<String>,
        valor_provento: Option<Money>,
        valor_desconto: Option<Money>,
    ) -> Option<Self> {
        let descricao = descricao.split_whitespace().collect::<Vec<_>>().join(" ");
        if descricao.is_empty() {
            return None;
        }
        Some(Self {
            codigo: codigo.filter(|c| !c.trim().is_empty()),
            descricao,
            quantidade: quantidade.filter(|q| !q.trim().is_empty()),
            valor_provento,
            valor_desconto,
        })
    }

    pub fn has_amount(&self) -> bool {
        self.valor_provento.is_some() || self.valor_desconto.is_some()
    }

    /// Whether a parsed row is worth keeping: it carries an amount, or a
    /// code that identifies the rubrica even when its value cell is blank.
    pub fn has_amount_or_code(&self) -> bool {
        self.has_amount() || self.codigo.is_some()
    }
}
