//! The payslip draft record.

use serde::{Deserialize, Serialize};

use super::Field;

/// Advisory completeness status of a draft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Ok,
    #[default]
    Pendente,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Pendente => "pendente",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ok" => Some(Self::Ok),
            "pendente" => Some(Self::Pendente),
            _ => None,
        }
    }
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extracted payslip record handed to the review workflow.
///
/// Monetary fields hold canonical Brazilian decimal strings (`2000,00`),
/// dates are ISO `YYYY-MM-DD`, and `mes` is `YYYY-MM`. Empty strings mean
/// "not found". A draft is never mutated after assembly; review edits
/// produce a new value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoleriteDraft {
    pub id_holerite: String,
    pub mes: String,
    pub competencia: String,
    pub empresa: String,
    pub cnpj_empresa: String,
    pub colaborador: String,
    pub cpf_colaborador: String,
    pub matricula: String,
    pub cargo: String,
    pub departamento: String,
    pub salario_base: String,
    pub comissao: String,
    pub dsr: String,
    pub dias_dsr: String,
    pub valor_bruto: String,
    pub valor_liquido: String,
    pub data_pagamento: String,
    pub user_email: String,
    pub fonte_arquivo: String,
    pub holerite_id: String,
    pub rubricas_json: String,
    pub status_validacao: ValidationStatus,
    pub total_proventos: String,
    pub total_descontos: String,
    pub base_inss: String,
    pub base_fgts: String,
    pub base_irrf: String,
    pub fgts_mes: String,
    /// Set only when every acquisition strategy failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub erro_extracao: Option<String>,
}

impl HoleriteDraft {
    /// Value of a field as a string.
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::IdHolerite => &self.id_holerite,
            Field::Mes => &self.mes,
            Field::Competencia => &self.competencia,
            Field::Empresa => &self.empresa,
            Field::CnpjEmpresa => &self.cnpj_empresa,
            Field::Colaborador => &self.colaborador,
            Field::CpfColaborador => &self.cpf_colaborador,
            Field::Matricula => &self.matricula,
            Field::Cargo => &self.cargo,
            Field::Departamento => &self.departamento,
            Field::SalarioBase => &self.salario_base,
            Field::Comissao => &self.comissao,
            Field::Dsr => &self.dsr,
            Field::DiasDsr => &self.dias_dsr,
            Field::ValorBruto => &self.valor_bruto,
            Field::ValorLiquido => &self.valor_liquido,
            Field::DataPagamento => &self.data_pagamento,
            Field::UserEmail => &self.user_email,
            Field::FonteArquivo => &self.fonte_arquivo,
            Field::HoleriteId => &self.holerite_id,
            Field::RubricasJson => &self.rubricas_json,
            Field::StatusValidacao => self.status_validacao.as_str(),
            Field::TotalProventos => &self.total_proventos,
            Field::TotalDescontos => &self.total_descontos,
            Field::BaseInss => &self.base_inss,
            Field::BaseFgts => &self.base_fgts,
            Field::BaseIrrf => &self.base_irrf,
            Field::FgtsMes => &self.fgts_mes,
        }
    }

    /// Set a field from its string form. Unknown status strings leave the
    /// status unchanged.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        let slot = match field {
            Field::IdHolerite => &mut self.id_holerite,
            Field::Mes => &mut self.mes,
            Field::Competencia => &mut self.competencia,
            Field::Empresa => &mut self.empresa,
            Field::CnpjEmpresa => &mut self.cnpj_empresa,
            Field::Colaborador => &mut self.colaborador,
            Field::CpfColaborador => &mut self.cpf_colaborador,
            Field::Matricula => &mut self.matricula,
            Field::Cargo => &mut self.cargo,
            Field::Departamento => &mut self.departamento,
            Field::SalarioBase => &mut self.salario_base,
            Field::Comissao => &mut self.comissao,
            Field::Dsr => &mut self.dsr,
            Field::DiasDsr => &mut self.dias_dsr,
            Field::ValorBruto => &mut self.valor_bruto,
            Field::ValorLiquido => &mut self.valor_liquido,
            Field::DataPagamento => &mut self.data_pagamento,
            Field::UserEmail => &mut self.user_email,
            Field::FonteArquivo => &mut self.fonte_arquivo,
            Field::HoleriteId => &mut self.holerite_id,
            Field::RubricasJson => &mut self.rubricas_json,
            Field::StatusValidacao => {
                if let Some(status) = ValidationStatus::from_str(&value) {
                    self.status_validacao = status;
                }
                return;
            }
            Field::TotalProventos => &mut self.total_proventos,
            Field::TotalDescontos => &mut self.total_descontos,
            Field::BaseInss => &mut self.base_inss,
            Field::BaseFgts => &mut self.base_fgts,
            Field::BaseIrrf => &mut self.base_irrf,
            Field::FgtsMes => &mut self.fgts_mes,
        };
        *slot = value;
    }

    /// Persistence upsert key: `(cnpj_empresa, cpf_colaborador, mes, fonte_arquivo)`.
    pub fn upsert_key(&self) -> (&str, &str, &str, &str) {
        (
            &self.cnpj_empresa,
            &self.cpf_colaborador,
            &self.mes,
            &self.fonte_arquivo,
        )
    }
}
