//! Semantic payslip fields.

use serde::{Deserialize, Serialize};

/// One semantic field of a [`HoleriteDraft`](super::HoleriteDraft).
///
/// Declaration order is the output order of candidate maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    IdHolerite,
    Mes,
    Competencia,
    Empresa,
    CnpjEmpresa,
    Colaborador,
    CpfColaborador,
    Matricula,
    Cargo,
    Departamento,
    SalarioBase,
    Comissao,
    Dsr,
    DiasDsr,
    ValorBruto,
    ValorLiquido,
    DataPagamento,
    UserEmail,
    FonteArquivo,
    HoleriteId,
    RubricasJson,
    StatusValidacao,
    TotalProventos,
    TotalDescontos,
    BaseInss,
    BaseFgts,
    BaseIrrf,
    FgtsMes,
}

impl Field {
    pub const ALL: [Field; 28] = [
        Field::IdHolerite,
        Field::Mes,
        Field::Competencia,
        Field::Empresa,
        Field::CnpjEmpresa,
        Field::Colaborador,
        Field::CpfColaborador,
        Field::Matricula,
        Field::Cargo,
        Field::Departamento,
        Field::SalarioBase,
        Field::Comissao,
        Field::Dsr,
        Field::DiasDsr,
        Field::ValorBruto,
        Field::ValorLiquido,
        Field::DataPagamento,
        Field::UserEmail,
        Field::FonteArquivo,
        Field::HoleriteId,
        Field::RubricasJson,
        Field::StatusValidacao,
        Field::TotalProventos,
        Field::TotalDescontos,
        Field::BaseInss,
        Field::BaseFgts,
        Field::BaseIrrf,
        Field::FgtsMes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::IdHolerite => "id_holerite",
            Field::Mes => "mes",
            Field::Competencia => "competencia",
            Field::Empresa => "empresa",
            Field::CnpjEmpresa => "cnpj_empresa",
            Field::Colaborador => "colaborador",
            Field::CpfColaborador => "cpf_colaborador",
            Field::Matricula => "matricula",
            Field::Cargo => "cargo",
            Field::Departamento => "departamento",
            Field::SalarioBase => "salario_base",
            Field::Comissao => "comissao",
            Field::Dsr => "dsr",
            Field::DiasDsr => "dias_dsr",
            Field::ValorBruto => "valor_bruto",
            Field::ValorLiquido => "valor_liquido",
            Field::DataPagamento => "data_pagamento",
            Field::UserEmail => "user_email",
            Field::FonteArquivo => "fonte_arquivo",
            Field::HoleriteId => "holerite_id",
            Field::RubricasJson => "rubricas_json",
            Field::StatusValidacao => "status_validacao",
            Field::TotalProventos => "total_proventos",
            Field::TotalDescontos => "total_descontos",
            Field::BaseInss => "base_inss",
            Field::BaseFgts => "base_fgts",
            Field::BaseIrrf => "base_irrf",
            Field::FgtsMes => "fgts_mes",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Field::ALL.iter().copied().find(|f| f.as_str() == s)
    }

    /// Whether values of this field are Brazilian-format amounts.
    pub fn is_money(&self) -> bool {
        matches!(
            self,
            Field::SalarioBase
                | Field::Comissao
                | Field::Dsr
                | Field::ValorBruto
                | Field::ValorLiquido
                | Field::TotalProventos
                | Field::TotalDescontos
                | Field::BaseInss
                | Field::BaseFgts
                | Field::BaseIrrf
                | Field::FgtsMes
        )
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
