//! End-to-end draft assembly scenarios.
//!
//! These run the whole pure pipeline (field rules, rubrica parsing,
//! aggregation, derivation, identity) on synthetic payslip text.

use holerite::derive::RubricaTotals;
use holerite::identity::compute_id;
use holerite::structured::{recover, AnalysisBlock, BlockType, DocumentAnalysis, EntityType};
use holerite::{
    Acquisition, AcquisitionStrategy, DraftAssembler, Field, JobContext, Money, RawText,
    RubricaEntry, ValidationStatus,
};

fn native(text: &str) -> Acquisition {
    Acquisition::text(RawText::new(text, AcquisitionStrategy::NativeText, 1))
}

fn entry(descricao: &str, provento: Option<i64>, desconto: Option<i64>) -> RubricaEntry {
    RubricaEntry {
        codigo: None,
        descricao: descricao.to_string(),
        quantidade: None,
        valor_provento: provento.map(Money::from_cents),
        valor_desconto: desconto.map(Money::from_cents),
    }
}

#[test]
fn test_minimal_slip_scenario() {
    let text = "\
CNPJ: 12.345.678/0001-90
Colaborador: JOAO DA SILVA
Julho de 2024
001  SALARIO BASE  30  2.000,00";

    let extraction = DraftAssembler::default().assemble(&[native(text)], &JobContext::new("julho.pdf"));
    let draft = &extraction.draft;

    assert_eq!(draft.cnpj_empresa, "12.345.678/0001-90");
    assert_eq!(draft.colaborador, "JOAO DA SILVA");
    assert_eq!(draft.mes, "2024-07");
    assert_eq!(draft.competencia, "Julho de 2024");
    assert_eq!(draft.salario_base, "2000,00");
    assert_eq!(draft.cpf_colaborador, "");
    assert_eq!(draft.status_validacao, ValidationStatus::Pendente);
    assert_eq!(draft.fonte_arquivo, "julho.pdf");

    assert_eq!(extraction.rubricas.len(), 1);
    assert_eq!(extraction.rubricas[0].codigo.as_deref(), Some("001"));
    assert_eq!(extraction.rubricas[0].quantidade.as_deref(), Some("30"));
    let rubricas: serde_json::Value = serde_json::from_str(&draft.rubricas_json).unwrap();
    assert_eq!(rubricas[0]["descricao"], "SALARIO BASE");
    assert_eq!(rubricas[0]["valor_provento"], "2000,00");
}

#[test]
fn test_full_layout_slip() {
    let text = "\
               RECIBO DE PAGAMENTO DE SALARIO
ACME COMERCIO DE ALIMENTOS LTDA
CNPJ: 12.345.678/0001-90                    Competência: Julho/2024
Código   Nome do Funcionário                CBO      Departamento
004512   MARIA APARECIDA SOUZA              521110   VENDAS
         Cargo: VENDEDOR I                           CPF: 123.456.789-09

Cód  Descrição                 Referência   Vencimentos    Descontos
001  SALARIO BASE                   30,00      2.000,00
210  COMISSOES                                   800,00
215  DSR S/ COMISSOES                 4,00       160,00
903  INSS                            9,00                     254,40
     Total de Vencimentos                      2.960,00       254,40

Sal. Contr. INSS    Base Cálc. FGTS    FGTS do Mês    Base Cálc. IRRF
2.960,00            2.960,00           236,80         2.705,60
Data de Pagamento: 05/08/2024";

    let ctx = JobContext::new("agosto.pdf").with_user_email("rh@acme.com.br");
    let extraction = DraftAssembler::default().assemble(&[native(text)], &ctx);
    let draft = &extraction.draft;

    assert_eq!(draft.empresa, "ACME COMERCIO DE ALIMENTOS LTDA");
    assert_eq!(draft.colaborador, "MARIA APARECIDA SOUZA");
    assert_eq!(draft.departamento, "VENDAS");
    assert_eq!(draft.cargo, "VENDEDOR I");
    assert_eq!(draft.mes, "2024-07");
    assert_eq!(draft.data_pagamento, "2024-08-05");
    assert_eq!(draft.total_proventos, "2960,00");
    assert_eq!(draft.valor_liquido, "2705,60");
    assert_eq!(draft.comissao, "800,00");
    assert_eq!(draft.dsr, "160,00");
    assert_eq!(draft.dias_dsr, "4,00");
    assert_eq!(draft.base_inss, "2960,00");
    assert_eq!(draft.base_fgts, "2960,00");
    assert_eq!(draft.fgts_mes, "236,80");
    assert_eq!(draft.base_irrf, "2705,60");
    assert_eq!(draft.user_email, "rh@acme.com.br");
    assert_eq!(draft.status_validacao, ValidationStatus::Ok);
    assert_eq!(extraction.rubricas.len(), 4);
}

#[test]
fn test_derived_totals_match_entry_sums() {
    let text = "\
COD  DESCRICAO          VENCIMENTOS    DESCONTOS
001  SALARIO BASE          2.000,00
002  HORA EXTRA              350,50
903  INSS                                 180,00
904  VALE TRANSPORTE                      120,00";

    let extraction = DraftAssembler::default().assemble(&[native(text)], &JobContext::new("x.pdf"));
    let proventos: Money = extraction.rubricas.iter().filter_map(|e| e.valor_provento).sum();
    let descontos: Money = extraction.rubricas.iter().filter_map(|e| e.valor_desconto).sum();

    assert_eq!(extraction.draft.total_proventos, proventos.to_br_string());
    assert_eq!(extraction.draft.total_descontos, descontos.to_br_string());
    assert_eq!(
        extraction.draft.valor_liquido,
        proventos.floored_sub(descontos).to_br_string()
    );
    assert_eq!(extraction.draft.valor_liquido, "2050,50");
    assert_eq!(extraction.draft.valor_bruto, "2350,50");
}

#[test]
fn test_empty_description_entries_do_not_change_totals() {
    let entries = vec![
        entry("SALARIO BASE", Some(150_000), None),
        entry("COMISSAO", Some(30_000), None),
        entry("IRRF", None, Some(4_500)),
    ];
    for blank in ["", "   "] {
        for position in 0..=entries.len() {
            let mut with_blank = entries.clone();
            with_blank.insert(position, entry(blank, Some(10_000), Some(2_500)));
            assert_eq!(
                RubricaTotals::from_entries(&entries),
                RubricaTotals::from_entries(&with_blank)
            );
        }
    }
}

#[test]
fn test_explicit_totals_are_not_overwritten() {
    let text = "\
COD  DESCRICAO          VENCIMENTOS    DESCONTOS
001  SALARIO BASE          2.000,00
903  INSS                                 150,00

Líquido a Receber: 1.800,00";

    let extraction = DraftAssembler::default().assemble(&[native(text)], &JobContext::new("y.pdf"));
    assert_eq!(extraction.draft.valor_liquido, "1800,00");
    assert_eq!(
        extraction.candidates.get(Field::ValorLiquido),
        ["1800,00", "1850,00"]
    );
}

#[test]
fn test_id_deterministic_and_distinct() {
    let text = |name: &str, month: &str| {
        format!(
            "ACME LTDA MATRIZ\nCNPJ: 12.345.678/0001-90\nColaborador: {}\nCompetência: {}",
            name, month
        )
    };
    let assembler = DraftAssembler::default();
    let ctx = JobContext::new("lote.pdf");

    let a1 = assembler.assemble(&[native(&text("JOAO DA SILVA", "07/2024"))], &ctx);
    let a2 = assembler.assemble(&[native(&text("JOAO DA SILVA", "07/2024"))], &ctx);
    let b = assembler.assemble(&[native(&text("MARIA SOUZA", "07/2024"))], &ctx);
    let c = assembler.assemble(&[native(&text("JOAO DA SILVA", "08/2024"))], &ctx);

    assert_eq!(a1.draft.id_holerite, a2.draft.id_holerite);
    assert_ne!(a1.draft.id_holerite, b.draft.id_holerite);
    assert_ne!(a1.draft.id_holerite, c.draft.id_holerite);
    assert_eq!(
        a1.draft.id_holerite,
        compute_id(
            &a1.draft.empresa,
            &a1.draft.cnpj_empresa,
            &a1.draft.colaborador,
            &a1.draft.mes,
            "lote.pdf"
        )
    );
}

#[test]
fn test_structured_evidence_ranks_first() {
    let analysis = DocumentAnalysis::new(vec![
        AnalysisBlock::new("k1", BlockType::KeyValueSet)
            .with_entity(EntityType::Key)
            .with_children(&["w1"])
            .with_value(&["v1"]),
        AnalysisBlock::new("v1", BlockType::KeyValueSet)
            .with_entity(EntityType::Value)
            .with_children(&["w2", "w3"]),
        AnalysisBlock::new("w1", BlockType::Word).with_text("Colaborador"),
        AnalysisBlock::new("w2", BlockType::Word).with_text("JOAO"),
        AnalysisBlock::new("w3", BlockType::Word).with_text("SILVA"),
        AnalysisBlock::new("l1", BlockType::Line).with_text("Colaborador: JOAO SILVEIRA"),
    ]);
    let raw = RawText::new(analysis.text_lines(), AcquisitionStrategy::CloudAnalysis, 1);
    let attempt = Acquisition::structured(raw, recover(&analysis));

    let extraction = DraftAssembler::default().assemble(&[attempt], &JobContext::new("z.pdf"));
    assert_eq!(
        extraction.candidates.get(Field::Colaborador),
        ["JOAO SILVA", "JOAO SILVEIRA"]
    );
    assert_eq!(extraction.draft.colaborador, "JOAO SILVA");
}

#[test]
fn test_duplicated_voucher_copy_is_ignored() {
    let copy = "\
ACME LTDA
CNPJ: 12.345.678/0001-90
Colaborador: JOAO DA SILVA
Cargo: VENDEDOR
DECLARO TER RECEBIDO A IMPORTANCIA LIQUIDA DISCRIMINADA";
    let text = format!("{}\n\n{}", copy, copy.replace("VENDEDOR", "GERENTE"));

    let extraction = DraftAssembler::default().assemble(&[native(&text)], &JobContext::new("dup.pdf"));
    assert_eq!(extraction.candidates.get(Field::Cargo), ["VENDEDOR"]);
}
