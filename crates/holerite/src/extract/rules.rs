//! Declarative field rules.
//!
//! Each field is described once by a [`FieldDef`]: structured-evidence key
//! aliases, plain-text label patterns, an optional whole-document scan, and
//! the normalizer applied to every value found. [`default_rules`] expands the
//! table into prioritized [`FieldRule`]s consumed by the registry loop.

use std::sync::LazyLock;

use regex::Regex;

use super::document::DocumentText;
use super::normalize::Normalizer;
use super::FieldExtractor;
use crate::error::RuleError;
use crate::models::{Field, StructuredEvidence};
use crate::utils::dates::find_periods;
use crate::utils::text::{fold, CNPJ_PATTERN, CPF_PATTERN};

/// Structured key-value hits.
pub const TIER_STRUCTURED: u8 = 0;
/// Label-proximity search in plain text.
pub const TIER_LABEL: u8 = 1;
/// Whole-document pattern scan.
pub const TIER_SCAN: u8 = 2;

/// A code-led rubrica row: `001  SALARIO BASE ...`.
static ITEM_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{1,6}[A-Z]?\s+[A-Z]").unwrap());

/// Lines after a label searched for its value.
pub const LABEL_WINDOW: usize = 3;

/// How a rule finds raw values.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// Look up structured key-value evidence. `aliases` match when all their
    /// words appear in the key in order; `exact` match the whole key.
    KeyValue {
        aliases: Vec<String>,
        exact: Vec<String>,
    },
    /// Find a label in the folded text and read the value after it, or on
    /// one of the next `window` lines.
    Label { label: Regex, window: usize },
    /// Scan the whole document.
    Scan(Scanner),
}

#[derive(Debug, Clone)]
pub enum Scanner {
    /// Every match of a pattern, in order.
    Pattern(Regex),
    /// Uppercase line just above (or beside) the first CNPJ.
    CompanyNearCnpj,
    /// Every pay period mentioned.
    Periods,
}

/// One prioritized extraction rule for a field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: Field,
    pub priority: u8,
    pub strategy: Strategy,
    pub normalizer: Normalizer,
}

impl FieldRule {
    pub fn label(field: Field, pattern: &str, normalizer: Normalizer) -> Result<Self, RuleError> {
        let label = Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
            field: field.as_str().to_string(),
            source,
        })?;
        Ok(Self {
            field,
            priority: TIER_LABEL,
            strategy: Strategy::Label {
                label,
                window: LABEL_WINDOW,
            },
            normalizer,
        })
    }

    fn from_structured(&self, evidence: &StructuredEvidence, aliases: &[String], exact: &[String]) -> Vec<String> {
        let mut values = Vec::new();
        for alias in aliases {
            values.extend(evidence.values_for(alias).filter_map(|v| self.normalizer.apply(v)));
        }
        for label in exact {
            values.extend(evidence.values_exact(label).filter_map(|v| self.normalizer.apply(v)));
        }
        values
    }

    fn from_labels(&self, doc: &DocumentText, label: &Regex, window: usize) -> Vec<String> {
        let lines = doc.lines();
        let mut values = Vec::new();
        for (idx, line) in lines.iter().enumerate() {
            // Amounts on rubrica rows belong to the row, not to a summary label.
            if self.normalizer == Normalizer::Money && ITEM_ROW.is_match(line.folded()) {
                continue;
            }
            for m in label.find_iter(line.folded()) {
                if let Some(value) = self.normalizer.find_in(line.tail_from(m.end())) {
                    values.push(value);
                    continue;
                }
                let column = line.column_of(m.start());
                let nearby = lines[idx + 1..]
                    .iter()
                    .filter(|l| !l.is_blank())
                    .take(window)
                    .find_map(|l| self.normalizer.find_near(l, column));
                if let Some(value) = nearby {
                    values.push(value);
                }
            }
        }
        values
    }

    fn from_scan(&self, doc: &DocumentText, scanner: &Scanner) -> Vec<String> {
        match scanner {
            Scanner::Pattern(pattern) => pattern
                .find_iter(&fold(doc.text()))
                .filter_map(|m| self.normalizer.apply(m.as_str()))
                .collect(),
            Scanner::Periods => find_periods(doc.text())
                .into_iter()
                .filter_map(|p| self.normalizer.apply(&p.competencia()))
                .collect(),
            Scanner::CompanyNearCnpj => company_near_cnpj(doc, self.normalizer)
                .into_iter()
                .collect(),
        }
    }
}

impl FieldExtractor for FieldRule {
    fn field(&self) -> Field {
        self.field
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    fn extract(
        &self,
        doc: &DocumentText,
        evidence: Option<&StructuredEvidence>,
    ) -> Result<Vec<String>, RuleError> {
        Ok(match &self.strategy {
            Strategy::KeyValue { aliases, exact } => match evidence {
                Some(evidence) => self.from_structured(evidence, aliases, exact),
                None => Vec::new(),
            },
            Strategy::Label { label, window } => self.from_labels(doc, label, *window),
            Strategy::Scan(scanner) => self.from_scan(doc, scanner),
        })
    }
}

/// Header words that sit above the company name but are not it.
const TITLE_WORDS: &[&str] = &[
    "RECIBO",
    "DEMONSTRATIVO",
    "HOLERITE",
    "CONTRACHEQUE",
    "FOLHA",
    "PAGAMENTO",
    "CNPJ",
    "ENDERECO",
    "CEP",
];

fn looks_like_company(text: &str) -> bool {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < 6 {
        return false;
    }
    let upper = letters.iter().filter(|c| c.is_uppercase()).count();
    let folded = fold(text);
    let first_word = folded.split_whitespace().next().unwrap_or("");
    upper * 10 >= letters.len() * 8 && !TITLE_WORDS.contains(&first_word)
}

/// The company name printed beside or above the first CNPJ.
fn company_near_cnpj(doc: &DocumentText, normalizer: Normalizer) -> Option<String> {
    let lines = doc.lines();
    let idx = lines.iter().position(|l| CNPJ_PATTERN.is_match(l.folded()))?;

    let line = &lines[idx];
    let label_start = line.folded().find("CNPJ");
    let number_start = CNPJ_PATTERN.find(line.folded()).map(|m| m.start());
    let cut = label_start.into_iter().chain(number_start).min()?;
    let beside = line.head_to(cut);
    if let Some(chunk) = super::document::chunks_of(beside).into_iter().next() {
        if looks_like_company(chunk.text) {
            if let Some(value) = normalizer.apply(chunk.text) {
                return Some(value);
            }
        }
    }

    lines[idx.saturating_sub(4)..idx]
        .iter()
        .rev()
        .filter(|l| !l.is_blank())
        .filter_map(|l| l.chunks().into_iter().next())
        .filter(|c| looks_like_company(c.text))
        .find_map(|c| normalizer.apply(c.text))
}

/// Declarative description of one field's rules.
struct FieldDef {
    field: Field,
    normalizer: Normalizer,
    aliases: &'static [&'static str],
    exact: &'static [&'static str],
    /// Alternatives of one label regex, longest first. Matched against
    /// folded (accent-free, uppercase) lines.
    labels: &'static [&'static str],
    scan: Option<fn() -> Scanner>,
}

fn cnpj_scan() -> Scanner {
    Scanner::Pattern(CNPJ_PATTERN.clone())
}

fn cpf_scan() -> Scanner {
    Scanner::Pattern(CPF_PATTERN.clone())
}

fn periods_scan() -> Scanner {
    Scanner::Periods
}

fn company_scan() -> Scanner {
    Scanner::CompanyNearCnpj
}

const FIELD_RULES: &[FieldDef] = &[
    FieldDef {
        field: Field::Empresa,
        normalizer: Normalizer::Text,
        aliases: &["razao social", "empregador", "empresa"],
        exact: &[],
        labels: &[r"\bRAZAO\s+SOCIAL\b", r"\bEMPREGADOR\b", r"\bEMPRESA\b"],
        scan: Some(company_scan),
    },
    FieldDef {
        field: Field::CnpjEmpresa,
        normalizer: Normalizer::Cnpj,
        aliases: &["cnpj"],
        exact: &[],
        labels: &[r"\bCNPJ\b"],
        scan: Some(cnpj_scan),
    },
    FieldDef {
        field: Field::Colaborador,
        normalizer: Normalizer::Name,
        aliases: &["funcionario", "empregado", "colaborador"],
        exact: &["nome"],
        labels: &[
            r"\bNOME\s+DO\s+(?:FUNCIONARIO|EMPREGADO|COLABORADOR)\b",
            r"\b(?:FUNCIONARIO|EMPREGADO|COLABORADOR)\b",
            r"^\s*NOME\s*:",
        ],
        scan: None,
    },
    FieldDef {
        field: Field::CpfColaborador,
        normalizer: Normalizer::Cpf,
        aliases: &["cpf"],
        exact: &[],
        labels: &[r"\bCPF\b"],
        scan: Some(cpf_scan),
    },
    FieldDef {
        field: Field::Matricula,
        normalizer: Normalizer::Code,
        aliases: &["matricula", "registro"],
        exact: &[],
        labels: &[
            r"\bCOD(?:IGO)?\.?\s+(?:DO\s+)?FUNCIONARIO\b",
            r"\bMATRICULA\b",
            r"\bMATR?\.",
            r"\bREGISTRO\b",
            r"\bCHAPA\b",
        ],
        scan: None,
    },
    FieldDef {
        field: Field::Cargo,
        normalizer: Normalizer::Text,
        aliases: &["cargo", "funcao"],
        exact: &[],
        labels: &[r"\bCARGO\b", r"\bFUNCAO\b"],
        scan: None,
    },
    FieldDef {
        field: Field::Departamento,
        normalizer: Normalizer::Text,
        aliases: &["departamento", "depto", "setor", "lotacao"],
        exact: &[],
        labels: &[
            r"\bCENTRO\s+DE\s+CUSTO\b",
            r"\bDEPARTAMENTO\b",
            r"\bDEPTO\b",
            r"\bSETOR\b",
            r"\bLOTACAO\b",
        ],
        scan: None,
    },
    FieldDef {
        field: Field::Competencia,
        normalizer: Normalizer::Competencia,
        aliases: &["competencia", "referencia", "folha mensal", "mes"],
        exact: &[],
        labels: &[r"\bCOMPETENCIA\b", r"\bPERIODO\b", r"\bREFERENCIA\b", r"\bFOLHA\s+MENSAL\b"],
        scan: Some(periods_scan),
    },
    FieldDef {
        field: Field::Mes,
        normalizer: Normalizer::Mes,
        aliases: &["competencia", "referencia", "folha mensal", "mes"],
        exact: &[],
        labels: &[r"\bCOMPETENCIA\b", r"\bPERIODO\b", r"\bREFERENCIA\b", r"\bFOLHA\s+MENSAL\b"],
        scan: Some(periods_scan),
    },
    FieldDef {
        field: Field::DataPagamento,
        normalizer: Normalizer::Date,
        aliases: &["data pagamento", "pagamento", "data credito", "credito em"],
        exact: &[],
        labels: &[
            r"\bDATA\s+(?:DE\s+|DO\s+)?(?:PAGAMENTO|PAGTO|CREDITO)\b",
            r"\b(?:PAGO|CREDITO|CREDITADO)\s+EM\b",
            r"\bPAGAMENTO\b",
        ],
        scan: None,
    },
    FieldDef {
        field: Field::HoleriteId,
        normalizer: Normalizer::Code,
        aliases: &["holerite", "recibo", "documento"],
        exact: &[],
        labels: &[r"\b(?:HOLERITE|RECIBO|DOCUMENTO)\s*(?:N[O.]?|NUMERO|#)\.?(?:\s|:|$)"],
        scan: None,
    },
    FieldDef {
        field: Field::SalarioBase,
        normalizer: Normalizer::Money,
        aliases: &["salario base"],
        exact: &[],
        labels: &[r"\bSALARIO\s+BASE\b", r"\bSAL\.?\s+BASE\b"],
        scan: None,
    },
    FieldDef {
        field: Field::TotalProventos,
        normalizer: Normalizer::Money,
        aliases: &["total proventos", "total vencimentos"],
        exact: &[],
        labels: &[r"\bTOTAL\s+(?:DE\s+|DOS\s+)?(?:VENCIMENTOS|PROVENTOS)\b"],
        scan: None,
    },
    FieldDef {
        field: Field::TotalDescontos,
        normalizer: Normalizer::Money,
        aliases: &["total descontos"],
        exact: &[],
        labels: &[r"\bTOTAL\s+(?:DE\s+|DOS\s+)?DESCONTOS\b"],
        scan: None,
    },
    FieldDef {
        field: Field::ValorLiquido,
        normalizer: Normalizer::Money,
        aliases: &["liquido a receber", "valor liquido", "liquido"],
        exact: &[],
        labels: &[
            r"\bLIQUIDO\s+A\s+RECEBER\b",
            r"\b(?:VALOR|TOTAL)\s+LIQUIDO\b",
            r"\bLIQUIDO\b",
        ],
        scan: None,
    },
    FieldDef {
        field: Field::BaseInss,
        normalizer: Normalizer::Money,
        aliases: &["base inss", "sal contr inss", "salario contribuicao inss"],
        exact: &[],
        labels: &[
            r"\bSAL(?:ARIO)?\.?\s*CONTR(?:IBUICAO)?\.?\s*(?:DO\s+)?INSS\b",
            r"\bBASE\s*(?:DE\s*)?(?:CALC(?:ULO)?\.?\s*)?(?:DO\s+)?INSS\b",
        ],
        scan: None,
    },
    FieldDef {
        field: Field::BaseFgts,
        normalizer: Normalizer::Money,
        aliases: &["base fgts"],
        exact: &[],
        labels: &[r"\bBASE\s*(?:DE\s*)?(?:CALC(?:ULO)?\.?\s*)?(?:DO\s+)?FGTS\b"],
        scan: None,
    },
    FieldDef {
        field: Field::BaseIrrf,
        normalizer: Normalizer::Money,
        aliases: &["base irrf", "base ir"],
        exact: &[],
        labels: &[r"\bBASE\s*(?:DE\s*)?(?:CALC(?:ULO)?\.?\s*)?(?:DO\s+)?IRRF\b"],
        scan: None,
    },
    FieldDef {
        field: Field::FgtsMes,
        normalizer: Normalizer::Money,
        aliases: &["fgts mes", "fgts do mes"],
        exact: &[],
        labels: &[r"\bFGTS\s+(?:DO\s+)?MES\b"],
        scan: None,
    },
];

static DEFAULT_RULES: LazyLock<Vec<FieldRule>> = LazyLock::new(|| {
    let mut rules = Vec::new();
    for def in FIELD_RULES {
        if !def.aliases.is_empty() || !def.exact.is_empty() {
            rules.push(FieldRule {
                field: def.field,
                priority: TIER_STRUCTURED,
                strategy: Strategy::KeyValue {
                    aliases: def.aliases.iter().map(|s| s.to_string()).collect(),
                    exact: def.exact.iter().map(|s| s.to_string()).collect(),
                },
                normalizer: def.normalizer,
            });
        }
        if !def.labels.is_empty() {
            let pattern = def.labels.join("|");
            rules.push(FieldRule::label(def.field, &pattern, def.normalizer).unwrap());
        }
        if let Some(scan) = def.scan {
            rules.push(FieldRule {
                field: def.field,
                priority: TIER_SCAN,
                strategy: Strategy::Scan(scan()),
                normalizer: def.normalizer,
            });
        }
    }
    rules
});

/// The built-in rule table, expanded into prioritized rules.
pub fn default_rules() -> Vec<FieldRule> {
    DEFAULT_RULES.clone()
}

/// Normalizer for rules added at runtime: the table's when the field has
/// one, otherwise by value kind.
pub fn normalizer_for(field: Field) -> Normalizer {
    match FIELD_RULES.iter().find(|def| def.field == field) {
        Some(def) => def.normalizer,
        None if field.is_money() => Normalizer::Money,
        None => Normalizer::Text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(field: Field, text: &str) -> Vec<String> {
        let doc = DocumentText::new(text);
        default_rules()
            .iter()
            .filter(|r| r.field == field)
            .flat_map(|r| r.extract(&doc, None).unwrap())
            .collect()
    }

    #[test]
    fn test_default_rules_cover_extracted_fields() {
        let rules = default_rules();
        for field in [
            Field::Empresa,
            Field::CnpjEmpresa,
            Field::Colaborador,
            Field::CpfColaborador,
            Field::Matricula,
            Field::Competencia,
            Field::Mes,
            Field::ValorLiquido,
            Field::FgtsMes,
        ] {
            assert!(rules.iter().any(|r| r.field == field), "no rule for {}", field);
        }
    }

    #[test]
    fn test_label_same_line() {
        assert_eq!(run(Field::Colaborador, "Colaborador: JOAO DA SILVA"), vec!["JOAO DA SILVA"]);
        assert_eq!(
            run(Field::ValorLiquido, "Líquido a Receber:     1.850,00"),
            vec!["1850,00"]
        );
    }

    #[test]
    fn test_label_value_on_following_line() {
        let text = "Nome do Funcionário            Cargo\nMARIA SOUZA                    ANALISTA FISCAL";
        assert_eq!(run(Field::Colaborador, text), vec!["MARIA SOUZA"]);
        assert_eq!(run(Field::Cargo, text), vec!["ANALISTA FISCAL"]);
    }

    #[test]
    fn test_label_window_is_bounded() {
        let text = "Total de Descontos\n\na\nb\nc\nd\n150,00";
        assert!(run(Field::TotalDescontos, text).is_empty());
    }

    #[test]
    fn test_scan_finds_unlabeled_cnpj() {
        let text = "ACME COMERCIO LTDA\n12.345.678/0001-90";
        assert_eq!(run(Field::CnpjEmpresa, text), vec!["12.345.678/0001-90"]);
        assert_eq!(run(Field::Empresa, text), vec!["ACME COMERCIO LTDA"]);
    }

    #[test]
    fn test_company_beside_cnpj() {
        let text = "RECIBO DE PAGAMENTO DE SALARIO\nACME COMERCIO LTDA     CNPJ: 12.345.678/0001-90";
        assert_eq!(run(Field::Empresa, text), vec!["ACME COMERCIO LTDA"]);
    }

    #[test]
    fn test_structured_tier_comes_first() {
        let doc = DocumentText::new("Salário Base  2.100,00");
        let evidence = StructuredEvidence {
            key_values: vec![("Salário Base".into(), "2.000,00".into())],
            tables: Vec::new(),
        };
        let mut rules: Vec<FieldRule> = default_rules()
            .into_iter()
            .filter(|r| r.field == Field::SalarioBase)
            .collect();
        rules.sort_by_key(|r| r.priority);
        let values: Vec<String> = rules
            .iter()
            .flat_map(|r| r.extract(&doc, Some(&evidence)).unwrap())
            .collect();
        assert_eq!(values, vec!["2000,00", "2100,00"]);
    }
}
