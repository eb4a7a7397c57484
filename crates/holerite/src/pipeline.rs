//! Draft assembly from acquisition attempts.
//!
//! The assembler is the pure half of a job: given the text (and structured
//! evidence) from one or more acquisition attempts plus caller context, it
//! runs the field rules and rubrica parser on every attempt, merges the
//! candidates, fills derived values, and builds the draft. It does no I/O.

use tracing::{debug, info};

use crate::candidates::{aggregate, FieldCandidates};
use crate::config::ExtractionConfig;
use crate::derive::derive_values;
use crate::extract::{DocumentText, FieldRegistry};
use crate::identity::{id_for, validation_status};
use crate::models::{Field, HoleriteDraft, RawText, RubricaEntry, StructuredEvidence};
use crate::rubricas::parse_rubricas;
use crate::utils::text::{clean_text, dedupe_voucher};

/// Marker stored in `erro_extracao` when no attempt produced text.
pub const ALL_TIERS_FAILED: &str = "nenhuma estrategia de aquisicao produziu texto";

/// Caller-supplied context for one job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobContext {
    /// Source filename, part of the draft identity.
    pub fonte_arquivo: String,
    pub user_email: Option<String>,
    /// Fallback payment date (`YYYY-MM-DD`) when the slip has none.
    pub data_pagamento: Option<String>,
}

impl JobContext {
    pub fn new(fonte_arquivo: impl Into<String>) -> Self {
        Self {
            fonte_arquivo: fonte_arquivo.into(),
            ..Default::default()
        }
    }

    pub fn with_user_email(mut self, email: impl Into<String>) -> Self {
        self.user_email = Some(email.into());
        self
    }

    pub fn with_data_pagamento(mut self, date: impl Into<String>) -> Self {
        self.data_pagamento = Some(date.into());
        self
    }
}

/// Text from one acquisition attempt, with its structured evidence if the
/// attempt produced any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquisition {
    pub raw: RawText,
    pub evidence: Option<StructuredEvidence>,
}

impl Acquisition {
    pub fn text(raw: RawText) -> Self {
        Self {
            raw,
            evidence: None,
        }
    }

    pub fn structured(raw: RawText, evidence: StructuredEvidence) -> Self {
        Self {
            raw,
            evidence: Some(evidence),
        }
    }
}

/// Result of assembling one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub draft: HoleriteDraft,
    pub candidates: FieldCandidates,
    pub rubricas: Vec<RubricaEntry>,
}

pub struct DraftAssembler {
    registry: FieldRegistry,
    anchors: Vec<String>,
}

impl Default for DraftAssembler {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

/// Per-attempt results before merging.
struct AttemptFields {
    candidates: FieldCandidates,
    rubricas: Vec<RubricaEntry>,
}

impl DraftAssembler {
    pub fn new(registry: FieldRegistry, anchors: Vec<String>) -> Self {
        Self { registry, anchors }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.registry(), config.voucher_anchors.clone())
    }

    fn run_attempt(&self, attempt: &Acquisition) -> AttemptFields {
        let text = dedupe_voucher(&clean_text(attempt.raw.content()), &self.anchors);
        let doc = DocumentText::new(&text);
        let candidates = self.registry.extract(&doc, attempt.evidence.as_ref());
        let tables = attempt
            .evidence
            .as_ref()
            .map(|e| e.tables.as_slice())
            .unwrap_or(&[]);
        let rubricas = parse_rubricas(&text, tables);
        debug!(
            "{} attempt: {} fields, {} rubricas",
            attempt.raw.strategy(),
            candidates.iter().count(),
            rubricas.len()
        );
        AttemptFields {
            candidates,
            rubricas,
        }
    }

    /// Build the draft from acquisition attempts, best attempt first.
    ///
    /// Never fails: with no usable text every extracted field is empty, the
    /// status is `pendente`, and `erro_extracao` is set.
    pub fn assemble(&self, attempts: &[Acquisition], ctx: &JobContext) -> Extraction {
        let results: Vec<AttemptFields> = attempts
            .iter()
            .filter(|a| !a.raw.is_failed())
            .map(|a| self.run_attempt(a))
            .collect();
        let all_failed = results.is_empty();

        let rubricas = results
            .iter()
            .map(|r| &r.rubricas)
            .find(|r| !r.is_empty())
            .cloned()
            .unwrap_or_default();
        let (mut candidates, _) = aggregate(results.into_iter().map(|r| r.candidates));

        if !all_failed {
            derive_values(&mut candidates, &rubricas);
        }
        apply_context(&mut candidates, ctx);

        let primary = candidates.primary_values();
        let id = id_for(&primary, &ctx.fonte_arquivo);
        let status = validation_status(&primary);

        let mut draft = HoleriteDraft::default();
        for field in Field::ALL {
            draft.set(field, primary.get(field));
        }
        draft.id_holerite = id.clone();
        if draft.holerite_id.is_empty() {
            draft.holerite_id = id;
        }
        draft.rubricas_json =
            serde_json::to_string(&rubricas).unwrap_or_else(|_| "[]".to_string());
        draft.status_validacao = status;
        if all_failed {
            draft.erro_extracao = Some(ALL_TIERS_FAILED.to_string());
        }

        info!(
            "Assembled draft {} for {} ({})",
            draft.id_holerite, ctx.fonte_arquivo, draft.status_validacao
        );

        Extraction {
            draft,
            candidates,
            rubricas,
        }
    }
}

/// Caller context: passthrough fields and defaults that only fill gaps.
fn apply_context(candidates: &mut FieldCandidates, ctx: &JobContext) {
    candidates.push(Field::FonteArquivo, ctx.fonte_arquivo.clone());
    if let Some(email) = &ctx.user_email {
        candidates.push(Field::UserEmail, email.clone());
    }
    if let Some(date) = &ctx.data_pagamento {
        candidates.push(Field::DataPagamento, date.clone());
    }
}
