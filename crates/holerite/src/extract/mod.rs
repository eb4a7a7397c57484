//! Field extraction.
//!
//! A [`FieldRegistry`] holds prioritized [`FieldExtractor`]s and runs them all
//! through one loop. Rules are data: the built-in table lives in [`rules`] and
//! new label patterns can be registered at runtime without touching the loop.

mod document;
mod normalize;
mod rules;

use tracing::{debug, warn};

pub use document::{chunks_of, Chunk, DocumentText, TextLine};
pub use normalize::Normalizer;
pub use rules::{
    default_rules, FieldRule, Scanner, Strategy, LABEL_WINDOW, TIER_LABEL, TIER_SCAN,
    TIER_STRUCTURED,
};

use crate::candidates::FieldCandidates;
use crate::error::RuleError;
use crate::models::{Field, StructuredEvidence};

/// A source of raw candidate values for one field.
pub trait FieldExtractor: Send + Sync {
    fn field(&self) -> Field;

    /// Lower runs first; earlier candidates win.
    fn priority(&self) -> u8;

    fn name(&self) -> String {
        format!("{}#{}", self.field(), self.priority())
    }

    /// Normalized values found in `doc`, best first.
    fn extract(
        &self,
        doc: &DocumentText,
        evidence: Option<&StructuredEvidence>,
    ) -> Result<Vec<String>, RuleError>;
}

/// Ordered collection of field extractors.
pub struct FieldRegistry {
    extractors: Vec<Box<dyn FieldExtractor>>,
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldRegistry {
    /// Registry loaded with the built-in rule table.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for rule in default_rules() {
            registry.register(Box::new(rule));
        }
        registry
    }

    pub fn empty() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Built-in rules plus extra label patterns keyed by field name.
    /// Invalid entries are logged and skipped.
    pub fn with_label_patterns<'a, I>(patterns: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [String])>,
    {
        let mut registry = Self::new();
        for (field, labels) in patterns {
            if let Err(e) = registry.add_label_patterns(field, labels) {
                warn!("Ignoring extra labels for '{}': {}", field, e);
            }
        }
        registry
    }

    pub fn register(&mut self, extractor: Box<dyn FieldExtractor>) {
        self.extractors.push(extractor);
        self.extractors
            .sort_by_key(|e| (e.field(), e.priority()));
    }

    /// Add label patterns for a field, searched at label priority after the
    /// built-in labels.
    pub fn add_label_patterns(&mut self, field: &str, patterns: &[String]) -> Result<(), RuleError> {
        let field_id =
            Field::from_str(field).ok_or_else(|| RuleError::UnknownField(field.to_string()))?;
        let normalizer = rules::normalizer_for(field_id);
        for pattern in patterns {
            let rule = FieldRule::label(field_id, pattern, normalizer)?;
            self.register(Box::new(rule));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Run every extractor. A failing extractor is logged and skipped; the
    /// others still contribute.
    pub fn extract(
        &self,
        doc: &DocumentText,
        evidence: Option<&StructuredEvidence>,
    ) -> FieldCandidates {
        let evidence = evidence.filter(|e| !e.is_empty());
        let mut candidates = FieldCandidates::new();
        for extractor in &self.extractors {
            match extractor.extract(doc, evidence) {
                Ok(values) => {
                    if !values.is_empty() {
                        debug!("{} found {} value(s)", extractor.name(), values.len());
                    }
                    candidates.extend(extractor.field(), values);
                }
                Err(e) => {
                    warn!("Extractor {} failed: {}", extractor.name(), e);
                }
            }
        }
        candidates
    }
}
