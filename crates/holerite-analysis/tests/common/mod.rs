//! Mock collaborators for acquisition and batch tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use holerite::config::{AcquisitionConfig, CloudConfig};
use holerite::structured::{AnalysisBlock, BlockType, DocumentAnalysis};
use holerite_analysis::{
    CloudError, DocumentAnalyzer, ExtractionError, OcrBackend, OcrError, TextAcquirer, TextLayer,
};

pub const PDF_HEADER: &str = "%PDF-1.4\n";
pub const CORRUPT_MARKER: &str = "CORRUPT";

/// A payslip with enough text and coverage keywords to pass every tier.
pub fn slip(colaborador: &str) -> String {
    format!(
        "\
ACME COMERCIO LTDA              CNPJ: 12.345.678/0001-90
Funcionário: {}        CPF: 123.456.789-09
Competência: 08/2024
COD  DESCRICAO          VENCIMENTOS    DESCONTOS
001  SALARIO BASE          2.000,00
903  INSS                                 150,00
Líquido a Receber               1.850,00",
        colaborador
    )
}

/// PDF-looking bytes whose "text layer" is `text`.
pub fn pdf_bytes(text: &str) -> Vec<u8> {
    format!("{}{}", PDF_HEADER, text).into_bytes()
}

/// Text layer that reads back whatever followed the PDF header.
#[derive(Default)]
pub struct MockTextLayer {
    pub page_calls: AtomicUsize,
}

impl MockTextLayer {
    pub fn calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }
}

impl TextLayer for MockTextLayer {
    fn page_count(&self, pdf_path: &Path) -> Result<u32, ExtractionError> {
        let content = std::fs::read_to_string(pdf_path)?;
        if content.contains(CORRUPT_MARKER) {
            return Err(ExtractionError::ExtractionFailed(
                "Syntax Error: Couldn't find trailer dictionary".to_string(),
            ));
        }
        Ok(1)
    }

    fn page_text(&self, pdf_path: &Path, _page: u32) -> Result<String, ExtractionError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        let content = std::fs::read_to_string(pdf_path)?;
        Ok(content.trim_start_matches(PDF_HEADER).to_string())
    }
}

/// OCR engine returning fixed text, or failing when `text` is `None`.
pub struct MockOcr {
    pub text: Option<String>,
    pub calls: AtomicUsize,
}

impl MockOcr {
    pub fn returning(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            text: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn recognize(&self) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.text
            .clone()
            .ok_or_else(|| OcrError::OcrFailed("blank page".to_string()))
    }
}

impl OcrBackend for MockOcr {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        "mock".to_string()
    }

    fn run_ocr(&self, _image_path: &Path) -> Result<String, OcrError> {
        self.recognize()
    }

    fn ocr_image(&self, _image_path: &Path) -> Result<String, OcrError> {
        self.recognize()
    }

    fn ocr_pdf_page(&self, _pdf_path: &Path, _page: u32, _dpi: u32) -> Result<String, OcrError> {
        self.recognize()
    }
}

/// Analyzer returning one LINE block per line of `text`.
pub struct MockAnalyzer {
    pub text: String,
    pub calls: AtomicUsize,
}

impl MockAnalyzer {
    pub fn returning(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentAnalyzer for MockAnalyzer {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn analyze(
        &self,
        _bytes: &[u8],
        _filename: &str,
        _cancel: watch::Receiver<bool>,
    ) -> Result<DocumentAnalysis, CloudError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut blocks = vec![AnalysisBlock::new("p1", BlockType::Page)];
        for (i, line) in self.text.lines().enumerate() {
            blocks.push(AnalysisBlock::new(format!("l{}", i), BlockType::Line).with_text(line));
        }
        Ok(DocumentAnalysis::new(blocks))
    }
}

pub fn cloud_enabled() -> CloudConfig {
    CloudConfig {
        enabled: true,
        ..CloudConfig::default()
    }
}

pub fn acquirer(
    layer: &Arc<MockTextLayer>,
    ocr: &Arc<MockOcr>,
    config: AcquisitionConfig,
) -> TextAcquirer {
    TextAcquirer::new(layer.clone(), ocr.clone(), config)
}
