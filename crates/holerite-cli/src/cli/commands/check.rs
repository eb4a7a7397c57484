//! Tool and configuration availability check.

use console::style;

use holerite::config::Config;
use holerite::utils::format_size;
use holerite_analysis::ocr::{check_tools, OcrBackend, OcrConfig, TesseractBackend};

use crate::cli::icons::{arrow, warning};

/// Report local tools, OCR languages, and the cloud tier configuration.
pub async fn cmd_check(config: &Config) -> anyhow::Result<()> {
    println!("\n{}", style("Extraction Tool Status").bold());
    println!("{}", "-".repeat(50));

    println!("\n{}", style("Local Tools:").cyan());
    let mut all_found = true;
    for (tool, available) in check_tools() {
        let status = if available {
            style("✓ found").green()
        } else {
            all_found = false;
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }
    if !all_found {
        println!(
            "                  {}",
            style("Install: poppler-utils tesseract-ocr tesseract-ocr-por").dim()
        );
    }

    println!("\n{}", style("OCR Languages:").cyan());
    let tesseract = TesseractBackend::with_config(OcrConfig::from(&config.acquisition));
    if !tesseract.is_available() {
        println!("  {:<15} {}", "Tesseract", style("✗ not available").red());
        println!(
            "                  {}",
            style(tesseract.availability_hint()).dim()
        );
    } else {
        match tesseract.missing_languages() {
            Ok(missing) => {
                for lang in tesseract.config().language.split('+') {
                    let status = if missing.iter().any(|m| m == lang) {
                        style("✗ not installed").red()
                    } else {
                        style("✓ installed").green()
                    };
                    println!("  {:<15} {}", lang, status);
                }
            }
            Err(e) => println!("  {} Could not list languages: {}", warning(), e),
        }
    }

    println!("\n{}", style("Cloud Analysis:").cyan());
    let cloud = &config.cloud;
    if !cloud.enabled {
        println!("  {:<15} {}", "Status", style("○ disabled").yellow());
        println!(
            "                  {}",
            style("Enable with --cloud or HOLERITE_CLOUD=1").dim()
        );
    } else {
        println!("  {:<15} {}", "Status", style("✓ enabled").green());
        if !cfg!(feature = "textract") {
            println!(
                "  {} Built without the textract feature; cloud tier is inactive",
                warning()
            );
        }
    }
    println!(
        "  {:<15} {}",
        "Region",
        cloud.region.as_deref().unwrap_or("(SDK default)")
    );
    match &cloud.bucket {
        Some(bucket) => println!("  {:<15} s3://{}/{}", "Staging", bucket, cloud.prefix),
        None => println!(
            "  {:<15} {}",
            "Staging",
            style(format!(
                "no bucket; documents over {} are skipped",
                format_size(cloud.sync_limit_bytes)
            ))
            .dim()
        ),
    }
    println!(
        "  {:<15} {} inline, {} max",
        "Size limits",
        format_size(cloud.sync_limit_bytes),
        format_size(cloud.max_document_bytes)
    );

    if let Some(path) = &config.source_path {
        println!("\n  {} Config: {}", arrow(), path.display());
    }
    println!();

    Ok(())
}
