//! Text cleanup and accent folding.

use std::sync::LazyLock;

use regex::Regex;

/// CNPJ-shaped token, formatted or as 14 bare digits.
pub static CNPJ_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{2}\.?\d{3}\.?\d{3}\s?/\s?\d{4}-?\d{2}\b|\b\d{14}\b").unwrap()
});

/// CPF-shaped token.
pub static CPF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}\.\d{3}\.\d{3}-\d{2}\b|\b\d{11}\b").unwrap());

/// Fold one character: strip Portuguese diacritics and uppercase ASCII.
///
/// Always maps one char to one char, so char offsets in the folded string
/// line up with the original.
fn fold_char(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'Á' | 'À' | 'Â' | 'Ã' | 'Ä' | 'ª' => 'A',
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' | 'º' | '°' => 'O',
        'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' | 'Ç' => 'C',
        'ñ' | 'Ñ' => 'N',
        other => other.to_ascii_uppercase(),
    }
}

/// Accent-strip and uppercase `s` for label matching.
pub fn fold(s: &str) -> String {
    s.chars().map(fold_char).collect()
}

/// Normalize a label for key comparison: folded, lowercase, punctuation
/// removed, whitespace collapsed.
pub fn normalize_key(s: &str) -> String {
    let cleaned: String = fold(s)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();
    collapse_whitespace(&cleaned)
}

/// Trim and collapse internal whitespace runs to single spaces.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Count of non-whitespace characters.
pub fn non_whitespace_len(s: &str) -> usize {
    s.chars().filter(|c| !c.is_whitespace()).count()
}

/// How many of `keywords` occur in `text` (accent/case-insensitive).
pub fn keyword_hits(text: &str, keywords: &[String]) -> usize {
    let folded = fold(text);
    keywords
        .iter()
        .filter(|k| !k.is_empty() && folded.contains(&fold(k)))
        .count()
}

/// Normalize line endings and odd whitespace, keeping column spacing.
///
/// Runs of two or more spaces separate columns in layout text, so internal
/// spacing is preserved; only trailing whitespace is dropped.
pub fn clean_text(raw: &str) -> String {
    let unified = raw
        .replace("\r\n", "\n")
        .replace(['\r', '\x0c'], "\n")
        .replace('\t', "  ")
        .replace(['\u{a0}', '\u{202f}', '\u{2007}'], " ");

    let mut lines: Vec<&str> = unified.lines().map(str::trim_end).collect();
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

/// Drop a second printed copy of the same voucher.
///
/// Some payroll systems print the employee and employer copies on one page.
/// If a trailer anchor (such as the signature declaration) occurs twice, the
/// text is cut after the first occurrence. Otherwise, if the first line
/// carrying a CNPJ reappears verbatim later, the text is cut before the
/// repeat.
pub fn dedupe_voucher(text: &str, anchors: &[String]) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let folded: Vec<String> = lines.iter().map(|l| fold(l)).collect();

    for anchor in anchors {
        let anchor = fold(anchor);
        if anchor.is_empty() {
            continue;
        }
        let hits: Vec<usize> = folded
            .iter()
            .enumerate()
            .filter(|(_, l)| l.contains(&anchor))
            .map(|(i, _)| i)
            .collect();
        if hits.len() >= 2 {
            return lines[..=hits[0]].join("\n");
        }
    }

    let cnpj_lines: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| CNPJ_PATTERN.is_match(l))
        .map(|(i, _)| i)
        .collect();
    if let Some(&first) = cnpj_lines.first() {
        let first_key = collapse_whitespace(&folded[first]);
        if let Some(&repeat) = cnpj_lines[1..]
            .iter()
            .find(|&&i| collapse_whitespace(&folded[i]) == first_key)
        {
            return lines[..repeat].join("\n");
        }
    }

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_preserves_char_count() {
        let original = "Salário Líquido – Março nº 12";
        let folded = fold(original);
        assert_eq!(folded.chars().count(), original.chars().count());
        assert!(folded.starts_with("SALARIO LIQUIDO"));
        assert!(folded.contains("MARCO NO 12"));
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Líquido a Receber:"), "liquido a receber");
        assert_eq!(normalize_key("  CNPJ / CPF "), "cnpj cpf");
    }

    #[test]
    fn test_clean_text_keeps_columns() {
        let cleaned = clean_text("001  SALARIO\t2.000,00  \r\n\u{a0}\x0cNEXT\n\n");
        assert_eq!(cleaned, "001  SALARIO  2.000,00\n\nNEXT");
    }

    #[test]
    fn test_keyword_hits() {
        let keywords: Vec<String> = ["CNPJ", "LIQUIDO", "VENCIMENTOS", "CPF"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(keyword_hits("cnpj ... Líquido a receber", &keywords), 2);
        assert_eq!(keyword_hits("", &keywords), 0);
    }

    #[test]
    fn test_dedupe_by_anchor() {
        let anchors = vec!["DECLARO TER RECEBIDO".to_string()];
        let text = "EMPRESA X\nLIQUIDO 100,00\nDeclaro ter recebido\nEMPRESA X\nLIQUIDO 100,00\nDECLARO TER RECEBIDO";
        assert_eq!(
            dedupe_voucher(text, &anchors),
            "EMPRESA X\nLIQUIDO 100,00\nDeclaro ter recebido"
        );
    }

    #[test]
    fn test_dedupe_by_repeated_cnpj_line() {
        let text = "ACME LTDA\nCNPJ: 12.345.678/0001-90\nLIQUIDO 1,00\nACME LTDA\nCNPJ:  12.345.678/0001-90\nLIQUIDO 1,00";
        assert_eq!(
            dedupe_voucher(text, &[]),
            "ACME LTDA\nCNPJ: 12.345.678/0001-90\nLIQUIDO 1,00\nACME LTDA"
        );
    }

    #[test]
    fn test_dedupe_single_copy_untouched() {
        let text = "ACME LTDA\nCNPJ: 12.345.678/0001-90\nLIQUIDO 1,00";
        assert_eq!(dedupe_voucher(text, &["DECLARO".to_string()]), text);
    }

    #[test]
    fn test_cnpj_pattern() {
        assert!(CNPJ_PATTERN.is_match("12.345.678/0001-90"));
        assert!(CNPJ_PATTERN.is_match("12345678000190"));
        assert!(!CNPJ_PATTERN.is_match("123.456.789-09"));
        assert!(CPF_PATTERN.is_match("123.456.789-09"));
    }
}
