//! External tool availability.

pub(crate) const PDFTOPPM_NOT_FOUND: &str = "pdftoppm not found (install poppler-utils)";

/// Tools the local tiers shell out to.
pub const REQUIRED_TOOLS: [&str; 4] = ["pdftotext", "pdfinfo", "pdftoppm", "tesseract"];

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Availability of every required tool, in [`REQUIRED_TOOLS`] order.
pub fn check_tools() -> Vec<(&'static str, bool)> {
    REQUIRED_TOOLS
        .iter()
        .map(|tool| (*tool, check_binary(tool)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tools_lists_all() {
        let tools = check_tools();
        assert_eq!(tools.len(), REQUIRED_TOOLS.len());
        assert_eq!(tools[0].0, "pdftotext");
    }

    #[test]
    fn test_missing_binary() {
        assert!(!check_binary("holerite-no-such-tool"));
    }
}
