//! Value normalization utilities shared by the extraction stages.

pub mod dates;
pub mod format;
pub mod money;
pub mod text;

pub use dates::{month_number, normalize_date, parse_period, Period};
pub use format::format_size;
pub use money::Money;
pub use text::{clean_text, dedupe_voucher, fold, keyword_hits, non_whitespace_len};
