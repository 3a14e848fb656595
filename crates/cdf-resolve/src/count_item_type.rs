//! CountItemType stays text on VoteCount rows; the NIST vocabulary check
//! only warns.

use cdf_model::{Diagnostics, ErrorCategory, is_nist_count_item_type};

/// Flag vote-type values outside the NIST standard vocabulary. Non-standard
/// values load as-is.
pub fn audit_count_item_types(values: &[String], diags: &mut Diagnostics) {
    let mut nonstandard: Vec<&str> = Vec::new();
    for value in values {
        if !is_nist_count_item_type(value) && !nonstandard.contains(&value.as_str()) {
            nonstandard.push(value);
        }
    }
    if !nonstandard.is_empty() {
        diags.warn(
            ErrorCategory::Jurisdiction,
            "CountItemType",
            format!(
                "vote types outside the NIST vocabulary (loaded as-is): {}",
                nonstandard.join(", ")
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_values_pass_silently() {
        let mut diags = Diagnostics::new();
        audit_count_item_types(
            &["total".to_string(), "election-day".to_string()],
            &mut diags,
        );
        assert_eq!(diags.warning_count(), 0);
    }

    #[test]
    fn nonstandard_values_warn_once_each() {
        let mut diags = Diagnostics::new();
        audit_count_item_types(
            &["machine".to_string(), "machine".to_string(), "total".to_string()],
            &mut diags,
        );
        assert_eq!(diags.warning_count(), 1);
        let warning = diags.warnings().next().expect("warning");
        assert!(warning.message.contains("machine"));
    }
}
