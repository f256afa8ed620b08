// Identifier repair. Spreadsheet round-trips strip leading zeros from
// numeric-looking account and invoice identifiers; these functions restore
// them to their fixed-width canonical forms. Padding is purely leftward
// character repetition on the string form; values already at or past the
// target width pass through untouched, never truncated.

use crate::error::LoaderError;
use crate::table::Value;

/// Left-pad the digit form of `value` with zeros until it is `width`
/// characters long. Missing stays missing.
pub fn restore_leading_zeros(value: &Value, width: usize) -> Value {
    match value {
        Value::Missing => Value::Missing,
        other => Value::Text(format!("{:0>width$}", other.render())),
    }
}

/// Rebuild a composite invoice id to its `NNNNNNNNNN-XXXX` canonical form.
///
/// The prefix is padded to 10 digits. A suffix whose last character is one
/// of the rebill/cancel/adjustment markers `R`, `C`, `Z` is padded to 5
/// characters (4 digits plus the letter); any other suffix is padded to 4.
pub fn fix_invoice_id(value: &Value) -> Result<Value, LoaderError> {
    let raw = match value {
        Value::Missing => return Ok(Value::Missing),
        other => other.render(),
    };
    let (prefix, suffix) = split_composite(&raw)?;

    let prefix = format!("{:0>10}", prefix);
    let suffix = if matches!(suffix.chars().last(), Some('R' | 'C' | 'Z')) {
        format!("{:0>5}", suffix)
    } else {
        format!("{:0>4}", suffix)
    };

    if prefix.len() != 10 {
        return Err(LoaderError::InternalConsistency {
            detail: format!(
                "invoice prefix '{}' is {} characters, want 10",
                prefix,
                prefix.len()
            ),
        });
    }
    if suffix.len() > 5 {
        return Err(LoaderError::InternalConsistency {
            detail: format!(
                "invoice suffix '{}' is {} characters, want at most 5",
                suffix,
                suffix.len()
            ),
        });
    }

    Ok(Value::Text(format!("{}-{}", prefix, suffix)))
}

/// Rebuild a renumbered gas account to its `NNNNNNNNNN-NNNNN` canonical
/// form: 10-digit prefix, exactly 5-digit suffix.
pub fn fix_new_account_number(value: &Value) -> Result<Value, LoaderError> {
    let raw = match value {
        Value::Missing => return Ok(Value::Missing),
        other => other.render(),
    };
    let (prefix, suffix) = split_composite(&raw)?;

    let prefix = format!("{:0>10}", prefix);
    let suffix = format!("{:0>5}", suffix);

    if prefix.len() != 10 || suffix.len() != 5 {
        return Err(LoaderError::InternalConsistency {
            detail: format!(
                "account number '{}-{}' did not reach 10-5 form",
                prefix, suffix
            ),
        });
    }

    Ok(Value::Text(format!("{}-{}", prefix, suffix)))
}

/// A composite identifier is exactly one prefix and one suffix around a
/// single hyphen; anything else cannot be decomposed.
fn split_composite(raw: &str) -> Result<(&str, &str), LoaderError> {
    let mut parts = raw.split('-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(prefix), Some(suffix), None) => Ok((prefix, suffix)),
        _ => Err(LoaderError::Format {
            value: raw.to_string(),
        }),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_leading_zeros_pads_to_width() {
        assert_eq!(
            restore_leading_zeros(&Value::text("12345"), 10),
            Value::text("0000012345")
        );
        assert_eq!(
            restore_leading_zeros(&Value::Number(12345.0), 10),
            Value::text("0000012345")
        );
    }

    #[test]
    fn test_restore_leading_zeros_missing_stays_missing() {
        assert!(restore_leading_zeros(&Value::Missing, 10).is_missing());
    }

    #[test]
    fn test_restore_leading_zeros_never_truncates() {
        assert_eq!(
            restore_leading_zeros(&Value::text("123456789012"), 10),
            Value::text("123456789012")
        );
    }

    #[test]
    fn test_restore_leading_zeros_idempotent() {
        let once = restore_leading_zeros(&Value::text("77"), 9);
        let twice = restore_leading_zeros(&once, 9);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_fix_invoice_id_plain_suffix_pads_to_four() {
        assert_eq!(
            fix_invoice_id(&Value::text("123456789-12")).unwrap(),
            Value::text("0123456789-0012")
        );
    }

    #[test]
    fn test_fix_invoice_id_marker_suffix_pads_to_five() {
        for marker in ['R', 'C', 'Z'] {
            let raw = Value::Text(format!("123456789-12{}", marker));
            let fixed = fix_invoice_id(&raw).unwrap();
            assert_eq!(fixed, Value::Text(format!("0123456789-0012{}", marker)));
        }
    }

    #[test]
    fn test_fix_invoice_id_missing_hyphen_is_format_error() {
        let result = fix_invoice_id(&Value::text("1234567890"));
        assert!(matches!(result, Err(LoaderError::Format { .. })));
    }

    #[test]
    fn test_fix_invoice_id_extra_hyphen_is_format_error() {
        let result = fix_invoice_id(&Value::text("123-456-789"));
        assert!(matches!(result, Err(LoaderError::Format { .. })));
    }

    #[test]
    fn test_fix_invoice_id_missing_passes_through() {
        assert!(fix_invoice_id(&Value::Missing).unwrap().is_missing());
    }

    #[test]
    fn test_fix_invoice_id_overlong_prefix_is_internal_fault() {
        let result = fix_invoice_id(&Value::text("12345678901-12"));
        assert!(matches!(
            result,
            Err(LoaderError::InternalConsistency { .. })
        ));
    }

    #[test]
    fn test_fix_new_account_number_examples() {
        assert_eq!(
            fix_new_account_number(&Value::text("522322315-2")).unwrap(),
            Value::text("0522322315-00002")
        );
        assert_eq!(
            fix_new_account_number(&Value::text("522322315-244")).unwrap(),
            Value::text("0522322315-00244")
        );
    }

    #[test]
    fn test_fix_new_account_number_missing_passes_through() {
        assert!(fix_new_account_number(&Value::Missing).unwrap().is_missing());
    }

    #[test]
    fn test_fix_new_account_number_missing_hyphen_is_format_error() {
        let result = fix_new_account_number(&Value::text("522322315"));
        assert!(matches!(result, Err(LoaderError::Format { .. })));
    }

    #[test]
    fn test_fix_new_account_number_overlong_suffix_is_internal_fault() {
        let result = fix_new_account_number(&Value::text("522322315-123456"));
        assert!(matches!(
            result,
            Err(LoaderError::InternalConsistency { .. })
        ));
    }
}
