//! Sequential asset code generation.
//!
//! Codes are `AS` plus a six-digit zero-padded suffix, assigned once at
//! creation and never reused. Allocation runs inside the creation
//! transaction; the unique index on `asset_code` is the final backstop
//! against concurrent duplicates.

use crate::errors::ServiceError;

pub const CODE_PREFIX: &str = "AS";

/// Produces the next code in the sequence. `None` means no asset exists
/// yet and numbering starts at `AS000001`.
pub fn next_code(last_suffix: Option<u32>) -> String {
    match last_suffix {
        None => format!("{}{:06}", CODE_PREFIX, 1),
        Some(last) => format!("{}{:06}", CODE_PREFIX, last + 1),
    }
}

/// Extracts the numeric suffix from a stored code. A stored code that does
/// not parse indicates corrupted sequence data; numbering must not silently
/// restart, so this fails instead.
pub fn parse_suffix(code: &str) -> Result<u32, ServiceError> {
    code.strip_prefix(CODE_PREFIX)
        .and_then(|digits| digits.parse::<u32>().ok())
        .ok_or_else(|| ServiceError::CodeSequence(format!("unparseable asset code '{}'", code)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn first_code_starts_the_sequence() {
        assert_eq!(next_code(None), "AS000001");
    }

    #[test]
    fn codes_increment_and_stay_zero_padded() {
        assert_eq!(next_code(Some(1)), "AS000002");
        assert_eq!(next_code(Some(99)), "AS000100");
        assert_eq!(next_code(Some(999_999)), "AS1000000");
    }

    #[test]
    fn sequence_is_strictly_increasing_and_gap_free() {
        let mut last = None;
        let mut codes = Vec::new();
        for _ in 0..5 {
            let code = next_code(last);
            last = Some(parse_suffix(&code).unwrap());
            codes.push(code);
        }
        assert_eq!(
            codes,
            vec!["AS000001", "AS000002", "AS000003", "AS000004", "AS000005"]
        );
    }

    #[test]
    fn corrupted_code_fails_instead_of_restarting() {
        assert_matches!(parse_suffix("ASXXXXXX"), Err(ServiceError::CodeSequence(_)));
        assert_matches!(parse_suffix("000001"), Err(ServiceError::CodeSequence(_)));
        assert_matches!(parse_suffix(""), Err(ServiceError::CodeSequence(_)));
        assert_eq!(parse_suffix("AS000042").unwrap(), 42);
    }
}
