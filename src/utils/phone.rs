// ABOUTME: Phone number normalization used to match patients to sync configurations
// ABOUTME: Renders arbitrary user input as E.164 and as a digits-only national form
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Converts raw phone input into the representations stored on configurations
pub trait PhoneNormalizer: Send + Sync {
    /// E.164 form, e.g. `+15551234567`
    fn to_e164(&self, raw: &str) -> String;

    /// Digits-only national form, e.g. `5551234567`
    fn to_normalized(&self, raw: &str) -> String;
}

/// North American Numbering Plan normalizer
#[derive(Debug, Clone, Copy, Default)]
pub struct NanpPhoneNormalizer;

const NANP_LENGTH: usize = 10;

fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

impl PhoneNormalizer for NanpPhoneNormalizer {
    fn to_e164(&self, raw: &str) -> String {
        let national = self.to_normalized(raw);
        if national.len() == NANP_LENGTH {
            format!("+1{national}")
        } else {
            format!("+{national}")
        }
    }

    fn to_normalized(&self, raw: &str) -> String {
        let all = digits(raw);
        match all.strip_prefix('1') {
            Some(rest) if all.len() == NANP_LENGTH + 1 => rest.to_owned(),
            _ => all,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats_collapse_to_same_forms() {
        let normalizer = NanpPhoneNormalizer;
        for raw in ["(555) 123-4567", "555.123.4567", "+1 555 123 4567", "15551234567"] {
            assert_eq!(normalizer.to_normalized(raw), "5551234567", "{raw}");
            assert_eq!(normalizer.to_e164(raw), "+15551234567", "{raw}");
        }
    }

    #[test]
    fn test_non_nanp_lengths_kept() {
        let normalizer = NanpPhoneNormalizer;
        assert_eq!(normalizer.to_normalized("+44 20 7946 0958"), "442079460958");
        assert_eq!(normalizer.to_e164("+44 20 7946 0958"), "+442079460958");
    }
}
