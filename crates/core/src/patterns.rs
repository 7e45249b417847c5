//! Deterministic PII patterns.

use crate::models::{Finding, FindingCategory};
use providers::text::CharIndex;
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

pub struct PiiPattern {
    pub category: FindingCategory,
    pub regex: &'static LazyLock<Option<Regex>>,
    /// Extra acceptance check for constraints the regex engine cannot express.
    pub accept: fn(&str) -> bool,
}

macro_rules! pii_pattern {
    ($name:ident, $regex_str:expr) => {
        pub static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

pii_pattern!(
    RE_EMAIL,
    r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b"
);

pii_pattern!(
    RE_PHONE,
    r"\b(?:\+?1[-.]?)?\(?([0-9]{3})\)?[-.]?([0-9]{3})[-.]?([0-9]{4})\b"
);

// Area/group/serial exclusions are applied by `valid_ssn`.
pii_pattern!(RE_SSN, r"\b\d{3}-\d{2}-\d{4}\b");

pii_pattern!(RE_CREDIT_CARD, r"\b(?:\d{4}[-\s]?){3}\d{4}\b");

pii_pattern!(RE_IPV4, r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b");

pii_pattern!(
    RE_DOB,
    r"\b(?:0[1-9]|1[0-2])[-/](?:0[1-9]|[12][0-9]|3[01])[-/](?:19|20)\d{2}\b"
);

fn any(_: &str) -> bool {
    true
}

/// Rejects area 000, 666 and 9xx, group 00, serial 0000.
pub fn valid_ssn(m: &str) -> bool {
    let mut parts = m.split('-');
    let (Some(area), Some(group), Some(serial)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    !(area == "000" || area == "666" || area.starts_with('9') || group == "00" || serial == "0000")
}

/// All patterns, in reporting order.
pub fn all_patterns() -> [PiiPattern; 6] {
    [
        PiiPattern {
            category: FindingCategory::Email,
            regex: &RE_EMAIL,
            accept: any,
        },
        PiiPattern {
            category: FindingCategory::Phone,
            regex: &RE_PHONE,
            accept: any,
        },
        PiiPattern {
            category: FindingCategory::Ssn,
            regex: &RE_SSN,
            accept: valid_ssn,
        },
        PiiPattern {
            category: FindingCategory::CreditCard,
            regex: &RE_CREDIT_CARD,
            accept: any,
        },
        PiiPattern {
            category: FindingCategory::IpAddress,
            regex: &RE_IPV4,
            accept: any,
        },
        PiiPattern {
            category: FindingCategory::DateOfBirth,
            regex: &RE_DOB,
            accept: any,
        },
    ]
}

/// Runs every pattern over the full text. Matches are neither deduplicated
/// nor reconciled across patterns.
pub fn scan_all(text: &str, index: &CharIndex) -> Vec<Finding> {
    let mut findings = Vec::new();
    for pattern in all_patterns() {
        let Some(re) = pattern.regex.as_ref() else {
            warn!(category = ?pattern.category, "PII pattern failed to compile; skipped");
            continue;
        };
        for m in re.find_iter(text) {
            if !(pattern.accept)(m.as_str()) {
                continue;
            }
            findings.push(Finding {
                category: pattern.category,
                value: m.as_str().to_string(),
                start: index.char_offset(m.start()),
                end: index.char_offset(m.end()),
            });
        }
    }
    findings
}
