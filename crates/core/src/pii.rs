//! PII detection: entity recognition plus fixed patterns.

use crate::models::{Finding, FindingCategory, FindingsReport, PiiSummary, RiskLevel};
use crate::patterns;
use providers::text::CharIndex;
use providers::{EntityRecognitionCapability, EntitySpan, ProviderError};
use std::collections::HashSet;

/// Maps a recognizer label to the entity category we report, if any.
pub fn entity_category(label: &str) -> Option<FindingCategory> {
    match label {
        "PERSON" => Some(FindingCategory::PersonName),
        "ORG" => Some(FindingCategory::Organization),
        "GPE" | "LOC" => Some(FindingCategory::Location),
        _ => None,
    }
}

/// Detects PII in `text`.
///
/// Blank text yields the default report without running the recognizer.
pub fn detect(
    recognizer: &dyn EntityRecognitionCapability,
    text: &str,
) -> Result<FindingsReport, ProviderError> {
    if text.trim().is_empty() {
        return Ok(FindingsReport::default());
    }

    let index = CharIndex::new(text);
    let entities: Vec<Finding> = recognizer
        .process(text)?
        .into_iter()
        .filter_map(|span| entity_finding(span, index.char_len()))
        .collect();
    let patterns = patterns::scan_all(text, &index);

    let summary = summarize(&entities, &patterns);
    let total = summary.total();
    Ok(FindingsReport {
        has_pii: total > 0,
        risk_level: risk_level(&summary),
        entities,
        patterns,
        summary,
    })
}

fn entity_finding(span: EntitySpan, char_len: usize) -> Option<Finding> {
    let category = entity_category(&span.label)?;
    if span.start > span.end || span.end > char_len {
        tracing::warn!(
            label = %span.label,
            start = span.start,
            end = span.end,
            "Dropping out-of-range entity span"
        );
        return None;
    }
    Some(Finding {
        category,
        value: span.text,
        start: span.start,
        end: span.end,
    })
}

pub fn summarize(entities: &[Finding], patterns: &[Finding]) -> PiiSummary {
    let distinct = |category: FindingCategory| {
        entities
            .iter()
            .filter(|f| f.category == category)
            .map(|f| f.value.as_str())
            .collect::<HashSet<_>>()
            .len()
    };
    let count = |category: FindingCategory| patterns.iter().filter(|f| f.category == category).count();

    PiiSummary {
        person_names: distinct(FindingCategory::PersonName),
        organizations: distinct(FindingCategory::Organization),
        locations: distinct(FindingCategory::Location),
        emails: count(FindingCategory::Email),
        phones: count(FindingCategory::Phone),
        ssns: count(FindingCategory::Ssn),
        credit_cards: count(FindingCategory::CreditCard),
        ip_addresses: count(FindingCategory::IpAddress),
    }
}

/// Strict precedence; never below `Low`, even with nothing found.
pub fn risk_level(summary: &PiiSummary) -> RiskLevel {
    if summary.ssns > 0 || summary.credit_cards > 0 {
        RiskLevel::High
    } else if summary.emails > 2 || summary.phones > 2 || summary.person_names > 3 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}
