use crate::models::{Finding, FindingsReport};

pub const DEFAULT_REDACTION_CHAR: char = '*';

/// Overwrites every person, organization and pattern span with `ch`.
///
/// Output has the same character count as the input. Spans are replaced one
/// by one from the highest start down and never merged; overlapping spans
/// simply overwrite the same characters again. Locations are left intact.
pub fn redact(text: &str, report: &FindingsReport, ch: char) -> String {
    if !report.has_pii {
        return text.to_string();
    }

    let mut spans: Vec<&Finding> = report
        .entities
        .iter()
        .filter(|f| f.category.is_redacted_entity())
        .chain(report.patterns.iter())
        .collect();
    spans.sort_by(|a, b| b.start.cmp(&a.start));

    let mut chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    for span in spans {
        let end = span.end.min(len);
        let start = span.start.min(end);
        chars[start..end].fill(ch);
    }
    chars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FindingCategory, RiskLevel};

    fn finding(category: FindingCategory, value: &str, start: usize) -> Finding {
        Finding {
            category,
            value: value.into(),
            start,
            end: start + value.chars().count(),
        }
    }

    fn report(entities: Vec<Finding>, patterns: Vec<Finding>) -> FindingsReport {
        FindingsReport {
            has_pii: true,
            risk_level: RiskLevel::Low,
            entities,
            patterns,
            ..Default::default()
        }
    }

    #[test]
    fn no_pii_returns_input() {
        let text = "nothing to see";
        assert_eq!(redact(text, &FindingsReport::default(), '#'), text);
    }

    #[test]
    fn replaces_spans_and_keeps_length() {
        let text = "Contact john@example.com or call 555-123-4567.";
        let r = report(
            vec![],
            vec![
                finding(FindingCategory::Email, "john@example.com", 8),
                finding(FindingCategory::Phone, "555-123-4567", 33),
            ],
        );
        let out = redact(text, &r, '*');
        assert_eq!(out, "Contact **************** or call ************.");
        assert_eq!(out.chars().count(), text.chars().count());
    }

    #[test]
    fn locations_survive() {
        let text = "Ada flew to Paris for Acme";
        let r = report(
            vec![
                finding(FindingCategory::PersonName, "Ada", 0),
                finding(FindingCategory::Location, "Paris", 12),
                finding(FindingCategory::Organization, "Acme", 22),
            ],
            vec![],
        );
        assert_eq!(redact(text, &r, 'X'), "XXX flew to Paris for XXXX");
    }

    #[test]
    fn overlapping_spans_do_not_shift_text() {
        let text = "abcdefghij";
        let r = report(
            vec![finding(FindingCategory::PersonName, "cdef", 2)],
            vec![finding(FindingCategory::Phone, "efgh", 4)],
        );
        assert_eq!(redact(text, &r, '-'), "ab------ij");
    }

    #[test]
    fn multibyte_text_uses_char_offsets() {
        let text = "Zoë: zoe@example.org";
        let r = report(vec![], vec![finding(FindingCategory::Email, "zoe@example.org", 5)]);
        assert_eq!(redact(text, &r, '█'), "Zoë: ███████████████");
    }

    #[test]
    fn out_of_range_spans_are_clamped() {
        let r = report(vec![], vec![finding(FindingCategory::Email, "abcdef", 3)]);
        assert_eq!(redact("abcde", &r, '*'), "abc**");
    }
}
