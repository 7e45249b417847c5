use crate::models::{FindingsReport, RiskLevel, SensitivityAssessment};

pub fn assess_sensitivity(report: &FindingsReport) -> SensitivityAssessment {
    SensitivityAssessment {
        is_sensitive: report.has_pii,
        risk_level: report.risk_level,
        should_encrypt: matches!(report.risk_level, RiskLevel::High | RiskLevel::Medium),
        requires_access_control: report.has_pii,
        recommendations: recommendations(report),
    }
}

fn recommendations(report: &FindingsReport) -> Vec<String> {
    let summary = &report.summary;
    let rules: [(bool, &str); 4] = [
        (
            summary.ssns > 0,
            "File contains SSNs - enable encryption and restrict access",
        ),
        (
            summary.credit_cards > 0,
            "File contains credit card numbers - apply PCI-DSS controls",
        ),
        (
            report.risk_level == RiskLevel::High,
            "High PII risk - consider data masking for non-essential users",
        ),
        (
            summary.emails > 5,
            "Multiple email addresses detected - verify GDPR compliance",
        ),
    ];

    let mut out: Vec<String> = rules
        .iter()
        .filter(|(applies, _)| *applies)
        .map(|(_, text)| text.to_string())
        .collect();
    if out.is_empty() {
        out.push("Basic access controls recommended".to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PiiSummary;

    fn report(summary: PiiSummary, risk_level: RiskLevel) -> FindingsReport {
        FindingsReport {
            has_pii: summary.total() > 0,
            risk_level,
            summary,
            ..Default::default()
        }
    }

    #[test]
    fn clean_report_gets_basic_controls() {
        let a = assess_sensitivity(&FindingsReport::default());
        assert!(!a.is_sensitive);
        assert!(!a.should_encrypt);
        assert!(!a.requires_access_control);
        assert_eq!(a.recommendations, vec!["Basic access controls recommended"]);
    }

    #[test]
    fn ssn_and_card_rules_in_order() {
        let r = report(
            PiiSummary {
                ssns: 1,
                credit_cards: 2,
                emails: 6,
                ..Default::default()
            },
            RiskLevel::High,
        );
        let a = assess_sensitivity(&r);
        assert!(a.should_encrypt);
        assert_eq!(
            a.recommendations,
            vec![
                "File contains SSNs - enable encryption and restrict access",
                "File contains credit card numbers - apply PCI-DSS controls",
                "High PII risk - consider data masking for non-essential users",
                "Multiple email addresses detected - verify GDPR compliance",
            ]
        );
    }

    #[test]
    fn medium_risk_encrypts_without_specific_advice() {
        let r = report(
            PiiSummary {
                emails: 3,
                ..Default::default()
            },
            RiskLevel::Medium,
        );
        let a = assess_sensitivity(&r);
        assert!(a.is_sensitive);
        assert!(a.should_encrypt);
        assert_eq!(a.recommendations, vec!["Basic access controls recommended"]);
    }
}
