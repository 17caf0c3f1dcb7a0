// 🎓 Exam Mark-Limit Resolver - Credit-based overrides over scheme globals
// Priority: exact (credit + type) rule > wildcard "All" rule > scheme globals

use crate::db::{ExamScheme, Subject};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Rule type matching any subject type with the same credit count
pub const WILDCARD_TYPE: &str = "All";

// ============================================================================
// CREDIT RULE
// ============================================================================

/// One credit-based override rule from a scheme's `credit_rules_json`.
///
/// Rules are stored as a JSON array; fields missing from a rule object take
/// the same defaults the marks-entry forms assume (credit 0, type "All",
/// limits 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditRule {
    /// Credit count this rule applies to
    #[serde(default)]
    pub credit: f64,

    /// Subject-type code, or "All" to match any type with this credit count
    #[serde(rename = "type", default = "default_rule_type")]
    pub rule_type: String,

    #[serde(default)]
    pub max_int: f64,

    #[serde(default)]
    pub max_ext: f64,

    #[serde(default)]
    pub max_tot: f64,

    /// Optional passing minimum; absent rules leave min_total unset
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_tot: Option<f64>,
}

fn default_rule_type() -> String {
    WILDCARD_TYPE.to_string()
}

impl CreditRule {
    /// Exact match: credit count and subject type both equal
    pub fn matches_exactly(&self, subject: &Subject) -> bool {
        self.credit == subject.credits && self.rule_type == subject.type_code
    }

    /// Fallback match: credit count equal, rule type is the wildcard
    pub fn matches_wildcard(&self, subject: &Subject) -> bool {
        self.credit == subject.credits && self.rule_type == WILDCARD_TYPE
    }
}

/// Parse a scheme's credit rules from their JSON encoding.
/// Used at load time for validation; the resolver calls it internally
/// and falls back to scheme globals when parsing fails.
pub fn parse_credit_rules(json: &str) -> Result<Vec<CreditRule>> {
    serde_json::from_str(json).context("Failed to parse credit rules JSON")
}

// ============================================================================
// RESOLVED LIMITS
// ============================================================================

/// Where the resolved limits came from. MalformedRules is the observable
/// signal that `credit_rules_json` was unparseable and globals were used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LimitSource {
    /// Rule at `index` matched credit and subject type
    ExactRule { index: usize },

    /// Rule at `index` matched credit with the "All" wildcard type
    FallbackRule { index: usize },

    /// No rule matched (or no rules exist); scheme globals apply
    GlobalDefaults,

    /// credit_rules_json did not parse; scheme globals apply
    MalformedRules,
}

/// Effective mark limits for one subject under one exam scheme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLimits {
    pub max_internal: Option<f64>,
    pub max_external: Option<f64>,
    pub max_total: Option<f64>,

    /// Set only when a matching rule carries `min_tot`
    pub min_total: Option<f64>,

    pub source: LimitSource,
}

impl ResolvedLimits {
    fn from_globals(scheme: &ExamScheme) -> Self {
        ResolvedLimits {
            max_internal: scheme.max_internal_marks,
            max_external: scheme.max_external_marks,
            max_total: scheme.max_total_marks,
            min_total: None,
            source: LimitSource::GlobalDefaults,
        }
    }

    /// Whether a credit rule (exact or fallback) supplied these limits
    pub fn from_rule(&self) -> bool {
        matches!(
            self.source,
            LimitSource::ExactRule { .. } | LimitSource::FallbackRule { .. }
        )
    }

    pub fn summary(&self) -> String {
        let fmt = |v: Option<f64>| match v {
            Some(x) => format!("{}", x),
            None => "-".to_string(),
        };
        format!(
            "max internal {}, max external {}, max total {}, min total {} ({:?})",
            fmt(self.max_internal),
            fmt(self.max_external),
            fmt(self.max_total),
            fmt(self.min_total),
            self.source
        )
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolve effective mark limits for a subject under a scheme.
///
/// Rules are scanned in list order. An exact match wins immediately; the
/// first wildcard match is retained as a fallback while the scan continues,
/// so an exact rule listed after a wildcard rule is still found. With no
/// match (or no rules, or malformed rules) the scheme globals apply
/// unchanged and `min_total` stays absent.
///
/// Pure read-and-compute; safe for concurrent invocation.
pub fn resolve_limits(scheme: &ExamScheme, subject: &Subject) -> ResolvedLimits {
    let mut limits = ResolvedLimits::from_globals(scheme);

    let json = match scheme.credit_rules_json.as_deref() {
        Some(s) if !s.trim().is_empty() => s,
        _ => return limits,
    };

    let rules = match parse_credit_rules(json) {
        Ok(rules) => rules,
        Err(_) => {
            limits.source = LimitSource::MalformedRules;
            return limits;
        }
    };

    if rules.is_empty() {
        return limits;
    }

    let mut exact: Option<(usize, &CreditRule)> = None;
    let mut fallback: Option<(usize, &CreditRule)> = None;

    for (index, rule) in rules.iter().enumerate() {
        if rule.matches_exactly(subject) {
            exact = Some((index, rule));
            break;
        }
        if fallback.is_none() && rule.matches_wildcard(subject) {
            fallback = Some((index, rule));
        }
    }

    let selected = match (exact, fallback) {
        (Some((index, rule)), _) => Some((LimitSource::ExactRule { index }, rule)),
        (None, Some((index, rule))) => Some((LimitSource::FallbackRule { index }, rule)),
        (None, None) => None,
    };

    if let Some((source, rule)) = selected {
        limits.max_internal = Some(rule.max_int);
        limits.max_external = Some(rule.max_ext);
        limits.max_total = Some(rule.max_tot);
        limits.min_total = rule.min_tot;
        limits.source = source;
    }

    limits
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(credits: f64, type_code: &str) -> Subject {
        Subject {
            subject_id: 1,
            program_id: 1,
            semester: 1,
            subject_name: "Programming in C".to_string(),
            subject_code: Some("CS-101".to_string()),
            type_code: type_code.to_string(),
            credits,
        }
    }

    fn scheme_with_rules(rules_json: &str) -> ExamScheme {
        let mut scheme = ExamScheme::with_globals(1, 1, "2024-25", 30.0, 70.0, 100.0);
        scheme.credit_rules_json = Some(rules_json.to_string());
        scheme
    }

    #[test]
    fn test_globals_when_no_rules() {
        let scheme = ExamScheme::with_globals(1, 1, "2024-25", 30.0, 70.0, 100.0);
        let limits = resolve_limits(&scheme, &subject(4.0, "MAJOR"));

        assert_eq!(limits.max_internal, Some(30.0));
        assert_eq!(limits.max_external, Some(70.0));
        assert_eq!(limits.max_total, Some(100.0));
        assert_eq!(limits.min_total, None);
        assert_eq!(limits.source, LimitSource::GlobalDefaults);
    }

    #[test]
    fn test_globals_when_rules_empty() {
        let scheme = scheme_with_rules("[]");
        let limits = resolve_limits(&scheme, &subject(4.0, "MAJOR"));

        assert_eq!(limits.max_total, Some(100.0));
        assert_eq!(limits.min_total, None);
        assert_eq!(limits.source, LimitSource::GlobalDefaults);
    }

    #[test]
    fn test_exact_match_beats_fallback_listed_earlier() {
        // Wildcard rule listed FIRST; exact rule after it must still win
        let scheme = scheme_with_rules(
            r#"[
                {"credit": 4, "type": "All",   "max_int": 20, "max_ext": 60, "max_tot": 80},
                {"credit": 4, "type": "MAJOR", "max_int": 30, "max_ext": 70, "max_tot": 100}
            ]"#,
        );
        let limits = resolve_limits(&scheme, &subject(4.0, "MAJOR"));

        assert_eq!(limits.max_total, Some(100.0));
        assert_eq!(limits.source, LimitSource::ExactRule { index: 1 });
    }

    #[test]
    fn test_first_exact_match_wins() {
        // Rules are not guaranteed unique; first exact match in list order wins
        let scheme = scheme_with_rules(
            r#"[
                {"credit": 4, "type": "MAJOR", "max_int": 25, "max_ext": 75, "max_tot": 100},
                {"credit": 4, "type": "MAJOR", "max_int": 30, "max_ext": 70, "max_tot": 120}
            ]"#,
        );
        let limits = resolve_limits(&scheme, &subject(4.0, "MAJOR"));

        assert_eq!(limits.max_total, Some(100.0));
        assert_eq!(limits.source, LimitSource::ExactRule { index: 0 });
    }

    #[test]
    fn test_fallback_when_no_exact_match() {
        let scheme = scheme_with_rules(
            r#"[
                {"credit": 4, "type": "ELECTIVE", "max_int": 15, "max_ext": 35, "max_tot": 50},
                {"credit": 4, "type": "All",      "max_int": 20, "max_ext": 60, "max_tot": 80},
                {"credit": 4, "type": "All",      "max_int": 10, "max_ext": 30, "max_tot": 40}
            ]"#,
        );
        let limits = resolve_limits(&scheme, &subject(4.0, "MAJOR"));

        // First wildcard candidate is used, not the later one
        assert_eq!(limits.max_internal, Some(20.0));
        assert_eq!(limits.max_external, Some(60.0));
        assert_eq!(limits.max_total, Some(80.0));
        assert_eq!(limits.source, LimitSource::FallbackRule { index: 1 });
    }

    #[test]
    fn test_no_rule_for_credit_count_uses_globals() {
        let scheme = scheme_with_rules(
            r#"[{"credit": 2, "type": "All", "max_int": 15, "max_ext": 35, "max_tot": 50}]"#,
        );
        let limits = resolve_limits(&scheme, &subject(4.0, "MAJOR"));

        assert_eq!(limits.max_total, Some(100.0));
        assert_eq!(limits.source, LimitSource::GlobalDefaults);
    }

    #[test]
    fn test_min_total_only_when_rule_carries_it() {
        let with_min = scheme_with_rules(
            r#"[{"credit": 4, "type": "All", "max_int": 20, "max_ext": 60, "max_tot": 80, "min_tot": 32}]"#,
        );
        let limits = resolve_limits(&with_min, &subject(4.0, "MAJOR"));
        assert_eq!(limits.min_total, Some(32.0));

        let without_min = scheme_with_rules(
            r#"[{"credit": 4, "type": "All", "max_int": 20, "max_ext": 60, "max_tot": 80}]"#,
        );
        let limits = resolve_limits(&without_min, &subject(4.0, "MAJOR"));
        assert_eq!(limits.min_total, None);
    }

    #[test]
    fn test_malformed_rules_fall_back_observably() {
        let scheme = scheme_with_rules("{not valid json");
        let limits = resolve_limits(&scheme, &subject(4.0, "MAJOR"));

        assert_eq!(limits.max_internal, Some(30.0));
        assert_eq!(limits.max_external, Some(70.0));
        assert_eq!(limits.max_total, Some(100.0));
        assert_eq!(limits.min_total, None);
        assert_eq!(limits.source, LimitSource::MalformedRules);
    }

    #[test]
    fn test_blank_rules_json_uses_globals() {
        let scheme = scheme_with_rules("   ");
        let limits = resolve_limits(&scheme, &subject(4.0, "MAJOR"));
        assert_eq!(limits.source, LimitSource::GlobalDefaults);
    }

    #[test]
    fn test_uncategorized_subject_matches_wildcard_exactly() {
        // Subjects without a type carry "All" and treat wildcard rules as exact
        let scheme = scheme_with_rules(
            r#"[{"credit": 4, "type": "All", "max_int": 20, "max_ext": 60, "max_tot": 80}]"#,
        );
        let limits = resolve_limits(&scheme, &subject(4.0, WILDCARD_TYPE));

        assert_eq!(limits.max_total, Some(80.0));
        assert_eq!(limits.source, LimitSource::ExactRule { index: 0 });
    }

    #[test]
    fn test_rule_defaults_fill_missing_fields() {
        let rules = parse_credit_rules(r#"[{"credit": 3}]"#).unwrap();
        assert_eq!(rules[0].rule_type, "All");
        assert_eq!(rules[0].max_int, 0.0);
        assert_eq!(rules[0].max_tot, 0.0);
        assert_eq!(rules[0].min_tot, None);
    }
}
