// ✅ Data Quality Engine - Validates fee records and exam schemes
// Per-record rule results with severity, aggregated into batch summaries.
// Failures are reported, never swallowed: a malformed scheme is flagged here
// even though the resolver recovers from it at read time.

use crate::canonical::{normalize_to_slug, CanonicalSlugTable};
use crate::db::{ExamScheme, FeeComponentRecord};
use crate::limits::parse_credit_rules;
use serde::{Deserialize, Serialize};

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub rule_name: String,
    pub field: String,
    pub message: String,
    pub confidence: f64,
    pub severity: Severity,
}

impl ValidationResult {
    pub fn pass(rule_name: &str, field: &str, message: &str) -> Self {
        ValidationResult {
            passed: true,
            rule_name: rule_name.to_string(),
            field: field.to_string(),
            message: message.to_string(),
            confidence: 1.0,
            severity: Severity::Info,
        }
    }

    pub fn fail(rule_name: &str, field: &str, message: &str, severity: Severity) -> Self {
        ValidationResult {
            passed: false,
            rule_name: rule_name.to_string(),
            field: field.to_string(),
            message: message.to_string(),
            confidence: if severity == Severity::Critical {
                0.0
            } else {
                0.5
            },
            severity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Severity {
    Critical, // Record is unusable as-is
    Warning,  // Record is questionable; downstream logic will compensate
    Info,     // Record is valid but worth a look
}

// ============================================================================
// QUALITY REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityIssue {
    pub severity: Severity,
    pub field: String,
    pub issue: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    /// Identity of the validated record (record UUID or scheme id)
    pub record_id: String,
    pub overall_quality: f64,
    pub overall_confidence: f64,
    pub validations: Vec<ValidationResult>,
    pub issues: Vec<QualityIssue>,
    pub passed_count: usize,
    pub failed_count: usize,
    pub needs_review: bool,
}

impl QualityReport {
    fn from_validations(
        record_id: String,
        validations: Vec<ValidationResult>,
        issues: Vec<QualityIssue>,
        review_threshold: f64,
    ) -> Self {
        let passed_count = validations.iter().filter(|v| v.passed).count();
        let failed_count = validations.len() - passed_count;

        let overall_quality = if validations.is_empty() {
            1.0
        } else {
            passed_count as f64 / validations.len() as f64
        };
        let overall_confidence = if validations.is_empty() {
            1.0
        } else {
            validations.iter().map(|v| v.confidence).sum::<f64>() / validations.len() as f64
        };

        let has_critical = issues.iter().any(|i| i.severity == Severity::Critical);
        let needs_review = has_critical || overall_confidence < review_threshold;

        QualityReport {
            record_id,
            overall_quality,
            overall_confidence,
            validations,
            issues,
            passed_count,
            failed_count,
            needs_review,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Quality: {:.1}%, Confidence: {:.1}%, Issues: {} ({} critical)",
            self.overall_quality * 100.0,
            self.overall_confidence * 100.0,
            self.issues.len(),
            self.issues
                .iter()
                .filter(|i| i.severity == Severity::Critical)
                .count()
        )
    }

    pub fn is_high_quality(&self) -> bool {
        self.overall_quality >= 0.8 && self.overall_confidence >= 0.7
    }

    pub fn has_critical_issues(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity == Severity::Critical)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_records: usize,
    pub high_quality_count: usize,
    pub needs_review_count: usize,
    pub critical_issues_count: usize,
    pub average_quality: f64,
    pub average_confidence: f64,
}

impl BatchSummary {
    pub fn summary(&self) -> String {
        format!(
            "{} records: {:.1}% quality, {:.1}% confidence | {} high quality, {} need review, {} critical",
            self.total_records,
            self.average_quality * 100.0,
            self.average_confidence * 100.0,
            self.high_quality_count,
            self.needs_review_count,
            self.critical_issues_count
        )
    }
}

// ============================================================================
// DATA QUALITY ENGINE
// ============================================================================

pub struct DataQualityEngine {
    /// Recognized canonical fee heads
    table: CanonicalSlugTable,

    /// Highest semester any program runs to
    max_semester: i64,

    /// Minimum confidence threshold for "needs_review"
    review_threshold: f64,
}

impl DataQualityEngine {
    pub fn new(table: CanonicalSlugTable) -> Self {
        DataQualityEngine {
            table,
            max_semester: 12,
            review_threshold: 0.7,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(CanonicalSlugTable::with_defaults())
    }

    /// Validate one fee component record
    pub fn validate_record(&self, record: &FeeComponentRecord) -> QualityReport {
        let mut validations = Vec::new();
        let mut issues = Vec::new();

        let name_result = self.validate_component_name(&record.component_name);
        push_issue(
            &mut issues,
            &name_result,
            "Enter the fee head name; blank components can never be frozen",
        );
        validations.push(name_result);

        let amount_result = self.validate_amount(record.amount);
        push_issue(
            &mut issues,
            &amount_result,
            "Verify the component amount against the fee sheet",
        );
        validations.push(amount_result);

        let semester_result = self.validate_semester(record.semester);
        push_issue(
            &mut issues,
            &semester_result,
            "Semester should be within the program's duration",
        );
        validations.push(semester_result);

        let slug_result = self.validate_slug(&record.component_name);
        push_issue(
            &mut issues,
            &slug_result,
            "Rename to a canonical head, or keep as a program-specific extra",
        );
        validations.push(slug_result);

        QualityReport::from_validations(
            record.id.clone(),
            validations,
            issues,
            self.review_threshold,
        )
    }

    /// Validate one exam scheme, including its credit rules
    pub fn validate_scheme(&self, scheme: &ExamScheme) -> QualityReport {
        let mut validations = Vec::new();
        let mut issues = Vec::new();

        let rules_result = self.validate_credit_rules(scheme);
        push_issue(
            &mut issues,
            &rules_result,
            "Fix the credit rules JSON; until then the resolver uses scheme globals",
        );
        validations.push(rules_result);

        let globals_result = self.validate_globals(scheme);
        push_issue(
            &mut issues,
            &globals_result,
            "Set max total marks so unruled subjects have a limit",
        );
        validations.push(globals_result);

        let active_result = if scheme.is_active {
            ValidationResult::pass("scheme_active", "is_active", "Scheme is active")
        } else {
            ValidationResult::fail(
                "scheme_active",
                "is_active",
                "Scheme is inactive",
                Severity::Info,
            )
        };
        push_issue(
            &mut issues,
            &active_result,
            "Inactive schemes are ignored by marks entry",
        );
        validations.push(active_result);

        QualityReport::from_validations(
            format!("scheme-{}", scheme.scheme_id),
            validations,
            issues,
            self.review_threshold,
        )
    }

    pub fn validate_batch(&self, records: &[FeeComponentRecord]) -> Vec<QualityReport> {
        records.iter().map(|r| self.validate_record(r)).collect()
    }

    /// Generate summary statistics for batch validation
    pub fn batch_summary(&self, reports: &[QualityReport]) -> BatchSummary {
        let total = reports.len();
        if total == 0 {
            return BatchSummary {
                total_records: 0,
                high_quality_count: 0,
                needs_review_count: 0,
                critical_issues_count: 0,
                average_quality: 1.0,
                average_confidence: 1.0,
            };
        }

        let high_quality = reports.iter().filter(|r| r.is_high_quality()).count();
        let needs_review = reports.iter().filter(|r| r.needs_review).count();
        let has_critical = reports.iter().filter(|r| r.has_critical_issues()).count();

        let avg_quality: f64 =
            reports.iter().map(|r| r.overall_quality).sum::<f64>() / total as f64;
        let avg_confidence: f64 =
            reports.iter().map(|r| r.overall_confidence).sum::<f64>() / total as f64;

        BatchSummary {
            total_records: total,
            high_quality_count: high_quality,
            needs_review_count: needs_review,
            critical_issues_count: has_critical,
            average_quality: avg_quality,
            average_confidence: avg_confidence,
        }
    }

    // ========================================================================
    // VALIDATION RULES
    // ========================================================================

    fn validate_component_name(&self, name: &str) -> ValidationResult {
        if name.trim().is_empty() {
            return ValidationResult::fail(
                "component_not_blank",
                "component_name",
                "Component name is blank",
                Severity::Critical,
            );
        }

        if normalize_to_slug(name).is_empty() {
            return ValidationResult::fail(
                "component_sluggable",
                "component_name",
                &format!("Component name '{}' normalizes to an empty slug", name),
                Severity::Critical,
            );
        }

        ValidationResult::pass(
            "component_not_blank",
            "component_name",
            "Component name present",
        )
    }

    fn validate_amount(&self, amount: f64) -> ValidationResult {
        if amount < 0.0 {
            return ValidationResult::fail(
                "amount_non_negative",
                "amount",
                &format!("Amount is negative: {}", amount),
                Severity::Critical,
            );
        }

        if amount == 0.0 {
            return ValidationResult::fail(
                "amount_non_zero",
                "amount",
                "Amount is zero (seeded placeholder, not yet priced)",
                Severity::Info,
            );
        }

        ValidationResult::pass("amount_valid", "amount", "Amount is positive")
    }

    fn validate_semester(&self, semester: i64) -> ValidationResult {
        if semester < 1 || semester > self.max_semester {
            return ValidationResult::fail(
                "semester_in_range",
                "semester",
                &format!("Semester {} outside 1..={}", semester, self.max_semester),
                Severity::Warning,
            );
        }

        ValidationResult::pass("semester_in_range", "semester", "Semester in range")
    }

    fn validate_slug(&self, name: &str) -> ValidationResult {
        let slug = normalize_to_slug(name);
        if slug.is_empty() {
            // Already reported by component_sluggable
            return ValidationResult::fail(
                "slug_canonical",
                "component_name",
                "No slug to check against the canonical table",
                Severity::Info,
            );
        }

        if !self.table.contains(&slug) {
            return ValidationResult::fail(
                "slug_canonical",
                "component_name",
                &format!("'{}' is not a canonical head (program-specific extra)", slug),
                Severity::Info,
            );
        }

        ValidationResult::pass("slug_canonical", "component_name", "Canonical head")
    }

    fn validate_credit_rules(&self, scheme: &ExamScheme) -> ValidationResult {
        let json = match scheme.credit_rules_json.as_deref() {
            Some(s) if !s.trim().is_empty() => s,
            _ => {
                return ValidationResult::pass(
                    "credit_rules_parse",
                    "credit_rules_json",
                    "No credit rules; globals apply unconditionally",
                )
            }
        };

        match parse_credit_rules(json) {
            Ok(rules) => {
                let bad_totals = rules.iter().filter(|r| r.max_tot <= 0.0).count();
                if bad_totals > 0 {
                    return ValidationResult::fail(
                        "rule_totals_positive",
                        "credit_rules_json",
                        &format!("{} rule(s) have non-positive max_tot", bad_totals),
                        Severity::Warning,
                    );
                }
                ValidationResult::pass(
                    "credit_rules_parse",
                    "credit_rules_json",
                    &format!("{} credit rules parsed", rules.len()),
                )
            }
            Err(e) => ValidationResult::fail(
                "credit_rules_parse",
                "credit_rules_json",
                &format!("Credit rules do not parse: {}", e),
                Severity::Warning,
            ),
        }
    }

    fn validate_globals(&self, scheme: &ExamScheme) -> ValidationResult {
        if scheme.max_total_marks.is_none() {
            return ValidationResult::fail(
                "globals_present",
                "max_total_marks",
                "No global max total marks",
                Severity::Info,
            );
        }

        ValidationResult::pass("globals_present", "max_total_marks", "Global limits set")
    }
}

impl Default for DataQualityEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn push_issue(issues: &mut Vec<QualityIssue>, result: &ValidationResult, recommendation: &str) {
    if !result.passed {
        issues.push(QualityIssue {
            severity: result.severity.clone(),
            field: result.field.clone(),
            issue: result.message.clone(),
            recommendation: recommendation.to_string(),
        });
    }
}

// ============================================================================
// TESTS
// ============================================================================
