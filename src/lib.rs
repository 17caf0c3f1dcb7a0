// Campus Records Core Library
// Fee-head canonicalization and freezing, exam mark-limit resolution,
// and the SQLite store behind them. Exposed for the CLI and tests.

pub mod canonical;
pub mod data_quality;
pub mod db;
pub mod freeze;
pub mod limits;

// Re-export commonly used types
pub use canonical::{normalize_to_slug, CanonicalSlugTable, DEFAULT_FEE_HEADS};
pub use data_quality::{
    BatchSummary, DataQualityEngine, QualityIssue, QualityReport, Severity, ValidationResult,
};
pub use db::{
    distinct_semesters, freeze_and_persist, get_exam_scheme, get_fee_records, get_subject,
    insert_exam_scheme, insert_fee_records, insert_subject, list_programs, load_fee_csv,
    seed_fee_heads, setup_database, upsert_program, verify_fee_count, ExamScheme,
    FeeComponentRecord, ImportStats, Program, Subject,
};
pub use freeze::{
    freeze_all, freeze_program_semester, ComboFailure, ComboResult, FreezeOutcome,
    FreezeRunReport,
};
pub use limits::{
    parse_credit_rules, resolve_limits, CreditRule, LimitSource, ResolvedLimits, WILDCARD_TYPE,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
