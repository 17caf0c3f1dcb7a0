// ❄️ Freeze Engine - Canonical fee-head deduplication
// Per (program, semester): group rows by slug, keep the highest amount,
// rename the winner to its canonical head, deactivate the duplicates.

use crate::canonical::{normalize_to_slug, CanonicalSlugTable};
use crate::db::{self, FeeComponentRecord};
use anyhow::Result;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// FREEZE OUTCOME
// ============================================================================

/// Result of freezing one (program, semester) scope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreezeOutcome {
    /// Canonical heads frozen (one winner each)
    pub frozen: usize,

    /// Duplicate rows deactivated (never deleted)
    pub deactivated: usize,

    /// Total rows in the scope, before and after (freeze conserves count)
    pub total_rows: usize,

    /// Slugs present in the scope but not in the canonical table.
    /// These are program-specific extra heads and are left untouched.
    pub skipped_slugs: Vec<String>,
}

impl FreezeOutcome {
    pub fn summary(&self) -> String {
        format!(
            "{} heads frozen, {} duplicates deactivated, {} rows total, {} non-canonical slugs skipped",
            self.frozen,
            self.deactivated,
            self.total_rows,
            self.skipped_slugs.len()
        )
    }
}

// ============================================================================
// FREEZE (PURE, IN-MEMORY)
// ============================================================================

/// Freeze canonical components for one (program, semester) scope.
///
/// For each group of records sharing a canonical slug, the record with the
/// highest amount wins; on a tie the first record in input order wins.
/// Callers load records in ascending row-id order, so the tie-break is
/// "lowest record id wins" - deterministic across runs.
///
/// The winner is renamed to the canonical display name and marked
/// active + frozen; every other record in the group is deactivated.
/// Groups whose slug is not canonical (including blank names) are untouched.
/// Records are mutated in place; the caller persists them.
pub fn freeze_program_semester(
    records: &mut [FeeComponentRecord],
    table: &CanonicalSlugTable,
) -> FreezeOutcome {
    // Group record indices by slug, preserving first-encounter order
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        let slug = normalize_to_slug(&record.component_name);
        let entry = groups.entry(slug.clone()).or_default();
        if entry.is_empty() {
            order.push(slug);
        }
        entry.push(idx);
    }

    let mut frozen = 0;
    let mut deactivated = 0;
    let mut skipped_slugs = Vec::new();

    for slug in &order {
        let indices = &groups[slug];

        if slug.is_empty() || !table.contains(slug) {
            // Blank names are a data-quality issue, not a freeze concern
            if !slug.is_empty() {
                skipped_slugs.push(slug.clone());
            }
            continue;
        }

        // Highest amount wins; ties resolve to the first record in input order
        let mut winner = indices[0];
        for &idx in &indices[1..] {
            if records[idx].amount > records[winner].amount {
                winner = idx;
            }
        }

        let display_name = table
            .display_name(slug)
            .map(str::to_string)
            .unwrap_or_else(|| records[winner].component_name.trim().to_string());

        records[winner].component_name = display_name;
        records[winner].is_active = true;
        records[winner].is_frozen = true;
        records[winner].touch();
        frozen += 1;

        for &idx in indices {
            if idx != winner {
                records[idx].is_active = false;
                records[idx].touch();
                deactivated += 1;
            }
        }
    }

    FreezeOutcome {
        frozen,
        deactivated,
        total_rows: records.len(),
        skipped_slugs,
    }
}

// ============================================================================
// FREEZE-ALL DRIVER
// ============================================================================

/// Outcome for one (program, semester) combo in a freeze-all run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboResult {
    pub program_name: String,
    pub program_id: i64,
    pub semester: i64,
    pub outcome: FreezeOutcome,
}

/// A (program, semester) combo whose persistence failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboFailure {
    pub program_name: String,
    pub program_id: i64,
    pub semester: i64,
    pub error: String,
}

/// Aggregate report for a freeze-all run.
/// Partial application is reported, never hidden: every failed combo is listed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreezeRunReport {
    pub combos_processed: usize,
    pub total_frozen: usize,
    pub total_deactivated: usize,
    pub combos: Vec<ComboResult>,
    pub failures: Vec<ComboFailure>,
}

impl FreezeRunReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} program/semester combos processed, {} heads frozen, {} duplicates deactivated, {} failed",
            self.combos_processed, self.total_frozen, self.total_deactivated,
            self.failures.len()
        )
    }
}

/// Freeze every (program, distinct semester) combo in the database.
///
/// Each combo commits in its own transaction; a combo that fails to persist
/// is recorded in the report and does not abort the remaining combos.
pub fn freeze_all(conn: &mut Connection, table: &CanonicalSlugTable) -> Result<FreezeRunReport> {
    let programs = db::list_programs(conn)?;

    let mut report = FreezeRunReport {
        combos_processed: 0,
        total_frozen: 0,
        total_deactivated: 0,
        combos: Vec::new(),
        failures: Vec::new(),
    };

    for program in &programs {
        let semesters = db::distinct_semesters(conn, program.program_id)?;
        for semester in semesters {
            report.combos_processed += 1;
            match db::freeze_and_persist(conn, program.program_id, semester, table) {
                Ok(outcome) => {
                    report.total_frozen += outcome.frozen;
                    report.total_deactivated += outcome.deactivated;
                    report.combos.push(ComboResult {
                        program_name: program.program_name.clone(),
                        program_id: program.program_id,
                        semester,
                        outcome,
                    });
                }
                Err(e) => {
                    report.failures.push(ComboFailure {
                        program_name: program.program_name.clone(),
                        program_id: program.program_id,
                        semester,
                        error: format!("{:#}", e),
                    });
                }
            }
        }
    }

    Ok(report)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, amount: f64) -> FeeComponentRecord {
        FeeComponentRecord::new("BCA", 1, name, amount)
    }

    #[test]
    fn test_freeze_end_to_end_scenario() {
        let mut records = vec![
            record("Tuition Fee", 11500.0),
            record("TUITION FEE ", 11000.0),
            record("Library Fee", 200.0),
        ];
        let table = CanonicalSlugTable::from_display_names(["Tuition Fee", "Library Fee"]);

        let outcome = freeze_program_semester(&mut records, &table);

        assert_eq!(outcome.frozen, 2);
        assert_eq!(outcome.deactivated, 1);
        assert_eq!(outcome.total_rows, 3);

        let active: Vec<_> = records.iter().filter(|r| r.is_active).collect();
        assert_eq!(active.len(), 2);

        assert_eq!(records[0].component_name, "Tuition Fee");
        assert!(records[0].is_active && records[0].is_frozen);
        assert_eq!(records[0].amount, 11500.0);

        // The 11000 duplicate survives, deactivated
        assert!(!records[1].is_active);

        assert_eq!(records[2].component_name, "Library Fee");
        assert!(records[2].is_active && records[2].is_frozen);
    }

    #[test]
    fn test_freeze_dedup_invariant() {
        let mut records = vec![
            record("Library Fee", 200.0),
            record("LIBARY FEE", 250.0),
            record("library  fee", 250.0),
            record("Library Fee ", 100.0),
        ];
        let table = CanonicalSlugTable::with_defaults();

        freeze_program_semester(&mut records, &table);

        let active_count = records
            .iter()
            .filter(|r| r.is_active && r.slug() == "library-fee")
            .count();
        assert_eq!(active_count, 1);
    }

    #[test]
    fn test_freeze_never_deletes() {
        let mut records = vec![
            record("Tuition Fee", 11500.0),
            record("Tution Fee", 11000.0),
            record("Hostel Fee", 3000.0),
            record("", 50.0),
        ];
        let table = CanonicalSlugTable::with_defaults();

        let outcome = freeze_program_semester(&mut records, &table);

        assert_eq!(records.len(), 4);
        assert_eq!(outcome.total_rows, 4);
    }

    #[test]
    fn test_freeze_tie_break_first_encountered() {
        // Equal amounts: the first record in input order wins
        let mut records = vec![
            record("Examination Fee", 500.0),
            record("EXAMINATION FEE", 500.0),
        ];
        let first_id = records[0].id.clone();
        let table = CanonicalSlugTable::with_defaults();

        let outcome = freeze_program_semester(&mut records, &table);

        assert_eq!(outcome.frozen, 1);
        assert_eq!(outcome.deactivated, 1);
        let winner = records.iter().find(|r| r.is_active).unwrap();
        assert_eq!(winner.id, first_id);
    }

    #[test]
    fn test_freeze_skips_non_canonical_heads() {
        let mut records = vec![
            record("Hostel Fee", 3000.0),
            record("Hostel Fee", 2500.0),
            record("Tuition Fee", 11500.0),
        ];
        let table = CanonicalSlugTable::with_defaults();

        let outcome = freeze_program_semester(&mut records, &table);

        // Program-specific extras: no freeze, no deactivation
        assert!(records[0].is_active && !records[0].is_frozen);
        assert!(records[1].is_active && !records[1].is_frozen);
        assert_eq!(outcome.skipped_slugs, vec!["hostel-fee".to_string()]);
        assert_eq!(outcome.frozen, 1);
        assert_eq!(outcome.deactivated, 0);
    }

    #[test]
    fn test_freeze_blank_names_untouched() {
        let mut records = vec![record("", 100.0), record("  ", 200.0)];
        let table = CanonicalSlugTable::with_defaults();

        let outcome = freeze_program_semester(&mut records, &table);

        assert_eq!(outcome.frozen, 0);
        assert_eq!(outcome.deactivated, 0);
        assert!(outcome.skipped_slugs.is_empty());
        assert!(records.iter().all(|r| r.is_active && !r.is_frozen));
    }

    #[test]
    fn test_freeze_reactivates_inactive_winner() {
        let mut inactive = record("Tuition Fee", 12000.0);
        inactive.is_active = false;
        let mut records = vec![inactive, record("Tution Fee", 11000.0)];
        let table = CanonicalSlugTable::with_defaults();

        freeze_program_semester(&mut records, &table);

        // Highest amount wins even if it was inactive going in
        assert!(records[0].is_active && records[0].is_frozen);
        assert!(!records[1].is_active);
    }

    #[test]
    fn test_freeze_is_idempotent() {
        let mut records = vec![
            record("Tuition Fee", 11500.0),
            record("TUITION FEE", 11000.0),
            record("Library Fee", 200.0),
        ];
        let table = CanonicalSlugTable::with_defaults();

        let first = freeze_program_semester(&mut records, &table);
        let snapshot: Vec<(String, bool, bool)> = records
            .iter()
            .map(|r| (r.component_name.clone(), r.is_active, r.is_frozen))
            .collect();

        let second = freeze_program_semester(&mut records, &table);
        let after: Vec<(String, bool, bool)> = records
            .iter()
            .map(|r| (r.component_name.clone(), r.is_active, r.is_frozen))
            .collect();

        assert_eq!(first.frozen, second.frozen);
        assert_eq!(snapshot, after);
    }
}
