use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::canonical::{normalize_to_slug, CanonicalSlugTable};
use crate::freeze::{self, FreezeOutcome};

// ============================================================================
// FEE COMPONENT RECORD
// ============================================================================

/// One fee line item for a (program, semester) pair.
///
/// Records are never physically deleted by the freeze engine; only the
/// name/active/frozen flags mutate. The row id is the stable storage key,
/// the UUID is the record's identity, and the idempotency hash is the
/// import-time dedup key - three different concerns.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FeeComponentRecord {
    #[serde(rename = "Program")]
    pub program: String,

    #[serde(rename = "Semester")]
    pub semester: i64,

    /// Empty/absent means the component applies to all mediums
    #[serde(rename = "Medium", default)]
    pub medium_tag: Option<String>,

    #[serde(rename = "Component")]
    pub component_name: String,

    #[serde(rename = "Amount")]
    pub amount: f64,

    #[serde(rename = "Notes", default)]
    pub notes: Option<String>,

    /// Stable identity (UUID) - survives renames and deactivation
    #[serde(default = "default_uuid")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Storage row id; 0 until the record has been persisted
    #[serde(skip)]
    pub structure_id: i64,

    #[serde(default = "default_true")]
    pub is_active: bool,

    /// Clerk confirmation: frozen components are the authoritative heads
    #[serde(default)]
    pub is_frozen: bool,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_true() -> bool {
    true
}

impl FeeComponentRecord {
    /// Create a new active, unfrozen record
    pub fn new(program: &str, semester: i64, component_name: &str, amount: f64) -> Self {
        let now = Utc::now();
        FeeComponentRecord {
            program: program.to_string(),
            semester,
            medium_tag: None,
            component_name: component_name.to_string(),
            amount,
            notes: None,
            id: default_uuid(),
            structure_id: 0,
            is_active: true,
            is_frozen: false,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Compute idempotency hash for import-time duplicate detection.
    /// NOTE: this is for DEDUPLICATION of identical import rows, not identity.
    pub fn compute_idempotency_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{}|{}|{}",
            self.program, self.semester, self.component_name, self.amount
        ));
        format!("{:x}", hasher.finalize())
    }

    /// Initialize identity and timestamps on a freshly deserialized record
    pub fn init_record_fields(&mut self) {
        let now = Utc::now();
        if self.id.is_empty() {
            self.id = default_uuid();
        }
        if self.created_at.is_none() {
            self.created_at = Some(now);
        }
        if self.updated_at.is_none() {
            self.updated_at = Some(now);
        }
    }

    /// Bump the modification timestamp
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    /// Canonical slug of this record's component name
    pub fn slug(&self) -> String {
        normalize_to_slug(&self.component_name)
    }
}

// ============================================================================
// PROGRAM / SUBJECT / EXAM SCHEME
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub program_id: i64,
    pub program_name: String,
    pub duration_years: i64,
}

impl Program {
    /// Number of semesters fee heads are seeded for (two per year, minimum two)
    pub fn semester_count(&self) -> i64 {
        (2 * self.duration_years).max(2)
    }
}

/// Subject with the two attributes the mark-limit resolver matches on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub subject_id: i64,
    pub program_id: i64,
    pub semester: i64,
    pub subject_name: String,
    pub subject_code: Option<String>,
    /// Subject-type code (e.g. "MAJOR", "ELECTIVE"); "All" when uncategorized
    pub type_code: String,
    /// Total credits from the subject's credit structure
    pub credits: f64,
}

/// Exam configuration for one (program, semester, academic_year, medium) scope.
///
/// Global mark limits apply to every subject unless `credit_rules_json`
/// carries override rules (see `limits::resolve_limits`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamScheme {
    pub scheme_id: i64,
    pub program_id: i64,
    pub semester: i64,
    pub academic_year: String,
    pub medium_tag: Option<String>,
    pub name: Option<String>,
    pub max_internal_marks: Option<f64>,
    pub max_external_marks: Option<f64>,
    pub max_total_marks: Option<f64>,
    pub min_internal_marks: Option<f64>,
    pub min_external_marks: Option<f64>,
    pub min_total_marks: Option<f64>,
    /// JSON-encoded list of credit-based override rules; None/empty = globals only
    pub credit_rules_json: Option<String>,
    pub is_active: bool,
}

impl ExamScheme {
    /// Create a scheme with no limits set
    pub fn new(program_id: i64, semester: i64, academic_year: &str) -> Self {
        ExamScheme {
            scheme_id: 0,
            program_id,
            semester,
            academic_year: academic_year.to_string(),
            medium_tag: None,
            name: None,
            max_internal_marks: None,
            max_external_marks: None,
            max_total_marks: None,
            min_internal_marks: None,
            min_external_marks: None,
            min_total_marks: None,
            credit_rules_json: None,
            is_active: true,
        }
    }

    /// Create a scheme with global max limits set
    pub fn with_globals(
        program_id: i64,
        semester: i64,
        academic_year: &str,
        max_internal: f64,
        max_external: f64,
        max_total: f64,
    ) -> Self {
        let mut scheme = Self::new(program_id, semester, academic_year);
        scheme.max_internal_marks = Some(max_internal);
        scheme.max_external_marks = Some(max_external);
        scheme.max_total_marks = Some(max_total);
        scheme
    }
}

// ============================================================================
// DATABASE SETUP
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS programs (
            program_id INTEGER PRIMARY KEY AUTOINCREMENT,
            program_name TEXT UNIQUE NOT NULL,
            duration_years INTEGER NOT NULL DEFAULT 3
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS fee_structures (
            structure_id INTEGER PRIMARY KEY AUTOINCREMENT,
            idempotency_hash TEXT UNIQUE NOT NULL,
            record_uuid TEXT UNIQUE,
            program_id_fk INTEGER NOT NULL,
            semester INTEGER NOT NULL,
            medium_tag TEXT,
            component_name TEXT NOT NULL,
            amount REAL NOT NULL DEFAULT 0.0,
            is_active INTEGER NOT NULL DEFAULT 1,
            is_frozen INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            created_at TEXT,
            updated_at TEXT,
            FOREIGN KEY (program_id_fk) REFERENCES programs(program_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects (
            subject_id INTEGER PRIMARY KEY AUTOINCREMENT,
            program_id_fk INTEGER NOT NULL,
            semester INTEGER NOT NULL,
            subject_name TEXT NOT NULL,
            subject_code TEXT,
            type_code TEXT NOT NULL DEFAULT 'All',
            credits REAL NOT NULL DEFAULT 0,
            FOREIGN KEY (program_id_fk) REFERENCES programs(program_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS exam_schemes (
            scheme_id INTEGER PRIMARY KEY AUTOINCREMENT,
            program_id_fk INTEGER NOT NULL,
            semester INTEGER NOT NULL,
            academic_year TEXT NOT NULL,
            medium_tag TEXT,
            name TEXT,
            max_internal_marks REAL,
            max_external_marks REAL,
            max_total_marks REAL,
            min_internal_marks REAL,
            min_external_marks REAL,
            min_total_marks REAL,
            credit_rules_json TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            FOREIGN KEY (program_id_fk) REFERENCES programs(program_id),
            UNIQUE (program_id_fk, semester, medium_tag, academic_year)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_fee_scope
         ON fee_structures(program_id_fk, semester)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subject_scope
         ON subjects(program_id_fk, semester)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// CSV IMPORT
// ============================================================================

pub fn load_fee_csv(csv_path: &Path) -> Result<Vec<FeeComponentRecord>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open fee CSV: {}", csv_path.display()))?;

    let mut records = Vec::new();

    for result in rdr.deserialize() {
        let mut record: FeeComponentRecord =
            result.context("Failed to deserialize fee component row")?;
        record.init_record_fields();
        records.push(record);
    }

    Ok(records)
}

/// Counts returned by `insert_fee_records`
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportStats {
    pub inserted: usize,
    pub duplicates: usize,
}

/// Find or create a program by name. Names are matched as stored (import
/// normalizes whitespace upstream).
pub fn upsert_program(conn: &Connection, program_name: &str, duration_years: i64) -> Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT program_id FROM programs WHERE program_name = ?1",
            params![program_name],
            |row| row.get(0),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;

    if let Some(id) = existing {
        return Ok(id);
    }

    conn.execute(
        "INSERT INTO programs (program_name, duration_years) VALUES (?1, ?2)",
        params![program_name, duration_years],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert fee records, skipping rows whose idempotency hash is already stored.
/// Unknown programs are created with the default three-year duration.
pub fn insert_fee_records(
    conn: &Connection,
    records: &[FeeComponentRecord],
) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    for record in records {
        let program_name = record.program.trim();
        if program_name.is_empty() {
            anyhow::bail!(
                "Fee row for component '{}' has no program name",
                record.component_name
            );
        }
        let program_id = upsert_program(conn, program_name, 3)?;

        let hash = record.compute_idempotency_hash();
        let created_at = record.created_at.map(|dt| dt.to_rfc3339());
        let updated_at = record.updated_at.map(|dt| dt.to_rfc3339());

        let result = conn.execute(
            "INSERT INTO fee_structures (
                idempotency_hash, record_uuid, program_id_fk, semester, medium_tag,
                component_name, amount, is_active, is_frozen, notes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                hash,
                record.id,
                program_id,
                record.semester,
                record.medium_tag,
                record.component_name,
                record.amount,
                record.is_active,
                record.is_frozen,
                record.notes,
                created_at,
                updated_at,
            ],
        );

        match result {
            Ok(_) => stats.inserted += 1,
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                stats.duplicates += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(stats)
}

// ============================================================================
// FEE RECORD QUERIES
// ============================================================================

/// Load all fee records for one (program, semester), ordered by row id.
/// The ascending row-id order is what makes the freeze tie-break
/// ("first encountered wins") equivalent to "lowest record id wins".
pub fn get_fee_records(
    conn: &Connection,
    program_id: i64,
    semester: i64,
) -> Result<Vec<FeeComponentRecord>> {
    let mut stmt = conn.prepare(
        "SELECT f.structure_id, f.record_uuid, p.program_name, f.semester, f.medium_tag,
                f.component_name, f.amount, f.is_active, f.is_frozen, f.notes,
                f.created_at, f.updated_at
         FROM fee_structures f
         JOIN programs p ON p.program_id = f.program_id_fk
         WHERE f.program_id_fk = ?1 AND f.semester = ?2
         ORDER BY f.structure_id ASC",
    )?;

    let records = stmt
        .query_map(params![program_id, semester], |row| {
            let created_at_str: Option<String> = row.get(10)?;
            let updated_at_str: Option<String> = row.get(11)?;
            let uuid: Option<String> = row.get(1)?;

            Ok(FeeComponentRecord {
                structure_id: row.get(0)?,
                id: uuid.unwrap_or_default(),
                program: row.get(2)?,
                semester: row.get(3)?,
                medium_tag: row.get(4)?,
                component_name: row.get(5)?,
                amount: row.get(6)?,
                is_active: row.get(7)?,
                is_frozen: row.get(8)?,
                notes: row.get(9)?,
                created_at: created_at_str
                    .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                    .map(|dt| dt.with_timezone(&Utc)),
                updated_at: updated_at_str
                    .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                    .map(|dt| dt.with_timezone(&Utc)),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

pub fn list_programs(conn: &Connection) -> Result<Vec<Program>> {
    let mut stmt = conn.prepare(
        "SELECT program_id, program_name, duration_years
         FROM programs ORDER BY program_name ASC",
    )?;

    let programs = stmt
        .query_map([], |row| {
            Ok(Program {
                program_id: row.get(0)?,
                program_name: row.get(1)?,
                duration_years: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(programs)
}

/// Distinct semesters that have fee rows for a program
pub fn distinct_semesters(conn: &Connection, program_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT semester FROM fee_structures
         WHERE program_id_fk = ?1 ORDER BY semester ASC",
    )?;

    let semesters = stmt
        .query_map(params![program_id], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(semesters)
}

pub fn verify_fee_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM fee_structures", [], |row| row.get(0))?;
    Ok(count)
}

// ============================================================================
// FREEZE PERSISTENCE
// ============================================================================

/// Freeze one (program, semester) scope and persist the result atomically.
///
/// The IMMEDIATE transaction takes the write lock before the scope is read,
/// serializing concurrent freeze calls against the same database: two callers
/// cannot interleave the read-pick-winner-deactivate sequence and leave two
/// active rows for one slug. Either the whole scope commits or none of it does.
pub fn freeze_and_persist(
    conn: &mut Connection,
    program_id: i64,
    semester: i64,
    table: &CanonicalSlugTable,
) -> Result<FreezeOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut records = get_fee_records(&tx, program_id, semester)?;
    let outcome = freeze::freeze_program_semester(&mut records, table);

    for record in &records {
        let updated_at = record.updated_at.map(|dt| dt.to_rfc3339());
        tx.execute(
            "UPDATE fee_structures
             SET component_name = ?1, is_active = ?2, is_frozen = ?3, updated_at = ?4
             WHERE structure_id = ?5",
            params![
                record.component_name,
                record.is_active,
                record.is_frozen,
                updated_at,
                record.structure_id,
            ],
        )
        .with_context(|| {
            format!(
                "Failed to persist fee record {} ('{}')",
                record.structure_id, record.component_name
            )
        })?;
    }

    tx.commit().context("Failed to commit freeze transaction")?;

    Ok(outcome)
}

// ============================================================================
// FEE HEAD SEEDING
// ============================================================================

/// Ensure every canonical head exists (amount 0, active) for every program
/// and semester. Existing rows are matched by slug, so a misspelled variant
/// already present suppresses the seed row for its head.
pub fn seed_fee_heads(conn: &Connection, table: &CanonicalSlugTable) -> Result<usize> {
    let programs = list_programs(conn)?;
    let mut created = 0;

    for program in &programs {
        for semester in 1..=program.semester_count() {
            let existing = get_fee_records(conn, program.program_id, semester)?;
            let existing_slugs: std::collections::HashSet<String> =
                existing.iter().map(|r| r.slug()).collect();

            for slug in table.slugs() {
                if existing_slugs.contains(slug) {
                    continue;
                }
                let display = table.display_name(slug).unwrap_or(slug);
                let record =
                    FeeComponentRecord::new(&program.program_name, semester, display, 0.0);
                let stats = insert_fee_records(conn, std::slice::from_ref(&record))?;
                created += stats.inserted;
            }
        }
    }

    Ok(created)
}

// ============================================================================
// SUBJECT / EXAM SCHEME STORAGE
// ============================================================================

pub fn insert_subject(conn: &Connection, subject: &Subject) -> Result<i64> {
    conn.execute(
        "INSERT INTO subjects (
            program_id_fk, semester, subject_name, subject_code, type_code, credits
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            subject.program_id,
            subject.semester,
            subject.subject_name,
            subject.subject_code,
            subject.type_code,
            subject.credits,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_subject(conn: &Connection, subject_id: i64) -> Result<Subject> {
    conn.query_row(
        "SELECT subject_id, program_id_fk, semester, subject_name, subject_code,
                type_code, credits
         FROM subjects WHERE subject_id = ?1",
        params![subject_id],
        |row| {
            Ok(Subject {
                subject_id: row.get(0)?,
                program_id: row.get(1)?,
                semester: row.get(2)?,
                subject_name: row.get(3)?,
                subject_code: row.get(4)?,
                type_code: row.get(5)?,
                credits: row.get(6)?,
            })
        },
    )
    .with_context(|| format!("Subject {} not found", subject_id))
}

pub fn insert_exam_scheme(conn: &Connection, scheme: &ExamScheme) -> Result<i64> {
    conn.execute(
        "INSERT INTO exam_schemes (
            program_id_fk, semester, academic_year, medium_tag, name,
            max_internal_marks, max_external_marks, max_total_marks,
            min_internal_marks, min_external_marks, min_total_marks,
            credit_rules_json, is_active
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            scheme.program_id,
            scheme.semester,
            scheme.academic_year,
            scheme.medium_tag,
            scheme.name,
            scheme.max_internal_marks,
            scheme.max_external_marks,
            scheme.max_total_marks,
            scheme.min_internal_marks,
            scheme.min_external_marks,
            scheme.min_total_marks,
            scheme.credit_rules_json,
            scheme.is_active,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_exam_scheme(conn: &Connection, scheme_id: i64) -> Result<ExamScheme> {
    conn.query_row(
        "SELECT scheme_id, program_id_fk, semester, academic_year, medium_tag, name,
                max_internal_marks, max_external_marks, max_total_marks,
                min_internal_marks, min_external_marks, min_total_marks,
                credit_rules_json, is_active
         FROM exam_schemes WHERE scheme_id = ?1",
        params![scheme_id],
        |row| {
            Ok(ExamScheme {
                scheme_id: row.get(0)?,
                program_id: row.get(1)?,
                semester: row.get(2)?,
                academic_year: row.get(3)?,
                medium_tag: row.get(4)?,
                name: row.get(5)?,
                max_internal_marks: row.get(6)?,
                max_external_marks: row.get(7)?,
                max_total_marks: row.get(8)?,
                min_internal_marks: row.get(9)?,
                min_external_marks: row.get(10)?,
                min_total_marks: row.get(11)?,
                credit_rules_json: row.get(12)?,
                is_active: row.get(13)?,
            })
        },
    )
    .with_context(|| format!("Exam scheme {} not found", scheme_id))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_skips_duplicate_rows() {
        let conn = open_test_db();

        let records = vec![
            FeeComponentRecord::new("BCA", 1, "Tuition Fee", 11500.0),
            FeeComponentRecord::new("BCA", 1, "Library Fee", 200.0),
        ];

        let stats = insert_fee_records(&conn, &records).unwrap();
        assert_eq!(stats.inserted, 2);
        assert_eq!(stats.duplicates, 0);

        // Re-importing the same rows is a no-op
        let mut again = records.clone();
        for r in &mut again {
            r.id = uuid::Uuid::new_v4().to_string();
        }
        let stats = insert_fee_records(&conn, &again).unwrap();
        assert_eq!(stats.inserted, 0);
        assert_eq!(stats.duplicates, 2);
        assert_eq!(verify_fee_count(&conn).unwrap(), 2);
    }

    #[test]
    fn test_freeze_and_persist_round_trip() {
        let mut conn = open_test_db();

        let records = vec![
            FeeComponentRecord::new("BCA", 1, "Tuition Fee", 11500.0),
            FeeComponentRecord::new("BCA", 1, "TUITION FEE ", 11000.0),
            FeeComponentRecord::new("BCA", 1, "Library Fee", 200.0),
        ];
        insert_fee_records(&conn, &records).unwrap();
        let program_id = upsert_program(&conn, "BCA", 3).unwrap();

        let table = CanonicalSlugTable::with_defaults();
        let outcome = freeze_and_persist(&mut conn, program_id, 1, &table).unwrap();
        assert_eq!(outcome.frozen, 2);
        assert_eq!(outcome.deactivated, 1);

        let stored = get_fee_records(&conn, program_id, 1).unwrap();
        assert_eq!(stored.len(), 3);

        let active: Vec<_> = stored.iter().filter(|r| r.is_active).collect();
        assert_eq!(active.len(), 2);
        assert!(active.iter().all(|r| r.is_frozen));

        let tuition = stored
            .iter()
            .find(|r| r.is_active && r.slug() == "tuition-fee")
            .unwrap();
        assert_eq!(tuition.component_name, "Tuition Fee");
        assert_eq!(tuition.amount, 11500.0);
    }

    #[test]
    fn test_seed_fee_heads_idempotent() {
        let conn = open_test_db();
        upsert_program(&conn, "BCA", 3).unwrap();

        let table = CanonicalSlugTable::with_defaults();
        let created = seed_fee_heads(&conn, &table).unwrap();
        // 14 heads x 6 semesters
        assert_eq!(created, 14 * 6);

        let created_again = seed_fee_heads(&conn, &table).unwrap();
        assert_eq!(created_again, 0);
    }

    #[test]
    fn test_seed_matches_existing_rows_by_slug() {
        let conn = open_test_db();
        upsert_program(&conn, "BA", 1).unwrap();

        // Misspelled variant already on file suppresses the seeded head
        let existing = FeeComponentRecord::new("BA", 1, "Tution Fee", 9000.0);
        insert_fee_records(&conn, std::slice::from_ref(&existing)).unwrap();

        let table = CanonicalSlugTable::with_defaults();
        let created = seed_fee_heads(&conn, &table).unwrap();
        // 14 heads x 2 semesters, minus the tuition head in semester 1
        assert_eq!(created, 14 * 2 - 1);
    }

    #[test]
    fn test_exam_scheme_round_trip() {
        let conn = open_test_db();
        let program_id = upsert_program(&conn, "BCA", 3).unwrap();

        let mut scheme = ExamScheme::with_globals(program_id, 1, "2024-25", 30.0, 70.0, 100.0);
        scheme.credit_rules_json =
            Some(r#"[{"credit": 4, "type": "All", "max_int": 25, "max_ext": 75, "max_tot": 100}]"#.to_string());

        let scheme_id = insert_exam_scheme(&conn, &scheme).unwrap();
        let loaded = get_exam_scheme(&conn, scheme_id).unwrap();

        assert_eq!(loaded.max_internal_marks, Some(30.0));
        assert_eq!(loaded.max_total_marks, Some(100.0));
        assert!(loaded.credit_rules_json.is_some());
        assert!(loaded.is_active);
    }
}
