use anyhow::{bail, Result};
use rusqlite::Connection;
use std::env;
use std::path::Path;

use campus_records::{
    freeze_all, get_exam_scheme, get_fee_records, get_subject, insert_fee_records, list_programs,
    load_fee_csv, resolve_limits, seed_fee_heads, setup_database, verify_fee_count,
    CanonicalSlugTable, DataQualityEngine, LimitSource,
};

const DEFAULT_DB: &str = "campus.db";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("import") => run_import(&args[2..]),
        Some("seed") => run_seed(&args[2..]),
        Some("freeze") => run_freeze(&args[2..]),
        Some("limits") => run_limits(&args[2..]),
        Some("check") => run_check(&args[2..]),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("campus-records {}", campus_records::VERSION);
    println!();
    println!("Usage:");
    println!("  campus-records import <fees.csv> [db]   Import fee structure rows");
    println!("  campus-records seed [db]                Seed canonical fee heads for all programs");
    println!("  campus-records freeze [db]              Freeze canonical heads, deactivate duplicates");
    println!("  campus-records limits <scheme_id> <subject_id> [db]");
    println!("                                          Resolve effective mark limits");
    println!("  campus-records check [db]               Run data quality checks");
}

fn open_db(path: &str) -> Result<Connection> {
    let conn = Connection::open(Path::new(path))?;
    setup_database(&conn)?;
    Ok(conn)
}

fn run_import(args: &[String]) -> Result<()> {
    let Some(csv_path) = args.first() else {
        bail!("Usage: campus-records import <fees.csv> [db]");
    };
    let db_path = args.get(1).map(String::as_str).unwrap_or(DEFAULT_DB);

    println!("🗄️  Fee Structure Import - CSV → SQLite");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n📂 Loading CSV...");
    let records = load_fee_csv(Path::new(csv_path))?;
    println!("✓ Loaded {} fee rows from {}", records.len(), csv_path);

    println!("\n🔧 Setting up database...");
    let conn = open_db(db_path)?;
    println!("✓ Database initialized with WAL mode");

    println!("\n💾 Inserting fee records...");
    let stats = insert_fee_records(&conn, &records)?;
    println!("✓ Inserted: {} fee records", stats.inserted);
    println!("✓ Skipped duplicates: {}", stats.duplicates);

    let count = verify_fee_count(&conn)?;
    println!("\n✓ Database contains {} fee records", count);

    Ok(())
}

fn run_seed(args: &[String]) -> Result<()> {
    let db_path = args.first().map(String::as_str).unwrap_or(DEFAULT_DB);

    println!("🌱 Seeding canonical fee heads");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let conn = open_db(db_path)?;
    let table = CanonicalSlugTable::with_defaults();
    let created = seed_fee_heads(&conn, &table)?;

    println!("✓ Seeded {} fee head rows across programs/semesters", created);

    Ok(())
}

fn run_freeze(args: &[String]) -> Result<()> {
    let db_path = args.first().map(String::as_str).unwrap_or(DEFAULT_DB);

    println!("❄️  Freezing canonical fee heads");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut conn = open_db(db_path)?;
    let table = CanonicalSlugTable::with_defaults();
    let report = freeze_all(&mut conn, &table)?;

    for combo in &report.combos {
        println!(
            "✓ {} semester {}: {}",
            combo.program_name,
            combo.semester,
            combo.outcome.summary()
        );
    }

    for failure in &report.failures {
        eprintln!(
            "❌ {} semester {}: {}",
            failure.program_name, failure.semester, failure.error
        );
    }

    println!("\n{}", report.summary());

    if report.has_failures() {
        bail!(
            "{} program/semester scope(s) failed to freeze",
            report.failures.len()
        );
    }

    Ok(())
}

fn run_limits(args: &[String]) -> Result<()> {
    let (Some(scheme_arg), Some(subject_arg)) = (args.first(), args.get(1)) else {
        bail!("Usage: campus-records limits <scheme_id> <subject_id> [db]");
    };
    let scheme_id: i64 = scheme_arg.parse()?;
    let subject_id: i64 = subject_arg.parse()?;
    let db_path = args.get(2).map(String::as_str).unwrap_or(DEFAULT_DB);

    let conn = open_db(db_path)?;
    let scheme = get_exam_scheme(&conn, scheme_id)?;
    let subject = get_subject(&conn, subject_id)?;

    println!(
        "🎓 Limits for '{}' ({} credits, type {})",
        subject.subject_name, subject.credits, subject.type_code
    );

    let limits = resolve_limits(&scheme, &subject);
    println!("✓ {}", limits.summary());

    if limits.source == LimitSource::MalformedRules {
        eprintln!("⚠️  Scheme {} has malformed credit rules; globals were used", scheme_id);
    }

    Ok(())
}

fn run_check(args: &[String]) -> Result<()> {
    let db_path = args.first().map(String::as_str).unwrap_or(DEFAULT_DB);

    println!("✅ Data quality check");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let conn = open_db(db_path)?;
    let engine = DataQualityEngine::with_defaults();

    let mut all_records = Vec::new();
    for program in list_programs(&conn)? {
        for semester in campus_records::distinct_semesters(&conn, program.program_id)? {
            all_records.extend(get_fee_records(&conn, program.program_id, semester)?);
        }
    }

    let reports = engine.validate_batch(&all_records);
    for (record, report) in all_records.iter().zip(&reports) {
        if report.has_critical_issues() {
            println!(
                "❌ {} sem {} '{}': {}",
                record.program, record.semester, record.component_name,
                report.summary()
            );
        }
    }

    let summary = engine.batch_summary(&reports);
    println!("\n{}", summary.summary());

    if summary.critical_issues_count > 0 {
        bail!("{} record(s) have critical issues", summary.critical_issues_count);
    }

    Ok(())
}
