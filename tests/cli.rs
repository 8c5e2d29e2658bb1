use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn hbudget(dir: &TempDir, today: &str) -> Command {
    let mut cmd = Command::cargo_bin("hbudget").unwrap();
    cmd.env("HBUDGET_DATA_DIR", dir.path())
        .env("HBUDGET_TODAY", today)
        .env_remove("HBUDGET_HOUSEHOLD")
        .env_remove("RUST_LOG");
    cmd
}

fn create_budget(dir: &TempDir) {
    hbudget(dir, "2025-01-15")
        .args([
            "budget",
            "create",
            "Home",
            "-c",
            "Groceries=400",
            "-c",
            "Dining=150@90",
            "-c",
            "Salary=0",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created budget: Home"));
}

#[test]
fn test_no_command_prints_usage_hint() {
    let dir = TempDir::new().unwrap();
    hbudget(&dir, "2025-01-15")
        .assert()
        .success()
        .stdout(predicate::str::contains("hbudget --help"));
}

#[test]
fn test_month_show_snapshots_active_budget() {
    let dir = TempDir::new().unwrap();
    create_budget(&dir);

    hbudget(&dir, "2025-01-15")
        .args(["month", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Monthly budget 2025-01"))
        .stdout(predicate::str::contains("$400.00"));
}

#[test]
fn test_month_show_without_budget_fails() {
    let dir = TempDir::new().unwrap();
    hbudget(&dir, "2025-01-15")
        .args(["month", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Active budget not found"));
}

#[test]
fn test_scheduled_adjustment_lands_next_month() {
    let dir = TempDir::new().unwrap();
    create_budget(&dir);

    hbudget(&dir, "2025-01-15")
        .args(["adjust", "schedule", "Groceries", "500", "--reason", "more guests"])
        .assert()
        .success()
        .stdout(predicate::str::contains("effective 2025-02"));

    hbudget(&dir, "2025-01-20")
        .args(["adjust", "summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Adjustments for 2025-02"))
        .stdout(predicate::str::contains("+$100.00"));

    // Still January: nothing is due yet
    hbudget(&dir, "2025-01-31")
        .args(["adjust", "apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No adjustments due."));

    hbudget(&dir, "2025-02-01")
        .args(["month", "show"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Applied scheduled adjustment"))
        .stdout(predicate::str::contains("Monthly budget 2025-02"))
        .stdout(predicate::str::contains("$500.00"));

    hbudget(&dir, "2025-02-02")
        .args(["adjust", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("applied"));
}

#[test]
fn test_schedule_for_past_month_is_rejected() {
    let dir = TempDir::new().unwrap();
    create_budget(&dir);

    hbudget(&dir, "2025-03-10")
        .args(["adjust", "schedule", "Groceries", "500", "--month", "2025-03"])
        .assert()
        .failure();
}

#[test]
fn test_category_merge_and_undo() {
    let dir = TempDir::new().unwrap();
    create_budget(&dir);

    for amount in ["20", "35"] {
        hbudget(&dir, "2025-01-15")
            .args(["txn", "add", "Dining", amount])
            .assert()
            .success();
    }

    hbudget(&dir, "2025-01-16")
        .args(["category", "merge", "Dining", "Groceries", "--reason", "simplify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Merged Dining into Groceries (2 transactions moved)"));

    hbudget(&dir, "2025-01-16")
        .args(["txn", "list", "--category", "Groceries"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$35.00"));

    // Merging into a deleted category fails
    hbudget(&dir, "2025-01-16")
        .args(["category", "merge", "Groceries", "Dining"])
        .assert()
        .failure();

    let listing = hbudget(&dir, "2025-01-16")
        .args(["category", "merges"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let listing = String::from_utf8(listing).unwrap();
    let merge_id = listing
        .split_whitespace()
        .find(|word| word.starts_with("mrg-"))
        .expect("merge id in listing")
        .to_string();

    hbudget(&dir, "2025-01-17")
        .args(["category", "undo-merge", &merge_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 transactions back in Dining"));

    hbudget(&dir, "2025-01-17")
        .args(["txn", "list", "--category", "Dining"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$20.00"));
}

#[test]
fn test_rename_updates_transactions() {
    let dir = TempDir::new().unwrap();
    create_budget(&dir);

    hbudget(&dir, "2025-01-15")
        .args(["txn", "add", "groceries", "42.50", "-m", "market"])
        .assert()
        .success();

    hbudget(&dir, "2025-01-15")
        .args(["category", "rename", "Groceries", "Food"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Renamed Groceries -> Food"));

    hbudget(&dir, "2025-01-15")
        .args(["txn", "list", "--category", "Food"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$42.50"));

    hbudget(&dir, "2025-01-15")
        .args(["category", "rename", "Food", "dining"])
        .assert()
        .failure();
}

#[test]
fn test_performance_report_and_alerts() {
    let dir = TempDir::new().unwrap();
    create_budget(&dir);

    hbudget(&dir, "2025-01-10")
        .args(["txn", "add", "Groceries", "460"])
        .assert()
        .success();
    hbudget(&dir, "2025-01-10")
        .args(["txn", "add", "Salary", "3000", "--income"])
        .assert()
        .success();

    hbudget(&dir, "2025-01-20")
        .args(["report", "performance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Performance for 2025-01"))
        .stdout(predicate::str::contains("Groceries: over budget by $60.00"));

    let output = hbudget(&dir, "2025-01-20")
        .args(["report", "performance", "2025-01", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let alert_id = report["alerts"][0]["id"].as_str().unwrap().to_string();

    hbudget(&dir, "2025-01-20")
        .args(["report", "mark-viewed", &alert_id, "--month", "2025-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Marked viewed"));

    hbudget(&dir, "2025-01-21")
        .args(["report", "mark-viewed", &alert_id, "--month", "2025-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Already viewed"));

    hbudget(&dir, "2025-01-21")
        .args(["report", "performance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(viewed)"));
}

#[test]
fn test_compare_reports_month_drift() {
    let dir = TempDir::new().unwrap();
    create_budget(&dir);

    hbudget(&dir, "2025-01-15")
        .args(["month", "set-limit", "Dining", "200"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set Dining to $200.00 for 2025-01"));

    hbudget(&dir, "2025-01-15")
        .args(["report", "compare"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 increased"));

    hbudget(&dir, "2025-01-15")
        .args(["report", "compare", "2024-12"])
        .assert()
        .failure();
}

#[test]
fn test_locked_month_rejects_limit_changes() {
    let dir = TempDir::new().unwrap();
    create_budget(&dir);

    hbudget(&dir, "2025-01-15")
        .args(["month", "lock", "2025-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Locked 2025-01"));

    hbudget(&dir, "2025-01-15")
        .args(["month", "set-limit", "Dining", "200"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("locked"));
}

#[test]
fn test_audit_records_changes() {
    let dir = TempDir::new().unwrap();
    create_budget(&dir);

    hbudget(&dir, "2025-01-15")
        .args(["audit", "--limit", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CREATE"));
}
