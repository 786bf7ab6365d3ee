use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command with HOME pointed at a temp dir so settings and default data
/// directories never touch the real home.
fn bricbooks(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bricbooks").unwrap();
    cmd.env("HOME", home.path());
    cmd.env_remove("XDG_CONFIG_HOME");
    cmd.env_remove("XDG_DOCUMENTS_DIR");
    cmd
}

fn book_arg(home: &TempDir) -> String {
    home.path().join("books.sqlite3").to_string_lossy().to_string()
}

fn add_account(home: &TempDir, book: &str, name: &str, account_type: &str) {
    bricbooks(home)
        .args(["--file", book, "accounts", "add", name, "--type", account_type])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added account"));
}

#[test]
fn init_creates_book_file() {
    let home = TempDir::new().unwrap();
    let book = book_arg(&home);
    bricbooks(&home)
        .args(["--file", &book, "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Book file ready"));
    assert!(Path::new(&book).exists());
}

#[test]
fn accounts_add_and_list() {
    let home = TempDir::new().unwrap();
    let book = book_arg(&home);
    add_account(&home, &book, "Checking", "asset");
    bricbooks(&home)
        .args([
            "--file", &book, "accounts", "add", "Gas Stations", "--type", "expense", "--number",
            "410",
        ])
        .assert()
        .success();

    bricbooks(&home)
        .args(["--file", &book, "accounts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Checking"))
        .stdout(predicate::str::contains("Gas Stations"))
        .stdout(predicate::str::contains("410"));
}

#[test]
fn accounts_add_rejects_bad_type() {
    let home = TempDir::new().unwrap();
    let book = book_arg(&home);
    bricbooks(&home)
        .args(["--file", &book, "accounts", "add", "Checking", "--type", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid account type"));
}

#[test]
fn txn_add_and_list_with_balance() {
    let home = TempDir::new().unwrap();
    let book = book_arg(&home);
    add_account(&home, &book, "Checking", "asset");
    add_account(&home, &book, "Food", "expense");

    bricbooks(&home)
        .args([
            "--file",
            &book,
            "txn",
            "add",
            "2018-01-02",
            "Checking:-12.50",
            "Food:12.50",
            "--description",
            "lunch",
            "--payee",
            "Joe's Burgers",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added transaction"));

    bricbooks(&home)
        .args(["--file", &book, "txn", "list", "Checking"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lunch"))
        .stdout(predicate::str::contains("Joe's Burgers"))
        .stdout(predicate::str::contains("12.50"))
        .stdout(predicate::str::contains("Current balance: -12.50"));
}

#[test]
fn txn_add_rejects_unbalanced_splits() {
    let home = TempDir::new().unwrap();
    let book = book_arg(&home);
    add_account(&home, &book, "Checking", "asset");
    add_account(&home, &book, "Food", "expense");

    bricbooks(&home)
        .args([
            "--file",
            &book,
            "txn",
            "add",
            "2018-01-02",
            "Checking:-10",
            "Food:11",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("splits don't balance"));
}

#[test]
fn txn_delete_removes_from_ledger() {
    let home = TempDir::new().unwrap();
    let book = book_arg(&home);
    add_account(&home, &book, "Checking", "asset");
    add_account(&home, &book, "Food", "expense");
    bricbooks(&home)
        .args([
            "--file", &book, "txn", "add", "2018-01-02", "Checking:-10", "Food:10",
            "--description", "gone soon",
        ])
        .assert()
        .success();

    bricbooks(&home)
        .args(["--file", &book, "txn", "delete", "1"])
        .assert()
        .success();

    bricbooks(&home)
        .args(["--file", &book, "txn", "list", "Checking"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gone soon").not());
}

#[test]
fn scheduled_add_enter_advances_due_date() {
    let home = TempDir::new().unwrap();
    let book = book_arg(&home);
    add_account(&home, &book, "Checking", "asset");
    add_account(&home, &book, "Housing", "expense");

    bricbooks(&home)
        .args([
            "--file",
            &book,
            "scheduled",
            "add",
            "rent",
            "--frequency",
            "monthly",
            "--next-due-date",
            "2018-06-01",
            "Checking:-100",
            "Housing:100",
        ])
        .assert()
        .success();

    bricbooks(&home)
        .args(["--file", &book, "scheduled", "enter", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2018-06-01"));

    bricbooks(&home)
        .args(["--file", &book, "scheduled", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2018-07-01"));

    bricbooks(&home)
        .args(["--file", &book, "txn", "list", "Checking"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rent"));
}

#[test]
fn budget_add_and_report() {
    let home = TempDir::new().unwrap();
    let book = book_arg(&home);
    add_account(&home, &book, "Checking", "asset");
    add_account(&home, &book, "Food", "expense");
    bricbooks(&home)
        .args([
            "--file", &book, "txn", "add", "2018-03-01", "Checking:-35", "Food:35",
        ])
        .assert()
        .success();

    bricbooks(&home)
        .args(["--file", &book, "budget", "add", "--year", "2018", "Food:500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2018-01-01 - 2018-12-31"));

    bricbooks(&home)
        .args(["--file", &book, "budget", "report", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Food"))
        .stdout(predicate::str::contains("500.00"))
        .stdout(predicate::str::contains("465.00"))
        .stdout(predicate::str::contains("93%"));
}

#[test]
fn budget_add_rejects_asset_account_entries() {
    let home = TempDir::new().unwrap();
    let book = book_arg(&home);
    add_account(&home, &book, "Checking", "asset");

    bricbooks(&home)
        .args([
            "--file", &book, "budget", "add", "--year", "2018", "Checking:100",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "budgets only cover expense and income accounts",
        ));
}

#[test]
fn export_writes_tsv_files() {
    let home = TempDir::new().unwrap();
    let book = book_arg(&home);
    add_account(&home, &book, "Checking", "asset");
    add_account(&home, &book, "Food", "expense");
    bricbooks(&home)
        .args([
            "--file", &book, "txn", "add", "2018-01-02", "Checking:-10", "Food:10",
        ])
        .assert()
        .success();

    let out = TempDir::new().unwrap();
    bricbooks(&home)
        .args(["--file", &book, "export", "--dir"])
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported to"));

    let entries: Vec<_> = std::fs::read_dir(out.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
    let export_dir = entries[0].as_ref().unwrap().path();
    assert!(export_dir.join("accounts.tsv").exists());
    assert!(export_dir.join("acc_checking.tsv").exists());
}

#[test]
fn demo_then_status_shows_counts() {
    let home = TempDir::new().unwrap();
    let book = book_arg(&home);
    bricbooks(&home)
        .args(["--file", &book, "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Demo data loaded"));

    bricbooks(&home)
        .args(["--file", &book, "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Accounts:        15"))
        .stdout(predicate::str::contains("Transactions:    24"))
        .stdout(predicate::str::contains("Scheduled:       2"))
        .stdout(predicate::str::contains("Budgets:         1"));

    // the demo ledger balances: 1000 - 410 spent in Jan + 100 transfer
    bricbooks(&home)
        .args(["--file", &book, "txn", "list", "Checking"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Joe's Burgers"));
}

#[test]
fn txn_list_filters_by_query() {
    let home = TempDir::new().unwrap();
    let book = book_arg(&home);
    add_account(&home, &book, "Checking", "asset");
    add_account(&home, &book, "Food", "expense");
    bricbooks(&home)
        .args([
            "--file", &book, "txn", "add", "2018-01-02", "Checking:-10", "Food:10",
            "--description", "groceries",
        ])
        .assert()
        .success();
    bricbooks(&home)
        .args([
            "--file", &book, "txn", "add", "2018-01-03", "Checking:-20", "Food:20",
            "--description", "takeout",
        ])
        .assert()
        .success();

    bricbooks(&home)
        .args(["--file", &book, "txn", "list", "Checking", "--query", "GROCER"])
        .assert()
        .success()
        .stdout(predicate::str::contains("groceries"))
        .stdout(predicate::str::contains("takeout").not());
}

#[test]
fn txn_status_cycles() {
    let home = TempDir::new().unwrap();
    let book = book_arg(&home);
    add_account(&home, &book, "Checking", "asset");
    add_account(&home, &book, "Food", "expense");
    bricbooks(&home)
        .args([
            "--file", &book, "txn", "add", "2018-01-02", "Checking:-10", "Food:10",
        ])
        .assert()
        .success();

    bricbooks(&home)
        .args(["--file", &book, "txn", "status", "1", "Checking"])
        .assert()
        .success()
        .stdout(predicate::str::contains("status: C"));
    bricbooks(&home)
        .args(["--file", &book, "txn", "status", "1", "Checking"])
        .assert()
        .success()
        .stdout(predicate::str::contains("status: R"));
    bricbooks(&home)
        .args(["--file", &book, "txn", "status", "1", "Checking"])
        .assert()
        .success()
        .stdout(predicate::str::contains("status: (none)"));
}

#[test]
fn security_account_tracks_shares() {
    let home = TempDir::new().unwrap();
    let book = book_arg(&home);
    add_account(&home, &book, "Checking", "asset");
    bricbooks(&home)
        .args([
            "--file", &book, "accounts", "add", "Index Fund", "--type", "security", "--ticker",
            "VTSAX",
        ])
        .assert()
        .success();

    bricbooks(&home)
        .args([
            "--file",
            &book,
            "txn",
            "add",
            "2018-01-02",
            "Checking:-100",
            "Index Fund:100:share-buy:4.5",
        ])
        .assert()
        .success();

    // the share ledger shows quantities, not dollars
    bricbooks(&home)
        .args(["--file", &book, "txn", "list", "Index Fund"])
        .assert()
        .success()
        .stdout(predicate::str::contains("share-buy"))
        .stdout(predicate::str::contains("4.50"));
}

#[test]
fn completions_generate() {
    let home = TempDir::new().unwrap();
    bricbooks(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bricbooks"));
}
