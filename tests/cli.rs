mod common;

use std::fs;

use assert_cmd::Command;
use common::{ORDERS_FIXTURE, TestWorkspace, field, fixture_path, read_csv};
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn etl() -> Command {
    Command::cargo_bin("sales-fact-etl").expect("binary exists")
}

#[test]
fn run_writes_fact_file_and_logs_counts() {
    let workspace = TestWorkspace::new();
    let output = workspace.path().join("data").join("processed").join("fact.csv");
    etl()
        .env("RUST_LOG", "info")
        .args([
            "run",
            "-i",
            fixture_path(ORDERS_FIXTURE).to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(contains("Removed 1 duplicate row(s)").and(contains("7 valid row(s) remain")));

    let (headers, rows) = read_csv(&output);
    assert_eq!(rows.len(), 7);
    assert_eq!(field(&headers, &rows[0], "discount_band"), "Low (≤20%)");
}

#[test]
fn run_reads_destination_from_config_file() {
    let workspace = TestWorkspace::new();
    let output = workspace.path().join("from_config.tsv");
    let config = workspace.write(
        "etl.yaml",
        &format!(
            "input: {}\noutput:\n  path: {}\n",
            fixture_path(ORDERS_FIXTURE).display(),
            output.display()
        ),
    );
    etl()
        .args(["run", "--config", config.to_str().unwrap()])
        .assert()
        .success();

    let contents = fs::read_to_string(&output).expect("read tsv output");
    let header = contents.lines().next().expect("header line");
    assert!(header.contains("order_date\tship_date"));
    assert!(header.ends_with("shipping_days\tprofit_margin\tdiscount_band"));
}

#[test]
fn run_into_sqlite_database() {
    let workspace = TestWorkspace::new();
    let db = workspace.path().join("warehouse.db");
    etl()
        .args([
            "run",
            "-i",
            fixture_path(ORDERS_FIXTURE).to_str().unwrap(),
            "--database",
            &format!("sqlite://{}", db.display()),
            "--table",
            "orders_fact",
        ])
        .assert()
        .success();

    let conn = rusqlite::Connection::open(&db).expect("open db");
    let rows: i64 = conn
        .query_row("SELECT count(*) FROM orders_fact", [], |row| row.get(0))
        .expect("count rows");
    assert_eq!(rows, 7);
}

#[test]
fn bad_year_exits_non_zero_with_message() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_orders(
        "orders.csv",
        &["04/01/2021,09/01/2021,MMXXI,500,0.2,50,10,3"],
    );
    etl()
        .args([
            "run",
            "-i",
            input.to_str().unwrap(),
            "-o",
            workspace.path().join("fact.csv").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("MMXXI").and(contains("year")));
}

#[test]
fn missing_destination_is_rejected() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_orders("orders.csv", &["04/01/2021,09/01/2021,2021,500,0.2,50,10,3"]);
    etl()
        .args(["run", "-i", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("no destination configured"));
}

#[test]
fn preview_prints_derived_columns_without_writing() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_orders(
        "orders.csv",
        &[
            "04/01/2021,09/01/2021,2021,500,0.2,50,10,3",
            "05/01/2021,06/01/2021,2021,0,0,-5,1,1",
        ],
    );
    etl()
        .args(["preview", "-i", input.to_str().unwrap(), "--rows", "1"])
        .assert()
        .success()
        .stdout(
            contains("discount_band")
                .and(contains("Low (≤20%)"))
                .and(contains("No Discount").not()),
        );
    let entries = fs::read_dir(workspace.path()).expect("list workspace").count();
    assert_eq!(entries, 1);
}
