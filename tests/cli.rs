mod common;

use assert_cmd::Command;
use predicates::prelude::*;

use common::{TestWorkspace, column, parse_csv};

fn item_lookup() -> Command {
    Command::cargo_bin("item-lookup").expect("binary exists")
}

#[test]
fn build_then_match_enriches_upload() {
    let workspace = TestWorkspace::new();
    let config = workspace.with_masters();

    item_lookup()
        .args(["--config", config.to_str().unwrap(), "build"])
        .assert()
        .success();
    assert!(workspace.path().join("library.csv").is_file());
    assert!(workspace.path().join("library.csv.manifest.json").is_file());

    let upload = workspace.write("upload.csv", "Item no.,Qty\n65001,4\n70001,1\n99999,2\n");
    let output = item_lookup()
        .args([
            "--config",
            config.to_str().unwrap(),
            "match",
            "-i",
            upload.to_str().unwrap(),
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let (headers, rows) = parse_csv(&String::from_utf8(output).expect("utf8"));
    assert_eq!(
        headers,
        vec![
            "Item no.",
            "Qty",
            "Product",
            "Color",
            "Item No. EUR",
            "Item No. APMEA",
            "Item No. GBP",
            "Item No. US",
            "Item No. Consistency",
        ]
    );
    assert_eq!(rows.len(), 3);

    let product = column(&headers, "Product");
    let us = column(&headers, "Item No. US");
    let flag = column(&headers, "Item No. Consistency");
    assert_eq!(rows[0][product], "Table");
    assert_eq!(rows[0][us], "65002");
    assert_eq!(rows[0][flag], "Mismatch");
    assert_eq!(rows[1][product], "Chair");
    assert_eq!(rows[1][flag], "Match");
    assert_eq!(rows[2][0], "99999");
    assert_eq!(rows[2][product], "");
    assert_eq!(rows[2][flag], "");
}

#[test]
fn match_builds_missing_library_and_writes_output_file() {
    let workspace = TestWorkspace::new();
    let config = workspace.with_masters();
    let upload = workspace.write("upload.csv", "Article No.\n70001\n");
    let output = workspace.path().join("enriched.csv");

    item_lookup()
        .args([
            "--config",
            config.to_str().unwrap(),
            "match",
            "-i",
            upload.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert!(workspace.path().join("library.csv").is_file());
    let (headers, rows) = parse_csv(&workspace.read("enriched.csv"));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][column(&headers, "Color")], "Black");
}

#[test]
fn match_with_us_anchor_joins_on_pattern_numbers() {
    let workspace = TestWorkspace::new();
    let config = workspace.with_masters();
    let upload = workspace.write("upload.csv", "Item variant number\n80001\n");

    let output = item_lookup()
        .args([
            "--config",
            config.to_str().unwrap(),
            "match",
            "--anchor",
            "us",
            "-i",
            upload.to_str().unwrap(),
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let (headers, rows) = parse_csv(&String::from_utf8(output).expect("utf8"));
    assert_eq!(rows[0][column(&headers, "Product")], "Lamp");
    assert_eq!(rows[0][column(&headers, "Item No. EUR")], "");
    assert_eq!(rows[0][column(&headers, "Item No. Consistency")], "Match");
}

#[test]
fn match_without_key_column_fails() {
    let workspace = TestWorkspace::new();
    let config = workspace.with_masters();
    let upload = workspace.write("upload.csv", "SKU,Qty\n65001,1\n");

    item_lookup()
        .args([
            "--config",
            config.to_str().unwrap(),
            "match",
            "-i",
            upload.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No key column found"));
}

#[test]
fn build_without_any_master_data_fails() {
    let workspace = TestWorkspace::new();
    let config = workspace.config();

    item_lookup()
        .args(["--config", config.to_str().unwrap(), "build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No regional master data"));
    assert!(!workspace.path().join("library.csv").exists());
}

#[test]
fn update_region_discards_library_until_next_build() {
    let workspace = TestWorkspace::new();
    let config = workspace.with_masters();
    item_lookup()
        .args(["--config", config.to_str().unwrap(), "build"])
        .assert()
        .success();

    let replacement = workspace.write(
        "gbp_new.csv",
        "ITEM NO.,PRODUCT,COLOR\n65009,Table,White\n",
    );
    item_lookup()
        .args([
            "--config",
            config.to_str().unwrap(),
            "update-region",
            "--region",
            "GBP",
            "-i",
            replacement.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert!(!workspace.path().join("library.csv").exists());
    assert!(!workspace.path().join("library.csv.manifest.json").exists());
    assert!(workspace.read("gbp.csv").contains("65009"));

    let upload = workspace.write("upload.csv", "Item no.\n65001\n");
    let output = item_lookup()
        .args([
            "--config",
            config.to_str().unwrap(),
            "match",
            "-i",
            upload.to_str().unwrap(),
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let (headers, rows) = parse_csv(&String::from_utf8(output).expect("utf8"));
    assert_eq!(rows[0][column(&headers, "Item No. GBP")], "65009");
}

#[test]
fn update_region_rejects_file_without_product_column() {
    let workspace = TestWorkspace::new();
    let config = workspace.with_masters();
    let broken = workspace.write("broken.csv", "ITEM NO.,COLOR\n1,Red\n");

    item_lookup()
        .args([
            "--config",
            config.to_str().unwrap(),
            "update-region",
            "--region",
            "EUR",
            "-i",
            broken.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing 'PRODUCT' column"));
    assert!(workspace.read("eur.csv").contains("70001"));
}

#[test]
fn status_json_reports_rows_and_source_states() {
    let workspace = TestWorkspace::new();
    let config = workspace.with_masters();
    item_lookup()
        .args(["--config", config.to_str().unwrap(), "build"])
        .assert()
        .success();
    workspace.write("us.csv", "PATTERN NO.,PRODUCT,COLOR\n1,Stool,Red\n");

    let output = item_lookup()
        .args(["--config", config.to_str().unwrap(), "status", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).expect("json");

    assert_eq!(report["present"], true);
    assert_eq!(report["rows"], 3);
    assert_eq!(report["mismatches"], 1);
    let sources = report["sources"].as_array().expect("sources");
    assert_eq!(sources.len(), 4);
    assert_eq!(sources[0]["region"], "EUR");
    assert_eq!(sources[0]["state"], "unchanged");
    assert_eq!(sources[3]["region"], "US");
    assert_eq!(sources[3]["state"], "changed");
}

#[test]
fn status_reports_corrupt_library_and_keeps_listing_sources() {
    let workspace = TestWorkspace::new();
    let config = workspace.with_masters();
    workspace.write("library.csv", "SKU,Price\n1,2\n");

    item_lookup()
        .args(["--config", config.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("state: corrupt")
                .and(predicate::str::contains("GBP")),
        );

    let output = item_lookup()
        .args(["--config", config.to_str().unwrap(), "status", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).expect("json");
    assert_eq!(report["present"], true);
    assert!(report["corrupt"].as_str().expect("reason").contains("Product"));
    assert_eq!(report["sources"].as_array().expect("sources").len(), 4);
}

#[test]
fn status_without_library_reports_not_built() {
    let workspace = TestWorkspace::new();
    let config = workspace.with_masters();

    item_lookup()
        .args(["--config", config.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("state: not built"));
}

#[test]
fn config_init_refuses_to_overwrite_without_force() {
    let workspace = TestWorkspace::new();
    let target = workspace.path().join("lookup.yaml");

    item_lookup()
        .args(["config", "init", "-o", target.to_str().unwrap()])
        .assert()
        .success();
    let written = workspace.read("lookup.yaml");
    assert!(written.contains("anchor: EUR"));
    assert!(written.contains("library_data.xlsx"));

    item_lookup()
        .args(["config", "init", "-o", target.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    item_lookup()
        .args(["config", "init", "-o", target.to_str().unwrap(), "--force"])
        .assert()
        .success();
}

#[test]
fn invalid_config_is_rejected() {
    let workspace = TestWorkspace::new();
    let config = workspace.write("lookup.yaml", "libary: typo.csv\n");

    item_lookup()
        .args(["--config", config.to_str().unwrap(), "build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parsing config file"));
}

#[test]
fn preview_limits_rows() {
    let workspace = TestWorkspace::new();
    workspace.with_masters();
    let eur = workspace.path().join("eur.csv");

    item_lookup()
        .args(["preview", "-i", eur.to_str().unwrap(), "--rows", "1"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("PRODUCT")
                .and(predicate::str::contains("65001"))
                .and(predicate::str::contains("70001").not())
                .and(predicate::str::contains("... 1 more row(s)")),
        );
}
