use assert_cmd::{cargo, prelude::*};
use predicates::prelude::*;
use rust_xlsxwriter::Workbook;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn write_statement(dir: &Path, bad_row: bool) -> PathBuf {
    let path = dir.join("statement.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    sheet.write_string(0, 1, "01/01/2019 a 31/12/2019").unwrap();
    sheet.write_string(4, 1, "CORRETORA XYZ").unwrap();

    let header = [
        "Data Negócio",
        "C/V",
        "Mercado",
        "Prazo",
        "Código",
        "Especificação do Ativo",
        "Quantidade",
        "Preço (R$)",
        "Valor Total (R$)",
    ];
    for (col, title) in header.iter().enumerate() {
        sheet.write_string(6, col as u16, *title).unwrap();
    }

    sheet.write_string(7, 0, "20/02/2019").unwrap();
    sheet.write_string(7, 1, "C").unwrap();
    sheet.write_string(7, 4, "BOVA11").unwrap();
    sheet.write_number(7, 6, 10.0).unwrap();
    sheet.write_number(7, 7, 93.5).unwrap();
    sheet.write_number(7, 8, 935.0).unwrap();

    sheet.write_string(8, 0, "14/05/2019").unwrap();
    sheet.write_string(8, 1, "V").unwrap();
    sheet.write_string(8, 4, "BOVA11").unwrap();
    sheet.write_number(8, 6, 5.0).unwrap();
    sheet.write_number(8, 7, 100.0).unwrap();
    sheet.write_number(8, 8, 500.0).unwrap();

    if bad_row {
        sheet.write_string(9, 0, "07/06/2019").unwrap();
        sheet.write_string(9, 1, "C").unwrap();
        sheet.write_string(9, 4, "XPTO3").unwrap();
        sheet.write_string(9, 6, "dez").unwrap();
        sheet.write_number(9, 7, 10.0).unwrap();
        sheet.write_number(9, 8, 100.0).unwrap();
    }

    workbook.save(&path).unwrap();
    path
}

fn base_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("apura"));
    cmd.env("HOME", home.path());
    cmd.arg("--no-color");
    cmd
}

#[test]
fn json_report_from_statement() {
    let home = TempDir::new().unwrap();
    let statement = write_statement(home.path(), false);

    let output = base_cmd(&home)
        .arg(&statement)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["reference_year"], 2019);
    assert_eq!(report["institution"], "CORRETORA XYZ");

    let assets = report["assets"].as_array().unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0]["ticker"], "BOVA11");
    assert_eq!(assets[0]["open_quantity"], "5");
    assert_eq!(assets[0]["disposal_count"], 1);

    let months = report["months"].as_array().unwrap();
    assert_eq!(months.len(), 1);
    assert_eq!(months[0]["month"], 5);
}

#[test]
fn table_report_names_the_input_file() {
    let home = TempDir::new().unwrap();
    let statement = write_statement(home.path(), false);

    base_cmd(&home)
        .arg(&statement)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Filename: "))
        .stdout(predicate::str::contains("IRPF 2019"))
        .stdout(predicate::str::contains("Bens e Direitos"))
        .stdout(predicate::str::contains("BOVA11"))
        .stdout(predicate::str::contains("Resultados mensais"));
}

#[test]
fn bad_row_is_reported_but_does_not_fail_the_run() {
    let home = TempDir::new().unwrap();
    let statement = write_statement(home.path(), true);

    base_cmd(&home)
        .arg(&statement)
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped"));
}

#[test]
fn strict_mode_fails_on_bad_row() {
    let home = TempDir::new().unwrap();
    let statement = write_statement(home.path(), true);

    base_cmd(&home)
        .arg(&statement)
        .arg("--strict")
        .assert()
        .failure();
}

#[test]
fn missing_statement_file_fails() {
    let home = TempDir::new().unwrap();

    base_cmd(&home)
        .arg(home.path().join("nope.xlsx"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn no_file_and_no_default_statement_fails() {
    let home = TempDir::new().unwrap();

    let mut cmd = base_cmd(&home);
    cmd.current_dir(home.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("InfoCEI.xls"));
}
