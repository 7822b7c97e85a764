use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::tempdir;

const HISTORY: &str = "\
symbol,quantity,price,side,date,notes
AAPL,10,100,buy,2024-01-01,
AAPL,10,120,buy,2024-01-02,
AAPL,5,130,sell,2024-01-03,trim
IBM,10,50,buy,2024-01-01,
IBM,10,60,sell,2024-01-05,
";

fn stockfolio(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stockfolio"))
        .current_dir(dir)
        .env_remove("SF_PRICE_HISTORY_DIR")
        .env_remove("SF_PRICE_MULTIPLIER")
        .env_remove("SF_USER_ID")
        .env("RUST_LOG", "off")
        .args(args)
        .output()
        .unwrap()
}

fn json_stdout(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

fn write_history(dir: &Path) -> String {
    let path = dir.join("history.csv");
    std::fs::write(&path, HISTORY).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn holdings_values_open_positions() {
    let tmp = tempdir().unwrap();
    let history = write_history(tmp.path());
    let prices = tmp.path().join("prices.json");
    std::fs::write(&prices, r#"{"AAPL": 125}"#).unwrap();

    let output = stockfolio(
        tmp.path(),
        &["holdings", "-t", &history, "--prices", prices.to_str().unwrap()],
    );
    assert!(output.status.success());

    let valuation = json_stdout(&output);
    let holdings = valuation["holdings"].as_array().unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0]["symbol"], "AAPL");
    assert_eq!(holdings[0]["costBasisRemaining"], 1700.0);
    assert_eq!(holdings[0]["unrealizedPl"], 175.0);
    assert_eq!(holdings[0]["priceSource"], "MARKET");
}

#[test]
fn holdings_without_prices_fall_back_to_average_cost() {
    let tmp = tempdir().unwrap();
    let history = write_history(tmp.path());

    let output = stockfolio(tmp.path(), &["holdings", "-t", &history]);
    assert!(output.status.success());

    let valuation = json_stdout(&output);
    assert_eq!(valuation["holdings"][0]["priceSource"], "AVERAGE_COST_FALLBACK");
    assert!(valuation["holdings"][0]["unrealizedPl"].is_null());
}

#[test]
fn realized_uses_sell_minus_buy() {
    let tmp = tempdir().unwrap();
    let history = write_history(tmp.path());

    let output = stockfolio(tmp.path(), &["realized", "-t", &history, "--user", "alice"]);
    assert!(output.status.success());

    let realized = json_stdout(&output);
    // AAPL 650 − 2200, IBM 600 − 500
    assert_eq!(realized["realizedPl"], -1450.0);
    assert_eq!(realized["userId"], "alice");
}

#[test]
fn validate_sell_reports_rejection() {
    let tmp = tempdir().unwrap();
    let history = write_history(tmp.path());

    let ok = stockfolio(
        tmp.path(),
        &["validate-sell", "-t", &history, "--symbol", "aapl", "--quantity", "15"],
    );
    assert!(ok.status.success());
    assert_eq!(json_stdout(&ok)["accepted"], true);

    let rejected = stockfolio(
        tmp.path(),
        &["validate-sell", "-t", &history, "--symbol", "AAPL", "--quantity", "16"],
    );
    assert_eq!(rejected.status.code(), Some(2));
    let body = json_stdout(&rejected);
    assert_eq!(body["accepted"], false);
    assert_eq!(body["available"], 15.0);
}

#[test]
fn summary_reports_return_percentage() {
    let tmp = tempdir().unwrap();
    let history = write_history(tmp.path());

    let output = stockfolio(tmp.path(), &["summary", "-t", &history]);
    assert!(output.status.success());

    let summary = json_stdout(&output);
    assert_eq!(summary["totalBuyValue"], 2700.0);
    assert_eq!(summary["totalSellValue"], 1250.0);
    // −1450 / 2700 × 100
    let pct = summary["totalReturnPercentage"].as_f64().unwrap();
    assert!((pct - -53.7037).abs() < 1e-9);
    assert_eq!(summary["counts"]["sellTransactions"], 2);
    assert_eq!(summary["symbols"]["IBM"]["profitLoss"], 100.0);
}

#[test]
fn transactions_attach_sell_profit_loss() {
    let tmp = tempdir().unwrap();
    let history = write_history(tmp.path());

    let output = stockfolio(tmp.path(), &["transactions", "-t", &history]);
    assert!(output.status.success());

    let listed = json_stdout(&output);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 5);
    assert!(listed[0]["profitLoss"].is_null());
    assert_eq!(listed[2]["side"], "sell");
    assert_eq!(listed[2]["notes"], "trim");
    // 650 − 2200 × 5 / 20
    assert_eq!(listed[2]["profitLoss"], 100.0);
    assert_eq!(listed[4]["profitLoss"], 100.0);
}

#[test]
fn json_transactions_file_is_accepted() {
    let tmp = tempdir().unwrap();
    let history = tmp.path().join("history.json");
    std::fs::write(
        &history,
        r#"[
            {"symbol": "AAPL", "quantity": 10, "price": 100, "type": "buy", "date": "2024-01-01"},
            {"symbol": "AAPL", "quantity": "10", "price": "120", "type": "buy", "date": "2024-01-02"},
            {"symbol": "AAPL", "quantity": 5, "price": 130, "type": "sell", "date": "2024-01-03"}
        ]"#,
    )
    .unwrap();

    let output = stockfolio(tmp.path(), &["holdings", "-t", history.to_str().unwrap()]);
    assert!(output.status.success());

    let valuation = json_stdout(&output);
    assert_eq!(valuation["holdings"][0]["quantityRemaining"], 15.0);
    assert_eq!(valuation["holdings"][0]["costBasisRemaining"], 1700.0);
}

#[test]
fn invalid_csv_row_is_reported_with_its_line() {
    let tmp = tempdir().unwrap();
    let history = tmp.path().join("bad.csv");
    std::fs::write(
        &history,
        "symbol,quantity,price,side,date\nAAPL,1,100,buy,2024-01-01\n\nAAPL,0,100,buy,2024-01-02\n",
    )
    .unwrap();

    let output = stockfolio(tmp.path(), &["summary", "-t", history.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("row 4"), "stderr was: {stderr}");
}

#[test]
fn missing_transactions_file_is_an_error() {
    let tmp = tempdir().unwrap();
    let output = stockfolio(tmp.path(), &["summary"]);
    assert!(!output.status.success());
}
