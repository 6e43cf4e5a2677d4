use assert_cmd::prelude::*;
use std::process::Command;

#[test]
fn plan_json_is_parseable_and_numerically_exact() {
    let output = Command::cargo_bin("refresher_cli")
        .unwrap()
        .arg("--json")
        .args(["plan", "--recipe", "B", "--size", "X"])
        .output()
        .expect("run plan");
    assert!(output.status.success());

    let v: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout must be one JSON object");

    assert_eq!(v["recipe"], "lemonade");
    assert_eq!(v["size"], "grande");
    assert_eq!(v["ounces"], 16.0);

    let seconds = v["pump_seconds"].as_array().expect("pump_seconds array");
    assert_eq!(seconds.len(), 4);
    assert!((seconds[0].as_f64().unwrap() - 3.2).abs() < 1e-5);
    assert_eq!(seconds[1], 0.0);
    assert_eq!(seconds[2], 0.0);
    assert!((seconds[3].as_f64().unwrap() - 3.2).abs() < 1e-5);

    assert_eq!(v["water_oz"], 0.0);
    assert!((v["total_seconds"].as_f64().unwrap() - 6.4).abs() < 1e-5);
}

#[test]
fn selector_errors_are_structured_in_json_mode() {
    let output = Command::cargo_bin("refresher_cli")
        .unwrap()
        .arg("--json")
        .args(["plan", "--recipe", "E", "--size", "X"])
        .output()
        .expect("run plan");
    assert!(!output.status.success());

    let v: serde_json::Value =
        serde_json::from_slice(&output.stderr).expect("stderr must be one JSON object");
    assert_eq!(v["reason"], "Error");
    assert!(
        v["message"]
            .as_str()
            .expect("message string")
            .contains("not on the menu")
    );
}
