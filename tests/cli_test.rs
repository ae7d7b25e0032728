use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn checkout_command() -> Command {
    let mut cmd = Command::new(cargo_bin!("pledge-engine"));
    cmd.arg("--catalog")
        .arg("tests/fixtures/catalog.json")
        .arg("--rates")
        .arg("tests/fixtures/rates.csv")
        .env("RUST_LOG", "info");
    cmd
}

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let output = checkout_command()
        .arg("tests/fixtures/requests.jsonl")
        .output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            r#"{"status":"approved","redirect":"/pledges/1/success"}"#,
            r#"{"status":"declined"}"#,
            r#"{"status":"error","message":"customer missing"}"#,
            r#"{"status":"declined","message":"project_id was flagged by antifraud, target_amount was flagged by antifraud"}"#,
            r#"{"status":"error","message":"customer missing"}"#,
        ]
    );

    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("Error reading checkout request"));
    assert!(stderr.contains("line 4"));

    Ok(())
}

#[test]
fn test_results_stay_on_stdout() {
    let mut requests = NamedTempFile::new().unwrap();
    writeln!(
        requests,
        r#"{{"params": {{"project_id": "mexico-on-rails", "backing_amount": "abc"}}}}"#
    )
    .unwrap();

    checkout_command()
        .arg(requests.path())
        .assert()
        .success()
        .stdout(predicate::eq(
            "{\"status\":\"error\",\"message\":\"User can't be blank, Backing amount is not a number\"}\n",
        ))
        .stderr(predicate::str::contains("checkout rejected"));
}

#[test]
fn test_session_currency_and_success_path() {
    let mut requests = NamedTempFile::new().unwrap();
    writeln!(
        requests,
        r#"{{"session": {{"user": {{"id": 3, "name": "Luis", "email": "luis@example.com"}}, "currency": "usd"}}, "params": {{"project_id": "mexico-on-rails", "backing_amount": "25", "reward_id": "110903", "payment_token": "tok_test_visa_4242"}}}}"#
    )
    .unwrap();

    checkout_command()
        .arg(requests.path())
        .arg("--success-path")
        .arg("/backers/")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"status":"approved","redirect":"/backers/1/success"}"#,
        ));
}

#[test]
fn test_live_mode_checks_challenge() {
    let mut requests = NamedTempFile::new().unwrap();
    writeln!(
        requests,
        r#"{{"session": {{"user": {{"id": 3, "name": "Luis", "email": "luis@example.com"}}}}, "params": {{"project_id": "mexico-on-rails", "backing_amount": "25", "payment_token": "tok_test_visa_4242", "challenge_response": "robot"}}}}"#
    )
    .unwrap();

    checkout_command()
        .arg(requests.path())
        .arg("--environment")
        .arg("live")
        .env("PLEDGE_CHALLENGE_SECRET", "human")
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed anti-abuse challenge"));
}

#[test]
fn test_missing_catalog_fails() {
    let mut cmd = Command::new(cargo_bin!("pledge-engine"));
    cmd.arg("tests/fixtures/requests.jsonl")
        .arg("--catalog")
        .arg("tests/fixtures/nope.json")
        .arg("--rates")
        .arg("tests/fixtures/rates.csv");

    cmd.assert().failure();
}
