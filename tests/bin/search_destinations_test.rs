use super::site_copy;
use std::process::Command;

fn search_destinations() -> Command {
  let mut command = Command::new(env!("CARGO_BIN_EXE_search_destinations"));
  command.env("FRAGLOAD_LOG", "off").env_remove("FRAGLOAD_SEARCH_THRESHOLD");
  command
}

#[test]
fn json_results_are_ranked_by_score() {
  let (_tmp, site) = site_copy();
  let output = search_destinations()
    .args([site.join("database.json").to_str().unwrap(), "templo", "--json"])
    .output()
    .expect("run search_destinations");

  assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
  let rows: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).expect("parse json");
  let names: Vec<&str> = rows
    .iter()
    .map(|row| row["destination"]["name"].as_str().unwrap())
    .collect();
  assert_eq!(&names[..3], ["Templo Taj Mahal", "Japão", "Templo Angkor Wat"]);
  assert_eq!(rows[0]["percent"], 150);
  assert_eq!(rows[0]["matchScore"], 0.0);
}

#[test]
fn html_output_has_two_cards() {
  let (_tmp, site) = site_copy();
  let output = search_destinations()
    .args([site.join("database.json").to_str().unwrap(), "praia", "--html"])
    .output()
    .expect("run search_destinations");

  assert!(output.status.success());
  let html = String::from_utf8_lossy(&output.stdout);
  assert_eq!(html.matches(r#"<div class="recommendation-card">"#).count(), 2);
  assert!(html.contains("onerror=\"this.src='images/placeholder.svg'\""));
}

#[test]
fn short_term_finds_nothing() {
  let (_tmp, site) = site_copy();
  let output = search_destinations()
    .args([site.join("database.json").to_str().unwrap(), "ja"])
    .output()
    .expect("run search_destinations");

  assert!(output.status.success());
  assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "No destinations found");
}

#[test]
fn missing_dataset_fails() {
  let tmp = tempfile::TempDir::new().expect("temp dir");
  let output = search_destinations()
    .args([tmp.path().join("database.json").to_str().unwrap(), "templo"])
    .output()
    .expect("run search_destinations");
  assert!(!output.status.success());
  assert!(String::from_utf8_lossy(&output.stderr).contains("failed to load dataset"));
}
