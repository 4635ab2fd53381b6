use super::site_copy;
use std::process::Command;

fn load_fragment() -> Command {
  let mut command = Command::new(env!("CARGO_BIN_EXE_load_fragment"));
  command.env("FRAGLOAD_LOG", "off").env_remove("FRAGLOAD_VARIANTS_LIMIT");
  command
}

#[test]
fn load_fragment_help_mentions_flags() {
  let output = load_fragment().arg("--help").output().expect("run load_fragment --help");
  assert!(output.status.success());
  let help = String::from_utf8_lossy(&output.stdout);
  for needle in ["--candidates", "--variants-limit", "--report", "--timeout-ms", "--user-agent"] {
    assert!(help.contains(needle), "help missing {needle}; got:\n{help}");
  }
}

#[test]
fn injects_header_found_one_directory_up() {
  let (_tmp, site) = site_copy();
  let page = site.join("pages/about.html");
  let output = load_fragment()
    .args([page.to_str().unwrap(), "fragments/header.html", "shared-header"])
    .output()
    .expect("run load_fragment");

  assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
  let html = String::from_utf8_lossy(&output.stdout);
  assert!(html.contains(r#"<input id="Research" type="text" placeholder="Buscar destinos">"#));
  assert!(html.contains(r#"<a href="pages/about.html" class="active">Sobre</a>"#));
  assert!(html.contains("//# sourceURL=shared-header::inline-0.js"));
  assert!(!html.contains("Carregando..."));
}

#[test]
fn missing_fragment_still_prints_page() {
  let (_tmp, site) = site_copy();
  let page = site.join("index.html");
  let output = load_fragment()
    .args([page.to_str().unwrap(), "fragments/footer.html", "shared-header", "--report"])
    .output()
    .expect("run load_fragment");

  assert!(output.status.success());
  let html = String::from_utf8_lossy(&output.stdout);
  assert!(html.contains(r#"<div id="shared-header"></div>"#));

  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("warning: fragment 'fragments/footer.html' not loaded"));
  let json_start = stderr.find('{').expect("report json");
  let report: serde_json::Value = serde_json::from_str(&stderr[json_start..]).expect("parse report");
  assert_eq!(report["status"], "fetch_failed");
  assert!(report["attempts"].as_array().unwrap().len() >= 5);
}

#[test]
fn candidates_are_listed_without_fetching() {
  let output = load_fragment()
    .args([
      "https://example.invalid/docs/pages/index.html",
      "fragments/header.html",
      "shared-header",
      "--candidates",
      "--variants-limit",
      "1",
    ])
    .output()
    .expect("run load_fragment --candidates");

  assert!(output.status.success());
  let stdout = String::from_utf8_lossy(&output.stdout);
  let lines: Vec<&str> = stdout.lines().collect();
  assert_eq!(
    lines,
    vec![
      "fragments/header.html",
      "./fragments/header.html",
      "/docs/pages/fragments/header.html",
      "/fragments/header.html",
      "../fragments/header.html",
    ]
  );
}

#[test]
fn unreadable_page_fails() {
  let tmp = tempfile::TempDir::new().expect("temp dir");
  let missing = tmp.path().join("nope.html");
  let output = load_fragment()
    .args([missing.to_str().unwrap(), "fragments/header.html", "shared-header"])
    .output()
    .expect("run load_fragment");
  assert!(!output.status.success());
  assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read page"));
}

#[test]
fn missing_container_keeps_page_and_exit_code() {
  let (_tmp, site) = site_copy();
  let page = site.join("index.html");
  let output = load_fragment()
    .args([page.to_str().unwrap(), "fragments/header.html", "no-such-container"])
    .output()
    .expect("run load_fragment");

  assert!(output.status.success());
  assert!(String::from_utf8_lossy(&output.stdout).contains("Encontre seu próximo destino"));
  assert!(String::from_utf8_lossy(&output.stderr).contains("Container not found"));
}
