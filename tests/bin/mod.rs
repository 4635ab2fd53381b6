mod load_fragment_test;
mod search_destinations_test;

use std::fs;
use std::path::{Path, PathBuf};

/// Copy `tests/fixtures/site` into a fresh temporary directory.
pub fn site_copy() -> (tempfile::TempDir, PathBuf) {
  let tmp = tempfile::TempDir::new().expect("temp dir");
  let root = tmp.path().join("site");
  copy_dir(
    &Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/site"),
    &root,
  );
  (tmp, root)
}

fn copy_dir(from: &Path, to: &Path) {
  fs::create_dir_all(to).expect("create fixture dir");
  for entry in fs::read_dir(from).expect("read fixture dir") {
    let entry = entry.expect("fixture entry");
    let target = to.join(entry.file_name());
    if entry.file_type().expect("file type").is_dir() {
      copy_dir(&entry.path(), &target);
    } else {
      fs::copy(entry.path(), &target).expect("copy fixture");
    }
  }
}
