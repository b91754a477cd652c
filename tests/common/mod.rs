//! Common test utilities

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a temporary project with a brisk.yml and the given files
pub fn create_project(buildfile: &str, files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("brisk.yml");
    fs::write(&config_path, buildfile).unwrap();
    for (path, contents) in files {
        let path = temp_dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    (temp_dir, config_path)
}

/// The demo project shipped with the crate
pub fn demo_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/capital-framework")
}

/// Copy the demo project into a temporary directory
pub fn copy_demo() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    copy_dir(&demo_dir(), temp_dir.path());
    temp_dir
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let dest = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &dest);
        } else {
            fs::copy(entry.path(), dest).unwrap();
        }
    }
}

/// Read a file of a project
pub fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path))
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path, e))
}
