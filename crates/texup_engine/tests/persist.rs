use std::fs;

use texup_engine::{ensure_output_dir, AtomicFileWriter, PersistError};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("output");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().join("output"));

    let first = writer.write("scan.tex", b"\\section{A}").unwrap();
    assert_eq!(first.file_name().unwrap(), "scan.tex");
    assert_eq!(fs::read(&first).unwrap(), b"\\section{A}");

    let second = writer.write("scan.tex", b"\\section{B}").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"\\section{B}");
}

#[test]
fn output_dir_that_is_a_file_fails() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("scan.tex", b"data");
    assert!(matches!(result, Err(PersistError::OutputDir(_))));
    assert!(!file_path.with_file_name("scan.tex").exists());
}

#[test]
fn names_with_separators_are_rejected() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());
    for name in ["../escape.tex", "a/b.tex", "", ".."] {
        assert!(
            matches!(writer.write(name, b"x"), Err(PersistError::InvalidName(_))),
            "{name:?} accepted"
        );
    }
}
