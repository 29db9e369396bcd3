#![allow(dead_code)]

use log::debug;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tome::cli::{run, Args};
use walkdir::WalkDir;

/// Writes `files` (relative path, content) below `root`, creating directories.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (relative, content) in files {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

/// Arguments for a non-interactive run of `input` into `out`.
pub fn args(input: &Path, out: Option<&Path>) -> Args {
    Args {
        input: input.to_path_buf(),
        out: out.map(Path::to_path_buf),
        values: Vec::new(),
        set: Vec::new(),
        include: Vec::new(),
        exclude: Vec::new(),
        copy: Vec::new(),
        temp: Vec::new(),
        strip: Vec::new(),
        mode: None,
        strict: false,
        force: true,
        dry_run: false,
        verbose: 2,
    }
}

fn relative_files(dir: &Path) -> BTreeSet<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file())
        .map(|e| e.path().strip_prefix(dir).unwrap().to_path_buf())
        .collect()
}

/// Prints a diff of files and their contents between two directories.
///
/// # Arguments
/// * `dir1` - The first directory to compare (actual output).
/// * `dir2` - The second directory to compare (expected output).
pub fn print_dir_diff(dir1: &Path, dir2: &Path) {
    let files1 = relative_files(dir1);
    let files2 = relative_files(dir2);

    println!("\n=== Directory Comparison ===");
    println!("Actual output:   {dir1:?}");
    println!("Expected output: {dir2:?}");

    for file in files1.difference(&files2) {
        println!("  + {file:?}");
    }
    for file in files2.difference(&files1) {
        println!("  - {file:?}");
    }
    for file in files1.intersection(&files2) {
        let actual = fs::read(dir1.join(file)).unwrap();
        let expected = fs::read(dir2.join(file)).unwrap();
        if actual != expected {
            println!("\n  File: {file:?}");
            println!("  --- Actual content:\n{}", String::from_utf8_lossy(&actual));
            println!("  --- Expected content:\n{}", String::from_utf8_lossy(&expected));
        }
    }
    println!("=== End of Comparison ===\n");
}

/// Runs tome with `args`, then asserts the output directory matches a tree
/// built from `expected`.
pub fn run_and_assert(args: Args, expected: &[(&str, &str)]) {
    let out = args.out.clone().expect("tree runs need an output directory");
    run(args).unwrap();

    let expected_dir = tempfile::tempdir().unwrap();
    write_tree(expected_dir.path(), expected);

    match dir_diff::is_different(&out, expected_dir.path()) {
        Ok(true) => {
            print_dir_diff(&out, expected_dir.path());
            panic!("Directories differ. See above for details.");
        }
        Ok(false) => {}
        Err(e) => {
            debug!("Error comparing directories: {e:?}");
            panic!("Could not compare directories");
        }
    }
}
