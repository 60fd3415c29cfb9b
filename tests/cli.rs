use std::io::Write;
use std::process::{Command, Stdio};

fn cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_flargest"))
}

fn input_file(dir: &tempfile::TempDir, data: &str) -> std::path::PathBuf {
    let path = dir.path().join("input.txt");
    std::fs::write(&path, data).unwrap();
    path
}

#[test]
fn test_prints_largest_first() {
    let dir = tempfile::tempdir().unwrap();
    let path = input_file(&dir, "five 5\nhundred 100\nanswer 42\n");
    let output = cmd().arg(&path).output().unwrap();
    assert!(output.status.success(), "flargest failed: {:?}", output);
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "hundred\nanswer\nfive\n"
    );
}

#[test]
fn test_count_and_show_size() {
    let dir = tempfile::tempdir().unwrap();
    let path = input_file(&dir, "a 1\nb 2\nc 3\nd -4\n");
    let output = cmd().args(["-k", "2", "-s"]).arg(&path).output().unwrap();
    assert!(output.status.success(), "flargest failed: {:?}", output);
    assert_eq!(String::from_utf8_lossy(&output.stdout), "c 3\nb 2\n");
}

#[test]
fn test_small_chunks_same_output() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = String::new();
    for i in 0..500 {
        data.push_str(&format!("/item/{} {}\n", i, (i * 37) % 503));
    }
    let path = input_file(&dir, &data);

    let whole = cmd().arg(&path).output().unwrap();
    let chunked = cmd()
        .args(["-C", "64", "-j", "3", "--mergers", "2"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(whole.status.success());
    assert!(chunked.status.success());
    assert_eq!(whole.stdout, chunked.stdout);
}

#[test]
fn test_empty_file_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    let path = input_file(&dir, "");
    let output = cmd().arg(&path).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no results"));
}

#[test]
fn test_missing_file_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let output = cmd().arg(dir.path().join("absent.txt")).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot open"), "{}", stderr);
}

#[test]
fn test_bad_chunk_size_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let path = input_file(&dir, "a 1\n");
    let output = cmd().args(["-C", "12Q"]).arg(&path).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid chunk size"));
}

#[test]
fn test_prompts_for_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = input_file(&dir, "x 10\ny 20\n");
    let mut child = cmd()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    {
        let mut stdin = child.stdin.take().unwrap();
        writeln!(stdin, "{}", path.display()).unwrap();
    }
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "flargest failed: {:?}", output);
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Enter the absolute path of a file: y\nx\n"
    );
}

#[test]
fn test_prompt_eof_exits_cleanly() {
    let output = cmd().stdin(Stdio::null()).output().unwrap();
    assert!(output.status.success(), "flargest failed: {:?}", output);
    assert!(output.stderr.is_empty());
}
