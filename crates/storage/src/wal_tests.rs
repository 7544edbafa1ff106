use super::*;
use tempfile::tempdir;

#[derive(Debug, Clone, Serialize, serde::Deserialize, PartialEq)]
struct TestOp {
    label: String,
}

fn op(label: &str) -> TestOp {
    TestOp { label: label.to_string() }
}

#[test]
fn open_creates_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");

    let wal: Wal<TestOp> = Wal::open(&path, 0).unwrap();

    assert!(path.exists());
    assert_eq!(wal.write_seq(), 0);
    assert_eq!(wal.processed_seq(), 0);
}

#[test]
fn append_assigns_monotonic_seq() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");
    let mut wal: Wal<TestOp> = Wal::open(&path, 0).unwrap();

    let seq1 = wal.append(&op("a")).unwrap();
    let seq2 = wal.append(&op("b")).unwrap();

    assert_eq!(seq1, 1);
    assert_eq!(seq2, 2);

    wal.flush().unwrap();
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
}

#[test]
fn entries_after_returns_only_the_tail() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");
    let mut wal: Wal<TestOp> = Wal::open(&path, 0).unwrap();

    wal.append(&op("a")).unwrap();
    wal.append(&op("b")).unwrap();
    wal.append(&op("c")).unwrap();
    wal.flush().unwrap();

    let entries = wal.entries_after(1).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].seq, 2);
    assert_eq!(entries[0].entry, op("b"));
    assert_eq!(entries[1].seq, 3);
    assert_eq!(entries[1].entry, op("c"));
}

#[test]
fn reopen_resumes_from_last_seq_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");

    {
        let mut wal: Wal<TestOp> = Wal::open(&path, 0).unwrap();
        wal.append(&op("a")).unwrap();
        wal.append(&op("b")).unwrap();
        wal.flush().unwrap();
    }

    let wal: Wal<TestOp> = Wal::open(&path, 0).unwrap();
    assert_eq!(wal.write_seq(), 2);
}

#[test]
fn truncate_resets_log_but_keeps_seq_continuity() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");
    let mut wal: Wal<TestOp> = Wal::open(&path, 0).unwrap();

    wal.append(&op("a")).unwrap();
    wal.append(&op("b")).unwrap();
    wal.flush().unwrap();

    wal.truncate().unwrap();
    assert_eq!(wal.processed_seq(), 2);
    assert_eq!(wal.entries_after(0).unwrap().len(), 0);

    let seq3 = wal.append(&op("c")).unwrap();
    assert_eq!(seq3, 3);
}
