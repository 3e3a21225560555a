//! Canonical artifact serialization: write-to-temp-then-rename, sorted
//! keys, LF newlines, UTF-8 without BOM, trailing newline. Every component
//! that writes a JSON/JSONL/text artifact goes through this module instead
//! of hand-rolling its own `fs::write`.

use std::io::Write as _;
use std::path::Path;

use serde::Serialize;
use wcbt_core::error::{ErrorKind, WcbtError};

fn io_err(path: &Path, e: std::io::Error) -> WcbtError {
    WcbtError::with_source(ErrorKind::IoError, format!("artifact write failed: {}", path.display()), e)
}

/// Serializes `value` as canonical single-document JSON (sorted keys, no
/// insignificant whitespace) and commits it to `path` atomically.
pub fn write_json_atomic(path: &Path, value: &impl Serialize) -> Result<(), WcbtError> {
    let canonical = canonicalize_json(value)?;
    let mut bytes = serde_json::to_vec(&canonical).map_err(|e| {
        WcbtError::with_source(ErrorKind::IoError, "failed to serialize artifact", e)
    })?;
    bytes.push(b'\n');
    write_atomic(path, &bytes)
}

/// Serializes `records` as JSONL (one compact, sorted-key object per line)
/// and commits the whole file to `path` atomically.
pub fn write_jsonl_atomic<T: Serialize>(path: &Path, records: &[T]) -> Result<(), WcbtError> {
    let mut out = Vec::new();
    for record in records {
        let canonical = canonicalize_json(record)?;
        let line = serde_json::to_vec(&canonical).map_err(|e| {
            WcbtError::with_source(ErrorKind::IoError, "failed to serialize artifact line", e)
        })?;
        out.extend_from_slice(&line);
        out.push(b'\n');
    }
    write_atomic(path, &out)
}

/// Commits pre-rendered deterministic text (e.g. the human-readable verify
/// summary) to `path` atomically. The caller is responsible for producing
/// stable line ordering; this only guarantees the LF/trailing-newline shape
/// and the write's atomicity.
pub fn write_text_atomic(path: &Path, text: &str) -> Result<(), WcbtError> {
    let mut bytes = text.replace("\r\n", "\n").into_bytes();
    if bytes.last().copied() != Some(b'\n') {
        bytes.push(b'\n');
    }
    write_atomic(path, &bytes)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), WcbtError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| WcbtError::new(ErrorKind::IoError, format!("invalid artifact path: {}", path.display())))?;
    let tmp_path = parent.join(format!("{file_name}.tmp"));

    {
        let mut tmp = std::fs::File::create(&tmp_path).map_err(|e| io_err(&tmp_path, e))?;
        tmp.write_all(bytes).map_err(|e| io_err(&tmp_path, e))?;
        tmp.sync_all().map_err(|e| io_err(&tmp_path, e))?;
    }

    std::fs::rename(&tmp_path, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

/// Commits a batch of related artifacts as a unit. The caller writes each
/// file of `file_names` into `staging_dir` first (fully built and fsynced,
/// e.g. via the `write_*_atomic` helpers above); this then renames every
/// name from `staging_dir` into `final_dir` back to back, so a crash either
/// lands before any rename (`final_dir` holds none of the new artifacts) or
/// after all of them (`final_dir` holds the complete set), rather than a
/// partial one. `staging_dir` is removed once every file has moved.
pub fn commit_batch(staging_dir: &Path, final_dir: &Path, file_names: &[&str]) -> Result<(), WcbtError> {
    std::fs::create_dir_all(final_dir).map_err(|e| io_err(final_dir, e))?;
    for file_name in file_names {
        let from = staging_dir.join(file_name);
        let to = final_dir.join(file_name);
        std::fs::rename(&from, &to).map_err(|e| io_err(&to, e))?;
    }
    let _ = std::fs::remove_dir(staging_dir);
    Ok(())
}

/// Re-serializes through a `BTreeMap`-backed `serde_json::Value` so nested
/// object keys come out sorted regardless of struct field declaration order.
fn canonicalize_json(value: &impl Serialize) -> Result<serde_json::Value, WcbtError> {
    let raw = serde_json::to_value(value).map_err(|e| {
        WcbtError::with_source(ErrorKind::IoError, "failed to build canonical artifact value", e)
    })?;
    Ok(sort_keys(raw))
}

fn sort_keys(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let sorted: std::collections::BTreeMap<String, serde_json::Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k, v);
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(sort_keys).collect())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[derive(Serialize)]
    struct Doc {
        z: u32,
        a: u32,
    }

    #[test]
    fn json_keys_are_sorted_and_file_ends_with_newline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.json");
        write_json_atomic(&path, &Doc { z: 1, a: 2 }).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\"a\":2,\"z\":1}\n");
    }

    #[test]
    fn jsonl_writes_one_compact_line_per_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.jsonl");
        write_jsonl_atomic(&path, &[Doc { z: 1, a: 2 }, Doc { z: 3, a: 4 }]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\"a\":2,\"z\":1}\n{\"a\":4,\"z\":3}\n");
    }

    #[test]
    fn no_leftover_tmp_file_after_success() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.json");
        write_json_atomic(&path, &Doc { z: 1, a: 2 }).unwrap();
        assert!(!dir.path().join("doc.json.tmp").exists());
    }

    #[test]
    fn commit_batch_moves_every_named_file_and_removes_the_staging_dir() {
        let dir = tempdir().unwrap();
        let staging = dir.path().join("staging");
        let final_dir = dir.path().join("final");
        std::fs::create_dir_all(&staging).unwrap();
        write_json_atomic(&staging.join("a.json"), &Doc { z: 1, a: 2 }).unwrap();
        write_json_atomic(&staging.join("b.json"), &Doc { z: 3, a: 4 }).unwrap();

        commit_batch(&staging, &final_dir, &["a.json", "b.json"]).unwrap();

        assert!(final_dir.join("a.json").exists());
        assert!(final_dir.join("b.json").exists());
        assert!(!staging.exists());
    }
}
