//! Builds a deterministic backup plan from a scan: computes size and
//! expected hash for every entry, then orders the plan lexicographically
//! on `rel_path` (manifest order), independent of whatever order the
//! directory walk happened to produce it in.

use std::path::Path;

use wcbt_core::error::WcbtError;
use wcbt_core::plan::PlanOp;

use super::scan::ScanEntry;
use crate::hasher;

/// Hashes every scanned entry and returns the plan ops in manifest order
/// (lexicographic on `rel_path`).
pub fn build_plan(entries: &[ScanEntry], payload_dir: &Path) -> Result<Vec<PlanOp>, WcbtError> {
    let mut ops = Vec::with_capacity(entries.len());
    for entry in entries {
        let hashed = hasher::hash_file(&entry.abs)?;
        ops.push(PlanOp {
            rel_path: entry.rel.clone(),
            source_abs: entry.abs.clone(),
            dest_abs: payload_dir.join(&entry.rel),
            size_bytes: hashed.size_bytes,
            expected_hash: hashed.hex,
        });
    }
    ops.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::scan;
    use tempfile::tempdir;

    #[test]
    fn plan_is_sorted_lexicographically_by_rel_path() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a")).unwrap();
        std::fs::write(dir.path().join("a-b.txt"), b"1").unwrap();
        std::fs::write(dir.path().join("a/b.txt"), b"2").unwrap();

        let entries = scan::scan(dir.path()).unwrap();
        let ops = build_plan(&entries, Path::new("/dest/payload")).unwrap();
        let rels: Vec<_> = ops.iter().map(|o| o.rel_path.clone()).collect();
        assert_eq!(rels, vec!["a-b.txt".to_string(), "a/b.txt".to_string()]);
    }

    #[test]
    fn plan_is_stable_across_repeated_builds_of_same_content() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello\n").unwrap();
        let entries = scan::scan(dir.path()).unwrap();
        let first = build_plan(&entries, Path::new("/dest/payload")).unwrap();
        let second = build_plan(&entries, Path::new("/dest/payload")).unwrap();
        assert_eq!(first[0].expected_hash, second[0].expected_hash);
        assert_eq!(first[0].size_bytes, second[0].size_bytes);
    }
}
