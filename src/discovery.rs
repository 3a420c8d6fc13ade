// SPDX-License-Identifier: Apache-2.0

//! Recursive file discovery shared by the metadata store and the query
//! source listing.

use std::io;
use std::path::{Path, PathBuf};

/// Directories never worth descending into
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git"];
const METADATA_DIR: &str = "metadata";

/// Lists every file below `root`, depth first.
///
/// Entries of each directory are visited in name order, except that a
/// `metadata` directory always comes first: in a Hasura project its records
/// shadow copies kept anywhere else.
pub(crate) async fn discover_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(path) = pending.pop() {
        let file_type = tokio::fs::metadata(&path).await?.file_type();
        if !file_type.is_dir() {
            files.push(path);
            continue;
        }

        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&path).await?;
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name();
            if SKIPPED_DIRS.iter().any(|skip| name == *skip) {
                continue;
            }
            entries.push(entry.path());
        }

        entries.sort_by_key(|p| (p.file_name().map_or(true, |n| n != METADATA_DIR), p.clone()));
        pending.extend(entries.into_iter().rev());
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metadata_dir_is_searched_first() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("metadata/tables")).unwrap();
        std::fs::create_dir_all(root.join("backup")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        std::fs::write(root.join("backup/a.yaml"), "").unwrap();
        std::fs::write(root.join("config.yaml"), "").unwrap();
        std::fs::write(root.join("metadata/tables/a.yaml"), "").unwrap();
        std::fs::write(root.join("node_modules/pkg/a.yaml"), "").unwrap();

        let files = discover_files(root).await.unwrap();
        assert_eq!(files.len(), 3);
        assert!(files[0].ends_with("metadata/tables/a.yaml"));
        assert!(files[1].ends_with("backup/a.yaml"));
        assert!(files[2].ends_with("config.yaml"));
    }
}
