//! Depth-first file search over a lazily listed remote tree.
//!
//! The backend is assumed to be a strict tree: there is no depth limit,
//! cycle detection or result cap.

use super::{EntryKind, RemoteEntry, StorageError};
use async_trait::async_trait;

/// Lists the direct children of a remote folder
#[async_trait]
pub trait DirectoryLister: Send + Sync {
    /// Children of `path`
    async fn list_dir(&self, path: &str) -> Result<Vec<RemoteEntry>, StorageError>;
}

/// Case-insensitive substring match of `query` against `name`
#[must_use]
pub fn name_matches(name: &str, query: &str) -> bool {
    name.to_lowercase().contains(&query.to_lowercase())
}

/// Walk the tree below `root` and collect matching files.
///
/// Directories are always descended into; files are kept when `query` is a
/// case-insensitive substring of their name.
///
/// # Errors
///
/// Returns the first listing error encountered.
pub async fn depth_first_search<L>(
    lister: &L,
    root: &str,
    query: &str,
) -> Result<Vec<RemoteEntry>, StorageError>
where
    L: DirectoryLister + ?Sized,
{
    let mut pending = vec![root.to_string()];
    let mut found = Vec::new();

    while let Some(dir) = pending.pop() {
        let mut subdirs = Vec::new();
        for entry in lister.list_dir(&dir).await? {
            match entry.kind {
                EntryKind::Directory => subdirs.push(entry.path),
                EntryKind::File => {
                    if name_matches(&entry.name, query) {
                        found.push(entry);
                    }
                }
            }
        }
        // Reversed so the stack pops them in listing order
        pending.extend(subdirs.into_iter().rev());
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct TreeLister(HashMap<String, Vec<RemoteEntry>>);

    #[async_trait]
    impl DirectoryLister for TreeLister {
        async fn list_dir(&self, path: &str) -> Result<Vec<RemoteEntry>, StorageError> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| StorageError::Listing(format!("no such folder: {path}")))
        }
    }

    fn sample_tree() -> TreeLister {
        let mut tree = HashMap::new();
        tree.insert(
            String::new(),
            vec![
                RemoteEntry::file("a.txt", "a.txt"),
                RemoteEntry::directory("b", "b"),
                RemoteEntry::file("notes.md", "notes.md"),
            ],
        );
        tree.insert(
            "b".to_string(),
            vec![
                RemoteEntry::file("a.txt", "b/a.txt"),
                RemoteEntry::directory("c", "b/c"),
            ],
        );
        tree.insert("b/c".to_string(), vec![RemoteEntry::file("A.TXT", "b/c/A.TXT")]);
        TreeLister(tree)
    }

    #[test]
    fn test_name_matches_ignores_case() {
        assert!(name_matches("Report.PDF", "report"));
        assert!(name_matches("report.pdf", "PDF"));
        assert!(!name_matches("invoice.csv", "report"));
    }

    #[tokio::test]
    async fn test_finds_matches_at_every_depth() -> Result<(), StorageError> {
        let lister = sample_tree();

        let found = depth_first_search(&lister, "", "a").await?;
        let mut paths: Vec<_> = found.iter().map(|e| e.path.as_str()).collect();
        paths.sort_unstable();

        assert_eq!(paths, vec!["a.txt", "b/a.txt", "b/c/A.TXT"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_directories_are_never_results() -> Result<(), StorageError> {
        let lister = sample_tree();

        let found = depth_first_search(&lister, "", "b").await?;
        assert!(found.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_scoped_to_root_folder() -> Result<(), StorageError> {
        let lister = sample_tree();

        let found = depth_first_search(&lister, "b/c", "a").await?;
        assert_eq!(found, vec![RemoteEntry::file("A.TXT", "b/c/A.TXT")]);
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_error_propagates() {
        let lister = sample_tree();

        let result = depth_first_search(&lister, "missing", "a").await;
        assert!(matches!(result, Err(StorageError::Listing(_))));
    }
}
