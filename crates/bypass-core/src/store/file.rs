// # File Domain Store
//
// File-based implementation of DomainStore.
//
// ## File Format
//
// One domain per line, sorted, no trailing newline:
//
// ```text
// example.com
// example.org
// ```
//
// Blank lines and surrounding whitespace are ignored on read.
//
// ## Durability
//
// - Atomic writes: new content is written to a `.tmp` sibling, then renamed
// - Missing file: logged and treated as an empty whitelist

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::DomainStore;

/// File-based domain store
///
/// # Example
///
/// ```rust,no_run
/// use bypass_core::store::FileDomainStore;
/// use bypass_core::traits::{DomainStore, parse_domain_input};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileDomainStore::new("domain_whitelist.txt");
///     store.add_domains(&parse_domain_input("example.com")).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileDomainStore {
    path: PathBuf,
}

impl FileDomainStore {
    /// Create a store backed by `path`
    ///
    /// The file is not touched until the first read or write.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse file content into a domain set
    fn parse(content: &str) -> BTreeSet<String> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }
}

#[async_trait]
impl DomainStore for FileDomainStore {
    async fn read_all(&self) -> Result<BTreeSet<String>, Error> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => {
                let domains = Self::parse(&content);
                tracing::debug!(
                    "Loaded {} domain(s) from {}",
                    domains.len(),
                    self.path.display()
                );
                Ok(domains)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::error!("Domain whitelist {} not found", self.path.display());
                Ok(BTreeSet::new())
            }
            Err(e) => Err(Error::domain_store(format!(
                "Failed to read domain whitelist {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn write_all(&self, domains: &BTreeSet<String>) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::domain_store(format!(
                    "Failed to create whitelist directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = domains
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::domain_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(content.as_bytes()).await.map_err(|e| {
                Error::domain_store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::domain_store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::domain_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!(
            "Wrote {} domain(s) to {}",
            domains.len(),
            self.path.display()
        );
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::parse_domain_input;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = FileDomainStore::new(dir.path().join("missing.txt"));

        let domains = store.read_all().await.unwrap();
        assert!(domains.is_empty());
    }

    #[tokio::test]
    async fn test_write_is_sorted_and_persistent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("domain_whitelist.txt");
        let store = FileDomainStore::new(&path);

        assert!(
            store
                .add_domains(&parse_domain_input("zeta.com,alpha.com,mid.com"))
                .await
                .unwrap()
        );

        let content = fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "alpha.com\nmid.com\nzeta.com");

        // A fresh instance sees the same set
        let store2 = FileDomainStore::new(&path);
        assert_eq!(store2.read_all().await.unwrap().len(), 3);

        // Temp file does not linger
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_read_ignores_blank_lines_and_whitespace() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("domain_whitelist.txt");
        fs::write(&path, b"  example.com  \n\n\nexample.org\n   \n")
            .await
            .unwrap();

        let store = FileDomainStore::new(&path);
        let domains = store.read_all().await.unwrap();
        assert_eq!(domains.len(), 2);
        assert!(domains.contains("example.com"));
        assert!(domains.contains("example.org"));
    }

    #[tokio::test]
    async fn test_remove_rewrites_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("domain_whitelist.txt");
        let store = FileDomainStore::new(&path);

        store
            .add_domains(&parse_domain_input("a.com,b.com"))
            .await
            .unwrap();
        assert!(store.remove_domains(&parse_domain_input("a.com")).await.unwrap());
        assert!(!store.remove_domains(&parse_domain_input("a.com")).await.unwrap());

        let content = fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "b.com");
    }

    #[tokio::test]
    async fn test_write_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("dir").join("whitelist.txt");
        let store = FileDomainStore::new(&path);

        store
            .add_domains(&parse_domain_input("example.com"))
            .await
            .unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_unreadable_path_is_an_error() {
        let dir = tempdir().unwrap();
        // A directory cannot be read as a file
        let store = FileDomainStore::new(dir.path());

        let result = store.read_all().await;
        assert!(matches!(result, Err(Error::DomainStore(_))));
    }
}
