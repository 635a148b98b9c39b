use std::path::PathBuf;

use crate::error::Result;

/// The parsed contents of `.git/HEAD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadRef {
    Symbolic(String),
    Detached(String),
}

/// HEAD and `refs/heads/*` management rooted at a repository's `.git` directory.
pub struct RefStore {
    git_dir: PathBuf,
}

impl RefStore {
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        Self { git_dir: git_dir.into() }
    }

    /// Creates `.git/objects`, `.git/refs/{heads,tags}`, and HEAD pointing at
    /// `refs/heads/main` — the spec's canonical default branch name.
    pub fn init(&self) -> Result<()> {
        std::fs::create_dir_all(self.git_dir.join("objects"))?;
        std::fs::create_dir_all(self.git_dir.join("refs").join("heads"))?;
        std::fs::create_dir_all(self.git_dir.join("refs").join("tags"))?;
        self.set_head_symbolic("refs/heads/main")?;
        Ok(())
    }

    pub fn set_head_symbolic(&self, ref_path: &str) -> Result<()> {
        std::fs::write(self.git_dir.join("HEAD"), format!("ref: {ref_path}\n"))?;
        Ok(())
    }

    pub fn set_head_detached(&self, sha: &str) -> Result<()> {
        std::fs::write(self.git_dir.join("HEAD"), format!("{sha}\n"))?;
        Ok(())
    }

    /// Writes `<sha>\n` to `ref_path` (e.g. `refs/heads/main`), creating
    /// parent directories lazily.
    pub fn set_ref(&self, ref_path: &str, sha: &str) -> Result<()> {
        let full = self.git_dir.join(ref_path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(full, format!("{sha}\n"))?;
        Ok(())
    }

    pub fn read_head(&self) -> Result<HeadRef> {
        let contents = std::fs::read_to_string(self.git_dir.join("HEAD"))?;
        let trimmed = contents.trim_end_matches('\n');
        Ok(match trimmed.strip_prefix("ref: ") {
            Some(target) => HeadRef::Symbolic(target.to_string()),
            None => HeadRef::Detached(trimmed.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_writes_expected_head() {
        let dir = TempDir::new().unwrap();
        let git_dir = dir.path().join(".git");
        let refs = RefStore::new(&git_dir);
        refs.init().unwrap();

        let head = std::fs::read_to_string(git_dir.join("HEAD")).unwrap();
        assert_eq!(head, "ref: refs/heads/main\n");
        assert!(git_dir.join("objects").is_dir());
        assert!(git_dir.join("refs").join("heads").is_dir());
        assert!(git_dir.join("refs").join("tags").is_dir());
    }

    #[test]
    fn set_ref_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let refs = RefStore::new(dir.path());
        refs.set_ref("refs/heads/feature/x", "a".repeat(40).as_str()).unwrap();
        let contents = std::fs::read_to_string(dir.path().join("refs/heads/feature/x")).unwrap();
        assert_eq!(contents, format!("{}\n", "a".repeat(40)));
    }

    #[test]
    fn reads_symbolic_and_detached_head() {
        let dir = TempDir::new().unwrap();
        let refs = RefStore::new(dir.path());
        refs.set_head_symbolic("refs/heads/main").unwrap();
        assert_eq!(refs.read_head().unwrap(), HeadRef::Symbolic("refs/heads/main".into()));

        refs.set_head_detached(&"b".repeat(40)).unwrap();
        assert_eq!(refs.read_head().unwrap(), HeadRef::Detached("b".repeat(40)));
    }
}
