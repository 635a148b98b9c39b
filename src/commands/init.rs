use std::path::Path;

use anyhow::Context;

use crate::refs::RefStore;

/// `git init`: creates the object/ref directories and HEAD under `root/.git`.
pub fn run(root: &Path) -> anyhow::Result<()> {
    let git_dir = super::git_dir(root);
    RefStore::new(&git_dir)
        .init()
        .with_context(|| format!("initializing git directory at '{}'", git_dir.display()))?;
    println!("Initialized git directory");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_expected_head_and_dirs() {
        let dir = TempDir::new().unwrap();
        run(dir.path()).unwrap();

        let head = std::fs::read_to_string(dir.path().join(".git/HEAD")).unwrap();
        assert_eq!(head, "ref: refs/heads/main\n");
        assert!(dir.path().join(".git/objects").is_dir());
        assert!(dir.path().join(".git/refs/heads").is_dir());
    }
}
