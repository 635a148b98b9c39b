use std::io::Read;
use std::path::Path;

use anyhow::Context;

use crate::object::ObjectKind;
use crate::store::ObjectStore;

/// `git hash-object [-w] [--stdin] <file>`. Returns the computed sha whether
/// or not `write` actually persisted it.
pub fn run(root: &Path, path: Option<&Path>, stdin: bool, write: bool) -> anyhow::Result<String> {
    let content = match (path, stdin) {
        (Some(path), false) => {
            std::fs::read(path).with_context(|| format!("reading '{}'", path.display()))?
        }
        (None, true) => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("reading stdin")?;
            buf
        }
        _ => anyhow::bail!("hash-object needs exactly one of a file path or --stdin"),
    };

    if write {
        let store = ObjectStore::new(super::git_dir(root).join("objects"));
        let sha = store.write(ObjectKind::Blob, &content).context("writing blob object")?;
        Ok(sha)
    } else {
        let envelope = crate::object::envelope(ObjectKind::Blob, &content);
        Ok(crate::codec::sha::sha1_hex(&envelope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn hashes_file_without_writing() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("greeting.txt");
        std::fs::write(&file, "hello").unwrap();

        let sha = run(dir.path(), Some(&file), false, false).unwrap();
        assert_eq!(sha, "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0");
        assert!(!dir.path().join(".git").exists());
    }

    #[test]
    fn writes_object_when_requested() {
        let dir = TempDir::new().unwrap();
        crate::refs::RefStore::new(super::super::git_dir(dir.path())).init().unwrap();
        let file = dir.path().join("greeting.txt");
        std::fs::write(&file, "hello").unwrap();

        let sha = run(dir.path(), Some(&file), false, true).unwrap();
        assert_eq!(sha, "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0");
        assert!(super::super::git_dir(dir.path()).join("objects/b6/fc4c620b67d95f953a5c1c1230aaab5db5a1b0").is_file());
    }
}
