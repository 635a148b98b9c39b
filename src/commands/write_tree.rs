use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use anyhow::Context;

use crate::object::{serialize_tree, tree_sort_key, ObjectKind, TreeEntry, TreeMode};
use crate::store::ObjectStore;

/// `git write-tree`: hashes the working directory recursively, skipping
/// `.git`, and prints the resulting tree sha.
pub fn run(root: &Path) -> anyhow::Result<String> {
    let store = ObjectStore::new(super::git_dir(root).join("objects"));
    match write_tree_for(&store, root)? {
        Some(sha) => Ok(sha),
        None => anyhow::bail!("refusing to write a tree for an empty directory"),
    }
}

fn write_tree_for(store: &ObjectStore, dir: &Path) -> anyhow::Result<Option<String>> {
    let mut entries = Vec::new();

    for entry in std::fs::read_dir(dir).with_context(|| format!("reading '{}'", dir.display()))? {
        let entry = entry?;
        let file_name = entry.file_name();
        if file_name == ".git" {
            continue;
        }
        let metadata = entry.metadata()?;
        entries.push((entry.path(), file_name, metadata));
    }

    entries.sort_by(|a, b| {
        let a_key = tree_sort_key(a.1.as_encoded_bytes(), a.2.is_dir());
        let b_key = tree_sort_key(b.1.as_encoded_bytes(), b.2.is_dir());
        a_key.cmp(&b_key)
    });

    let mut tree_entries = Vec::new();
    for (path, file_name, metadata) in entries {
        let (mode, sha) = if metadata.is_dir() {
            match write_tree_for(store, &path)? {
                Some(sha) => (TreeMode::Directory, sha),
                None => continue,
            }
        } else if metadata.is_symlink() {
            let target = std::fs::read_link(&path)?;
            let sha = store.write(ObjectKind::Blob, target.as_os_str().as_encoded_bytes())?;
            (TreeMode::Symlink, sha)
        } else {
            let content = std::fs::read(&path).with_context(|| format!("reading '{}'", path.display()))?;
            let sha = store.write(ObjectKind::Blob, &content)?;
            let executable = metadata.permissions().mode() & 0o111 != 0;
            let mode = if executable { TreeMode::ExecutableFile } else { TreeMode::RegularFile };
            (mode, sha)
        };

        let mut sha_bytes = [0u8; 20];
        hex::decode_to_slice(&sha, &mut sha_bytes).context("tree child sha is not valid hex")?;
        tree_entries.push(TreeEntry { mode, name: file_name.as_encoded_bytes().to_vec(), sha: sha_bytes });
    }

    if tree_entries.is_empty() {
        return Ok(None);
    }

    let payload = serialize_tree(&tree_entries);
    let sha = store.write(ObjectKind::Tree, &payload)?;
    Ok(Some(sha))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sorts_entries_regardless_of_creation_order() {
        let dir = TempDir::new().unwrap();
        super::super::init::run(dir.path()).unwrap();
        std::fs::write(dir.path().join("b.txt"), b"b").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();

        let sha_one = run(dir.path()).unwrap();

        // Rebuilding from scratch (different physical creation order on disk
        // isn't controllable here, but re-running must still be deterministic).
        let sha_two = run(dir.path()).unwrap();
        assert_eq!(sha_one, sha_two);
    }

    #[test]
    fn empty_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        super::super::init::run(dir.path()).unwrap();
        let err = run(dir.path()).unwrap_err();
        assert!(err.to_string().contains("empty directory"));
    }
}
