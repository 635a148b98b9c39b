use std::path::Path;

use anyhow::Context;

use crate::error::GitError;
use crate::object::{parse_tree, ObjectKind};
use crate::store::ObjectStore;

/// `git ls-tree [--name-only] <tree-ish>`. Entries print in stored (already
/// name-sorted) order; no recursion — that's a distinct `-r` feature the
/// expanded spec does not ask for.
pub fn run(root: &Path, hash: &str, name_only: bool) -> anyhow::Result<()> {
    let store = ObjectStore::new(super::git_dir(root).join("objects"));
    let (kind, payload) = store.read(hash).with_context(|| format!("reading '{hash}'"))?;
    if kind != ObjectKind::Tree {
        return Err(GitError::UsageError(format!("object '{hash}' is not a tree")).into());
    }

    for entry in parse_tree(&payload)? {
        let name = String::from_utf8_lossy(&entry.name);
        if name_only {
            println!("{name}");
        } else {
            let entry_kind = if entry.mode.is_tree() { ObjectKind::Tree } else { ObjectKind::Blob };
            println!(
                "{:0>6} {} {}\t{}",
                entry.mode.as_str(),
                entry_kind,
                hex::encode(entry.sha),
                name
            );
        }
    }

    Ok(())
}
