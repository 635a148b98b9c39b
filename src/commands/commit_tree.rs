use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;

use crate::object::{build_commit_payload, ObjectKind, Stamp};
use crate::store::ObjectStore;
use crate::{config, error::GitError};

/// `git commit-tree <tree> [-p <parent>]... -m <message>`.
///
/// Resolves identity and wall-clock time here, at the CLI boundary, then
/// hands them to `build_commit_payload` as plain arguments so that function
/// stays a pure, deterministic transform — the fix for the source's habit
/// of reading `SystemTime::now()` from inside core commit-building logic.
pub fn run(root: &Path, tree: &str, parents: &[String], message: &str) -> anyhow::Result<String> {
    let store = ObjectStore::new(super::git_dir(root).join("objects"));
    if !store.exists(tree) {
        return Err(GitError::NotFound(tree.to_string())).context("tree object does not exist");
    }

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("current system time is before the unix epoch")?
        .as_secs() as i64;
    let tz_offset = local_tz_offset();

    let author = Stamp { identity: config::author_identity(), timestamp, tz_offset: tz_offset.clone() };
    let committer = Stamp { identity: config::committer_identity(), timestamp, tz_offset };

    let payload = build_commit_payload(tree, parents, &author, &committer, message.as_bytes());
    let sha = store.write(ObjectKind::Commit, &payload)?;
    Ok(sha)
}

/// `+0000` unless the environment names a fixed offset; the core never
/// queries the OS timezone database directly.
fn local_tz_offset() -> String {
    std::env::var("GIT_COMMIT_TZ_OFFSET").unwrap_or_else(|_| "+0000".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn rejects_missing_tree() {
        let dir = TempDir::new().unwrap();
        crate::refs::RefStore::new(super::super::git_dir(dir.path())).init().unwrap();
        let err = run(dir.path(), &"0".repeat(40), &[], "msg").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn commits_an_existing_tree() {
        let dir = TempDir::new().unwrap();
        crate::refs::RefStore::new(super::super::git_dir(dir.path())).init().unwrap();
        let store = ObjectStore::new(super::super::git_dir(dir.path()).join("objects"));
        let tree_sha = store.write(ObjectKind::Tree, b"").unwrap();

        let sha = run(dir.path(), &tree_sha, &[], "initial commit\n").unwrap();
        assert_eq!(sha.len(), 40);
        let (kind, _) = store.read(&sha).unwrap();
        assert_eq!(kind, ObjectKind::Commit);
    }
}
