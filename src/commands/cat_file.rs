use std::io::Write;
use std::path::Path;

use anyhow::Context;

use crate::store::ObjectStore;

/// `git cat-file [-t|-s|-p] <object>`.
pub fn run(root: &Path, hash: &str, type_only: bool, size_only: bool) -> anyhow::Result<()> {
    let store = ObjectStore::new(super::git_dir(root).join("objects"));
    let (kind, payload) = store
        .read_verified(hash)
        .with_context(|| format!("reading object '{hash}'"))?;

    if type_only {
        println!("{kind}");
        return Ok(());
    }
    if size_only {
        println!("{}", payload.len());
        return Ok(());
    }

    std::io::stdout()
        .write_all(&payload)
        .context("writing object payload to stdout")?;
    Ok(())
}
