use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::delta::DeltaResolver;
use crate::object::{parse_commit, parse_tree, ObjectKind};
use crate::pack::PackReader;
use crate::protocol;
use crate::refs::RefStore;
use crate::store::ObjectStore;

/// `git clone <url> [<dir>]`: discovery → fetch → pack ingestion → ref
/// update → working-tree checkout.
pub fn run(url: &str, dest: Option<PathBuf>) -> anyhow::Result<()> {
    let url = url.trim_end_matches('/');

    let dest = match dest {
        Some(dest) => dest,
        None => PathBuf::from(default_dir_name(url)?),
    };

    let git_dir = super::git_dir(&dest);
    RefStore::new(&git_dir)
        .init()
        .with_context(|| format!("initializing git directory at '{}'", git_dir.display()))?;

    let client = reqwest::blocking::Client::new();

    log::info!("discovering refs at {url}");
    let discovery = protocol::discover(&client, url).context("discovering remote refs")?;

    let branch = discovery.default_branch().to_string();
    let want_sha = discovery
        .sha_for(&branch)
        .or_else(|| discovery.sha_for("HEAD"))
        .ok_or_else(|| anyhow::anyhow!("remote advertised no ref for '{branch}' or HEAD"))?
        .to_string();

    println!("Cloning into '{}'...", dest.display());

    log::info!("fetching pack for {want_sha}");
    let pack_bytes = protocol::fetch(&client, url, &want_sha).context("fetching packfile")?;

    let store = ObjectStore::new(git_dir.join("objects"));
    let mut reader = PackReader::new(&pack_bytes).context("parsing pack header")?;
    let declared = reader.declared_count();

    let mut resolver = DeltaResolver::new(&store);
    let mut ingested = 0u32;
    while let Some(event) = reader.next_event().context("reading pack object")? {
        resolver.ingest(event).context("resolving pack object")?;
        ingested += 1;
    }
    resolver.finish().context("checking pack completeness")?;
    log::info!("ingested {ingested}/{declared} pack objects");

    let refs = RefStore::new(&git_dir);
    refs.set_ref(&branch, &want_sha)?;
    refs.set_head_symbolic(&branch)?;

    let (kind, commit_payload) = store.read(&want_sha).context("reading fetched commit")?;
    anyhow::ensure!(kind == ObjectKind::Commit, "fetched ref does not point at a commit");
    let commit = parse_commit(&commit_payload)?;

    checkout_tree(&store, &commit.tree, &dest).context("checking out working tree")?;

    println!("Received objects: {ingested}");
    Ok(())
}

fn default_dir_name(url: &str) -> anyhow::Result<String> {
    let mut name = url
        .rsplit('/')
        .next()
        .ok_or_else(|| anyhow::anyhow!("could not determine a destination directory from '{url}'"))?
        .to_string();
    if let Some(stripped) = name.strip_suffix(".git") {
        name = stripped.to_string();
    }
    Ok(name)
}

fn checkout_tree(store: &ObjectStore, tree_sha: &str, dir: &Path) -> anyhow::Result<()> {
    let (kind, payload) = store.read(tree_sha)?;
    anyhow::ensure!(kind == ObjectKind::Tree, "'{tree_sha}' is not a tree");

    for entry in parse_tree(&payload)? {
        let name = std::ffi::OsStr::new(std::str::from_utf8(&entry.name)?);
        let path = dir.join(name);
        let child_sha = hex::encode(entry.sha);

        if entry.mode.is_tree() {
            std::fs::create_dir_all(&path)?;
            checkout_tree(store, &child_sha, &path)?;
        } else {
            let (_, blob) = store.read(&child_sha)?;
            std::fs::write(&path, &blob).with_context(|| format!("writing '{}'", path.display()))?;
        }
    }

    Ok(())
}
