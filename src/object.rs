use std::fmt;
use std::str::FromStr;

use crate::error::{GitError, Result};

/// The four object kinds a loose object or pack entry can carry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
            ObjectKind::Tag => "tag",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ObjectKind {
    type Err = GitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "blob" => Ok(ObjectKind::Blob),
            "tree" => Ok(ObjectKind::Tree),
            "commit" => Ok(ObjectKind::Commit),
            "tag" => Ok(ObjectKind::Tag),
            other => Err(GitError::Corrupt(format!("unknown object kind '{other}'"))),
        }
    }
}

impl ObjectKind {
    /// Maps a packfile object type code (bits 6-4 of the header byte) to a kind.
    pub fn from_pack_type_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(ObjectKind::Commit),
            2 => Ok(ObjectKind::Tree),
            3 => Ok(ObjectKind::Blob),
            4 => Ok(ObjectKind::Tag),
            other => Err(GitError::UnsupportedObject(format!(
                "unknown pack object type code {other}"
            ))),
        }
    }
}

/// Builds the `<kind> <len>\0<payload>` envelope whose SHA-1 is an object's identity.
pub fn envelope(kind: ObjectKind, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 16);
    out.extend_from_slice(kind.to_string().as_bytes());
    out.push(b' ');
    out.extend_from_slice(payload.len().to_string().as_bytes());
    out.push(0);
    out.extend_from_slice(payload);
    out
}

/// Splits an envelope back into its kind and payload, validating the
/// declared length against the actual payload length.
pub fn parse_envelope(bytes: &[u8]) -> Result<(ObjectKind, &[u8])> {
    let nul = bytes
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| GitError::Corrupt("object header has no NUL terminator".into()))?;

    let header = std::str::from_utf8(&bytes[..nul])
        .map_err(|_| GitError::Corrupt("object header is not valid UTF-8".into()))?;

    let (kind_str, size_str) = header
        .split_once(' ')
        .ok_or_else(|| GitError::Corrupt(format!("malformed object header '{header}'")))?;

    let kind: ObjectKind = kind_str.parse()?;
    let size: usize = size_str
        .parse()
        .map_err(|_| GitError::Corrupt(format!("non-decimal object length '{size_str}'")))?;

    let payload = &bytes[nul + 1..];
    if payload.len() != size {
        return Err(GitError::Corrupt(format!(
            "object declares length {size} but payload is {} bytes",
            payload.len()
        )));
    }

    Ok((kind, payload))
}

/// The file mode recognized in tree entries. Only five- and six-character
/// literal forms are ever emitted; there is no zero-padded encoding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TreeMode {
    Directory,
    RegularFile,
    ExecutableFile,
    Symlink,
}

impl TreeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreeMode::Directory => "40000",
            TreeMode::RegularFile => "100644",
            TreeMode::ExecutableFile => "100755",
            TreeMode::Symlink => "120000",
        }
    }

    pub fn parse(mode: &str) -> Result<Self> {
        match mode {
            "40000" => Ok(TreeMode::Directory),
            "100644" => Ok(TreeMode::RegularFile),
            "100755" => Ok(TreeMode::ExecutableFile),
            "120000" => Ok(TreeMode::Symlink),
            other => Err(GitError::Corrupt(format!("unrecognized tree mode '{other}'"))),
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, TreeMode::Directory)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: TreeMode,
    pub name: Vec<u8>,
    pub sha: [u8; 20],
}

/// Sort key for tree entries: the name, with a trailing `/` appended for
/// directories. Comparing bare names would make `"foo"` sort before
/// `"foo.txt"` even when `"foo"` is a directory that canonical git orders
/// after it (`"foo/"` > `"foo.txt"`).
pub fn tree_sort_key(name: &[u8], is_dir: bool) -> Vec<u8> {
    let mut key = name.to_vec();
    if is_dir {
        key.push(b'/');
    }
    key
}

/// Parses the payload of a tree object into its ordered entries.
pub fn parse_tree(payload: &[u8]) -> Result<Vec<TreeEntry>> {
    let mut entries = Vec::new();
    let mut rest = payload;

    while !rest.is_empty() {
        let space = rest
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| GitError::Corrupt("tree entry missing mode separator".into()))?;
        let mode_str = std::str::from_utf8(&rest[..space])
            .map_err(|_| GitError::Corrupt("tree entry mode is not valid UTF-8".into()))?;
        let mode = TreeMode::parse(mode_str)?;

        let after_mode = &rest[space + 1..];
        let nul = after_mode
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| GitError::Corrupt("tree entry missing name terminator".into()))?;
        let name = after_mode[..nul].to_vec();

        let after_name = &after_mode[nul + 1..];
        if after_name.len() < 20 {
            return Err(GitError::Corrupt("tree entry truncated before sha".into()));
        }
        let mut sha = [0u8; 20];
        sha.copy_from_slice(&after_name[..20]);

        entries.push(TreeEntry { mode, name, sha });
        rest = &after_name[20..];
    }

    Ok(entries)
}

/// Serializes tree entries back into payload bytes. Entries must already be
/// sorted by `tree_sort_key`; this function does not sort them, so the
/// caller (which already has the sort key data on hand) controls ordering.
pub fn serialize_tree(entries: &[TreeEntry]) -> Vec<u8> {
    let mut out = Vec::new();
    for entry in entries {
        out.extend_from_slice(entry.mode.as_str().as_bytes());
        out.push(b' ');
        out.extend_from_slice(&entry.name);
        out.push(0);
        out.extend_from_slice(&entry.sha);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub identity: Identity,
    pub timestamp: i64,
    pub tz_offset: String,
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.identity, self.timestamp, self.tz_offset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub tree: String,
    pub parents: Vec<String>,
    pub author: Stamp,
    pub committer: Stamp,
    pub message: Vec<u8>,
}

fn parse_stamp(line: &str) -> Result<Stamp> {
    let (name, rest) = line
        .split_once(" <")
        .ok_or_else(|| GitError::Corrupt(format!("malformed identity line '{line}'")))?;
    let (email, rest) = rest
        .split_once("> ")
        .ok_or_else(|| GitError::Corrupt(format!("malformed identity line '{line}'")))?;
    let (timestamp, tz_offset) = rest
        .rsplit_once(' ')
        .ok_or_else(|| GitError::Corrupt(format!("malformed identity line '{line}'")))?;
    let timestamp = timestamp
        .parse()
        .map_err(|_| GitError::Corrupt(format!("non-numeric timestamp in '{line}'")))?;

    Ok(Stamp {
        identity: Identity {
            name: name.to_string(),
            email: email.to_string(),
        },
        timestamp,
        tz_offset: tz_offset.to_string(),
    })
}

/// Parses a commit object's payload into its structured fields.
pub fn parse_commit(payload: &[u8]) -> Result<CommitInfo> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| GitError::Corrupt("commit payload is not valid UTF-8".into()))?;
    let (header, message) = text
        .split_once("\n\n")
        .ok_or_else(|| GitError::Corrupt("commit missing header/message separator".into()))?;

    let mut tree = None;
    let mut parents = Vec::new();
    let mut author = None;
    let mut committer = None;

    for line in header.lines() {
        let (key, value) = line
            .split_once(' ')
            .ok_or_else(|| GitError::Corrupt(format!("malformed commit header line '{line}'")))?;
        match key {
            "tree" => tree = Some(value.to_string()),
            "parent" => parents.push(value.to_string()),
            "author" => author = Some(parse_stamp(value)?),
            "committer" => committer = Some(parse_stamp(value)?),
            _ => {}
        }
    }

    Ok(CommitInfo {
        tree: tree.ok_or_else(|| GitError::Corrupt("commit missing tree line".into()))?,
        parents,
        author: author.ok_or_else(|| GitError::Corrupt("commit missing author line".into()))?,
        committer: committer
            .ok_or_else(|| GitError::Corrupt("commit missing committer line".into()))?,
        message: message.as_bytes().to_vec(),
    })
}

/// Builds commit payload bytes from already-resolved fields. Pure function
/// of its arguments: no wall-clock or environment reads happen here, which
/// is what makes two calls with identical inputs produce identical bytes.
pub fn build_commit_payload(
    tree: &str,
    parents: &[String],
    author: &Stamp,
    committer: &Stamp,
    message: &[u8],
) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(&format!("tree {tree}\n"));
    for parent in parents {
        out.push_str(&format!("parent {parent}\n"));
    }
    out.push_str(&format!("author {author}\n"));
    out.push_str(&format!("committer {committer}\n"));
    out.push('\n');

    let mut bytes = out.into_bytes();
    bytes.extend_from_slice(message);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_round_trips() {
        let env = envelope(ObjectKind::Blob, b"hello");
        let (kind, payload) = parse_envelope(&env).unwrap();
        assert_eq!(kind, ObjectKind::Blob);
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn rejects_length_mismatch() {
        let mut env = envelope(ObjectKind::Blob, b"hello");
        env.pop();
        assert!(parse_envelope(&env).is_err());
    }

    #[test]
    fn tree_round_trips_and_sorts() {
        let sha_a = [1u8; 20];
        let sha_b = [2u8; 20];
        let mut entries = vec![
            TreeEntry { mode: TreeMode::RegularFile, name: b"b".to_vec(), sha: sha_b },
            TreeEntry { mode: TreeMode::RegularFile, name: b"a".to_vec(), sha: sha_a },
        ];
        entries.sort_by(|x, y| {
            tree_sort_key(&x.name, x.mode.is_tree()).cmp(&tree_sort_key(&y.name, y.mode.is_tree()))
        });
        let payload = serialize_tree(&entries);
        let parsed = parse_tree(&payload).unwrap();
        assert_eq!(parsed[0].name, b"a");
        assert_eq!(parsed[1].name, b"b");
    }

    #[test]
    fn tree_sort_key_places_directory_after_same_prefix_file() {
        // "foo.txt" < "foo/" because '.' (0x2e) < '/' (0x2f)
        let file_key = tree_sort_key(b"foo.txt", false);
        let dir_key = tree_sort_key(b"foo", true);
        assert!(file_key < dir_key);
    }

    #[test]
    fn commit_round_trips() {
        let author = Stamp {
            identity: Identity { name: "A".into(), email: "a@example.com".into() },
            timestamp: 1000,
            tz_offset: "+0000".into(),
        };
        let committer = author.clone();
        let payload = build_commit_payload(
            "deadbeefdeadbeefdeadbeefdeadbeefdeadbeef",
            &[],
            &author,
            &committer,
            b"message\n",
        );
        let parsed = parse_commit(&payload).unwrap();
        assert_eq!(parsed.tree, "deadbeefdeadbeefdeadbeefdeadbeefdeadbeef");
        assert!(parsed.parents.is_empty());
        assert_eq!(parsed.author.identity.name, "A");
        assert_eq!(parsed.message, b"message\n");
    }

    #[test]
    fn commit_is_deterministic() {
        let author = Stamp {
            identity: Identity { name: "A".into(), email: "a@example.com".into() },
            timestamp: 1000,
            tz_offset: "+0000".into(),
        };
        let p1 = build_commit_payload("deadbeef", &[], &author, &author, b"msg\n");
        let p2 = build_commit_payload("deadbeef", &[], &author, &author, b"msg\n");
        assert_eq!(p1, p2);
    }
}
