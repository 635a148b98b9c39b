use std::path::{Path, PathBuf};

use crate::codec::zlib::{zlib_compress, zlib_decompress_stream};
use crate::error::{GitError, Result};
use crate::object::{envelope, parse_envelope, ObjectKind};

/// A loose-object database rooted at a repository's `objects/` directory.
///
/// Reads and writes are keyed by hex SHA-1, fanned out into a two-character
/// directory plus a 38-character filename, matching the teacher's
/// `ObjectFile::hash_to_path` layout but decoupled from any single open file
/// handle so the store can be reused across `write-tree`'s recursive calls.
pub struct ObjectStore {
    objects_dir: PathBuf,
}

impl ObjectStore {
    pub fn new(objects_dir: impl Into<PathBuf>) -> Self {
        Self { objects_dir: objects_dir.into() }
    }

    pub fn path_for(&self, sha: &str) -> PathBuf {
        self.objects_dir.join(&sha[..2]).join(&sha[2..])
    }

    pub fn exists(&self, sha: &str) -> bool {
        self.path_for(sha).is_file()
    }

    /// Reads and decompresses the object named by `sha`, without re-checking
    /// that its envelope hashes back to `sha` (the spec's hot-path carve-out).
    pub fn read(&self, sha: &str) -> Result<(ObjectKind, Vec<u8>)> {
        let path = self.path_for(sha);
        let compressed = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => GitError::NotFound(sha.to_string()),
            _ => GitError::Io(e),
        })?;

        let (raw, _consumed) = zlib_decompress_stream(&compressed)?;
        let (kind, payload) = parse_envelope(&raw)?;
        Ok((kind, payload.to_vec()))
    }

    /// Like `read`, but also verifies the envelope's SHA-1 matches `sha`.
    pub fn read_verified(&self, sha: &str) -> Result<(ObjectKind, Vec<u8>)> {
        let path = self.path_for(sha);
        let compressed = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => GitError::NotFound(sha.to_string()),
            _ => GitError::Io(e),
        })?;

        let (raw, _consumed) = zlib_decompress_stream(&compressed)?;
        if crate::codec::sha::sha1_hex(&raw) != sha {
            return Err(GitError::Corrupt(format!("object {sha} hashes to a different sha")));
        }
        let (kind, payload) = parse_envelope(&raw)?;
        Ok((kind, payload.to_vec()))
    }

    /// Writes `payload` as an object of kind `kind`, returning its sha.
    ///
    /// If an object at the resulting path already exists, the write is
    /// skipped entirely (idempotent, content-addressed storage). Otherwise
    /// the compressed bytes land in a temp file in the same directory and
    /// are renamed into place, so a concurrent reader never observes a
    /// partially written object.
    pub fn write(&self, kind: ObjectKind, payload: &[u8]) -> Result<String> {
        let raw = envelope(kind, payload);
        let sha = crate::codec::sha::sha1_hex(&raw);
        let path = self.path_for(&sha);

        if path.is_file() {
            return Ok(sha);
        }

        let dir = path.parent().expect("fan-out path always has a parent");
        std::fs::create_dir_all(dir)?;

        let compressed = zlib_compress(&raw);
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::io::Write::write_all(&mut tmp, &compressed)?;
        tmp.persist(&path).map_err(|e| GitError::Io(e.error))?;

        Ok(sha)
    }

    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }
}
