use std::collections::HashMap;

use crate::codec::varint::read_size_varint;
use crate::error::{GitError, Result};
use crate::object::ObjectKind;
use crate::pack::PackEvent;
use crate::store::ObjectStore;

/// Applies a git delta program to `base_payload`, producing the target
/// object's bytes. `base_kind` passes through unchanged: a delta never
/// changes its base's object type.
///
/// The delta format starts with two size varints (base size, target size),
/// read here only to sanity-check against `base_payload`'s actual length;
/// the reconstructed bytes are what determine the result, not the declared
/// target size.
pub fn apply(base_kind: ObjectKind, base_payload: &[u8], delta: &[u8]) -> Result<(ObjectKind, Vec<u8>)> {
    let (base_size, rest) = read_size_varint(delta)?;
    if base_size != base_payload.len() {
        return Err(GitError::MalformedDelta(format!(
            "delta declares base size {base_size} but base is {} bytes",
            base_payload.len()
        )));
    }
    let (target_size, mut rest) = read_size_varint(rest)?;

    let mut out = Vec::with_capacity(target_size);

    while !rest.is_empty() {
        let opcode = rest[0];
        rest = &rest[1..];

        if opcode & 0x80 != 0 {
            // Copy instruction: offset and size are each encoded as the
            // subset of their bytes whose presence bit is set in opcode.
            let mut offset: usize = 0;
            for i in 0..4 {
                if opcode & (1 << i) != 0 {
                    let byte = *rest.first().ok_or_else(|| {
                        GitError::MalformedDelta("truncated copy offset".into())
                    })?;
                    offset |= (byte as usize) << (8 * i);
                    rest = &rest[1..];
                }
            }

            let mut size: usize = 0;
            for i in 0..3 {
                if opcode & (1 << (4 + i)) != 0 {
                    let byte = *rest.first().ok_or_else(|| {
                        GitError::MalformedDelta("truncated copy size".into())
                    })?;
                    size |= (byte as usize) << (8 * i);
                    rest = &rest[1..];
                }
            }
            if size == 0 {
                size = 0x10000;
            }

            let end = offset.checked_add(size).ok_or_else(|| {
                GitError::MalformedDelta("copy instruction overflows".into())
            })?;
            let slice = base_payload.get(offset..end).ok_or_else(|| {
                GitError::MalformedDelta(format!(
                    "copy instruction [{offset}, {end}) out of bounds for base of {} bytes",
                    base_payload.len()
                ))
            })?;
            out.extend_from_slice(slice);
        } else if opcode != 0 {
            // Insert instruction: opcode itself is the literal byte count.
            let count = opcode as usize;
            let literal = rest.get(..count).ok_or_else(|| {
                GitError::MalformedDelta("truncated insert literal".into())
            })?;
            out.extend_from_slice(literal);
            rest = &rest[count..];
        } else {
            return Err(GitError::MalformedDelta("reserved 0x00 delta opcode".into()));
        }
    }

    if out.len() != target_size {
        return Err(GitError::MalformedDelta(format!(
            "delta produced {} bytes but declared target size {target_size}",
            out.len()
        )));
    }

    Ok((base_kind, out))
}

/// Consumes a stream of `PackEvent`s and materializes every object into an
/// `ObjectStore`, resolving ref-deltas whose base may arrive either before
/// or after them in the pack. Deltas referencing a not-yet-seen base are
/// queued under that base's sha; writing the base drains and resolves any
/// deltas waiting on it, which may itself unblock further deltas chained
/// against the newly written object.
pub struct DeltaResolver<'s> {
    store: &'s ObjectStore,
    pending: HashMap<String, Vec<Vec<u8>>>,
}

impl<'s> DeltaResolver<'s> {
    pub fn new(store: &'s ObjectStore) -> Self {
        Self { store, pending: HashMap::new() }
    }

    pub fn ingest(&mut self, event: PackEvent) -> Result<()> {
        match event {
            PackEvent::Base { kind, payload } => self.resolve_and_drain(kind, payload),
            PackEvent::RefDelta { base_sha, delta } => {
                if self.store.exists(&base_sha) {
                    let (kind, payload) = self.store.read(&base_sha)?;
                    let (target_kind, target_payload) = apply(kind, &payload, &delta)?;
                    self.resolve_and_drain(target_kind, target_payload)
                } else {
                    self.pending.entry(base_sha).or_default().push(delta);
                    Ok(())
                }
            }
        }
    }

    fn resolve_and_drain(&mut self, kind: ObjectKind, payload: Vec<u8>) -> Result<()> {
        let sha = self.store.write(kind, &payload)?;

        let mut queue = vec![(sha, kind, payload)];
        while let Some((sha, kind, payload)) = queue.pop() {
            if let Some(waiting) = self.pending.remove(&sha) {
                for delta in waiting {
                    let (target_kind, target_payload) = apply(kind, &payload, &delta)?;
                    let target_sha = self.store.write(target_kind, &target_payload)?;
                    queue.push((target_sha, target_kind, target_payload));
                }
            }
        }
        Ok(())
    }

    /// Must be called once the pack stream is exhausted. Any deltas still
    /// queued reference a base that never appeared in the pack.
    pub fn finish(self) -> Result<()> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(GitError::UnresolvedDeltas(self.pending.values().map(Vec::len).sum()))
        }
    }
}
