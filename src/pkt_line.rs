use crate::error::{GitError, Result};

pub const FLUSH_PKT: &[u8] = b"0000";
pub const DELIM_PKT: &[u8] = b"0001";

/// Encodes a single pkt-line: a 4-hex-digit length (counting the 4 header
/// bytes themselves) followed by `payload` verbatim.
///
/// This computes the length from `payload.len()` rather than using a
/// hand-written literal hex prefix, which is the fix for the source's habit
/// of baking `"0032want ..."`-style constants directly into request bodies —
/// any one-character drift in the payload silently desyncs the framing.
pub fn encode_line(payload: &[u8]) -> Vec<u8> {
    let len = payload.len() + 4;
    let mut out = format!("{len:04x}").into_bytes();
    out.extend_from_slice(payload);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PktLine<'a> {
    Flush,
    Delim,
    Data(&'a [u8]),
}

/// Streams pkt-lines out of a byte buffer using true length-prefixed
/// framing — never splitting on `\n`, since pack/sideband payloads may
/// legitimately contain newline bytes.
pub struct PktLineReader<'a> {
    rest: &'a [u8],
}

impl<'a> PktLineReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { rest: bytes }
    }

    pub fn next(&mut self) -> Result<Option<PktLine<'a>>> {
        if self.rest.is_empty() {
            return Ok(None);
        }

        let len_field = self
            .rest
            .get(..4)
            .ok_or_else(|| GitError::ProtocolError("truncated pkt-line length".into()))?;
        let len_str = std::str::from_utf8(len_field)
            .map_err(|_| GitError::ProtocolError("non-hex pkt-line length".into()))?;
        let len = usize::from_str_radix(len_str, 16)
            .map_err(|_| GitError::ProtocolError(format!("invalid pkt-line length '{len_str}'")))?;

        match len {
            0 => {
                self.rest = &self.rest[4..];
                Ok(Some(PktLine::Flush))
            }
            1 => {
                self.rest = &self.rest[4..];
                Ok(Some(PktLine::Delim))
            }
            2 => Err(GitError::ProtocolError("response-end pkt-line is not supported".into())),
            len if len < 4 => Err(GitError::ProtocolError(format!("invalid pkt-line length {len}"))),
            len => {
                let data = self
                    .rest
                    .get(4..len)
                    .ok_or_else(|| GitError::ProtocolError("pkt-line shorter than declared length".into()))?;
                self.rest = &self.rest[len..];
                Ok(Some(PktLine::Data(data)))
            }
        }
    }

    pub fn remaining(&self) -> &'a [u8] {
        self.rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_length_prefix() {
        let line = encode_line(b"want abc\n");
        assert_eq!(&line[..4], b"000d");
        assert_eq!(&line[4..], b"want abc\n");
    }

    #[test]
    fn reads_data_flush_and_delim() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&encode_line(b"hello\n"));
        buf.extend_from_slice(DELIM_PKT);
        buf.extend_from_slice(&encode_line(b"world\n"));
        buf.extend_from_slice(FLUSH_PKT);

        let mut reader = PktLineReader::new(&buf);
        assert_eq!(reader.next().unwrap(), Some(PktLine::Data(b"hello\n")));
        assert_eq!(reader.next().unwrap(), Some(PktLine::Delim));
        assert_eq!(reader.next().unwrap(), Some(PktLine::Data(b"world\n")));
        assert_eq!(reader.next().unwrap(), Some(PktLine::Flush));
        assert_eq!(reader.next().unwrap(), None);
    }

    #[test]
    fn tolerates_newlines_inside_payload() {
        let payload = b"line one\nline two\n";
        let buf = encode_line(payload);
        let mut reader = PktLineReader::new(&buf);
        assert_eq!(reader.next().unwrap(), Some(PktLine::Data(payload.as_slice())));
    }

    #[test]
    fn rejects_truncated_length() {
        let mut reader = PktLineReader::new(b"00");
        assert!(reader.next().is_err());
    }
}
