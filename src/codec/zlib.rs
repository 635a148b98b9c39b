use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use std::io::Write;

use crate::error::{GitError, Result};

/// Decompresses a zlib stream that begins at `input[0]`, returning the
/// decompressed payload and the number of *input* bytes actually consumed.
///
/// Packfile object records give no length for their compressed bytes, so a
/// one-shot decompressor (like `flate2::read::ZlibDecoder` wrapping a known
/// byte range) can't tell the caller where the next record starts. This
/// drives the low-level `Decompress` stream directly, in fixed-size chunks,
/// until it reports `StreamEnd`.
pub fn zlib_decompress_stream(input: &[u8]) -> Result<(Vec<u8>, usize)> {
    let mut decompress = Decompress::new(true);
    let mut output = Vec::new();
    let mut out_chunk = vec![0u8; 32 * 1024];

    loop {
        let before_in = decompress.total_in();
        let before_out = decompress.total_out();

        let status = decompress
            .decompress(&input[before_in as usize..], &mut out_chunk, FlushDecompress::None)
            .map_err(|e| GitError::Corrupt(format!("zlib stream error: {e}")))?;

        let produced = (decompress.total_out() - before_out) as usize;
        output.extend_from_slice(&out_chunk[..produced]);

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                let consumed_this_round = decompress.total_in() - before_in;
                if produced == 0 && consumed_this_round == 0 {
                    return Err(GitError::Corrupt(
                        "zlib stream ended without StreamEnd marker".into(),
                    ));
                }
            }
        }

        if decompress.total_in() as usize >= input.len() && status != Status::StreamEnd {
            return Err(GitError::Corrupt("truncated zlib stream".into()));
        }
    }

    Ok((output, decompress.total_in() as usize))
}

/// Compresses `input` at the default compression level, matching the bytes a
/// loose object or packfile record would carry on disk / on the wire.
pub fn zlib_compress(input: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(input).expect("writing to an in-memory encoder cannot fail");
    encoder.finish().expect("finishing an in-memory encoder cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_bytes() {
        let original = b"the quick brown fox jumps over the lazy dog".repeat(50);
        let compressed = zlib_compress(&original);
        let (decompressed, consumed) = zlib_decompress_stream(&compressed).unwrap();
        assert_eq!(decompressed, original);
        assert_eq!(consumed, compressed.len());
    }

    #[test]
    fn reports_unused_tail_bytes() {
        let payload = b"blob 5\0hello";
        let compressed = zlib_compress(payload);
        let mut with_tail = compressed.clone();
        with_tail.extend_from_slice(b"NEXTOBJECTBYTES");

        let (decompressed, consumed) = zlib_decompress_stream(&with_tail).unwrap();
        assert_eq!(decompressed, payload);
        assert_eq!(consumed, compressed.len());
        assert_eq!(&with_tail[consumed..], b"NEXTOBJECTBYTES");
    }

    #[test]
    fn rejects_truncated_stream() {
        let compressed = zlib_compress(b"some data that compresses to more than one byte");
        let truncated = &compressed[..compressed.len() - 4];
        assert!(zlib_decompress_stream(truncated).is_err());
    }
}
