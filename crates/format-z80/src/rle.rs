//! The `.Z80` run-length codec.
//!
//! `ED ED nn vv` expands to `nn` copies of `vv`. Every other byte is a
//! literal, including a lone `ED`. The run `ED ED 00 00` marks the end of a
//! version 1 memory block and stops decoding even if input remains.

use thiserror::Error;

const ESCAPE: u8 = 0xED;

/// Shortest run the compressor encodes, except for runs of `ED` itself.
const MIN_RUN: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RleError {
    #[error("RLE run header truncated at input offset {0}")]
    TruncatedRun(usize),
}

/// Expand a compressed block.
pub fn decompress(src: &[u8]) -> Result<Vec<u8>, RleError> {
    let mut out = Vec::with_capacity(src.len() * 2);
    let mut si = 0;

    while si < src.len() {
        if src[si] == ESCAPE && src.get(si + 1) == Some(&ESCAPE) {
            let (Some(&count), Some(&value)) = (src.get(si + 2), src.get(si + 3)) else {
                return Err(RleError::TruncatedRun(si));
            };
            if count == 0 && value == 0 {
                break;
            }
            out.resize(out.len() + usize::from(count), value);
            si += 4;
        } else {
            out.push(src[si]);
            si += 1;
        }
    }

    Ok(out)
}

/// Compress a block. Never emits the end marker.
#[must_use]
pub fn compress(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len());
    let mut i = 0;

    while i < src.len() {
        let value = src[i];
        let run = src[i..]
            .iter()
            .take(255)
            .take_while(|&&b| b == value)
            .count();

        if run >= MIN_RUN || (value == ESCAPE && run >= 2) {
            out.extend_from_slice(&[ESCAPE, ESCAPE, run as u8, value]);
            i += run;
        } else if value == ESCAPE {
            // A literal ED must not be directly followed by a run header, so
            // the next byte always goes out as a literal too.
            out.push(ESCAPE);
            i += 1;
            if let Some(&next) = src.get(i) {
                out.push(next);
                i += 1;
            }
        } else {
            out.push(value);
            i += 1;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_expands() {
        let out = decompress(&[0xED, 0xED, 0x05, 0x7A]).expect("decompress should succeed");
        assert_eq!(out, vec![0x7A; 5]);
    }

    #[test]
    fn end_marker_stops_decoding() {
        let out = decompress(&[0x01, 0xED, 0xED, 0x00, 0x00, 0x02, 0x03])
            .expect("decompress should succeed");
        assert_eq!(out, vec![0x01]);

        let out = decompress(&[0xED, 0xED, 0x00, 0x00, 0xFF]).expect("decompress should succeed");
        assert!(out.is_empty());
    }

    #[test]
    fn lone_ed_is_literal() {
        let out = decompress(&[0xED, 0x55, 0x66, 0xED]).expect("decompress should succeed");
        assert_eq!(out, vec![0xED, 0x55, 0x66, 0xED]);
    }

    #[test]
    fn zero_count_run_with_nonzero_value_is_empty() {
        let out = decompress(&[0xED, 0xED, 0x00, 0x07, 0x09]).expect("decompress should succeed");
        assert_eq!(out, vec![0x09]);
    }

    #[test]
    fn truncated_run_header_fails() {
        assert_eq!(decompress(&[0x00, 0xED, 0xED]), Err(RleError::TruncatedRun(1)));
        assert_eq!(decompress(&[0xED, 0xED, 0x04]), Err(RleError::TruncatedRun(0)));
    }

    #[test]
    fn compressor_encodes_long_runs_only() {
        assert_eq!(compress(&[1, 1, 1, 1]), vec![1, 1, 1, 1]);
        assert_eq!(compress(&[2; 6]), vec![0xED, 0xED, 6, 2]);
    }

    #[test]
    fn compressor_escapes_ed_pairs() {
        assert_eq!(compress(&[0xED, 0xED]), vec![0xED, 0xED, 2, 0xED]);
        // Lone ED followed by a run: the first run byte is taken literally.
        assert_eq!(
            compress(&[0xED, 0, 0, 0, 0, 0, 0]),
            vec![0xED, 0, 0xED, 0xED, 5, 0]
        );
    }

    #[test]
    fn compressed_page_expands_to_original() {
        let mut page = vec![0u8; 0x4000];
        page[100..400].fill(0xED);
        page[1000] = 0xED;
        page[1001] = 0xED;
        page[5000..5003].copy_from_slice(&[0xED, 0x00, 0x00]);
        for (i, byte) in page[8000..9000].iter_mut().enumerate() {
            *byte = i as u8;
        }

        let packed = compress(&page);
        assert!(packed.len() < page.len());
        assert_eq!(decompress(&packed).expect("decompress should succeed"), page);
    }
}
