// Sample file decoding: one little-endian i16 reading per two bytes

use crate::core::constants::READING_SIZE;
use crate::core::error::{ProjectError, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Decode every complete reading in `path`.
///
/// A trailing odd byte is dropped. Any I/O failure fails the whole file.
pub fn decode_file(path: &Path) -> Result<Vec<i16>> {
    debug!("Reading .wav file at {}", path.display());

    let decode_err = |source| ProjectError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(decode_err)?;
    let capacity = file
        .metadata()
        .map(|m| m.len() as usize / READING_SIZE)
        .unwrap_or(0);

    let mut readings = Vec::with_capacity(capacity);
    decode_into(BufReader::new(file), &mut readings).map_err(decode_err)?;
    Ok(readings)
}

/// Decode readings from any byte stream, appending to `out`.
pub fn decode_into<R: Read>(mut reader: R, out: &mut Vec<i16>) -> std::io::Result<()> {
    let mut chunk = [0u8; READING_SIZE];
    loop {
        let filled = fill_chunk(&mut reader, &mut chunk)?;
        if filled < READING_SIZE {
            return Ok(());
        }
        out.push(i16::from_le_bytes(chunk));
    }
}

pub fn decode_bytes(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(READING_SIZE)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

// Keeps reading until the chunk is full or the stream ends; short reads are
// legal for `Read`, so a single call is not enough.
fn fill_chunk<R: Read>(reader: &mut R, chunk: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < chunk.len() {
        match reader.read(&mut chunk[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
