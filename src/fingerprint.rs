//! Content-addressed fingerprints for uploaded documents.
//!
//! The fingerprint is the dedup key for the whole system: identical
//! bytes under different filenames collapse to one attachment and one
//! ingestion in the reasoning service.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// SHA-256 over the full byte stream, hex-encoded. Reads 1 MiB chunks
/// so a large upload is never held in memory for hashing.
pub fn fingerprint_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 1024 * 1024];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// In-memory variant for payloads that are already buffered.
pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
