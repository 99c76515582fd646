use std::fmt;
use std::fs::File;
use std::hash::Hasher as _;
use std::io::{self, Read};
use std::path::Path;

use twox_hash::XxHash64;

const CHUNK_SIZE: usize = 64 * 1024; // 64KB

/// Content hash selection. `Strong` is the default; `Legacy` trades
/// collision resistance for speed and survives for old workflows that ask
/// for it by name in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Strong,
    Legacy,
}

impl HashAlgorithm {
    /// Maps the configured string onto an algorithm; anything unrecognized
    /// falls back to the strong default.
    pub fn from_config(name: &str) -> HashAlgorithm {
        match name.to_ascii_lowercase().as_str() {
            "legacy" => HashAlgorithm::Legacy,
            _ => HashAlgorithm::Strong,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Strong => write!(f, "blake3"),
            HashAlgorithm::Legacy => write!(f, "xxh64"),
        }
    }
}

/// Streams the file through the selected hasher in fixed-size chunks so
/// memory stays bounded no matter how large the file is. I/O failures
/// (permission denied, file vanished or locked mid-read) surface as errors
/// for the caller to absorb; they are never fatal to an enclosing job.
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut buffer = vec![0u8; CHUNK_SIZE];

    match algorithm {
        HashAlgorithm::Strong => {
            let mut hasher = blake3::Hasher::new();
            loop {
                let bytes_read = file.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
            }
            Ok(hasher.finalize().to_hex().to_string())
        }
        HashAlgorithm::Legacy => {
            let mut hasher = XxHash64::with_seed(0);
            loop {
                let bytes_read = file.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                hasher.write(&buffer[..bytes_read]);
            }
            Ok(format!("{:016x}", hasher.finish()))
        }
    }
}
