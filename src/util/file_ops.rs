// File Operations for Key and Data Files
// Handles reading and writing of DER key files and operation inputs

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

use thiserror::Error;

use crate::error::CryptorError;
use crate::rsa::{import, RsaKey};

/// Errors that can occur during file operations
#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("file too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    #[error("key error: {0}")]
    Key(#[from] CryptorError),
}

/// Result type for file operations
pub type FileResult<T> = Result<T, FileError>;

/// Configuration for reading operation inputs
#[derive(Clone, Debug)]
pub struct FileConfig {
    /// Largest input file accepted, in bytes
    pub max_input_size: u64,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            max_input_size: 64 * 1024 * 1024,
        }
    }
}

impl FileConfig {
    pub fn with_max_input_size(mut self, size: u64) -> Self {
        self.max_input_size = size;
        self
    }

    /// Read entire file into memory, refusing files above the limit
    pub fn read_file(&self, path: &Path) -> FileResult<Vec<u8>> {
        let size = get_file_size(path)?;
        if size > self.max_input_size {
            return Err(FileError::TooLarge {
                size,
                limit: self.max_input_size,
            });
        }
        let mut file = File::open(path)?;
        let mut data = Vec::with_capacity(size as usize);
        file.read_to_end(&mut data)?;
        Ok(data)
    }
}

/// Write data to file
pub fn write_file(path: &Path, data: &[u8]) -> FileResult<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    Ok(())
}

/// Write data readable by the owner only (private key files)
pub fn write_secret_file(path: &Path, data: &[u8]) -> FileResult<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(data)?;
    Ok(())
}

/// Load a PKCS#1 DER key file
pub fn read_key(path: &Path) -> FileResult<RsaKey> {
    let data = zeroize::Zeroizing::new(fs::read(path)?);
    Ok(import(&data)?)
}

/// Store a key as PKCS#1 DER. Private keys get owner-only permissions.
pub fn write_key(path: &Path, key: &RsaKey) -> FileResult<()> {
    let encoded = zeroize::Zeroizing::new(key.export()?);
    match key {
        RsaKey::Private(_) => write_secret_file(path, &encoded),
        RsaKey::Public(_) => write_file(path, &encoded),
    }
}

/// Get file size in bytes
pub fn get_file_size(path: &Path) -> FileResult<u64> {
    let metadata = fs::metadata(path)?;
    Ok(metadata.len())
}

/// Format file size for display
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsa::bigint::from_u64;
    use crate::rsa::key::RsaPrivateKey;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rsa_cryptor_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_key_file_round_trip() {
        let key: RsaKey = RsaPrivateKey::from_primes(&from_u64(61), &from_u64(53), &from_u64(17), 64)
            .unwrap()
            .into();
        let path = temp_path("key.der");

        write_key(&path, &key).unwrap();
        let loaded = read_key(&path).unwrap();
        assert_eq!(loaded.export().unwrap(), key.export().unwrap());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_read_file_limit() {
        let path = temp_path("data.bin");
        write_file(&path, &[1u8; 100]).unwrap();

        let config = FileConfig::default().with_max_input_size(10);
        assert!(matches!(
            config.read_file(&path),
            Err(FileError::TooLarge { size: 100, limit: 10 })
        ));
        assert_eq!(FileConfig::default().read_file(&path).unwrap().len(), 100);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_bad_key_file() {
        let path = temp_path("garbage.der");
        write_file(&path, b"not a key").unwrap();
        assert!(matches!(read_key(&path), Err(FileError::Key(CryptorError::Decode))));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(2048), "2.00 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024), "3.00 MB");
    }
}
