// RSA Encryption Implementation
// Public-key encryption with PKCS#1 v1.5 or OAEP padding

use rand::thread_rng;
use tracing::debug;

use super::bigint::{from_bytes, to_bytes_padded};
use super::key::RsaKey;
use super::padding::{oaep_encode, pad_pkcs1_v15, Padding};
use crate::digest::{digest_info, DigestAlgorithm, DigestInfo};
use crate::error::{CryptorError, Result};

/// Encryption padding resolved from the caller's padding tag and digest
#[derive(Clone, Copy, Debug)]
pub(crate) enum EncryptionScheme {
    Pkcs1,
    Oaep(&'static DigestInfo),
}

impl EncryptionScheme {
    /// Only PKCS#1 v1.5 and OAEP over a digest from the descriptor table are
    /// supported; the digest is ignored for PKCS#1.
    pub(crate) fn resolve(padding: Padding, digest: DigestAlgorithm) -> Result<Self> {
        match padding {
            Padding::Pkcs1 => Ok(EncryptionScheme::Pkcs1),
            Padding::Oaep => digest_info(digest)
                .map(EncryptionScheme::Oaep)
                .ok_or(CryptorError::Param),
            _ => Err(CryptorError::Param),
        }
    }
}

/// Encrypt `plaintext` with a public key.
///
/// The result is exactly the key size in bytes. `label` is only used by
/// OAEP and defaults to empty. A private key is a parameter error; a
/// message that does not fit is a decode error.
pub fn encrypt(
    key: &RsaKey,
    padding: Padding,
    plaintext: &[u8],
    label: Option<&[u8]>,
    digest: DigestAlgorithm,
) -> Result<Vec<u8>> {
    debug!(?padding, ?digest, len = plaintext.len(), "encrypt");
    let public = key.as_public().ok_or(CryptorError::Param)?;
    let scheme = EncryptionScheme::resolve(padding, digest)?;
    let k = public.size();
    let mut rng = thread_rng();

    // Step 1: Apply padding
    let em = match scheme {
        EncryptionScheme::Pkcs1 => pad_pkcs1_v15(plaintext, k, &mut rng)?,
        EncryptionScheme::Oaep(info) => {
            oaep_encode(plaintext, label.unwrap_or_default(), info, k, &mut rng)?
        }
    };

    // Step 2: Compute c = m^e mod n
    let c = public.public_op(&from_bytes(&em))?;

    // Step 3: Left-pad to the key size
    Ok(to_bytes_padded(&c, k)?)
}
