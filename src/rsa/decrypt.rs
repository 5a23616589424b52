// RSA Decryption Implementation
// Private-key decryption with PKCS#1 v1.5 or OAEP padding, via CRT

use tracing::debug;
use zeroize::Zeroizing;

use super::bigint::{from_bytes, to_bytes_padded};
use super::encrypt::EncryptionScheme;
use super::key::RsaKey;
use super::padding::{oaep_decode, unpad_pkcs1_v15, Padding};
use crate::digest::DigestAlgorithm;
use crate::error::{CryptorError, Result};

/// Decrypt `ciphertext` with a private key.
///
/// Every failure after the parameter checks (wrong ciphertext length,
/// out-of-range value, bad padding, label mismatch) is reported as the same
/// decode error.
pub fn decrypt(
    key: &RsaKey,
    padding: Padding,
    ciphertext: &[u8],
    label: Option<&[u8]>,
    digest: DigestAlgorithm,
) -> Result<Vec<u8>> {
    debug!(?padding, ?digest, len = ciphertext.len(), "decrypt");
    let private = key.as_private().ok_or(CryptorError::Param)?;
    let scheme = EncryptionScheme::resolve(padding, digest)?;
    let k = private.size();

    if ciphertext.len() != k {
        return Err(CryptorError::Decode);
    }

    // Step 1: Compute m = c^d mod n (CRT)
    let m = private.private_op(&from_bytes(ciphertext))?;
    let em = Zeroizing::new(to_bytes_padded(&m, k)?);

    // Step 2: Remove padding
    let plaintext = match scheme {
        EncryptionScheme::Pkcs1 => unpad_pkcs1_v15(&em),
        EncryptionScheme::Oaep(info) => oaep_decode(&em, label.unwrap_or_default(), info),
    };
    plaintext.map_err(|_| {
        debug!("padding check failed");
        CryptorError::Decode
    })
}
