// RSA Signatures
// PKCS#1 v1.5 signing and verification of precomputed digests

use subtle::ConstantTimeEq;
use tracing::debug;

use super::bigint::{from_bytes, to_bytes_padded};
use super::key::RsaKey;
use super::padding::{emsa_pkcs1_v15, Padding};
use crate::digest::{digest_info, DigestAlgorithm, DigestInfo};
use crate::error::{CryptorError, Result};

/// Outcome of a well-formed verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureStatus {
    Valid,
    Invalid,
}

/// Signature operations accept PKCS#1 v1.5 only, with a hash of exactly the
/// digest's output size.
fn signature_digest(
    padding: Padding,
    hash: &[u8],
    digest: DigestAlgorithm,
) -> Result<&'static DigestInfo> {
    if padding != Padding::Pkcs1 {
        return Err(CryptorError::Param);
    }
    let info = digest_info(digest).ok_or(CryptorError::Param)?;
    if hash.len() != info.output_size {
        return Err(CryptorError::Param);
    }
    Ok(info)
}

/// Sign a precomputed `hash` with a private key.
pub fn sign(key: &RsaKey, padding: Padding, hash: &[u8], digest: DigestAlgorithm) -> Result<Vec<u8>> {
    debug!(?padding, ?digest, "sign");
    let private = key.as_private().ok_or(CryptorError::Param)?;
    let info = signature_digest(padding, hash, digest)?;
    let k = private.size();

    let em = emsa_pkcs1_v15(hash, info, k)?;

    // The private operation checks its result against the public exponent
    let s = private.private_op(&from_bytes(&em))?;
    Ok(to_bytes_padded(&s, k)?)
}

/// Verify `signature` over `hash` with a public key.
///
/// A signature of the wrong length is malformed input and reported as a
/// decode error. A well-formed signature that does not match is
/// `Ok(SignatureStatus::Invalid)`.
pub fn verify(
    key: &RsaKey,
    padding: Padding,
    hash: &[u8],
    digest: DigestAlgorithm,
    signature: &[u8],
) -> Result<SignatureStatus> {
    debug!(?padding, ?digest, len = signature.len(), "verify");
    let public = key.as_public().ok_or(CryptorError::Param)?;
    let info = signature_digest(padding, hash, digest)?;
    let k = public.size();

    if signature.len() != k {
        return Err(CryptorError::Decode);
    }
    let expected = emsa_pkcs1_v15(hash, info, k)?;

    let m = match public.public_op(&from_bytes(signature)) {
        Ok(m) => m,
        Err(_) => {
            debug!("signature not below the modulus");
            return Ok(SignatureStatus::Invalid);
        }
    };
    let em = to_bytes_padded(&m, k)?;

    if bool::from(em.ct_eq(&expected)) {
        Ok(SignatureStatus::Valid)
    } else {
        Ok(SignatureStatus::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsa::encrypt::tests::test_pair;

    fn sha256_of(data: &[u8]) -> Vec<u8> {
        digest_info(DigestAlgorithm::Sha256).unwrap().hash(&[data]).unwrap()
    }

    #[test]
    fn test_sign_verify() {
        let pair = test_pair();
        let hash = sha256_of(b"message");

        let signature = sign(&pair.private, Padding::Pkcs1, &hash, DigestAlgorithm::Sha256).unwrap();
        assert_eq!(signature.len(), 128);
        assert_eq!(
            verify(&pair.public, Padding::Pkcs1, &hash, DigestAlgorithm::Sha256, &signature),
            Ok(SignatureStatus::Valid)
        );
    }

    #[test]
    fn test_sign_is_deterministic() {
        let pair = test_pair();
        let hash = sha256_of(b"message");
        let a = sign(&pair.private, Padding::Pkcs1, &hash, DigestAlgorithm::Sha256).unwrap();
        let b = sign(&pair.private, Padding::Pkcs1, &hash, DigestAlgorithm::Sha256).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sign_with_table_only_digests() {
        // MD5 and SHA-1 only need table metadata for signing
        let pair = test_pair();
        for (digest, size) in [(DigestAlgorithm::Md5, 16), (DigestAlgorithm::Sha1, 20)] {
            let hash = vec![0x42u8; size];
            let signature = sign(&pair.private, Padding::Pkcs1, &hash, digest).unwrap();
            assert_eq!(
                verify(&pair.public, Padding::Pkcs1, &hash, digest, &signature),
                Ok(SignatureStatus::Valid)
            );
        }
    }

    #[test]
    fn test_wrong_hash_is_invalid() {
        let pair = test_pair();
        let signature =
            sign(&pair.private, Padding::Pkcs1, &sha256_of(b"one"), DigestAlgorithm::Sha256).unwrap();
        assert_eq!(
            verify(&pair.public, Padding::Pkcs1, &sha256_of(b"two"), DigestAlgorithm::Sha256, &signature),
            Ok(SignatureStatus::Invalid)
        );
    }

    #[test]
    fn test_signature_above_modulus_is_invalid() {
        let pair = test_pair();
        let hash = sha256_of(b"message");
        assert_eq!(
            verify(&pair.public, Padding::Pkcs1, &hash, DigestAlgorithm::Sha256, &[0xFF; 128]),
            Ok(SignatureStatus::Invalid)
        );
    }

    #[test]
    fn test_signature_length_mismatch() {
        let pair = test_pair();
        let hash = sha256_of(b"message");
        assert_eq!(
            verify(&pair.public, Padding::Pkcs1, &hash, DigestAlgorithm::Sha256, &[0x01; 127]),
            Err(CryptorError::Decode)
        );
    }

    #[test]
    fn test_parameter_errors() {
        let pair = test_pair();
        let hash = sha256_of(b"message");

        // Wrong key variant
        assert_eq!(
            sign(&pair.public, Padding::Pkcs1, &hash, DigestAlgorithm::Sha256),
            Err(CryptorError::Param)
        );
        assert_eq!(
            verify(&pair.private, Padding::Pkcs1, &hash, DigestAlgorithm::Sha256, &[0; 128]),
            Err(CryptorError::Param)
        );

        // Unsupported paddings
        for padding in [Padding::None, Padding::Oaep, Padding::X931, Padding::Pkcs1Raw, Padding::Pss] {
            assert_eq!(
                sign(&pair.private, padding, &hash, DigestAlgorithm::Sha256),
                Err(CryptorError::Param)
            );
        }

        // Digest missing from the table, and hash of the wrong size
        assert_eq!(
            sign(&pair.private, Padding::Pkcs1, &hash, DigestAlgorithm::Rmd160),
            Err(CryptorError::Param)
        );
        assert_eq!(
            sign(&pair.private, Padding::Pkcs1, &hash[..31], DigestAlgorithm::Sha256),
            Err(CryptorError::Param)
        );
    }
}
