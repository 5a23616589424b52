// Raw RSA Block Operation
// Unpadded exponentiation of a single key-sized block

use tracing::debug;

use super::bigint::{from_bytes, to_bytes_padded};
use super::key::RsaKey;
use crate::error::{CryptorError, Result};

/// Apply the key to one block: `x^e mod n` for a public key, `x^d mod n`
/// (CRT) for a private key.
///
/// `input` must be exactly the key size in bytes; any other length is
/// reported as `MemoryFailure`. An input not below the modulus is a decode
/// error.
pub fn raw_crypt(key: &RsaKey, input: &[u8]) -> Result<Vec<u8>> {
    debug!(bits = key.bits(), len = input.len(), "raw crypt");
    let k = key.size();
    if input.len() != k {
        return Err(CryptorError::MemoryFailure);
    }

    let x = from_bytes(input);
    let y = match key {
        RsaKey::Public(public) => public.public_op(&x)?,
        RsaKey::Private(private) => private.private_op(&x)?,
    };
    Ok(to_bytes_padded(&y, k)?)
}
