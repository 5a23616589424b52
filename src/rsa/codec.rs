// PKCS#1 Key Import and Export
// RSAPrivateKey / RSAPublicKey DER encodings for key objects

use num_integer::Integer;
use num_traits::{One, Zero};
use tracing::debug;
use zeroize::Zeroizing;

use super::bigint::{from_bytes, RsaBigInt};
use super::der::{self, DerError, Tag};
use super::key::{PrivateParts, RsaKey, RsaPrivateKey, RsaPublicKey};
use crate::config::MAX_KEY_BITS;
use crate::error::{CryptorError, Result};

/// Integer magnitudes of a decoded RSAPrivateKey, borrowed from the input
struct PrivateKeyDer<'a> {
    fields: [&'a [u8]; 8],
}

fn parse_private<'a>(input: &mut untrusted::Reader<'a>) -> std::result::Result<PrivateKeyDer<'a>, DerError> {
    der::nested(input, Tag::Sequence, |seq| {
        // Two-prime keys only
        if der::small_nonnegative_integer(seq)? != 0 {
            return Err(DerError);
        }
        let mut fields: [&'a [u8]; 8] = [&[]; 8];
        for field in fields.iter_mut() {
            *field = der::nonnegative_integer(seq)?;
        }
        Ok(PrivateKeyDer { fields })
    })
}

fn parse_public<'a>(
    input: &mut untrusted::Reader<'a>,
) -> std::result::Result<(&'a [u8], &'a [u8]), DerError> {
    der::nested(input, Tag::Sequence, |seq| {
        let n = der::nonnegative_integer(seq)?;
        let e = der::nonnegative_integer(seq)?;
        Ok((n, e))
    })
}

/// Modulus must be odd and fit the key storage; exponent must be odd and > 1.
fn check_public_values(n: &RsaBigInt, e: &RsaBigInt) -> Result<()> {
    if n.is_even() || n.bits() as usize > MAX_KEY_BITS || n <= &RsaBigInt::one() {
        return Err(CryptorError::Decode);
    }
    if e.is_even() || e <= &RsaBigInt::one() {
        return Err(CryptorError::Decode);
    }
    Ok(())
}

fn private_from_der(decoded: &PrivateKeyDer) -> Result<RsaKey> {
    let [n, e, d, p, q, dp, dq, qinv] = decoded.fields.map(from_bytes);
    check_public_values(&n, &e)?;

    if [&d, &p, &q, &dp, &dq, &qinv].iter().any(|v| v.is_zero()) {
        return Err(CryptorError::Decode);
    }
    if &p * &q != n || p.is_one() || q.is_one() {
        return Err(CryptorError::Decode);
    }

    // CRT members must agree with d and the primes
    let p_minus_1 = &p - 1u8;
    let q_minus_1 = &q - 1u8;
    if &d % &p_minus_1 != dp || &d % &q_minus_1 != dq || (&qinv * &q) % &p != RsaBigInt::one() {
        return Err(CryptorError::Decode);
    }

    let key = RsaPrivateKey::from_parts(
        &PrivateParts {
            n,
            e,
            d,
            p,
            q,
            dp,
            dq,
            qinv,
        },
        MAX_KEY_BITS,
    )
    .map_err(|e| match e {
        CryptorError::MemoryFailure => CryptorError::MemoryFailure,
        _ => CryptorError::Decode,
    })?;
    Ok(RsaKey::Private(key))
}

fn public_from_der(n: &[u8], e: &[u8]) -> Result<RsaKey> {
    let n = from_bytes(n);
    let e = from_bytes(e);
    check_public_values(&n, &e)?;

    let key = RsaPublicKey::new(&n, &e, MAX_KEY_BITS).map_err(|e| match e {
        CryptorError::MemoryFailure => CryptorError::MemoryFailure,
        _ => CryptorError::Decode,
    })?;
    Ok(RsaKey::Public(key))
}

/// Decode a PKCS#1 DER key package.
///
/// The input is tried as an `RSAPrivateKey` first, then as an
/// `RSAPublicKey`. Parsing is strict: non-canonical lengths, non-minimal
/// integers and trailing bytes are all rejected with `Decode`.
pub fn import(bytes: &[u8]) -> Result<RsaKey> {
    debug!(len = bytes.len(), "importing key");
    let input = untrusted::Input::from(bytes);

    if let Ok(decoded) = input.read_all(DerError, parse_private) {
        return private_from_der(&decoded);
    }
    if let Ok((n, e)) = input.read_all(DerError, parse_public) {
        return public_from_der(n, e);
    }

    debug!("key package is neither a private nor a public PKCS#1 key");
    Err(CryptorError::Decode)
}

impl RsaKey {
    /// Minimal big-endian magnitudes of the INTEGER fields, in encoding order.
    fn der_fields(&self) -> Vec<Zeroizing<Vec<u8>>> {
        match self {
            RsaKey::Public(key) => vec![
                key.modulus_material().to_minimal_bytes(),
                key.exponent_material().to_minimal_bytes(),
            ],
            RsaKey::Private(key) => key
                .materials()
                .iter()
                .map(|m| m.to_minimal_bytes())
                .collect(),
        }
    }

    fn der_content_len(fields: &[Zeroizing<Vec<u8>>], private: bool) -> usize {
        let version_len = if private { der::tlv_len(1) } else { 0 };
        version_len
            + fields
                .iter()
                .map(|f| der::tlv_len(der::positive_integer_len(f)))
                .sum::<usize>()
    }

    /// Size in bytes of the DER encoding produced by [`RsaKey::export`].
    pub fn exported_len(&self) -> usize {
        let fields = self.der_fields();
        let private = matches!(self, RsaKey::Private(_));
        der::tlv_len(Self::der_content_len(&fields, private))
    }

    /// Encode the key as PKCS#1 DER: `RSAPrivateKey` for private keys,
    /// `RSAPublicKey` for public keys.
    pub fn export(&self) -> Result<Vec<u8>> {
        let fields = self.der_fields();
        let private = matches!(self, RsaKey::Private(_));
        let content_len = Self::der_content_len(&fields, private);

        let mut body = Zeroizing::new(Vec::new());
        body.try_reserve_exact(content_len)?;
        if private {
            der::write_positive_integer(&mut body, &[0]);
        }
        for field in &fields {
            der::write_positive_integer(&mut body, field);
        }

        let mut out = Vec::new();
        out.try_reserve_exact(der::tlv_len(content_len))?;
        der::write_tlv(&mut out, Tag::Sequence, &body);
        Ok(out)
    }

    /// Write the DER encoding into `out` and return its length.
    ///
    /// A short buffer is left untouched and reported as
    /// `BufferTooSmall { required }`.
    pub fn export_into(&self, out: &mut [u8]) -> Result<usize> {
        let required = self.exported_len();
        if out.len() < required {
            return Err(CryptorError::BufferTooSmall { required });
        }
        let encoded = Zeroizing::new(self.export()?);
        out[..required].copy_from_slice(&encoded);
        Ok(required)
    }
}

/// Export an optional key reference into `out`; `None` is a parameter error.
pub fn export(key: Option<&RsaKey>, out: &mut [u8]) -> Result<usize> {
    let key = key.ok_or(CryptorError::Param)?;
    debug!(bits = key.bits(), "exporting key");
    key.export_into(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsa::bigint::from_u64;
    use crate::rsa::key::KeyType;

    fn toy_private() -> RsaKey {
        RsaPrivateKey::from_primes(&from_u64(61), &from_u64(53), &from_u64(17), 64)
            .unwrap()
            .into()
    }

    // SEQUENCE { INTEGER 3233, INTEGER 17 }
    const TOY_PUBLIC_DER: [u8; 9] = [0x30, 0x07, 0x02, 0x02, 0x0c, 0xa1, 0x02, 0x01, 0x11];

    #[test]
    fn test_export_public() {
        let public = toy_private().public_key().unwrap();
        assert_eq!(public.export().unwrap(), TOY_PUBLIC_DER.to_vec());
        assert_eq!(public.exported_len(), TOY_PUBLIC_DER.len());
    }

    #[test]
    fn test_import_public() {
        let key = import(&TOY_PUBLIC_DER).unwrap();
        assert_eq!(key.key_type(), KeyType::Public);
        assert_eq!(key.bits(), 12);
        assert_eq!(key.as_public().unwrap().n(), from_u64(3233));
    }

    #[test]
    fn test_private_round_trip() {
        let key = toy_private();
        let encoded = key.export().unwrap();
        assert_eq!(encoded.len(), key.exported_len());

        let decoded = import(&encoded).unwrap();
        assert_eq!(decoded.key_type(), KeyType::Private);
        assert_eq!(decoded.export().unwrap(), encoded);
    }

    #[test]
    fn test_trailing_byte_rejected() {
        let mut der = TOY_PUBLIC_DER.to_vec();
        der.push(0x00);
        assert_eq!(import(&der).unwrap_err(), CryptorError::Decode);
    }

    #[test]
    fn test_garbage_rejected() {
        assert_eq!(import(&[]).unwrap_err(), CryptorError::Decode);
        assert_eq!(import(&[0x30, 0x00]).unwrap_err(), CryptorError::Decode);
        assert_eq!(import(b"not a key").unwrap_err(), CryptorError::Decode);
    }

    #[test]
    fn test_even_modulus_rejected() {
        // SEQUENCE { INTEGER 3234, INTEGER 17 }
        let der = [0x30, 0x07, 0x02, 0x02, 0x0c, 0xa2, 0x02, 0x01, 0x11];
        assert_eq!(import(&der).unwrap_err(), CryptorError::Decode);
    }

    #[test]
    fn test_inconsistent_private_rejected() {
        let mut encoded = toy_private().export().unwrap();
        // The last byte is the low byte of qinv
        let last = encoded.len() - 1;
        encoded[last] ^= 0x01;
        assert_eq!(import(&encoded).unwrap_err(), CryptorError::Decode);
    }

    #[test]
    fn test_export_into_sizing() {
        let key = toy_private();
        let required = key.exported_len();

        let mut empty = [0u8; 0];
        assert_eq!(
            key.export_into(&mut empty),
            Err(CryptorError::BufferTooSmall { required })
        );

        let mut short = vec![0xEEu8; required - 1];
        assert!(key.export_into(&mut short).is_err());
        assert!(short.iter().all(|&b| b == 0xEE));

        let mut exact = vec![0u8; required];
        assert_eq!(key.export_into(&mut exact), Ok(required));
        assert_eq!(exact, key.export().unwrap());
    }

    #[test]
    fn test_export_without_key() {
        let mut buf = [0u8; 16];
        assert_eq!(export(None, &mut buf), Err(CryptorError::Param));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn import_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = import(&bytes);
        }

        #[test]
        fn import_of_sequence_prefix_never_panics(
            body in proptest::collection::vec(any::<u8>(), 0..120)
        ) {
            let mut bytes = vec![0x30, body.len() as u8];
            bytes.extend_from_slice(&body);
            let _ = import(&bytes);
        }
    }
}
