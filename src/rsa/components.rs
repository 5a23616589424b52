// Raw Key Components
// Create keys from big-endian components, extract them, and rebuild a pair from prime seeds

use num_traits::Zero;
use tracing::debug;
use zeroize::Zeroizing;

use super::bigint::{
    check_prime_distance, check_public_exponent, crt_params, from_bytes, from_u64, next_prime,
    prime_from_auxiliary, to_bytes, RsaBigInt,
};
use super::key::{KeyType, PrivateParts, RsaKey, RsaPrivateKey, RsaPublicKey};
use crate::config::{GenerationConfig, MAX_KEY_BITS};
use crate::error::{CryptorError, Result};

/// Big-endian components of a key. `p` and `q` are present only for
/// private keys.
#[derive(Clone)]
pub struct KeyComponents {
    pub modulus: Vec<u8>,
    pub exponent: Vec<u8>,
    pub p: Option<Zeroizing<Vec<u8>>>,
    pub q: Option<Zeroizing<Vec<u8>>>,
}

/// Build a key from raw big-endian components.
///
/// A public key uses `modulus` and `exponent` only. A private key also uses
/// `p` and `q`, and derives the private exponent and CRT parameters from
/// them.
pub fn create_from_components(
    key_type: KeyType,
    modulus: &[u8],
    exponent: &[u8],
    p: &[u8],
    q: &[u8],
) -> Result<RsaKey> {
    debug!(?key_type, modulus_len = modulus.len(), "creating key from components");

    let n = from_bytes(modulus);
    let e = from_bytes(exponent);
    if n.is_zero() || e.is_zero() {
        return Err(CryptorError::Param);
    }
    let bits = n.bits() as usize;
    if bits > MAX_KEY_BITS {
        return Err(CryptorError::Param);
    }

    match key_type {
        KeyType::Public => Ok(RsaPublicKey::new(&n, &e, bits)?.into()),
        KeyType::Private => {
            let p = from_bytes(p);
            let q = from_bytes(q);
            if p.is_zero() || q.is_zero() {
                return Err(CryptorError::Param);
            }
            if &p * &q != n {
                return Err(CryptorError::Decode);
            }
            Ok(RsaPrivateKey::from_primes(&p, &q, &e, bits)?.into())
        }
        KeyType::Invalid => Err(CryptorError::Param),
    }
}

impl RsaKey {
    /// Raw components of the key, minimal big-endian.
    pub fn components(&self) -> KeyComponents {
        let public = self.public_part();
        let modulus = public.modulus_material().to_minimal_bytes().to_vec();
        let exponent = public.exponent_material().to_minimal_bytes().to_vec();
        match self {
            RsaKey::Public(_) => KeyComponents {
                modulus,
                exponent,
                p: None,
                q: None,
            },
            RsaKey::Private(key) => KeyComponents {
                modulus,
                exponent,
                p: Some(key.p_material().to_minimal_bytes()),
                q: Some(key.q_material().to_minimal_bytes()),
            },
        }
    }
}

/// Seed material for FIPS 186-4 prime construction: auxiliary seeds
/// `xp1`, `xp2`, `xq1`, `xq2` and main seeds `xp`, `xq`, all big-endian.
#[derive(Clone, Copy)]
pub struct PrimeSeeds<'a> {
    pub xp1: &'a [u8],
    pub xp2: &'a [u8],
    pub xp: &'a [u8],
    pub xq1: &'a [u8],
    pub xq2: &'a [u8],
    pub xq: &'a [u8],
}

/// A key pair rebuilt from seeds, with the derived values in minimal
/// big-endian form.
pub struct ReconstructedPair {
    pub public: RsaKey,
    pub private: RsaKey,
    pub p: Zeroizing<Vec<u8>>,
    pub q: Zeroizing<Vec<u8>>,
    pub modulus: Vec<u8>,
    pub private_exponent: Zeroizing<Vec<u8>>,
}

impl PrimeSeeds<'_> {
    /// Modulus size implied by the main seeds
    pub fn modulus_bits(&self) -> usize {
        8 * (self.xp.len() + self.xq.len())
    }

    fn validate(&self) -> Result<()> {
        let all = [self.xp1, self.xp2, self.xp, self.xq1, self.xq2, self.xq];
        if all.iter().any(|s| s.is_empty()) {
            return Err(CryptorError::Param);
        }
        if self.xp.len() != self.xq.len() || self.modulus_bits() > MAX_KEY_BITS {
            return Err(CryptorError::Param);
        }
        // Auxiliary primes are much smaller than the primes they help build
        if [self.xp1, self.xp2].iter().any(|s| s.len() >= self.xp.len())
            || [self.xq1, self.xq2].iter().any(|s| s.len() >= self.xq.len())
        {
            return Err(CryptorError::Param);
        }
        Ok(())
    }
}

/// Deterministically rebuild a key pair from prime seed material.
///
/// The same seeds and exponent always yield the same key. Malformed seed
/// sets are parameter errors; seeds from which no valid key follows are
/// decode errors.
pub fn reconstruct_from_seeds(e: u32, seeds: &PrimeSeeds) -> Result<ReconstructedPair> {
    seeds.validate()?;
    let nbits = seeds.modulus_bits();
    let half_bits = nbits / 2;
    let rounds = GenerationConfig::default().primality_rounds;
    debug!(nbits, e, "reconstructing key pair from seeds");

    let e = from_u64(u64::from(e));
    check_public_exponent(&e)?;

    let build = |aux1: &[u8], aux2: &[u8], main: &[u8]| -> Result<RsaBigInt> {
        let r1 = next_prime(&from_bytes(aux1), rounds)?;
        let r2 = next_prime(&from_bytes(aux2), rounds)?;
        Ok(prime_from_auxiliary(&r1, &r2, &from_bytes(main), &e, half_bits, rounds)?)
    };

    let p = build(seeds.xp1, seeds.xp2, seeds.xp)?;
    let q = build(seeds.xq1, seeds.xq2, seeds.xq)?;
    check_prime_distance(&p, &q, half_bits)?;

    let params = crt_params(&p, &q, &e)?;
    let n = &p * &q;

    let p_bytes = Zeroizing::new(to_bytes(&p));
    let q_bytes = Zeroizing::new(to_bytes(&q));
    let modulus = to_bytes(&n);
    let private_exponent = Zeroizing::new(to_bytes(&params.d));

    let private = RsaPrivateKey::from_parts(
        &PrivateParts {
            n,
            e,
            d: params.d,
            p,
            q,
            dp: params.dp,
            dq: params.dq,
            qinv: params.qinv,
        },
        nbits,
    )?;
    let public = private.to_public()?;

    Ok(ReconstructedPair {
        public: public.into(),
        private: private.into(),
        p: p_bytes,
        q: q_bytes,
        modulus,
        private_exponent,
    })
}

/// Copy `src` into the front of `out`, returning the number of bytes
/// written. A short buffer is reported as `BufferTooSmall { required }`.
pub fn write_sized(src: &[u8], out: &mut [u8]) -> Result<usize> {
    if out.len() < src.len() {
        return Err(CryptorError::BufferTooSmall {
            required: src.len(),
        });
    }
    out[..src.len()].copy_from_slice(src);
    Ok(src.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    // n = 61 * 53 = 3233, e = 17
    const N: [u8; 2] = [0x0c, 0xa1];
    const E: [u8; 1] = [0x11];

    fn seeds_1024() -> ([u8; 13], [u8; 14], [u8; 64], [u8; 13], [u8; 14], [u8; 64]) {
        ([0x9d; 13], [0xb7; 14], [0xc3; 64], [0xa5; 13], [0xd1; 14], [0xe6; 64])
    }

    #[test]
    fn test_create_public() {
        let key = create_from_components(KeyType::Public, &N, &E, &[], &[]).unwrap();
        assert_eq!(key.key_type(), KeyType::Public);
        assert_eq!(key.bits(), 12);

        let parts = key.components();
        assert_eq!(parts.modulus, N.to_vec());
        assert_eq!(parts.exponent, E.to_vec());
        assert!(parts.p.is_none());
    }

    #[test]
    fn test_create_private() {
        let key = create_from_components(KeyType::Private, &N, &E, &[61], &[53]).unwrap();
        assert_eq!(key.key_type(), KeyType::Private);

        let parts = key.components();
        assert_eq!(parts.p.as_deref().map(|v| v.as_slice()), Some(&[61u8][..]));
        assert_eq!(parts.q.as_deref().map(|v| v.as_slice()), Some(&[53u8][..]));
    }

    #[test]
    fn test_create_rejects_bad_input() {
        assert_eq!(
            create_from_components(KeyType::Invalid, &N, &E, &[], &[]).unwrap_err(),
            CryptorError::Param
        );
        assert_eq!(
            create_from_components(KeyType::Public, &[], &E, &[], &[]).unwrap_err(),
            CryptorError::Param
        );
        assert_eq!(
            create_from_components(KeyType::Public, &[0x00, 0x00], &E, &[], &[]).unwrap_err(),
            CryptorError::Param
        );
        assert_eq!(
            create_from_components(KeyType::Private, &N, &E, &[], &[53]).unwrap_err(),
            CryptorError::Param
        );
        assert_eq!(
            create_from_components(KeyType::Private, &N, &E, &[59], &[53]).unwrap_err(),
            CryptorError::Decode
        );
    }

    #[test]
    fn test_create_rejects_oversized_modulus() {
        let mut modulus = vec![0xff; MAX_KEY_BITS / 8 + 1];
        modulus[0] = 0x01;
        assert_eq!(
            create_from_components(KeyType::Public, &modulus, &E, &[], &[]).unwrap_err(),
            CryptorError::Param
        );
    }

    #[test]
    fn test_reconstruct_is_deterministic() {
        let (xp1, xp2, xp, xq1, xq2, xq) = seeds_1024();
        let seeds = PrimeSeeds { xp1: &xp1, xp2: &xp2, xp: &xp, xq1: &xq1, xq2: &xq2, xq: &xq };

        let first = reconstruct_from_seeds(65537, &seeds).unwrap();
        let second = reconstruct_from_seeds(65537, &seeds).unwrap();

        assert_eq!(first.modulus, second.modulus);
        assert_eq!(first.public.bits(), 1024);
        assert_eq!(first.modulus.len(), 128);

        let n = from_bytes(&first.modulus);
        assert_eq!(n, from_bytes(&first.p) * from_bytes(&first.q));
        assert_eq!(first.private.components().modulus, first.modulus);
    }

    #[test]
    fn test_reconstruct_structural_errors() {
        let (xp1, xp2, xp, xq1, xq2, xq) = seeds_1024();

        let empty = PrimeSeeds { xp1: &[], xp2: &xp2, xp: &xp, xq1: &xq1, xq2: &xq2, xq: &xq };
        assert_eq!(reconstruct_from_seeds(65537, &empty).err(), Some(CryptorError::Param));

        let uneven = PrimeSeeds { xp1: &xp1, xp2: &xp2, xp: &xp, xq1: &xq1, xq2: &xq2, xq: &xq[..63] };
        assert_eq!(reconstruct_from_seeds(65537, &uneven).err(), Some(CryptorError::Param));

        let long_aux = PrimeSeeds { xp1: &xp, xp2: &xp2, xp: &xp, xq1: &xq1, xq2: &xq2, xq: &xq };
        assert_eq!(reconstruct_from_seeds(65537, &long_aux).err(), Some(CryptorError::Param));

        let huge = vec![0xc0u8; 300];
        let too_big = PrimeSeeds { xp1: &xp1, xp2: &xp2, xp: &huge, xq1: &xq1, xq2: &xq2, xq: &huge };
        assert_eq!(reconstruct_from_seeds(65537, &too_big).err(), Some(CryptorError::Param));
    }

    #[test]
    fn test_reconstruct_engine_errors() {
        let (xp1, xp2, xp, xq1, xq2, xq) = seeds_1024();
        let seeds = PrimeSeeds { xp1: &xp1, xp2: &xp2, xp: &xp, xq1: &xq1, xq2: &xq2, xq: &xq };

        // Exponent too small
        assert_eq!(reconstruct_from_seeds(3, &seeds).err(), Some(CryptorError::Decode));

        // Main seed below sqrt(2) * 2^511
        let low = [0x01u8; 64];
        let low_seeds = PrimeSeeds { xp: &low, ..seeds };
        assert_eq!(reconstruct_from_seeds(65537, &low_seeds).err(), Some(CryptorError::Decode));
    }

    #[test]
    fn test_write_sized() {
        let mut short = [0u8; 2];
        assert_eq!(
            write_sized(&[1, 2, 3], &mut short),
            Err(CryptorError::BufferTooSmall { required: 3 })
        );

        let mut exact = [0u8; 3];
        assert_eq!(write_sized(&[1, 2, 3], &mut exact), Ok(3));
        assert_eq!(exact, [1, 2, 3]);
    }
}
