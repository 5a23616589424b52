// RSA Key Generation
// Implements FIPS 186-4 style key pair generation over the dual entropy source

use num_traits::One;
use tracing::debug;

use super::bigint::{
    check_prime_distance, check_public_exponent, crt_params, from_u64, random_prime, EngineError,
    RsaBigInt,
};
use super::key::{PrivateParts, RsaKey, RsaPrivateKey};
use super::random::DualEntropy;
use crate::config::GenerationConfig;
use crate::error::Result;

/// RSA Key Pair (both public and private keys)
#[derive(Debug, Clone)]
pub struct RsaKeyPair {
    pub public: RsaKey,
    pub private: RsaKey,
}

impl RsaKeyPair {
    /// Get the bit length of the key
    pub fn bits(&self) -> usize {
        self.public.bits()
    }
}

/// Generate an RSA key pair with the default limits.
///
/// `size_bits` must be even and within 1024..=4096. `public_exponent` must
/// be odd and at least 65537.
pub fn generate_pair(size_bits: usize, public_exponent: u32) -> Result<RsaKeyPair> {
    generate_pair_with(&GenerationConfig::default(), size_bits, public_exponent)
}

/// Generate an RSA key pair under `config`.
pub fn generate_pair_with(
    config: &GenerationConfig,
    size_bits: usize,
    public_exponent: u32,
) -> Result<RsaKeyPair> {
    debug!(size_bits, public_exponent, "generating key pair");
    config.validate_size(size_bits)?;

    let e = from_u64(u64::from(public_exponent));
    check_public_exponent(&e)?;

    let half_bits = size_bits / 2;
    let d_floor = RsaBigInt::one() << half_bits;
    let mut rng = DualEntropy::new();

    for attempt in 0..config.max_attempts {
        // Step 1: Two primes of half size with gcd(p - 1, e) = 1
        let p = random_prime(half_bits, &e, config.primality_rounds, &mut rng)?;
        let q = random_prime(half_bits, &e, config.primality_rounds, &mut rng)?;

        // Step 2: Primes must not be too close
        if check_prime_distance(&p, &q, half_bits).is_err() {
            debug!(attempt, "primes too close, retrying");
            continue;
        }

        // Ensure p > q (for qinv calculation)
        let (p, q) = if p < q { (q, p) } else { (p, q) };

        // Step 3: d = e^-1 mod lcm(p-1, q-1), and d must be large
        let params = match crt_params(&p, &q, &e) {
            Ok(params) => params,
            Err(_) => continue,
        };
        if params.d <= d_floor {
            debug!(attempt, "private exponent too small, retrying");
            continue;
        }

        let n = &p * &q;
        if n.bits() as usize != size_bits {
            continue;
        }

        // Step 4: Assemble the private key and project the public key from it
        let private = RsaPrivateKey::from_parts(
            &PrivateParts {
                n,
                e: e.clone(),
                d: params.d,
                p,
                q,
                dp: params.dp,
                dq: params.dq,
                qinv: params.qinv,
            },
            size_bits,
        )?;
        let public = private.to_public()?;

        debug!(size_bits, attempts = attempt + 1, "key pair generated");
        return Ok(RsaKeyPair {
            public: public.into(),
            private: private.into(),
        });
    }

    Err(EngineError::PrimeNotFound.into())
}

/// Generate RSA key pair with default settings (2048 bits, e=65537)
pub fn generate_default_keypair() -> Result<RsaKeyPair> {
    generate_pair(2048, 65537)
}
