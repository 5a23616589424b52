// RSA Big Integer Operations
// Adapter over num-bigint: conversions, modular arithmetic, prime search

use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{thread_rng, RngCore};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::config::MIN_PUBLIC_EXPONENT;

/// RSA Big Integer type alias
pub type RsaBigInt = BigUint;

/// Failures reported by the big-number engine.
///
/// These stay inside the crate; operations translate them into
/// [`crate::CryptorError`] before returning.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    #[error("public exponent must be odd and at least 17 bits")]
    BadExponent,
    #[error("no suitable prime found")]
    PrimeNotFound,
    #[error("value has no modular inverse")]
    NotInvertible,
    #[error("prime seed outside the required range")]
    SeedOutOfRange,
    #[error("primes are too close together")]
    PrimesTooClose,
    #[error("message too long for the modulus")]
    MessageTooLong,
    #[error("input is not reduced modulo n")]
    OutOfRange,
    #[error("encoding check failed")]
    Encoding,
    #[error("key components are inconsistent")]
    Inconsistent,
    #[error("entropy source failure")]
    Entropy,
    #[error("integer does not fit the output width")]
    Overflow,
}

/// Odd primes below 256, used to sieve candidates before Miller-Rabin
const SMALL_PRIMES: [u32; 53] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251,
];

/// Create a big integer from u64
pub fn from_u64(n: u64) -> RsaBigInt {
    RsaBigInt::from(n)
}

/// Create a big integer from bytes (big-endian)
pub fn from_bytes(bytes: &[u8]) -> RsaBigInt {
    RsaBigInt::from_bytes_be(bytes)
}

/// Convert big integer to minimal big-endian bytes (zero encodes as one 0x00)
pub fn to_bytes(n: &RsaBigInt) -> Vec<u8> {
    n.to_bytes_be()
}

/// Big-endian encode into exactly `width` bytes, left-padded with zeros
pub fn to_bytes_padded(n: &RsaBigInt, width: usize) -> Result<Vec<u8>, EngineError> {
    let raw = Zeroizing::new(n.to_bytes_be());
    let raw: &[u8] = if n.is_zero() { &[] } else { &raw };
    if raw.len() > width {
        return Err(EngineError::Overflow);
    }
    let mut out = vec![0u8; width];
    out[width - raw.len()..].copy_from_slice(raw);
    Ok(out)
}

/// Modular exponentiation: base^exp mod modulus
pub fn mod_pow(base: &RsaBigInt, exp: &RsaBigInt, modulus: &RsaBigInt) -> RsaBigInt {
    if modulus.is_zero() || modulus.is_one() {
        return RsaBigInt::zero();
    }
    base.modpow(exp, modulus)
}

/// Compute modular inverse: a^(-1) mod m
/// Returns None if inverse doesn't exist
pub fn mod_inverse(a: &RsaBigInt, m: &RsaBigInt) -> Option<RsaBigInt> {
    if m.is_zero() || m.is_one() {
        return None;
    }

    // Iterative extended Euclid over signed integers
    let modulus = BigInt::from(m.clone());
    let (mut old_r, mut r) = (BigInt::from(a % m), modulus.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());

    while !r.is_zero() {
        let q = &old_r / &r;
        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);
    }

    if !old_r.is_one() {
        return None;
    }

    let (_, magnitude) = old_s.mod_floor(&modulus).into_parts();
    Some(magnitude)
}

/// Greatest common divisor
pub fn gcd(a: &RsaBigInt, b: &RsaBigInt) -> RsaBigInt {
    a.gcd(b)
}

/// Least common multiple
pub fn lcm(a: &RsaBigInt, b: &RsaBigInt) -> RsaBigInt {
    if a.is_zero() || b.is_zero() {
        return RsaBigInt::zero();
    }
    (a * b) / gcd(a, b)
}

/// Check the public exponent: odd and at least [`MIN_PUBLIC_EXPONENT`]
/// (17 bits).
pub fn check_public_exponent(e: &RsaBigInt) -> Result<(), EngineError> {
    if e.is_even() || e < &from_u64(u64::from(MIN_PUBLIC_EXPONENT)) {
        return Err(EngineError::BadExponent);
    }
    Ok(())
}

fn has_small_factor(n: &RsaBigInt) -> bool {
    SMALL_PRIMES.iter().any(|&p| {
        let p = RsaBigInt::from(p);
        n != &p && (n % &p).is_zero()
    })
}

/// Miller-Rabin primality test
/// Returns true if n is probably prime
pub fn is_probable_prime(n: &RsaBigInt, iterations: u32) -> bool {
    if n < &RsaBigInt::from(2u8) {
        return false;
    }
    if n == &RsaBigInt::from(2u8) || n == &RsaBigInt::from(3u8) {
        return true;
    }
    if n.is_even() || has_small_factor(n) {
        return false;
    }

    // Write n-1 as d * 2^s with d odd
    let n_minus_one = n - 1u8;
    let mut d = n_minus_one.clone();
    let mut s = 0u32;
    while d.is_even() {
        d >>= 1;
        s += 1;
    }

    // Witnesses need not be secret
    let mut rng = thread_rng();
    let two = RsaBigInt::from(2u8);

    for _ in 0..iterations {
        // Pick random witness a in [2, n-2]
        let a = rng.gen_biguint_range(&two, &n_minus_one);

        let mut x = mod_pow(&a, &d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }

        let mut continue_outer = false;
        for _ in 1..s {
            x = mod_pow(&x, &two, n);
            if x == n_minus_one {
                continue_outer = true;
                break;
            }
        }

        if continue_outer {
            continue;
        }

        // Composite
        return false;
    }

    // Probably prime
    true
}

/// Lower bound sqrt(2) * 2^(bits-1) for each prime of a `2 * bits` modulus
pub fn prime_lower_bound(bits: usize) -> RsaBigInt {
    (RsaBigInt::one() << (2 * bits - 1)).sqrt()
}

/// Generate a random prime of exactly `bits` bits with gcd(p - 1, e) = 1.
///
/// The two top bits are forced so that the product of two such primes has
/// exactly `2 * bits` bits.
pub fn random_prime<R: RngCore + ?Sized>(
    bits: usize,
    e: &RsaBigInt,
    rounds: u32,
    rng: &mut R,
) -> Result<RsaBigInt, EngineError> {
    if bits < 16 {
        return Err(EngineError::PrimeNotFound);
    }

    let len = (bits + 7) / 8;
    let excess = len * 8 - bits;
    let top = RsaBigInt::from(3u8) << (bits - 2);
    let mut buf = Zeroizing::new(vec![0u8; len]);

    // Expected number of candidates is about ln(2^bits) / 2
    for _ in 0..bits * 20 {
        rng.try_fill_bytes(&mut buf).map_err(|_| EngineError::Entropy)?;
        let candidate = (from_bytes(&buf) >> excess) | &top | RsaBigInt::one();

        if has_small_factor(&candidate) {
            continue;
        }
        if !gcd(&(&candidate - 1u8), e).is_one() {
            continue;
        }
        if is_probable_prime(&candidate, rounds) {
            return Ok(candidate);
        }
    }

    Err(EngineError::PrimeNotFound)
}

/// First probable prime greater than or equal to `start`
pub fn next_prime(start: &RsaBigInt, rounds: u32) -> Result<RsaBigInt, EngineError> {
    let mut candidate = start.clone();
    if candidate <= RsaBigInt::from(2u8) {
        return Ok(RsaBigInt::from(2u8));
    }
    if candidate.is_even() {
        candidate += 1u8;
    }

    let limit = 64 * start.bits().max(8);
    for _ in 0..limit {
        if is_probable_prime(&candidate, rounds) {
            return Ok(candidate);
        }
        candidate += 2u8;
    }

    Err(EngineError::PrimeNotFound)
}

/// Build a probable prime from auxiliary primes `r1`, `r2` and seed `x`
/// (FIPS 186-4 C.9). The result `y` satisfies `r1 | y - 1`, `r2 | y + 1`,
/// `gcd(y - 1, e) = 1` and `sqrt(2) * 2^(bits-1) <= y < 2^bits`.
pub fn prime_from_auxiliary(
    r1: &RsaBigInt,
    r2: &RsaBigInt,
    x: &RsaBigInt,
    e: &RsaBigInt,
    bits: usize,
    rounds: u32,
) -> Result<RsaBigInt, EngineError> {
    let two_r1 = r1 << 1;
    if !gcd(&two_r1, r2).is_one() {
        return Err(EngineError::PrimeNotFound);
    }
    if x < &prime_lower_bound(bits) || x.bits() > bits as u64 {
        return Err(EngineError::SeedOutOfRange);
    }

    let step = &two_r1 * r2;

    // R = 1 mod 2r1 and R = -1 mod r2, reduced into [0, step)
    let inv_r2 = mod_inverse(r2, &two_r1).ok_or(EngineError::NotInvertible)?;
    let inv_two_r1 = mod_inverse(&two_r1, r2).ok_or(EngineError::NotInvertible)?;
    let r = ((&inv_r2 * r2) + &step - ((&inv_two_r1 * &two_r1) % &step)) % &step;

    // Y = X + ((R - X) mod step)
    let x_mod = x % &step;
    let offset = if r >= x_mod {
        &r - &x_mod
    } else {
        &r + &step - &x_mod
    };
    let mut y = x + offset;

    let ceiling = RsaBigInt::one() << bits;
    for _ in 0..5 * bits {
        if y >= ceiling {
            return Err(EngineError::PrimeNotFound);
        }
        if gcd(&(&y - 1u8), e).is_one() && is_probable_prime(&y, rounds) {
            return Ok(y);
        }
        y += &step;
    }

    Err(EngineError::PrimeNotFound)
}

/// Require |p - q| > 2^(bits - 100) for primes of `bits` bits
pub fn check_prime_distance(p: &RsaBigInt, q: &RsaBigInt, bits: usize) -> Result<(), EngineError> {
    let diff = if p > q { p - q } else { q - p };
    let floor = if bits > 100 {
        RsaBigInt::one() << (bits - 100)
    } else {
        RsaBigInt::zero()
    };
    if diff <= floor {
        return Err(EngineError::PrimesTooClose);
    }
    Ok(())
}

/// Private exponent and CRT parameters derived from p, q, e
pub struct CrtParams {
    pub d: RsaBigInt,
    pub dp: RsaBigInt,
    pub dq: RsaBigInt,
    pub qinv: RsaBigInt,
}

/// Compute d = e^-1 mod lcm(p-1, q-1), d mod (p-1), d mod (q-1), q^-1 mod p
pub fn crt_params(p: &RsaBigInt, q: &RsaBigInt, e: &RsaBigInt) -> Result<CrtParams, EngineError> {
    if p <= &RsaBigInt::one() || q <= &RsaBigInt::one() || p == q {
        return Err(EngineError::Inconsistent);
    }

    let p_minus_1 = p - 1u8;
    let q_minus_1 = q - 1u8;
    let lambda = lcm(&p_minus_1, &q_minus_1);

    let d = mod_inverse(e, &lambda).ok_or(EngineError::NotInvertible)?;
    let dp = &d % &p_minus_1;
    let dq = &d % &q_minus_1;
    let qinv = mod_inverse(q, p).ok_or(EngineError::NotInvertible)?;

    Ok(CrtParams { d, dp, dq, qinv })
}

/// Private-key exponentiation via the Chinese Remainder Theorem
pub fn crt_exponentiate(
    c: &RsaBigInt,
    p: &RsaBigInt,
    q: &RsaBigInt,
    dp: &RsaBigInt,
    dq: &RsaBigInt,
    qinv: &RsaBigInt,
) -> RsaBigInt {
    // m1 = c^dp mod p, m2 = c^dq mod q
    let m1 = mod_pow(c, dp, p);
    let m2 = mod_pow(c, dq, q);

    // h = (m1 - m2) * qinv mod p
    let m2_mod_p = &m2 % p;
    let diff = if m1 >= m2_mod_p {
        m1 - m2_mod_p
    } else {
        m1 + p - m2_mod_p
    };
    let h = (diff * qinv) % p;

    // m = m2 + q * h
    m2 + q * h
}
