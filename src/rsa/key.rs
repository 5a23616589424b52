// RSA Key Objects
// Tagged public/private key type over zeroizing fixed-capacity storage

use std::fmt;

use num_traits::Zero;
use zeroize::Zeroizing;

use super::bigint::{
    crt_exponentiate, crt_params, from_bytes, mod_pow, to_bytes_padded, EngineError, RsaBigInt,
};
use crate::config::MAX_KEY_BITS;
use crate::error::{CryptorError, Result};

/// Storage for one key component.
///
/// The buffer is sized once for the key (capped at [`MAX_KEY_BITS`]) and
/// holds the value big-endian, right-aligned. It is zero-filled before the
/// memory is released.
#[derive(Clone)]
pub struct KeyMaterial {
    buf: Zeroizing<Vec<u8>>,
}

impl KeyMaterial {
    /// Allocate zeroed storage for a value of up to `size_bits` bits.
    pub fn allocate(size_bits: usize) -> Result<Self> {
        let width = (size_bits.min(MAX_KEY_BITS) + 7) / 8;
        let mut buf = Vec::new();
        buf.try_reserve_exact(width)?;
        buf.resize(width, 0);
        Ok(Self {
            buf: Zeroizing::new(buf),
        })
    }

    /// Allocate storage of `size_bits` and store `value` in it.
    pub fn with_value(value: &RsaBigInt, size_bits: usize) -> Result<Self> {
        let mut material = Self::allocate(size_bits)?;
        material.store(value)?;
        Ok(material)
    }

    /// Overwrite the stored value. Fails if `value` does not fit.
    pub fn store(&mut self, value: &RsaBigInt) -> std::result::Result<(), EngineError> {
        let encoded = Zeroizing::new(to_bytes_padded(value, self.buf.len())?);
        self.buf.copy_from_slice(&encoded);
        Ok(())
    }

    /// Capacity in bytes
    pub fn width(&self) -> usize {
        self.buf.len()
    }

    pub fn value(&self) -> RsaBigInt {
        from_bytes(&self.buf)
    }

    /// Big-endian bytes without leading zeros (a zero value is one 0x00 byte)
    pub fn to_minimal_bytes(&self) -> Zeroizing<Vec<u8>> {
        let start = self
            .buf
            .iter()
            .position(|&b| b != 0)
            .unwrap_or(self.buf.len().saturating_sub(1));
        Zeroizing::new(self.buf[start..].to_vec())
    }
}

/// Variant tag reported for a key reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum KeyType {
    Public = 0,
    Private = 1,
    Invalid = 99,
}

/// RSA Public Key
#[derive(Clone)]
pub struct RsaPublicKey {
    modulus: KeyMaterial,
    exponent: KeyMaterial,
    bits: usize,
}

/// RSA Private Key, always carrying the full CRT parameter set
#[derive(Clone)]
pub struct RsaPrivateKey {
    public: RsaPublicKey,
    d: KeyMaterial,
    p: KeyMaterial,
    q: KeyMaterial,
    dp: KeyMaterial,
    dq: KeyMaterial,
    qinv: KeyMaterial,
}

/// Raw integer components of a private key, as decoded or computed.
pub(crate) struct PrivateParts {
    pub n: RsaBigInt,
    pub e: RsaBigInt,
    pub d: RsaBigInt,
    pub p: RsaBigInt,
    pub q: RsaBigInt,
    pub dp: RsaBigInt,
    pub dq: RsaBigInt,
    pub qinv: RsaBigInt,
}

/// An RSA key object: either a public key or a full private key.
#[derive(Clone)]
pub enum RsaKey {
    Public(RsaPublicKey),
    Private(RsaPrivateKey),
}

impl RsaPublicKey {
    /// Build a public key with storage sized for `capacity_bits`. The key
    /// size is taken from the modulus itself.
    pub(crate) fn new(n: &RsaBigInt, e: &RsaBigInt, capacity_bits: usize) -> Result<Self> {
        if n.is_zero() || e.is_zero() {
            return Err(CryptorError::Param);
        }
        let bits = n.bits() as usize;
        if bits > MAX_KEY_BITS {
            return Err(CryptorError::Param);
        }
        let capacity = capacity_bits.max(bits);
        Ok(Self {
            modulus: KeyMaterial::with_value(n, capacity)?,
            exponent: KeyMaterial::with_value(e, capacity)?,
            bits,
        })
    }

    /// Modulus size in bits
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Modulus size in bytes. Ciphertexts and signatures have this length.
    pub fn size(&self) -> usize {
        (self.bits + 7) / 8
    }

    pub fn n(&self) -> RsaBigInt {
        self.modulus.value()
    }

    pub fn e(&self) -> RsaBigInt {
        self.exponent.value()
    }

    pub(crate) fn modulus_material(&self) -> &KeyMaterial {
        &self.modulus
    }

    pub(crate) fn exponent_material(&self) -> &KeyMaterial {
        &self.exponent
    }

    /// m^e mod n
    pub(crate) fn public_op(&self, m: &RsaBigInt) -> std::result::Result<RsaBigInt, EngineError> {
        let n = self.n();
        if m >= &n {
            return Err(EngineError::OutOfRange);
        }
        Ok(mod_pow(m, &self.e(), &n))
    }
}

impl RsaPrivateKey {
    /// Derive d and the CRT parameters from the primes and assemble a key.
    pub(crate) fn from_primes(
        p: &RsaBigInt,
        q: &RsaBigInt,
        e: &RsaBigInt,
        capacity_bits: usize,
    ) -> Result<Self> {
        let params = crt_params(p, q, e)?;
        Self::from_parts(
            &PrivateParts {
                n: p * q,
                e: e.clone(),
                d: params.d,
                p: p.clone(),
                q: q.clone(),
                dp: params.dp,
                dq: params.dq,
                qinv: params.qinv,
            },
            capacity_bits,
        )
    }

    /// Assemble a key from already-validated components.
    pub(crate) fn from_parts(parts: &PrivateParts, capacity_bits: usize) -> Result<Self> {
        let public = RsaPublicKey::new(&parts.n, &parts.e, capacity_bits)?;
        let capacity = capacity_bits.max(public.bits());
        Ok(Self {
            d: KeyMaterial::with_value(&parts.d, capacity)?,
            p: KeyMaterial::with_value(&parts.p, capacity)?,
            q: KeyMaterial::with_value(&parts.q, capacity)?,
            dp: KeyMaterial::with_value(&parts.dp, capacity)?,
            dq: KeyMaterial::with_value(&parts.dq, capacity)?,
            qinv: KeyMaterial::with_value(&parts.qinv, capacity)?,
            public,
        })
    }

    /// Project the public half (modulus and public exponent) into a new key.
    pub fn to_public(&self) -> Result<RsaPublicKey> {
        RsaPublicKey::new(&self.public.n(), &self.public.e(), self.public.bits())
    }

    pub fn bits(&self) -> usize {
        self.public.bits()
    }

    pub fn size(&self) -> usize {
        self.public.size()
    }

    pub fn n(&self) -> RsaBigInt {
        self.public.n()
    }

    pub fn e(&self) -> RsaBigInt {
        self.public.e()
    }

    pub(crate) fn public_part(&self) -> &RsaPublicKey {
        &self.public
    }

    pub(crate) fn d_material(&self) -> &KeyMaterial {
        &self.d
    }

    pub(crate) fn p_material(&self) -> &KeyMaterial {
        &self.p
    }

    pub(crate) fn q_material(&self) -> &KeyMaterial {
        &self.q
    }

    /// All eight components, in PKCS#1 order: n, e, d, p, q, dp, dq, qinv
    pub(crate) fn materials(&self) -> [&KeyMaterial; 8] {
        [
            &self.public.modulus,
            &self.public.exponent,
            &self.d,
            &self.p,
            &self.q,
            &self.dp,
            &self.dq,
            &self.qinv,
        ]
    }

    /// c^d mod n via CRT, checked against the public exponent so that a
    /// faulty result is never released.
    pub(crate) fn private_op(&self, c: &RsaBigInt) -> std::result::Result<RsaBigInt, EngineError> {
        let n = self.n();
        if c >= &n {
            return Err(EngineError::OutOfRange);
        }

        let m = crt_exponentiate(
            c,
            &self.p.value(),
            &self.q.value(),
            &self.dp.value(),
            &self.dq.value(),
            &self.qinv.value(),
        );

        if &mod_pow(&m, &self.e(), &n) != c {
            return Err(EngineError::Inconsistent);
        }
        Ok(m)
    }
}

impl RsaKey {
    pub fn key_type(&self) -> KeyType {
        match self {
            RsaKey::Public(_) => KeyType::Public,
            RsaKey::Private(_) => KeyType::Private,
        }
    }

    /// Modulus size in bits
    pub fn bits(&self) -> usize {
        match self {
            RsaKey::Public(key) => key.bits(),
            RsaKey::Private(key) => key.bits(),
        }
    }

    /// Modulus size in bytes
    pub fn size(&self) -> usize {
        (self.bits() + 7) / 8
    }

    /// The key as a public key, only when this is the Public variant.
    pub fn as_public(&self) -> Option<&RsaPublicKey> {
        match self {
            RsaKey::Public(key) => Some(key),
            RsaKey::Private(_) => None,
        }
    }

    /// The key as a private key, only when this is the Private variant.
    pub fn as_private(&self) -> Option<&RsaPrivateKey> {
        match self {
            RsaKey::Private(key) => Some(key),
            RsaKey::Public(_) => None,
        }
    }

    /// The public key matching this key (a copy for Public, a projection
    /// for Private).
    pub fn public_key(&self) -> Result<RsaKey> {
        match self {
            RsaKey::Public(key) => Ok(RsaKey::Public(key.clone())),
            RsaKey::Private(key) => Ok(RsaKey::Public(key.to_public()?)),
        }
    }

    pub(crate) fn public_part(&self) -> &RsaPublicKey {
        match self {
            RsaKey::Public(key) => key,
            RsaKey::Private(key) => key.public_part(),
        }
    }
}

impl From<RsaPublicKey> for RsaKey {
    fn from(key: RsaPublicKey) -> Self {
        RsaKey::Public(key)
    }
}

impl From<RsaPrivateKey> for RsaKey {
    fn from(key: RsaPrivateKey) -> Self {
        RsaKey::Private(key)
    }
}

impl fmt::Debug for RsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RsaPublicKey({} bits)", self.bits)
    }
}

impl fmt::Debug for RsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RsaPrivateKey({} bits)", self.bits())
    }
}

impl fmt::Debug for RsaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RsaKey::Public(key) => fmt::Debug::fmt(key, f),
            RsaKey::Private(key) => fmt::Debug::fmt(key, f),
        }
    }
}

/// Variant of an optional key reference; `None` reports `Invalid`.
pub fn key_type(key: Option<&RsaKey>) -> KeyType {
    key.map_or(KeyType::Invalid, RsaKey::key_type)
}

/// Modulus size in bits of an optional key reference.
pub fn key_size(key: Option<&RsaKey>) -> Result<usize> {
    key.map(RsaKey::bits).ok_or(CryptorError::Param)
}

/// Release a key. Its material is zeroed as it is dropped; `None` is a
/// no-op.
pub fn release(key: Option<RsaKey>) {
    drop(key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsa::bigint::from_u64;

    fn toy_private() -> RsaPrivateKey {
        // p = 61, q = 53, n = 3233
        RsaPrivateKey::from_primes(&from_u64(61), &from_u64(53), &from_u64(17), 64).unwrap()
    }

    #[test]
    fn test_material_allocation_is_capped() {
        let material = KeyMaterial::allocate(100_000).unwrap();
        assert_eq!(material.width(), MAX_KEY_BITS / 8);
        assert!(material.value().is_zero());
    }

    #[test]
    fn test_material_store_and_read() {
        let mut material = KeyMaterial::allocate(32).unwrap();
        material.store(&from_u64(0x0102)).unwrap();
        assert_eq!(material.value(), from_u64(0x0102));
        assert_eq!(&material.to_minimal_bytes()[..], &[0x01, 0x02]);
        assert_eq!(material.store(&from_u64(1 << 40)), Err(EngineError::Overflow));
    }

    #[test]
    fn test_zero_minimal_bytes() {
        let material = KeyMaterial::allocate(16).unwrap();
        assert_eq!(&material.to_minimal_bytes()[..], &[0x00]);
    }

    #[test]
    fn test_bits_recomputed_from_modulus() {
        // Oversized capacity must not leak into the reported size
        let key = RsaPublicKey::new(&from_u64(3233), &from_u64(17), MAX_KEY_BITS).unwrap();
        assert_eq!(key.bits(), 12);
        assert_eq!(key.size(), 2);
    }

    #[test]
    fn test_private_projection() {
        let private = toy_private();
        let public = private.to_public().unwrap();
        assert_eq!(public.n(), from_u64(3233));
        assert_eq!(public.e(), from_u64(17));
        assert_eq!(public.bits(), private.bits());
    }

    #[test]
    fn test_private_op_inverts_public_op() {
        let private = toy_private();
        let m = from_u64(65);
        let c = private.public_part().public_op(&m).unwrap();
        assert_eq!(c, from_u64(2790));
        assert_eq!(private.private_op(&c).unwrap(), m);
    }

    #[test]
    fn test_ops_reject_unreduced_input() {
        let private = toy_private();
        assert_eq!(
            private.public_part().public_op(&from_u64(3233)),
            Err(EngineError::OutOfRange)
        );
        assert_eq!(private.private_op(&from_u64(4000)), Err(EngineError::OutOfRange));
    }

    #[test]
    fn test_variant_accessors() {
        let key = RsaKey::Private(toy_private());
        assert_eq!(key.key_type(), KeyType::Private);
        assert!(key.as_public().is_none());
        assert!(key.as_private().is_some());

        let public = key.public_key().unwrap();
        assert_eq!(public.key_type(), KeyType::Public);
        assert!(public.as_private().is_none());
    }

    #[test]
    fn test_optional_key_queries() {
        let key = RsaKey::Private(toy_private());
        assert_eq!(key_type(Some(&key)), KeyType::Private);
        assert_eq!(key_type(None), KeyType::Invalid);
        assert_eq!(key_size(Some(&key)), Ok(12));
        assert_eq!(key_size(None), Err(CryptorError::Param));

        release(Some(key));
        release(None);
    }

    #[test]
    fn test_debug_hides_material() {
        let key = RsaKey::Private(toy_private());
        assert_eq!(format!("{:?}", key), "RsaPrivateKey(12 bits)");
    }
}
