// RSA Padding Schemes
// EME-PKCS1-v1_5, EME-OAEP with MGF1, and EMSA-PKCS1-v1_5 encodings

use rand::{CryptoRng, RngCore};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq, ConstantTimeGreater};
use zeroize::Zeroizing;

use super::bigint::EngineError;
use super::der::{self, Tag};
use crate::digest::DigestInfo;

/// Asymmetric padding selector.
///
/// Numbering follows the platform API. Only `Pkcs1` and `Oaep` are
/// implemented; the other tags are accepted as values and rejected by the
/// operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Padding {
    None = 1000,
    Pkcs1 = 1001,
    Oaep = 1002,
    X931 = 1003,
    Pkcs1Raw = 1004,
    Pss = 1005,
}

impl Padding {
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            1000 => Some(Padding::None),
            1001 => Some(Padding::Pkcs1),
            1002 => Some(Padding::Oaep),
            1003 => Some(Padding::X931),
            1004 => Some(Padding::Pkcs1Raw),
            1005 => Some(Padding::Pss),
            _ => None,
        }
    }
}

/// Minimum padding overhead: 0x00 || 0x0? || PS (>= 8 bytes) || 0x00
const PKCS1_OVERHEAD: usize = 11;

/// PKCS#1 v1.5 Padding for encryption
/// Format: 0x00 || 0x02 || PS || 0x00 || data
/// PS = padding string of non-zero random bytes (at least 8 bytes)
pub fn pad_pkcs1_v15<R: RngCore + CryptoRng + ?Sized>(
    data: &[u8],
    k: usize,
    rng: &mut R,
) -> Result<Zeroizing<Vec<u8>>, EngineError> {
    if k < PKCS1_OVERHEAD || data.len() > k - PKCS1_OVERHEAD {
        return Err(EngineError::MessageTooLong);
    }

    let ps_len = k - data.len() - 3;
    let mut em = Zeroizing::new(vec![0u8; k]);
    em[1] = 0x02;

    // Non-zero random bytes, redrawing zeros
    let padding = &mut em[2..2 + ps_len];
    rng.try_fill_bytes(padding).map_err(|_| EngineError::Entropy)?;
    for byte in padding.iter_mut() {
        let mut b = [*byte];
        while b[0] == 0 {
            rng.try_fill_bytes(&mut b).map_err(|_| EngineError::Entropy)?;
        }
        *byte = b[0];
    }

    em[2 + ps_len] = 0x00;
    em[3 + ps_len..].copy_from_slice(data);
    Ok(em)
}

/// Remove PKCS#1 v1.5 encryption padding.
///
/// The structure is checked without data-dependent branches; a single
/// undifferentiated error is returned on any mismatch.
pub fn unpad_pkcs1_v15(em: &[u8]) -> Result<Vec<u8>, EngineError> {
    if em.len() < PKCS1_OVERHEAD {
        return Err(EngineError::Encoding);
    }

    let header_ok = em[0].ct_eq(&0x00) & em[1].ct_eq(&0x02);

    // Index of the first zero byte after the header
    let mut looking = Choice::from(1u8);
    let mut separator = 0u32;
    for (i, &b) in em.iter().enumerate().skip(2) {
        let is_zero = b.ct_eq(&0x00);
        separator.conditional_assign(&(i as u32), looking & is_zero);
        looking &= !is_zero;
    }

    // At least 8 bytes of PS: the separator sits at index 10 or later
    let valid = header_ok & !looking & separator.ct_gt(&9);
    if !bool::from(valid) {
        return Err(EngineError::Encoding);
    }

    Ok(em[separator as usize + 1..].to_vec())
}

/// MGF1 mask generation: `len` bytes derived from `seed`
pub fn mgf1(seed: &[u8], len: usize, digest: &DigestInfo) -> Result<Zeroizing<Vec<u8>>, EngineError> {
    let mut mask = Zeroizing::new(Vec::with_capacity(len + digest.output_size));
    let mut counter: u32 = 0;
    while mask.len() < len {
        let counter_bytes = counter.to_be_bytes();
        let block = digest
            .hash(&[seed, &counter_bytes[..]])
            .ok_or(EngineError::Encoding)?;
        mask.extend_from_slice(&block);
        counter += 1;
    }
    mask.truncate(len);
    Ok(mask)
}

fn xor_in_place(target: &mut [u8], mask: &[u8]) {
    for (t, m) in target.iter_mut().zip(mask.iter()) {
        *t ^= m;
    }
}

/// EME-OAEP encoding (RFC 8017 7.1.1)
/// Format: 0x00 || maskedSeed || maskedDB, DB = lHash || PS || 0x01 || M
pub fn oaep_encode<R: RngCore + CryptoRng + ?Sized>(
    message: &[u8],
    label: &[u8],
    digest: &DigestInfo,
    k: usize,
    rng: &mut R,
) -> Result<Zeroizing<Vec<u8>>, EngineError> {
    let h_len = digest.output_size;
    if k < 2 * h_len + 2 || message.len() > k - 2 * h_len - 2 {
        return Err(EngineError::MessageTooLong);
    }

    let l_hash = digest.hash(&[label]).ok_or(EngineError::Encoding)?;

    let mut em = Zeroizing::new(vec![0u8; k]);
    let (seed, db) = em[1..].split_at_mut(h_len);

    db[..h_len].copy_from_slice(&l_hash);
    let db_len = db.len();
    db[db_len - message.len() - 1] = 0x01;
    db[db_len - message.len()..].copy_from_slice(message);

    rng.try_fill_bytes(seed).map_err(|_| EngineError::Entropy)?;

    let db_mask = mgf1(seed, db_len, digest)?;
    xor_in_place(db, &db_mask);

    let seed_mask = mgf1(db, h_len, digest)?;
    xor_in_place(seed, &seed_mask);

    Ok(em)
}

/// EME-OAEP decoding (RFC 8017 7.1.2)
///
/// All checks are folded into one constant-time verdict so that callers
/// cannot tell which of them failed.
pub fn oaep_decode(em: &[u8], label: &[u8], digest: &DigestInfo) -> Result<Vec<u8>, EngineError> {
    let h_len = digest.output_size;
    let k = em.len();
    if k < 2 * h_len + 2 {
        return Err(EngineError::Encoding);
    }

    let l_hash = digest.hash(&[label]).ok_or(EngineError::Encoding)?;

    let mut work = Zeroizing::new(em.to_vec());
    let first_ok = work[0].ct_eq(&0x00);
    let (seed, db) = work[1..].split_at_mut(h_len);

    let seed_mask = mgf1(db, h_len, digest)?;
    xor_in_place(seed, &seed_mask);
    let db_mask = mgf1(seed, db.len(), digest)?;
    xor_in_place(db, &db_mask);

    let hash_ok = db[..h_len].ct_eq(&l_hash[..]);

    // Skip zero padding to the 0x01 separator
    let mut looking = Choice::from(1u8);
    let mut separator = 0u32;
    let mut bad_padding = Choice::from(0u8);
    for (i, &b) in db.iter().enumerate().skip(h_len) {
        let is_zero = b.ct_eq(&0x00);
        let is_one = b.ct_eq(&0x01);
        separator.conditional_assign(&(i as u32), looking & is_one);
        bad_padding |= looking & !is_zero & !is_one;
        looking &= !is_one;
    }

    let valid = first_ok & hash_ok & !looking & !bad_padding;
    if !bool::from(valid) {
        return Err(EngineError::Encoding);
    }

    Ok(db[separator as usize + 1..].to_vec())
}

/// DER-encoded DigestInfo: SEQUENCE { SEQUENCE { OID, NULL }, OCTET STRING hash }
pub fn digest_info_der(digest: &DigestInfo, hash: &[u8]) -> Vec<u8> {
    let mut algorithm = Vec::new();
    der::write_tlv(&mut algorithm, Tag::Oid, digest.oid);
    der::write_tlv(&mut algorithm, Tag::Null, &[]);

    let mut body = Vec::new();
    der::write_tlv(&mut body, Tag::Sequence, &algorithm);
    der::write_tlv(&mut body, Tag::OctetString, hash);

    let mut out = Vec::new();
    der::write_tlv(&mut out, Tag::Sequence, &body);
    out
}

/// EMSA-PKCS1-v1_5 encoding for signatures
/// Format: 0x00 || 0x01 || PS (0xFF) || 0x00 || DigestInfo
pub fn emsa_pkcs1_v15(hash: &[u8], digest: &DigestInfo, k: usize) -> Result<Vec<u8>, EngineError> {
    let t = digest_info_der(digest, hash);
    if k < t.len() + PKCS1_OVERHEAD {
        return Err(EngineError::MessageTooLong);
    }

    let ps_len = k - t.len() - 3;
    let mut em = Vec::with_capacity(k);
    em.push(0x00);
    em.push(0x01);
    em.extend(std::iter::repeat(0xFF).take(ps_len));
    em.push(0x00);
    em.extend_from_slice(&t);
    Ok(em)
}
