// DER Building Blocks
// Strict tag/length/integer parsing over untrusted input, and a small writer

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    Integer = 0x02,
    OctetString = 0x04,
    Null = 0x05,
    Oid = 0x06,
    Sequence = 0x30,
}

impl From<Tag> for u8 {
    fn from(tag: Tag) -> Self {
        tag as Self
    }
}

/// Structural DER failure. Carries no detail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DerError;

impl From<untrusted::EndOfInput> for DerError {
    fn from(_: untrusted::EndOfInput) -> Self {
        DerError
    }
}

pub fn expect_tag_and_get_value<'a>(
    input: &mut untrusted::Reader<'a>,
    tag: Tag,
) -> Result<untrusted::Input<'a>, DerError> {
    let (actual_tag, inner) = read_tag_and_get_value(input)?;
    if u8::from(tag) != actual_tag {
        return Err(DerError);
    }
    Ok(inner)
}

pub fn read_tag_and_get_value<'a>(
    input: &mut untrusted::Reader<'a>,
) -> Result<(u8, untrusted::Input<'a>), DerError> {
    let tag = input.read_byte()?;
    if (tag & 0x1F) == 0x1F {
        return Err(DerError); // High tag number form is not allowed.
    }

    // Short form below 0x80; otherwise the low bits count the length bytes.
    let length = match input.read_byte()? {
        n if (n & 0x80) == 0 => usize::from(n),
        0x81 => {
            let second_byte = input.read_byte()?;
            if second_byte < 128 {
                return Err(DerError); // Not the canonical encoding.
            }
            usize::from(second_byte)
        }
        0x82 => {
            let second_byte = usize::from(input.read_byte()?);
            let third_byte = usize::from(input.read_byte()?);
            let combined = (second_byte << 8) | third_byte;
            if combined < 256 {
                return Err(DerError); // Not the canonical encoding.
            }
            combined
        }
        _ => {
            return Err(DerError); // We don't support longer lengths.
        }
    };

    let inner = input.read_bytes(length)?;
    Ok((tag, inner))
}

/// Parse a `tag` element and run `decoder` over its contents, which must
/// consume them entirely.
pub fn nested<'a, F, R>(
    input: &mut untrusted::Reader<'a>,
    tag: Tag,
    decoder: F,
) -> Result<R, DerError>
where
    F: FnOnce(&mut untrusted::Reader<'a>) -> Result<R, DerError>,
{
    let inner = expect_tag_and_get_value(input, tag)?;
    inner.read_all(DerError, decoder)
}

/// Parse a non-negative INTEGER and return its magnitude without the sign
/// byte. Zero is returned as a single 0x00 byte.
pub fn nonnegative_integer<'a>(input: &mut untrusted::Reader<'a>) -> Result<&'a [u8], DerError> {
    let value = expect_tag_and_get_value(input, Tag::Integer)?.as_slice_less_safe();
    match value.split_first().ok_or(DerError)? {
        // Zero or leading zero.
        (0, rest) => match rest.first() {
            None => Ok(value),
            // Necessary leading zero.
            Some(&second) if second & 0x80 == 0x80 => Ok(rest),
            // Unnecessary leading zero.
            _ => Err(DerError),
        },
        // Positive value with no leading zero.
        (first, _) if first & 0x80 == 0 => Ok(value),
        // Negative value.
        (_, _) => Err(DerError),
    }
}

/// Parse an INTEGER in [0, 255], as used for version fields.
pub fn small_nonnegative_integer(input: &mut untrusted::Reader) -> Result<u8, DerError> {
    match *nonnegative_integer(input)? {
        [b] => Ok(b),
        _ => Err(DerError),
    }
}

/// Number of bytes needed for the length octets of `len`
fn length_len(len: usize) -> usize {
    match len {
        0..=0x7F => 1,
        0x80..=0xFF => 2,
        0x100..=0xFFFF => 3,
        _ => 1 + (usize::BITS as usize / 8) - (len.leading_zeros() as usize / 8),
    }
}

/// Total encoded size of a TLV with `content_len` bytes of contents
pub fn tlv_len(content_len: usize) -> usize {
    1 + length_len(content_len) + content_len
}

fn write_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let count = length_len(len) - 1;
    out.push(0x80 | count as u8);
    for i in (0..count).rev() {
        out.push((len >> (8 * i)) as u8);
    }
}

/// Write `tag`, the length of `value`, then `value`.
pub fn write_tlv(out: &mut Vec<u8>, tag: Tag, value: &[u8]) {
    out.push(tag.into());
    write_length(out, value.len());
    out.extend_from_slice(value);
}

/// Contents length of an INTEGER encoding the unsigned big-endian `magnitude`
pub fn positive_integer_len(magnitude: &[u8]) -> usize {
    let trimmed = trim_leading_zeros(magnitude);
    match trimmed.first() {
        None => 1,
        Some(&first) if first & 0x80 != 0 => trimmed.len() + 1,
        Some(_) => trimmed.len(),
    }
}

/// Write an INTEGER holding the unsigned big-endian `magnitude`.
pub fn write_positive_integer(out: &mut Vec<u8>, magnitude: &[u8]) {
    let trimmed = trim_leading_zeros(magnitude);
    out.push(Tag::Integer.into());
    write_length(out, positive_integer_len(trimmed));
    match trimmed.first() {
        None => out.push(0),
        Some(&first) => {
            if first & 0x80 != 0 {
                out.push(0); // Disambiguate negative number.
            }
            out.extend_from_slice(trimmed);
        }
    }
}

fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}
