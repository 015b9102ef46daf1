//! OBJECT IDENTIFIER content codec
//!
//! Each subidentifier is a base-128 varint, most significant group first,
//! with the continuation bit set on every octet but the last. The first two
//! arcs share one subidentifier, `40 * first + second`.

use dermodel_core::{CodecResult, ErrorKind, ObjectIdentifier};

pub fn encode_oid(oid: &ObjectIdentifier) -> CodecResult<Vec<u8>> {
    let [first, second, rest @ ..] = oid.arcs() else {
        return Err(ErrorKind::MalformedObjectIdentifier(
            "at least two arcs are required".to_string(),
        ));
    };
    let first = first
        .checked_mul(40)
        .and_then(|v| v.checked_add(*second))
        .ok_or_else(|| {
            ErrorKind::MalformedObjectIdentifier(format!(
                "first subidentifier of {} overflows",
                oid
            ))
        })?;

    let mut content = Vec::with_capacity(rest.len() + 6);
    write_varint(&mut content, first);
    for &arc in rest {
        write_varint(&mut content, arc);
    }
    Ok(content)
}

fn write_varint(out: &mut Vec<u8>, value: u64) {
    let mut groups = [0u8; 10];
    let mut count = 0;
    let mut remaining = value;
    loop {
        groups[count] = (remaining & 0x7F) as u8;
        count += 1;
        remaining >>= 7;
        if remaining == 0 {
            break;
        }
    }
    for i in (0..count).rev() {
        let continuation = if i > 0 { 0x80 } else { 0x00 };
        out.push(groups[i] | continuation);
    }
}

pub fn decode_oid(content: &[u8]) -> CodecResult<ObjectIdentifier> {
    if content.is_empty() {
        return Err(ErrorKind::MalformedObjectIdentifier(
            "empty content".to_string(),
        ));
    }

    let mut subidentifiers = Vec::new();
    let mut pos = 0;
    while pos < content.len() {
        let (value, consumed) = read_varint(&content[pos..])?;
        subidentifiers.push(value);
        pos += consumed;
    }

    let first = subidentifiers[0];
    let mut arcs = Vec::with_capacity(subidentifiers.len() + 1);
    match first {
        0..=39 => arcs.extend([0, first]),
        40..=79 => arcs.extend([1, first - 40]),
        _ => arcs.extend([2, first - 80]),
    }
    arcs.extend_from_slice(&subidentifiers[1..]);

    ObjectIdentifier::new(arcs)
}

fn read_varint(data: &[u8]) -> CodecResult<(u64, usize)> {
    if data[0] == 0x80 {
        return Err(ErrorKind::MalformedObjectIdentifier(
            "subidentifier has a leading zero group".to_string(),
        ));
    }
    let mut value = 0u64;
    for (i, &byte) in data.iter().enumerate() {
        value = value
            .checked_mul(128)
            .map(|v| v | (byte & 0x7F) as u64)
            .ok_or_else(|| {
                ErrorKind::MalformedObjectIdentifier("subidentifier overflows 64 bits".to_string())
            })?;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(ErrorKind::MalformedObjectIdentifier(
        "truncated subidentifier".to_string(),
    ))
}
