//! Content conversion for primitive schema nodes
//!
//! Maps the content octets of each [`PrimitiveKind`] to a [`Value`] and back,
//! applying size, range and label constraints.

use crate::codec::{integer, oid, real, string, time};
use crate::config::Encoding;
use crate::schema::{Constraints, PrimitiveKind};
use dermodel_core::{BigInt, BitString, CodecResult, ErrorKind, ObjectIdentifier, Timestamp, Value};
use num_traits::ToPrimitive;

pub fn decode_primitive(
    kind: PrimitiveKind,
    content: &[u8],
    constraints: &Constraints,
    encoding: Encoding,
) -> CodecResult<Value> {
    check_size(kind, content, constraints)?;

    match kind {
        PrimitiveKind::Bool => decode_bool(content, encoding),
        PrimitiveKind::Null => {
            if !content.is_empty() {
                return Err(ErrorKind::MalformedContent(format!(
                    "NULL with {} content bytes",
                    content.len()
                )));
            }
            Ok(Value::Null)
        }
        PrimitiveKind::Int | PrimitiveKind::Enum => {
            let value = integer::decode_integer(content)?;
            if let Some((min, max)) = &constraints.range {
                integer::check_range(&value, min, max)?;
            }
            let label = constraints
                .labels
                .as_ref()
                .and_then(|labels| labels.label_for(&value.to_string()));
            Ok(match label {
                Some(label) => Value::Str(label.to_string()),
                None => Value::Int(value),
            })
        }
        PrimitiveKind::BitStr => {
            let (&unused, data) = content.split_first().ok_or_else(|| {
                ErrorKind::MalformedContent("BIT STRING without unused-bits octet".to_string())
            })?;
            Ok(Value::BitString(BitString::from_unused_bits(
                data.to_vec(),
                unused,
            )?))
        }
        PrimitiveKind::OctStr => Ok(Value::Bytes(content.to_vec())),
        PrimitiveKind::ObjId => {
            let oid = oid::decode_oid(content)?;
            Ok(match &constraints.labels {
                Some(labels) => {
                    let dotted = oid.to_dotted();
                    Value::Str(labels.label_for(&dotted).map_or(dotted.clone(), str::to_string))
                }
                None => Value::Oid(oid),
            })
        }
        PrimitiveKind::Real => Ok(Value::Real(real::decode_real(content)?)),
        PrimitiveKind::Utf8Str => Ok(Value::Str(string::decode_utf8(content)?)),
        PrimitiveKind::BmpStr => Ok(Value::Str(string::decode_bmp(content)?)),
        PrimitiveKind::UtcTime => Ok(Value::Time(time::decode_utc_time(content)?)),
        PrimitiveKind::GenTime => Ok(Value::Time(time::decode_generalized_time(content)?)),
        PrimitiveKind::ObjDesc
        | PrimitiveKind::NumStr
        | PrimitiveKind::PrintStr
        | PrimitiveKind::T61Str
        | PrimitiveKind::Ia5Str
        | PrimitiveKind::GraphicStr
        | PrimitiveKind::Iso646Str
        | PrimitiveKind::GeneralStr => Ok(Value::Str(string::decode_latin1(content))),
    }
}

pub fn encode_primitive(
    kind: PrimitiveKind,
    value: &Value,
    constraints: &Constraints,
) -> CodecResult<Vec<u8>> {
    let content = match kind {
        PrimitiveKind::Bool => match value {
            Value::Bool(b) => vec![if *b { 0xFF } else { 0x00 }],
            other => return Err(mismatch("bool", other)),
        },
        PrimitiveKind::Null => match value {
            Value::Null => Vec::new(),
            other => return Err(mismatch("null", other)),
        },
        PrimitiveKind::Int | PrimitiveKind::Enum => {
            let number = integer_input(value, constraints)?;
            if let Some((min, max)) = &constraints.range {
                integer::check_range(&number, min, max)?;
            }
            integer::encode_integer(&number)
        }
        PrimitiveKind::BitStr => match value {
            Value::BitString(bits) => {
                let mut content = Vec::with_capacity(bits.as_bytes().len() + 1);
                content.push(bits.unused_bits());
                content.extend_from_slice(bits.as_bytes());
                content
            }
            Value::Bytes(bytes) => {
                let mut content = Vec::with_capacity(bytes.len() + 1);
                content.push(0);
                content.extend_from_slice(bytes);
                content
            }
            other => return Err(mismatch("bitstring or bytes", other)),
        },
        PrimitiveKind::OctStr => match value {
            Value::Bytes(bytes) => bytes.clone(),
            Value::Str(text) => text.as_bytes().to_vec(),
            other => return Err(mismatch("bytes", other)),
        },
        PrimitiveKind::ObjId => oid::encode_oid(&oid_input(value, constraints)?)?,
        PrimitiveKind::Real => match value {
            Value::Real(r) => real::encode_real(*r),
            Value::Int(i) => real::encode_real(i.to_f64().unwrap_or(f64::NAN)),
            other => return Err(mismatch("real", other)),
        },
        PrimitiveKind::Utf8Str => string::encode_utf8(text_input(value)?),
        PrimitiveKind::BmpStr => string::encode_bmp(text_input(value)?),
        PrimitiveKind::UtcTime => time::encode_utc_time(&time_input(value)?)?,
        PrimitiveKind::GenTime => time::encode_generalized_time(&time_input(value)?)?,
        PrimitiveKind::ObjDesc
        | PrimitiveKind::NumStr
        | PrimitiveKind::PrintStr
        | PrimitiveKind::T61Str
        | PrimitiveKind::Ia5Str
        | PrimitiveKind::GraphicStr
        | PrimitiveKind::Iso646Str
        | PrimitiveKind::GeneralStr => string::encode_latin1(text_input(value)?)?,
    };

    check_size(kind, &content, constraints)?;
    Ok(content)
}

/// Size constraint on content length; BIT STRING excludes its unused-bits octet
pub fn check_size(kind: PrimitiveKind, content: &[u8], constraints: &Constraints) -> CodecResult<()> {
    let Some((min, max)) = constraints.size else {
        return Ok(());
    };
    let length = match kind {
        PrimitiveKind::BitStr => content.len().saturating_sub(1),
        _ => content.len(),
    };
    if length < min || length > max {
        return Err(ErrorKind::LengthOutOfRange { length, min, max });
    }
    Ok(())
}

fn decode_bool(content: &[u8], encoding: Encoding) -> CodecResult<Value> {
    match content {
        [0x00] => Ok(Value::Bool(false)),
        [0xFF] => Ok(Value::Bool(true)),
        [_] if !encoding.is_strict() => Ok(Value::Bool(true)),
        [other] => Err(ErrorKind::MalformedContent(format!(
            "non-canonical BOOLEAN 0x{:02X}",
            other
        ))),
        _ => Err(ErrorKind::MalformedContent(format!(
            "BOOLEAN with {} content bytes",
            content.len()
        ))),
    }
}

fn mismatch(expected: &str, found: &Value) -> ErrorKind {
    ErrorKind::invalid_value(expected, found.type_name())
}

fn integer_input(value: &Value, constraints: &Constraints) -> CodecResult<BigInt> {
    match value {
        Value::Int(i) => Ok(i.clone()),
        Value::Str(text) => {
            let key = constraints
                .labels
                .as_ref()
                .and_then(|labels| labels.key_for(text))
                .unwrap_or(text);
            key.trim()
                .parse::<BigInt>()
                .map_err(|_| ErrorKind::invalid_value("integer or known label", format!("{:?}", text)))
        }
        other => Err(mismatch("int", other)),
    }
}

fn oid_input(value: &Value, constraints: &Constraints) -> CodecResult<ObjectIdentifier> {
    match value {
        Value::Oid(oid) => Ok(oid.clone()),
        Value::Str(text) => {
            let dotted = constraints
                .labels
                .as_ref()
                .and_then(|labels| labels.key_for(text))
                .unwrap_or(text);
            ObjectIdentifier::from_dotted(dotted)
        }
        Value::Seq(components) => {
            let arcs = components
                .iter()
                .map(|component| match component {
                    Value::Int(i) => i.to_u64(),
                    Value::Str(s) => s.trim().parse::<u64>().ok(),
                    _ => None,
                })
                .collect::<Option<Vec<u64>>>()
                .ok_or_else(|| {
                    ErrorKind::MalformedObjectIdentifier(
                        "components must be non-negative integers".to_string(),
                    )
                })?;
            ObjectIdentifier::new(arcs)
        }
        other => Err(mismatch("oid, dotted string or component list", other)),
    }
}

fn text_input(value: &Value) -> CodecResult<&str> {
    match value {
        Value::Str(text) => Ok(text),
        other => Err(mismatch("string", other)),
    }
}

fn time_input(value: &Value) -> CodecResult<Timestamp> {
    match value {
        Value::Time(ts) => Ok(*ts),
        Value::Int(millis) => millis
            .to_i64()
            .map(Timestamp::from_epoch_millis)
            .ok_or_else(|| ErrorKind::InvalidDate(format!("{} ms is out of range", millis))),
        Value::Str(text) => Timestamp::parse(text),
        other => Err(mismatch("time, epoch milliseconds or date string", other)),
    }
}
