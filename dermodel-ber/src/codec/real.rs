//! REAL content codec (X.690 §8.5)
//!
//! Encoding always produces canonical special values or the decimal NR3
//! form `[-]d.dddE±n`. Decoding additionally accepts NR1, NR2 and the binary
//! form.

use dermodel_core::{CodecResult, ErrorKind};
use once_cell::sync::Lazy;
use regex::Regex;

const PLUS_INFINITY: u8 = 0x40;
const MINUS_INFINITY: u8 = 0x41;
const NOT_A_NUMBER: u8 = 0x42;
const MINUS_ZERO: u8 = 0x43;

const NR1: u8 = 0x01;
const NR2: u8 = 0x02;
const NR3: u8 = 0x03;

static NR1_FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ *[+-]?[0-9]+$").expect("NR1 pattern is valid"));
static NR2_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ *[+-]?(?:[0-9]+[.,][0-9]*|[.,][0-9]+)$").expect("NR2 pattern is valid")
});
static NR3_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ *[+-]?(?:[0-9]+[.,]?[0-9]*|[.,][0-9]+)[eE][+-]?[0-9]+$")
        .expect("NR3 pattern is valid")
});

pub fn encode_real(value: f64) -> Vec<u8> {
    if value.is_nan() {
        return vec![NOT_A_NUMBER];
    }
    if value.is_infinite() {
        return vec![if value > 0.0 {
            PLUS_INFINITY
        } else {
            MINUS_INFINITY
        }];
    }
    if value == 0.0 {
        return if value.is_sign_negative() {
            vec![MINUS_ZERO]
        } else {
            Vec::new()
        };
    }

    let mut content = vec![NR3];
    content.extend_from_slice(nr3_text(value).as_bytes());
    content
}

/// Shortest round-tripping NR3 text, e.g. `1.2E+0`, `4.E-11`, `-2.578E+3`
fn nr3_text(value: f64) -> String {
    // `{:e}` yields the shortest digits that round-trip: "1.2e0", "4e-11"
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let mut text = String::with_capacity(scientific.len() + 3);
    if value < 0.0 {
        text.push('-');
    }
    text.push_str(mantissa);
    if !mantissa.contains('.') {
        text.push('.');
    }
    text.push('E');
    text.push(if exponent < 0 { '-' } else { '+' });
    text.push_str(&exponent.unsigned_abs().to_string());
    text
}

pub fn decode_real(content: &[u8]) -> CodecResult<f64> {
    let Some((&first, rest)) = content.split_first() else {
        return Ok(0.0);
    };

    if first & 0x80 != 0 {
        return decode_binary(first, rest);
    }

    match first & 0xC0 {
        0x40 => decode_special(first, rest),
        _ => decode_decimal(first, rest),
    }
}

fn decode_special(first: u8, rest: &[u8]) -> CodecResult<f64> {
    if !rest.is_empty() {
        return Err(ErrorKind::MalformedReal(format!(
            "special value 0x{:02X} followed by {} bytes",
            first,
            rest.len()
        )));
    }
    match first {
        PLUS_INFINITY => Ok(f64::INFINITY),
        MINUS_INFINITY => Ok(f64::NEG_INFINITY),
        NOT_A_NUMBER => Ok(f64::NAN),
        MINUS_ZERO => Ok(-0.0),
        other => Err(ErrorKind::MalformedReal(format!(
            "unknown special value 0x{:02X}",
            other
        ))),
    }
}

fn decode_decimal(first: u8, rest: &[u8]) -> CodecResult<f64> {
    let text = std::str::from_utf8(rest)
        .map_err(|_| ErrorKind::MalformedReal("decimal form is not ASCII".to_string()))?;

    let form = match first & 0x3F {
        NR1 => &*NR1_FORM,
        NR2 => &*NR2_FORM,
        NR3 => &*NR3_FORM,
        other => {
            return Err(ErrorKind::MalformedReal(format!(
                "unknown decimal form {}",
                other
            )));
        }
    };
    if !form.is_match(text) {
        return Err(ErrorKind::MalformedReal(format!(
            "`{}` is not valid NR{}",
            text,
            first & 0x3F
        )));
    }

    let normalized = text.trim_start().replace(',', ".");
    normalized
        .parse::<f64>()
        .map_err(|_| ErrorKind::MalformedReal(format!("cannot parse `{}`", text)))
}

fn decode_binary(first: u8, rest: &[u8]) -> CodecResult<f64> {
    let negative = first & 0x40 != 0;
    let bits_per_digit: i64 = match (first >> 4) & 0x03 {
        0 => 1,
        1 => 3,
        2 => 4,
        _ => {
            return Err(ErrorKind::MalformedReal(
                "reserved base in binary form".to_string(),
            ));
        }
    };
    let scale = ((first >> 2) & 0x03) as i64;

    let (exponent_len, rest) = match first & 0x03 {
        3 => {
            let (&len, rest) = rest.split_first().ok_or_else(|| {
                ErrorKind::MalformedReal("missing exponent length octet".to_string())
            })?;
            (len as usize, rest)
        }
        n => (n as usize + 1, rest),
    };
    if exponent_len == 0 || exponent_len > 8 || rest.len() < exponent_len {
        return Err(ErrorKind::MalformedReal(format!(
            "invalid exponent of {} octets",
            exponent_len
        )));
    }

    let (exponent_bytes, mantissa_bytes) = rest.split_at(exponent_len);
    if mantissa_bytes.is_empty() {
        return Err(ErrorKind::MalformedReal("missing mantissa".to_string()));
    }

    let exponent = exponent_bytes
        .iter()
        .skip(1)
        .fold(exponent_bytes[0] as i8 as i64, |acc, b| {
            acc.saturating_mul(256).saturating_add(*b as i64)
        });
    let mantissa = mantissa_bytes
        .iter()
        .fold(0f64, |acc, b| acc * 256.0 + *b as f64);

    let power = exponent.saturating_mul(bits_per_digit).saturating_add(scale);
    let magnitude = scale_by_power_of_two(mantissa, power);
    Ok(if negative { -magnitude } else { magnitude })
}

fn scale_by_power_of_two(value: f64, power: i64) -> f64 {
    let mut power = power.clamp(-2200, 2200) as i32;
    let mut value = value;
    while power > 1000 {
        value *= 2f64.powi(1000);
        power -= 1000;
    }
    while power < -1000 {
        value *= 2f64.powi(-1000);
        power += 1000;
    }
    value * 2f64.powi(power)
}
