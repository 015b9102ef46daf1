//! Character string content codecs

use dermodel_core::{CodecResult, ErrorKind};

/// One byte per character, as Latin-1
///
/// Used for the single-byte string types (IA5, Printable, T61, Visible,
/// Graphic, General, Numeric) and ObjectDescriptor.
pub fn decode_latin1(content: &[u8]) -> String {
    content.iter().map(|&b| b as char).collect()
}

pub fn encode_latin1(text: &str) -> CodecResult<Vec<u8>> {
    text.chars()
        .map(|c| {
            u8::try_from(u32::from(c)).map_err(|_| {
                ErrorKind::invalid_value("single-byte character", format!("{:?}", c))
            })
        })
        .collect()
}

pub fn decode_utf8(content: &[u8]) -> CodecResult<String> {
    String::from_utf8(content.to_vec())
        .map_err(|e| ErrorKind::MalformedContent(format!("invalid UTF-8: {}", e)))
}

pub fn encode_utf8(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

/// BMPString content as UTF-16 big-endian
pub fn decode_bmp(content: &[u8]) -> CodecResult<String> {
    if content.len() % 2 != 0 {
        return Err(ErrorKind::MalformedContent(format!(
            "BMPString content has odd length {}",
            content.len()
        )));
    }
    let units = content
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|e| ErrorKind::MalformedContent(format!("invalid UTF-16: {}", e)))
}

pub fn encode_bmp(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|unit| unit.to_be_bytes()).collect()
}
