//! Base64 text codec.
//!
//! Standard mode uses the `+`/`/` alphabet with `=` padding. URL-safe mode
//! uses `-`/`_` and omits padding. Decoding accepts either padded or
//! unpadded input, ignores whitespace (pasted text is often line-wrapped),
//! and requires the decoded bytes to be valid UTF-8.

use ::base64::alphabet;
use ::base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD, URL_SAFE_NO_PAD};
use ::base64::engine::DecodePaddingMode;
use ::base64::Engine;

use crate::error::{ConvertError, Format};

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Encode the UTF-8 bytes of `text`.
pub fn encode(text: &str, url_safe: bool) -> String {
    encode_bytes(text.as_bytes(), url_safe)
}

pub fn encode_bytes(bytes: &[u8], url_safe: bool) -> String {
    if url_safe {
        URL_SAFE_NO_PAD.encode(bytes)
    } else {
        STANDARD.encode(bytes)
    }
}

/// Decode `input` back to text.
pub fn decode(input: &str, url_safe: bool) -> Result<String, ConvertError> {
    let bytes = decode_bytes(input, url_safe)?;
    String::from_utf8(bytes)
        .map_err(|e| ConvertError::parse(Format::Base64, format!("decoded bytes are not UTF-8: {}", e)))
}

pub fn decode_bytes(input: &str, url_safe: bool) -> Result<Vec<u8>, ConvertError> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let engine = if url_safe {
        &URL_SAFE_LENIENT
    } else {
        &STANDARD_LENIENT
    };
    engine
        .decode(compact.as_bytes())
        .map_err(|e| ConvertError::parse(Format::Base64, e))
}

/// Build a `data:` URI for a file's contents.
pub fn encode_data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}
