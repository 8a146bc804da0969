use chardetng::EncodingDetector;
use encoding_rs::Encoding;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding_label: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("failed to decode bytes with {encoding}: {message}")]
    DecodeFailure { encoding: String, message: String },
}

/// Decode raw bytes into UTF-8 using: BOM -> Content-Type charset -> chardetng fallback.
///
/// Malformed sequences are an error; use [`decode_text_lossy`] for response bodies.
pub fn decode_text(bytes: &[u8], content_type: Option<&str>) -> Result<DecodedText, DecodeError> {
    let encoding = detect_encoding(bytes, content_type);
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(DecodeError::DecodeFailure {
            encoding: encoding.name().to_string(),
            message: "malformed byte sequence".into(),
        });
    }
    Ok(DecodedText {
        text: text.into_owned(),
        encoding_label: encoding.name().to_string(),
    })
}

/// Like [`decode_text`] but replaces malformed sequences with U+FFFD.
pub fn decode_text_lossy(bytes: &[u8], content_type: Option<&str>) -> DecodedText {
    let encoding = detect_encoding(bytes, content_type);
    let (text, _, _) = encoding.decode(bytes);
    DecodedText {
        text: text.into_owned(),
        encoding_label: encoding.name().to_string(),
    }
}

fn detect_encoding(bytes: &[u8], content_type: Option<&str>) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }

    if let Some(label) = content_type.and_then(extract_charset) {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            return encoding;
        }
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_string())
    })
}
