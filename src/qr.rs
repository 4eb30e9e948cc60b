//! Scannable check-in codes.
//!
//! The payload is the decimal meeting id and nothing else: no framing,
//! checksum or version tag. Decoding tolerates surrounding whitespace
//! because some scanner libraries append a newline.

use qrcode::QrCode;
use qrcode::render::svg;
use std::fmt;

const QR_MIN_SIZE: u32 = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    Empty,
    NotAnId(String),
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::Empty => write!(f, "empty payload"),
            PayloadError::NotAnId(raw) => write!(f, "payload '{raw}' is not a meeting id"),
        }
    }
}

impl std::error::Error for PayloadError {}

pub fn encode_payload(meeting_id: i64) -> String {
    meeting_id.to_string()
}

pub fn decode_payload(raw: &str) -> Result<i64, PayloadError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PayloadError::Empty);
    }
    match trimmed.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(PayloadError::NotAnId(truncate(trimmed, 64))),
    }
}

/// Inline SVG of the QR code for a meeting.
pub fn meeting_svg(meeting_id: i64) -> Result<String, qrcode::types::QrError> {
    let code = QrCode::new(encode_payload(meeting_id).as_bytes())?;
    Ok(code
        .render::<svg::Color<'_>>()
        .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
        .dark_color(svg::Color("#111827"))
        .light_color(svg::Color("#ffffff"))
        .build())
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_accepts_plain_and_padded_ids() {
        assert_eq!(decode_payload("42"), Ok(42));
        assert_eq!(decode_payload(" 42\n"), Ok(42));
        assert_eq!(decode_payload(&encode_payload(7)), Ok(7));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert_eq!(decode_payload(""), Err(PayloadError::Empty));
        assert!(matches!(decode_payload("https://example.com"), Err(PayloadError::NotAnId(_))));
        assert!(matches!(decode_payload("-3"), Err(PayloadError::NotAnId(_))));
        assert!(matches!(decode_payload("0"), Err(PayloadError::NotAnId(_))));
    }

    #[test]
    fn svg_is_rendered() {
        let svg = meeting_svg(12).expect("qr");
        assert!(svg.contains("<svg"));
        assert!(svg.contains("#111827"));
    }
}
