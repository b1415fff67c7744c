//! Request payload decoding and validation
//!
//! Clients identify a track by the base64 encoding of its UTF-8 short path.
//! After decoding, the path must match the accepted-path grammar before it
//! is looked up; anything else is refused as suspicious. The grammar is the
//! only guard between request bodies and the player's argument list.
//!
//! ```text
//! path    = artist "/" year " - " album "/" number " - " title ".mp3"
//! artist  = 1*( LETTER / DIGIT / "-" / "&" / "(" / ")" / " " / "_" )
//! year    = 4DIGIT
//! album   = 1*( LETTER / DIGIT / "-" / "[" / "]" / "&" / "(" / ")" / "," / "!" / " " / "_" )
//! number  = 2DIGIT
//! title   = album
//! LETTER  = A-Z / a-z / Cyrillic А-я / Ё / ё
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::volume::MAX_VOLUME;

static ACCEPTED_PATH: Lazy<Regex> = Lazy::new(|| {
    let artist = r"[A-Za-zА-яЁё0-9_\-&() ]+";
    let name = r"[A-Za-zА-яЁё0-9_\-\[\]&(),! ]+";
    Regex::new(&format!(
        r"^{artist}/[0-9]{{4}} - {name}/[0-9]{{2}} - {name}\.mp3$"
    ))
    .expect("accepted path grammar compiles")
});

/// Payload errors, all reported to clients as 400
#[derive(Debug, Error)]
pub enum PayloadError {
    /// Body is not the expected JSON shape
    #[error("invalid request body")]
    Body(#[from] serde_json::Error),

    /// `file` is not base64 of UTF-8 text
    #[error("invalid file identifier")]
    Encoding,

    /// Decoded path fails the grammar
    #[error("suspicious request")]
    SuspiciousPath,

    /// `volume` missing, not a number, or outside 0-100
    #[error("suspicious request")]
    Volume,
}

/// Body of `POST /`
#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    pub file: String,
}

/// Encode a short path into the client transport form
pub fn encode_file_id(short_path: &str) -> String {
    STANDARD.encode(short_path.as_bytes())
}

/// Decode a client file identifier back into a short path
pub fn decode_file_id(file_id: &str) -> Result<String, PayloadError> {
    let bytes = STANDARD
        .decode(file_id.trim())
        .map_err(|_| PayloadError::Encoding)?;
    String::from_utf8(bytes).map_err(|_| PayloadError::Encoding)
}

/// Whether a decoded short path matches the accepted-path grammar
pub fn is_accepted_path(short_path: &str) -> bool {
    ACCEPTED_PATH.is_match(short_path)
}

/// Parse `POST /` and return the validated short path
pub fn parse_play_request(body: &[u8]) -> Result<String, PayloadError> {
    let request: PlayRequest = serde_json::from_slice(body)?;
    let short_path = decode_file_id(&request.file)?;

    if !is_accepted_path(&short_path) {
        return Err(PayloadError::SuspiciousPath);
    }
    Ok(short_path)
}

/// Parse `POST /volume` into a level in 0-100
///
/// Any JSON number in range is accepted and rounded to the nearest percent.
/// Strings, including numeric ones, are rejected.
pub fn parse_volume_request(body: &[u8]) -> Result<u8, PayloadError> {
    let value: Value = serde_json::from_slice(body)?;
    let volume = value
        .get("volume")
        .and_then(Value::as_f64)
        .ok_or(PayloadError::Volume)?;

    if !(0.0..=f64::from(MAX_VOLUME)).contains(&volume) {
        return Err(PayloadError::Volume);
    }
    Ok(volume.round() as u8)
}
