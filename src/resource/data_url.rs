//! Inline `data:` URLs
//!
//! Pages occasionally embed small fragments or scripts directly as data URLs. They never hit the
//! network and always report an ok status.

use super::FetchedResource;
use crate::error::{Error, ParseError, Result};
use base64::Engine;

const DATA_URL_PREFIX: &str = "data:";
const DEFAULT_MEDIA_TYPE: &str = "text/plain;charset=US-ASCII";

fn invalid(reason: impl Into<String>) -> Error {
  Error::Parse(ParseError::InvalidDataUrl {
    reason: reason.into(),
  })
}

/// Decode a `data:` URL (RFC 2397) into its payload and declared media type.
pub(crate) fn decode_data_url(url: &str) -> Result<FetchedResource> {
  let rest = url
    .get(..DATA_URL_PREFIX.len())
    .filter(|prefix| prefix.eq_ignore_ascii_case(DATA_URL_PREFIX))
    .map(|_| &url[DATA_URL_PREFIX.len()..])
    .ok_or_else(|| invalid("URL does not start with 'data:'"))?;

  let (header, payload) = rest
    .split_once(',')
    .ok_or_else(|| invalid("Missing comma in data URL"))?;

  let mut params: Vec<&str> = header
    .split(';')
    .map(str::trim)
    .filter(|p| !p.is_empty())
    .collect();
  let is_base64 = params
    .last()
    .map(|p| p.eq_ignore_ascii_case("base64"))
    .unwrap_or(false);
  if is_base64 {
    params.pop();
  }

  let content_type = match params.first() {
    Some(first) if first.contains('/') => params.join(";"),
    _ if params.is_empty() => DEFAULT_MEDIA_TYPE.to_string(),
    _ => format!("text/plain;{}", params.join(";")),
  };

  let bytes = if is_base64 {
    let compact: Vec<u8> = percent_decode(payload)?
      .into_iter()
      .filter(|b| !b.is_ascii_whitespace())
      .collect();
    base64::engine::general_purpose::STANDARD
      .decode(compact)
      .map_err(|e| invalid(format!("Invalid base64: {e}")))?
  } else {
    percent_decode(payload)?
  };

  Ok(FetchedResource::new(bytes, Some(content_type)))
}

/// Percent-decode a payload. `+` is kept literally.
fn percent_decode(input: &str) -> Result<Vec<u8>> {
  let bytes = input.as_bytes();
  let mut out = Vec::with_capacity(bytes.len());
  let mut i = 0;
  while i < bytes.len() {
    if bytes[i] != b'%' {
      out.push(bytes[i]);
      i += 1;
      continue;
    }
    let escape = bytes
      .get(i + 1..i + 3)
      .ok_or_else(|| invalid("Incomplete percent-escape"))?;
    let hex = std::str::from_utf8(escape).map_err(|_| invalid("Invalid percent-escape"))?;
    let value = u8::from_str_radix(hex, 16).map_err(|_| invalid("Invalid percent-escape"))?;
    out.push(value);
    i += 3;
  }
  Ok(out)
}
