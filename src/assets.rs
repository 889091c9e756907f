use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

const DATA_URI_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64";
const DEFAULT_EXTENSION: &str = "png";

/// Screenshot extensions probed by the record repository, in priority order.
pub const SCREENSHOT_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub enum AssetError {
    InvalidDataUri(String),
    InvalidBase64(base64::DecodeError),
    Io(std::io::Error),
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::InvalidDataUri(message) => write!(f, "invalid data URI: {}", message),
            AssetError::InvalidBase64(err) => write!(f, "invalid base64 payload: {}", err),
            AssetError::Io(err) => write!(f, "asset I/O error: {}", err),
        }
    }
}

impl Error for AssetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AssetError::InvalidDataUri(_) => None,
            AssetError::InvalidBase64(err) => Some(err),
            AssetError::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for AssetError {
    fn from(value: std::io::Error) -> Self {
        AssetError::Io(value)
    }
}

impl From<base64::DecodeError> for AssetError {
    fn from(value: base64::DecodeError) -> Self {
        AssetError::InvalidBase64(value)
    }
}

pub fn is_inline_payload(value: &str) -> bool {
    value.trim_start().starts_with(DATA_URI_PREFIX)
}

/// Parses `data:image/<subtype>;base64,<payload>`. The subtype becomes the
/// file extension (`svg+xml` -> `svg`); an absent or unusable subtype falls
/// back to `png`.
pub fn decode_data_uri(value: &str) -> Result<InlineImage, AssetError> {
    let rest = value
        .trim()
        .strip_prefix(DATA_URI_PREFIX)
        .ok_or_else(|| AssetError::InvalidDataUri("missing 'data:' prefix".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AssetError::InvalidDataUri("missing ',' separator".to_string()))?;
    let media_type = header.strip_suffix(BASE64_MARKER).ok_or_else(|| {
        AssetError::InvalidDataUri("only base64-encoded payloads are supported".to_string())
    })?;

    let bytes = BASE64.decode(payload.trim())?;
    Ok(InlineImage {
        extension: extension_for_media_type(media_type),
        bytes,
    })
}

pub fn encode_data_uri(bytes: &[u8], extension: &str) -> String {
    format!(
        "data:{};base64,{}",
        mime_for_extension(extension),
        BASE64.encode(bytes)
    )
}

pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        _ => "image/png",
    }
}

fn extension_for_media_type(media_type: &str) -> String {
    let subtype = media_type
        .split(';')
        .next()
        .and_then(|mime| mime.trim().strip_prefix("image/"))
        .and_then(|subtype| subtype.split('+').next())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !subtype.is_empty() && subtype.chars().all(|ch| ch.is_ascii_alphanumeric()) {
        subtype
    } else {
        DEFAULT_EXTENSION.to_string()
    }
}

/// Writes `image` as `<dir>/<stem>.<ext>`, returning the file name.
pub fn write_image(dir: &Path, stem: &str, image: &InlineImage) -> Result<String, AssetError> {
    std::fs::create_dir_all(dir)?;
    let file_name = format!("{stem}.{}", image.extension);
    std::fs::write(dir.join(&file_name), &image.bytes)?;
    Ok(file_name)
}

/// Removes every `<dir>/<stem>.*` file except `keep`, returning the removed
/// file names.
pub fn remove_siblings(dir: &Path, stem: &str, keep: &str) -> Result<Vec<String>, AssetError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut removed = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if file_name == keep || !path.is_file() {
            continue;
        }
        if path.file_stem().and_then(|s| s.to_str()) == Some(stem) {
            std::fs::remove_file(&path)?;
            removed.push(file_name.to_string());
        }
    }
    removed.sort();
    Ok(removed)
}

/// Reads an asset back and wraps it as a data URI typed by its extension.
pub fn read_as_data_uri(path: &Path) -> Result<String, AssetError> {
    let bytes = std::fs::read(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or(DEFAULT_EXTENSION);
    Ok(encode_data_uri(&bytes, extension))
}

/// First existing `<dir>/<stem>.<ext>` in `extensions` order.
pub fn probe(dir: &Path, stem: &str, extensions: &[&str]) -> Option<PathBuf> {
    extensions
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|path| path.is_file())
}
