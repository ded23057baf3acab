//! Base64 data URL handling
//!
//! The backend renders QR codes and certificates as PNG images and returns
//! them inline as `data:image/png;base64,...` strings.

use crate::error::{ClientError, ClientResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

/// Decode the payload of a base64 data URL
///
/// Anything up to and including the first `base64,` marker is treated as the
/// header. A bare base64 string (no header) is accepted as well.
pub fn decode_data_url(data_url: &str) -> ClientResult<Vec<u8>> {
    let payload = match data_url.find("base64,") {
        Some(index) => &data_url[index + "base64,".len()..],
        None if data_url.starts_with("data:") => {
            return Err(ClientError::Decode(
                "data URL is not base64 encoded".to_string(),
            ))
        }
        None => data_url,
    };

    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if payload.is_empty() {
        return Err(ClientError::Decode("empty image data".to_string()));
    }

    STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| ClientError::Decode(format!("invalid base64 image: {}", e)))
}

/// Decode a data URL and write the bytes to `path`
pub fn save_data_url(data_url: &str, path: &Path) -> ClientResult<usize> {
    let bytes = decode_data_url(data_url)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &bytes)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Saved image");
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

    #[test]
    fn test_decodes_png_data_url() {
        let url = format!("data:image/png;base64,{}", PNG_B64);
        let bytes = decode_data_url(&url).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn test_accepts_bare_base64() {
        let bytes = decode_data_url(PNG_B64).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn test_rejects_non_base64_data_url() {
        assert!(matches!(
            decode_data_url("data:text/plain,hello"),
            Err(ClientError::Decode(_))
        ));
        assert!(decode_data_url("data:image/png;base64,").is_err());
        assert!(decode_data_url("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn test_save_writes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out").join("qrcode.png");
        let written = save_data_url(&format!("data:image/png;base64,{}", PNG_B64), &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap().len(), written);
    }
}
