use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::storage::Storage;

const ALLOWED_TYPES: &[&str] = &["jpg", "jpeg", "gif", "png"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("The image must be a base64 encoded data URI.")]
    InvalidFormat,
    #[error("The image type {0} is not supported.")]
    UnsupportedType(String),
    #[error("The image payload could not be decoded.")]
    DecodeError,
}

/// Split a `data:image/<subtype>;base64,<payload>` URI into decoded bytes
/// and a file extension.
pub fn decode_data_uri(uri: &str) -> Result<(Vec<u8>, String), IngestError> {
    let rest = uri.strip_prefix("data:").ok_or(IngestError::InvalidFormat)?;
    let (mime, payload) = rest
        .split_once(";base64,")
        .ok_or(IngestError::InvalidFormat)?;

    let subtype = mime
        .strip_prefix("image/")
        .ok_or_else(|| IngestError::UnsupportedType(mime.to_string()))?
        .to_ascii_lowercase();
    if !ALLOWED_TYPES.contains(&subtype.as_str()) {
        return Err(IngestError::UnsupportedType(format!("image/{subtype}")));
    }

    // '+' is commonly mangled into a space in transit; repair before decoding.
    let payload = payload.replace(' ', "+");
    let bytes = BASE64
        .decode(payload.as_bytes())
        .map_err(|_| IngestError::DecodeError)?;
    Ok((bytes, subtype))
}

/// Decode a data URI and persist it under a random filename inside the
/// images directory. Returns the stored path relative to the public root.
/// No cleanup happens here if the caller fails later.
pub async fn ingest(storage: &dyn Storage, images_dir: &str, uri: &str) -> Result<String, ApiError> {
    let (bytes, ext) = decode_data_uri(uri).map_err(|e| ApiError::invalid("image", e.to_string()))?;

    let relative_path = format!(
        "{}/{}.{}",
        images_dir.trim_end_matches('/'),
        Uuid::new_v4().simple(),
        ext
    );
    storage.put(&relative_path, Bytes::from(bytes)).await?;
    Ok(relative_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;
    use std::path::PathBuf;

    #[test]
    fn decodes_a_valid_png_data_uri() {
        let (bytes, ext) = decode_data_uri("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
        assert_eq!(ext, "png");
    }

    #[test]
    fn subtype_is_lowercased() {
        let (_, ext) = decode_data_uri("data:image/PNG;base64,aGVsbG8=").unwrap();
        assert_eq!(ext, "png");
    }

    #[test]
    fn missing_data_prefix_is_invalid_format() {
        assert_eq!(
            decode_data_uri("image/png;base64,aGVsbG8=").unwrap_err(),
            IngestError::InvalidFormat
        );
    }

    #[test]
    fn missing_base64_marker_is_invalid_format() {
        assert_eq!(
            decode_data_uri("data:image/png,aGVsbG8=").unwrap_err(),
            IngestError::InvalidFormat
        );
    }

    #[test]
    fn non_image_mime_is_unsupported() {
        assert_eq!(
            decode_data_uri("data:text/plain;base64,aGVsbG8=").unwrap_err(),
            IngestError::UnsupportedType("text/plain".into())
        );
    }

    #[test]
    fn unknown_image_subtype_is_unsupported() {
        assert_eq!(
            decode_data_uri("data:image/bmp;base64,aGVsbG8=").unwrap_err(),
            IngestError::UnsupportedType("image/bmp".into())
        );
    }

    #[test]
    fn garbage_payload_is_decode_error() {
        assert_eq!(
            decode_data_uri("data:image/png;base64,!!!").unwrap_err(),
            IngestError::DecodeError
        );
    }

    #[test]
    fn spaces_in_payload_are_repaired_to_plus() {
        // "+g==" decodes to 0xFA; a mangled payload arrives as " g==".
        let (direct, _) = decode_data_uri("data:image/png;base64,+g==").unwrap();
        let (repaired, _) = decode_data_uri("data:image/png;base64, g==").unwrap();
        assert_eq!(direct, vec![0xFA]);
        assert_eq!(repaired, direct);
    }

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("surveyhub-images-{}", Uuid::new_v4().simple()))
    }

    #[tokio::test]
    async fn ingest_writes_file_and_returns_relative_path() {
        let root = temp_root();
        let storage = LocalStorage::new(&root);

        let path = ingest(&storage, "images", "data:image/png;base64,aGVsbG8=")
            .await
            .unwrap();

        assert!(path.starts_with("images/"));
        assert!(path.ends_with(".png"));
        let written = tokio::fs::read(root.join(&path)).await.unwrap();
        assert_eq!(written, b"hello");

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn ingest_surfaces_format_errors_as_validation() {
        let storage = LocalStorage::new(temp_root());
        let err = ingest(&storage, "images", "not-a-data-uri").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
