use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};

use crate::error::AppError;

/// Renders a stored blob as a `data:` URI for download links.
pub fn to_data_uri(bytes: &[u8], content_type: &str) -> String {
    format!("data:{};base64,{}", content_type, BASE64_STANDARD.encode(bytes))
}

/// Decodes an uploaded attachment. Plain base64 and `data:` URIs are accepted;
/// blank input means no attachment.
pub fn decode_attachment(field: &str, value: Option<&str>) -> Result<Option<Vec<u8>>, AppError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    let payload = match value.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, data)| data)
            .ok_or_else(|| AppError::Validation(format!("{field} must be a base64 data URI")))?,
        None => value,
    };

    BASE64_STANDARD
        .decode(payload)
        .map(Some)
        .map_err(|_| AppError::Validation(format!("{field} is not valid base64")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blobs_round_trip_through_data_uri() {
        let bytes = vec![0xff, 0xd8, 0xff, 0xe0, 0x00];
        let uri = to_data_uri(&bytes, "image/jpeg");
        assert!(uri.starts_with("data:image/jpeg;base64,"));
        assert_eq!(decode_attachment("doc", Some(&uri)).unwrap(), Some(bytes));
    }

    #[test]
    fn plain_base64_and_blank_values() {
        assert_eq!(decode_attachment("doc", Some("aGk=")).unwrap(), Some(b"hi".to_vec()));
        assert_eq!(decode_attachment("doc", Some("  ")).unwrap(), None);
        assert_eq!(decode_attachment("doc", None).unwrap(), None);
    }

    #[test]
    fn garbage_is_a_validation_error() {
        assert!(matches!(
            decode_attachment("supporting_doc", Some("%%%")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            decode_attachment("supporting_doc", Some("data:image/png,raw")),
            Err(AppError::Validation(_))
        ));
    }
}
