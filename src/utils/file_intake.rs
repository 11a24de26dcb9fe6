use crate::models::StagedFile;
use crate::utils::messages;

pub const MAX_FILE_SIZE_BYTES: usize = 10 * 1024 * 1024;
pub const ACCEPTED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// A file handed over by the drop target, before validation.
#[derive(Debug, Clone)]
pub struct DroppedFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Why a drop was refused. Mirrors the drop target's own rejection codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRejection {
    /// `file-too-large`
    TooLarge,
    /// `file-invalid-type`
    InvalidType,
    /// more than one file in the drop
    TooManyFiles,
}

impl FileRejection {
    pub fn user_message(&self) -> &'static str {
        match self {
            FileRejection::TooLarge => messages::FILE_TOO_LARGE,
            FileRejection::InvalidType => messages::FILE_INVALID_TYPE,
            FileRejection::TooManyFiles => messages::FILE_TOO_MANY,
        }
    }
}

/// Validate a drop: exactly one file, accepted image type, within the size
/// limit. The declared MIME type must also match the file's magic bytes so a
/// renamed file cannot slip through.
pub fn validate_drop(
    files: &[DroppedFile],
    max_size_bytes: usize,
) -> Result<StagedFile, FileRejection> {
    let file = match files {
        [single] => single,
        _ => return Err(FileRejection::TooManyFiles),
    };

    if !ACCEPTED_MIME_TYPES.contains(&file.mime.as_str()) {
        return Err(FileRejection::InvalidType);
    }
    match sniff_mime(&file.bytes) {
        Some(sniffed) if sniffed == file.mime => {}
        _ => return Err(FileRejection::InvalidType),
    }
    if file.bytes.len() > max_size_bytes {
        return Err(FileRejection::TooLarge);
    }

    Ok(StagedFile {
        file_name: file.file_name.clone(),
        mime: file.mime.clone(),
        bytes: file.bytes.clone(),
    })
}

/// Detect the image type from magic bytes; only the three accepted formats
/// are recognized.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    None
}

/// Lightweight stand-in for the browser-side object-URL preview.
#[derive(Debug, Clone)]
pub struct PhotoPreview {
    pub file_name: String,
    pub mime: String,
    pub byte_len: usize,
}

impl PhotoPreview {
    pub fn for_file(file: &StagedFile) -> Self {
        Self {
            file_name: file.file_name.clone(),
            mime: file.mime.clone(),
            byte_len: file.bytes.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(len: usize) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.resize(len, 0);
        bytes
    }

    fn png(len: usize) -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.resize(len, 0);
        bytes
    }

    fn drop_of(mime: &str, bytes: Vec<u8>) -> Vec<DroppedFile> {
        vec![DroppedFile {
            file_name: "foto.bin".to_string(),
            mime: mime.to_string(),
            bytes,
        }]
    }

    #[test]
    fn accepts_valid_jpeg_within_limit() {
        let staged = validate_drop(&drop_of("image/jpeg", jpeg(2048)), MAX_FILE_SIZE_BYTES);
        assert!(staged.is_ok());
    }

    #[test]
    fn rejects_oversize_file() {
        let files = drop_of("image/jpeg", jpeg(MAX_FILE_SIZE_BYTES + 1));
        let err = validate_drop(&files, MAX_FILE_SIZE_BYTES).unwrap_err();
        assert_eq!(err, FileRejection::TooLarge);
        assert!(err.user_message().contains("File troppo grande"));
    }

    #[test]
    fn rejects_unsupported_declared_type() {
        let files = drop_of("image/gif", vec![b'G', b'I', b'F', b'8', b'9', b'a']);
        assert_eq!(
            validate_drop(&files, MAX_FILE_SIZE_BYTES).unwrap_err(),
            FileRejection::InvalidType
        );
    }

    #[test]
    fn rejects_renamed_file_with_mismatched_magic_bytes() {
        // PNG bytes declared as JPEG
        let files = drop_of("image/jpeg", png(512));
        assert_eq!(
            validate_drop(&files, MAX_FILE_SIZE_BYTES).unwrap_err(),
            FileRejection::InvalidType
        );
    }

    #[test]
    fn rejects_multi_file_drop() {
        let mut files = drop_of("image/jpeg", jpeg(100));
        files.extend(drop_of("image/png", png(100)));
        assert_eq!(
            validate_drop(&files, MAX_FILE_SIZE_BYTES).unwrap_err(),
            FileRejection::TooManyFiles
        );
    }

    #[test]
    fn sniffs_webp() {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(b"WEBP");
        assert_eq!(sniff_mime(&bytes), Some("image/webp"));
    }
}
