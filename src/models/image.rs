use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Fallback media type for files whose format cannot be recognized.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Which part of the package a photo shows.
///
/// Only `General` is assigned today; content-based tagging is a future
/// extension and the other variants exist so the wire shape stays stable.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImageCategory {
    Branding,
    Label,
    Barcode,
    #[default]
    General,
}

/// A file handed over by the picker, drag-and-drop or camera capture,
/// before it has been accepted into a collection.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub file_name: String,
    /// Media type as declared by the source, e.g. `image/png`.
    pub media_type: String,
    pub data: Vec<u8>,
}

impl CandidateFile {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            data,
        }
    }

    /// Read a file from disk, declaring its media type from the extension and
    /// falling back to magic-byte sniffing.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let media_type = image::ImageFormat::from_path(path)
            .or_else(|_| image::guess_format(&data))
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| OCTET_STREAM.to_string());

        Ok(Self {
            file_name,
            media_type,
            data,
        })
    }

    /// Only declared image media types are accepted.
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// The owned binary payload of an accepted image.
///
/// The bytes are shared with the image's preview entry, so accepting a file
/// does not duplicate it in memory.
#[derive(Debug, Clone)]
pub struct ImageBlob {
    pub file_name: String,
    pub media_type: String,
    pub data: Arc<[u8]>,
}

impl ImageBlob {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<CandidateFile> for ImageBlob {
    fn from(file: CandidateFile) -> Self {
        Self {
            file_name: file.file_name,
            media_type: file.media_type,
            data: Arc::from(file.data),
        }
    }
}

/// What the presentation layer sees of one collected image.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImageSummary {
    pub index: usize,
    pub file_name: String,
    pub media_type: String,
    pub size_bytes: usize,
    pub preview_url: String,
    pub category: ImageCategory,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_declared_media_type_decides_acceptance() {
        assert!(CandidateFile::new("front.jpg", "image/jpeg", vec![1]).is_image());
        assert!(!CandidateFile::new("notes.pdf", "application/pdf", vec![1]).is_image());
        assert!(!CandidateFile::new("blank", "", vec![]).is_image());
    }

    #[test]
    fn test_from_path_uses_extension() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(b"not really a jpeg").unwrap();

        let candidate = CandidateFile::from_path(file.path()).unwrap();
        assert_eq!(candidate.media_type, "image/jpeg");
        assert_eq!(candidate.data, b"not really a jpeg");
    }

    #[test]
    fn test_from_path_sniffs_unknown_extension() {
        let mut file = tempfile::Builder::new().suffix(".upload").tempfile().unwrap();
        file.write_all(PNG_MAGIC).unwrap();

        let candidate = CandidateFile::from_path(file.path()).unwrap();
        assert_eq!(candidate.media_type, "image/png");
    }

    #[test]
    fn test_from_path_falls_back_to_octet_stream() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"plain text").unwrap();

        let candidate = CandidateFile::from_path(file.path()).unwrap();
        assert_eq!(candidate.media_type, OCTET_STREAM);
        assert!(!candidate.is_image());
    }

    #[test]
    fn test_category_defaults_to_general() {
        assert_eq!(ImageCategory::default(), ImageCategory::General);
        assert_eq!(ImageCategory::General.to_string(), "general");
        assert_eq!("barcode".parse::<ImageCategory>().unwrap(), ImageCategory::Barcode);
    }
}
