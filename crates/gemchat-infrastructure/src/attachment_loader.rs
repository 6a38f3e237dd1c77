//! Reads files from disk into attachments.

use std::path::Path;

use gemchat_core::transcript::Attachment;
use gemchat_core::{ChatError, Result};

/// Reads `path` into an [`Attachment`].
///
/// The display name is the file name, the media type is guessed from the
/// extension and the size is the byte length.
pub async fn load_attachment(path: &Path) -> Result<Attachment> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| ChatError::io(format!("not a file path: {}", path.display())))?;

    let bytes = tokio::fs::read(path).await?;
    let media_type = mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string());

    Ok(Attachment::with_payload(name, bytes, media_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_text_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.txt");
        std::fs::write(&path, b"0123456789").unwrap();

        let attachment = load_attachment(&path).await.unwrap();

        assert_eq!(attachment.name, "a.txt");
        assert_eq!(attachment.size, Some(10));
        assert_eq!(attachment.media_type.as_deref(), Some("text/plain"));
        assert_eq!(attachment.payload.as_deref(), Some(&b"0123456789"[..]));
    }

    #[tokio::test]
    async fn test_image_media_type() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cat.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let attachment = load_attachment(&path).await.unwrap();

        assert!(attachment.is_image());
    }

    #[tokio::test]
    async fn test_unknown_extension_has_no_media_type() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("blob.zzqx");
        std::fs::write(&path, [1, 2, 3]).unwrap();

        let attachment = load_attachment(&path).await.unwrap();

        assert_eq!(attachment.media_type, None);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();

        let err = load_attachment(&temp_dir.path().join("nope.txt"))
            .await
            .unwrap_err();

        assert!(err.is_io());
    }
}
