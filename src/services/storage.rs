use std::path::{Path, PathBuf};

use actix_multipart::Multipart;
use futures::StreamExt;
use mongodb::bson::oid::ObjectId;

use crate::error::ErrorResponse;

/// Form field carrying the uploaded photo
pub const PHOTO_FIELD: &str = "file";

/// A photo read from a multipart upload
#[derive(Debug)]
pub struct PhotoUpload {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

pub struct StorageService;

impl StorageService {
    /// `photo_<bootcampId><ext>`, keeping the extension of the uploaded name
    pub fn photo_file_name(bootcamp_id: &ObjectId, original_name: &str) -> String {
        match Path::new(original_name).extension() {
            Some(ext) => format!("photo_{}.{}", bootcamp_id.to_hex(), ext.to_string_lossy()),
            None => format!("photo_{}", bootcamp_id.to_hex()),
        }
    }

    pub fn check_content_type(content_type: Option<&str>) -> Result<(), ErrorResponse> {
        match content_type {
            Some(ct) if ct.starts_with("image") => Ok(()),
            _ => Err(ErrorResponse::bad_request("Please upload an image file")),
        }
    }

    pub fn check_size(size: u64, max: u64) -> Result<(), ErrorResponse> {
        if size > max {
            return Err(ErrorResponse::bad_request(format!(
                "Please upload an image less than {}",
                max
            )));
        }
        Ok(())
    }

    /// Read the photo field out of a multipart body.
    ///
    /// Returns `Ok(None)` when no file field was sent. The content type is checked
    /// before the body is read and the size limit is enforced while streaming.
    pub async fn read_photo(
        mut payload: Multipart,
        max_size: u64,
    ) -> Result<Option<PhotoUpload>, ErrorResponse> {
        let mut photo = None;

        while let Some(item) = payload.next().await {
            let mut field = item.map_err(|e| {
                log::warn!("Malformed multipart upload: {}", e);
                ErrorResponse::bad_request("Please upload a file")
            })?;

            if field.name() != Some(PHOTO_FIELD) || photo.is_some() {
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| ErrorResponse::bad_request(e.to_string()))?;
                }
                continue;
            }

            let content_type = field.content_type().map(|m| m.essence_str().to_string());
            Self::check_content_type(content_type.as_deref())?;

            let original_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .unwrap_or("photo")
                .to_string();

            let mut bytes = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(|e| ErrorResponse::bad_request(e.to_string()))?;
                bytes.extend_from_slice(&chunk);
                Self::check_size(bytes.len() as u64, max_size)?;
            }

            photo = Some(PhotoUpload {
                original_name,
                bytes,
            });
        }

        Ok(photo)
    }

    /// Write a photo under the upload directory
    pub async fn save_photo(
        upload_dir: &Path,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, ErrorResponse> {
        let path = upload_dir.join(file_name);
        let result = async {
            tokio::fs::create_dir_all(upload_dir).await?;
            tokio::fs::write(&path, bytes).await
        }
        .await;

        result.map_err(|e| {
            log::error!("Failed to store photo {}: {}", path.display(), e);
            ErrorResponse::internal("Problem with file upload")
        })?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_file_name_keeps_extension() {
        let id = ObjectId::parse_str("5d713995b721c3bb38c1f5d0").unwrap();
        assert_eq!(
            StorageService::photo_file_name(&id, "campus.JPG"),
            "photo_5d713995b721c3bb38c1f5d0.JPG"
        );
        assert_eq!(
            StorageService::photo_file_name(&id, "archive.tar.png"),
            "photo_5d713995b721c3bb38c1f5d0.png"
        );
        assert_eq!(
            StorageService::photo_file_name(&id, "noext"),
            "photo_5d713995b721c3bb38c1f5d0"
        );
    }

    #[test]
    fn test_content_type_must_be_image() {
        assert!(StorageService::check_content_type(Some("image/png")).is_ok());
        assert!(StorageService::check_content_type(Some("image/jpeg")).is_ok());

        let err = StorageService::check_content_type(Some("application/pdf")).unwrap_err();
        assert_eq!(err.message, "Please upload an image file");
        assert!(StorageService::check_content_type(None).is_err());
    }

    #[test]
    fn test_size_limit() {
        assert!(StorageService::check_size(1_000_000, 1_000_000).is_ok());
        let err = StorageService::check_size(1_000_001, 1_000_000).unwrap_err();
        assert_eq!(err.message, "Please upload an image less than 1000000");
    }

    #[actix_web::test]
    async fn test_save_photo_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let upload_dir = dir.path().join("uploads");

        let path = StorageService::save_photo(&upload_dir, "photo_x.png", b"png")
            .await
            .unwrap();

        assert_eq!(path, upload_dir.join("photo_x.png"));
        assert_eq!(std::fs::read(path).unwrap(), b"png");
    }
}
