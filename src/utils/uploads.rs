use crate::error::{AppError, AppResult};
use actix_multipart::Multipart;
use actix_web::web;
use futures_util::TryStreamExt;
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "xls", "xlsx", "csv", "png", "jpg", "jpeg"];
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

#[derive(Debug)]
pub struct UploadedFile {
    pub original_name: String,
    pub extension: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Text fields and files of one multipart body.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, Vec<String>>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    /// First non-blank value of a text field, trimmed.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.iter().map(|v| v.trim()).find(|v| !v.is_empty()))
    }

    /// Like [`text`](Self::text), but a value longer than its column is a 400.
    pub fn text_within(&self, name: &str, max_chars: usize) -> AppResult<Option<&str>> {
        match self.text(name) {
            Some(value) if value.chars().count() > max_chars => Err(AppError::BadRequest(format!(
                "{name} is limited to {max_chars} characters"
            ))),
            value => Ok(value),
        }
    }

    pub fn all(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

pub fn extension_of(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

impl UploadedFile {
    pub fn check_extension(&self, allowed: &[&str]) -> AppResult<&str> {
        match self.extension.as_deref() {
            Some(ext) if allowed.contains(&ext) => Ok(ext),
            _ => Err(AppError::BadRequest(format!(
                "File type not allowed. Allowed: {}",
                allowed.join(", ")
            ))),
        }
    }
}

/// Buffers a multipart body, rejecting any file above `max_bytes`.
pub async fn read_multipart(mut payload: Multipart, max_bytes: usize) -> AppResult<MultipartForm> {
    let mut form = MultipartForm::default();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?
    {
        let disposition = field.content_disposition().clone();
        let Some(name) = disposition.get_name().map(str::to_string) else {
            continue;
        };
        let filename = disposition.get_filename().map(str::to_string);
        let content_type = field.content_type().map(|m| m.to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?
        {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(AppError::Upload(format!("{name} exceeds {max_bytes} bytes")));
            }
            bytes.extend_from_slice(&chunk);
        }

        match filename {
            // browsers send an empty part for an untouched file input
            Some(original_name) if !original_name.is_empty() && !bytes.is_empty() => {
                form.files.insert(
                    name,
                    UploadedFile {
                        extension: extension_of(&original_name),
                        original_name,
                        content_type,
                        bytes,
                    },
                );
            }
            Some(_) => {}
            None => form
                .fields
                .entry(name)
                .or_default()
                .push(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    Ok(form)
}

/// Writes the file under `<upload_dir>/<subdir>/` with a random name and
/// returns the stored relative path.
pub async fn save(upload_dir: &str, subdir: &str, file: &UploadedFile) -> AppResult<String> {
    let ext = file
        .extension
        .clone()
        .ok_or_else(|| AppError::BadRequest("File has no extension".into()))?;

    let dir = PathBuf::from(upload_dir).join(subdir);
    let stored = format!("{}/{}/{}.{}", upload_dir.trim_end_matches('/'), subdir, Uuid::new_v4().to_simple(), ext);
    let target = PathBuf::from(&stored);
    let bytes = file.bytes.clone();

    web::block(move || {
        std::fs::create_dir_all(&dir)?;
        std::fs::write(&target, bytes)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    tracing::debug!(path = %stored, size = file.bytes.len(), "Upload saved");
    Ok(stored)
}

/// Content type and body of a multipart request, for handler tests.
#[cfg(test)]
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> (String, Vec<u8>) {
    const BOUNDARY: &str = "office-desk-boundary";
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    if let Some((name, filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str) -> UploadedFile {
        UploadedFile {
            original_name: name.to_string(),
            extension: extension_of(name),
            content_type: None,
            bytes: b"Item,Rate\nFunnel,120\n".to_vec(),
        }
    }

    #[test]
    fn extensions_are_lowercased() {
        assert_eq!(extension_of("Price List.XLSX").as_deref(), Some("xlsx"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of(".env"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn images_only_for_picture_updates() {
        assert!(upload("photo.JPG").check_extension(IMAGE_EXTENSIONS).is_ok());
        assert!(upload("list.csv").check_extension(IMAGE_EXTENSIONS).is_err());
        assert!(upload("list.csv").check_extension(DOCUMENT_EXTENSIONS).is_ok());
        assert!(upload("script.exe").check_extension(DOCUMENT_EXTENSIONS).is_err());
    }

    #[test]
    fn blank_text_fields_are_absent() {
        let mut form = MultipartForm::default();
        form.fields.insert("title".into(), vec!["  ".into(), " Q3 list ".into()]);
        assert_eq!(form.text("title"), Some("Q3 list"));
        assert_eq!(form.text("notes"), None);
        assert!(form.all("ids").is_empty());
    }

    #[test]
    fn overlong_text_fields_are_rejected() {
        let mut form = MultipartForm::default();
        form.fields.insert("category".into(), vec!["x".repeat(51)]);
        form.fields.insert("caption".into(), vec!["₹".repeat(255)]);

        let err = form.text_within("category", 50).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "category is limited to 50 characters"));
        assert_eq!(form.text_within("caption", 255).unwrap().map(|c| c.chars().count()), Some(255));
        assert_eq!(form.text_within("notes", 10).unwrap(), None);
    }

    #[actix_web::test]
    async fn saves_under_subdirectory() {
        let root = std::env::temp_dir().join(format!("office_desk_{}", Uuid::new_v4().to_simple()));
        let root_str = root.to_string_lossy().into_owned();

        let path = save(&root_str, "quotations", &upload("list.csv")).await.unwrap();
        assert!(path.starts_with(&format!("{root_str}/quotations/")));
        assert!(path.ends_with(".csv"));
        assert_eq!(std::fs::read(&path).unwrap(), b"Item,Rate\nFunnel,120\n");

        std::fs::remove_dir_all(root).ok();
    }
}
