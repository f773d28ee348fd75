pub mod auth;
pub mod categories;
pub mod products;
pub mod upload;

use axum::extract::Multipart;

use crate::error::ApiError;
use crate::media::UploadedFile;
use crate::validation::forms::FormFields;

/// Split a multipart body into text fields and uploaded files. Any part
/// carrying a filename is treated as a file; empty file parts (a form
/// submitted with no file chosen) are skipped.
pub(crate) async fn collect_multipart(
    mut multipart: Multipart,
) -> Result<(FormFields, Vec<UploadedFile>), ApiError> {
    let mut fields = FormFields::new();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?.to_vec();
                if filename.is_empty() && data.is_empty() {
                    continue;
                }
                files.push(UploadedFile { filename: Some(filename), content_type, data });
            }
            None => {
                fields.insert(name, field.text().await?);
            }
        }
    }

    Ok((fields, files))
}
