//! Package Image Handlers
//!
//! Uploads are JPEG files stored as `package_images/<image_id>.<ext>` under
//! the upload root. The row is written first so the id names the file; the
//! row only commits once every file of the request is on disk.

use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::response::IntoResponse;
use axum::Json;
use http::header;
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{DeleteImages, UploadedImage};
use std::path::Path as FsPath;

use crate::api::ApiResult;
use crate::api::convert::not_found_as;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::RepoError;
use crate::db::repository::image;
use crate::storage::FileCleanup;
use crate::utils::ok;

/// Maximum file size (10MB)
const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Accepted file extensions
const SUPPORTED_FORMATS: &[&str] = &["jpg", "jpeg"];

#[derive(Debug, Serialize)]
pub struct ImagesDeleted {
    pub deleted: Vec<i64>,
    pub not_found: Vec<i64>,
    #[serde(flatten)]
    pub files: FileCleanup,
}

struct UploadFile {
    extension: String,
    data: Bytes,
}

/// Validate one file part, returning its lowercase extension
fn validate_file(filename: Option<&str>, data: &[u8]) -> Result<String, AppError> {
    let filename = filename
        .filter(|f| !f.is_empty())
        .ok_or_else(|| AppError::new(ErrorCode::NoFilename))?;

    let extension = FsPath::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .filter(|ext| SUPPORTED_FORMATS.contains(&ext.as_str()))
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::UnsupportedFileFormat,
                format!("Unsupported file '{filename}'. Supported: {}", SUPPORTED_FORMATS.join(", ")),
            )
        })?;

    if data.is_empty() {
        return Err(AppError::new(ErrorCode::EmptyFile));
    }
    if data.len() > MAX_FILE_SIZE {
        return Err(AppError::with_message(
            ErrorCode::FileTooLarge,
            format!("File too large. Maximum size is {}MB", MAX_FILE_SIZE / 1024 / 1024),
        ));
    }
    Ok(extension)
}

fn public_url(image_path: &str) -> String {
    format!("/uploads/{image_path}")
}

fn stored_paths(saved: &[UploadedImage]) -> Vec<String> {
    saved.iter().map(|s| s.image_path.clone()).collect()
}

/// Upload one or more images for a package (`package_id` plus `file`/`files` parts)
pub async fn upload(
    State(state): State<ServerState>,
    current: CurrentUser,
    mut multipart: Multipart,
) -> ApiResult<Vec<UploadedImage>> {
    current.require_admin()?;

    let mut package_id: Option<i64> = None;
    let mut files: Vec<UploadFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Invalid multipart request: {e}")))?
    {
        let name = field.name().map(String::from);
        match name.as_deref() {
            Some("package_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?;
                let id = text
                    .trim()
                    .parse()
                    .map_err(|_| AppError::validation("package_id must be an integer"))?;
                package_id = Some(id);
            }
            Some("file" | "files") => {
                let filename = field.file_name().map(String::from);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?;
                let extension = validate_file(filename.as_deref(), &data)?;
                files.push(UploadFile { extension, data });
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring multipart field");
            }
        }
    }

    let package_id = package_id.ok_or_else(|| AppError::required("package_id"))?;
    if files.is_empty() {
        return Err(AppError::new(ErrorCode::NoFileProvided));
    }

    let mut tx = state.pool.begin().await.map_err(RepoError::from)?;
    let mut saved: Vec<UploadedImage> = Vec::with_capacity(files.len());

    for file in &files {
        let row = image::insert(&mut tx, package_id, &file.extension)
            .await
            .map_err(not_found_as(ErrorCode::PackageNotFound))?;

        if let Err(e) = state.images.save(&row.image_path, &file.data).await {
            tracing::error!(path = %row.image_path, error = %e, "Failed to store image");
            // the transaction rolls back on drop; remove what was written,
            // including a partial write of this file
            let mut written = stored_paths(&saved);
            written.push(row.image_path);
            state.images.remove_all(&written).await;
            return Err(AppError::new(ErrorCode::FileStorageFailed));
        }

        saved.push(UploadedImage {
            image_id: row.image_id,
            url: public_url(&row.image_path),
            image_path: row.image_path,
        });
    }

    if let Err(e) = tx.commit().await {
        state.images.remove_all(&stored_paths(&saved)).await;
        return Err(RepoError::from(e).into());
    }

    tracing::info!(package_id, count = saved.len(), by = %current.email, "Images uploaded");
    Ok(ok(saved))
}

/// Serve a stored image by its relative path
pub async fn serve_image(
    State(state): State<ServerState>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if state.images.resolve(&path).is_none() {
        return Err(AppError::invalid_request("Invalid file path"));
    }

    match state.images.read(&path).await {
        Ok(content) => Ok(([(header::CONTENT_TYPE, "image/jpeg")], content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::with_message(ErrorCode::ImageNotFound, format!("Image {path} not found")))
        }
        Err(e) => {
            tracing::error!(path = %path, error = %e, "Failed to read image");
            Err(AppError::new(ErrorCode::FileStorageFailed))
        }
    }
}

/// Delete image rows, then their files; a file already gone is only a warning
pub async fn delete_images(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<DeleteImages>,
) -> ApiResult<ImagesDeleted> {
    current.require_admin()?;
    if req.image_ids.is_empty() {
        return Err(AppError::required("image_ids"));
    }

    let removed = image::delete_many(&state.pool, &req.image_ids).await?;
    if removed.is_empty() {
        return Err(AppError::with_message(ErrorCode::ImageNotFound, "No matching images"));
    }

    let deleted: Vec<i64> = removed.iter().map(|img| img.image_id).collect();
    let not_found = req
        .image_ids
        .iter()
        .copied()
        .filter(|id| !deleted.contains(id))
        .collect();
    let paths: Vec<String> = removed.iter().map(|img| img.image_path.clone()).collect();
    let files = state.images.remove_all(&paths).await;

    tracing::info!(deleted = ?deleted, by = %current.email, "Package images deleted");
    Ok(ok(ImagesDeleted {
        deleted,
        not_found,
        files,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{TestApp, test_app};
    use axum::body::Body;
    use http::{Method, Request, StatusCode};
    use serde_json::json;

    const BOUNDARY: &str = "X-BOOKING-TEST-BOUNDARY";

    fn multipart_body(package_id: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"package_id\"\r\n\r\n{package_id}\r\n"
            )
            .as_bytes(),
        );
        for (name, data) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: image/jpeg\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(token: &str, body: Vec<u8>) -> Request<Body> {
        Request::post("/upload")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn seeded() -> TestApp {
        let app = test_app().await;
        app.exec("INSERT INTO Packages (package_id, name, duration, price) VALUES (1, 'Fjords', 6, 800.0);")
            .await;
        app
    }

    #[test]
    fn test_validate_file() {
        assert_eq!(validate_file(Some("beach.JPG"), b"x").unwrap(), "jpg");
        assert_eq!(validate_file(Some("a.jpeg"), b"x").unwrap(), "jpeg");
        assert_eq!(
            validate_file(Some("a.png"), b"x").unwrap_err().code,
            ErrorCode::UnsupportedFileFormat
        );
        assert_eq!(validate_file(None, b"x").unwrap_err().code, ErrorCode::NoFilename);
        assert_eq!(validate_file(Some("a.jpg"), b"").unwrap_err().code, ErrorCode::EmptyFile);
        let big = vec![0u8; MAX_FILE_SIZE + 1];
        assert_eq!(validate_file(Some("a.jpg"), &big).unwrap_err().code, ErrorCode::FileTooLarge);
    }

    #[tokio::test]
    async fn test_upload_then_serve() {
        let app = seeded().await;
        let admin = app.token("root@example.com", true);

        let body = multipart_body("1", &[("one.jpg", b"first"), ("two.jpeg", b"second")]);
        let (status, resp) = app.call(upload_request(&admin, body)).await;
        assert_eq!(status, StatusCode::OK);
        let images = resp["data"].as_array().unwrap();
        assert_eq!(images.len(), 2);
        let first_path = images[0]["image_path"].as_str().unwrap().to_string();
        let first_id = images[0]["image_id"].as_i64().unwrap();
        assert_eq!(first_path, format!("package_images/{first_id}.jpg"));
        assert_eq!(images[0]["url"], format!("/uploads/{first_path}"));
        assert!(images[1]["image_path"].as_str().unwrap().ends_with(".jpeg"));

        let (status, bytes) = app
            .call_raw(Request::get(format!("/uploads/{first_path}")).body(Body::empty()).unwrap())
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, b"first");
    }

    #[tokio::test]
    async fn test_upload_rejects_png_and_unknown_package() {
        let app = seeded().await;
        let admin = app.token("root@example.com", true);

        let (status, resp) = app
            .call(upload_request(&admin, multipart_body("1", &[("x.png", b"png")])))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["code"], 6502);

        let (status, resp) = app
            .call(upload_request(&admin, multipart_body("9", &[("x.jpg", b"jpg")])))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(resp["code"], 6001);
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM PackageImages")
            .fetch_one(&app.state.pool)
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back_rows_and_files() {
        let app = seeded().await;
        let admin = app.token("root@example.com", true);
        // A directory where the second file should go makes its write fail
        let images_dir = app.state.config.upload_dir.join("package_images");
        tokio::fs::create_dir_all(images_dir.join("2.jpg")).await.unwrap();

        let body = multipart_body("1", &[("one.jpg", b"first"), ("two.jpg", b"second")]);
        let (status, resp) = app.call(upload_request(&admin, body)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp["code"], 6509);

        assert!(!images_dir.join("1.jpg").exists());
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM PackageImages")
            .fetch_one(&app.state.pool)
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn test_serve_rejects_traversal() {
        let app = seeded().await;
        let (status, _) = app
            .call_raw(Request::get("/uploads/package_images/../../secret").body(Body::empty()).unwrap())
            .await;
        assert_ne!(status, StatusCode::OK);

        let (status, resp) = app
            .call(Request::get("/uploads/package_images/404.jpg").body(Body::empty()).unwrap())
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(resp["code"], 6201);
    }

    #[tokio::test]
    async fn test_delete_with_missing_file_still_removes_row() {
        let app = seeded().await;
        app.exec(
            "INSERT INTO PackageImages (image_id, package_id, image_path) VALUES
                (1, 1, 'package_images/1.jpg'),
                (2, 1, 'package_images/2.jpg');",
        )
        .await;
        app.state.images.save("package_images/1.jpg", b"x").await.unwrap();
        let admin = app.token("root@example.com", true);

        let (status, resp) = app
            .send(
                Method::DELETE,
                "/delete_package_images",
                Some(&admin),
                Some(json!({"image_ids": [1, 2, 3]})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["data"]["deleted"], json!([1, 2]));
        assert_eq!(resp["data"]["not_found"], json!([3]));
        assert_eq!(resp["data"]["removed"], json!(["package_images/1.jpg"]));
        assert_eq!(resp["data"]["missing_files"], json!(["package_images/2.jpg"]));

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM PackageImages")
            .fetch_one(&app.state.pool)
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn test_delete_empty_list_is_bad_request() {
        let app = seeded().await;
        let admin = app.token("root@example.com", true);
        let (status, _) = app
            .send(
                Method::DELETE,
                "/delete_package_images",
                Some(&admin),
                Some(json!({"image_ids": []})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
