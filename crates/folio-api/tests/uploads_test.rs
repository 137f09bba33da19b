//! Upload endpoint integration tests

mod helpers;

use axum::http::StatusCode;
use axum_test::multipart::MultipartForm;
use helpers::fixtures::*;
use helpers::*;

#[tokio::test]
async fn test_upload_cover_produces_small_and_large() {
    let app = setup_test_app().await;

    let form = single_file_form("cover", create_test_jpeg(1600, 900), "cover.jpg", "image/jpeg");
    let response = app
        .client()
        .post("/api/upload/project-cover")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let data: serde_json::Value = response.json();
    assert_eq!(data["success"], true);
    assert_eq!(data["metadata"]["originalName"], "cover.jpg");
    assert_eq!(data["metadata"]["outputFormat"], "webp");

    let small = data["cover"]["small"].as_str().expect("small reference");
    let large = data["cover"]["large"].as_str().expect("large reference");
    assert!(small.starts_with("/uploads/projects/covers/"));
    assert!(small.ends_with(".webp"));
    assert_ne!(small, large);

    let small_bytes = std::fs::read(app.path_for(small)).expect("small derivative on disk");
    let large_bytes = std::fs::read(app.path_for(large)).expect("large derivative on disk");
    assert_eq!(webp_dimensions(&small_bytes), (400, 400));
    assert_eq!(webp_dimensions(&large_bytes), (1000, 1000));
}

#[tokio::test]
async fn test_stored_cover_is_served() {
    let app = setup_test_app().await;

    let form = single_file_form("cover", create_test_png(500, 500), "cover.png", "image/png");
    let response = app
        .client()
        .post("/api/upload/project-cover")
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let data: serde_json::Value = response.json();
    let small = data["cover"]["small"].as_str().expect("small reference").to_string();

    let served = app.client().get(&small).await;
    assert_eq!(served.status_code(), StatusCode::OK);
    assert_eq!(served.as_bytes().as_ref(), std::fs::read(app.path_for(&small)).unwrap());
}

#[tokio::test]
async fn test_upload_cover_without_file() {
    let app = setup_test_app().await;

    let form = MultipartForm::new().add_text("title", "no file here");
    let response = app
        .client()
        .post("/api/upload/project-cover")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let data: serde_json::Value = response.json();
    assert_eq!(data["success"], false);
    assert_eq!(data["code"], "NO_FILE");
}

#[tokio::test]
async fn test_upload_cover_rejects_wrong_type() {
    let app = setup_test_app().await;

    let form = single_file_form("cover", b"plain text".to_vec(), "notes.txt", "text/plain");
    let response = app
        .client()
        .post("/api/upload/project-cover")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let data: serde_json::Value = response.json();
    assert_eq!(data["code"], "INVALID_MIME_TYPE");
    let allowed: Vec<&str> = data["allowed"]
        .as_array()
        .expect("allowed list")
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(allowed.contains(&"image/jpeg"));
    assert!(allowed.contains(&"image/png"));
    assert!(allowed.contains(&"image/webp"));
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_cover_rejects_oversized_file() {
    let app = setup_test_app().await;

    let oversized = vec![0u8; 10 * 1024 * 1024 + 1];
    let form = single_file_form("cover", oversized, "huge.jpg", "image/jpeg");
    let response = app
        .client()
        .post("/api/upload/project-cover")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let data: serde_json::Value = response.json();
    assert_eq!(data["code"], "FILE_TOO_LARGE");
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_cover_corrupt_image() {
    let app = setup_test_app().await;

    let form = single_file_form("cover", b"\xFF\xD8\xFFnot really".to_vec(), "broken.jpg", "image/jpeg");
    let response = app
        .client()
        .post("/api/upload/project-cover")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let data: serde_json::Value = response.json();
    assert_eq!(data["code"], "PROCESSING_ERROR");
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_unexpected_file_field_is_rejected() {
    let app = setup_test_app().await;

    let form = single_file_form("avatar", create_test_png(10, 10), "me.png", "image/png");
    let response = app
        .client()
        .post("/api/upload/project-cover")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let data: serde_json::Value = response.json();
    assert_eq!(data["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_upload_pictures_all_valid() {
    let app = setup_test_app().await;

    let form = MultipartForm::new()
        .add_part("pictures", file_part(create_test_jpeg(300, 200), "a.jpg", "image/jpeg"))
        .add_part("pictures", file_part(create_test_png(2400, 1200), "b.png", "image/png"));
    let response = app
        .client()
        .post("/api/upload/project-pictures")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let data: serde_json::Value = response.json();
    assert_eq!(data["success"], true);
    assert_eq!(data["metadata"]["totalFiles"], 2);
    assert_eq!(data["metadata"]["successCount"], 2);
    assert_eq!(data["metadata"]["errorCount"], 0);
    assert!(data.get("errors").is_none());

    let pictures = data["pictures"].as_array().expect("pictures");
    assert_eq!(pictures[0]["original"], "a.jpg");
    assert_eq!(pictures[1]["original"], "b.png");

    // Small pictures are never upscaled, large ones fit inside 1200x1200
    let first = pictures[0]["url"].as_str().unwrap();
    let second = pictures[1]["url"].as_str().unwrap();
    assert_eq!(webp_dimensions(&std::fs::read(app.path_for(first)).unwrap()), (300, 200));
    assert_eq!(webp_dimensions(&std::fs::read(app.path_for(second)).unwrap()), (1200, 600));
}

#[tokio::test]
async fn test_upload_pictures_partial_success() {
    let app = setup_test_app().await;

    let form = MultipartForm::new()
        .add_part("pictures[]", file_part(create_test_jpeg(64, 64), "good.jpg", "image/jpeg"))
        .add_part("pictures[]", file_part(b"%PDF-1.4".to_vec(), "doc.pdf", "application/pdf"))
        .add_part("pictures[]", file_part(create_test_png(32, 32), "good.png", "image/png"));
    let response = app
        .client()
        .post("/api/upload/project-pictures")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), StatusCode::MULTI_STATUS);
    let data: serde_json::Value = response.json();
    assert_eq!(data["success"], true);
    assert_eq!(data["metadata"]["successCount"], 2);
    assert_eq!(data["metadata"]["errorCount"], 1);

    let errors = data["errors"].as_array().expect("errors");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["filename"], "doc.pdf");
    assert_eq!(errors[0]["code"], "INVALID_MIME_TYPE");
    assert_eq!(app.stored_files().len(), 2);
}

#[tokio::test]
async fn test_upload_pictures_all_invalid() {
    let app = setup_test_app().await;

    let form = MultipartForm::new()
        .add_part("pictures", file_part(b"one".to_vec(), "a.txt", "text/plain"))
        .add_part("pictures", file_part(b"two".to_vec(), "b.txt", "text/plain"));
    let response = app
        .client()
        .post("/api/upload/project-pictures")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let data: serde_json::Value = response.json();
    assert_eq!(data["success"], false);
    assert_eq!(data["metadata"]["errorCount"], 2);
    assert!(data["pictures"].as_array().unwrap().is_empty());
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_svg_icon_is_stored_verbatim() {
    let app = setup_test_app().await;
    let svg = create_test_svg();

    let form = single_file_form("icon", svg.clone(), "rust.svg", "image/svg+xml");
    let response = app
        .client()
        .post("/api/upload/skill-icon")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let data: serde_json::Value = response.json();
    assert_eq!(data["metadata"]["format"], "svg");
    assert_eq!(data["metadata"]["optimized"], false);

    let icon = data["icon"].as_str().expect("icon reference");
    assert!(icon.starts_with("/uploads/skills/"));
    assert!(icon.ends_with(".svg"));
    assert_eq!(std::fs::read(app.path_for(icon)).unwrap(), svg);
}

#[tokio::test]
async fn test_upload_raster_icon_fits_512() {
    let app = setup_test_app().await;

    let form = single_file_form("icon", create_test_png(1024, 512), "logo.png", "image/png");
    let response = app
        .client()
        .post("/api/upload/skill-icon")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let data: serde_json::Value = response.json();
    assert_eq!(data["metadata"]["format"], "webp");
    assert_eq!(data["metadata"]["optimized"], true);

    let icon = data["icon"].as_str().unwrap();
    assert_eq!(webp_dimensions(&std::fs::read(app.path_for(icon)).unwrap()), (512, 256));
}

#[tokio::test]
async fn test_upload_avatar_accepts_gif() {
    let app = setup_test_app().await;

    let form = single_file_form("avatar", create_test_gif(800, 600), "me.gif", "image/gif");
    let response = app.client().post("/api/upload/avatar").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let data: serde_json::Value = response.json();
    let avatar = data["avatar"].as_str().expect("avatar reference");
    assert!(avatar.starts_with("/uploads/avatars/"));
    assert_eq!(webp_dimensions(&std::fs::read(app.path_for(avatar)).unwrap()), (400, 400));
}

#[tokio::test]
async fn test_upload_experience_photo() {
    let app = setup_test_app().await;

    let form = single_file_form("image", create_test_jpeg(640, 480), "office.jpg", "image/jpeg");
    let response = app
        .client()
        .post("/api/upload/experience-photo")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let data: serde_json::Value = response.json();
    assert_eq!(data["success"], true);
    let image = data["image"].as_str().expect("image reference");
    assert!(image.ends_with(".webp"));
    assert!(app.path_for(image).exists());
}

#[tokio::test]
async fn test_upload_project_cover_and_pictures() {
    let app = setup_test_app().await;

    let form = MultipartForm::new()
        .add_part("cover", file_part(create_test_jpeg(800, 800), "cover.jpg", "image/jpeg"))
        .add_part("pictures", file_part(create_test_png(200, 100), "shot.png", "image/png"))
        .add_part("pictures", file_part(b"nope".to_vec(), "shot.txt", "text/plain"));
    let response = app.client().post("/api/upload/project").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::MULTI_STATUS);
    let data: serde_json::Value = response.json();
    assert_eq!(data["metadata"]["totalFiles"], 3);
    assert_eq!(data["metadata"]["successCount"], 2);
    assert_eq!(data["metadata"]["errorCount"], 1);
    assert!(data["cover"]["small"].is_string());
    assert_eq!(data["pictures"].as_array().unwrap().len(), 1);

    // Two cover derivatives plus one picture
    assert_eq!(app.stored_files().len(), 3);
}
