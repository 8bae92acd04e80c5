//! サービスクライアントのテスト
//!
//! ローカルのHTTPスタブに対して送信・分類・補助APIを検証

mod support;

use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use support::{closed_base_url, spawn_stub, StubResponse};
use tempfile::tempdir;
use vto_common::{find_template, AppState, Controller, Error, GarmentDescriptor, SelectedPhoto, ServiceConfig};
use vto_studio::client::VtoClient;

const SUCCESS_BODY: &str = r#"{
    "success": true,
    "image_url": "/results/abc.jpg",
    "processing_time": 2.345,
    "clothe_id": 5,
    "clothe_name": "dress2",
    "category": "dress",
    "model_type": "diffusion"
}"#;

fn client(base_url: &str) -> VtoClient {
    VtoClient::new(ServiceConfig::with_base_url(base_url)).expect("client")
}

fn me_png() -> SelectedPhoto {
    SelectedPhoto::from_file("me.png", None, vec![0x89, b'P', b'N', b'G', 1, 2, 3, 4])
}

/// `?t=<数字>&nocache=<9文字>` で終わるか
fn has_cache_busting_suffix(url: &str) -> bool {
    let Some((_, query)) = url.rsplit_once("?t=") else {
        return false;
    };
    let Some((timestamp, token)) = query.split_once("&nocache=") else {
        return false;
    };
    !timestamp.is_empty()
        && timestamp.chars().all(|c| c.is_ascii_digit())
        && token.len() == 9
        && token.chars().all(|c| c.is_ascii_alphanumeric())
}

fn tiny_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(2, 2, image::Rgb([10, 20, 30]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).expect("encode png");
    out.into_inner()
}

/// テンプレートid=5 + me.png の送信が成功する
#[tokio::test]
async fn test_process_success_scenario() {
    let (base, log) = spawn_stub(|_, _| StubResponse::json(200, SUCCESS_BODY)).await;
    let client = client(&base);

    let mut controller = Controller::new();
    controller.select_template(find_template(5).unwrap());
    controller.select_photo(me_png());
    let request = controller.begin_processing().unwrap();

    let outcome = client.process_photos(&request.photo, &request.template, |_| {}).await;
    controller.finish(outcome);

    let AppState::Succeeded(result) = controller.state() else {
        panic!("unexpected state: {:?}", controller.state());
    };
    assert_eq!(result.message, "Imagen procesada exitosamente en 2.35s");
    assert!(has_cache_busting_suffix(&result.image_url), "{}", result.image_url);
    assert_eq!(result.original_url, format!("{}/results/abc.jpg", base));
    assert_eq!(result.metadata.clothe_id, Some(5));

    let requests = log.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let sent = &requests[0];
    assert_eq!(sent.method, "POST");
    assert_eq!(sent.target, "/vto");
    assert!(sent.header("content-type").unwrap().starts_with("multipart/form-data"));
    assert!(sent.body_contains("name=\"person_image\"; filename=\"me.png\""));
    assert!(sent.body_contains("name=\"clothe_id\"\r\n\r\n5\r\n"));

    let person = sent.field("person_image").expect("person_image field");
    assert_eq!(person.file_name.as_deref(), Some("me.png"));
    assert_eq!(person.content_type.as_deref(), Some("image/png"));
    assert_eq!(person.data.as_ref(), me_png().bytes.as_slice());
    assert_eq!(sent.field_text("clothe_id").as_deref(), Some("5"));
}

/// 末尾がチャンク終端に似たバイト列の写真も欠けずに届く
#[tokio::test]
async fn test_photo_bytes_arrive_intact() {
    let (base, log) = spawn_stub(|_, _| StubResponse::json(200, SUCCESS_BODY)).await;
    let mut bytes = vec![42u8; 150 * 1024];
    bytes.extend_from_slice(b"0\r\n\r\n");
    let photo = SelectedPhoto::from_file("edge.jpg", None, bytes.clone());

    client(&base)
        .process_photos(&photo, &find_template(4).unwrap(), |_| {})
        .await
        .unwrap();

    let requests = log.lock().unwrap();
    let person = requests[0].field("person_image").expect("person_image field");
    assert_eq!(person.data.len(), bytes.len());
    assert_eq!(person.data.as_ref(), bytes.as_slice());
    assert_eq!(requests[0].field_text("clothe_id").as_deref(), Some("4"));
}

/// 同じパスの結果でも表示URLは毎回異なる
#[tokio::test]
async fn test_two_results_for_same_path_differ() {
    let (base, _) = spawn_stub(|_, _| StubResponse::json(200, SUCCESS_BODY)).await;
    let client = client(&base);
    let template = find_template(5).unwrap();

    let first = client.process_photos(&me_png(), &template, |_| {}).await.unwrap();
    let second = client.process_photos(&me_png(), &template, |_| {}).await.unwrap();

    assert_ne!(first.image_url, second.image_url);
    assert_eq!(first.original_url, second.original_url);
    assert!(!first.original_url.contains('?'));
}

/// 送信進捗が最後に100%になる
#[tokio::test]
async fn test_upload_progress_reaches_total() {
    let (base, _) = spawn_stub(|_, _| StubResponse::json(200, SUCCESS_BODY)).await;
    let client = client(&base);
    let photo = SelectedPhoto::from_file("big.jpg", None, vec![7u8; 200 * 1024]);

    let last = Arc::new(AtomicU64::new(0));
    let seen = last.clone();
    client
        .process_photos(&photo, &find_template(1).unwrap(), move |p| {
            assert_eq!(p.total, 200 * 1024);
            seen.store(p.loaded, Ordering::SeqCst);
        })
        .await
        .unwrap();

    assert_eq!(last.load(Ordering::SeqCst), 200 * 1024);
}

/// 404 + detail はサーバーのメッセージをそのまま表示
#[tokio::test]
async fn test_not_found_with_detail() {
    let (base, _) = spawn_stub(|_, _| StubResponse::json(404, r#"{"detail":"clothe not found"}"#)).await;
    let client = client(&base);

    let mut controller = Controller::new();
    controller.select_template(find_template(3).unwrap());
    controller.select_photo(me_png());
    let request = controller.begin_processing().unwrap();
    controller.finish(client.process_photos(&request.photo, &request.template, |_| {}).await);

    assert_eq!(controller.state(), &AppState::Failed("clothe not found".to_string()));
}

#[tokio::test]
async fn test_bare_404_and_500() {
    let (base, _) = spawn_stub(|_, _| StubResponse::json(404, "")).await;
    let err = client(&base)
        .process_photos(&me_png(), &find_template(1).unwrap(), |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound));

    let (base, _) = spawn_stub(|_, _| StubResponse::json(500, "Internal Server Error")).await;
    let err = client(&base)
        .process_photos(&me_png(), &find_template(1).unwrap(), |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ServerError));
}

/// タイムアウトは到達不能と区別される
#[tokio::test]
async fn test_timeout_is_distinguishable_from_unreachable() {
    let (base, _) = spawn_stub(|_, _| {
        StubResponse::json(200, SUCCESS_BODY).delayed(Duration::from_secs(3))
    })
    .await;
    let config = ServiceConfig {
        process_timeout_ms: 300,
        ..ServiceConfig::with_base_url(&base)
    };
    let client = VtoClient::new(config).unwrap();

    let mut controller = Controller::new();
    controller.select_template(find_template(2).unwrap());
    controller.select_photo(me_png());
    let request = controller.begin_processing().unwrap();
    controller.finish(client.process_photos(&request.photo, &request.template, |_| {}).await);
    let timeout_state = controller.state().clone();
    assert_eq!(timeout_state, AppState::Failed(Error::TimedOut.to_string()));

    let unreachable = self::client(&closed_base_url().await)
        .process_photos(&me_png(), &find_template(2).unwrap(), |_| {})
        .await
        .unwrap_err();
    assert!(matches!(unreachable, Error::Unreachable));
    assert_ne!(timeout_state, AppState::Failed(unreachable.to_string()));
}

/// IDも数字も無い衣服は送信前に拒否される
#[tokio::test]
async fn test_unresolved_garment_does_no_io() {
    let (base, log) = spawn_stub(|_, _| StubResponse::json(200, SUCCESS_BODY)).await;
    let garment = GarmentDescriptor {
        name: "chaqueta.jpg".to_string(),
        ..Default::default()
    };

    let err = client(&base).process_photos(&me_png(), &garment, |_| {}).await.unwrap_err();
    assert!(matches!(err, Error::UnresolvedGarment(_)));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_descriptor_name_fallback_is_sent() {
    let (base, log) = spawn_stub(|_, _| StubResponse::json(200, SUCCESS_BODY)).await;
    let garment = GarmentDescriptor {
        name: "clothe_12.jpg".to_string(),
        ..Default::default()
    };

    client(&base).process_photos(&me_png(), &garment, |_| {}).await.unwrap();
    assert_eq!(log.lock().unwrap()[0].field_text("clothe_id").as_deref(), Some("12"));
}

#[tokio::test]
async fn test_catalog() {
    let (base, _) = spawn_stub(|_, path| match path {
        "/clothes" => StubResponse::json(
            200,
            r#"{"success":true,"total":2,"clothes":[{"id":1,"name":"chaqueta"},{"name":"dress_3"}]}"#,
        ),
        _ => StubResponse::json(404, ""),
    })
    .await;

    let clothes = client(&base).get_available_clothes().await.unwrap();
    assert_eq!(clothes.len(), 2);
    assert_eq!(clothes[0].name, "chaqueta");

    let (base, _) = spawn_stub(|_, _| StubResponse::json(500, "")).await;
    assert!(matches!(
        client(&base).get_available_clothes().await,
        Err(Error::CatalogUnavailable)
    ));
    assert!(matches!(
        client(&closed_base_url().await).get_available_clothes().await,
        Err(Error::CatalogUnavailable)
    ));
}

#[tokio::test]
async fn test_health() {
    let (base, _) = spawn_stub(|_, _| {
        StubResponse::json(200, r#"{"status":"healthy","detector_ready":true,"clothe_count":6}"#)
    })
    .await;
    let health = client(&base).check_server_health().await;
    assert!(health.is_healthy);
    assert!(health.detector_ready);
    assert_eq!(health.clothe_count, 6);

    let health = client(&closed_base_url().await).check_server_health().await;
    assert!(!health.is_healthy);
    assert!(health.error.is_some());
}

#[tokio::test]
async fn test_metrics() {
    let (base, _) = spawn_stub(|_, _| {
        StubResponse::json(200, r#"{"success":true,"metrics":{"requests":3}}"#)
    })
    .await;
    let metrics = client(&base).get_server_metrics().await.unwrap();
    assert_eq!(metrics["requests"], 3);

    assert!(matches!(
        client(&closed_base_url().await).get_server_metrics().await,
        Err(Error::MetricsUnavailable)
    ));
}

/// ダウンロードはキャッシュ回避クエリを外した正規URLから取得する
#[tokio::test]
async fn test_download_strips_cache_busting() {
    let png = tiny_png();
    let body = png.clone();
    let (base, log) = spawn_stub(move |_, _| StubResponse::bytes(200, body.clone(), "image/png")).await;
    let dir = tempdir().expect("Failed to create temp dir");

    let url = format!("{}/results/abc.jpg?t=1700000000000&nocache=abcdefghi", base);
    let saved = client(&base).download_result(&url, dir.path()).await.unwrap();

    assert_eq!(saved, dir.path().join("abc.jpg"));
    assert_eq!(std::fs::read(&saved).unwrap(), png);

    let requests = log.lock().unwrap();
    assert_eq!(requests[0].target, "/results/abc.jpg");
    assert_eq!(
        requests[0].header("cache-control").as_deref(),
        Some("no-cache, no-store, must-revalidate")
    );
}

#[tokio::test]
async fn test_download_failure() {
    let (base, _) = spawn_stub(|_, _| StubResponse::json(404, "")).await;
    let dir = tempdir().expect("Failed to create temp dir");
    let err = client(&base)
        .download_result(&format!("{}/results/missing.jpg", base), &dir.path().join("out.jpg"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DownloadFailed));
}

/// プリロードはキャッシュ回避URLで取得してデコードする
#[tokio::test]
async fn test_preload_image() {
    let png = tiny_png();
    let (base, log) = spawn_stub(move |_, _| StubResponse::bytes(200, png.clone(), "image/png")).await;

    let decoded = client(&base)
        .preload_image(&format!("{}/results/abc.jpg", base))
        .await
        .unwrap();
    assert_eq!(decoded.width(), 2);
    assert!(log.lock().unwrap()[0].target.starts_with("/results/abc.jpg?t="));

    let (base, _) = spawn_stub(|_, _| StubResponse::bytes(200, b"not an image".to_vec(), "image/png")).await;
    assert!(matches!(
        client(&base).preload_image(&format!("{}/x.png", base)).await,
        Err(Error::PreloadFailed)
    ));
}
