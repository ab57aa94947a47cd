use actix_web::{App, HttpServer, web};
use tracing::info;

use crate::api::api_handlers::{
    handle_download, handle_download_status, handle_upload, handle_upload_status,
};
use crate::config::Config;
use crate::scheduler::TransferEngine;

/// Registers the transfer routes. Shared with the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/download", web::post().to(handle_download))
        .route("/download/{id}", web::get().to(handle_download_status))
        .route("/upload", web::post().to(handle_upload))
        .route("/upload/status/{id}", web::get().to(handle_upload_status));
}

// ========== SERVER SIDE ==========

pub async fn run(config: Config) -> std::io::Result<()> {
    let engine = web::Data::new(TransferEngine::new(config.transfer_settings()));
    let port = config.listen_port;

    info!(port, "listening for transfer requests");
    HttpServer::new(move || App::new().app_data(engine.clone()).configure(configure))
        .bind(("0.0.0.0", port))?
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::api_objects::TransferRecordSnapshot;
    use crate::transfer_objects::{TransferKind, TransferStatus};
    use crate::worker::tests::settings_in;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use std::time::Duration;

    fn engine_in(dir: &std::path::Path, porklock_bin: &str) -> web::Data<TransferEngine> {
        web::Data::new(TransferEngine::new(settings_in(dir, porklock_bin)))
    }

    #[actix_web::test]
    async fn unknown_ids_are_404() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(dir.path(), "porklock");
        let app = test::init_service(App::new().app_data(engine).configure(configure)).await;

        for uri in [
            "/download/3f0b6c2e-2f4b-4c9e-8d1a-0b0e6b1a2c3d",
            "/upload/status/3f0b6c2e-2f4b-4c9e-8d1a-0b0e6b1a2c3d",
            "/upload/status/garbage",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[actix_web::test]
    async fn download_without_path_list_returns_requested_record() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(dir.path(), "porklock");
        let app = test::init_service(App::new().app_data(engine).configure(configure)).await;

        let req = test::TestRequest::post().uri("/download").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "application/json"
        );
        let record: TransferRecordSnapshot = test::read_body_json(resp).await;
        assert_eq!(record.status, TransferStatus::Requested);
        assert_eq!(record.kind, TransferKind::Download);

        let req = test::TestRequest::get()
            .uri(&format!("/download/{}", record.uuid))
            .to_request();
        let polled: TransferRecordSnapshot = test::call_and_read_body_json(&app, req).await;
        assert_eq!(polled, record);
    }

    #[cfg(unix)]
    #[actix_web::test]
    async fn non_blocking_upload_can_be_polled_to_completion() {
        let dir = tempfile::tempdir().unwrap();
        let tool = crate::worker::tests::fake_porklock(dir.path(), "sleep 0.3");
        let engine = engine_in(dir.path(), &tool);
        let app = test::init_service(App::new().app_data(engine).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/upload?non-blocking")
            .to_request();
        let record: TransferRecordSnapshot = test::call_and_read_body_json(&app, req).await;
        assert_eq!(record.kind, TransferKind::Upload);
        assert!(!record.status.is_terminal());

        let uri = format!("/upload/status/{}", record.uuid);
        let mut last = record;
        for _ in 0..100 {
            let req = test::TestRequest::get().uri(&uri).to_request();
            last = test::call_and_read_body_json(&app, req).await;
            if last.status.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(last.status, TransferStatus::Completed);
        assert!(last.completion_time.is_some());
    }

    #[cfg(unix)]
    #[actix_web::test]
    async fn blocking_upload_reports_the_final_status() {
        let dir = tempfile::tempdir().unwrap();
        let tool = crate::worker::tests::fake_porklock(dir.path(), "exit 2");
        let engine = engine_in(dir.path(), &tool);
        let app = test::init_service(App::new().app_data(engine).configure(configure)).await;

        let req = test::TestRequest::post().uri("/upload").to_request();
        let record: TransferRecordSnapshot = test::call_and_read_body_json(&app, req).await;
        assert_eq!(record.status, TransferStatus::Failed);
        assert!(record.completion_time.is_some());
    }
}
