pub mod admin;
pub mod health;
pub mod spin;

pub use admin::admin_config;
pub use health::health_config;
pub use spin::spin_config;

use crate::error::AppError;
use actix_web::web;

/// 请求体解析失败统一返回 VALIDATION_ERROR
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PrizeCatalog, PrizeDefinition, StockCeiling};
    use crate::repository::{ForcedOutcomeSlot, MemoryStore, StockLedger, StockLevel, Stores};
    use crate::services::{AdminService, AuditSink, SpinService};
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    const SECRET: &str = "test-secret";

    async fn services() -> (SpinService, AdminService, Arc<MemoryStore>) {
        let prize = |id: &str, stock, weight, forced_only| PrizeDefinition {
            id: id.to_string(),
            display_name: format!("{id} prize"),
            stock_ceiling: stock,
            weight,
            forced_only,
        };
        let catalog = Arc::new(
            PrizeCatalog::new(
                vec![
                    prize("MK_DUCK", StockCeiling::Finite(5), 0, true),
                    prize("NOTHING", StockCeiling::Unlimited, 50, false),
                    prize("GIVE_IG", StockCeiling::Unlimited, 50, false),
                ],
                "NOTHING",
            )
            .unwrap(),
        );
        let store = Arc::new(MemoryStore::default());
        store.seed(&catalog).await.unwrap();
        let stores = Stores::from_memory(store.clone());
        let audit = AuditSink::new(stores.logs.clone());
        (
            SpinService::new(catalog.clone(), &stores, audit.clone()),
            AdminService::new(catalog, &stores, audit, SECRET.to_string()),
            store,
        )
    }

    macro_rules! test_app {
        ($spin:expr, $admin:expr) => {
            test::init_service(
                App::new()
                    .app_data(json_config())
                    .app_data(web::Data::new($spin))
                    .app_data(web::Data::new($admin))
                    .configure(health_config)
                    .service(
                        web::scope("/api")
                            .configure(spin_config)
                            .configure(admin_config),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_health() {
        let (spin, admin, _) = services().await;
        let app = test_app!(spin, admin);

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
    }

    #[actix_web::test]
    async fn test_spin_returns_random_prize() {
        let (spin, admin, _) = services().await;
        let app = test_app!(spin, admin);

        let req = test::TestRequest::post()
            .uri("/api/spin")
            .set_json(json!({ "user_id": "alice" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        let prize_id = body["data"]["prize_id"].as_str().unwrap();
        assert!(prize_id == "NOTHING" || prize_id == "GIVE_IG");
        assert_eq!(body["data"]["was_forced"], false);
    }

    #[actix_web::test]
    async fn test_spin_requires_user_id() {
        let (spin, admin, _) = services().await;
        let app = test_app!(spin, admin);

        let req = test::TestRequest::post()
            .uri("/api/spin")
            .set_json(json!({ "user_id": "  " }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let req = test::TestRequest::post()
            .uri("/api/spin")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_lock_then_spin_awards_forced_prize() {
        let (spin, admin, store) = services().await;
        let app = test_app!(spin, admin);

        let req = test::TestRequest::post()
            .uri("/api/admin/lock")
            .set_json(json!({ "prize_id": "MK_DUCK", "secret": SECRET }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/admin/status")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["lock"]["is_locked"], true);
        assert_eq!(body["data"]["lock"]["locked_prize_id"], "MK_DUCK");

        let req = test::TestRequest::post()
            .uri("/api/spin")
            .set_json(json!({ "instagram_id": "bob" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["prize_id"], "MK_DUCK");
        assert_eq!(body["data"]["prize_name"], "MK_DUCK prize");
        assert_eq!(body["data"]["was_forced"], true);

        assert_eq!(store.read("MK_DUCK").await.unwrap(), StockLevel::Remaining(4));
        assert_eq!(store.peek().await.unwrap(), None);
    }

    #[actix_web::test]
    async fn test_admin_rejects_bad_secret() {
        let (spin, admin, store) = services().await;
        let app = test_app!(spin, admin);

        let req = test::TestRequest::post()
            .uri("/api/admin/lock")
            .set_json(json!({ "prize_id": "MK_DUCK", "secret": "nope" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(store.peek().await.unwrap(), None);

        let req = test::TestRequest::post()
            .uri("/api/admin/reset")
            .set_json(json!({ "secret": "nope" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_lock_unknown_prize() {
        let (spin, admin, _) = services().await;
        let app = test_app!(spin, admin);

        let req = test::TestRequest::post()
            .uri("/api/admin/lock")
            .set_json(json!({ "prize_id": "TESLA", "secret": SECRET }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "INVALID_PRIZE");
    }

    #[actix_web::test]
    async fn test_reset_restores_stock() {
        let (spin, admin, store) = services().await;
        let app = test_app!(spin, admin);
        store.try_claim("MK_DUCK").await.unwrap();
        store.set("MK_DUCK").await.unwrap();

        let req = test::TestRequest::post()
            .uri("/api/admin/reset")
            .set_json(json!({ "secret": SECRET }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/admin/status")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["lock"]["is_locked"], false);
        assert_eq!(body["data"]["stocks"][0]["stock"], 5);
        assert_eq!(body["data"]["stocks"][0]["max"], 5);
    }

    #[actix_web::test]
    async fn test_prizes_listing() {
        let (spin, admin, _) = services().await;
        let app = test_app!(spin, admin);

        let req = test::TestRequest::get()
            .uri("/api/admin/prizes")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let prizes = body["data"].as_array().unwrap();
        assert_eq!(prizes.len(), 3);
        assert_eq!(prizes[0]["id"], "MK_DUCK");
        assert_eq!(prizes[0]["forced_only"], true);
        assert_eq!(prizes[1]["stock"], Value::Null);
    }
}
