use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::api::{handlers, AppState};
use crate::system;

/// Конфигурация всех роутов приложения
pub fn configure_routes(state: AppState) -> Router {
    // ========================================
    // ADMIN ROUTES (JWT, role = admin)
    // ========================================
    let admin = Router::new()
        .route(
            "/api/admin/sync",
            post(handlers::u501_sync_from_winestro::run_sync),
        )
        .route(
            "/api/admin/sync/status",
            get(handlers::u501_sync_from_winestro::status),
        )
        .route(
            "/api/admin/sync/:session_id/progress",
            get(handlers::u501_sync_from_winestro::get_progress),
        )
        .route("/api/admin/logs", get(handlers::system_log::list))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            system::auth::middleware::require_admin,
        ));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        // Внешний cron (bearer-токен) и вебхуки Winestro (HMAC)
        .route(
            "/api/cron/sync",
            post(handlers::u501_sync_from_winestro::cron_sync),
        )
        .route("/api/webhooks/winestro", post(handlers::webhooks::winestro))
        // Каталог (только чтение)
        .route("/api/products", get(handlers::a001_product::list_all))
        .route("/api/products/:id", get(handlers::a001_product::get_by_id))
        .merge(admin)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_state;
    use crate::system::auth::jwt::issue_test_token;
    use crate::system::auth::signature::sign;
    use crate::usecases::u501_sync_from_winestro::test_support::{riesling_a100, ScriptedSource};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use contracts::system::auth::UserRole;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn catalog() -> Vec<Value> {
        vec![
            riesling_a100(),
            json!({"artikelnr": "X", "name": "Grauburgunder", "preis": "11,90", "bestand": 8}),
        ]
    }

    fn admin_token() -> String {
        issue_test_token("test-jwt-secret", UserRole::Admin, 3600)
    }

    fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn webhook(body: &Value, secret: &str) -> Request<Body> {
        let raw = body.to_string();
        Request::builder()
            .method("POST")
            .uri("/api/webhooks/winestro")
            .header("content-type", "application/json")
            .header(
                "X-Winestro-Signature",
                format!("sha256={}", sign(secret, raw.as_bytes())),
            )
            .body(Body::from(raw))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_admin_sync_requires_admin_role() {
        let state = test_state(Arc::new(ScriptedSource::new(catalog()))).await;
        let app = configure_routes(state);
        let body = json!({"action": "sync-products"});

        let response = app
            .clone()
            .oneshot(post_json("/api/admin/sync", None, body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let customer = issue_test_token("test-jwt-secret", UserRole::Customer, 3600);
        let response = app
            .clone()
            .oneshot(post_json("/api/admin/sync", Some(&customer), body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .clone()
            .oneshot(post_json("/api/admin/sync", Some(&admin_token()), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let result = json_body(response).await;
        assert_eq!(result["total"], 2);
        assert_eq!(result["successful"], 2);
        assert_eq!(result["success"], true);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/admin/sync/status")
                    .header("authorization", format!("Bearer {}", admin_token()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = json_body(response).await;
        assert_eq!(status["phase"], "completed");
    }

    #[tokio::test]
    async fn test_admin_test_connection_and_bad_request() {
        let state = test_state(Arc::new(ScriptedSource::new(catalog()))).await;
        let products = state.products.clone();
        let app = configure_routes(state);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/admin/sync",
                Some(&admin_token()),
                json!({"action": "test-connection"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let result = json_body(response).await;
        assert_eq!(result["success"], true);
        assert_eq!(result["article_count"], 2);
        assert!(products.list_all().await.unwrap().is_empty());

        let response = app
            .oneshot(post_json(
                "/api/admin/sync",
                Some(&admin_token()),
                json!({"action": "sync-single-product"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_erp_outage_maps_to_bad_gateway() {
        let state = test_state(Arc::new(ScriptedSource::failing(500))).await;
        let app = configure_routes(state);

        let response = app
            .oneshot(post_json(
                "/api/admin/sync",
                Some(&admin_token()),
                json!({"action": "sync-products"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "erp_unavailable");
    }

    #[tokio::test]
    async fn test_cron_sync_checks_bearer_token() {
        let state = test_state(Arc::new(ScriptedSource::new(catalog()))).await;
        let app = configure_routes(state);

        let response = app
            .clone()
            .oneshot(post_json("/api/cron/sync", Some("wrong"), json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(post_json(
                "/api/cron/sync",
                Some("test-cron-secret"),
                json!({"limit": 1}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let result = json_body(response).await;
        assert_eq!(result["total"], 1);
        assert_eq!(result["trigger"], "cron");
    }

    #[tokio::test]
    async fn test_cron_sync_rejects_malformed_options() {
        let source = Arc::new(ScriptedSource::new(catalog()));
        let app = configure_routes(test_state(source.clone()).await);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/cron/sync",
                Some("test-cron-secret"),
                json!({"limit": "5"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "invalid_request");
        assert_eq!(source.list_calls(), 0);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/cron/sync")
                    .header("authorization", "Bearer test-cron-secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["total"], 2);
    }

    #[tokio::test]
    async fn test_webhook_update_triggers_exactly_one_single_sync() {
        let source = Arc::new(ScriptedSource::new(catalog()));
        let state = test_state(source.clone()).await;
        let products = state.products.clone();
        let app = configure_routes(state);

        let payload = json!({"event": "product.updated", "data": {"id": "X"}});
        let response = app
            .oneshot(webhook(&payload, "test-webhook-secret"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["action"], "synced");
        assert_eq!(body["result"]["external_id"], "X");
        assert_eq!(source.article_calls(), 1);
        assert_eq!(source.list_calls(), 0);

        use crate::domain::a001_product::ProductStore;
        assert!(products.find_by_external_id("X").await.unwrap().is_some());
        assert!(products.find_by_external_id("A100").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_webhook_rejects_bad_signature() {
        let source = Arc::new(ScriptedSource::new(catalog()));
        let app = configure_routes(test_state(source.clone()).await);

        let payload = json!({"event": "product.updated", "data": {"id": "X"}});
        let response = app.oneshot(webhook(&payload, "forged")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(source.article_calls(), 0);
    }

    #[tokio::test]
    async fn test_webhook_delete_and_unknown_events() {
        let source = Arc::new(ScriptedSource::new(catalog()));
        let state = test_state(source.clone()).await;
        let app = configure_routes(state);

        let created = json!({"event": "product.created", "data": {"id": "A100"}});
        app.clone()
            .oneshot(webhook(&created, "test-webhook-secret"))
            .await
            .unwrap();

        let deleted = json!({"event": "product.deleted", "data": {"id": "A100"}});
        let response = app
            .clone()
            .oneshot(webhook(&deleted, "test-webhook-secret"))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["action"], "archived");

        let other = json!({"event": "order.paid", "data": {"id": 17}});
        let response = app
            .clone()
            .oneshot(webhook(&other, "test-webhook-secret"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["action"], "ignored");
        assert_eq!(source.article_calls(), 1);

        let response = app
            .oneshot(Request::builder().uri("/api/products").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_body(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_products_endpoints() {
        let state = test_state(Arc::new(ScriptedSource::new(catalog()))).await;
        let executor = state.executor.clone();
        let app = configure_routes(state);

        let result = executor
            .sync_single_product("A100", contracts::usecases::u501_sync_from_winestro::SyncTrigger::Admin)
            .await
            .unwrap();
        let id = result.product.unwrap().base.id.value().to_string();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/products/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let product = json_body(response).await;
        assert_eq!(product["externalId"], "A100");
        assert_eq!(product["code"], "riesling-2022");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/products/not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/products/{}", uuid::Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
