use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{
        header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE},
        Method, StatusCode,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::Claims;
use crate::error::AppError;
use crate::gql::LanebookSchema;
use crate::middleware::jwt::jwt_middleware;
use crate::state::AppState;

/// Build the Axum router with the health endpoint and GraphQL.
pub fn build_router(state: AppState, schema: LanebookSchema) -> Router {
    let origins: Vec<HeaderValue> = state
        .config()
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    Router::new()
        // Liveness check; also proves store connectivity.
        .route("/health", get(health))
        // GraphQL endpoint with custom handler that includes JWT claims in context
        .route(
            "/graphql",
            post(move |req| graphql_handler(req, schema)),
        )
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state, jwt_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([CONTENT_TYPE, AUTHORIZATION])
                .allow_credentials(true),
        )
}

/// Executes a GraphQL request with the JWT claims set by the middleware.
async fn graphql_handler(req: Request, schema: LanebookSchema) -> Result<Response, AppError> {
    let claims = req.extensions().get::<Claims>().cloned();

    let (_parts, body) = req.into_parts();
    let body_bytes = axum::body::to_bytes(body, 2 * 1024 * 1024)
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read request body: {}", e)))?;

    let mut gql_request: async_graphql::Request = serde_json::from_slice(&body_bytes)
        .map_err(|e| AppError::Validation(format!("Invalid GraphQL request: {}", e)))?;

    if let Some(claims) = claims {
        gql_request = gql_request.data(claims);
    }

    let gql_response = schema.execute(gql_request).await;

    Ok(Json(gql_response).into_response())
}

async fn health(State(state): State<AppState>) -> Result<&'static str, AppError> {
    state.store.ping().await?;
    Ok("ok")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::gql::build_schema;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use infra::MemoryBookingStore;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(store: Arc<MemoryBookingStore>) -> (Router, AppState) {
        let state = AppState::new(store, AppConfig::for_tests("router-secret"));
        let schema = build_schema(state.clone());
        (build_router(state.clone(), schema), state)
    }

    async fn response_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok_when_store_answers() {
        let (router, _) = app(Arc::new(MemoryBookingStore::new()));

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_is_unavailable_when_store_is_down() {
        let store = Arc::new(MemoryBookingStore::new());
        store.set_unavailable(true);
        let (router, _) = app(store);

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = response_json(response).await;
        assert_eq!(json["code"], "INFRA");
    }

    #[tokio::test]
    async fn invalid_bearer_token_is_rejected() {
        let (router, _) = app(Arc::new(MemoryBookingStore::new()));

        let response = router
            .oneshot(
                Request::post("/graphql")
                    .header("content-type", "application/json")
                    .header("authorization", "Bearer not-a-token")
                    .body(Body::from(r#"{"query":"{ pools { id } }"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn graphql_mutation_sees_token_identity() {
        let store = Arc::new(MemoryBookingStore::new());
        let (router, state) = app(store);
        let token = state
            .jwt_service()
            .create_token(uuid::Uuid::new_v4(), "swimmer@example.com".to_string())
            .unwrap();

        let response = router
            .oneshot(
                Request::post("/graphql")
                    .header("content-type", "application/json")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::from(
                        r#"{"query":"mutation { createReservation(scheduleIds: []) { id } }"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        // Authenticated, so the request reaches validation
        assert_eq!(json["errors"][0]["extensions"]["code"], "VALIDATION");
        assert_eq!(json["errors"][0]["message"], "no slots provided");
    }

    #[tokio::test]
    async fn anonymous_mutation_is_unauthenticated() {
        let (router, _) = app(Arc::new(MemoryBookingStore::new()));

        let response = router
            .oneshot(
                Request::post("/graphql")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"query":"mutation { createReservation(scheduleIds: []) { id } }"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        let json = response_json(response).await;
        assert_eq!(json["errors"][0]["extensions"]["code"], "UNAUTHENTICATED");
    }
}
