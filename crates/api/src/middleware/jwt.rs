use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::auth::Claims;
use crate::error::AppError;
use crate::state::AppState;

/// Verifies a `Bearer` token when one is present and stores its claims in the
/// request extensions. Requests without a token pass through anonymously;
/// a token that fails verification is rejected.
pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::to_string);

    if let Some(token) = token {
        match state.jwt_service().verify_token(&token) {
            Ok(claims) => {
                request.extensions_mut().insert::<Claims>(claims);
            }
            Err(e) => {
                tracing::debug!("Rejected bearer token: {e}");
                return Err(AppError::Unauthenticated(
                    "Invalid or expired token".to_string(),
                ));
            }
        }
    }

    Ok(next.run(request).await)
}
