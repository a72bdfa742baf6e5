//! Admin login.
//!
//! POST /admin/login - Exchange email/password for an admin bearer token

use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Extension, Json, Router};

use crate::error::Result;
use crate::models::{ApiResponse, LoginRequest, LoginResponse};
use crate::service::ApiClient;

/// Build the auth router.
pub fn router() -> Router {
    Router::new().route("/admin/login", post(login))
}

/// Log in through the order service. Non-admin accounts get 401.
async fn login(
    Extension(client): Extension<ApiClient>,
    req: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResponse>>> {
    let Json(req) = req?;
    let session = client.login(&req.email, &req.password).await?;

    Ok(Json(ApiResponse {
        data: LoginResponse {
            token: session.token().to_string(),
            role: session.role().as_str().to_string(),
        },
        message: "Logged in".to_string(),
    }))
}
