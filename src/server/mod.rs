mod api;
mod error;
mod state;
mod types;

use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use self::state::*;
pub use self::types::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::login_handler,
        api::logout_handler,
        api::me_handler,
        api::models_handler,
        api::index_handler,
        api::search_handler,
        api::reset_handler,
    ),
    components(schemas(
        types::LoginRequest,
        types::LoginResponse,
        types::UserResponse,
        types::IndexForm,
        types::IndexResponse,
        types::SearchResponse,
    ))
)]
pub struct ApiDoc;

/// 构建API服务器
pub fn create_app(state: Arc<AppState>) -> Router {
    // 上传的图片只对已登录用户可见
    let uploads = Router::new()
        .nest_service("/uploads", ServeDir::new(state.pipeline.upload_dir()))
        .layer(middleware::from_fn_with_state(state.clone(), require_login));

    Router::new()
        .route("/login", post(api::login_handler))
        .route("/logout", post(api::logout_handler))
        .route("/me", get(api::me_handler))
        .route("/models", get(api::models_handler))
        .route("/index", post(api::index_handler))
        .route("/search", get(api::search_handler))
        .route("/reset", post(api::reset_handler))
        .route("/metrics", get(api::metrics_handler))
        .merge(uploads)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::disable())
        // 上传限制：50M
        .layer(RequestBodyLimitLayer::new(1024 * 1024 * 50))
        .with_state(state)
}

async fn require_login(_user: CurrentUser, request: Request, next: Next) -> Response {
    next.run(request).await
}
