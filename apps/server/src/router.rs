use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};
use wed::kernel::server::ApiState;
use wed::server::router::{feature_router, system_router};

#[derive(OpenApi)]
#[openapi(info(title = "Wedding RSVP API"))]
struct ApiDoc;

pub(crate) fn init(state: ApiState) -> Router {
    let (routes, api_doc) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(system_router())
        .merge(feature_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .split_for_parts();

    Router::new().merge(routes).merge(Scalar::with_url("/api", api_doc))
}
