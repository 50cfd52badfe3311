use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::spin::spin,
        handlers::admin::lock,
        handlers::admin::unlock,
        handlers::admin::reset,
        handlers::admin::get_status,
        handlers::admin::get_logs,
        handlers::admin::get_stats,
        handlers::admin::get_prizes,
    ),
    components(
        schemas(
            SpinRequest,
            SpinOutcome,
            SpinLog,
            PrizeCount,
            SpinStatsResponse,
            PrizeResponse,
            LockRequest,
            AdminSecretRequest,
            LockStatusResponse,
            StockStatus,
            AdminStatusResponse,
            SpinLogQuery,
            ApiError,
        )
    ),
    tags(
        (name = "spin", description = "Spin API"),
        (name = "admin", description = "Lottery administration API"),
    ),
    info(
        title = "Lucky Spin API",
        version = "1.0.0",
        description = "Lucky Spin Backend REST API documentation"
    ),
    servers(
        (url = "/api", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
