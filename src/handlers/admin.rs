use crate::models::*;
use crate::services::AdminService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/admin/lock",
    tag = "admin",
    request_body = LockRequest,
    responses(
        (status = 200, description = "已指定下一次抽奖结果"),
        (status = 400, description = "奖品ID为空或不存在", body = ApiError),
        (status = 401, description = "管理员密钥错误", body = ApiError)
    )
)]
/// 指定下一次抽奖结果 (覆盖已有指定, 不检查库存)
pub async fn lock(
    service: web::Data<AdminService>,
    body: web::Json<LockRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = service.verify_secret(&body.secret) {
        return Ok(e.error_response());
    }
    match service.lock(&body.prize_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": format!("Prize locked for next spin: {}", body.prize_id.trim())
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/unlock",
    tag = "admin",
    request_body = AdminSecretRequest,
    responses(
        (status = 200, description = "已取消指定"),
        (status = 401, description = "管理员密钥错误", body = ApiError)
    )
)]
pub async fn unlock(
    service: web::Data<AdminService>,
    body: web::Json<AdminSecretRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = service.verify_secret(&body.secret) {
        return Ok(e.error_response());
    }
    match service.unlock().await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Prize lock removed"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/reset",
    tag = "admin",
    request_body = AdminSecretRequest,
    responses(
        (status = 200, description = "库存已重置"),
        (status = 401, description = "管理员密钥错误", body = ApiError)
    )
)]
/// 恢复所有限量奖品库存并清除指定 (不删除抽奖日志)
pub async fn reset(
    service: web::Data<AdminService>,
    body: web::Json<AdminSecretRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = service.verify_secret(&body.secret) {
        return Ok(e.error_response());
    }
    match service.reset().await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "All stocks reset to default values"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/status",
    tag = "admin",
    responses(
        (status = 200, description = "当前指定与库存", body = AdminStatusResponse)
    )
)]
pub async fn get_status(service: web::Data<AdminService>) -> Result<HttpResponse> {
    match service.status().await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/logs",
    tag = "admin",
    params(
        ("limit" = Option<u32>, Query, description = "条数 (默认50, 最多100)")
    ),
    responses(
        (status = 200, description = "最近抽奖记录 (倒序)", body = [SpinLog])
    )
)]
pub async fn get_logs(
    service: web::Data<AdminService>,
    query: web::Query<SpinLogQuery>,
) -> Result<HttpResponse> {
    match service.recent_logs(query.limit).await {
        Ok(logs) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": logs }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/stats",
    tag = "admin",
    responses(
        (status = 200, description = "抽奖统计", body = SpinStatsResponse)
    )
)]
pub async fn get_stats(service: web::Data<AdminService>) -> Result<HttpResponse> {
    match service.stats().await {
        Ok(stats) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": stats }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/prizes",
    tag = "admin",
    responses(
        (status = 200, description = "奖品配置", body = [PrizeResponse])
    )
)]
pub async fn get_prizes(service: web::Data<AdminService>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": service.prizes() })))
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/lock", web::post().to(lock))
            .route("/unlock", web::post().to(unlock))
            .route("/reset", web::post().to(reset))
            .route("/status", web::get().to(get_status))
            .route("/logs", web::get().to(get_logs))
            .route("/stats", web::get().to(get_stats))
            .route("/prizes", web::get().to(get_prizes)),
    );
}
