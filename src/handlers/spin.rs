use crate::models::*;
use crate::services::SpinService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/spin",
    tag = "spin",
    request_body = SpinRequest,
    responses(
        (status = 200, description = "抽奖成功", body = SpinOutcome),
        (status = 400, description = "用户标识缺失或格式错误", body = ApiError),
        (status = 503, description = "存储不可用, 本次抽奖未生效", body = ApiError)
    )
)]
/// 进行一次抽奖:
/// 1. 优先处理管理员指定的结果
/// 2. 否则按权重随机抽取
/// 3. 立即返回结果, 抽奖日志异步写入
pub async fn spin(
    service: web::Data<SpinService>,
    body: web::Json<SpinRequest>,
) -> Result<HttpResponse> {
    let user_id = match body.validated_user_id() {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.spin(user_id).await {
        Ok(outcome) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": outcome }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn spin_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/spin", web::post().to(spin));
}
