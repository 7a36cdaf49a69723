//! 接口响应格式

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fedhub_common::Error;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// 只有状态码和消息键的响应体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseResponse {
    /// HTTP 状态码
    pub code: u16,
    /// 消息键
    pub message: String,
}

impl BaseResponse {
    /// 200 成功消息
    pub fn ok(message: &str) -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            message: message.to_string(),
        }
    }
}

impl IntoResponse for BaseResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// 接口错误
///
/// 只向调用方暴露消息键。
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("请求体无效: {}", rejection);
        Self(Error::RequestValueInvalid)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        warn!("查询参数无效: {}", rejection);
        Self(Error::RequestValueInvalid)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        BaseResponse {
            code: self.0.status_code(),
            message: self.0.message_key().to_string(),
        }
        .into_response()
    }
}

/// 接口结果类型别名
pub type ApiResult<T> = std::result::Result<T, ApiError>;
