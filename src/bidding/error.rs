// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Bid Error

/// 입찰 처리 오류 분류
/// 비즈니스 규칙 위반은 모두 트랜잭션 내부에서 발생하여 롤백을 유발한다.
#[derive(Debug, Error)]
pub enum BidError {
    #[error("경매를 찾을 수 없습니다. id: {0}")]
    NotFound(i64),
    #[error("{0}")]
    InvalidState(String),
    #[error("판매자는 자신의 경매에 입찰할 수 없습니다.")]
    Forbidden,
    #[error("{0}")]
    Validation(String),
    #[error("내부 오류: {0}")]
    Internal(String),
}

impl BidError {
    /// 오류 종류 코드 (응답 바디의 error 필드)
    pub fn kind(&self) -> &'static str {
        match self {
            BidError::NotFound(_) => "NOT_FOUND",
            BidError::InvalidState(_) => "INVALID_STATE",
            BidError::Forbidden => "FORBIDDEN",
            BidError::Validation(_) => "VALIDATION",
            BidError::Internal(_) => "INTERNAL",
        }
    }

    /// HTTP 상태 코드 매핑
    /// FORBIDDEN은 인증 실패가 아닌 비즈니스 규칙이므로 400으로 내려간다.
    pub fn status_code(&self) -> StatusCode {
        match self {
            BidError::NotFound(_) => StatusCode::NOT_FOUND,
            BidError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// 잠금 대기 타임아웃을 포함한 저장소 오류는 재시도 가능한 내부 오류로 변환
impl From<sqlx::Error> for BidError {
    fn from(e: sqlx::Error) -> Self {
        BidError::Internal(e.to_string())
    }
}

impl IntoResponse for BidError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));
        (self.status_code(), body).into_response()
    }
}

// endregion: --- Bid Error
