use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 경매 상태 값
/// DRAFT -> ACTIVE 전환은 별도의 심사(모더레이션) 서비스가 수행한다.
pub mod status {
    pub const DRAFT: &str = "DRAFT";
    pub const ACTIVE: &str = "ACTIVE";
    pub const ENDED: &str = "ENDED";
    pub const CANCELLED: &str = "CANCELLED";
}

// 경매 모델
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Auction {
    pub id: i64,
    pub seller_id: i64,
    pub title: String,
    pub description: String,
    pub status: String,
    pub is_approved: bool,
    pub starting_price: i64,
    pub current_price: i64,
    pub buy_now_price: Option<i64>,
    pub reserve_price: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// 입찰 모델
// amount/auction_id/bidder_id는 생성 후 불변, is_winning 플래그만 갱신된다.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
    pub is_winning: bool,
    pub created_at: DateTime<Utc>,
}

// 사용자 모델 (알림 발송에 필요한 최소 정보만 읽는다)
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}
