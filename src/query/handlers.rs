// region:    --- Imports
use super::queries;
use crate::auction::model::{Auction, Bid, User};
use crate::bidding::error::BidError;
use crate::database::DatabaseManager;
use serde::Serialize;
use sqlx::Error as SqlxError;
use sqlx::Row;
use tracing::info;

// endregion: --- Imports

// region:    --- Pagination

/// 페이지 기본값 및 상한
const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct BidPage {
    pub bids: Vec<Bid>,
    pub pagination: Pagination,
}

/// 페이지 파라미터 보정
fn normalize_page_params(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(DEFAULT_PAGE).max(1);
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    (page, limit)
}

// endregion: --- Pagination

// region:    --- Query Handlers

/// 경매 조회
pub async fn get_auction(db_manager: &DatabaseManager, auction_id: i64) -> Result<Auction, BidError> {
    info!("{:<12} --> 경매 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
                    .bind(auction_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(BidError::NotFound(auction_id))
            })
        })
        .await
}

/// 모든 경매 조회
pub async fn get_all_auctions(db_manager: &DatabaseManager) -> Result<Vec<Auction>, SqlxError> {
    info!("{:<12} --> 모든 경매 조회", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Auction>(queries::GET_ALL_AUCTIONS)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 최고 입찰 조회
pub async fn get_highest_bid(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<Option<Bid>, BidError> {
    info!("{:<12} --> 최고 입찰 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let found: bool = sqlx::query(queries::AUCTION_EXISTS)
                    .bind(auction_id)
                    .fetch_one(&mut **tx)
                    .await?
                    .get("found");
                if !found {
                    return Err(BidError::NotFound(auction_id));
                }

                let highest = sqlx::query_as::<_, Bid>(queries::GET_HIGHEST_BID)
                    .bind(auction_id)
                    .fetch_optional(&mut **tx)
                    .await?;
                Ok(highest)
            })
        })
        .await
}

/// 입찰 이력 페이지 조회 (최신순)
/// 읽기 전용이므로 행 잠금은 잡지 않는다.
pub async fn list_bids(
    db_manager: &DatabaseManager,
    auction_id: i64,
    page: Option<i64>,
    limit: Option<i64>,
) -> Result<BidPage, BidError> {
    let (page, limit) = normalize_page_params(page, limit);
    info!(
        "{:<12} --> 입찰 이력 조회 id: {} page: {} limit: {}",
        "Query", auction_id, page, limit
    );
    db_manager
        .transaction(move |tx| {
            Box::pin(async move {
                let found: bool = sqlx::query(queries::AUCTION_EXISTS)
                    .bind(auction_id)
                    .fetch_one(&mut **tx)
                    .await?
                    .get("found");
                if !found {
                    return Err(BidError::NotFound(auction_id));
                }

                let total: i64 = sqlx::query(queries::COUNT_BIDS)
                    .bind(auction_id)
                    .fetch_one(&mut **tx)
                    .await?
                    .get("total");

                let bids = sqlx::query_as::<_, Bid>(queries::GET_BIDS_PAGE)
                    .bind(auction_id)
                    .bind(limit)
                    .bind((page - 1) * limit)
                    .fetch_all(&mut **tx)
                    .await?;

                let total_pages = (total + limit - 1) / limit;
                Ok(BidPage {
                    bids,
                    pagination: Pagination {
                        page,
                        limit,
                        total,
                        total_pages,
                    },
                })
            })
        })
        .await
}

/// 사용자 조회 (알림 발송용)
pub async fn get_user(db_manager: &DatabaseManager, user_id: i64) -> Result<Option<User>, SqlxError> {
    info!("{:<12} --> 사용자 조회 id: {}", "Query", user_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, User>(queries::GET_USER)
                    .bind(user_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

// endregion: --- Query Handlers

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_defaults_and_clamping() {
        assert_eq!(normalize_page_params(None, None), (1, 20));
        assert_eq!(normalize_page_params(Some(0), Some(0)), (1, 1));
        assert_eq!(normalize_page_params(Some(-3), Some(1000)), (1, 100));
        assert_eq!(normalize_page_params(Some(4), Some(50)), (4, 50));
    }
}
