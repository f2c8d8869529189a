// region:    --- Imports
use crate::bidding::commands::{self, BidOutcome, PlaceBidCommand};
use crate::config::BidConfig;
use crate::database::DatabaseManager;
use crate::notifier::{BidNotification, KafkaNotifier, Notifier};
use crate::query;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

// endregion: --- Imports

/// 라우터 공유 상태
pub type AppState = (Arc<DatabaseManager>, Arc<KafkaNotifier>, BidConfig);

/// 게이트웨이가 주입하는 인증 사용자 id 헤더
/// 토큰 검증, 프로필 완성도 검사, 속도 제한은 모두 업스트림 게이트웨이가 수행한다.
const CALLER_ID_HEADER: &str = "x-caller-id";

fn caller_id(headers: &HeaderMap) -> Option<i64> {
    headers
        .get(CALLER_ID_HEADER)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

// region:    --- Command Handlers

#[derive(Debug, Deserialize)]
pub struct PlaceBidRequest {
    pub amount: i64,
}

/// 입찰 요청 처리
pub async fn handle_place_bid(
    State((db_manager, notifier, config)): State<AppState>,
    Path(auction_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<PlaceBidRequest>,
) -> impl IntoResponse {
    let Some(bidder_id) = caller_id(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "UNAUTHORIZED",
                "message": "인증 정보가 없습니다.",
            })),
        )
            .into_response();
    };

    info!(
        "{:<12} --> 입찰 요청: 경매 {} 입찰자 {} 금액 {}",
        "HandlerCmd", auction_id, bidder_id, req.amount
    );

    let cmd = PlaceBidCommand {
        auction_id,
        bidder_id,
        amount: req.amount,
    };

    match commands::handle_place_bid(cmd, &db_manager, config).await {
        Ok(outcome) => {
            // 커밋 이후 부수 효과(알림, 캐시 무효화)는 분리된 태스크에서
            // 베스트 에포트로 처리한다. 실패해도 이미 성공한 응답은 그대로 나간다.
            tokio::spawn(dispatch_post_bid(
                Arc::clone(&db_manager),
                Arc::clone(&notifier),
                outcome.clone(),
            ));

            (
                StatusCode::CREATED,
                Json(serde_json::json!({
                    "message": "입찰이 성공적으로 처리되었습니다.",
                    "bid": outcome.bid,
                    "snipingProtectionTriggered": outcome.sniping_triggered,
                    "newEndTime": outcome.new_end_time,
                })),
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// 커밋 이후 알림 및 캐시 무효화
async fn dispatch_post_bid(
    db_manager: Arc<DatabaseManager>,
    notifier: Arc<KafkaNotifier>,
    outcome: BidOutcome,
) {
    let auction_id = outcome.bid.auction_id;

    match build_notification(&db_manager, &outcome).await {
        Ok(Some(notification)) => {
            if let Err(e) = notifier.send_bid_notification(notification).await {
                warn!("{:<12} --> 입찰 알림 발행 실패 (무시): {}", "Notifier", e);
            }
        }
        Ok(None) => warn!(
            "{:<12} --> 입찰자 {} 정보 없음: 알림 생략",
            "Notifier", outcome.bid.bidder_id
        ),
        Err(e) => warn!("{:<12} --> 알림 구성 실패 (무시): {}", "Notifier", e),
    }

    if let Err(e) = notifier.invalidate_auction_cache(auction_id).await {
        warn!("{:<12} --> 캐시 무효화 발행 실패 (무시): {}", "Notifier", e);
    }
}

/// 새 입찰자와 직전 최고 입찰자 정보로 알림 페이로드 구성
async fn build_notification(
    db_manager: &DatabaseManager,
    outcome: &BidOutcome,
) -> Result<Option<BidNotification>, sqlx::Error> {
    let Some(new_bidder) = query::handlers::get_user(db_manager, outcome.bid.bidder_id).await?
    else {
        return Ok(None);
    };

    let previous_bidder_email = match &outcome.previous_highest {
        Some(prev) => query::handlers::get_user(db_manager, prev.bidder_id)
            .await?
            .map(|u| u.email),
        None => None,
    };

    Ok(Some(BidNotification {
        auction_id: outcome.bid.auction_id,
        auction_title: outcome.auction_title.clone(),
        new_bidder_name: new_bidder.username,
        new_bidder_email: new_bidder.email,
        new_bid_amount: outcome.bid.amount,
        previous_bidder_email,
        previous_bid_amount: outcome.previous_highest.as_ref().map(|b| b.amount),
    }))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// 입찰 이력 조회 (최신순, 페이지네이션)
pub async fn handle_list_bids(
    State((db_manager, _, _)): State<AppState>,
    Path(auction_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "HandlerQuery", auction_id);
    match query::handlers::list_bids(&db_manager, auction_id, params.page, params.limit).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => e.into_response(),
    }
}

/// 경매 조회
pub async fn handle_get_auction(
    State((db_manager, _, _)): State<AppState>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 경매 조회 id: {}", "HandlerQuery", auction_id);
    match query::handlers::get_auction(&db_manager, auction_id).await {
        Ok(auction) => Json(auction).into_response(),
        Err(e) => e.into_response(),
    }
}

/// 모든 경매 조회
pub async fn handle_get_auctions(
    State((db_manager, _, _)): State<AppState>,
) -> impl IntoResponse {
    info!("{:<12} --> 모든 경매 조회", "HandlerQuery");
    match query::handlers::get_all_auctions(&db_manager).await {
        Ok(auctions) => Json(auctions).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// 최고 입찰 조회
pub async fn handle_get_highest_bid(
    State((db_manager, _, _)): State<AppState>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 최고 입찰 조회 id: {}",
        "HandlerQuery", auction_id
    );
    match query::handlers::get_highest_bid(&db_manager, auction_id).await {
        Ok(bid) => Json(bid).into_response(),
        Err(e) => e.into_response(),
    }
}

// endregion: --- Query Handlers
