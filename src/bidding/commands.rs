/// 입찰 커맨드 처리
/// 경매 행 잠금(SELECT ... FOR UPDATE) 아래에서 검증과 기록을
/// 한 트랜잭션으로 수행한다. 같은 경매에 대한 동시 입찰은 잠금 획득
/// 순서대로 직렬화되므로 두 입찰이 같은 가격을 보고 통과할 수 없다.
// region:    --- Imports
use crate::auction::model::{status, Auction, Bid};
use crate::bidding::error::BidError;
use crate::config::BidConfig;
use crate::database::DatabaseManager;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

// endregion: --- Imports

// region:    --- Commands

/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub auction_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
}

/// 입찰 처리 결과
/// previous_highest와 auction_title은 커밋 이후 알림 발송에 쓰인다.
#[derive(Debug, Clone)]
pub struct BidOutcome {
    pub bid: Bid,
    pub sniping_triggered: bool,
    pub new_end_time: DateTime<Utc>,
    pub previous_highest: Option<Bid>,
    pub auction_title: String,
}

/// 경매 행 잠금 조회
/// 잠금은 읽기와 원자적으로 획득해야 한다. 먼저 읽고 나중에 잠그면
/// 두 트랜잭션이 같은 가격을 읽는 틈이 생긴다.
const LOCK_AUCTION: &str = r#"
    SELECT id, seller_id, title, description, status, is_approved,
           starting_price, current_price, buy_now_price, reserve_price,
           start_time, end_time, created_at
    FROM auctions
    WHERE id = $1
    FOR UPDATE
"#;

/// 현재 최고 입찰 조회 (경매 행 잠금이 쓰기를 직렬화한다)
const GET_HIGHEST_BID: &str = r#"
    SELECT id, auction_id, bidder_id, amount, is_winning, created_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY amount DESC, created_at ASC
    LIMIT 1
"#;

/// 입찰 기록
const INSERT_BID: &str = r#"
    INSERT INTO bids (auction_id, bidder_id, amount, is_winning, created_at)
    VALUES ($1, $2, $3, FALSE, $4)
    RETURNING id, auction_id, bidder_id, amount, is_winning, created_at
"#;

/// 경매 가격 및 종료 시간 갱신
const UPDATE_AUCTION_PRICE: &str =
    "UPDATE auctions SET current_price = $1, end_time = $2 WHERE id = $3";

/// 기존 낙찰 플래그 해제
const CLEAR_WINNING: &str =
    "UPDATE bids SET is_winning = FALSE WHERE auction_id = $1 AND is_winning = TRUE AND id <> $2";

/// 새 입찰을 낙찰 상태로 표시
const SET_WINNING: &str = "UPDATE bids SET is_winning = TRUE WHERE id = $1";

/// 입찰 처리
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    db_manager: &DatabaseManager,
    config: BidConfig,
) -> Result<BidOutcome, BidError> {
    info!("{:<12} --> 입찰 처리 시작: {:?}", "Command", cmd);
    let auction_id = cmd.auction_id;

    db_manager
        .transaction(move |tx| {
            Box::pin(async move {
                // 경매 행을 잠금과 동시에 조회
                let auction = sqlx::query_as::<_, Auction>(LOCK_AUCTION)
                    .bind(auction_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(BidError::NotFound(auction_id))?;

                // 현재 최고 입찰 조회
                let highest = sqlx::query_as::<_, Bid>(GET_HIGHEST_BID)
                    .bind(auction_id)
                    .fetch_optional(&mut **tx)
                    .await?;

                let now = Utc::now();
                validate_bid(&auction, highest.as_ref(), &cmd, now, &config)?;

                // 스나이핑 방지: 마감 임박 입찰 시 종료 시간을 앞으로만 연장
                let extension = sniping_extension(auction.end_time, now, config.sniping_window());
                let sniping_triggered = extension.is_some();
                let new_end_time = extension.unwrap_or(auction.end_time);
                if sniping_triggered {
                    info!(
                        "{:<12} --> 스나이핑 방지 발동: 경매 {} 종료 시간 {} -> {}",
                        "Command", auction_id, auction.end_time, new_end_time
                    );
                }

                // 입찰 기록
                let bid = sqlx::query_as::<_, Bid>(INSERT_BID)
                    .bind(auction_id)
                    .bind(cmd.bidder_id)
                    .bind(cmd.amount)
                    .bind(now)
                    .fetch_one(&mut **tx)
                    .await?;

                // 경매 가격 및 종료 시간 갱신
                sqlx::query(UPDATE_AUCTION_PRICE)
                    .bind(cmd.amount)
                    .bind(new_end_time)
                    .bind(auction_id)
                    .execute(&mut **tx)
                    .await?;

                // 낙찰 플래그 갱신: 경매당 낙찰 입찰은 항상 하나
                sqlx::query(CLEAR_WINNING)
                    .bind(auction_id)
                    .bind(bid.id)
                    .execute(&mut **tx)
                    .await?;
                sqlx::query(SET_WINNING)
                    .bind(bid.id)
                    .execute(&mut **tx)
                    .await?;

                let bid = Bid {
                    is_winning: true,
                    ..bid
                };

                info!(
                    "{:<12} --> 입찰 성공: 경매 {} 현재 가격 {}",
                    "Command", auction_id, bid.amount
                );

                Ok(BidOutcome {
                    bid,
                    sniping_triggered,
                    new_end_time,
                    previous_highest: highest,
                    auction_title: auction.title,
                })
            })
        })
        .await
}

/// 입찰 검증
/// 상태 -> 승인 -> 판매자 -> 마감 -> 최소 증가분 -> 즉시 구매 경계 순으로 검사한다.
pub fn validate_bid(
    auction: &Auction,
    highest: Option<&Bid>,
    cmd: &PlaceBidCommand,
    now: DateTime<Utc>,
    config: &BidConfig,
) -> Result<(), BidError> {
    if auction.status != status::ACTIVE {
        return Err(BidError::InvalidState(
            "진행 중인 경매가 아닙니다.".to_string(),
        ));
    }

    if !auction.is_approved {
        return Err(BidError::InvalidState(
            "아직 승인되지 않은 경매입니다.".to_string(),
        ));
    }

    if cmd.bidder_id == auction.seller_id {
        return Err(BidError::Forbidden);
    }

    if now > auction.end_time {
        return Err(BidError::InvalidState(
            "이미 종료된 경매입니다.".to_string(),
        ));
    }

    let current_price = highest.map(|b| b.amount).unwrap_or(auction.starting_price);
    let min_required = current_price + config.min_increment;
    if cmd.amount < min_required {
        return Err(BidError::Validation(format!(
            "입찰 금액이 너무 낮습니다. 최소 입찰 금액은 {}입니다.",
            min_required
        )));
    }

    if let Some(buy_now_price) = auction.buy_now_price {
        if cmd.amount >= buy_now_price {
            return Err(BidError::Validation(format!(
                "즉시 구매 가격({}) 이상의 금액은 즉시 구매로 진행해 주세요.",
                buy_now_price
            )));
        }
    }

    Ok(())
}

/// 스나이핑 방지 연장 계산
/// 남은 시간이 윈도우 안쪽일 때만 now + window로 연장한다.
/// 종료 시간은 앞으로만 이동한다.
pub fn sniping_extension(
    end_time: DateTime<Utc>,
    now: DateTime<Utc>,
    window: Duration,
) -> Option<DateTime<Utc>> {
    let remaining = end_time - now;
    if remaining > Duration::zero() && remaining < window {
        Some(now + window)
    } else {
        None
    }
}

// endregion: --- Commands

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    fn test_auction() -> Auction {
        let now = Utc::now();
        Auction {
            id: 1,
            seller_id: 10,
            title: "경주 비둘기".to_string(),
            description: "테스트 경매".to_string(),
            status: status::ACTIVE.to_string(),
            is_approved: true,
            starting_price: 100,
            current_price: 100,
            buy_now_price: None,
            reserve_price: None,
            start_time: now - Duration::hours(1),
            end_time: now + Duration::hours(1),
            created_at: now - Duration::hours(2),
        }
    }

    fn test_bid(amount: i64) -> Bid {
        Bid {
            id: 7,
            auction_id: 1,
            bidder_id: 20,
            amount,
            is_winning: true,
            created_at: Utc::now(),
        }
    }

    fn test_cmd(bidder_id: i64, amount: i64) -> PlaceBidCommand {
        PlaceBidCommand {
            auction_id: 1,
            bidder_id,
            amount,
        }
    }

    fn config() -> BidConfig {
        BidConfig::default()
    }

    #[test]
    fn rejects_inactive_auction() {
        let mut auction = test_auction();
        auction.status = status::ENDED.to_string();
        let err = validate_bid(&auction, None, &test_cmd(20, 200), Utc::now(), &config())
            .expect_err("ENDED 상태는 거부되어야 한다");
        assert_eq!(err.kind(), "INVALID_STATE");

        auction.status = status::DRAFT.to_string();
        let err = validate_bid(&auction, None, &test_cmd(20, 200), Utc::now(), &config())
            .expect_err("DRAFT 상태는 거부되어야 한다");
        assert_eq!(err.kind(), "INVALID_STATE");
    }

    #[test]
    fn rejects_unapproved_auction() {
        let mut auction = test_auction();
        auction.is_approved = false;
        let err = validate_bid(&auction, None, &test_cmd(20, 200), Utc::now(), &config())
            .expect_err("미승인 경매는 거부되어야 한다");
        assert_eq!(err.kind(), "INVALID_STATE");
    }

    #[test]
    fn rejects_seller_bid_regardless_of_amount() {
        let auction = test_auction();
        let err = validate_bid(
            &auction,
            None,
            &test_cmd(auction.seller_id, 1_000_000),
            Utc::now(),
            &config(),
        )
        .expect_err("판매자 입찰은 거부되어야 한다");
        assert_eq!(err.kind(), "FORBIDDEN");
    }

    #[test]
    fn rejects_bid_after_end_time() {
        let auction = test_auction();
        let after_end = auction.end_time + Duration::seconds(1);
        let err = validate_bid(&auction, None, &test_cmd(20, 200), after_end, &config())
            .expect_err("마감 이후 입찰은 거부되어야 한다");
        assert_eq!(err.kind(), "INVALID_STATE");
    }

    #[test]
    fn minimum_increment_without_bids() {
        // 시작가 100, 최소 증가분 5: 104 거부, 105 수락
        let auction = test_auction();
        let err = validate_bid(&auction, None, &test_cmd(20, 104), Utc::now(), &config())
            .expect_err("최소 금액 미달은 거부되어야 한다");
        assert_eq!(err.kind(), "VALIDATION");
        assert!(err.to_string().contains("105"), "메시지에 최소 금액 포함");

        validate_bid(&auction, None, &test_cmd(20, 105), Utc::now(), &config())
            .expect("정확히 최소 금액인 입찰은 수락되어야 한다");
    }

    #[test]
    fn minimum_increment_against_highest_bid() {
        let auction = test_auction();
        let highest = test_bid(105);
        let err = validate_bid(
            &auction,
            Some(&highest),
            &test_cmd(20, 109),
            Utc::now(),
            &config(),
        )
        .expect_err("갱신된 최소 금액 미달은 거부되어야 한다");
        assert!(err.to_string().contains("110"));

        validate_bid(
            &auction,
            Some(&highest),
            &test_cmd(20, 110),
            Utc::now(),
            &config(),
        )
        .expect("갱신된 가격 기준 최소 금액은 수락되어야 한다");
    }

    #[test]
    fn rejects_bid_at_buy_now_price() {
        let mut auction = test_auction();
        auction.buy_now_price = Some(200);
        let highest = test_bid(105);
        let err = validate_bid(
            &auction,
            Some(&highest),
            &test_cmd(20, 200),
            Utc::now(),
            &config(),
        )
        .expect_err("즉시 구매 가격 이상 입찰은 거부되어야 한다");
        assert_eq!(err.kind(), "VALIDATION");

        validate_bid(
            &auction,
            Some(&highest),
            &test_cmd(20, 195),
            Utc::now(),
            &config(),
        )
        .expect("즉시 구매 가격 미만 입찰은 수락되어야 한다");
    }

    #[test]
    fn sniping_extension_inside_window() {
        let now = Utc::now();
        let window = Duration::minutes(5);
        let end_time = now + Duration::minutes(3);
        let extended = sniping_extension(end_time, now, window)
            .expect("윈도우 안쪽이면 연장되어야 한다");
        assert_eq!(extended, now + window);
        assert!(extended > end_time, "종료 시간은 앞으로만 이동한다");
    }

    #[test]
    fn sniping_extension_outside_window() {
        let now = Utc::now();
        let window = Duration::minutes(5);
        assert!(sniping_extension(now + Duration::minutes(10), now, window).is_none());
        // 남은 시간이 정확히 윈도우와 같으면 연장하지 않는다
        assert!(sniping_extension(now + window, now, window).is_none());
        // 이미 지난 마감은 검증 단계에서 걸러지므로 연장 대상이 아니다
        assert!(sniping_extension(now - Duration::seconds(1), now, window).is_none());
    }
}

// endregion: --- Tests
