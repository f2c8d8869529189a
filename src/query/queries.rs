/// 경매 조회
pub const GET_AUCTION: &str = "SELECT id, seller_id, title, description, status, is_approved, starting_price, current_price, buy_now_price, reserve_price, start_time, end_time, created_at FROM auctions WHERE id = $1";

/// 모든 경매 조회
pub const GET_ALL_AUCTIONS: &str =
    "SELECT id, seller_id, title, description, status, is_approved, starting_price, current_price, buy_now_price, reserve_price, start_time, end_time, created_at FROM auctions ORDER BY created_at DESC";

/// 경매 존재 확인
pub const AUCTION_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM auctions WHERE id = $1) AS found";

/// 최고 입찰 조회
pub const GET_HIGHEST_BID: &str = r#"
    SELECT id, auction_id, bidder_id, amount, is_winning, created_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY amount DESC, created_at ASC
    LIMIT 1
"#;

/// 입찰 이력 페이지 조회 (최신순)
pub const GET_BIDS_PAGE: &str = r#"
    SELECT id, auction_id, bidder_id, amount, is_winning, created_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY created_at DESC
    LIMIT $2 OFFSET $3
"#;

/// 경매 입찰 수 조회
pub const COUNT_BIDS: &str = "SELECT COUNT(*) AS total FROM bids WHERE auction_id = $1";

/// 사용자 조회 (알림 발송용)
pub const GET_USER: &str = "SELECT id, username, email FROM users WHERE id = $1";
