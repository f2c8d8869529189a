/// 경매 수명 주기 스케줄러
/// 마감 시간이 지난 ACTIVE 경매를 ENDED로 전환한다.
/// DRAFT -> ACTIVE 전환(승인)은 별도의 모더레이션 서비스 소관.
/// 이 UPDATE는 경매 행 잠금을 기다리므로 진행 중인 입찰 트랜잭션과
/// 직렬화된다. 입찰이 종료 시간을 연장한 직후 끼어들어 경매를 닫는
/// 손실 갱신이 생기지 않는다.
// region:    --- Imports
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, error};

// endregion: --- Imports

// region:    --- Auction Scheduler

pub struct AuctionScheduler {
    pool: Arc<PgPool>,
}

impl AuctionScheduler {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// 스케줄러 시작
    pub async fn start(&self) {
        let pool = Arc::clone(&self.pool);
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                if let Err(e) = Self::end_expired_auctions(&pool).await {
                    error!(
                        "{:<12} --> 경매 종료 처리 중 오류 발생: {:?}",
                        "Scheduler", e
                    );
                }
            }
        });
    }

    /// 마감 지난 경매 종료
    async fn end_expired_auctions(pool: &PgPool) -> Result<(), sqlx::Error> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE auctions SET status = 'ENDED'
             WHERE status = 'ACTIVE' AND end_time <= $1",
        )
        .bind(now)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            debug!(
                "{:<12} --> 경매 {}건 종료 처리",
                "Scheduler",
                result.rows_affected()
            );
        }

        Ok(())
    }
}

// endregion: --- Auction Scheduler
