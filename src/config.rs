use chrono::Duration;

/// 입찰 정책 설정
/// 배포 환경에서 환경 변수로 주입하며, 미설정 시 기본값을 사용한다.
#[derive(Debug, Clone, Copy)]
pub struct BidConfig {
    /// 최소 입찰 증가분 (통화 단위)
    pub min_increment: i64,
    /// 스나이핑 방지 윈도우 (초)
    pub sniping_window_secs: i64,
}

impl Default for BidConfig {
    fn default() -> Self {
        Self {
            min_increment: 5,
            sniping_window_secs: 300,
        }
    }
}

impl BidConfig {
    /// 환경 변수에서 설정 로드
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_increment: env_i64("MIN_INCREMENT", defaults.min_increment),
            sniping_window_secs: env_i64(
                "SNIPING_PROTECTION_WINDOW_SECS",
                defaults.sniping_window_secs,
            ),
        }
    }

    /// 스나이핑 방지 윈도우
    pub fn sniping_window(&self) -> Duration {
        Duration::seconds(self.sniping_window_secs)
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
