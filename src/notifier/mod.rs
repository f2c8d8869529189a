/// 커밋 이후 부수 효과 전담 모듈
/// 입찰 알림과 캐시 무효화를 Kafka 토픽으로 발행한다.
/// 메일 발송 서비스와 캐시 계층이 각 토픽을 구독한다 가정.
/// 발행 실패는 로그만 남기고 삼킨다. 입찰 응답에는 절대 영향을 주지 않는다.
// region:    --- Imports
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Topics

/// 입찰 알림 토픽
pub const NOTIFICATION_TOPIC: &str = "bid-notifications";
/// 캐시 무효화 토픽
pub const CACHE_TOPIC: &str = "cache-invalidation";

// endregion: --- Topics

// region:    --- Notification Payload

/// 입찰 성공 알림 페이로드
/// 새 입찰자와 직전 최고 입찰자(있다면) 양쪽에 메일이 발송된다.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BidNotification {
    pub auction_id: i64,
    pub auction_title: String,
    pub new_bidder_name: String,
    pub new_bidder_email: String,
    pub new_bid_amount: i64,
    pub previous_bidder_email: Option<String>,
    pub previous_bid_amount: Option<i64>,
}

// endregion: --- Notification Payload

// region:    --- Notifier Trait

/// 알림/캐시 무효화 협력자 트레이트
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_bid_notification(&self, notification: BidNotification) -> Result<(), String>;
    async fn invalidate_auction_cache(&self, auction_id: i64) -> Result<(), String>;
}

// endregion: --- Notifier Trait

// region:    --- Kafka Producer

#[derive(Clone)]
pub struct KafkaProducer {
    producer: Arc<FutureProducer>,
}

impl KafkaProducer {
    pub fn new(brokers: &str) -> Self {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .expect("Producer creation error");

        KafkaProducer {
            producer: Arc::new(producer),
        }
    }

    /// 메시지 전송
    pub async fn send_message(&self, topic: &str, key: &str, value: &str) -> Result<(), String> {
        info!(
            "{:<12} --> Kafka 메시지 전송: topic={}, key={}",
            "Producer", topic, key
        );
        let record = FutureRecord::to(topic).key(key).payload(value);

        self.producer
            .send(record, std::time::Duration::from_secs(0))
            .await
            .map_err(|(e, _)| format!("Error sending message: {:?}", e))?;

        Ok(())
    }
}

// endregion: --- Kafka Producer

// region:    --- Kafka Notifier

/// Kafka 기반 알림 협력자
pub struct KafkaNotifier {
    producer: KafkaProducer,
    brokers: String,
}

impl Default for KafkaNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl KafkaNotifier {
    pub fn new() -> Self {
        let brokers =
            std::env::var("KAFKA_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string());
        let producer = KafkaProducer::new(&brokers);

        KafkaNotifier { producer, brokers }
    }

    /// 알림/캐시 무효화 토픽 생성
    pub async fn create_topics(&self) -> Result<(), String> {
        info!("{:<12} --> Kafka 토픽 생성 시작", "Notifier");

        let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .create()
            .map_err(|e| format!("AdminClient 생성 실패: {:?}", e))?;

        let topics = [
            NewTopic::new(NOTIFICATION_TOPIC, 1, TopicReplication::Fixed(1)),
            NewTopic::new(CACHE_TOPIC, 1, TopicReplication::Fixed(1)),
        ];

        match admin_client
            .create_topics(&topics, &AdminOptions::new())
            .await
        {
            Ok(_) => {
                info!("{:<12} --> Kafka 토픽 생성 성공", "Notifier");
                Ok(())
            }
            Err(e) => {
                error!("{:<12} --> Kafka 토픽 생성 실패: {:?}", "Notifier", e);
                Err(format!("토픽 생성 실패: {:?}", e))
            }
        }
    }
}

#[async_trait]
impl Notifier for KafkaNotifier {
    /// 입찰 알림 발행
    async fn send_bid_notification(&self, notification: BidNotification) -> Result<(), String> {
        let payload = serde_json::to_string(&notification).map_err(|e| e.to_string())?;
        self.producer
            .send_message(
                NOTIFICATION_TOPIC,
                &notification.auction_id.to_string(),
                &payload,
            )
            .await
    }

    /// 경매 상세와 목록 캐시 키 무효화 발행
    async fn invalidate_auction_cache(&self, auction_id: i64) -> Result<(), String> {
        let payload = serde_json::json!({
            "keys": [format!("auction:{}", auction_id), "auctions:list"],
        });
        self.producer
            .send_message(CACHE_TOPIC, &auction_id.to_string(), &payload.to_string())
            .await
    }
}

// endregion: --- Kafka Notifier
