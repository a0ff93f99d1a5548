//! 基础设施层
//!
//! 持有外部资源（HTTP 连接、文件），只暴露能力：
//! - `transport` - 检索 / 发布的抽象
//! - `naver_client` - 네이버 책 검색 API 客户端
//! - `publisher` - Kafka REST Proxy 与 JSON Lines 发布实现
//! - `wait` - 可取消的定时等待

pub mod naver_client;
pub mod publisher;
pub mod transport;
pub mod wait;

pub use naver_client::NaverClient;
pub use publisher::{build_publishers, JsonLinesPublisher, RestProxyPublisher};
pub use transport::{PublishTransport, RawLinePublisher, SearchTransport};
pub use wait::{wait_or_cancel, WaitOutcome};
