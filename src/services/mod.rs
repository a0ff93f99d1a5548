pub mod collection_engine;
pub mod inspect;
pub mod rate_limit;
pub mod retry_policy;

pub use collection_engine::{Collection, CollectionEngine, FetchOutcome, StopReason};
pub use inspect::InspectService;
pub use rate_limit::RateLimitState;
pub use retry_policy::RetryPolicy;
