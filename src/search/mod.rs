//! Product search: query resolution, caching, ranking and sessions.

pub mod cache;
pub mod orchestrator;
pub mod pipeline;
pub mod query;
pub mod session;

pub use cache::{CacheEntry, CacheKey, ProductCache};
pub use orchestrator::{ResultSource, SearchOrchestrator, SearchOutcome, SearchRequest};
pub use query::{ResolvedQuery, resolve_query};
pub use session::{SearchSession, SessionPhase, SessionState};
