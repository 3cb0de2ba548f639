// Service exports
pub mod advisor;
pub mod cache;
pub mod job_board;
pub mod pipeline;
pub mod semantic;

pub use advisor::{GapPriority, MatchAdvisor, MatchReport, SkillGap, SkillGapReport};
pub use cache::{CacheEntry, CacheKey, CacheStats, JobCache};
pub use job_board::{language_code, synthetic_postings, JobBoardError, JobSource};
pub use pipeline::{MatchOutcome, MatchPipeline, PipelineError};
pub use semantic::{RefineError, SemanticClient, SemanticRefiner, SemanticScorer, SemanticVerdict};
