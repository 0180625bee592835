//! Semantic job ranking: cosine similarity between a profile embedding and
//! each posting's embedding, plus keyword skills analysis.

pub mod ranker;
pub mod similarity;
pub mod skills;

pub use ranker::JobRanker;
pub use similarity::cosine_similarity;
pub use skills::{matching_skills, missing_skills, DEFAULT_SKILL_VOCABULARY};
