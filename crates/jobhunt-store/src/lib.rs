pub mod history;
pub mod loader;

pub use history::{RankedJob, RankingHistory, RankingRun};
pub use loader::{load_job, load_job_set, load_profile, save_job_set};
