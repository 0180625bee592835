//! Caller-owned record of completed ranking runs.
//!
//! A [`RankingRun`] is an owned snapshot of one `JobRanker::rank` call. The
//! [`RankingHistory`] only ever grows; runs are never edited once pushed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use jobhunt_core::error::{Error, Result};
use jobhunt_core::types::{JobPosting, JobSetId, ProfileId, RankedResult, RankingRunId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedJob {
    /// 1-based rank within the run.
    pub rank: usize,
    /// Index of the posting in the ranked job set.
    pub position: usize,
    pub score: f32,
    pub job: JobPosting,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingRun {
    pub id: RankingRunId,
    pub profile_id: ProfileId,
    pub job_set_id: JobSetId,
    pub top_k: usize,
    pub embedder_id: String,
    pub created_at: DateTime<Utc>,
    pub results: Vec<RankedJob>,
}

impl RankingRun {
    pub fn from_results(
        profile_id: ProfileId,
        job_set_id: JobSetId,
        top_k: usize,
        embedder_id: &str,
        results: &[RankedResult<'_>],
    ) -> Self {
        let results = results
            .iter()
            .enumerate()
            .map(|(i, r)| RankedJob { rank: i + 1, position: r.position, score: r.score, job: r.job.clone() })
            .collect();
        Self {
            id: RankingRunId::new(),
            profile_id,
            job_set_id,
            top_k,
            embedder_id: embedder_id.to_string(),
            created_at: Utc::now(),
            results,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RankingHistory {
    #[serde(default)]
    runs: Vec<RankingRun>,
}

impl RankingHistory {
    pub fn new() -> Self { Self::default() }

    /// Append a run and return its id.
    pub fn push(&mut self, run: RankingRun) -> RankingRunId {
        let id = run.id;
        self.runs.push(run);
        id
    }

    pub fn get(&self, id: RankingRunId) -> Option<&RankingRun> {
        self.runs.iter().find(|r| r.id == id)
    }

    pub fn latest(&self) -> Option<&RankingRun> { self.runs.last() }

    /// Runs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &RankingRun> { self.runs.iter() }

    pub fn len(&self) -> usize { self.runs.len() }
    pub fn is_empty(&self) -> bool { self.runs.is_empty() }

    /// Load a history file; a missing file is an empty history.
    pub fn load(path: &Path) -> Result<Self> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no history file yet");
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::Io(e)),
        };
        let history: Self = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::Parse(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), runs = history.len(), "loaded history");
        Ok(history)
    }

    /// Write through a temp file in the same directory, then rename over `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent,
            None => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.flush()?;
        }
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        tracing::debug!(path = %path.display(), runs = self.len(), "saved history");
        Ok(())
    }
}
