use jobhunt_core::error::{Error, Result};
use jobhunt_core::traits::Embedder;
use jobhunt_core::types::{JobPosting, Profile, RankedResult};

use crate::similarity::cosine_similarity;

pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Ranks job postings against a candidate profile by embedding similarity.
///
/// Pure with respect to its inputs: nothing is cached or recorded. Callers
/// keep the results (see `RankingHistory` in `jobhunt-store`).
pub struct JobRanker {
    embedder: Box<dyn Embedder>,
    batch_size: usize,
}

impl JobRanker {
    pub fn new(embedder: Box<dyn Embedder>) -> Self {
        Self { embedder, batch_size: DEFAULT_BATCH_SIZE }
    }

    /// Number of job texts per `embed_batch` call. Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn embedder(&self) -> &dyn Embedder { self.embedder.as_ref() }

    /// Score every job against `profile` and return the best `top_k`,
    /// highest score first. Equal scores keep input order.
    ///
    /// An empty `jobs` slice yields an empty ranking without consulting the
    /// embedder. Fails with `InvalidArgument` for `top_k == 0` or a profile
    /// with no usable text, and with `EmbeddingFailure` on the first provider
    /// error; there are no partial results.
    pub fn rank<'a>(&self, profile: &Profile, jobs: &'a [JobPosting], top_k: usize) -> Result<Vec<RankedResult<'a>>> {
        if jobs.is_empty() {
            tracing::debug!("no jobs to rank");
            return Ok(Vec::new());
        }
        if top_k == 0 {
            return Err(Error::InvalidArgument("top_k must be at least 1".into()));
        }
        let profile_text = profile.embedding_text().ok_or_else(|| {
            Error::InvalidArgument(format!(
                "profile {} has no skills, experience, education or summary to embed",
                profile.id
            ))
        })?;

        let profile_vec = self
            .embedder
            .embed(&profile_text)
            .map_err(|e| Error::EmbeddingFailure(format!("profile {}: {:#}", profile.id, e)))?;
        check_vector(&profile_vec, None, "profile")?;

        let texts: Vec<String> = jobs.iter().map(JobPosting::embedding_text).collect();
        let mut scored = Vec::with_capacity(jobs.len());
        for (batch_index, batch) in texts.chunks(self.batch_size).enumerate() {
            let offset = batch_index * self.batch_size;
            let vectors = self.embedder.embed_batch(batch).map_err(|e| {
                Error::EmbeddingFailure(format!("jobs {}..{}: {:#}", offset, offset + batch.len(), e))
            })?;
            if vectors.len() != batch.len() {
                return Err(Error::EmbeddingFailure(format!(
                    "provider returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            for (i, v) in vectors.iter().enumerate() {
                let position = offset + i;
                check_vector(v, Some(profile_vec.len()), &format!("job {}", position))?;
                scored.push(RankedResult { position, job: &jobs[position], score: cosine_similarity(&profile_vec, v) });
            }
            tracing::debug!(batch = batch_index, size = batch.len(), "scored batch");
        }

        let ranked = select_top_k(scored, top_k);
        tracing::info!(
            profile = %profile.id,
            jobs = jobs.len(),
            top_k,
            returned = ranked.len(),
            embedder = self.embedder.embedder_id(),
            best = ranked.first().map(|r| r.score).unwrap_or(0.0),
            "ranked jobs"
        );
        Ok(ranked)
    }
}

/// Stable sort by descending score, then truncate.
pub fn select_top_k(mut scored: Vec<RankedResult<'_>>, top_k: usize) -> Vec<RankedResult<'_>> {
    // slice::sort_by is stable, so equal scores keep input order
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);
    scored
}

fn check_vector(v: &[f32], expected_dim: Option<usize>, what: &str) -> Result<()> {
    if v.is_empty() {
        return Err(Error::EmbeddingFailure(format!("{}: empty embedding", what)));
    }
    if let Some(dim) = expected_dim {
        if v.len() != dim {
            return Err(Error::EmbeddingFailure(format!("{}: dimension {} != profile dimension {}", what, v.len(), dim)));
        }
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(Error::EmbeddingFailure(format!("{}: non-finite embedding component", what)));
    }
    Ok(())
}
