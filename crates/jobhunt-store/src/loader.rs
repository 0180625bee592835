//! File readers for parsed resumes and job sets.
//!
//! Job sets come from a `.json` file (either a saved [`JobSet`] or a bare
//! array of postings) or a `.csv` file with a header row. Postings without
//! a title, company, location, description or url field are skipped; an
//! empty value still counts as present.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use jobhunt_core::error::{Error, Result};
use jobhunt_core::types::{JobPosting, JobSet, Profile};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawJob {
    title: Option<String>,
    company: Option<String>,
    location: Option<String>,
    description: Option<String>,
    url: Option<String>,
    source: Option<String>,
    date_posted: Option<String>,
    salary: Option<String>,
    job_type: Option<String>,
}

impl RawJob {
    fn into_posting(self, default_source: &str) -> Option<JobPosting> {
        let title = self.title?;
        let company = self.company?;
        let location = self.location?;
        let description = self.description?;
        let url = self.url?;
        Some(JobPosting {
            title,
            company,
            location,
            description,
            url,
            source: optional(self.source).unwrap_or_else(|| default_source.to_string()),
            date_posted: match self.date_posted {
                Some(date) => optional(Some(date)),
                None => Some(Utc::now().format("%Y-%m-%d").to_string()),
            },
            salary: optional(self.salary),
            job_type: optional(self.job_type),
        })
    }

    /// csv maps an empty cell to `None` for `Option` fields, so rows are read
    /// as header maps to tell an empty cell from a missing column.
    fn from_row(mut row: HashMap<String, String>) -> Self {
        Self {
            title: row.remove("title"),
            company: row.remove("company"),
            location: row.remove("location"),
            description: row.remove("description"),
            url: row.remove("url"),
            source: row.remove("source"),
            date_posted: row.remove("date_posted"),
            salary: row.remove("salary"),
            job_type: row.remove("job_type"),
        }
    }
}

/// Flat CSV row; every column is written for every posting.
#[derive(Serialize)]
struct CsvJob<'a> {
    title: &'a str,
    company: &'a str,
    location: &'a str,
    description: &'a str,
    url: &'a str,
    source: &'a str,
    date_posted: &'a str,
    salary: &'a str,
    job_type: &'a str,
}

impl<'a> From<&'a JobPosting> for CsvJob<'a> {
    fn from(job: &'a JobPosting) -> Self {
        Self {
            title: &job.title,
            company: &job.company,
            location: &job.location,
            description: &job.description,
            url: &job.url,
            source: &job.source,
            date_posted: job.date_posted.as_deref().unwrap_or(""),
            salary: job.salary.as_deref().unwrap_or(""),
            job_type: job.job_type.as_deref().unwrap_or(""),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonJobs {
    Set(JobSet),
    List(Vec<RawJob>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonJob {
    Ranked { job: JobPosting },
    Bare(JobPosting),
}

fn optional(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
        _ => Error::Io(e),
    })
}

fn collect_postings(raw: Vec<RawJob>, source: &str, path: &Path) -> Vec<JobPosting> {
    let total = raw.len();
    let mut jobs = Vec::with_capacity(total);
    for (row, r) in raw.into_iter().enumerate() {
        match r.into_posting(source) {
            Some(job) => jobs.push(job),
            None => tracing::warn!(path = %path.display(), row, "skipping job with missing required fields"),
        }
    }
    tracing::info!(path = %path.display(), loaded = jobs.len(), skipped = total - jobs.len(), "loaded jobs");
    jobs
}

/// Read a parsed resume. Profiles without an id get a fresh one.
pub fn load_profile(path: &Path) -> Result<Profile> {
    let profile: Profile = serde_json::from_reader(BufReader::new(open(path)?))
        .map_err(|e| Error::Parse(format!("{}: {}", path.display(), e)))?;
    Ok(profile.normalized())
}

/// Read a job set from `.json` or `.csv`. A saved set keeps its id and name;
/// anything else becomes a new set called `name`.
pub fn load_job_set(path: &Path, name: &str) -> Result<JobSet> {
    let ext = path.extension().and_then(|s| s.to_str()).map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("json") => {
            let parsed: JsonJobs = serde_json::from_reader(BufReader::new(open(path)?))
                .map_err(|e| Error::Parse(format!("{}: {}", path.display(), e)))?;
            match parsed {
                JsonJobs::Set(set) => Ok(set),
                JsonJobs::List(raw) => Ok(JobSet::new(name, collect_postings(raw, "json", path))),
            }
        }
        Some("csv") => {
            let mut reader = csv::Reader::from_reader(open(path)?);
            let mut raw = Vec::new();
            for record in reader.deserialize::<HashMap<String, String>>() {
                let row = record.map_err(|e| Error::Parse(format!("{}: {}", path.display(), e)))?;
                raw.push(RawJob::from_row(row));
            }
            Ok(JobSet::new(name, collect_postings(raw, "csv", path)))
        }
        _ => Err(Error::InvalidArgument(format!(
            "unsupported job file '{}': expected .json or .csv",
            path.display()
        ))),
    }
}

/// Read one posting, either bare or as an entry of a ranked output file.
pub fn load_job(path: &Path) -> Result<JobPosting> {
    let parsed: JsonJob = serde_json::from_reader(BufReader::new(open(path)?))
        .map_err(|e| Error::Parse(format!("{}: {}", path.display(), e)))?;
    Ok(match parsed {
        JsonJob::Ranked { job } => job,
        JsonJob::Bare(job) => job,
    })
}

/// Write a job set as pretty JSON, or as a flat `.csv` of its postings.
/// The CSV form keeps only the postings; reloading it yields a new set.
pub fn save_job_set(set: &JobSet, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let is_csv = path.extension().and_then(|s| s.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        let mut writer = csv::Writer::from_path(path).map_err(|e| Error::Parse(format!("{}: {}", path.display(), e)))?;
        for job in &set.jobs {
            writer.serialize(CsvJob::from(job)).map_err(|e| Error::Parse(format!("{}: {}", path.display(), e)))?;
        }
        writer.flush()?;
    } else {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, set)?;
        writer.flush()?;
    }
    tracing::debug!(path = %path.display(), jobs = set.len(), "saved job set");
    Ok(())
}
