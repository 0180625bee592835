//! Domain types shared by the ranker, the loaders and the history store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self { Self(Uuid::new_v4()) }
        }

        impl Default for $name {
            fn default() -> Self { Self::new() }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
        }

        impl FromStr for $name {
            type Err = crate::error::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|e| crate::error::Error::InvalidArgument(format!("bad id '{}': {}", s, e)))
            }
        }
    };
}

opaque_id!(
    /// Identity of a parsed resume.
    ProfileId
);
opaque_id!(
    /// Identity of one fetched collection of job postings.
    JobSetId
);
opaque_id!(RankingRunId);

/// A work history entry. Parsers emit either a structured record or a
/// single free-text line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExperienceEntry {
    Detailed {
        #[serde(default)]
        title: String,
        #[serde(default)]
        company: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dates: Option<String>,
        #[serde(default)]
        description: String,
    },
    Plain(String),
}

impl ExperienceEntry {
    fn render(&self) -> Option<String> {
        match self {
            ExperienceEntry::Detailed { title, company, description, .. } => {
                if title.trim().is_empty() && company.trim().is_empty() && description.trim().is_empty() {
                    return None;
                }
                Some(format!("{} at {}: {}.", title.trim(), company.trim(), description.trim()))
            }
            ExperienceEntry::Plain(s) => non_blank(s).map(|s| format!("{}.", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EducationEntry {
    Detailed {
        #[serde(default)]
        degree: String,
        #[serde(default)]
        institution: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dates: Option<String>,
    },
    Plain(String),
}

impl EducationEntry {
    fn render(&self) -> Option<String> {
        match self {
            EducationEntry::Detailed { degree, institution, .. } => {
                if degree.trim().is_empty() && institution.trim().is_empty() { return None; }
                Some(format!("{} from {}.", degree.trim(), institution.trim()))
            }
            EducationEntry::Plain(s) => non_blank(s).map(|s| format!("{}.", s)),
        }
    }
}

/// A candidate, as produced by one resume upload.
///
/// `skills` has set semantics: construct through [`Profile::new`] /
/// [`Profile::with_skills`] to drop blanks and case-insensitive duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: ProfileId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub summary: String,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ProfileId::new(),
            name: name.into(),
            email: None,
            phone: None,
            skills: Vec::new(),
            experience: Vec::new(),
            education: Vec::new(),
            summary: String::new(),
        }
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills.extend(skills.into_iter().map(Into::into));
        self.skills = dedup_skills(std::mem::take(&mut self.skills));
        self
    }

    pub fn with_experience(mut self, entry: ExperienceEntry) -> Self {
        self.experience.push(entry);
        self
    }

    pub fn with_education(mut self, entry: EducationEntry) -> Self {
        self.education.push(entry);
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Re-apply set semantics to `skills` after deserialization.
    pub fn normalized(mut self) -> Self {
        self.skills = dedup_skills(std::mem::take(&mut self.skills));
        self
    }

    /// Text fed to the embedder. `None` when skills, experience, education
    /// and summary are all blank; the name alone is not a usable profile.
    pub fn embedding_text(&self) -> Option<String> {
        let mut sections = Vec::new();

        let skills: Vec<&str> = self.skills.iter().filter_map(|s| non_blank(s)).collect();
        if !skills.is_empty() {
            sections.push(format!("Skills: {}", skills.join(", ")));
        }
        let experience: Vec<String> = self.experience.iter().filter_map(ExperienceEntry::render).collect();
        if !experience.is_empty() {
            sections.push(format!("Experience: {}", experience.join(" ")));
        }
        let education: Vec<String> = self.education.iter().filter_map(EducationEntry::render).collect();
        if !education.is_empty() {
            sections.push(format!("Education: {}", education.join(" ")));
        }
        if let Some(summary) = non_blank(&self.summary) {
            sections.push(format!("Summary: {}", summary));
        }
        if sections.is_empty() {
            return None;
        }

        let mut text = String::new();
        if let Some(name) = non_blank(&self.name) {
            text.push_str(&format!("{} Resume Summary:\n\n", name));
        }
        text.push_str(&sections.join("\n\n"));
        Some(text)
    }
}

/// A single job listing as returned by a fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_posted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
}

impl JobPosting {
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        location: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            location: location.into(),
            description: description.into(),
            url: String::new(),
            source: String::new(),
            date_posted: None,
            salary: None,
            job_type: None,
        }
    }

    /// Job summary fed to the embedder.
    pub fn embedding_text(&self) -> String {
        format!(
            "Job Title: {}\n\nCompany: {}\n\nLocation: {}\n\nDescription: {}\n\nJob Type: {}\n\nSalary: {}",
            self.title,
            self.company,
            self.location,
            self.description,
            self.job_type.as_deref().and_then(non_blank).unwrap_or("Not specified"),
            self.salary.as_deref().and_then(non_blank).unwrap_or("Not specified"),
        )
    }
}

/// A named, immutable collection of postings produced by one fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSet {
    pub id: JobSetId,
    pub name: String,
    pub fetched_at: DateTime<Utc>,
    pub jobs: Vec<JobPosting>,
}

impl JobSet {
    pub fn new(name: impl Into<String>, jobs: Vec<JobPosting>) -> Self {
        Self { id: JobSetId::new(), name: name.into(), fetched_at: Utc::now(), jobs }
    }

    pub fn len(&self) -> usize { self.jobs.len() }
    pub fn is_empty(&self) -> bool { self.jobs.is_empty() }
}

/// One scored posting in a ranking.
///
/// `position` is the index of `job` in the input list; `score` lies in [0,1]
/// and higher is better.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RankedResult<'a> {
    pub position: usize,
    pub job: &'a JobPosting,
    pub score: f32,
}

fn non_blank(s: &str) -> Option<&str> {
    let t = s.trim();
    if t.is_empty() { None } else { Some(t) }
}

fn dedup_skills(skills: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .collect()
}
