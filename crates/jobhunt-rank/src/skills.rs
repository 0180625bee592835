//! Keyword skills analysis between a profile and a single posting.
//!
//! Matching is a case-insensitive substring test against the posting's
//! description, so "Java" also matches "JavaScript".

use jobhunt_core::types::{JobPosting, Profile};

/// Skills checked by `missing_skills` when the caller has no vocabulary of
/// its own.
pub const DEFAULT_SKILL_VOCABULARY: &[&str] = &[
    "Python", "Java", "JavaScript", "TypeScript", "Rust", "Go", "C++", "C#", "Ruby", "Kotlin", "Swift",
    "SQL", "PostgreSQL", "MySQL", "MongoDB", "Redis",
    "React", "Angular", "Vue", "Node.js", "Django", "Flask", "Spring",
    "Docker", "Kubernetes", "Terraform", "AWS", "Azure", "GCP", "Linux", "Git",
    "Machine Learning", "Deep Learning", "NLP", "TensorFlow", "PyTorch", "Pandas",
    "GraphQL", "REST", "Kafka", "Spark",
];

/// Profile skills mentioned in the job description, in profile order.
pub fn matching_skills(profile: &Profile, job: &JobPosting) -> Vec<String> {
    let description = job.description.to_lowercase();
    profile
        .skills
        .iter()
        .filter(|skill| mentions(&description, skill))
        .cloned()
        .collect()
}

/// Vocabulary skills the job description mentions but the profile lacks, in
/// vocabulary order.
pub fn missing_skills<S: AsRef<str>>(profile: &Profile, job: &JobPosting, vocabulary: &[S]) -> Vec<String> {
    let description = job.description.to_lowercase();
    let have: Vec<String> = profile.skills.iter().map(|s| s.trim().to_lowercase()).collect();
    let vocabulary: Vec<&str> = vocabulary.iter().map(AsRef::as_ref).collect();
    vocabulary
        .into_iter()
        .filter(|skill| mentions(&description, skill))
        .filter(|skill| !have.contains(&skill.trim().to_lowercase()))
        .map(str::to_string)
        .collect()
}

fn mentions(description_lower: &str, skill: &str) -> bool {
    let needle = skill.trim().to_lowercase();
    !needle.is_empty() && description_lower.contains(&needle)
}
