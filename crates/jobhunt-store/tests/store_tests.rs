use chrono::{NaiveDate, Utc};
use std::fs;
use tempfile::TempDir;

use jobhunt_core::error::Error;
use jobhunt_core::types::{JobPosting, JobSet, JobSetId, ProfileId, RankedResult};
use jobhunt_store::{load_job, load_job_set, load_profile, save_job_set, RankingHistory, RankingRun};

const JOBS_JSON: &str = r#"[
  {"title": "Backend Engineer", "company": "Acme", "location": "Remote",
   "description": "Rust and PostgreSQL", "url": "https://example.com/1", "salary": "$150k"},
  {"title": "No Url", "company": "Acme", "location": "Remote", "description": "missing url"},
  {"title": "Empty Url", "company": "Acme", "location": "Remote", "description": "url left blank", "url": ""},
  {"title": "Data Scientist", "company": "Beta", "location": "Berlin",
   "description": "Python and SQL", "url": "https://example.com/2", "source": "linkedin"}
]"#;

#[test]
fn json_job_set_skips_incomplete_rows() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("jobs.json");
    fs::write(&path, JOBS_JSON).unwrap();

    let set = load_job_set(&path, "batch-1").expect("load");
    assert_eq!(set.name, "batch-1");
    assert_eq!(set.len(), 3);
    assert_eq!(set.jobs[0].source, "json");
    assert_eq!(set.jobs[0].salary.as_deref(), Some("$150k"));
    assert_eq!(set.jobs[1].title, "Empty Url");
    assert_eq!(set.jobs[1].url, "");
    assert_eq!(set.jobs[2].source, "linkedin");
}

#[test]
fn csv_job_set_keeps_rows_with_empty_cells() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("jobs.csv");
    fs::write(
        &path,
        "title,company,location,description,url,job_type\n\
         Platform Engineer,Gamma,Remote,\"Kubernetes, Terraform\",https://example.com/3,Full-time\n\
         Broken,Gamma,Remote,,https://example.com/4,\n",
    )
    .unwrap();

    let set = load_job_set(&path, "csv-set").expect("load");
    assert_eq!(set.len(), 2);
    let job = &set.jobs[0];
    assert_eq!(job.description, "Kubernetes, Terraform");
    assert_eq!(job.job_type.as_deref(), Some("Full-time"));
    assert_eq!(job.source, "csv");
    let blank = &set.jobs[1];
    assert_eq!(blank.title, "Broken");
    assert_eq!(blank.description, "");
    assert!(blank.job_type.is_none());
}

#[test]
fn csv_row_with_empty_url_is_loaded() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("jobs.csv");
    fs::write(&path, "title,company,location,description,url
Engineer,Acme,Remote,Rust work,
").unwrap();
    let set = load_job_set(&path, "x").expect("load");
    assert_eq!(set.len(), 1);
    assert_eq!(set.jobs[0].url, "");
}

#[test]
fn csv_without_a_required_column_skips_every_row() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("jobs.csv");
    fs::write(&path, "title,company,location,description
Engineer,Acme,Remote,Rust work
").unwrap();
    assert!(load_job_set(&path, "x").expect("load").is_empty());
}

#[test]
fn missing_date_posted_defaults_to_today() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("jobs.json");
    fs::write(&path, r#"[{"title": "T", "company": "C", "location": "L", "description": "D", "url": "u"},
                        {"title": "T2", "company": "C", "location": "L", "description": "D", "url": "u", "date_posted": "2024-03-01"}]"#).unwrap();
    let before = Utc::now().date_naive();
    let set = load_job_set(&path, "x").expect("load");
    let after = Utc::now().date_naive();

    let date = set.jobs[0].date_posted.as_deref().expect("defaulted date");
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("iso date");
    assert!(parsed == before || parsed == after);
    assert_eq!(set.jobs[1].date_posted.as_deref(), Some("2024-03-01"));
}

#[test]
fn saved_job_set_round_trips_with_identity() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested/set.json");
    let set = JobSet::new("saved", vec![JobPosting::new("T", "C", "L", "D")]);
    save_job_set(&set, &path).expect("save");

    let loaded = load_job_set(&path, "ignored").expect("load");
    assert_eq!(loaded.id, set.id);
    assert_eq!(loaded.name, "saved");
    assert_eq!(loaded.jobs, set.jobs);
}

#[test]
fn job_set_saved_as_csv_reloads_its_postings() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("out/jobs.csv");
    let mut with_extras = JobPosting::new("Backend", "Acme", "Remote", "Rust, SQL");
    with_extras.url = "https://example.com/1".into();
    with_extras.source = "indeed".into();
    with_extras.date_posted = Some("2024-01-02".into());
    with_extras.salary = Some("$120k".into());
    let mut bare = JobPosting::new("Analyst", "Beta", "Berlin", "Excel");
    bare.source = "csv".into();
    bare.date_posted = Some("2024-01-03".into());
    let set = JobSet::new("saved", vec![with_extras, bare]);
    save_job_set(&set, &path).expect("save");

    let loaded = load_job_set(&path, "reloaded").expect("load");
    assert_eq!(loaded.name, "reloaded");
    assert_ne!(loaded.id, set.id, "csv keeps postings, not set identity");
    assert_eq!(loaded.jobs, set.jobs);
}

#[test]
fn unsupported_extension_and_missing_file_are_reported() {
    let tmp = TempDir::new().unwrap();
    let txt = tmp.path().join("jobs.txt");
    fs::write(&txt, "x").unwrap();
    assert!(matches!(load_job_set(&txt, "x"), Err(Error::InvalidArgument(_))));
    assert!(matches!(load_job_set(&tmp.path().join("nope.json"), "x"), Err(Error::NotFound(_))));
    assert!(matches!(load_profile(&tmp.path().join("nope.json")), Err(Error::NotFound(_))));
}

#[test]
fn profile_loads_with_fresh_id_and_deduplicated_skills() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("resume.json");
    fs::write(&path, r#"{"name": "Jane", "skills": ["Rust", "rust", "Go"], "summary": "Systems dev"}"#).unwrap();
    let a = load_profile(&path).expect("a");
    let b = load_profile(&path).expect("b");
    assert_eq!(a.skills, vec!["Rust".to_string(), "Go".to_string()]);
    assert_ne!(a.id, b.id, "profiles without an id get a fresh one per load");
}

#[test]
fn load_job_accepts_bare_and_ranked_entries() {
    let tmp = TempDir::new().unwrap();
    let bare = tmp.path().join("job.json");
    fs::write(&bare, r#"{"title": "T", "company": "C", "location": "L", "description": "D"}"#).unwrap();
    assert_eq!(load_job(&bare).expect("bare").title, "T");

    let ranked = tmp.path().join("ranked.json");
    fs::write(&ranked, r#"{"rank": 1, "score": 0.9, "job": {"title": "R", "company": "C", "location": "L", "description": "D"}}"#).unwrap();
    assert_eq!(load_job(&ranked).expect("ranked").title, "R");
}

#[test]
fn history_appends_and_persists() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("data/history.json");

    let mut history = RankingHistory::load(&path)?;
    assert!(history.is_empty(), "missing file is an empty history");

    let jobs = vec![JobPosting::new("A", "C", "L", "D"), JobPosting::new("B", "C", "L", "D")];
    let results = vec![
        RankedResult { position: 1, job: &jobs[1], score: 0.8 },
        RankedResult { position: 0, job: &jobs[0], score: 0.3 },
    ];
    let profile_id = ProfileId::new();
    let set_id = JobSetId::new();
    let first = history.push(RankingRun::from_results(profile_id, set_id, 2, "fixture", &results));
    let second = history.push(RankingRun::from_results(profile_id, set_id, 1, "fixture", &results[..1]));
    history.save(&path)?;

    let reloaded = RankingHistory::load(&path)?;
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.latest().map(|r| r.id), Some(second));
    let run = reloaded.get(first).expect("first run");
    assert_eq!(run.results.len(), 2);
    assert_eq!(run.results[0].rank, 1);
    assert_eq!(run.results[0].position, 1);
    assert_eq!(run.results[0].job.title, "B");
    assert_eq!(run.embedder_id, "fixture");
    let ids: Vec<_> = reloaded.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![first, second]);
    Ok(())
}

#[test]
fn corrupt_history_is_a_parse_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("history.json");
    fs::write(&path, "{not json").unwrap();
    assert!(matches!(RankingHistory::load(&path), Err(Error::Parse(_))));
}
