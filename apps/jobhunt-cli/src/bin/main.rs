use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use jobhunt_core::config::{expand_path, Config, Settings};
use jobhunt_core::types::{JobPosting, RankingRunId};
use jobhunt_embed::get_default_embedder;
use jobhunt_rank::{matching_skills, missing_skills, JobRanker, DEFAULT_SKILL_VOCABULARY};
use jobhunt_store::{load_job, load_job_set, load_profile, RankingHistory, RankingRun};

#[derive(Debug, Parser)]
#[command(name = "jobhunt", about = "Rank job postings against a parsed resume")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank jobs by semantic similarity to a resume.
    Rank {
        #[arg(short, long, default_value = "resume.json")]
        resume: PathBuf,
        /// Job set as .json or .csv
        #[arg(short, long, default_value = "jobs.json")]
        jobs: PathBuf,
        /// Number of top jobs to return (defaults to ranking.top_k)
        #[arg(short = 'k', long = "top")]
        top: Option<usize>,
        #[arg(short, long, default_value = "ranked_jobs.json")]
        output: PathBuf,
        /// History file (defaults to data.history_path)
        #[arg(long)]
        history: Option<PathBuf>,
        /// Use the hashed fake embedder instead of loading a model
        #[arg(long)]
        fake: bool,
    },
    /// Show which resume skills a job asks for, and which it lacks.
    Skills {
        #[arg(short, long, default_value = "resume.json")]
        resume: PathBuf,
        /// A single posting, or one entry of a ranked output file
        #[arg(short, long, default_value = "job.json")]
        job: PathBuf,
        /// Comma-separated skills to check for gaps
        #[arg(long, value_delimiter = ',')]
        vocab: Vec<String>,
    },
    /// Inspect previous ranking runs.
    History {
        #[arg(long)]
        history: Option<PathBuf>,
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Debug, Subcommand)]
enum HistoryAction {
    List,
    Show { id: String },
}

#[derive(Serialize)]
struct RankedOutput<'a> {
    rank: usize,
    score: f32,
    matching_skills: Vec<String>,
    job: &'a JobPosting,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn history_path(arg: Option<PathBuf>, settings: &Settings) -> PathBuf {
    arg.unwrap_or_else(|| expand_path(&settings.data.history_path))
}

fn spinner(msg: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let body = serde_json::to_string_pretty(value)?;
    std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))
}

fn cmd_rank(
    settings: &mut Settings,
    resume: &Path,
    jobs: &Path,
    top: Option<usize>,
    output: &Path,
    history: Option<PathBuf>,
    fake: bool,
) -> Result<()> {
    if fake { settings.embedding.use_fake = true; }
    let profile = load_profile(resume).with_context(|| format!("loading resume {}", resume.display()))?;
    let set_name = jobs.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_else(|| "jobs".to_string());
    let job_set = load_job_set(jobs, &set_name).with_context(|| format!("loading jobs {}", jobs.display()))?;
    let top_k = top.unwrap_or(settings.ranking.top_k);

    let embedder = get_default_embedder(&settings.embedding)?;
    let ranker = JobRanker::new(embedder).with_batch_size(settings.ranking.batch_size);

    let pb = spinner(&format!("Ranking {} jobs", job_set.len()))?;
    let ranked = ranker.rank(&profile, &job_set.jobs, top_k);
    pb.finish_and_clear();
    let ranked = ranked.context("ranking jobs")?;

    let out: Vec<RankedOutput> = ranked
        .iter()
        .enumerate()
        .map(|(i, r)| RankedOutput { rank: i + 1, score: r.score, matching_skills: matching_skills(&profile, r.job), job: r.job })
        .collect();
    write_json(output, &out)?;

    let history_file = history_path(history, settings);
    let mut history = RankingHistory::load(&history_file)?;
    let run_id = history.push(RankingRun::from_results(profile.id, job_set.id, top_k, ranker.embedder().embedder_id(), &ranked));
    history.save(&history_file)?;
    tracing::info!(run = %run_id, runs = history.len(), "recorded ranking run");

    let who = if profile.name.trim().is_empty() { "you" } else { profile.name.as_str() };
    println!("Top {} jobs for {}:", out.len(), who);
    for r in &out {
        println!("{:>3}. {:.2}  {} at {} ({})", r.rank, r.score, r.job.title, r.job.company, r.job.location);
        if !r.matching_skills.is_empty() { println!("       skills: {}", r.matching_skills.join(", ")); }
    }
    println!("Ranked jobs saved to {}", output.display());
    println!("Run {} recorded in {}", run_id, history_file.display());
    Ok(())
}

fn cmd_skills(resume: &Path, job: &Path, vocab: &[String]) -> Result<()> {
    let profile = load_profile(resume).with_context(|| format!("loading resume {}", resume.display()))?;
    let job = load_job(job).with_context(|| format!("loading job {}", job.display()))?;
    let matching = matching_skills(&profile, &job);
    let missing = if vocab.is_empty() { missing_skills(&profile, &job, DEFAULT_SKILL_VOCABULARY) } else { missing_skills(&profile, &job, vocab) };
    println!("{} at {}", job.title, job.company);
    println!("  matching: {}", if matching.is_empty() { "-".to_string() } else { matching.join(", ") });
    println!("  missing:  {}", if missing.is_empty() { "-".to_string() } else { missing.join(", ") });
    Ok(())
}

fn cmd_history(path: &Path, action: HistoryAction) -> Result<()> {
    let history = RankingHistory::load(path)?;
    match action {
        HistoryAction::List => {
            if history.is_empty() { println!("No ranking runs in {}", path.display()); return Ok(()); }
            for run in history.iter() {
                let best = run.results.first().map(|r| format!("{} ({:.2})", r.job.title, r.score)).unwrap_or_else(|| "-".to_string());
                println!("{}  {}  top_k={}  results={}  best={}", run.id, run.created_at.format("%Y-%m-%d %H:%M"), run.top_k, run.results.len(), best);
            }
        }
        HistoryAction::Show { id } => {
            let id: RankingRunId = id.parse()?;
            let run = history.get(id).with_context(|| format!("no ranking run {} in {}", id, path.display()))?;
            println!("Run {} ({}, embedder {})", run.id, run.created_at.to_rfc3339(), run.embedder_id);
            for r in &run.results {
                println!("{:>3}. {:.2}  {} at {}", r.rank, r.score, r.job.title, r.job.company);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load().context("loading configuration")?;
    let mut settings = config.settings()?;
    tracing::debug!(?settings, "settings loaded");
    match cli.command {
        Command::Rank { resume, jobs, top, output, history, fake } => {
            cmd_rank(&mut settings, &resume, &jobs, top, &output, history, fake)
        }
        Command::Skills { resume, job, vocab } => cmd_skills(&resume, &job, &vocab),
        Command::History { history, action } => cmd_history(&history_path(history, &settings), action),
    }
}
