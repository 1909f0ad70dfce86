//! `canvass` — command-line admin client for the Canvass survey manager.
//!
//! # Usage
//!
//! ```
//! canvass --url http://localhost:5380 --actor-id <uuid> --role lecturer list
//! canvass --config ~/.config/canvass/config.toml activate <survey-id>
//! ```
//!
//! Transition commands fetch the current record first to obtain the
//! concurrency token, check the request against the locally-computed action
//! set, and print the record the server returns.

mod client;

use anyhow::{Context, Result, bail};
use canvass_core::{
  policy::{SurveyAction, SurveyProjection},
  survey::{SurveyKind, SurveyStatus},
};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use serde::Deserialize;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "canvass", about = "Admin client for the Canvass survey manager")]
struct Args {
  /// Path to a TOML config file (url, actor_id, role).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the canvass server (default: http://localhost:5380).
  #[arg(long, env = "CANVASS_URL")]
  url: Option<String>,

  /// Acting identity, as a UUID.
  #[arg(long, env = "CANVASS_ACTOR_ID")]
  actor_id: Option<Uuid>,

  /// Acting role: admin, lecturer, or participant.
  #[arg(long, env = "CANVASS_ROLE")]
  role: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List surveys visible to the acting identity.
  List,
  /// Show one survey with its effective status and available actions.
  Show { id: Uuid },
  /// Create a new (pending) survey.
  Create {
    title: String,
    /// survey | quiz
    #[arg(long, default_value = "survey")]
    kind: String,
    /// What is being evaluated (course, lecture, ...).
    #[arg(long)]
    object: Option<String>,
    #[arg(long)]
    start_at: Option<DateTime<Utc>>,
    #[arg(long)]
    end_at: Option<DateTime<Utc>>,
  },
  /// Activate a pending or paused survey.
  Activate { id: Uuid },
  /// Pause an active survey.
  Pause { id: Uuid },
  /// Close a survey permanently.
  Close { id: Uuid },
  /// Allow or forbid participants to review results after closure.
  AllowReview {
    id: Uuid,
    /// true | false
    allow: bool,
  },
  /// Submit a response as the acting identity.
  Respond {
    id: Uuid,
    /// Answers as a JSON object, e.g. '{"q1": 4}'.
    #[arg(long, default_value = "{}")]
    answers: String,
  },
  /// Fetch the results view of a survey.
  Results { id: Uuid },
  /// Follow invalidation hints and print affected survey ids.
  Watch,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  actor_id: Option<Uuid>,
  #[serde(default)]
  role:     String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:5380".to_string()),
    actor_id: args
      .actor_id
      .or(file_cfg.actor_id)
      .context("an actor id is required (--actor-id or config file)")?,
    role:     args
      .role
      .or_else(|| (!file_cfg.role.is_empty()).then(|| file_cfg.role.clone()))
      .unwrap_or_else(|| "participant".to_string()),
  };

  let client = ApiClient::new(config)?;

  match args.command {
    Command::List => {
      for p in client.list_surveys().await? {
        print_row(&p);
      }
    }
    Command::Show { id } => {
      print_projection(&client.get_survey(id).await?);
    }
    Command::Create { title, kind, object, start_at, end_at } => {
      let kind = parse_kind(&kind)?;
      let p = client
        .create_survey(&title, kind, object.as_deref(), start_at, end_at)
        .await?;
      println!("created {}", p.survey.survey_id);
      print_projection(&p);
    }
    Command::Activate { id } => {
      transition(&client, id, SurveyStatus::Active, SurveyAction::Activate)
        .await?;
    }
    Command::Pause { id } => {
      transition(&client, id, SurveyStatus::Paused, SurveyAction::Pause)
        .await?;
    }
    Command::Close { id } => {
      transition(&client, id, SurveyStatus::Closed, SurveyAction::Close)
        .await?;
    }
    Command::AllowReview { id, allow } => {
      let current = client.get_survey(id).await?;
      let p = client
        .set_review_permission(id, allow, current.survey.updated_at)
        .await?;
      print_projection(&p);
    }
    Command::Respond { id, answers } => {
      let answers: serde_json::Value =
        serde_json::from_str(&answers).context("answers must be JSON")?;
      let r = client.submit_response(id, answers).await?;
      println!("recorded response {} at {}", r.response_id, r.submitted_at);
    }
    Command::Results { id } => {
      let view = client.get_results(id).await?;
      println!(
        "{} — {} response(s) as of {}",
        view.survey.title,
        view.total(),
        view.as_of
      );
      for r in &view.responses {
        println!("  {}  {}  {}", r.submitted_at, r.respondent, r.answers);
      }
    }
    Command::Watch => loop {
      if let Some(hint) = client.watch_invalidations(55).await? {
        println!("changed: {}", hint.survey_id);
      }
    },
  }

  Ok(())
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn parse_kind(s: &str) -> Result<SurveyKind> {
  match s.to_ascii_lowercase().as_str() {
    "survey" => Ok(SurveyKind::Survey),
    "quiz" => Ok(SurveyKind::Quiz),
    other => bail!("unknown survey kind {other:?} (expected survey|quiz)"),
  }
}

/// Fetch, sanity-check the action locally, then request the transition with
/// the fetched token. The server re-validates; the local check just gives a
/// clearer message for actions the UI would not have offered.
async fn transition(
  client: &ApiClient,
  id:     Uuid,
  target: SurveyStatus,
  action: SurveyAction,
) -> Result<()> {
  let current = client.get_survey(id).await?;
  if !current.actions.contains(&action) {
    eprintln!(
      "note: {action:?} is not currently offered for this survey \
       (effective status: {}); trying anyway",
      current.effective_status
    );
  }

  let updated = client
    .change_status(id, target, current.survey.updated_at)
    .await?;
  print_projection(&updated);
  Ok(())
}

fn print_row(p: &SurveyProjection) {
  println!(
    "{}  {:8}  {}",
    p.survey.survey_id, p.effective_status, p.survey.title
  );
}

fn print_projection(p: &SurveyProjection) {
  println!("id:        {}", p.survey.survey_id);
  println!("title:     {}", p.survey.title);
  if let Some(object) = &p.survey.object {
    println!("object:    {object}");
  }
  println!("stored:    {}", p.survey.status);
  println!("effective: {}", p.effective_status);
  if let Some(start) = p.survey.start_at {
    println!("start_at:  {start}");
  }
  if let Some(end) = p.survey.end_at {
    println!("end_at:    {end}");
  }
  println!("review:    {}", p.survey.allow_review);
  println!("updated:   {}", p.survey.updated_at);
  let actions: Vec<String> =
    p.actions.iter().map(|a| format!("{a:?}")).collect();
  println!("actions:   {}", actions.join(", "));
}
