// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::environment::AppConfig;
use crate::filter::JobSearch;
use crate::open_board;
use crate::operation::{Loading, OperationState};
use crate::types::{Credential, JobId, NewCompany, NewJob, Role, Session};
use crate::SavedJobKey;

#[derive(Parser)]
#[command(name = "jobboard")]
#[command(about = "Manage companies, jobs and saved jobs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Access token forwarded to storage
    #[arg(long, global = true, env = "JOBBOARD_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,

    #[arg(long, global = true, env = "JOBBOARD_USER", default_value = "local-admin")]
    pub user: String,

    /// "recruiter" or anything else for a candidate
    #[arg(long, global = true, env = "JOBBOARD_ROLE", default_value = "recruiter")]
    pub role: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the database and tables
    Init,
    /// List all companies
    Companies,
    /// Upload a logo and register a company
    AddCompany { name: String, logo: PathBuf },
    /// List jobs, optionally filtered, one page at a time
    Jobs {
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value = "")]
        company: String,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Show one job with its company and applications
    Job { id: JobId },
    /// Post a new job as the current recruiter
    PostJob {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        company_id: i64,
        #[arg(long)]
        requirements: String,
        #[arg(long)]
        closed: bool,
    },
    /// Import jobs from a CSV file (title,description,location,company_id,requirements[,isOpen])
    ImportJobs { csv_file: PathBuf },
    /// Open or close hiring on a job
    Status {
        id: JobId,
        #[arg(long)]
        closed: bool,
    },
    /// Jobs posted by the current user
    MyJobs,
    /// Delete a job posted by the current user
    DeleteJob { id: JobId },
    /// Save the job if not saved, unsave it otherwise
    Save { job_id: JobId },
    /// Saved jobs of the current user
    Saved,
}

impl Cli {
    pub fn session(&self) -> Session {
        Session::new(
            Credential::new(self.token.clone()),
            self.user.clone(),
            Role::parse(&self.role),
        )
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{}", rendered);
    Ok(())
}

/// Data of a finished run, or why there is none
fn settled_data<T>(what: &str, state: OperationState<T>) -> Result<T> {
    if let Some(e) = state.error {
        anyhow::bail!("Failed to list {}: {}", what, e);
    }
    if state.loading != Loading::Settled {
        anyhow::bail!("Listing {} did not finish ({:?})", what, state.loading);
    }
    state
        .data
        .ok_or_else(|| anyhow::anyhow!("Listing {} returned no data", what))
}

pub async fn handle_command(cli: Cli) -> Result<()> {
    let config = AppConfig::load(&cli.config)?;
    let board = Arc::new(open_board(&config).await?);
    let session = cli.session();

    match cli.command {
        Command::Init => {
            board.database().health_check().await?;
            info!(
                "Database initialized at: {}",
                config.database_path.display()
            );
            println!("Tables ready: companies, jobs, saved_jobs, applications");
        }

        Command::Companies => {
            let companies = board.companies_operation(session);
            companies.run(()).await;
            print_json(&settled_data("companies", companies.snapshot())?)?;
        }

        Command::AddCompany { name, logo } => {
            let bytes = tokio::fs::read(&logo)
                .await
                .with_context(|| format!("Failed to read logo: {}", logo.display()))?;
            let file_name = logo
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();

            let created = board
                .create_company(&session, NewCompany::new(name, file_name, bytes))
                .await?;
            print_json(&created)?;
        }

        Command::Jobs {
            location,
            company,
            search,
            page,
        } => {
            let mut view = JobSearch::new(config.pagination());
            view.set_location(&location);
            view.set_company_raw(&company)?;
            view.submit_search(&search);
            view.set_page(page);

            let jobs = board.jobs_operation(session, view.filter().clone());
            jobs.run(()).await;

            let results = settled_data("jobs", jobs.snapshot())?;
            let visible = view.visible(&results);
            print_json(&visible)?;
            println!(
                "page {} of {} ({} job(s))",
                view.current_page(),
                view.total_pages(results.len()),
                results.len()
            );
        }

        Command::Job { id } => {
            print_json(&board.get_job(&session, id).await?)?;
        }

        Command::PostJob {
            title,
            description,
            location,
            company_id,
            requirements,
            closed,
        } => {
            let mut job = NewJob::new(title, description, location, company_id, requirements);
            job.is_open = !closed;
            print_json(&board.create_job(&session, job).await?)?;
        }

        Command::ImportJobs { csv_file } => {
            if !csv_file.exists() {
                anyhow::bail!("CSV file not found: {}", csv_file.display());
            }

            let content = tokio::fs::read_to_string(&csv_file).await?;
            let mut reader = csv::Reader::from_reader(content.as_bytes());

            let mut success_count = 0;
            let mut error_count = 0;

            for result in reader.deserialize::<NewJob>() {
                let job = match result {
                    Ok(job) => job,
                    Err(e) => {
                        error_count += 1;
                        warn!("CSV parsing error: {}", e);
                        continue;
                    }
                };

                let title = job.title.clone();
                match board.create_job(&session, job).await {
                    Ok(_) => {
                        success_count += 1;
                        info!("Added: {}", title);
                    }
                    Err(e) => {
                        error_count += 1;
                        warn!("Failed to add '{}': {}", title, e);
                    }
                }
            }

            println!("Import completed: {} added, {} failed", success_count, error_count);
        }

        Command::Status { id, closed } => {
            let updated = board.update_hiring_status(&session, id, !closed).await?;
            if updated.is_empty() {
                println!("No job {} owned by {}", id, session.user_id());
            } else {
                print_json(&updated)?;
            }
        }

        Command::MyJobs => {
            print_json(&board.list_my_jobs(&session, session.user_id()).await?)?;
        }

        Command::DeleteJob { id } => {
            let deleted = board.delete_job(&session, id).await?;
            if deleted.is_empty() {
                println!("No job {} owned by {}", id, session.user_id());
            } else {
                print_json(&deleted)?;
            }
        }

        Command::Save { job_id } => {
            let state = board
                .toggle_saved_job(&session, &SavedJobKey::for_session(&session, job_id))
                .await?;
            print_json(&state)?;
        }

        Command::Saved => {
            let saved = board.saved_jobs_operation(session);
            saved.run(()).await;
            print_json(&settled_data("saved jobs", saved.snapshot())?)?;
        }
    }

    Ok(())
}
