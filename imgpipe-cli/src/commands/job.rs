//! Job command handlers
//!
//! Handles submitting, processing, inspecting and downloading jobs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use colored::*;
use imgpipe_client::ImgpipeClient;
use imgpipe_core::domain::job::{Job, JobStatus, SEED_SOURCE_ID};
use imgpipe_core::domain::step::Step;
use imgpipe_core::dto::job::{CompletedJob, CreateJob, PageRequest, SubmittedJob};

use crate::config::Config;
use crate::id_resolver::resolve_job_id;
use crate::types::{IdOrPrefix, parse_step};

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Submit a job
    Submit {
        /// Step to apply, repeatable, run in the order given:
        /// resize=WxH, blur=SIGMA, sharpen or sharpen=SIGMA
        #[arg(long = "op", value_name = "OP", required = true, value_parser = parse_step)]
        ops: Vec<Step>,

        /// Source id. Defaults to the server's seed image, or "upload" with --file
        #[arg(long)]
        source: Option<String>,

        /// Local image to upload and process
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Save the output image to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Process a job whose input has been uploaded, or retry a failed one
    Process {
        /// Job ID or unambiguous prefix
        id: String,

        /// Save the output image to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Get job details
    Get {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// List your jobs
    List {
        #[arg(long, default_value_t = 1)]
        page: i64,

        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Download the output of a finished job
    Fetch {
        /// Job ID or unambiguous prefix
        id: String,

        /// Where to write the PNG
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Handle job commands
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let client = config.authorized_client()?;

    match command {
        JobCommands::Submit {
            ops,
            source,
            file,
            output,
        } => submit_job(&client, ops, source, file, output).await,
        JobCommands::Process { id, output } => process_job(&client, &id, output).await,
        JobCommands::Get { id } => get_job(&client, &id).await,
        JobCommands::List { page, limit } => list_jobs(&client, page, limit).await,
        JobCommands::Fetch { id, output } => fetch_image(&client, &id, &output).await,
    }
}

/// Pick the source id for a submission
fn source_for(source: Option<String>, has_file: bool) -> Result<String> {
    match (source, has_file) {
        (Some(source), true) if source == SEED_SOURCE_ID => {
            bail!("--file cannot be combined with the '{}' source", SEED_SOURCE_ID)
        }
        (Some(source), _) => Ok(source),
        (None, true) => Ok("upload".to_string()),
        (None, false) => Ok(SEED_SOURCE_ID.to_string()),
    }
}

async fn submit_job(
    client: &ImgpipeClient,
    ops: Vec<Step>,
    source: Option<String>,
    file: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let source_id = source_for(source, file.is_some())?;

    // Read before submitting so a bad path leaves no job behind
    let input = match &file {
        Some(path) => Some(
            tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => None,
    };

    let submitted = client
        .submit_job(CreateJob {
            source_id: Some(source_id),
            ops,
        })
        .await
        .context("Failed to submit job")?;

    match submitted {
        SubmittedJob::Completed(job) => {
            println!("{}", format!("✓ Job {} done", job.id).green());
            finish(client, &job, output.as_deref()).await
        }
        SubmittedJob::AwaitingUpload(job) => {
            println!(
                "{}",
                format!("✓ Job {} created, waiting for upload", job.id).green()
            );
            println!("  Input key:  {}", job.input_key.dimmed());
            println!("  Output key: {}", job.output_key.dimmed());

            let Some(bytes) = input else {
                println!("  Upload URL: {}", job.upload.url);
                println!("{}", job.message.dimmed());
                return Ok(());
            };

            client
                .upload(&job.upload.url, bytes)
                .await
                .context("Failed to upload input image")?;
            println!("{}", "✓ Input uploaded".green());

            let completed = client
                .process_job(job.id)
                .await
                .with_context(|| format!("Failed to process job {}", job.id))?;
            println!("{}", format!("✓ Job {} done", completed.id).green());
            finish(client, &completed, output.as_deref()).await
        }
    }
}

async fn process_job(client: &ImgpipeClient, id: &str, output: Option<PathBuf>) -> Result<()> {
    let uuid = resolve_job_id(client, &IdOrPrefix::parse(id)).await?;

    let completed = client
        .process_job(uuid)
        .await
        .with_context(|| format!("Failed to process job {}", uuid))?;

    println!("{}", format!("✓ Job {} done", completed.id).green());
    finish(client, &completed, output.as_deref()).await
}

/// Print the output link and optionally save the image
async fn finish(client: &ImgpipeClient, job: &CompletedJob, output: Option<&Path>) -> Result<()> {
    println!("  Output URL: {}", job.output.url);

    if let Some(path) = output {
        let bytes = client
            .download(&job.output.url)
            .await
            .context("Failed to download output image")?;
        write_output(path, &bytes).await?;
    }

    Ok(())
}

async fn get_job(client: &ImgpipeClient, id: &str) -> Result<()> {
    let uuid = resolve_job_id(client, &IdOrPrefix::parse(id)).await?;
    let job = client.get_job(uuid).await?;

    print_job_details(&job);
    Ok(())
}

async fn list_jobs(client: &ImgpipeClient, page: i64, limit: i64) -> Result<()> {
    let jobs = client.list_jobs(PageRequest::new(page, limit)).await?;

    if jobs.items.is_empty() {
        println!("{}", "No jobs found.".yellow());
    } else {
        println!(
            "{}",
            format!(
                "Page {} ({} of {} job(s)):",
                jobs.page,
                jobs.items.len(),
                jobs.total
            )
            .bold()
        );
        println!();
        for job in &jobs.items {
            print_job_summary(job);
        }
    }

    Ok(())
}

async fn fetch_image(client: &ImgpipeClient, id: &str, output: &Path) -> Result<()> {
    let uuid = resolve_job_id(client, &IdOrPrefix::parse(id)).await?;
    let bytes = client
        .fetch_image(uuid)
        .await
        .with_context(|| format!("Failed to fetch output of job {}", uuid))?;

    write_output(output, &bytes).await
}

async fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!(
        "{}",
        format!("✓ Saved {} bytes to {}", bytes.len(), path.display()).green()
    );
    Ok(())
}

/// Render a step list as the `--op` values that would recreate it
fn describe_ops(ops: &[Step]) -> String {
    ops.iter()
        .map(|step| match step {
            Step::Resize { width, height } => format!("resize={}x{}", width, height),
            Step::Blur { sigma } => format!("blur={}", sigma),
            Step::Sharpen { sigma: Some(sigma) } => format!("sharpen={}", sigma),
            Step::Sharpen { sigma: None } => "sharpen".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Print a job summary
fn print_job_summary(job: &Job) {
    println!("  {} Job {}", "▸".cyan(), job.id.to_string().dimmed());
    println!("    Status:   {}", colorize_status(job.status));
    println!("    Ops:      {}", describe_ops(&job.ops));
    println!(
        "    Created:  {}",
        job.created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

/// Print detailed job information
fn print_job_details(job: &Job) {
    println!("{}", "Job Details:".bold());
    println!("  ID:          {}", job.id.to_string().cyan());
    println!("  Owner:       {}", job.owner_id);
    println!("  Source:      {}", job.source_id);
    println!("  Status:      {}", colorize_status(job.status));
    println!("  Created:     {}", job.created_at.format("%Y-%m-%d %H:%M:%S"));

    if let Some(finished) = job.finished_at {
        println!("  Finished:    {}", finished.format("%Y-%m-%d %H:%M:%S"));
        let seconds = finished.signed_duration_since(job.created_at).num_seconds();
        println!("  Duration:    {}s", seconds);
    }

    println!("  Input key:   {}", job.input_key.dimmed());
    println!("  Output key:  {}", job.output_key.dimmed());

    println!("\n{}", "Ops:".bold());
    for (index, step) in job.ops.iter().enumerate() {
        println!("  {}. {}", index + 1, describe_ops(std::slice::from_ref(step)));
    }

    if let Some(error) = &job.error {
        println!("\n{}", "Error:".bold());
        println!("{}", error.red());
    }
}

/// Colorize job status for display
fn colorize_status(status: JobStatus) -> ColoredString {
    let status_str = status.as_str();
    match status {
        JobStatus::WaitingUpload => status_str.yellow(),
        JobStatus::Processing => status_str.cyan(),
        JobStatus::Done => status_str.green(),
        JobStatus::Failed => status_str.red(),
    }
}
