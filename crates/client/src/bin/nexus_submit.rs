//! nexus-submit: send a team's project archive to the submission portal.
//!
//! Set NEXUS_API_URL for the relay and GEMINI_API_KEY (or API_KEY) for AI metadata.

use anyhow::Context;
use clap::Parser;
use nexus_ai::MetadataAdvisor;
use nexus_client::{init_tracing, validate, Submission, SubmissionClient, DEFAULT_API_URL};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nexus-submit", about = "Submit a hackathon project archive", version)]
struct Cli {
    /// Target organization (Senesense, Webbed or Techknots)
    #[arg(long)]
    company: String,
    /// Team name, prefixed to the stored file name
    #[arg(long)]
    team: String,
    /// ZIP archive to submit
    #[arg(long, required_unless_present = "file_request")]
    file: Option<PathBuf>,
    /// Relay base URL
    #[arg(long, env = "NEXUS_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
    /// Skip AI metadata analysis
    #[arg(long)]
    no_ai: bool,
    /// Ask for the organization's upload page instead of relaying the archive
    #[arg(long)]
    file_request: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let client = SubmissionClient::new(&cli.api_url);

    if cli.file_request {
        let response = client
            .request_upload_url(&cli.company, &cli.team)
            .await
            .context("Could not get upload page")?;
        println!("{}", response.message);
        println!("{}", response.file_request_url);
        return Ok(());
    }

    let file = cli.file.context("--file is required")?;
    let mut submission = Submission::new(&cli.company, &cli.team, &file);
    validate(&submission).context("Submission rejected")?;

    if !cli.no_ai {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok();
        let advisor = MetadataAdvisor::from_api_key(api_key);
        if advisor.is_enabled() {
            eprintln!("Analyzing archive...");
        }
        let analysis = advisor.analyze_file(&file, None).await;
        if let Some(ref result) = analysis {
            eprintln!("Tags: {}", result.joined_tags());
            eprintln!("Summary: {}", result.summary);
            eprintln!("Safety score: {}", result.safety_score);
        }
        submission = submission.with_analysis(analysis);
    }

    // Print each stage as the upload advances
    let mut status = client.subscribe();
    let printer = tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let line = status.borrow_and_update().to_string();
            if !line.is_empty() {
                eprintln!("{}", line);
            }
        }
    });

    let outcome = client.submit(&submission).await;
    drop(client);
    let _ = printer.await;

    let message = outcome.context("Submission failed")?;
    println!("{}", message);
    Ok(())
}
