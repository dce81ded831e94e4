mod comment;
mod config;
mod pr;
mod summary;

use clap::Parser;
use colored::Colorize;
use tracing::{info, info_span};
use tracing_subscriber::EnvFilter;

use summary::{Summarizer, SummaryOutcome};

/// pr-digest — fetches a GitHub Pull Request, asks an LLM for a structured
/// review summary, and posts (or updates) the digest as a bot comment.
#[derive(Parser, Debug)]
#[command(name = "pr-digest", version, about)]
struct Cli {
    /// GitHub Pull Request URL (e.g., https://github.com/org/repo/pull/42)
    pr_url: String,

    /// Print the digest to the terminal instead of commenting on the PR
    #[arg(long)]
    skip_comment: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let _main_span = info_span!("pr_digest", pr_url = %cli.pr_url).entered();

    info!("parsing PR URL");
    let pr_url = pr::parse_pr_url(&cli.pr_url)?;

    info!("loading configuration");
    let config = config::Config::load()?;
    config.validate(!cli.skip_comment)?;

    // validate() guarantees the credentials below.
    let github = pr::GithubClient::new(config.github_token().unwrap_or_default());
    let summarizer = summary::OpenAiSummarizer::new(
        config.openai_api_key().unwrap_or_default(),
        config.openai_model(),
    );

    info!("fetching pull request from GitHub");
    let pull_request = pr::fetch_pull_request(&github, &pr_url).await?;
    info!(
        files = pull_request.change_files.len(),
        fork = !pull_request
            .source_repository
            .is_same_entity(&pull_request.base_repository),
        "assembled pull request"
    );

    info!("requesting summary from completion service");
    let outcome = summarizer.summarize(&pull_request).await?;

    let body = comment::render_comment_body(&outcome, &pull_request.change_files);

    if cli.skip_comment {
        print_terminal_digest(&pull_request, &outcome, &body);
    } else {
        let bot_login = config.bot_login().unwrap_or_default();
        comment::upsert_bot_comment(
            &github,
            &pull_request.base_repository.full_name,
            pull_request.number,
            &bot_login,
            &body,
        )
        .await?;
        info!("comment upserted");
    }

    Ok(())
}

/// Print the digest to the terminal when comment posting is skipped.
fn print_terminal_digest(
    pull_request: &pr::PullRequest,
    outcome: &SummaryOutcome,
    body: &str,
) {
    println!();
    println!(
        "{} #{}: \"{}\"",
        "PR".bold(),
        pull_request.number,
        pull_request.title
    );
    match outcome {
        SummaryOutcome::Parsed(_) => {
            println!("{}", "structured summary".green());
        }
        SummaryOutcome::Raw(_) => {
            println!("{}", "raw summary (structured parse failed)".yellow());
        }
    }
    println!();
    println!("{}", body);
}
