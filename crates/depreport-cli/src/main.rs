mod logging;
mod output;
mod render;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use depreport_core::{
    get_dependabot_data, get_github_token, Affiliation, AggregateOptions, AlertSource, RunContext,
};
use depreport_github::{GithubClient, DEFAULT_API_URL};

const AFFILIATION_REQUIRED: &str = "at least one of --include-repo-owner, \
    --include-repo-collaborator or --include-repo-org-member must be given";

#[derive(Parser, Debug)]
#[command(
    name = "dependabot-report",
    version,
    about = "Fetch open Dependabot alerts of your GitHub repositories and render an HTML report"
)]
struct Cli {
    /// Where to get the GitHub token from: `file:<path>` or `env:<name>`
    #[arg(long)]
    github_token_provider: String,
    /// Write the report into this file
    #[arg(long)]
    output_file: PathBuf,
    /// Exclude repositories owned by this owner (repeatable)
    #[arg(long = "exclude-github-owner")]
    exclude_github_owner: Vec<String>,
    /// Exclude forks; they don't receive security alerts
    #[arg(long)]
    exclude_forks: bool,
    /// Include repositories owned by the authenticated user
    #[arg(long)]
    include_repo_owner: bool,
    /// Include repositories the user has been added to as a collaborator
    #[arg(long)]
    include_repo_collaborator: bool,
    /// Include repositories the user can access through organization membership
    #[arg(long)]
    include_repo_org_member: bool,
    /// HTML template to render; the built-in one is used when omitted
    #[arg(long)]
    template_fname: Option<PathBuf>,
    /// Base URL of the GitHub REST API
    #[arg(long, default_value = DEFAULT_API_URL)]
    github_api_url: String,
    /// Write the collected data as JSON instead of HTML
    #[arg(long)]
    json: bool,
    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn affiliation(&self) -> Option<Affiliation> {
        Affiliation::new(
            self.include_repo_owner,
            self.include_repo_collaborator,
            self.include_repo_org_member,
        )
    }
}

fn main() -> anyhow::Result<()> {
    let timer_start = Instant::now();
    let cli = Cli::parse();
    let Some(affiliation) = cli.affiliation() else {
        Cli::command()
            .error(ErrorKind::MissingRequiredArgument, AFFILIATION_REQUIRED)
            .exit();
    };
    logging::init(cli.verbose);

    let token = match get_github_token(&cli.github_token_provider) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };

    let client = GithubClient::builder(token)
        .api_url(&cli.github_api_url)
        .build();
    let options = AggregateOptions {
        affiliation,
        exclude_owners: cli.exclude_github_owner.clone(),
        exclude_forks: cli.exclude_forks,
    };
    let context = run(&cli, &client, &options, timer_start)?;

    tracing::info!(
        "Report with {} repositories written to '{}' in {}s.",
        context.repo_count(),
        cli.output_file.display(),
        context.timing_sec
    );
    Ok(())
}

/// Collect, render and write one report.
///
/// The template and the output location are checked before `source` sees its
/// first request.
fn run<S: AlertSource + ?Sized>(
    cli: &Cli,
    source: &S,
    options: &AggregateOptions,
    started: Instant,
) -> anyhow::Result<RunContext> {
    let template = if cli.json {
        None
    } else {
        Some(render::Template::load(cli.template_fname.as_deref())?)
    };
    let report = output::ReportFile::create(&cli.output_file)?;

    let mut context =
        get_dependabot_data(source, options).context("failed to collect Dependabot alerts")?;
    context.finish(started);

    let rendered = match &template {
        Some(template) => render::render(template, &context)?,
        None => serde_json::to_string_pretty(&context)?,
    };
    tracing::debug!("Writing report to '{}'.", report.path().display());
    report.commit(rendered.as_bytes())?;
    Ok(context)
}
