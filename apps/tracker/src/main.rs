mod config;
mod render;

use std::{sync::Arc, time::Instant};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use client_core::{
    details::parse_route_id, ClientError, Dashboard, DashboardIntent, DashboardQuery,
    DashboardState, DetailsState, HttpIssueRepository, IssueDetails, IssueForm, IssueRepository,
    RawQueryParams, UrlQuerySync, ViewMode,
};
use dialoguer::Confirm;
use shared::domain::{IssueId, IssuePriority, IssueStatus};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::config::{load_settings, Settings};

const DASHBOARD_LOCATION: &str = "http://tracker.local/issues/dashboard";

#[derive(Parser, Debug)]
#[command(name = "tracker", about = "Issue tracker dashboard client")]
struct Cli {
    /// Backend root, e.g. http://localhost:3000
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    page_size: Option<usize>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the dashboard in list or kanban view.
    List(ListArgs),
    /// Interactive dashboard session reading commands from stdin.
    Browse(ListArgs),
    Show {
        id: String,
    },
    Create(IssueFields),
    Edit {
        id: String,
        #[command(flatten)]
        fields: IssueFields,
    },
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug, Default)]
struct ListArgs {
    #[arg(long)]
    search: Option<String>,
    /// Repeat to filter by several statuses.
    #[arg(long = "status")]
    statuses: Vec<IssueStatus>,
    #[arg(long)]
    view: Option<String>,
    /// Raw dashboard query string, e.g. "view=kanban&status=Done".
    /// Takes precedence over the individual filter flags.
    #[arg(long, conflicts_with_all = ["search", "statuses", "view"])]
    query: Option<String>,
    /// Pages to pull in list view, as if scrolling to the bottom.
    #[arg(long, default_value_t = 1)]
    pages: usize,
}

impl ListArgs {
    fn location(&self) -> Result<Url> {
        let mut location = Url::parse(DASHBOARD_LOCATION).context("dashboard location")?;
        let query = match &self.query {
            Some(raw) => RawQueryParams::from_query_string(raw).normalize(),
            None => DashboardQuery {
                view: ViewMode::from_param(self.view.as_deref()),
                search: self.search.clone().unwrap_or_default(),
                statuses: self.statuses.clone(),
            },
        };
        location.set_query(Some(&query.to_query_string()));
        Ok(location)
    }
}

#[derive(Args, Debug, Default)]
struct IssueFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    status: Option<IssueStatus>,
    #[arg(long)]
    priority: Option<IssuePriority>,
    #[arg(long)]
    assignee: Option<String>,
}

impl IssueFields {
    fn apply(self, form: &mut IssueForm) {
        let draft = form.draft_mut();
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(status) = self.status {
            draft.status = Some(status);
        }
        if let Some(priority) = self.priority {
            draft.priority = Some(priority);
        }
        if let Some(assignee) = self.assignee {
            draft.assignee = assignee;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }
    if let Some(page_size) = cli.page_size.filter(|size| *size > 0) {
        settings.page_size = page_size;
    }
    info!(api_url = %settings.api_url, page_size = settings.page_size, "tracker starting");

    let repository: Arc<dyn IssueRepository> = Arc::new(
        HttpIssueRepository::new(&settings.api_url).context("invalid api url")?,
    );

    match cli.command {
        Command::List(args) => list(repository, &settings, args).await,
        Command::Browse(args) => browse(repository, &settings, args).await,
        Command::Show { id } => show(repository.as_ref(), &id).await,
        Command::Create(fields) => {
            let mut form = IssueForm::create();
            fields.apply(&mut form);
            save(repository.as_ref(), form).await
        }
        Command::Edit { id, fields } => {
            let mut form = IssueForm::edit(route_id(&id)?);
            form.load_for_edit(repository.as_ref()).await;
            if let Some(error) = form.error() {
                bail!("{error}");
            }
            fields.apply(&mut form);
            save(repository.as_ref(), form).await
        }
        Command::Delete { id, yes } => delete(repository.as_ref(), &id, yes).await,
    }
}

fn route_id(raw: &str) -> Result<IssueId> {
    parse_route_id(Some(raw)).map_err(anyhow::Error::msg)
}

fn print_dashboard(dashboard: &Dashboard<UrlQuerySync>) {
    match dashboard.state().view_mode {
        ViewMode::List => print!("{}", render::list(dashboard.state())),
        ViewMode::Kanban => {
            if let Some(error) = &dashboard.state().error {
                println!("! {error}");
            }
            print!("{}", render::kanban(&dashboard.controller().kanban_columns()));
        }
    }
}

async fn open_dashboard(
    repository: Arc<dyn IssueRepository>,
    settings: &Settings,
    args: &ListArgs,
) -> Result<Dashboard<UrlQuerySync>> {
    let query_sync = UrlQuerySync::new(args.location()?);
    let mut dashboard = Dashboard::new(
        repository,
        query_sync,
        settings.page_size,
        settings.search_debounce(),
    );
    dashboard.activate().await;
    Ok(dashboard)
}

async fn list(repository: Arc<dyn IssueRepository>, settings: &Settings, args: ListArgs) -> Result<()> {
    let mut dashboard = open_dashboard(repository, settings, &args).await?;
    for _ in 1..args.pages {
        if !dashboard.state().has_more_issues {
            break;
        }
        dashboard.handle(DashboardIntent::ScrollNearBottom).await?;
    }
    print_dashboard(&dashboard);
    if let Some(query) = dashboard.query_sync().location().query() {
        println!("?{query}");
    }
    Ok(())
}

async fn show(repository: &dyn IssueRepository, id: &str) -> Result<()> {
    let mut details = IssueDetails::default();
    details.load(repository, Some(id)).await;
    match details.state() {
        DetailsState::Loaded(issue) => {
            print!("{}", render::detail(issue));
            Ok(())
        }
        DetailsState::Failed(message) => bail!("{message}"),
        DetailsState::Loading => bail!("issue {id} did not load"),
    }
}

async fn save(repository: &dyn IssueRepository, mut form: IssueForm) -> Result<()> {
    match form.submit(repository, Utc::now()).await {
        Ok(next) => {
            println!("saved, continue at {}", next.path());
            Ok(())
        }
        Err(ClientError::Validation(errors)) => {
            eprint!("{}", render::form_errors(&form));
            bail!("issue not saved: {errors}")
        }
        Err(err) => {
            let message = form.error().unwrap_or("request failed").to_string();
            Err(err).context(message)
        }
    }
}

async fn delete(repository: &dyn IssueRepository, id: &str, yes: bool) -> Result<()> {
    let mut form = IssueForm::edit(route_id(id)?);
    form.load_for_edit(repository).await;
    if let Some(error) = form.error() {
        bail!("{error}");
    }
    let Some(prompt) = form.request_delete() else {
        bail!("not an existing issue: {id}");
    };
    if !yes {
        if !confirm(prompt) {
            form.cancel_delete();
            println!("Deletion cancelled.");
            return Ok(());
        }
    }
    match form.confirm_delete(repository).await {
        Ok(Some(next)) => {
            println!("deleted, continue at {}", next.path());
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(err) => {
            let message = form.error().unwrap_or("request failed").to_string();
            Err(err).context(message)
        }
    }
}

enum BrowseCommand {
    Search(String),
    Status(Vec<IssueStatus>),
    Clear,
    View(ViewMode),
    More,
    Delete(IssueId),
    Show,
    Quit,
}

fn parse_browse_command(line: &str) -> Result<BrowseCommand> {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let command = match word {
        "search" | "s" => BrowseCommand::Search(rest.to_string()),
        "status" => BrowseCommand::Status(
            rest.split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::parse::<IssueStatus>)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        "clear" => BrowseCommand::Clear,
        "view" => BrowseCommand::View(ViewMode::from_param(Some(rest))),
        "more" | "m" => BrowseCommand::More,
        "delete" | "rm" => BrowseCommand::Delete(IssueId(
            rest.parse().with_context(|| format!("not an issue id: {rest:?}"))?,
        )),
        "" | "show" => BrowseCommand::Show,
        "quit" | "q" | "exit" => BrowseCommand::Quit,
        other => bail!("unknown command: {other}"),
    };
    Ok(command)
}

fn confirm(prompt: impl Into<String>) -> bool {
    answer_or_decline(Confirm::new().with_prompt(prompt).default(false).interact())
}

/// A prompt that could not be shown (no terminal, IO error) counts as "no".
fn answer_or_decline(answer: dialoguer::Result<bool>) -> bool {
    answer.unwrap_or_else(|error| {
        warn!(%error, "confirmation prompt failed, treating as declined");
        false
    })
}

/// Logs every snapshot until the dashboard goes away. Returns how many were seen.
async fn log_snapshots(mut snapshots: broadcast::Receiver<DashboardState>) -> usize {
    let mut seen = 0;
    loop {
        match snapshots.recv().await {
            Ok(state) => {
                seen += 1;
                debug!(
                    issues = state.issues.len(),
                    loading = state.loading,
                    loading_more = state.loading_more,
                    "dashboard updated"
                );
            }
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "snapshot logger fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
    seen
}

async fn browse(repository: Arc<dyn IssueRepository>, settings: &Settings, args: ListArgs) -> Result<()> {
    let mut dashboard = open_dashboard(repository, settings, &args).await?;
    tokio::spawn(log_snapshots(dashboard.subscribe()));

    print_dashboard(&dashboard);
    println!("commands: search <text>, status <a,b>, clear, view list|kanban, more, delete <id>, quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_browse_command(&line) {
            Ok(command) => command,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };
        let outcome = match command {
            BrowseCommand::Search(term) => {
                dashboard.type_search(term, Instant::now());
                while let Some(deadline) = dashboard.search_deadline() {
                    tokio::time::sleep_until(deadline.into()).await;
                    dashboard.tick(Instant::now()).await;
                }
                Ok(())
            }
            BrowseCommand::Status(statuses) => {
                dashboard.handle(DashboardIntent::FilterByStatus(statuses)).await
            }
            BrowseCommand::Clear => dashboard.handle(DashboardIntent::ClearFilters).await,
            BrowseCommand::View(mode) => dashboard.handle(DashboardIntent::SwitchView(mode)).await,
            BrowseCommand::More => dashboard.handle(DashboardIntent::ScrollNearBottom).await,
            BrowseCommand::Delete(id) => dashboard
                .delete_issue_with(id, |issue| {
                    confirm(format!("Are you sure you want to delete \"{}\"?", issue.title))
                })
                .await
                .map(|_| ()),
            BrowseCommand::Show => Ok(()),
            BrowseCommand::Quit => break,
        };
        if let Err(err) = outcome {
            debug!(error = %err, "dashboard command failed");
        }
        print_dashboard(&dashboard);
        if let Some(query) = dashboard.query_sync().location().query() {
            println!("?{query}");
        }
    }
    Ok(())
}
