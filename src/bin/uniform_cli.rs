use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uniform_issue::{
    config,
    mirror::{BULK_DCS, DCS},
    models::{DcHeader, IssueRecord, UniformSelection},
    services::{IssueDeduction, SubmissionOutcome},
    AppServices,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let services = initialize()?;

    match cli.command {
        Commands::Catalog(command) => handle_catalog_command(&services, command, cli.json).await?,
        Commands::Issues(command) => handle_issues_command(&services, command, cli.json).await?,
        Commands::Mirror(command) => handle_mirror_command(&services, command, cli.json).await?,
        Commands::Dc(command) => handle_dc_command(&services, command, cli.json).await?,
    }

    Ok(())
}

fn initialize() -> Result<AppServices> {
    let config = config::load_config().context("failed to load application config")?;
    config::init_tracing(&config.log_level, config.log_json);
    debug!(target: "uniform_cli", environment = %config.environment, "configuration loaded");

    AppServices::from_config(config).context("failed to set up upstream client")
}

#[derive(Parser)]
#[command(
    name = "uniform-cli",
    about = "Bulk uniform issue and delivery-challan tooling",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    Catalog(CatalogCommands),
    #[command(subcommand)]
    Issues(IssuesCommands),
    #[command(subcommand)]
    Mirror(MirrorCommands),
    #[command(subcommand)]
    Dc(DcCommands),
}

#[derive(Subcommand)]
enum CatalogCommands {
    /// Projects that can appear on a DC
    Projects,
    /// Designations with headcount at a project
    Designations(ProjectArgs),
    /// Uniforms the given designations are entitled to at a project
    Uniforms(UniformsArgs),
}

#[derive(Args)]
struct ProjectArgs {
    #[arg(long, help = "Project name as listed by `catalog projects`")]
    project: String,
}

#[derive(Args)]
struct UniformsArgs {
    #[arg(long, help = "Project name as listed by `catalog projects`")]
    project: String,
    #[arg(
        long = "designation",
        required = true,
        help = "Designation to include; repeat for several"
    )]
    designations: Vec<String>,
}

#[derive(Subcommand)]
enum IssuesCommands {
    /// Existing stock-deduction issues
    List(IssuesListArgs),
}

#[derive(Args)]
struct IssuesListArgs {
    #[arg(long, default_value_t = 1, help = "1-based page number")]
    page: usize,
}

#[derive(Subcommand)]
enum MirrorCommands {
    /// Records held in a local mirror list
    Show(MirrorListArgs),
    /// Merge submitted DCs into the canonical list
    Export(MirrorExportArgs),
    /// Empty a local mirror list
    Clear(MirrorListArgs),
}

#[derive(Args)]
struct MirrorListArgs {
    #[arg(long, help = "One of bulk_issues, bulk_dcs, dcs")]
    list: String,
}

#[derive(Args)]
struct MirrorExportArgs {
    #[arg(long, default_value = BULK_DCS, help = "List to drain")]
    from: String,
    #[arg(long, default_value = DCS, help = "Canonical list to merge into")]
    to: String,
}

#[derive(Subcommand)]
enum DcCommands {
    /// Run a full DC session from a JSON plan file
    Submit(DcSubmitArgs),
}

#[derive(Args)]
struct DcSubmitArgs {
    #[arg(long, help = "Path to the JSON plan describing the DC")]
    plan: PathBuf,
}

/// Everything an operator would enter across the wizard steps.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DcPlan {
    project: String,
    #[serde(default)]
    designations: Vec<String>,
    #[serde(default)]
    requests: Vec<String>,
    #[serde(default)]
    sizes: Vec<SizeOverride>,
    #[serde(default)]
    bulk: Vec<UniformSelection>,
    header: DcHeader,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SizeOverride {
    request: String,
    uniform_type: String,
    size: String,
}

#[derive(Serialize)]
struct UniformRow<'a> {
    id: &'a str,
    name: &'a str,
    code: &'a str,
    sizes_in_stock: Vec<&'a str>,
}

async fn handle_catalog_command(
    services: &AppServices,
    command: CatalogCommands,
    json: bool,
) -> Result<()> {
    let catalog = services.catalog.load().await;
    if catalog.is_degraded() && !json {
        let sources: Vec<String> = catalog.degraded.iter().map(ToString::to_string).collect();
        eprintln!("warning: partial data, failed to load {}", sources.join(", "));
    }

    match command {
        CatalogCommands::Projects => {
            let names: Vec<&str> = catalog
                .selectable_projects()
                .into_iter()
                .map(|p| p.name.as_str())
                .collect();
            if json {
                print_json(&names)?;
            } else if names.is_empty() {
                println!("No projects available.");
            } else {
                for name in names {
                    println!("- {}", name);
                }
            }
        }
        CatalogCommands::Designations(args) => {
            let designations = catalog.available_designations(&args.project);
            if json {
                print_json(&designations)?;
            } else if designations.is_empty() {
                println!("No designations found for {}.", args.project);
            } else {
                for designation in designations {
                    println!("- {}", designation);
                }
            }
        }
        CatalogCommands::Uniforms(args) => {
            let designations: BTreeSet<String> = args.designations.into_iter().collect();
            let rows: Vec<UniformRow<'_>> = catalog
                .available_uniforms(&args.project, &designations)
                .into_iter()
                .map(|item| UniformRow {
                    id: &item.id,
                    name: &item.name,
                    code: &item.code,
                    sizes_in_stock: item.sizes_in_stock(),
                })
                .collect();
            if json {
                print_json(&rows)?;
            } else if rows.is_empty() {
                println!("No uniforms mapped for that selection.");
            } else {
                for row in rows {
                    println!(
                        "- {} ({}) • in stock: {}",
                        row.name,
                        row.code,
                        if row.sizes_in_stock.is_empty() {
                            "none".to_string()
                        } else {
                            row.sizes_in_stock.join(", ")
                        }
                    );
                }
            }
        }
    }

    Ok(())
}

async fn handle_issues_command(
    services: &AppServices,
    command: IssuesCommands,
    json: bool,
) -> Result<()> {
    match command {
        IssuesCommands::List(args) => {
            let page = services
                .issues
                .page(args.page)
                .await
                .context("failed to load issues")?;
            if json {
                print_json(&page)?;
            } else {
                println!(
                    "Page {} of {} ({} issues)",
                    page.page, page.total_pages, page.total_items
                );
                for issue in &page.items {
                    render_issue(issue);
                }
            }
        }
    }
    Ok(())
}

async fn handle_mirror_command(
    services: &AppServices,
    command: MirrorCommands,
    json: bool,
) -> Result<()> {
    match command {
        MirrorCommands::Show(args) => {
            let rows: Vec<Value> = services
                .mirror
                .list(&args.list)
                .await
                .with_context(|| format!("failed to read mirror list {}", args.list))?;
            if json {
                print_json(&rows)?;
            } else {
                println!("{}: {} record(s)", args.list, rows.len());
                for row in &rows {
                    let number = row.get("dcNumber").and_then(Value::as_str).unwrap_or("-");
                    println!("- {}", number);
                }
            }
        }
        MirrorCommands::Export(args) => {
            let merged = services
                .mirror
                .export_to(&args.from, &args.to)
                .await
                .with_context(|| format!("failed to export {} into {}", args.from, args.to))?;
            if json {
                print_json(&serde_json::json!({ "merged": merged }))?;
            } else {
                println!("Merged {} record(s) from {} into {}.", merged, args.from, args.to);
            }
        }
        MirrorCommands::Clear(args) => {
            services
                .mirror
                .clear(&args.list)
                .await
                .with_context(|| format!("failed to clear mirror list {}", args.list))?;
            if !json {
                println!("Cleared {}.", args.list);
            }
        }
    }
    Ok(())
}

async fn handle_dc_command(services: &AppServices, command: DcCommands, json: bool) -> Result<()> {
    match command {
        DcCommands::Submit(args) => {
            let plan = read_plan(&args.plan)?;
            let outcome = run_plan(services, plan).await?;
            if json {
                print_json(&outcome)?;
            } else {
                render_outcome(&outcome);
            }
            if let Some(warning) = outcome.warning() {
                eprintln!("warning: {}", warning);
            }
        }
    }
    Ok(())
}

fn read_plan(path: &Path) -> Result<DcPlan> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("failed to read plan {}", path.display()))?;
    serde_json::from_str(&body).with_context(|| format!("invalid plan {}", path.display()))
}

async fn run_plan(services: &AppServices, plan: DcPlan) -> Result<SubmissionOutcome> {
    let mut wizard = services.start_wizard().await;

    wizard.select_project(&plan.project)?;
    wizard.set_designations(plan.designations)?;
    wizard.confirm_project().await?;
    if wizard.candidates_degraded() {
        eprintln!("warning: uniform requests could not be loaded; only bulk entries are available");
    }

    for request_id in &plan.requests {
        wizard.select_request(request_id)?;
    }
    if !plan.bulk.is_empty() {
        let added = wizard.add_bulk_entries(&plan.bulk)?;
        debug!(target: "uniform_cli", added, "bulk entries queued");
    }
    wizard.proceed_to_details()?;

    for size in &plan.sizes {
        wizard.select_size(&size.request, &size.uniform_type, &size.size)?;
    }
    wizard.set_header(plan.header)?;

    let missing = wizard.missing_sizes();
    if !missing.is_empty() {
        for entry in &missing {
            eprintln!("- {}", entry);
        }
        bail!("{} size(s) still need attention", missing.len());
    }

    match wizard.submit().await {
        Ok(outcome) => Ok(outcome),
        Err(e) => bail!("DC submission failed: {}", e.user_message()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_issue(issue: &IssueRecord) {
    println!(
        "- Issue {} • to {} • {} • {} item(s) • {}",
        issue.id,
        issue.issue_to,
        issue.issue_date.as_deref().unwrap_or("-"),
        issue.items.len(),
        issue.status.as_deref().unwrap_or("-")
    );
}

fn render_outcome(outcome: &SubmissionOutcome) {
    let dc = &outcome.dc;
    println!(
        "DC {} created for {} on {} ({} line(s))",
        dc.dc_number,
        dc.customer,
        dc.dc_date,
        dc.items.len()
    );
    for line in &dc.items {
        println!(
            "- {} {} x{} • {} ({})",
            line.item_name, line.size, line.quantity, line.employee_name, line.employee_id
        );
    }
    match &outcome.issue {
        IssueDeduction::Created { id, lines } => println!(
            "Stock deducted for {} line(s){}",
            lines,
            id.as_deref()
                .map(|id| format!(", issue {}", id))
                .unwrap_or_default()
        ),
        IssueDeduction::Skipped => println!("No line had stock on hand; no issue posted."),
        IssueDeduction::Failed { .. } => println!("Stock deduction FAILED; see warning."),
    }
}
