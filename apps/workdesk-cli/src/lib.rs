#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value, json};
use workdesk_shell_core::filter::FieldKind;
use workdesk_shell_core::{
    CommittedFilters, FileLayoutStore, FilterPatch, Location, MemoryLayoutStore, ShellConfig,
    ShellState, SidebarLayout, WorkspaceRegistry,
};

/// Viewport assumed for URL previews; only affects presentation, not filters.
const PREVIEW_VIEWPORT_WIDTH: f64 = 1280.0;

#[derive(Parser)]
#[command(name = "workdesk")]
#[command(about = "Inspect Workdesk routing, filter URLs and sidebar layout")]
pub struct WorkdeskCli {
    /// Layout store file; defaults to the per-user data directory.
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
    /// Print JSON instead of aligned text.
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a URL to its workspace, active sidebar item and filter panel
    Resolve { href: String },
    /// Preview what the filter panel would write into a URL
    #[command(subcommand)]
    Filters(FiltersCommand),
    /// Inspect or edit persisted sidebar preferences
    #[command(subcommand)]
    Layout(LayoutCommand),
}

#[derive(Subcommand)]
pub enum FiltersCommand {
    /// Apply draft edits to the URL's committed filters
    Commit(CommitArgs),
    /// Reset the URL's filter panel to its cleared state
    Clear { href: String },
    /// Count the non-default committed filters in the URL
    Count { href: String },
}

#[derive(Args)]
pub struct CommitArgs {
    href: String,
    /// Set a field; repeat the key to set several values of a list field.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    set: Vec<(String, String)>,
    /// Toggle one value of a field.
    #[arg(long = "toggle", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    toggle: Vec<(String, String)>,
    /// Reset a field to its default.
    #[arg(long = "reset", value_name = "KEY")]
    reset: Vec<String>,
}

#[derive(Subcommand)]
pub enum LayoutCommand {
    /// Show width, last workspace and per-workspace sidebar visibility
    Show,
    /// Flip one workspace's persisted sidebar visibility
    Toggle { workspace: String },
    /// Persist a sidebar width, clamped to the configured bounds
    Width { px: u32 },
    /// Remove every persisted layout preference
    Reset,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{raw}`"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

pub fn run(cli: WorkdeskCli, config: &ShellConfig, out: &mut impl Write) -> Result<()> {
    let json = cli.json;
    match cli.command {
        Commands::Resolve { href } => run_resolve(&href, config, json, out),
        Commands::Filters(FiltersCommand::Commit(args)) => run_filters_commit(args, config, json, out),
        Commands::Filters(FiltersCommand::Clear { href }) => {
            run_filters_clear(&href, config, json, out)
        }
        Commands::Filters(FiltersCommand::Count { href }) => {
            run_filters_count(&href, config, json, out)
        }
        Commands::Layout(command) => {
            let store = match cli.store {
                Some(path) => FileLayoutStore::load(path),
                None => FileLayoutStore::load_default(),
            };
            tracing::debug!(path = %store.path().display(), "layout store opened");
            let mut layout = SidebarLayout::load(store, config);
            run_layout(command, &mut layout, json, out)
        }
    }
}

/// Previews never touch the user's layout store.
fn preview_shell(href: &str, config: &ShellConfig) -> ShellState<MemoryLayoutStore> {
    ShellState::mount(
        MemoryLayoutStore::new(),
        config.clone(),
        PREVIEW_VIEWPORT_WIDTH,
        Location::parse(href),
    )
}

fn run_resolve(href: &str, config: &ShellConfig, json: bool, out: &mut impl Write) -> Result<()> {
    let shell = preview_shell(href, config);
    let view = shell.view();
    if json {
        return print_json(
            out,
            &json!({
                "href": shell.location().to_href(),
                "workspace": view.workspace_id(),
                "active_item": view.active_item,
                "filter_domain": view.filter_domain,
                "active_filter_count": shell.active_filter_count(),
                "filters": shell.committed_filters().as_ref().map(filters_json),
            }),
        );
    }

    writeln!(out, "href       {}", shell.location())?;
    match view.workspace {
        Some(workspace) => writeln!(out, "workspace  {} ({})", workspace.id, workspace.label)?,
        None => writeln!(out, "workspace  none")?,
    }
    writeln!(out, "item       {}", view.active_item.unwrap_or("none"))?;
    match view.filter_domain {
        Some(domain) => writeln!(
            out,
            "filters    {domain} ({} active)",
            shell.active_filter_count()
        )?,
        None => writeln!(out, "filters    none")?,
    }
    Ok(())
}

fn run_filters_commit(
    args: CommitArgs,
    config: &ShellConfig,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let mut shell = preview_shell(&args.href, config);
    let domain = shell
        .open_filter_panel()
        .with_context(|| format!("no filter panel for {}", shell.location().path))?;
    let schema = domain.schema();

    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for (key, value) in args.set {
        match grouped.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, values)) => values.push(value),
            None => grouped.push((key, vec![value])),
        }
    }

    let mut patch = FilterPatch::new();
    for (key, mut values) in grouped {
        let Some(field) = schema.field(&key) else {
            bail!("unknown filter `{key}` for {domain}");
        };
        patch = match field.kind {
            FieldKind::Multi => patch.set_many(key, values),
            FieldKind::Single => match values.pop() {
                Some(last) => patch.set(key, last),
                None => patch,
            },
        };
    }
    for (key, value) in args.toggle {
        if schema.field(&key).is_none() {
            bail!("unknown filter `{key}` for {domain}");
        }
        patch = patch.toggle(key, value);
    }
    for key in args.reset {
        if schema.field(&key).is_none() {
            bail!("unknown filter `{key}` for {domain}");
        }
        patch = patch.reset(key);
    }

    shell.update_filter_draft(&patch);
    let next = shell
        .apply_filters()
        .context("filter panel closed before apply")?;
    print_filter_result(&shell, &next, json, out)
}

fn run_filters_clear(href: &str, config: &ShellConfig, json: bool, out: &mut impl Write) -> Result<()> {
    let mut shell = preview_shell(href, config);
    let next = shell
        .clear_filters()
        .with_context(|| format!("no filter panel for {}", shell.location().path))?;
    print_filter_result(&shell, &next, json, out)
}

fn run_filters_count(href: &str, config: &ShellConfig, json: bool, out: &mut impl Write) -> Result<()> {
    let shell = preview_shell(href, config);
    let filters = shell
        .committed_filters()
        .with_context(|| format!("no filter panel for {}", shell.location().path))?;
    if json {
        return print_json(
            out,
            &json!({
                "filter_domain": filters.domain(),
                "active_filter_count": filters.active_count(),
            }),
        );
    }
    writeln!(out, "{}", filters.active_count())?;
    Ok(())
}

fn print_filter_result(
    shell: &ShellState<MemoryLayoutStore>,
    next: &Location,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let count = shell.active_filter_count();
    if json {
        return print_json(
            out,
            &json!({
                "href": next.to_href(),
                "active_filter_count": count,
                "filters": shell.committed_filters().as_ref().map(filters_json),
            }),
        );
    }
    writeln!(out, "{next}")?;
    writeln!(out, "{count} active")?;
    Ok(())
}

fn run_layout<S: workdesk_shell_core::LayoutStore>(
    command: LayoutCommand,
    layout: &mut SidebarLayout<S>,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        LayoutCommand::Show => {}
        LayoutCommand::Toggle { workspace } => {
            if WorkspaceRegistry::builtin().get(&workspace).is_none() {
                bail!("unknown workspace `{workspace}`");
            }
            let open = layout.toggle(&workspace);
            tracing::info!(workspace = %workspace, open, "sidebar visibility toggled");
        }
        LayoutCommand::Width { px } => {
            let stored = layout.set_width(px);
            if stored != px {
                tracing::info!(requested = px, stored, "sidebar width clamped");
            }
        }
        LayoutCommand::Reset => layout.reset(),
    }
    print_layout(layout, json, out)
}

fn print_layout<S: workdesk_shell_core::LayoutStore>(
    layout: &SidebarLayout<S>,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let registry = WorkspaceRegistry::builtin();
    if json {
        let mut open = Map::new();
        for descriptor in registry.descriptors() {
            open.insert(
                descriptor.id.to_string(),
                Value::Bool(layout.visibility(descriptor.id)),
            );
        }
        return print_json(
            out,
            &json!({
                "width": layout.persisted_width(),
                "last_workspace": layout.last_workspace(),
                "open": open,
            }),
        );
    }

    writeln!(out, "width           {}", layout.persisted_width())?;
    writeln!(
        out,
        "last workspace  {}",
        layout.last_workspace().as_deref().unwrap_or("none")
    )?;
    for descriptor in registry.descriptors() {
        let state = if layout.visibility(descriptor.id) {
            "open"
        } else {
            "closed"
        };
        writeln!(out, "{:<16}{state}", descriptor.id)?;
    }
    Ok(())
}

fn filters_json(filters: &CommittedFilters) -> Value {
    let mut fields = Map::new();
    for (field, value) in filters.iter() {
        fields.insert(field.key.to_string(), json!(value));
    }
    Value::Object(fields)
}

fn print_json(out: &mut impl Write, value: &Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON output")?;
    writeln!(out, "{rendered}")?;
    Ok(())
}
