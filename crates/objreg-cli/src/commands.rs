use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use objreg_persist::{BatchReport, JsonLinesReader, LoadSelector, Severity};
use objreg_sdk::{Workspace, WorkspaceConfig};
use tracing::debug;

use crate::cli::*;

/// Run one subcommand. `Ok(false)` means a batch reported failures.
pub fn run_command(cli: Cli) -> anyhow::Result<bool> {
    let ws = open_workspace(cli.config.as_deref())?;
    match cli.command {
        Command::Load(args) => cmd_load(&ws, args),
        Command::List(args) => cmd_list(&ws, args),
        Command::Resave(args) => cmd_resave(&ws, args),
    }
}

fn open_workspace(config: Option<&Path>) -> anyhow::Result<Workspace> {
    debug!(config = ?config, "opening workspace");
    let ws = match config {
        Some(path) => Workspace::from_config_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Workspace::new(WorkspaceConfig::default())?,
    };
    Ok(ws)
}

fn selector(ws: &Workspace, names: Vec<String>, types: Vec<String>) -> anyhow::Result<LoadSelector> {
    if !names.is_empty() {
        return Ok(LoadSelector::ByName(names));
    }
    if types.is_empty() {
        return Ok(LoadSelector::All);
    }
    let known = ws.creators().types()?;
    let mut selected = Vec::new();
    for name in &types {
        match known.iter().find(|t| t.name() == name.as_str()) {
            Some(t) => selected.push(t.clone()),
            None => bail!("unknown type {name:?}"),
        }
    }
    Ok(LoadSelector::ByType(selected))
}

fn cmd_load(ws: &Workspace, args: LoadArgs) -> anyhow::Result<bool> {
    let selector = selector(ws, args.names, args.types)?;
    let outcome = ws
        .load_file(&args.file, &selector)
        .with_context(|| format!("reading {}", args.file.display()))?;
    print_report(&outcome.report);
    print_objects(ws);
    Ok(outcome.report.is_success())
}

fn cmd_list(ws: &Workspace, args: ListArgs) -> anyhow::Result<bool> {
    let reader = JsonLinesReader::open(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let listed = ws.list(&reader)?;
    if listed.is_empty() {
        println!("No objects.");
    }
    for (type_desc, name) in listed {
        println!("  {:<12} {}", type_desc.name().cyan(), name.bold());
    }
    Ok(true)
}

fn cmd_resave(ws: &Workspace, args: ResaveArgs) -> anyhow::Result<bool> {
    let loaded = ws
        .load_file(&args.input, &LoadSelector::All)
        .with_context(|| format!("reading {}", args.input.display()))?;
    print_report(&loaded.report);

    let names = (!args.names.is_empty()).then_some(args.names.as_slice());
    let saved = ws
        .save_file(&args.output, names)
        .with_context(|| format!("writing {}", args.output.display()))?;
    print_report(&saved);

    Ok(loaded.report.is_success() && saved.is_success())
}

fn print_report(report: &BatchReport) {
    let mark = if report.is_success() {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!(
        "{} {}: {} succeeded, {} failed, {} warnings",
        mark,
        report.operation,
        report.success_count.to_string().bold(),
        report.error_count(),
        report.warning_count()
    );
    for entry in &report.entries {
        let line = entry.to_string();
        match entry.severity {
            Severity::Error => println!("  {}", line.red()),
            Severity::Warning => println!("  {}", line.yellow()),
        }
    }
}

fn print_objects(ws: &Workspace) {
    for record in ws.objects().items() {
        let deps: Vec<&str> = record.dependencies().iter().map(|d| d.name()).collect();
        if deps.is_empty() {
            println!("  {:<16} {}", record.name().bold(), record.type_desc().name().cyan());
        } else {
            println!(
                "  {:<16} {} ← {}",
                record.name().bold(),
                record.type_desc().name().cyan(),
                deps.join(", ").dimmed()
            );
        }
    }
}
