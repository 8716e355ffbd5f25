use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::path::Path;
use std::time::Duration;

use shellflow_keys::cli::{CliArgs, RunConfig, Task};
use shellflow_keys::config::KeysConfig;
use shellflow_keys::keymap::{
    format_chord, load_mappings, validate_mappings, ContextSet, MappingFormat, MappingsError,
    MappingsResult, MappingsSource, MappingsWatcher, SharedKeymap,
};

/// How often `watch` drains the file watcher
const WATCH_POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    shellflow_keys::tracing::init();

    let args = CliArgs::parse();
    let keys = KeysConfig::load();
    let config = args.into_config(&keys).map_err(|e| anyhow!(e))?;

    match &config.task {
        Task::Check { path } => {
            let path = path
                .clone()
                .or_else(|| config.mappings.as_ref().map(MappingsSource::path));
            check(path.as_deref())
        }
        Task::Resolve { chord, contexts } => resolve(&config, chord, contexts),
        Task::List { contexts } => list(&config, contexts),
        Task::Watch => watch(&config),
    }
}

fn check(path: Option<&Path>) -> Result<()> {
    let path = path.context("No mappings file given and no config directory available")?;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let report = validate_mappings(&text, MappingFormat::from_path(path));
    for error in &report.errors {
        println!("error: {}", error);
    }
    for warning in &report.warnings {
        println!("warning: {}", warning);
    }

    if !report.valid {
        bail!(
            "{} is invalid ({} error(s))",
            path.display(),
            report.errors.len()
        );
    }
    println!("{}: ok", path.display());
    Ok(())
}

fn resolve(config: &RunConfig, chord: &str, contexts: &ContextSet) -> Result<()> {
    let result = load_user_mappings(config);
    print_load_errors(&result.errors);

    let resolved = result.keymap.resolve_for_platform(
        chord,
        contexts,
        config.platform,
        config.alias_ctrl_to_cmd,
    );
    let label = format_chord(chord, config.platform);

    match resolved {
        Some(binding) => {
            println!("{} → {}", label, binding.action_id);
            if !binding.args.is_empty() {
                println!("  args: {}", serde_json::Value::from(binding.args));
            }
            println!("  context: {}", binding.context.as_deref().unwrap_or("(global)"));
        }
        None => println!("{}: no binding", label),
    }
    Ok(())
}

fn list(config: &RunConfig, contexts: &ContextSet) -> Result<()> {
    let result = load_user_mappings(config);
    print_load_errors(&result.errors);

    let active = result.keymap.active_bindings(contexts);
    let rows: Vec<(String, String)> = active
        .iter()
        .map(|(chord, binding)| {
            let action = if binding.args.is_empty() {
                binding.action_id.clone()
            } else {
                format!(
                    "{} {}",
                    binding.action_id,
                    serde_json::Value::from(binding.args.clone())
                )
            };
            (format_chord(chord, config.platform), action)
        })
        .collect();

    let width = rows
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0);
    for (label, action) in rows {
        let pad = width - label.chars().count();
        println!("{}{}  {}", label, " ".repeat(pad), action);
    }
    Ok(())
}

fn load_user_mappings(config: &RunConfig) -> MappingsResult {
    match &config.mappings {
        Some(source) => source.load(config.strict),
        None => load_mappings(None, config.strict),
    }
}

fn watch(config: &RunConfig) -> Result<()> {
    let source: &MappingsSource = config
        .mappings
        .as_ref()
        .context("No mappings file given and no config directory available")?;

    let initial = source.load(config.strict);
    print_load_errors(&initial.errors);
    let shared = SharedKeymap::new(initial.keymap);

    let watcher = MappingsWatcher::new(source)
        .with_context(|| format!("Failed to watch {}", source.path().display()))?;
    for path in watcher.paths() {
        println!("Watching {}", path.display());
    }
    println!("{} groups loaded", shared.snapshot().len());

    loop {
        if watcher.poll_changed() {
            let result = shared.reload(Some(source), config.strict);
            print_load_errors(&result.errors);
            println!(
                "Reloaded {} ({} groups)",
                source.path().display(),
                result.keymap.len()
            );
        }
        std::thread::sleep(WATCH_POLL_INTERVAL);
    }
}

fn print_load_errors(errors: &[MappingsError]) {
    for error in errors {
        eprintln!("error: {}", error);
    }
}
