//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use generational_arena::Index;
use termtree::Tree;
use tracing::{debug, instrument};

use crate::application::services::{default_backup_path, SanitizeOptions};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::{ConfigPath, ConfigTree, DomainError, NodeValue};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see --help".to_string(),
        ));
    };

    match command {
        Commands::Sanitize {
            file,
            keep,
            dry_run,
            backup,
        } => cmd_sanitize(cli, file.as_deref(), keep.as_deref(), *dry_run, *backup),
        Commands::Show { file } => cmd_show(cli, file.as_deref()),
        Commands::Tree { path, file } => cmd_tree(cli, file.as_deref(), path.as_deref()),
        Commands::List { path, file } => cmd_list(cli, file.as_deref(), path),
        Commands::Get { path, file } => cmd_get(cli, file.as_deref(), path),
        Commands::Config { command } => cmd_config(cli, command),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

fn create_container(cli: &Cli) -> CliResult<ServiceContainer> {
    let settings = Settings::load(cli.settings.as_deref())?;
    debug!("settings: {:?}", settings);
    Ok(ServiceContainer::new(settings))
}

fn document_path(container: &ServiceContainer, file: Option<&Path>) -> PathBuf {
    file.map(Path::to_path_buf)
        .unwrap_or_else(|| container.settings.config_path.clone())
}

#[instrument(skip(cli))]
fn cmd_sanitize(
    cli: &Cli,
    file: Option<&Path>,
    keep: Option<&str>,
    dry_run: bool,
    backup: bool,
) -> CliResult<()> {
    let container = create_container(cli)?;
    let path = document_path(&container, file);

    let mut policy = container.settings.policy();
    if let Some(keep) = keep {
        policy.keep_interface = keep.to_string();
    }
    let options = SanitizeOptions {
        dry_run,
        backup: (!dry_run && (backup || container.settings.backup))
            .then(|| default_backup_path(&path)),
    };

    let outcome = container
        .documents
        .sanitize_file(&path, &policy, &options)?;

    if !outcome.report.kept {
        output::warning(&format!(
            "interface {} not found under {}",
            policy.keep_interface, policy.interfaces_path
        ));
    }

    if dry_run {
        output::document(&outcome.rendered);
        return Ok(());
    }

    if let Some(backup) = &outcome.backup {
        output::action("Backup", &backup.display());
    }
    output::success(&format!("sanitized {}", path.display()));
    if outcome.report.is_noop() {
        output::detail("nothing to change");
    }
    if let Some(hw_id) = &outcome.report.stripped_hw_id {
        output::removed(hw_id);
    }
    for interface in &outcome.report.removed {
        output::removed(&policy.interfaces_path.join(interface.as_str()));
    }
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_show(cli: &Cli, file: Option<&Path>) -> CliResult<()> {
    let container = create_container(cli)?;
    let path = document_path(&container, file);
    output::document(&container.documents.render(&path)?);
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_tree(cli: &Cli, file: Option<&Path>, node_path: Option<&str>) -> CliResult<()> {
    let container = create_container(cli)?;
    let path = document_path(&container, file);
    let tree = container.documents.load(&path)?;

    let start = parse_node_path(node_path.unwrap_or_default());
    let idx = tree
        .resolve(&start)
        .ok_or_else(|| application_error(DomainError::NotFound(start.clone())))?;

    let label = if start.is_root() {
        path.display().to_string()
    } else {
        start.to_string()
    };
    let mut display = Tree::new(label);
    for (child, _) in tree.children(idx) {
        display.push(build_display_tree(&tree, child));
    }
    output::info(&display);
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_list(cli: &Cli, file: Option<&Path>, node_path: &str) -> CliResult<()> {
    let container = create_container(cli)?;
    let path = document_path(&container, file);
    let tree = container.documents.load(&path)?;

    let names = tree
        .list_nodes(&parse_node_path(node_path))
        .map_err(application_error)?;
    for name in names {
        output::info(&name);
    }
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_get(cli: &Cli, file: Option<&Path>, node_path: &str) -> CliResult<()> {
    let container = create_container(cli)?;
    let path = document_path(&container, file);
    let tree = container.documents.load(&path)?;

    let node_path = parse_node_path(node_path);
    let node = tree
        .get(&node_path)
        .ok_or_else(|| application_error(DomainError::NotFound(node_path.clone())))?;
    if !node.is_leaf() {
        return Err(CliError::InvalidArgs(format!("{} is not a leaf", node_path)));
    }
    for value in tree.return_values(&node_path) {
        output::info(value);
    }
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(cli.settings.as_deref())?;
            output::document(&settings.to_toml()?);
        }
        ConfigCommands::Init { write: false } => output::document(&Settings::template()),
        ConfigCommands::Init { write: true } => {
            let target = global_config_path().ok_or_else(|| {
                CliError::Usage("cannot determine global config directory".to_string())
            })?;
            if target.exists() {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    target.display()
                )));
            }
            if let Some(dir) = target.parent() {
                std::fs::create_dir_all(dir)
                    .map_err(|e| InfraError::io_at("create config directory", dir, e))?;
            }
            std::fs::write(&target, Settings::template())
                .map_err(|e| InfraError::io_at("write config", &target, e))?;
            output::action("Created", &target.display());
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(global) => output::action("Global", &global.display()),
                None => output::action("Global", "(unavailable)"),
            }
            if let Some(explicit) = &cli.settings {
                output::action("Explicit", &explicit.display());
            }
        }
    }
    Ok(())
}

fn parse_node_path(path: &str) -> ConfigPath {
    path.parse().unwrap_or_else(|never| match never {})
}

fn application_error(e: DomainError) -> CliError {
    CliError::from(crate::application::ApplicationError::Domain(e))
}

/// Node label: name, plus values for leaves.
fn build_display_tree(tree: &ConfigTree, idx: Index) -> Tree<String> {
    let Some(node) = tree.get_node(idx) else {
        return Tree::new(String::new());
    };
    let label = match &node.value {
        None => node.name.clone(),
        Some(NodeValue::Scalar(v)) => format!("{} = {}", node.name, v),
        Some(NodeValue::List(vs)) => format!("{} = [{}]", node.name, vs.join(", ")),
    };
    let mut display = Tree::new(label);
    for (child, _) in tree.children(idx) {
        display.push(build_display_tree(tree, child));
    }
    display
}
