//! Tierlist CLI
//!
//! Manages custom templates and runs scripted sessions against a catalog.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{debug, info};

use tierlist_core::{
    Catalog, Command as SessionCommand, FileStore, ItemKind, Template, TemplateId, TemplateSource,
    TemplateStore, TierId, TierListConfig, TierListSession,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "tierlist")]
#[command(about = "Tier list builder for characters and weapons", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding saved templates and placements
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect and manage templates
    Templates {
        #[command(subcommand)]
        action: TemplatesAction,
    },

    /// Execute a JSON command script against a catalog
    Run {
        /// Item kind: character or weapon
        #[arg(long, value_parser = parse_kind)]
        kind: ItemKind,

        /// JSON array of items
        #[arg(long)]
        catalog: PathBuf,

        /// JSON array of commands
        #[arg(long)]
        script: PathBuf,

        /// Template to select before running the script
        #[arg(long)]
        template: Option<String>,
    },
}

#[derive(Subcommand)]
enum TemplatesAction {
    /// List builtin and custom templates
    List {
        #[arg(long, value_parser = parse_kind, default_value = "character")]
        kind: ItemKind,
    },

    /// Show a template's tiers and columns
    Show {
        id: String,
        #[arg(long, value_parser = parse_kind, default_value = "character")]
        kind: ItemKind,
    },

    /// Save a copy of a template under a new name
    Clone {
        source: String,
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_kind, default_value = "character")]
        kind: ItemKind,
    },

    /// Delete a custom template
    Delete {
        id: String,
        #[arg(long, value_parser = parse_kind, default_value = "character")]
        kind: ItemKind,
    },
}

fn parse_kind(input: &str) -> Result<ItemKind, String> {
    ItemKind::parse(input)
        .ok_or_else(|| format!("unknown item kind: {input} (expected character or weapon)"))
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let data_dir = resolve_data_dir(cli.data_dir, &config)?;
    debug!(dir = %data_dir.display(), "using data directory");

    match cli.command {
        Command::Templates { action } => run_templates(action, &config, &data_dir),
        Command::Run {
            kind,
            catalog,
            script,
            template,
        } => run_script(kind, &catalog, &script, template, config, &data_dir),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<TierListConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match dirs::config_dir() {
            Some(dir) => dir.join("tierlist").join("config.toml"),
            None => return Ok(TierListConfig::default()),
        },
    };
    Ok(TierListConfig::load(&path)?)
}

fn resolve_data_dir(flag: Option<PathBuf>, config: &TierListConfig) -> CliResult<PathBuf> {
    flag.or_else(|| config.storage.directory.clone())
        .or_else(|| dirs::data_dir().map(|d| d.join("tierlist")))
        .ok_or_else(|| "no data directory available; pass --data-dir".into())
}

fn run_templates(
    action: TemplatesAction,
    config: &TierListConfig,
    data_dir: &Path,
) -> CliResult<()> {
    let mut storage = FileStore::open(data_dir)?;
    let load = |kind: ItemKind, storage: &FileStore| {
        TemplateStore::load(kind, config.storage.templates_key(kind), &config.board, storage)
    };

    match action {
        TemplatesAction::List { kind } => {
            let store = load(kind, &storage);
            for template in store.all() {
                let source = match store.source(&template.id) {
                    Some(TemplateSource::Builtin) => "builtin",
                    _ => "custom",
                };
                println!(
                    "{:<40} {:<8} {} ({} tiers, {} columns)",
                    template.id,
                    source,
                    template.name,
                    template.tiers.len(),
                    template.column_count
                );
            }
        }
        TemplatesAction::Show { id, kind } => {
            let store = load(kind, &storage);
            let id = TemplateId::new(id);
            let template = store
                .get(&id)
                .ok_or_else(|| format!("template not found: {id}"))?;
            print_template(template);
        }
        TemplatesAction::Clone { source, name, kind } => {
            let mut store = load(kind, &storage);
            let draft = store.draft_from(&TemplateId::new(source), name)?;
            let saved = store.save_as(draft, &mut storage)?;
            if !saved.persisted {
                let dir = data_dir.display();
                return Err(format!("template {} could not be written to {}", saved.id, dir).into());
            }
            info!(template = %saved.id, "template saved");
            println!("{}", saved.id);
        }
        TemplatesAction::Delete { id, kind } => {
            let mut store = load(kind, &storage);
            let deleted = store.delete(&TemplateId::new(id), &mut storage)?;
            println!("deleted {}", deleted.template.id);
        }
    }
    Ok(())
}

fn print_template(template: &Template) {
    println!("{} ({})", template.name, template.id);
    println!("kind: {}", template.kind);
    let columns: Vec<String> = (0..template.column_count)
        .map(|c| template.column_label(c))
        .collect();
    println!("columns: {}", columns.join(" | "));
    for tier in &template.tiers {
        println!("  {:<6} {:<12} #{}", tier.label, tier.id, tier.color);
    }
}

fn run_script(
    kind: ItemKind,
    catalog: &Path,
    script: &Path,
    template: Option<String>,
    config: TierListConfig,
    data_dir: &Path,
) -> CliResult<()> {
    let catalog = Catalog::from_json(kind, &std::fs::read_to_string(catalog)?)?;
    let commands: Vec<SessionCommand> = serde_json::from_str(&std::fs::read_to_string(script)?)?;
    let storage = FileStore::open(data_dir)?;

    let mut session = TierListSession::new(config, catalog, Box::new(storage));
    if let Some(template) = template {
        session.select_template(&TemplateId::new(template))?;
    }

    info!(count = commands.len(), "running script");
    for (step, command) in commands.into_iter().enumerate() {
        let output = command
            .execute(&mut session)
            .map_err(|e| format!("command {} failed: {e}", step + 1))?;
        debug!(step = step + 1, ?output, "command done");
    }

    print_board(&session);
    Ok(())
}

fn print_board(session: &TierListSession) {
    let board = session.board();
    let template = session.active_template();
    let name = |id: &tierlist_core::InstanceId| {
        board
            .instance(id)
            .map(|i| format!("{} [{}]", i.display.name, id))
            .unwrap_or_else(|| id.to_string())
    };

    println!("{} ({})", template.name, template.id);
    for tier in &template.tiers {
        let cells: Vec<String> = session
            .columns_for(&tier.id)
            .iter()
            .map(|column| column.iter().map(&name).collect::<Vec<_>>().join(", "))
            .collect();
        println!("{:<6} {}", tier.label, cells.join(" | "));
    }
    let pool: Vec<String> = board.bucket(&TierId::unassigned()).iter().map(&name).collect();
    println!("{:<6} {}", "pool", pool.join(", "));
}
