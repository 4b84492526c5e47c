use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use newtube_layout::config::{ConfigError, StoreConfig};
use newtube_layout::error::ErrorCode;
use newtube_layout::layout::LayoutUpdate;
use newtube_layout::panel::{PanelType, PanelUpdate};
use newtube_layout::persistence::FileStorage;
use newtube_layout::store::{LayoutStore, StoreError};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl ErrorCode for CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::InvalidJson(_) => "E_INVALID_JSON",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "newtube-layout", about = "Inspect and edit NewTube dashboard layouts")]
struct Cli {
    /// Directory holding the layout storage file. Overrides NEWTUBE_STORAGE_DIR.
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Storage key. Overrides NEWTUBE_STORAGE_KEY.
    #[arg(long)]
    storage_key: Option<String>,

    /// Owner stamped on new layouts. Overrides NEWTUBE_USER_ID.
    #[arg(long)]
    user_id: Option<String>,

    /// Log store operations at debug level.
    #[arg(long, short, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the active layout.
    Show,
    Layout(LayoutCommand),
    Panel(PanelCommand),
}

#[derive(Args, Debug)]
struct LayoutCommand {
    #[command(subcommand)]
    command: LayoutSubcommand,
}

#[derive(Subcommand, Debug)]
enum LayoutSubcommand {
    List,
    Create {
        #[arg(long, default_value = "Untitled Layout")]
        name: String,
        /// Make the new layout active.
        #[arg(long, default_value_t = false)]
        activate: bool,
    },
    Use {
        layout_id: String,
    },
    Rename {
        layout_id: String,
        #[arg(long)]
        name: String,
    },
    Update {
        layout_id: String,
        #[arg(long)]
        data: String,
    },
    Delete {
        layout_id: String,
    },
    Reset,
}

#[derive(Args, Debug)]
struct PanelCommand {
    #[command(subcommand)]
    command: PanelSubcommand,
}

#[derive(Subcommand, Debug)]
enum PanelSubcommand {
    /// List the available panel types and their default titles.
    Types,
    Add {
        panel_type: PanelType,
        #[arg(long)]
        config: Option<String>,
    },
    Remove {
        panel_id: String,
    },
    Update {
        panel_id: String,
        #[arg(long)]
        data: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            warn!(error = %e, "failed to load .env");
        }
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error[{}]: {e}", e.error_code());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = StoreConfig::from_env()?;
    if let Some(dir) = cli.storage_dir {
        config.storage_dir = dir;
    }
    if let Some(key) = cli.storage_key {
        config.storage_key = key;
    }
    if let Some(user_id) = cli.user_id {
        config.user_id = user_id;
    }
    let storage = FileStorage::new(config.storage_dir.clone());
    let mut store = LayoutStore::new(storage, config);
    debug!(
        dir = %store.storage().dir().display(),
        key = %store.config().storage_key,
        user_id = %store.config().user_id,
        "opening layout storage"
    );
    store.rehydrate_or_reset()?;

    match cli.command {
        Command::Show => print_json(&store.current_layout())?,
        Command::Layout(layout) => run_layout(&mut store, layout)?,
        Command::Panel(panel) => run_panel(&mut store, panel)?,
    }

    if store.is_dirty() {
        store.flush()?;
    }
    Ok(())
}

fn run_layout(store: &mut LayoutStore<FileStorage>, layout: LayoutCommand) -> Result<(), CliError> {
    match layout.command {
        LayoutSubcommand::List => {
            let active = store.current_layout().map(|l| l.id.clone());
            let rows: Vec<Value> = store
                .layouts()
                .iter()
                .map(|l| {
                    json!({
                        "id": l.id,
                        "name": l.name,
                        "version": l.version,
                        "isDefault": l.is_default,
                        "panels": l.panels.len(),
                        "active": active.as_deref() == Some(l.id.as_str()),
                    })
                })
                .collect();
            print_json(&rows)
        }
        LayoutSubcommand::Create { name, activate } => {
            let created = store.create_layout(&name);
            if activate {
                store.set_current_layout(Some(created.clone()))?;
            }
            print_json(&created)
        }
        LayoutSubcommand::Use { layout_id } => print_json(&store.activate_layout(&layout_id)?),
        LayoutSubcommand::Rename { layout_id, name } => {
            print_json(&store.update_layout(&layout_id, &LayoutUpdate::rename(name))?)
        }
        LayoutSubcommand::Update { layout_id, data } => {
            let update: LayoutUpdate = serde_json::from_str(&data)?;
            print_json(&store.update_layout(&layout_id, &update)?)
        }
        LayoutSubcommand::Delete { layout_id } => {
            store.delete_layout(&layout_id)?;
            print_json(&json!({ "deleted": layout_id }))
        }
        LayoutSubcommand::Reset => print_json(&store.reset_to_default()),
    }
}

fn run_panel(store: &mut LayoutStore<FileStorage>, panel: PanelCommand) -> Result<(), CliError> {
    match panel.command {
        PanelSubcommand::Types => {
            let rows: Vec<Value> = PanelType::ALL
                .iter()
                .map(|kind| json!({ "type": kind, "title": kind.default_title() }))
                .collect();
            print_json(&rows)
        }
        PanelSubcommand::Add { panel_type, config } => {
            let config = config.map(|raw| serde_json::from_str::<Value>(&raw)).transpose()?;
            print_json(&store.add_panel(panel_type, config)?)
        }
        PanelSubcommand::Remove { panel_id } => print_json(&store.remove_panel(&panel_id)?),
        PanelSubcommand::Update { panel_id, data } => {
            let update: PanelUpdate = serde_json::from_str(&data)?;
            print_json(&store.update_panel(&panel_id, &update)?)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
