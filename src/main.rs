use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use caprine_menu::{
    config::{self, ConfigStore, JsonFileStore},
    logging,
    menu::{
        actions::{Action, ActionDispatcher},
        confirm::{Choice, ConfirmationResponse, ScriptedPrompt},
        host::{MenuHost, MenuInstaller},
        model::{ClickEvent, MenuModel},
        node::{MenuNode, NodeKind},
        startup::{StartupManager, Unsupported},
    },
    platform::{self, Os, PlatformProfile, Shell},
    snapshot,
};

#[derive(Parser, Debug)]
#[command(
    name = "caprine-menu",
    version,
    about = "Inspect and drive the Caprine application menu"
)]
struct Cli {
    /// Log filter, e.g. "debug" or "caprine_menu=trace". RUST_LOG overrides it.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct Target {
    /// Build the menu for another platform: macos, windows or linux.
    #[arg(long)]
    os: Option<Os>,
    /// Include development-only items.
    #[arg(long)]
    dev: bool,
}

impl Target {
    fn profile(&self) -> PlatformProfile {
        match self.os {
            Some(os) => PlatformProfile::new(os, self.dev),
            None => {
                let current = PlatformProfile::current();
                PlatformProfile::new(current.os, self.dev || current.development)
            }
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prints the menu tree built from the current config.
    Tree {
        #[command(flatten)]
        target: Target,
        /// Print JSON instead of an indented outline.
        #[arg(long)]
        json: bool,
    },
    /// Lists the ids of every visible clickable item.
    Ids {
        #[command(flatten)]
        target: Target,
    },
    /// Clicks an item and prints what the menu would do. Effects such as
    /// relaunching are printed, not performed.
    Click {
        id: String,
        #[command(flatten)]
        target: Target,
        /// Hold Shift, as when the click comes from a keyboard shortcut.
        #[arg(long)]
        shift: bool,
        /// Answer to give if a confirmation dialog appears.
        #[arg(long, value_enum, default_value_t = Answer::Dismiss)]
        answer: Answer,
        /// Tick "Don't ask again" in the confirmation dialog.
        #[arg(long)]
        dont_ask_again: bool,
    },
    /// Prints a config value (or its default).
    Get { key: String },
    /// Prints the config path that would be used (if any).
    ConfigPath,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Answer {
    Yes,
    No,
    Dismiss,
}

impl Answer {
    fn choice(self) -> Choice {
        match self {
            Answer::Yes => Choice::Affirmative,
            Answer::No => Choice::Negative,
            Answer::Dismiss => Choice::Dismissed,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    match cli.command {
        Command::Tree { target, json } => {
            let host = host(&target, vec![])?;
            let root = host.build();
            if json {
                println!("{}", serde_json::to_string_pretty(&root)?);
            } else {
                for child in &root.children {
                    print_outline(child, 0);
                }
            }
        }
        Command::Ids { target } => {
            let host = host(&target, vec![])?;
            let root = host.build();
            for id in root.clickable_ids() {
                println!("{id}");
            }
        }
        Command::Click {
            id,
            target,
            shift,
            answer,
            dont_ask_again,
        } => {
            let response = ConfirmationResponse::new(answer.choice(), dont_ask_again);
            let mut host = host(&target, vec![response])?;
            host.refresh()?;
            host.click(&id, ClickEvent { shift })
                .with_context(|| format!("click {id}"))?;
        }
        Command::Get { key } => {
            let store = open_store()?;
            match store.get(&key) {
                Some(value) => println!("{value}"),
                None => println!("{} (default)", snapshot::default_value(&key)),
            }
        }
        Command::ConfigPath => {
            if let Some(path) = config::resolve_config_path() {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}

fn open_store() -> Result<JsonFileStore> {
    let path = config::resolve_config_path()
        .context("No config path: set CAPRINE_CONFIG, APPDATA or HOME")?;
    Ok(JsonFileStore::open(path))
}

fn host(target: &Target, answers: Vec<ConfirmationResponse>) -> Result<MenuHost> {
    let path = config::resolve_config_path()
        .context("No config path: set CAPRINE_CONFIG, APPDATA or HOME")?;
    let user_data = config::user_data_dir(&path);
    let profile = target.profile();

    let startup: Box<dyn StartupManager> = if profile.os == Os::current() {
        platform::startup_manager()
    } else {
        Box::new(Unsupported)
    };

    let model = MenuModel::new(
        Box::new(JsonFileStore::open(&path)),
        startup,
        profile,
        user_data,
    );
    Ok(MenuHost::new(
        model,
        Box::new(PrintDispatcher),
        Box::new(ScriptedPrompt::new(answers).echo()),
        Box::new(PrintShell),
        Box::new(NoInstall),
    ))
}

fn print_outline(node: &MenuNode, depth: usize) {
    let indent = "  ".repeat(depth);
    let hidden = if node.visible { "" } else { " (hidden)" };
    let disabled = if node.enabled { "" } else { " (disabled)" };
    let accel = node
        .accelerator
        .as_deref()
        .map(|a| format!("  [{a}]"))
        .unwrap_or_default();

    let line = match &node.kind {
        NodeKind::Separator => "----".to_string(),
        NodeKind::Checkbox { checked } => {
            let mark = if *checked { "[x]" } else { "[ ]" };
            format!("{mark} {} <{}>", node.label, node.id)
        }
        NodeKind::Action => format!("{} <{}>", node.label, node.id),
        NodeKind::Submenu => format!("{} >", node.label),
        NodeKind::Role { role } => {
            if node.children.is_empty() {
                format!("{} ({role:?})", node.label)
            } else {
                format!("{} ({role:?}) >", node.label)
            }
        }
    };
    println!("{indent}{line}{accel}{hidden}{disabled}");

    for child in &node.children {
        print_outline(child, depth + 1);
    }
}

struct PrintDispatcher;

impl ActionDispatcher for PrintDispatcher {
    fn send(&mut self, action: Action) {
        println!("dispatch {action}");
    }
}

struct PrintShell;

impl Shell for PrintShell {
    fn open_path(&mut self, path: &Path) -> Result<()> {
        println!("open {}", path.display());
        Ok(())
    }

    fn open_url(&mut self, url: &str) -> Result<()> {
        println!("open {url}");
        Ok(())
    }

    fn trash(&mut self, path: &Path) -> Result<()> {
        println!("trash {}", path.display());
        Ok(())
    }

    fn relaunch(&mut self) -> Result<()> {
        println!("relaunch");
        Ok(())
    }

    fn quit(&mut self) {
        println!("quit");
    }
}

struct NoInstall;

impl MenuInstaller for NoInstall {
    fn install(&mut self, _root: &MenuNode) -> Result<()> {
        Ok(())
    }
}
