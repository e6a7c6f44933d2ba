use std::{
    io::{BufRead, Write},
    path::{Path, PathBuf},
    process::Command,
};

use autopause_core::{
    parse_ignore_input, AppConfig, AppHooks, AppleScriptPlayer, AudioMonitor,
    AudioSourceEnumerator, CycleReport, IgnoreList, IgnoreStore, PmsetEnumerator, PollLoop,
    Request,
};
use clap::{Parser, Subcommand};
use crossbeam_channel::Sender;
use tracing_subscriber::EnvFilter;

fn main() -> autopause_core::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    std::fs::create_dir_all(&config.support_dir)?;

    match cli.command {
        Commands::Run { once } => run_monitor(&config, once),
        Commands::Ignore { action } => run_ignore(&config, action),
        Commands::Sources => run_sources(&config),
    }
}

fn load_config(cli: &Cli) -> autopause_core::Result<AppConfig> {
    let defaults = AppConfig::default();
    let support_dir = cli
        .support_dir
        .clone()
        .unwrap_or_else(|| defaults.support_dir.clone());
    let config_path = AppConfig {
        support_dir: support_dir.clone(),
        ..defaults
    }
    .config_path();

    let mut config = AppConfig::load_or_default(&config_path)?;
    config.support_dir = support_dir;
    if let Some(player) = &cli.player {
        config.player.name = player.clone();
    }
    Ok(config)
}

fn run_monitor(config: &AppConfig, once: bool) -> autopause_core::Result<()> {
    let store = IgnoreStore::new(config.ignore_list_path());
    let ignore = IgnoreList::new(config.player.name.clone(), store.load()?);
    let monitor = AudioMonitor::new(ignore, config.polling.clone());
    let player = AppleScriptPlayer::new(config.player.name.clone());
    let mut poll = PollLoop::new(monitor, player, PmsetEnumerator::new());
    let mut hooks = TerminalHooks::new(store, config.log_path());

    if once {
        let report = poll.tick();
        hooks.on_cycle(&report, &poll.monitor().status_table())?;
        if let Some(err) = report.control_error {
            return Err(err.into());
        }
        return Ok(());
    }

    tracing::info!(
        player = %config.player.name,
        support_dir = ?config.support_dir,
        "type `log`, `ignore <a, b>` or `quit`"
    );
    let (tx, rx) = crossbeam_channel::unbounded();
    spawn_stdin_reader(tx)?;
    poll.run(&rx, &mut hooks);
    Ok(())
}

fn run_ignore(config: &AppConfig, action: IgnoreAction) -> autopause_core::Result<()> {
    let store = IgnoreStore::new(config.ignore_list_path());
    let mut entries = store.load()?;

    match action {
        IgnoreAction::List => {
            println!("{} (always)", config.player.name);
            for entry in &entries {
                println!("{entry}");
            }
            return Ok(());
        }
        IgnoreAction::Set { entries: text } => entries = parse_ignore_input(&text),
        IgnoreAction::Add { name } => {
            if !entries.iter().any(|entry| entry.eq_ignore_ascii_case(&name)) {
                entries.push(name);
            }
        }
        IgnoreAction::Remove { name } => {
            entries.retain(|entry| !entry.eq_ignore_ascii_case(&name));
        }
    }

    store.save(&entries)?;
    println!("{}", entries.join(", "));
    Ok(())
}

fn run_sources(config: &AppConfig) -> autopause_core::Result<()> {
    let store = IgnoreStore::new(config.ignore_list_path());
    let ignore = IgnoreList::new(config.player.name.clone(), store.load()?);
    let sources = PmsetEnumerator::new().list_active_audio_sources();

    if sources.is_empty() {
        println!("no process is playing audio");
    }
    for source in &sources {
        let status = if ignore.is_ignored(source) {
            "ignored"
        } else {
            "other audio"
        };
        println!("{:>7}  {:<12} {}", source.pid, status, source.name);
    }
    Ok(())
}

/// Reads menu commands from the terminal and forwards them to the loop.
fn spawn_stdin_reader(tx: Sender<Request>) -> autopause_core::Result<()> {
    std::thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                let Some(request) = parse_command(&line) else {
                    eprintln!("commands: log | ignore <app, app> | quit");
                    continue;
                };
                let quit = request == Request::Quit;
                if tx.send(request).is_err() || quit {
                    break;
                }
            }
        })?;
    Ok(())
}

fn parse_command(line: &str) -> Option<Request> {
    let line = line.trim();
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    match command {
        "log" | "activity" => Some(Request::ShowLog),
        "ignore" => Some(Request::ReplaceIgnoreList(parse_ignore_input(rest))),
        "quit" | "q" | "exit" => Some(Request::Quit),
        _ => None,
    }
}

/// Terminal rendition of the menu-bar app: persists edits, mirrors the status
/// table to the log file and the console.
struct TerminalHooks {
    store: IgnoreStore,
    log_path: PathBuf,
}

impl TerminalHooks {
    fn new(store: IgnoreStore, log_path: PathBuf) -> Self {
        Self { store, log_path }
    }

    fn write_log(&self, table: &str) -> autopause_core::Result<()> {
        std::fs::write(&self.log_path, table)?;
        Ok(())
    }
}

impl AppHooks for TerminalHooks {
    fn on_edit_requested(&mut self, entries: &[String]) -> autopause_core::Result<()> {
        self.store.save(entries)
    }

    fn on_show_log_requested(&mut self, table: &str) -> autopause_core::Result<()> {
        self.write_log(table)?;
        open_file(&self.log_path)
    }

    fn on_quit_requested(&mut self) {
        tracing::info!("quit requested");
    }

    fn on_cycle(&mut self, report: &CycleReport, table: &str) -> autopause_core::Result<()> {
        self.write_log(table)?;
        if report.logged {
            let mut stdout = std::io::stdout().lock();
            write!(stdout, "\x1b[2J\x1b[H{table}")?;
            stdout.flush()?;
        }
        Ok(())
    }
}

fn open_file(path: &Path) -> autopause_core::Result<()> {
    let status = Command::new("open").arg(path).status()?;
    if !status.success() {
        return Err(format!("`open` failed for {}", path.display()).into());
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Pause the music player while other apps play audio",
    long_about = None
)]
struct Cli {
    /// Name of the player application to control.
    #[arg(short, long, global = true)]
    player: Option<String>,
    /// Directory holding the ignore list, config and status log.
    #[arg(long, global = true)]
    support_dir: Option<PathBuf>,
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch audio activity and pause/resume the player.
    Run {
        /// Run a single check cycle and exit.
        #[arg(long)]
        once: bool,
    },
    /// Inspect or edit the user ignore list.
    Ignore {
        #[command(subcommand)]
        action: IgnoreAction,
    },
    /// Show the processes currently holding an audio assertion.
    Sources,
}

#[derive(Subcommand, Debug)]
enum IgnoreAction {
    /// Print every ignored name.
    List,
    /// Replace the list with comma separated names.
    Set { entries: String },
    /// Add one name.
    Add { name: String },
    /// Remove one name (case-insensitive).
    Remove { name: String },
}
