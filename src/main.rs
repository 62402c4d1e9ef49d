use chrono::{Local, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use flowrite::{
    app_dirs::AppDirs,
    clock::{ClockIds, SystemClock},
    config::{Config, ConfigStore, FileConfigStore},
    metrics::format_time,
    session::{date_label, PaperStyle},
    storage::FileStorage,
    Workspace,
};
use itertools::Itertools;
use std::{error::Error, fs, path::PathBuf};
use tracing_subscriber::EnvFilter;

type FileWorkspace = Workspace<FileStorage, SystemClock, ClockIds<SystemClock>>;

/// distraction-free timed writing with local session history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Timed, distraction-free writing. The open draft is autosaved to a scratch slot and promoted into your session history when you save, start a new entry or open another session."
)]
pub struct Cli {
    /// directory holding saved sessions and the open draft
    #[clap(long, global = true)]
    data_dir: Option<PathBuf>,

    /// config file to read instead of the default location
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// log lifecycle events to stderr
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// list saved sessions grouped by day
    Sessions,
    /// show the open draft
    Draft,
    /// save the open draft and start a new entry
    New,
    /// save the open draft and open a saved session
    Open { id: String },
    /// open the most recent session written today
    Today,
    /// append a line of text to the open draft
    Append {
        #[clap(required = true)]
        text: Vec<String>,
    },
    /// save the open draft into the session history
    Save,
    /// write the open draft to a .txt file
    Export {
        #[clap(short, long, default_value = ".")]
        dir: PathBuf,
    },
    /// block or allow deleting text
    NoDelete {
        #[clap(value_enum)]
        mode: Toggle,
    },
    /// change the paper style of the open draft
    Paper {
        #[clap(value_enum)]
        style: PaperStyle,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    // a second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(cli: &Cli) -> Config {
    match &cli.config {
        Some(path) => FileConfigStore::with_path(path).load(),
        None => FileConfigStore::new().load(),
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = load_config(&cli);
    let data_dir = cli.data_dir.clone().unwrap_or_else(AppDirs::data_dir);
    let mut workspace: FileWorkspace = Workspace::open(
        FileStorage::new(&data_dir),
        SystemClock,
        ClockIds::new(SystemClock),
        &config,
    );

    match cli.command {
        Command::Sessions => print_sessions(&workspace),
        Command::Draft => print_draft(&workspace),
        Command::New => {
            let id = workspace.create_entry()?;
            println!("started new entry {}", id);
        }
        Command::Open { id } => {
            if workspace.select_session(&id)? {
                println!("opened {}", workspace.draft().title());
            } else {
                eprintln!("no session with id {}", id);
            }
        }
        Command::Today => {
            if workspace.open_latest_today()? {
                println!("opened {}", workspace.draft().title());
            } else {
                println!("nothing written today");
            }
        }
        Command::Append { text } => {
            let line = text.join(" ");
            let mut content = workspace.draft().content.clone();
            if !content.is_empty() && !content.ends_with('\n') {
                content.push('\n');
            }
            content.push_str(&line);
            workspace.on_content_change(content);
            let counts = workspace.draft().counts;
            println!("{} words, {} chars", counts.words, counts.chars);
        }
        Command::Save => match workspace.save()? {
            Some(session) => println!("saved {} ({} words)", session.title, session.word_count),
            None => println!("nothing to save yet"),
        },
        Command::Export { dir } => match workspace.export_current_draft() {
            Ok(export) => {
                fs::create_dir_all(&dir)?;
                let path = dir.join(&export.filename);
                fs::write(&path, &export.text)?;
                println!("session exported as {}", path.display());
            }
            Err(e) => eprintln!("{}", e),
        },
        Command::NoDelete { mode } => {
            let wanted = mode == Toggle::On;
            let notice = if workspace.draft().presentation.is_no_delete_mode == wanted {
                flowrite::edit_policy::mode_notice(wanted)
            } else {
                workspace.toggle_no_delete_mode()
            };
            println!("{}", notice);
        }
        Command::Paper { style } => {
            workspace.set_paper_style(style);
            println!("paper style set to {}", style);
        }
    }

    workspace.close()?;
    Ok(())
}

fn print_sessions(workspace: &FileWorkspace) {
    if workspace.get_sessions().is_empty() {
        println!("no sessions yet");
        return;
    }
    let today = Utc::now().date_naive();
    let by_day = workspace
        .get_sessions()
        .iter()
        .sorted_by(|a, b| b.date.cmp(&a.date))
        .chunk_by(|s| s.date);
    for (date, group) in &by_day {
        println!("{}", date_label(date, today));
        for session in group {
            println!(
                "  {}  {}  ({} words, {})",
                session.id,
                session.display_title(),
                session.word_count,
                format_time(session.duration)
            );
        }
    }
}

fn print_draft(workspace: &FileWorkspace) {
    let draft = workspace.draft();
    let started = workspace.display_date().with_timezone(&Local);
    println!("{}", draft.title());
    println!("  id:       {}", draft.id);
    println!("  started:  {}", started.format("%A, %B %-d, %Y · %H:%M"));
    println!(
        "  counts:   {} words, {} chars, {} WPM",
        draft.counts.words,
        draft.counts.chars,
        workspace.words_per_minute()
    );
    println!("  timer:    {}", format_time(workspace.timer().time_left()));
    println!(
        "  deleting: {}",
        if draft.presentation.is_no_delete_mode {
            "off"
        } else {
            "on"
        }
    );
    println!("  paper:    {}", draft.presentation.paper_style);
    if let Some(status) = workspace.save_status().label() {
        println!("  {}", status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["flowrite"]).is_err());
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from(["flowrite", "sessions", "--data-dir", "/tmp/x", "-v"]);
        assert_eq!(cli.command, Command::Sessions);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        assert!(cli.verbose);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_cli_append_joins_words() {
        let cli = Cli::parse_from(["flowrite", "append", "hello", "world"]);
        assert_eq!(
            cli.command,
            Command::Append {
                text: vec!["hello".to_string(), "world".to_string()]
            }
        );
        assert!(Cli::try_parse_from(["flowrite", "append"]).is_err());
    }

    #[test]
    fn test_cli_open_and_export() {
        let cli = Cli::parse_from(["flowrite", "open", "1700000000000"]);
        assert_eq!(
            cli.command,
            Command::Open {
                id: "1700000000000".to_string()
            }
        );

        let cli = Cli::parse_from(["flowrite", "export"]);
        assert_eq!(
            cli.command,
            Command::Export {
                dir: PathBuf::from(".")
            }
        );

        let cli = Cli::parse_from(["flowrite", "export", "-d", "out"]);
        assert_eq!(
            cli.command,
            Command::Export {
                dir: PathBuf::from("out")
            }
        );
    }

    #[test]
    fn test_cli_value_enums() {
        let cli = Cli::parse_from(["flowrite", "no-delete", "off"]);
        assert_eq!(cli.command, Command::NoDelete { mode: Toggle::Off });

        let cli = Cli::parse_from(["flowrite", "paper", "lined"]);
        assert_eq!(
            cli.command,
            Command::Paper {
                style: PaperStyle::Lined
            }
        );
        assert!(Cli::try_parse_from(["flowrite", "paper", "parchment"]).is_err());
    }

    #[test]
    fn test_config_flag_loads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"countdown_secs": 60}"#).unwrap();
        let cli = Cli::parse_from(["flowrite", "draft", "--config", path.to_str().unwrap()]);
        assert_eq!(load_config(&cli).countdown_secs, 60);
    }
}
