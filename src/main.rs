mod commands;
mod config;
mod layout;
mod taxonomy;
mod tui;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "taxtree",
    about = "Interactive terminal viewer for collapsible classification taxonomies"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open the interactive tree diagram
    View {
        /// Path to the taxonomy JSON document
        #[arg(required_unless_present = "demo")]
        file: Option<PathBuf>,
        /// Use a built-in sample taxonomy (no file required)
        #[arg(long)]
        demo: bool,
    },
    /// Load and validate a taxonomy document
    Check { file: PathBuf },
    /// Print every taxon in document order
    List { file: PathBuf },
    /// Open the viewer on the settings panel
    Setup {
        /// Path to the taxonomy JSON document (sample when omitted)
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::View { file, demo } => commands::view::run(file.as_deref(), demo),
        Command::Check { file } => commands::check::run(&file),
        Command::List { file } => commands::list::run(&file),
        Command::Setup { file } => commands::view::run_setup(file.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn view_requires_a_file_unless_demo() {
        let parsed = Cli::try_parse_from(["taxtree", "view"]);
        assert!(parsed.is_err(), "bare view should demand a file");
        let err = parsed.err().expect("expected clap parse error");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let cli = Cli::try_parse_from(["taxtree", "view", "--demo"])
            .expect("--demo should stand in for the file");
        match cli.command {
            Command::View { file, demo } => {
                assert!(file.is_none());
                assert!(demo);
            }
            _ => panic!("expected view command"),
        }
    }

    #[test]
    fn view_accepts_a_file_path() {
        let cli = Cli::try_parse_from(["taxtree", "view", "graph.json"]).unwrap();
        match cli.command {
            Command::View { file, demo } => {
                assert_eq!(file.unwrap(), PathBuf::from("graph.json"));
                assert!(!demo);
            }
            _ => panic!("expected view command"),
        }
    }

    #[test]
    fn check_parses_its_file_argument() {
        let cli = Cli::try_parse_from(["taxtree", "check", "graph.json"]).unwrap();
        match cli.command {
            Command::Check { file } => assert_eq!(file, PathBuf::from("graph.json")),
            _ => panic!("expected check command"),
        }
    }
}
