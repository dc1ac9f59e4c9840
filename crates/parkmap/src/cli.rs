use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::parking::{Section, SpotId};

#[derive(Parser)]
#[command(name = "parkmap")]
#[command(author, version, about)]
#[command(long_about = "A live occupancy map for a parking facility.\n\n\
    Polls the parking server for spot statuses, colours every spot, suggests \
    the nearest free spot for each newly occupied one and draws a route from \
    the entry to any spot you click.\n\n\
    Examples:\n  \
    parkmap                          Open the live map\n  \
    parkmap --snapshot spots.json    Open the map on a recorded snapshot\n  \
    parkmap watch                    Print status changes as they happen\n  \
    parkmap route D 3                Print the route from the entry to D:3\n  \
    parkmap render --snapshot spots.json -o map.svg")]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Replay a snapshot file instead of polling the server
    #[arg(long, global = false)]
    pub snapshot: Option<PathBuf>,

    /// Launch fullscreen instead of in a window
    #[arg(long, global = false)]
    pub fullscreen: bool,

    /// Parking server base URL (overrides config)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Facility file to use instead of the built-in map
    #[arg(long, global = true)]
    pub layout: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll without a window and print status changes and reroutes
    Watch {
        /// Replay a snapshot file instead of polling the server
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Apply a single snapshot and exit
        #[arg(long)]
        once: bool,
    },

    /// Print the route from the entry/exit to a spot
    Route {
        /// Section name (A, B1, B2, C1, C2, D or E)
        section: Section,

        /// Spot number within the section (1-based)
        spot: u32,
    },

    /// Find the nearest free spot to a spot in the same section
    Nearest {
        section: Section,

        spot: u32,

        /// Read statuses from a snapshot file instead of the server
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Show occupancy statistics from the server
    Analysis {
        /// Write the server's charts as PNG files to this directory
        #[arg(long)]
        save_charts: Option<PathBuf>,
    },

    /// Render the map to an SVG file
    Render {
        /// Snapshot to colour the spots with (all unknown when omitted)
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Also draw the click route to this spot (e.g. B2:7)
        #[arg(long)]
        route: Option<SpotId>,

        /// Output SVG file
        #[arg(short, long, default_value = "map.svg")]
        output: PathBuf,

        /// Colour theme
        #[arg(long, value_enum)]
        theme: Option<ThemeName>,
    },

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. server.url, server.poll_interval_ms, defaults.theme)
        key: String,

        /// Value to set
        value: String,
    },

    /// Create a configuration interactively
    Init,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ThemeName {
    Light,
    Dark,
}

impl ThemeName {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeName::Light => "light",
            ThemeName::Dark => "dark",
        }
    }
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Flags every command may consult.
pub struct GlobalArgs {
    pub url: Option<String>,
    pub layout: Option<PathBuf>,
    pub quiet: bool,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let globals = GlobalArgs {
            url: self.url,
            layout: self.layout,
            quiet: self.quiet,
        };
        match self.command {
            Some(Commands::Watch { snapshot, once }) => {
                crate::commands::watch::run(&globals, snapshot, once)
            }
            Some(Commands::Route { section, spot }) => {
                crate::commands::route::run(&globals, SpotId::new(section, spot))
            }
            Some(Commands::Nearest {
                section,
                spot,
                snapshot,
            }) => crate::commands::nearest::run(&globals, SpotId::new(section, spot), snapshot),
            Some(Commands::Analysis { save_charts }) => {
                crate::commands::analysis::run(&globals, save_charts)
            }
            Some(Commands::Render {
                snapshot,
                route,
                output,
                theme,
            }) => crate::commands::render::run(&globals, snapshot, route, output, theme),
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Version) => {
                crate::commands::version::run();
                Ok(())
            }
            None => {
                if let Some(file) = &self.snapshot {
                    if !file.exists() {
                        anyhow::bail!("File not found: {}", file.display());
                    }
                }
                crate::app::run(&globals, self.snapshot, self.fullscreen)
            }
        }
    }
}
