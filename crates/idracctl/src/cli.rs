//! CLI structure and command definitions

use clap::{Parser, Subcommand};
use idracctl_core::VirtualMediaType;

/// Dell iDRAC configuration workflows over Redfish
#[derive(Parser, Debug)]
#[command(name = "idracctl")]
#[command(version, about = "Dell iDRAC configuration CLI")]
#[command(long_about = "
Dell iDRAC configuration CLI

Applies OEM configuration through Server Configuration Profile imports and
recovers the controller's job queue when it gets stuck.

EXAMPLES:
    # Set up a profile (password read from the environment at run time)
    idracctl profile set lab --url https://10.0.0.20 --username root \\
        --password '${IDRAC_PASSWORD}' --insecure

    # Boot from virtual CD on the next boot
    idracctl boot-device CD

    # Clear the job queue, restart the controller and wait for it
    idracctl known-good-state

    # Inspect outstanding jobs as JSON
    idracctl jobs list --unfinished -o json

For more help on a specific command, run:
    idracctl <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "IDRACCTL_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "IDRACCTL_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Human-readable table format
    Table,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Boot the server from virtual media
    #[command(name = "boot-device")]
    #[command(after_help = "EXAMPLES:
    # Next boot only
    idracctl boot-device CD

    # Every boot until changed
    idracctl boot-device Floppy --persistent

Only CD and Floppy have a configuration bundle; DVD and USBStick are rejected
before anything is sent to the controller.
")]
    BootDevice {
        /// Virtual media to boot from
        #[arg(value_enum)]
        device: VirtualMediaType,

        /// Keep the override across boots
        #[arg(long)]
        persistent: bool,
    },

    /// Lifecycle Controller job queue
    #[command(subcommand)]
    Jobs(JobsCommands),

    /// Gracefully restart the controller
    Reset {
        /// Wait for the Lifecycle Controller to come back
        #[arg(long)]
        wait: bool,
    },

    /// Wait until the Lifecycle Controller accepts jobs
    #[command(name = "wait-ready")]
    WaitReady,

    /// Clear every job, restart the controller and wait for it
    #[command(name = "known-good-state")]
    KnownGoodState,

    /// Profile management
    #[command(subcommand, visible_alias = "prof")]
    Profile(ProfileCommands),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Version information
    Version,
}

#[derive(Subcommand, Debug)]
pub enum JobsCommands {
    /// List jobs in the queue
    #[command(visible_alias = "ls")]
    List {
        /// Only scheduled or running jobs
        #[arg(long)]
        unfinished: bool,
    },

    /// Delete jobs from the queue; no ids clears everything
    Clear {
        /// Job ids such as JID_471269252011
        job_ids: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile
    #[command(visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Set or create a profile
    #[command(visible_alias = "add")]
    #[command(after_help = "EXAMPLES:
    # Plain credentials
    idracctl profile set lab --url https://10.0.0.20 --username root --password calvin

    # Prompt for the password instead of passing it on the command line
    idracctl profile set lab --url https://10.0.0.20 --username root --ask-password

    # Blade with a non-default system id
    idracctl profile set blade3 --url https://10.0.1.3 --username root \\
        --system-id System.Embedded.3
")]
    Set {
        /// Profile name
        name: String,

        /// Controller URL, e.g. https://10.0.0.20
        #[arg(long)]
        url: String,

        /// Controller username
        #[arg(long)]
        username: String,

        /// Controller password
        #[arg(long, conflicts_with = "ask_password")]
        password: Option<String>,

        /// Prompt for the password
        #[arg(long)]
        ask_password: bool,

        /// Accept self-signed certificates
        #[arg(long)]
        insecure: bool,

        /// Manager resource id
        #[arg(long, default_value = "iDRAC.Embedded.1")]
        manager_id: String,

        /// Computer system resource id
        #[arg(long, default_value = "System.Embedded.1")]
        system_id: String,

        /// Store the password in the OS keyring instead of the config file
        #[cfg(feature = "secure-storage")]
        #[arg(long)]
        use_keyring: bool,
    },

    /// Remove a profile
    #[command(visible_alias = "rm")]
    Remove {
        /// Profile name to remove
        name: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Set the profile used when none is given
    Default {
        /// Profile name
        name: String,
    },
}

/// Supported shells for completion generation
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell", alias = "power-shell")]
    PowerShell,
    Elvish,
}
