use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// AlphaSmart Neo USB command-line tool.
///
/// For scripts that issue multiple commands, use `mode` first to avoid
/// repeated device initialization delays.
#[derive(Debug, Parser)]
#[command(name = "neotools", version, about)]
pub struct Cli {
    /// Enable debug-level logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read or flip the device's keyboard/comms USB personality.
    Mode {
        #[arg(long, conflicts_with = "comms")]
        keyboard: bool,
        #[arg(long)]
        comms: bool,
    },
    /// General system information.
    Info,
    /// Inspect applets and manage their settings.
    #[command(subcommand)]
    Applets(AppletsCommand),
    /// Manage files for AlphaWord and other applets.
    #[command(subcommand)]
    Files(FilesCommand),
}

#[derive(Debug, Subcommand)]
pub enum AppletsCommand {
    /// Get a list of installed applets.
    List,
    /// List settings of an applet. The call may return a different subset
    /// of settings on each run; the meaning of each flag is undocumented,
    /// but 0, 7, and 15 commonly give non-empty results.
    GetSettings {
        applet_id: u16,
        flag: Vec<u32>,
    },
    /// Update a setting. Use at your own risk — invalid settings may
    /// disrupt an applet or the device.
    SetSettings {
        applet_id: u16,
        ident: u16,
        value: Vec<String>,
    },
    /// Fetch an applet binary from the device. Applet id 0 fetches the
    /// firmware ROM.
    Fetch { applet_id: u16, path: PathBuf },
    /// Delete all applets from the device.
    RemoveAll,
    /// Experimental: delete one applet. Does not free its space.
    Remove { applet_id: u16 },
    /// Experimental: install an applet binary. Use at your own risk.
    Install {
        path: PathBuf,
        /// Skip the check for whether the applet is already installed.
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct FileNameFormat {
    /// Format for output file names, e.g. "{name}-{space}.txt".
    #[arg(short = 'f', long = "format")]
    pub format: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum FilesCommand {
    /// List files belonging to an applet (defaults to AlphaWord).
    List {
        #[arg(short, long)]
        applet_id: Option<u16>,
        /// Print all file attributes instead of just name/space/size.
        #[arg(short, long)]
        verbose: bool,
    },
    /// Read one file, printing it or writing it to `--path`.
    Read {
        #[arg(short, long)]
        applet_id: Option<u16>,
        file_name_or_space: String,
        #[arg(short, long)]
        path: Option<PathBuf>,
        #[command(flatten)]
        name_format: FileNameFormat,
    },
    /// Read every file belonging to an applet into a directory.
    ReadAll {
        #[arg(short, long)]
        applet_id: Option<u16>,
        #[arg(short, long)]
        path: PathBuf,
        #[command(flatten)]
        name_format: FileNameFormat,
    },
    /// Write a text file's contents, creating it if it does not exist.
    Write { path: PathBuf, file_name_or_space: String },
    /// Zero a file's allocation without deleting it.
    Clear {
        #[arg(short, long)]
        applet_id: Option<u16>,
        file_name_or_space: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("neotools").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn mode_with_no_flags_just_queries() {
        let cli = parse(&["mode"]);
        assert!(matches!(cli.command, Command::Mode { keyboard: false, comms: false }));
    }

    #[test]
    fn mode_rejects_both_flags_together() {
        assert!(Cli::try_parse_from(["neotools", "mode", "--keyboard", "--comms"]).is_err());
    }

    #[test]
    fn applets_get_settings_collects_variadic_flags() {
        let cli = parse(&["applets", "get-settings", "0", "7", "15"]);
        match cli.command {
            Command::Applets(AppletsCommand::GetSettings { applet_id, flag }) => {
                assert_eq!(applet_id, 0);
                assert_eq!(flag, vec![7, 15]);
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn applets_set_settings_collects_variadic_values() {
        let cli = parse(&["applets", "set-settings", "0", "16388", "10", "4", "59"]);
        match cli.command {
            Command::Applets(AppletsCommand::SetSettings { applet_id, ident, value }) => {
                assert_eq!(applet_id, 0);
                assert_eq!(ident, 16388);
                assert_eq!(value, vec!["10", "4", "59"]);
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn applets_install_force_flag() {
        let cli = parse(&["applets", "install", "applet.bin", "--force"]);
        match cli.command {
            Command::Applets(AppletsCommand::Install { path, force }) => {
                assert_eq!(path, PathBuf::from("applet.bin"));
                assert!(force);
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn files_read_defaults_applet_id_to_none() {
        let cli = parse(&["files", "read", "notes"]);
        match cli.command {
            Command::Files(FilesCommand::Read { applet_id, file_name_or_space, path, .. }) => {
                assert_eq!(applet_id, None);
                assert_eq!(file_name_or_space, "notes");
                assert_eq!(path, None);
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn files_write_requires_both_positionals() {
        assert!(Cli::try_parse_from(["neotools", "files", "write", "only_one_arg"]).is_err());
    }

    #[test]
    fn verbose_flag_is_global() {
        let cli = parse(&["--verbose", "info"]);
        assert!(cli.verbose);
    }
}
