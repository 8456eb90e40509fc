mod cli;

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{AppletsCommand, Cli, Command, FileNameFormat, FilesCommand};
use neotools_device::{Device, Mode};

const DEFAULT_APPLET_ID: u16 = neotools_protocol::applet_id::ALPHAWORD;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_new(filter).unwrap())
        .init();

    match cli.command {
        Command::Mode { keyboard, comms } => run_mode(keyboard, comms),
        Command::Info => run_info(),
        Command::Applets(cmd) => run_applets(cmd),
        Command::Files(cmd) => run_files(cmd),
    }
}

fn run_mode(keyboard: bool, comms: bool) -> Result<()> {
    if comms {
        let device = Device::connect(true).context("flipping device to comms mode")?;
        device.suppress_release();
        return Ok(());
    }
    let device = Device::connect(false).context("connecting to device")?;
    if keyboard {
        if device.mode() == Mode::Comms {
            device.flip_to_keyboard_mode().context("flipping device to keyboard mode")?;
        }
        return Ok(());
    }
    let mode = match device.mode() {
        Mode::Keyboard => "keyboard",
        Mode::Comms => "comms",
        Mode::Unknown => "unknown",
    };
    println!("{mode}");
    Ok(())
}

fn run_info() -> Result<()> {
    let device = Device::connect(true).context("connecting to device")?;
    let info = device.system_info().context("retrieving system information")?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

fn run_applets(cmd: AppletsCommand) -> Result<()> {
    let device = Device::connect(true).context("connecting to device")?;
    match cmd {
        AppletsCommand::List => {
            let applets = device.list_applets().context("listing applets")?;
            println!("{}", serde_json::to_string_pretty(&applets)?);
        }
        AppletsCommand::GetSettings { applet_id, flag } => {
            let settings = device
                .read_settings_rendered(applet_id, &flag)
                .context("reading applet settings")?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        AppletsCommand::SetSettings { applet_id, ident, value } => {
            device
                .write_settings_item(applet_id, ident, &value)
                .context("writing applet setting")?;
        }
        AppletsCommand::Fetch { applet_id, path } => {
            let content = device.fetch_applet(applet_id).context("fetching applet")?;
            fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
        }
        AppletsCommand::RemoveAll => {
            confirm("Are you sure you want to remove all applets?")?;
            device.remove_applets().context("removing all applets")?;
        }
        AppletsCommand::Remove { applet_id } => {
            confirm(
                "Are you sure you want to remove applet? It will not free up the space and is meant only for development.",
            )?;
            device.remove_applet(applet_id).context("removing applet")?;
        }
        AppletsCommand::Install { path, force } => {
            confirm("Are you sure you want to install an applet? This is an experimental feature.")?;
            let content = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            device.install_applet(&content, force).context("installing applet")?;
        }
    }
    Ok(())
}

fn run_files(cmd: FilesCommand) -> Result<()> {
    let device = Device::connect(true).context("connecting to device")?;
    match cmd {
        FilesCommand::List { applet_id, verbose } => {
            let applet_id = applet_id.unwrap_or(DEFAULT_APPLET_ID);
            let files = device.list_files(applet_id).context("listing files")?;
            if verbose {
                println!("{}", serde_json::to_string_pretty(&files)?);
            } else {
                let summary: Vec<_> = files
                    .iter()
                    .map(|f| serde_json::json!({"name": f.name, "space": f.space, "alloc_size": f.alloc_size}))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
        }
        FilesCommand::Read { applet_id, file_name_or_space, path, name_format } => {
            let applet_id = applet_id.unwrap_or(DEFAULT_APPLET_ID);
            let attrs = device
                .get_file_by_name_or_space(applet_id, &file_name_or_space)
                .context("looking up file")?
                .with_context(|| format!("text file with name or space {file_name_or_space} does not exist"))?;
            let text = device.read_text_file(applet_id, &attrs).context("reading file")?;
            match path {
                Some(dir) => write_with_format(&dir, &attrs, &text, &name_format)?,
                None => println!("{text}"),
            }
        }
        FilesCommand::ReadAll { applet_id, path, name_format } => {
            let applet_id = applet_id.unwrap_or(DEFAULT_APPLET_ID);
            let files = device.list_files(applet_id).context("listing files")?;
            for attrs in files {
                let text = device.read_text_file(applet_id, &attrs).context("reading file")?;
                if !text.is_empty() {
                    write_with_format(&path, &attrs, &text, &name_format)?;
                }
            }
        }
        FilesCommand::Write { path, file_name_or_space } => {
            let text = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
            device.write_text_file(&file_name_or_space, &text).context("writing file")?;
        }
        FilesCommand::Clear { applet_id, file_name_or_space } => {
            let applet_id = applet_id.unwrap_or(DEFAULT_APPLET_ID);
            let attrs = device
                .get_file_by_name_or_space(applet_id, &file_name_or_space)
                .context("looking up file")?
                .context("file not found")?;
            device.clear_file(applet_id, attrs.file_index).context("clearing file")?;
        }
    }
    Ok(())
}

fn write_with_format(
    dir: &Path,
    attrs: &neotools_device::FileAttributes,
    text: &str,
    name_format: &FileNameFormat,
) -> Result<()> {
    let format = name_format.format.as_deref().unwrap_or("{name}.txt");
    let file_name = format
        .replace("{name}", &attrs.name)
        .replace("{space}", &attrs.space.to_string());
    let file_path = dir.join(file_name);
    fs::write(&file_path, text).with_context(|| format!("writing {}", file_path.display()))?;
    Ok(())
}

fn confirm(prompt: &str) -> Result<()> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush().ok();
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer).context("reading confirmation")?;
    if !matches!(answer.trim(), "y" | "Y" | "yes") {
        bail!("aborted");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use neotools_device::FileAttributes;

    #[test]
    fn write_with_format_substitutes_name_and_space() {
        let dir = tempfile::tempdir().unwrap();
        let attrs = FileAttributes::new(1, "My Notes", 3, "", 0, 0, 0);
        let name_format = FileNameFormat { format: Some("{name}-{space}.txt".to_string()) };

        write_with_format(dir.path(), &attrs, "hello", &name_format).unwrap();

        let written = fs::read_to_string(dir.path().join("My Notes-3.txt")).unwrap();
        assert_eq!(written, "hello");
    }

    #[test]
    fn write_with_format_defaults_to_name_dot_txt() {
        let dir = tempfile::tempdir().unwrap();
        let attrs = FileAttributes::new(1, "journal", 0, "", 0, 0, 0);
        let name_format = FileNameFormat { format: None };

        write_with_format(dir.path(), &attrs, "text", &name_format).unwrap();

        assert!(dir.path().join("journal.txt").exists());
    }
}
