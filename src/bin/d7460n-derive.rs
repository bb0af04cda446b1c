use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use d7460n::config::manifest::Manifest;
use d7460n::config::settings::Setting;
use d7460n::config::storage::JsonStorageAdapter;
use d7460n::config::{config_store_write, ConfigStore};
use d7460n::shared::types::Error;
use d7460n::Page;
use simple_logger::SimpleLogger;

/// Reads a page, injects data into its slots and prints the derived state of every element
#[derive(Debug, Parser)]
#[clap(name = "d7460n-derive", version = "0.1.0", author = "D7460N")]
struct Cli {
    /// The html file to read
    page: PathBuf,

    /// Layout manifest with slots and visibility rules (defaults to the built-in one)
    #[clap(short = 'm', long = "manifest")]
    manifest: Option<PathBuf>,

    /// Engine settings file (json), created when missing
    #[clap(short = 's', long = "settings")]
    settings: Option<PathBuf>,

    /// Overrides an engine setting, as key=typed value (inject.max_items=u:50). Written to the
    /// settings file when one is given. Can be repeated.
    #[clap(long = "set", value_parser = parse_setting)]
    set: Vec<(String, Setting)>,

    /// Injects a JSON payload into a slot, as slot=file.json. Can be repeated.
    #[clap(short = 'i', long = "inject", value_parser = parse_injection)]
    inject: Vec<(String, PathBuf)>,

    /// Enable debug logging
    #[clap(short = 'd', long = "debug")]
    debug: bool,
}

fn parse_injection(arg: &str) -> Result<(String, PathBuf), Error> {
    match arg.split_once('=') {
        Some((slot, path)) if !slot.is_empty() && !path.is_empty() => Ok((slot.to_owned(), PathBuf::from(path))),
        _ => Err(Error::Config(format!("expected slot=file.json, got '{arg}'"))),
    }
}

fn parse_setting(arg: &str) -> Result<(String, Setting), Error> {
    let Some((key, typed)) = arg.split_once('=').filter(|(key, _)| !key.is_empty()) else {
        return Err(Error::Config(format!("expected key=typed value, got '{arg}'")));
    };
    let setting = Setting::from_str(typed).map_err(|err| Error::Config(err.to_string()))?;
    Ok((key.to_owned(), setting))
}

/// Installs the settings file (if any) and applies the overrides on top of it
fn configure(store: &mut ConfigStore, settings: Option<&Path>, overrides: &[(String, Setting)]) -> Result<()> {
    if let Some(path) = settings {
        let adapter = JsonStorageAdapter::try_from(path).with_context(|| format!("reading {}", path.display()))?;
        store.set_storage(Box::new(adapter));
    }

    for (key, value) in overrides {
        store.set(key, value.clone())?;
    }
    Ok(())
}

/// Injects every payload file in order. A file that cannot be read stops the run as a data
/// injection failure; slots injected before it keep their new content.
fn inject_files(page: &Page, injections: &[(String, PathBuf)]) -> Result<()> {
    for (slot, path) in injections {
        match fs::read_to_string(path) {
            Ok(payload) => {
                page.inject_json(slot, &payload)?;
            }
            Err(err) => {
                return Err(page.injector().fail(slot, err).into());
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    if args.debug {
        SimpleLogger::new().init()?;
    }

    configure(&mut config_store_write(), args.settings.as_deref(), &args.set)?;

    let manifest = match &args.manifest {
        Some(path) => Manifest::from_path(path).with_context(|| format!("reading {}", path.display()))?,
        None => Manifest::builtin()?,
    };
    let page = Page::open(&args.page, &manifest).with_context(|| format!("loading {}", args.page.display()))?;

    inject_files(&page, &args.inject)?;

    print!("{}", page.describe());
    Ok(())
}
