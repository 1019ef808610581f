// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use oxitheme::{
    config::Settings,
    install::{select_theme, Git2Synchronizer, IndicatifSink, Installer, SilentSink},
    path::{
        default_registry_mirror_dir, default_settings_file, default_state_dir,
        default_theme_store_dir,
    },
    registry::Registry,
    script,
    theme::{
        fetch::{HttpTransport, ManifestFetcher},
        manifest::{Manifest, MANIFEST_FILE},
        resolve::ThemeResolver,
        Hook, ThemeRecord, ThemeSelector,
    },
};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use std::{fs, path::PathBuf, process::exit};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  oxitheme [options] <oxitheme-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    async fn run(self) -> Result<()> {
        match self.command {
            Command::Install(opts) => run_install(opts).await,
            Command::Uninstall(opts) => run_uninstall(opts),
            Command::List(opts) => run_list(opts).await,
            Command::Apply(opts) => run_apply(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Install a theme, or update it if it is already installed.
    #[command(override_usage = "oxitheme install [options] [<theme>]")]
    Install(InstallOptions),

    /// Uninstall a theme from the theme store.
    #[command(override_usage = "oxitheme uninstall [options] <theme>")]
    Uninstall(UninstallOptions),

    /// List every theme the registry knows about.
    #[command(override_usage = "oxitheme list [options]")]
    List(ListOptions),

    /// Apply an installed theme by running its component load hooks.
    #[command(override_usage = "oxitheme apply [options] <theme>")]
    Apply(ApplyOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct InstallOptions {
    /// Theme name, or a git remote given as "git+<url>". Prompts for a
    /// selection when omitted.
    #[arg(value_name = "theme")]
    pub theme: Option<String>,

    /// Register an existing local directory instead of cloning.
    #[arg(short, long)]
    pub local: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct UninstallOptions {
    /// Name of theme to remove from the theme store.
    #[arg(required = true, value_name = "theme")]
    pub theme: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ListOptions {
    /// List only installed themes.
    #[arg(short, long)]
    pub installed: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ApplyOptions {
    /// Name of installed theme to apply.
    #[arg(required = true, value_name = "theme")]
    pub theme: String,
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run().await {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

async fn run() -> Result<()> {
    Cli::parse().run().await
}

fn load_settings() -> Result<Settings> {
    let path = default_settings_file()?;
    match fs::read_to_string(&path) {
        Ok(document) => document
            .parse()
            .with_context(|| format!("failed to parse settings at {:?}", path.display())),
        Err(_) => Ok(Settings::default()),
    }
}

fn theme_store_dir(settings: &Settings) -> Result<PathBuf> {
    match &settings.theme_dir {
        Some(path) => Ok(path.clone()),
        None => Ok(default_theme_store_dir()?),
    }
}

fn installer(settings: &Settings) -> Result<Installer> {
    Ok(Installer::new(
        theme_store_dir(settings)?,
        default_state_dir()?,
        Git2Synchronizer::new(),
    ))
}

fn registry(settings: &Settings) -> Result<Registry<HttpTransport, Git2Synchronizer>> {
    let fetcher = ManifestFetcher::new(HttpTransport::new(), settings.fallback_branch.clone());
    let resolver = ThemeResolver::new(fetcher, settings.fetch_limit);
    Ok(Registry::new(
        settings,
        default_registry_mirror_dir()?,
        resolver,
        Git2Synchronizer::new(),
    ))
}

async fn run_install(opts: InstallOptions) -> Result<()> {
    let settings = load_settings()?;
    let installer = installer(&settings)?;

    if opts.local {
        let path = opts
            .theme
            .ok_or_else(|| anyhow!("--local needs a path to a theme directory"))?;
        let state = installer.register_local(&PathBuf::from(path))?;
        info!(
            "registered local theme at {:?} ({})",
            state.local_path.display(),
            short_revision(&state.last_synced_revision)
        );
        return Ok(());
    }

    let (selector, candidates) = match opts.theme.as_deref().map(ThemeSelector::parse) {
        Some(selector @ ThemeSelector::ByGitUrl(_)) => (selector, Vec::new()),
        Some(selector) => {
            let themes = registry(&settings)?.list_themes(&SilentSink).await?;
            (selector, themes)
        }
        None => {
            let themes = registry(&settings)?.list_themes(&SilentSink).await?;
            print_theme_listing(&themes);
            let chosen = select_theme(&themes)?.clone();
            (ThemeSelector::ByRecord(Box::new(chosen)), themes)
        }
    };

    let sink = IndicatifSink::new(ProgressBar::no_length())?;
    let state = installer.install(&selector, &candidates, &sink)?;
    info!(
        "installed to {:?} ({})",
        state.local_path.display(),
        short_revision(&state.last_synced_revision)
    );

    Ok(())
}

fn run_uninstall(opts: UninstallOptions) -> Result<()> {
    let settings = load_settings()?;
    let installer = installer(&settings)?;
    installer.uninstall(&opts.theme)?;
    info!("uninstalled \"{}\"", opts.theme);

    Ok(())
}

async fn run_list(opts: ListOptions) -> Result<()> {
    let settings = load_settings()?;

    if opts.installed {
        let installer = installer(&settings)?;
        let states = installer.installed_themes()?;
        if states.is_empty() {
            println!("no themes installed");
            return Ok(());
        }

        for state in states {
            println!(
                "{}  {}  {}",
                state.local_path.display(),
                short_revision(&state.last_synced_revision),
                state.source_ref
            );
        }
        return Ok(());
    }

    let sink = IndicatifSink::new(ProgressBar::no_length())?;
    let themes = registry(&settings)?.list_themes(&sink).await?;
    print_theme_listing(&themes);

    Ok(())
}

fn run_apply(opts: ApplyOptions) -> Result<()> {
    let settings = load_settings()?;
    let installer = installer(&settings)?;
    let root = installer.installed_path(&opts.theme)?;

    let document = fs::read_to_string(root.join(MANIFEST_FILE))
        .with_context(|| format!("no manifest in installed theme at {:?}", root.display()))?;
    let manifest = Manifest::parse(&document, None)?;

    let mut failures = 0;
    for component in manifest.components.values() {
        match script::run_hook(&root, component, Hook::Load) {
            Ok(Some(0)) => info!("component \"{}\" loaded", component.name),
            Ok(Some(code)) => {
                warn!("component \"{}\" load hook exited {code}", component.name);
                failures += 1;
            }
            Ok(None) => {}
            Err(error) => {
                warn!("{error}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(anyhow!("{failures} component hook(s) failed"));
    }

    info!("applied \"{}\"", opts.theme);
    Ok(())
}

fn print_theme_listing(themes: &[ThemeRecord]) {
    if themes.is_empty() {
        println!("no themes available");
        return;
    }

    for (index, theme) in themes.iter().enumerate() {
        let author = theme.author.as_deref().unwrap_or("unknown author");
        match &theme.description {
            Some(description) => {
                println!("{:>3}. {} ({author}) - {description}", index + 1, theme.name)
            }
            None => println!("{:>3}. {} ({author})", index + 1, theme.name),
        }
        print_subthemes(theme, 1);

        for warning in &theme.warnings {
            warn!("{}: {warning}", theme.name);
        }
    }
}

fn print_subthemes(theme: &ThemeRecord, depth: usize) {
    for subtheme in &theme.subthemes {
        println!("{:indent$}* {}", "", subtheme.name, indent = depth * 2 + 4);
        print_subthemes(subtheme, depth + 1);
    }
}

fn short_revision(revision: &str) -> &str {
    revision.get(..7).unwrap_or(revision)
}
