use anyhow::Context;
use clap::{Parser, Subcommand};
use opserver_engine::config::{ConfigLoader, OpserverConfig};
use opserver_engine::countries::{self, CountryDirectory, HttpCountrySource};
use opserver_engine::settings::PlayerSettings;
use opserver_engine::{AvatarView, CandidateBuilder, HttpImageLoader, normalize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "opserver", version, about = "OPSERVER avatar and directory tools")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file (defaults to ./opserver.yaml, then ~/.opserver/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite a legacy Steam avatar URL onto the current CDN
    Normalize { url: String },
    /// List the URLs that would be probed for an avatar, in order
    Candidates { url: String },
    /// Probe an avatar and print the resulting render state as JSON
    Resolve {
        url: Option<String>,
        /// Name used for the fallback glyph
        #[arg(long)]
        label: Option<String>,
        /// Origin for same-origin proxy candidates (overrides config)
        #[arg(long)]
        origin: Option<String>,
    },
    /// Look up a country name and flag by two-letter code
    Country { code: String },
    /// Apply a JSON merge patch to a player settings document
    MergeSettings {
        /// Current settings document (JSON)
        base: String,
        /// Patch to apply (JSON object)
        patch: String,
    },
}

async fn load_config(path: Option<&PathBuf>) -> anyhow::Result<OpserverConfig> {
    let config = match path {
        Some(path) => ConfigLoader::load_from(path).await?,
        None => ConfigLoader::load_default().await?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries command output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = load_config(args.config.as_ref()).await?;

    match args.command {
        Command::Normalize { url } => println!("{}", normalize(&url)),

        Command::Candidates { url } => {
            let builder = CandidateBuilder::new(config.sources);
            for candidate in builder.build(Some(&url)) {
                println!("{}\t{}", candidate.strategy, candidate.url);
            }
        }

        Command::Resolve { url, label, origin } => {
            if origin.is_some() {
                config.sources.origin = origin;
            }
            let loader = match config.sources.origin.as_deref() {
                Some(origin) => HttpImageLoader::with_origin(origin)?,
                None => HttpImageLoader::new(),
            };

            let mut view = AvatarView::from_config(&config, Arc::new(loader));
            view.mount(url.as_deref(), label.as_deref());
            let state = view.settled().await;
            info!("Avatar settled");
            println!("{}", serde_json::to_string_pretty(&state)?);
        }

        Command::Country { code } => {
            let source = HttpCountrySource::from_config(&config.countries);
            let name = CountryDirectory::global()
                .name_for(&source, &code)
                .await?
                .with_context(|| format!("Unknown country code '{}'", code))?;
            match countries::flag_url(&config.countries, &code) {
                Some(flag) => println!("{}\t{}", name, flag),
                None => println!("{}", name),
            }
        }

        Command::MergeSettings { base, patch } => {
            let base = serde_json::from_str(&base).context("Invalid settings document")?;
            let patch: serde_json::Value =
                serde_json::from_str(&patch).context("Invalid settings patch")?;
            let mut settings = PlayerSettings::from_value(base)?;
            settings.apply(&patch)?;
            println!("{}", serde_json::to_string_pretty(&settings.to_value())?);
        }
    }

    Ok(())
}
