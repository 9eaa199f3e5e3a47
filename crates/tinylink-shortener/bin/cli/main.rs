mod cli;

use crate::cli::{Command, GeneratorArg, StorageBackendArg, CLI};
use anyhow::Context;
use clap::Parser;
use std::time::Duration;
use tinylink_generator::{Generator, RandomGenerator, SeqGenerator, SeqSettings};
use tinylink_shortener::{
    ClickContext, ExpirationPolicy, Metadata, ShortCode, ShortenParams, Shortener, ShortenerService,
};
use tinylink_storage::{FileStorage, InMemoryStorage, MySqlStorage, Storage};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.log_json);

    info!(
        storage_backend = %config.storage,
        generator = %config.generator,
        "starting tinylink"
    );

    let generator = build_generator(&config)?;

    match config.storage {
        StorageBackendArg::InMemory => run(&config, InMemoryStorage::new(), generator).await,
        StorageBackendArg::File => {
            let storage = FileStorage::open(&config.data_dir)
                .await
                .with_context(|| format!("cannot open {}", config.data_dir.display()))?;
            run(&config, storage, generator).await
        }
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let storage = MySqlStorage::connect(mysql_dsn).await?;
            run(&config, storage, generator).await
        }
    }
}

/// Logs go to stderr so command output stays pipeable.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn build_generator(config: &CLI) -> anyhow::Result<Box<dyn Generator>> {
    let generator: Box<dyn Generator> = match config.generator {
        GeneratorArg::Random => Box::new(RandomGenerator::with_length(config.code_length)?),
        GeneratorArg::Sequential => {
            let settings = SeqSettings::builder()
                .prefix(config.generator_prefix.clone())
                .padding(config.generator_padding)
                .start(config.generator_start)
                .build();
            Box::new(SeqGenerator::new(settings)?)
        }
    };
    Ok(generator)
}

async fn run<S: Storage>(
    config: &CLI,
    storage: S,
    generator: Box<dyn Generator>,
) -> anyhow::Result<()> {
    let service = ShortenerService::new(storage, generator);

    match &config.command {
        Command::Shorten {
            url,
            expires_in,
            metadata,
            normalize,
        } => {
            let url = if *normalize {
                service.validator().normalize(url)
            } else {
                url.clone()
            };
            let expiration = match expires_in {
                Some(secs) => ExpirationPolicy::AfterDuration(Duration::from_secs(*secs)),
                None => ExpirationPolicy::Never,
            };
            let params = ShortenParams::builder()
                .original_url(url)
                .expiration(expiration)
                .metadata(metadata.iter().cloned().collect())
                .build();

            let code = service.shorten(params).await?;
            match &config.base_url {
                Some(base_url) => println!("{}", code.to_url(base_url)),
                None => println!("{code}"),
            }
        }
        Command::Expand {
            code,
            no_track,
            ip,
            user_agent,
            referrer,
        } => {
            let code = ShortCode::new(code.as_str())?;
            let tracking = (!*no_track).then(|| ClickContext {
                ip_address: ip.clone(),
                user_agent: user_agent.clone(),
                referrer: referrer.clone(),
                additional_data: Metadata::new(),
            });
            println!("{}", service.expand(&code, tracking).await?);
        }
        Command::Info { code } => {
            let record = service.url_record(&ShortCode::new(code.as_str())?).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Stats { code } => {
            let analytics = service.analytics(&ShortCode::new(code.as_str())?).await?;
            println!("{}", serde_json::to_string_pretty(&analytics)?);
        }
        Command::SetMeta { code, metadata } => {
            let code = ShortCode::new(code.as_str())?;
            let record = service
                .update_metadata(&code, metadata.iter().cloned().collect())
                .await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Delete { code } => {
            if !service.delete(&ShortCode::new(code.as_str())?).await? {
                anyhow::bail!("short code '{code}' not found");
            }
            println!("deleted {code}");
        }
        Command::Normalize { url } => {
            println!("{}", service.validator().normalize(url));
        }
    }

    Ok(())
}
