//! Command-line tool for encoding metrics into, and decoding metrics from, the protometric binary format.

#![deny(warnings)]
#![deny(missing_docs)]

use std::path::Path;

use anyhow::Context as _;
use clap::Parser as _;
use protometric_config::{ConfigurationLoader, GenericConfiguration};
use protometric_io::serializer::{ProtobufSerializer, SerializerConfiguration};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod cli;
use self::cli::{Action, Cli};

mod commands;

fn main() {
    let cli = Cli::parse();

    // Standard output may carry binary data, so logs always go to standard error.
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(cli.log_level().into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    match run(cli) {
        Ok(()) => debug!("protometric stopped."),
        Err(e) => {
            error!("{:?}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_configuration(cli.config.as_deref())?;
    let serializer_config =
        SerializerConfiguration::from_configuration(&config).context("failed to load serializer configuration")?;
    let serializer = ProtobufSerializer::from_configuration(&serializer_config);

    match cli.action {
        Action::Encode(args) => {
            let input = commands::open_input(args.input.as_deref())?;
            let output = commands::open_output(args.output.as_deref())?;

            let metrics_len = commands::encode(&serializer, input, output)?;
            info!(metrics_len, prepend_length = serializer.prepend_length(), "Encoded metrics.");
        }
        Action::Decode(args) => {
            let input = commands::open_input(args.input.as_deref())?;
            let output = std::io::stdout().lock();

            let metrics_len = commands::decode(&serializer, input, output)?;
            info!(metrics_len, prepend_length = serializer.prepend_length(), "Decoded metrics.");
        }
    }

    Ok(())
}

fn load_configuration(path: Option<&Path>) -> anyhow::Result<GenericConfiguration> {
    let mut loader = ConfigurationLoader::default();
    if let Some(path) = path {
        loader = loader.from_file(path)?;
    }

    let loader = loader.from_environment("PROTOMETRIC")?;
    Ok(loader.into_generic())
}
