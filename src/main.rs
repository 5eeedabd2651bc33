use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio::io::AsyncReadExt;

use validate_dasta::{
    Cli, Config, Diagnostics, HttpClient, HttpClientConfig, HttpVersionTable, LibXml2Engine,
    SourceLocator, ValidationCoordinator, ValidationOutcome, VersionTableClient,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::from_cli(&cli);
    let diag = Diagnostics::new(config.verbosity);

    match run(&config, &diag).await {
        Ok(outcome) => {
            diag.verdict(&outcome);
            ExitCode::from(outcome.exit_code() as u8)
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(config: &Config, diag: &Diagnostics) -> anyhow::Result<ValidationOutcome> {
    let bytes = read_source(&config.src).await?;

    let http = HttpClient::new(HttpClientConfig {
        timeout_seconds: config.timeout_seconds,
        ..HttpClientConfig::default()
    })?;

    let locator = SourceLocator::new(
        config.schema_file.clone(),
        config.schema_dir.clone(),
        config.schema_url.clone(),
        http.clone(),
    );
    let versions = VersionTableClient::new(Box::new(HttpVersionTable::new(
        http,
        config.table_url.clone(),
    )));
    let coordinator = ValidationCoordinator::new(
        locator,
        versions,
        Box::new(LibXml2Engine::new()),
        config.style,
    );

    let outcome = coordinator.run(bytes, diag).await?;
    Ok(outcome)
}

async fn read_source(src: &Path) -> anyhow::Result<Vec<u8>> {
    if src == Path::new("-") {
        let mut bytes = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut bytes)
            .await
            .context("reading standard input")?;
        Ok(bytes)
    } else {
        tokio::fs::read(src)
            .await
            .with_context(|| format!("reading {}", src.display()))
    }
}
