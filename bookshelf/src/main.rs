use miette::{IntoDiagnostic, WrapErr};
use tracing::debug;

use bookshelf::Config;
use bookshelf::cli::{self, Opts};
use googlebooks::{Client, ClientConfig};

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Parse command-line arguments
    let opts: Opts = argh::from_env();

    let config = Config::load(&opts.config)?;
    let provider = bookshelf::tracing::try_init(&config.tracing, opts.log_format)?;

    debug!(?config, "loaded config");

    let client = Client::new(ClientConfig::from(&config))
        .into_diagnostic()
        .wrap_err("could not create book client")?;
    let result = cli::run(&client, opts.command).await;

    bookshelf::tracing::shutdown(provider);

    result
}
