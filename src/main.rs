use anyhow::Context;
use clap::Parser;
use tracing::{Instrument, error, info};

use vice_file_transfers::config::Config;
use vice_file_transfers::{logging, server};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let config = Config::parse();

    let span = logging::service_span(&config.invocation_id);
    async move {
        let porklock = config.validate().map_err(|err| {
            error!(error = %err, "startup check failed");
            err
        })?;
        info!(porklock = %porklock.display(), "server started");

        server::run(config)
            .await
            .context("HTTP server exited with an error")
    }
    .instrument(span)
    .await
}
