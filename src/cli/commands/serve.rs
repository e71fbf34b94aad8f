//! Serve Command
//!
//! Run the HTTP API until Ctrl-C.

use crate::cli::CommandContext;
use crate::server;
use crate::types::Result;

pub async fn run(ctx: &CommandContext, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = ctx.config.clone();
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    if config.auth.secret().is_none() {
        ctx.output
            .warning("No JWT secret configured; authenticated routes will answer 500");
    }

    ctx.output
        .info(&format!("Serving on http://{}", config.server.bind_address()));
    server::serve(&config).await
}
