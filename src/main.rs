// Binary entry point for xchain-router
// Loads configuration, wires the route context and operator, and runs one
// command against the configured endpoints

use anyhow::{anyhow, bail, Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use xchain_router::config::AppConfig;
use xchain_router::context::RouteContext;
use xchain_router::router::Operator;
use xchain_router::types::ChainId;

const USAGE: &str = "usage:
  xchain-router classify <chain> <tx>
  xchain-router routes <source-token> <dest-token> <amount> <source-chain> <dest-chain>";

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().context("initialize tracing subscriber")?;

    if let Err(err) = run(std::env::args().skip(1).collect()).await {
        tracing::error!(error = ?err, "fatal router error");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(args: Vec<String>) -> Result<()> {
    let config = AppConfig::load().context("load configuration from environment")?;
    let ctx = Arc::new(RouteContext::from_config(&config).context("build route context")?);
    let operator = Operator::new(ctx).with_enabled_routes(config.enabled_routes());

    info!(
        attestation = %config.attestation_api,
        chains = config.chains.len(),
        routes = ?operator.enabled_routes(),
        "xchain router online"
    );

    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match args.as_slice() {
        ["classify", chain, tx] => {
            let chain = parse_chain(chain)?;
            let route = operator.get_route_from_tx(tx, chain).await?;
            println!("{route}");
        }
        ["routes", source_token, dest_token, amount, source, dest] => {
            let amount: f64 = amount
                .parse()
                .with_context(|| format!("parse amount {amount}"))?;
            let routes = operator
                .available_routes(
                    source_token,
                    dest_token,
                    amount,
                    parse_chain(source)?,
                    parse_chain(dest)?,
                )
                .await;
            println!("{}", serde_json::to_string(&routes)?);
        }
        _ => bail!("{USAGE}"),
    }
    Ok(())
}

fn parse_chain(raw: &str) -> Result<ChainId> {
    raw.parse::<ChainId>().map_err(|e| anyhow!(e))
}

fn init_tracing() -> Result<()> {
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hyper=warn,reqwest=warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("tracing subscriber init: {err}"))
}
