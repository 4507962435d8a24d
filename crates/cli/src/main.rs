use anyhow::Result;
use clap::Parser;

use stockflow_cli::{demo, ApiClient, Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    stockflow_observability::init();

    let cli = Cli::parse();
    let mut client = ApiClient::new(&cli.server, cli.api_key.as_deref().unwrap_or_default())?;
    if let Some(ms) = cli.timeout_ms {
        client = client.with_timeout_ms(ms);
    }

    let output = match cli.cmd {
        Command::Call(op) => client.send(&op.api_call()).await?,
        Command::Demo => demo::run(&client).await?.to_json(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
