use anyhow::Result;
use askme::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
