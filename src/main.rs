#[tokio::main]
async fn main() -> anyhow::Result<()> {
    phrasebook::app::run().await
}
