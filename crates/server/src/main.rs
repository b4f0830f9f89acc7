#[tokio::main]
async fn main() -> anyhow::Result<()> {
    receiptql_server::start().await
}
