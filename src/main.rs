#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = toeic_practice_api::run().await {
        eprintln!("toeic-practice-api fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
