#[tokio::main]
async fn main() -> anyhow::Result<()> {
    movie_scrape_lib::run().await
}
