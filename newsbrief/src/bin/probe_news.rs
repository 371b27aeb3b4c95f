use newsbrief::news::duckduckgo::DuckDuckGoNews;
use newsbrief::news::{render_items_block, NewsProvider, DEFAULT_MAX_RESULTS};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    let topics: Vec<String> = std::env::args().skip(1).collect();
    let topics = if topics.is_empty() {
        vec!["rust programming language".to_string()]
    } else {
        topics
    };

    let base_url = std::env::var("NEWS_BASE_URL")
        .unwrap_or_else(|_| common::DEFAULT_NEWS_BASE_URL.to_string());
    let provider = DuckDuckGoNews::new(&base_url);

    for topic in topics {
        println!("\n{}", "=".repeat(60));
        println!("Topic: {}", topic);
        println!("{}", "=".repeat(60));

        match provider.fetch(&topic, DEFAULT_MAX_RESULTS).await {
            Ok(items) if items.is_empty() => println!("✓ No items in the past day"),
            Ok(items) => {
                println!("✓ {} items", items.len());
                println!("{}", render_items_block(&items));
            }
            Err(e) => println!("✗ Failed: {}", e),
        }
    }
}
