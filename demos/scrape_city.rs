use city_events_service::{EventScraper, ScraperConfig};

#[tokio::main]
async fn main() {
    // ログ設定
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let city = std::env::args().nth(1).unwrap_or_else(|| "Mumbai".to_string());

    // HEADLESS=false で表示モード
    let config = ScraperConfig::from_env();
    let scraper = EventScraper::new(config);

    println!("=== City Events Scraper: {} ===", city);
    println!("URL: {}", scraper.listing_url(&city));

    match scraper.run_scrape(&city).await {
        Ok(result) => {
            println!("成功! {}件 (破棄 {}件)", result.events.len(), result.rejected);
            match serde_json::to_string_pretty(&result.events) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("JSON変換エラー: {}", e),
            }
        }
        Err(e) => {
            eprintln!("エラー: {}", e);
        }
    }
}
