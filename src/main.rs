use std::sync::Arc;

use color_eyre::Result;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use postfeed::adapters::ReqwestHttpClient;
use postfeed::api::PostsApiClient;
use postfeed::config::Config;
use postfeed::events::PostsNews;
use postfeed::feed::PostsFeed;
use postfeed::store::PostStore;

/// Demo driver: load the first page, wait for the joined snapshot and
/// print it. Stands in for the presentation layer.
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();
    info!(base_url = %config.base_url, page_size = config.page_size, "starting feed");

    let http = Arc::new(ReqwestHttpClient::new());
    let api = PostsApiClient::with_base_url(http, &config.base_url);
    let store = Arc::new(PostStore::new());
    let feed = PostsFeed::new(api, store, config.page_size);

    let mut joined_rx = feed.joined_posts();
    let mut news_rx = feed.subscribe_news();

    feed.activate();

    // Drain news until the first non-empty joined snapshot lands.
    let wait = async {
        loop {
            tokio::select! {
                changed = joined_rx.changed() => {
                    changed?;
                    if !joined_rx.borrow().is_empty() {
                        break;
                    }
                }
                news = news_rx.recv() => {
                    match news {
                        Ok(PostsNews::ErrorState(message)) => warn!(%message, "feed error"),
                        Ok(other) => info!(?other, "feed news"),
                        Err(RecvError::Lagged(skipped)) => warn!(skipped, "missed news events"),
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        }
        Ok::<_, color_eyre::Report>(())
    };
    tokio::time::timeout(std::time::Duration::from_secs(30), wait).await??;

    for joined in joined_rx.borrow().iter() {
        let marker = if joined.favorite { "*" } else { " " };
        println!(
            "{} #{:<3} {} by {} ({} comments)",
            marker,
            joined.id,
            joined.title,
            joined.author.name,
            joined.comments.len()
        );
    }

    Ok(())
}
