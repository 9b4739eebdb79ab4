//! Tweets Example
//!
//! Indexes a few documents through the bulk endpoint, then runs a search
//! with a terms aggregation against a live node.
//!
//! Run with: cargo run --example tweets [config.json]

use elasticlink_rs::{BulkCommand, Client, ClientConfig, ClientError, Document, Params};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("elasticlink_rs=debug,elasticlink_core=info")),
        )
        .with_target(false)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ClientConfig::load(&path)?,
        None => ClientConfig::default(),
    };
    let client = Client::from_config(&config)?;
    println!("Connected to {}\n", client.base_url());

    if !client.indices_exist(&["tweets"]).await? {
        client
            .create_index("tweets", Some(json!({"settings": {"number_of_shards": 1}})))
            .await?;
        println!("Created index 'tweets'");
    }

    let docs = vec![
        Document::new("tweets", "tweet")
            .with_id("1")
            .with_fields(json!({"user": "foo", "message": "hello", "age": 25})),
        Document::new("tweets", "tweet")
            .with_fields(json!({"user": "bar", "message": "world", "age": 30})),
        Document::new("tweets", "tweet")
            .with_id("stale")
            .with_command(BulkCommand::Delete),
    ];

    match client.bulk_send(&docs).await {
        Ok(response) => println!("Bulk: {} items in {}ms", response.items.len(), response.took),
        Err(ClientError::BulkItem {
            status, message, ..
        }) => println!("Bulk item failed ({status:?}): {message}"),
        Err(e) => return Err(e.into()),
    }

    client.refresh_index("tweets").await?;

    let query = json!({
        "query": {"match_all": {}},
        "aggs": {"user": {"terms": {"field": "user"}, "aggs": {"age": {"stats": {"field": "age"}}}}}
    });
    let response = client
        .search(query, &["tweets"], &[], Params::new())
        .await?;

    println!("\nSearch: {} hits", response.hits.total);
    for hit in &response.hits.hits {
        println!("   {} => {}", hit.id, serde_json::Value::Object(hit.source.clone()));
    }

    println!("\nUsers:");
    for bucket in response.aggregation("user").buckets() {
        println!(
            "   {} ({} docs, avg age {})",
            bucket.key(),
            bucket.doc_count()?,
            bucket.aggregation("age")["avg"]
        );
    }

    Ok(())
}
