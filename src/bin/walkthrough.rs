//! Walk through every store operation against a data directory
//!
//! Usage: `versakv-walkthrough [DATA_DIR]` (default `./versakv-data`).
//! Set `RUST_LOG=versakv=debug` to see backend logging.

use std::path::PathBuf;

use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;
use versakv::{Content, DataItem, DataItemStore, NamespaceMostRecentID, Page, Result, SqliteStore};

fn content(value: serde_json::Value) -> Content {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Content::new(),
    }
}

fn print_items(label: &str, items: &[DataItem]) {
    println!("{} ({} items)", label, items.len());
    for item in items {
        println!(
            "  id={} {}/{} v{} at {} {}",
            item.id,
            item.namespace,
            item.key,
            item.version,
            item.event_time,
            serde_json::Value::Object(item.content.clone())
        );
    }
}

fn print_namespaces(label: &str, namespaces: &[NamespaceMostRecentID]) {
    println!("{} ({} namespaces)", label, namespaces.len());
    for ns in namespaces {
        println!("  {} most_recent_id={}", ns.namespace, ns.most_recent_id);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./versakv-data"));
    info!(dir = %dir.display(), "Opening store");
    let store = SqliteStore::open_dir(&dir)?;

    println!("store");
    let first = store.store("n", "k", content(json!({"author": "a", "foo": "bar"})))?;
    let second = store.store("n", "k", content(json!({"author": "a", "foo": "baz"})))?;
    print_items("  stored", &[first, second]);

    print_items("history_of", &store.history_of("n", "k")?);

    let page = Page::first(1);
    let newest = store.list_items("n", "k", page)?;
    print_items("list_items", &newest);
    if let Some(next) = page.following(&newest) {
        print_items("list_items (next page)", &store.list_items("n", "k", next)?);
    }

    let by_author = store.list_by_author("n", "k", "a", page)?;
    print_items("list_by_author", &by_author);
    if let Some(next) = page.following(&by_author) {
        print_items(
            "list_by_author (next page)",
            &store.list_by_author("n", "k", "a", next)?,
        );
    }

    let page = Page::first(5);
    let namespaces = store.list_namespaces(page)?;
    print_namespaces("list_namespaces", &namespaces);
    if let Some(next) = page.following(&namespaces) {
        print_namespaces("list_namespaces (next page)", &store.list_namespaces(next)?);
    }

    Ok(())
}
