//! Random workloads replayed on both backends
//!
//! Ids differ between backends (they embed wall-clock time), so listings are
//! compared by what each entry is: pair, version and content.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use versakv::{Content, DataItem, DataItemStore, Keyed, NamespaceMostRecentID, Page};

const NAMESPACES: [&str; 4] = ["alpha", "beta", "gamma", "delta"];
const KEYS: [&str; 3] = ["k1", "k2", "k3"];
const AUTHORS: [&str; 3] = ["ann", "bob", "cy"];

type Summary = (String, String, u64, Content);

fn summarize(items: Vec<DataItem>) -> Vec<Summary> {
    items
        .into_iter()
        .map(|i| (i.namespace, i.key, i.version, i.content))
        .collect()
}

fn walk<T: Keyed>(page_size: usize, mut fetch: impl FnMut(Page) -> Vec<T>) -> Vec<T> {
    let mut all = Vec::new();
    let mut page = Page::first(page_size);
    loop {
        let entries = fetch(page);
        let next = page.following(&entries);
        all.extend(entries);
        match next {
            Some(next) => page = next,
            None => return all,
        }
    }
}

fn random_content(rng: &mut StdRng, seq: usize) -> Content {
    let mut content = Content::new();
    content.insert("seq".into(), json!(seq));
    match rng.gen_range(0..4) {
        0 => {}
        1 => {
            content.insert("author".into(), json!(rng.gen_range(0..3)));
        }
        _ => {
            let author = AUTHORS[rng.gen_range(0..AUTHORS.len())];
            content.insert("author".into(), json!(author));
        }
    }
    content
}

fn replay(seed: u64, stores: &[&dyn DataItemStore]) {
    let mut rng = StdRng::seed_from_u64(seed);
    for seq in 0..150 {
        let ns = NAMESPACES[rng.gen_range(0..NAMESPACES.len())];
        let key = KEYS[rng.gen_range(0..KEYS.len())];
        let content = random_content(&mut rng, seq);
        let versions: Vec<u64> = stores
            .iter()
            .map(|s| s.store(ns, key, content.clone()).unwrap().version)
            .collect();
        assert!(versions.windows(2).all(|w| w[0] == w[1]));
    }
}

fn namespace_names(entries: Vec<NamespaceMostRecentID>) -> Vec<String> {
    entries.into_iter().map(|n| n.namespace).collect()
}

#[test]
fn test_backends_agree_on_random_workloads() {
    for seed in [1, 7, 42] {
        let memory = crate::memory();
        let sqlite = crate::sqlite();
        let stores = [memory.store.as_ref(), sqlite.store.as_ref()];
        replay(seed, &stores);

        let mut rng = StdRng::seed_from_u64(seed ^ 0xfeed);
        let page_size = rng.gen_range(1..7);

        for ns in NAMESPACES {
            for key in KEYS {
                let listed: Vec<_> = stores
                    .iter()
                    .map(|s| summarize(walk(page_size, |p| s.list_items(ns, key, p).unwrap())))
                    .collect();
                assert_eq!(listed[0], listed[1], "list_items {}/{}", ns, key);

                for author in AUTHORS {
                    let by_author: Vec<_> = stores
                        .iter()
                        .map(|s| {
                            summarize(walk(page_size, |p| {
                                s.list_by_author(ns, key, author, p).unwrap()
                            }))
                        })
                        .collect();
                    assert_eq!(by_author[0], by_author[1], "list_by_author {}", author);
                }

                let mut histories: Vec<_> = stores
                    .iter()
                    .map(|s| summarize(s.history_of(ns, key).unwrap()))
                    .collect();
                for history in &mut histories {
                    history.sort_by_key(|entry| entry.2);
                }
                assert_eq!(histories[0], histories[1], "history_of {}/{}", ns, key);
            }
        }

        let namespaces: Vec<_> = stores
            .iter()
            .map(|s| namespace_names(walk(page_size, |p| s.list_namespaces(p).unwrap())))
            .collect();
        assert_eq!(namespaces[0], namespaces[1]);
    }
}
