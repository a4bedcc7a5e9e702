//! Behaviour shared by every backend

use serde_json::json;
use versakv::{
    Content, DataItem, DataItemStore, Error, Keyed, NamespaceMostRecentID, Page, DEFAULT_PAGE_SIZE,
};

fn content(value: serde_json::Value) -> Content {
    value.as_object().cloned().unwrap()
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

fn versions(items: &[DataItem]) -> Vec<u64> {
    items.iter().map(|i| i.version).collect()
}

pub fn store_then_history(store: &dyn DataItemStore) {
    let first = store
        .store("n", "k", content(json!({"author": "a", "foo": "bar"})))
        .unwrap();
    let second = store
        .store("n", "k", content(json!({"author": "a", "foo": "baz"})))
        .unwrap();
    assert_eq!((first.version, second.version), (1, 2));

    let mut history = store.history_of("n", "k").unwrap();
    history.sort_by_key(|i| i.version);
    assert_eq!(history, vec![first, second]);
}

pub fn versions_are_per_pair(store: &dyn DataItemStore) {
    for (ns, key) in [("n", "a"), ("n", "b"), ("n", "a"), ("m", "a"), ("n", "a")] {
        store.store(ns, key, Content::new()).unwrap();
    }
    let mut na = versions(&store.history_of("n", "a").unwrap());
    na.sort_unstable();
    assert_eq!(na, vec![1, 2, 3]);
    assert_eq!(versions(&store.history_of("n", "b").unwrap()), vec![1]);
    assert_eq!(versions(&store.history_of("m", "a").unwrap()), vec![1]);
}

pub fn ids_increase_across_namespaces(store: &dyn DataItemStore) {
    let ids: Vec<_> = (0..20)
        .map(|i| {
            let ns = format!("ns{}", i % 4);
            store.store(&ns, "k", Content::new()).unwrap().id
        })
        .collect();
    for pair in ids.windows(2) {
        assert!(pair[1] > pair[0]);
    }
}

pub fn event_time_matches_id(store: &dyn DataItemStore) {
    let mut previous = None;
    for _ in 0..10 {
        let item = store.store("n", "k", Content::new()).unwrap();
        assert_eq!(item.event_time, item.id.timestamp());
        if let Some(prev) = previous {
            assert!(item.event_time >= prev);
        }
        previous = Some(item.event_time);
    }
}

pub fn list_items_walks_every_version_once(store: &dyn DataItemStore) {
    for i in 0..23 {
        store.store("n", "k", content(json!({"i": i}))).unwrap();
        store.store("n", "noise", Content::new()).unwrap();
    }
    for size in [1, 2, 5, 23, 50] {
        let all = walk(size, |p| store.list_items("n", "k", p).unwrap());
        assert_eq!(versions(&all), (1..=23).rev().collect::<Vec<u64>>());
    }
}

pub fn list_by_author_matches_author_text(store: &dyn DataItemStore) {
    let authors = [
        json!("x"),
        json!("y"),
        json!(7),
        json!("x"),
        json!(null),
        json!("7"),
        json!(true),
        json!({"name": "x"}),
    ];
    for author in &authors {
        store
            .store("n", "k", content(json!({"author": author})))
            .unwrap();
    }
    store.store("n", "k", Content::new()).unwrap();

    let x = walk(1, |p| store.list_by_author("n", "k", "x", p).unwrap());
    assert_eq!(versions(&x), vec![4, 1]);
    let seven = walk(1, |p| store.list_by_author("n", "k", "7", p).unwrap());
    assert_eq!(versions(&seven), vec![6, 3]);
    let truthy = walk(3, |p| store.list_by_author("n", "k", "true", p).unwrap());
    assert_eq!(versions(&truthy), vec![7]);
    assert!(store
        .list_by_author("n", "k", "null", Page::first(10))
        .unwrap()
        .is_empty());
}

pub fn list_namespaces_walks_by_recent_activity(store: &dyn DataItemStore) {
    for ns in ["a", "b", "c", "d", "b", "a", "e"] {
        store.store(ns, "k", Content::new()).unwrap();
    }
    let all: Vec<NamespaceMostRecentID> = walk(2, |p| store.list_namespaces(p).unwrap());
    let names: Vec<&str> = all.iter().map(|n| n.namespace.as_str()).collect();
    assert_eq!(names, vec!["e", "a", "b", "d", "c"]);
    for pair in all.windows(2) {
        assert!(pair[0].most_recent_id > pair[1].most_recent_id);
    }
}

pub fn default_page_size(store: &dyn DataItemStore) {
    for i in 0..(DEFAULT_PAGE_SIZE + 5) {
        store.store(&format!("ns{}", i), "k", Content::new()).unwrap();
        store.store("n", "k", Content::new()).unwrap();
    }
    assert_eq!(
        store.list_items("n", "k", Page::first(0)).unwrap().len(),
        DEFAULT_PAGE_SIZE
    );
    assert_eq!(
        store.list_namespaces(Page::first(0)).unwrap().len(),
        DEFAULT_PAGE_SIZE
    );
}

pub fn cursor_is_exclusive(store: &dyn DataItemStore) {
    let items: Vec<_> = (0..3)
        .map(|_| store.store("n", "k", Content::new()).unwrap())
        .collect();
    let page = store
        .list_items("n", "k", Page::after(items[2].id, 10))
        .unwrap();
    assert_eq!(versions(&page), vec![2, 1]);
    let none = store
        .list_items("n", "k", Page::after(items[0].id, 10))
        .unwrap();
    assert!(none.is_empty());
}

pub fn rejected_writes_leave_no_trace(store: &dyn DataItemStore) {
    assert!(matches!(
        store.store("", "k", Content::new()),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        store.store("n", "", Content::new()),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        store.store("n\0", "k", Content::new()),
        Err(Error::Validation(_))
    ));
    assert!(store.list_namespaces(Page::first(10)).unwrap().is_empty());

    let item = store.store("n", "k", Content::new()).unwrap();
    assert_eq!(item.version, 1);
}

pub fn negative_cursor_is_rejected(store: &dyn DataItemStore) {
    assert!(matches!(
        store.list_items("n", "k", Page::new(-1, 1)),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        store.list_by_author("n", "k", "a", Page::new(-1, 1)),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        store.list_namespaces(Page::new(i64::MIN, 1)),
        Err(Error::Validation(_))
    ));
}

pub fn content_round_trips(store: &dyn DataItemStore) {
    let original = content(json!({
        "author": "a",
        "int": -42,
        "big": 9_007_199_254_740_993u64,
        "float": 1.5e-7,
        "text": "tab\tquote\"unicode\u{2603}",
        "list": [[], {}, [1, [2, [3]]]],
        "none": null
    }));
    let item = store.store("n", "k", original.clone()).unwrap();
    assert_eq!(item.content, original);
    let listed = store.list_items("n", "k", Page::first(1)).unwrap();
    assert_eq!(listed[0].content, original);
}
