//! Criterion benchmarks for payload cleaning in `pc-clean`.
//!
//! Benchmarks `Cleaner::clean` over notifier-shaped payloads of growing
//! size, with and without deep filters, plus `clean_url`.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pc_clean::{Cleaner, FilterRule, Tree};
use serde_json::{json, Value};

fn default_rules() -> Vec<FilterRule> {
    ["(?i)authorization", "(?i)cookie", "(?i)password", "(?i)secret"]
        .iter()
        .map(|p| FilterRule::pattern(p).expect("valid pattern"))
        .chain([FilterRule::literal("rack.request.form_vars")])
        .collect()
}

fn payload(events: usize) -> Value {
    let events: Vec<Value> = (0..events)
        .map(|i| {
            json!({
                "metaData": {
                    "request": {
                        "params": {"password": "p", "page": i, "q": "search"},
                        "headers": {"Cookie": "sid=1", "Accept": "*/*"}
                    },
                    "user": {"id": i, "email": "u@example.test"}
                },
                "breadcrumbs": [{"metaData": {"secret": "s", "step": i}}]
            })
        })
        .collect();
    json!({"events": events})
}

fn bench_clean(c: &mut Criterion) {
    let shallow = Cleaner::new(default_rules(), vec!["events.metaData".to_string()]);
    let mut deep_rules = default_rules();
    deep_rules.push(FilterRule::pattern(r"params\.q").expect("valid pattern"));
    let deep = Cleaner::new(deep_rules, vec!["events.metaData".to_string()]);

    let mut group = c.benchmark_group("clean/payload");
    for events in [1, 10, 100] {
        let tree = Tree::from_json(&payload(events));
        group.bench_with_input(BenchmarkId::new("shallow", events), &tree, |b, tree| {
            b.iter(|| black_box(shallow.clean(black_box(tree))))
        });
        group.bench_with_input(BenchmarkId::new("deep", events), &tree, |b, tree| {
            b.iter(|| black_box(deep.clean(black_box(tree))))
        });
    }
    group.finish();
}

fn bench_clean_url(c: &mut Criterion) {
    let cleaner = Cleaner::new(default_rules(), Vec::new());
    let url = "https://shop.example.test/checkout?item=42&password=hunter2&ref=mail&secret_key=abc";

    c.bench_function("clean/url", |b| {
        b.iter(|| black_box(cleaner.clean_url(black_box(url)).expect("valid url")))
    });
}

criterion_group!(benches, bench_clean, bench_clean_url);
criterion_main!(benches);
