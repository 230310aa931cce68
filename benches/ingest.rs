//! Benchmarks for the ingestion path: parse, extract, reconcile, query.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use kith::extract::Extractor;
use kith::merge::Reconciler;
use kith::query::query_context;
use kith::source::markdown;
use kith::store::JsonStore;

fn letter_name(prefix: &str, i: usize) -> String {
    let hi = (b'A' + (i / 26) as u8) as char;
    let lo = (b'a' + (i % 26) as u8) as char;
    format!("{prefix} {hi}{lo}")
}

/// A memory document with 50 people, 10 workplaces and 10 events, all with
/// distinct names so the graph actually grows.
fn sample_markdown() -> String {
    let mut doc = String::from(
        "# Memory Notes\n\n\
         ## 👤 Identity\n\
         - Name: Will Wade\n\
         - Pronouns: he/him\n\
         - Lives in: Manchester\n\
         - Works at: Ace Centre (AAC Specialist)\n\n\
         ## 👥 People\n",
    );
    for i in 0..50 {
        let name = letter_name("Friend", i);
        let study = letter_name("Study", i);
        doc.push_str(&format!("- {name}: SLT, glasses, co-authored {study}\n"));
    }
    doc.push_str("\n## 🏢 Workplaces\n");
    for i in 0..10 {
        let org = letter_name("Institute", i);
        doc.push_str(&format!("- {org} (2010-2015)\n"));
    }
    doc.push_str("\n## 🎉 Events & Memories\n");
    for i in 0..10 {
        let event = letter_name("Conference", i);
        let friend = letter_name("Friend", i);
        let town = letter_name("Town", i);
        doc.push_str(&format!("- \"{event}\" → met {friend} in {town}\n"));
    }
    doc.push_str(
        "\n## 🌱 Interests\n\
         - sailing, hiking, photography, accessible technology\n\n\
         ## 💬 Phrases I Often Say\n\
         - \"Let's have a brew.\"\n",
    );
    doc
}

fn bench_parse(c: &mut Criterion) {
    let doc = sample_markdown();

    c.bench_function("parse_markdown_memory_doc", |bench| {
        bench.iter(|| black_box(markdown::parse_str(&doc, "bench.md")))
    });
}

fn bench_extract(c: &mut Criterion) {
    let record = markdown::parse_str(&sample_markdown(), "bench.md");
    let extractor = Extractor::new();

    c.bench_function("extract_50_people_10_events", |bench| {
        bench.iter(|| black_box(extractor.extract(&record).unwrap()))
    });
}

fn bench_reconcile(c: &mut Criterion) {
    let record = markdown::parse_str(&sample_markdown(), "bench.md");
    let batch = Extractor::new().extract(&record).unwrap();
    let reconciler = Reconciler::new();

    c.bench_function("reconcile_into_empty_store", |bench| {
        bench.iter_batched(
            || batch.clone(),
            |batch| {
                let mut store = JsonStore::new("bench-graph.json");
                black_box(reconciler.merge(&mut store, batch).unwrap())
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_query(c: &mut Criterion) {
    let record = markdown::parse_str(&sample_markdown(), "bench.md");
    let batch = Extractor::new().extract(&record).unwrap();
    let mut store = JsonStore::new("bench-graph.json");
    Reconciler::new().merge(&mut store, batch).unwrap();

    c.bench_function("query_context_hub_entity", |bench| {
        bench.iter(|| black_box(query_context(&store, "Will Wade").unwrap()))
    });
}

criterion_group!(benches, bench_parse, bench_extract, bench_reconcile, bench_query);
criterion_main!(benches);
