//! Benchmarks for the Tributary stream engine
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tributary::{Analyzer, EngineConfig, IndexKey, QueryHandle, StreamEngine};

#[derive(Debug, Clone)]
struct Person {
    name: String,
    age: u32,
}

fn create_people(count: usize) -> Vec<Person> {
    (0..count)
        .map(|i| Person {
            name: format!("{:06x}", i.wrapping_mul(2654435761) % 0xffffff),
            age: (i % 99) as u32 + 1,
        })
        .collect()
}

struct JohnCounter;

impl Analyzer<Person> for JohnCounter {
    fn analyze(&self, stream: &QueryHandle<'_, Person>, _person: &Person) {
        black_box(stream.count(&IndexKey::field("name", "john")));
    }

    fn only_on_index(&self) -> Option<IndexKey> {
        Some(IndexKey::field("name", "john"))
    }
}

struct EndsWithFour;

impl Analyzer<Person> for EndsWithFour {
    fn analyze(&self, _stream: &QueryHandle<'_, Person>, person: &Person) {
        black_box(person.age);
    }

    fn can_analyze(&self, person: &Person) -> bool {
        person.name.ends_with('4')
    }
}

fn create_engine() -> StreamEngine<Person> {
    let engine = StreamEngine::with_config(EngineConfig::default()).unwrap();
    engine
        .add_indexer(|p: &Person| Some(IndexKey::field("name", p.name.to_lowercase())))
        .unwrap();
    engine
        .add_indexer(|p: &Person| {
            p.name
                .chars()
                .next()
                .map(|c| IndexKey::field("name", c.to_string()))
        })
        .unwrap();
    engine.add_analyzer(JohnCounter).unwrap();
    engine.add_analyzer(EndsWithFour).unwrap();
    engine
}

fn bench_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("put");

    for size in [1000, 10000] {
        let people = create_people(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("put_all_{}", size), |b| {
            b.iter_with_setup(
                || (create_engine(), people.clone()),
                |(engine, people)| engine.put_all(black_box(people)),
            )
        });
    }

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");

    let engine = create_engine();
    engine.put_all(create_people(100_000));
    engine.put_all((0..3).map(|age| Person {
        name: "John".to_string(),
        age,
    }));

    let john = IndexKey::field("name", "john");
    let by_letter = IndexKey::field("name", "a");

    group.bench_function("point_lookup", |b| {
        b.iter(|| engine.query(black_box(&john)).count())
    });

    group.bench_function("predicate_over_partition", |b| {
        b.iter(|| {
            engine
                .query_where(black_box(&by_letter), |p| p.age == 2)
                .count()
        })
    });

    group.bench_function("unseen_key", |b| {
        let missing = IndexKey::field("name", "nobody");
        b.iter(|| engine.query(black_box(&missing)).count())
    });

    group.finish();
}

criterion_group!(benches, bench_put, bench_query);
criterion_main!(benches);
