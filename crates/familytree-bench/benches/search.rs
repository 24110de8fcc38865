use criterion::{Criterion, black_box, criterion_group, criterion_main};
use familytree_bench::synthetic_family;
use familytree_graph::HierarchyBuilder;
use familytree_search::{DEFAULT_MIN_TERM_LEN, SearchIndex, SearchResults};

fn bench_search_10k(c: &mut Criterion) {
    let (tree, _) = HierarchyBuilder::new()
        .build(&synthetic_family(10_000, 5))
        .expect("valid document");
    let mut index = SearchIndex::new(&tree, DEFAULT_MIN_TERM_LEN);

    c.bench_function("search_substring_10k", |b| {
        b.iter(|| {
            let hits = index.search(black_box("ann"));
            black_box(hits);
        })
    });

    c.bench_function("search_no_match_10k", |b| {
        b.iter(|| black_box(index.search(black_box("zz"))))
    });
}

fn bench_navigate(c: &mut Criterion) {
    let (mut tree, _) = HierarchyBuilder::new()
        .build(&synthetic_family(10_000, 5))
        .expect("valid document");
    let mut index = SearchIndex::new(&tree, DEFAULT_MIN_TERM_LEN);
    let mut results = SearchResults::new("9999", index.search("9999"));

    c.bench_function("navigate_deep_result_10k", |b| {
        b.iter(|| black_box(results.navigate(&mut tree, 0)))
    });
}

criterion_group!(benches, bench_search_10k, bench_navigate);
criterion_main!(benches);
