use criterion::{Criterion, black_box, criterion_group, criterion_main};
use familytree_bench::{synthetic_outline, write_outline};
use familytree_project::{OutlineOptions, import_outline, import_outline_file};

fn bench_import_text(c: &mut Criterion) {
    let text = synthetic_outline(5, 5);
    let options = OutlineOptions::default();
    c.bench_function("outline_import_3905_lines", |b| {
        b.iter(|| black_box(import_outline(black_box(&text), &options)))
    });
}

fn bench_import_file(c: &mut Criterion) {
    let (_dir, path) = write_outline(4, 6).expect("outline fixture");
    let options = OutlineOptions::default();
    c.bench_function("outline_import_file_1554_lines", |b| {
        b.iter(|| {
            let import = import_outline_file(&path, &options).expect("readable outline");
            black_box(import);
        })
    });
}

criterion_group!(benches, bench_import_text, bench_import_file);
criterion_main!(benches);
