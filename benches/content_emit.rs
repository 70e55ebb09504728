/// Benchmarks for content stream emission performance
///
/// Run with: cargo bench
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use pdf_canvas::canvas::{FixedFontMapper, FontSpec, PageCanvas, Paint};
use pdf_canvas::core::{Color, Path};
use std::sync::Arc;

fn letter_canvas() -> PageCanvas {
    PageCanvas::new(612.0, 792.0, Arc::new(FixedFontMapper::default()))
}

/// Benchmark rectangle fill emission
fn benchmark_rect_fills(c: &mut Criterion) {
    let mut group = c.benchmark_group("rect_fills");

    for count in [100usize, 1_000, 5_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut canvas = letter_canvas();
                for i in 0..count {
                    // alternate colors so the paint diff emits on every other fill
                    if i % 2 == 0 {
                        canvas.set_paint(Paint::Solid(Color::rgb(255, 0, 0)));
                    } else {
                        canvas.set_paint(Paint::Solid(Color::rgb(0, 0, 0)));
                    }
                    let offset = (i % 50) as f64;
                    canvas.fill(&Path::rectangle(offset, offset, 100.0, 50.0));
                }
                canvas.dispose();
                black_box(canvas.content())
            });
        });
    }

    group.finish();
}

/// Benchmark text run emission, including font binding and metrics
fn benchmark_text_runs(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_runs");

    for count in [100usize, 1_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut canvas = letter_canvas();
                canvas.set_font(FontSpec::new("Helvetica", 12.0));
                for i in 0..count {
                    let y = 700.0 - (i % 60) as f64 * 12.0;
                    let _ = canvas.draw_text(black_box("The quick brown fox"), 72.0, y);
                }
                canvas.dispose();
                black_box(canvas.content())
            });
        });
    }

    group.finish();
}

/// Benchmark child context creation and splice-at-disposal
fn benchmark_child_splicing(c: &mut Criterion) {
    let mut group = c.benchmark_group("child_splicing");

    for count in [10usize, 100] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut root = letter_canvas();
                for i in 0..count {
                    let mut child = root.create_child();
                    child.set_paint(Paint::Solid(Color::rgb((i % 256) as u8, 0, 0)));
                    child.fill(&Path::rectangle(10.0, 10.0, 100.0, 100.0));
                    child.draw(&Path::line(0.0, 0.0, 200.0, 200.0));
                }
                root.dispose();
                black_box(root.content())
            });
        });
    }

    group.finish();
}

/// Benchmark deflate of a finished stream
fn benchmark_compression(c: &mut Criterion) {
    let mut group = c.benchmark_group("compression");

    let mut canvas = letter_canvas();
    for i in 0..1_000 {
        let offset = (i % 50) as f64;
        canvas.fill(&Path::rectangle(offset, offset, 100.0, 50.0));
    }
    canvas.dispose();
    group.throughput(Throughput::Bytes(canvas.content().len() as u64));

    group.bench_function("deflate_1000_rects", |b| {
        b.iter(|| black_box(canvas.compressed_content()));
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_rect_fills,
    benchmark_text_runs,
    benchmark_child_splicing,
    benchmark_compression
);
criterion_main!(benches);
