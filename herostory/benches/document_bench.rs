//! Benchmarks for story markup and document layout.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use herostory::document::{render, DocumentOptions, DocumentPayload, Layouter};
use herostory::markup;

fn story() -> String {
    let paragraph = "Ren lifted the lantern and the fog drew back, one slow breath at a time. \
                     The valley remembered every keeper who had walked it before her. ";
    (0..40)
        .map(|_| paragraph.repeat(4))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn markup_benchmark(c: &mut Criterion) {
    let text = story();
    c.bench_function("markup_to_html", |b| b.iter(|| markup::to_html(black_box(&text))));
}

fn layout_benchmark(c: &mut Criterion) {
    let text = story();
    c.bench_function("layout_story", |b| {
        b.iter(|| {
            let mut layout = Layouter::new(11.0);
            layout.prose(black_box(&text));
            layout.finish()
        })
    });
}

fn render_benchmark(c: &mut Criterion) {
    let payload = DocumentPayload {
        hero_name: Some("Ren".to_string()),
        character: "A lantern keeper.".to_string(),
        world: "A valley of fog.".to_string(),
        story: story(),
        ..DocumentPayload::default()
    };
    let options = DocumentOptions::default();
    c.bench_function("render_text_only", |b| {
        b.iter(|| render(black_box(&payload), None, None, &options))
    });
}

criterion_group!(benches, markup_benchmark, layout_benchmark, render_benchmark);
criterion_main!(benches);
