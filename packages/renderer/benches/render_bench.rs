use criterion::{black_box, criterion_group, criterion_main, Criterion};
use folio_renderer::{import_markdown, render, render_markdown, Audience, RenderContext, Theme};

const DOCUMENT: &str = r#"
# Quarterly plan

Owners are listed in [[document-mention;3f9c2b7a-1111-4444-8888-aaaaaaaaaaaa]].

1. Ship the editor
2. Migrate **citations**
   - remote lookups
   - node links to [[md;3f9c2b7a-1111-4444-8888-aaaaaaaaaaaa;ab3dE2F9]]

> Keep the render path pure.

```rust
fn render(snapshot: &Snapshot) -> VNode {
    Renderer::new().render(snapshot, &Theme::light(), &RenderContext::default())
}
```

| Area | Owner |
|------|-------|
| Editor | Jo |
| Renderer | Mary |
"#;

fn import_document(c: &mut Criterion) {
    c.bench_function("import_markdown", |b| {
        b.iter(|| import_markdown(black_box(DOCUMENT)))
    });
}

fn render_snapshot(c: &mut Criterion) {
    let snapshot = import_markdown(DOCUMENT).unwrap();
    let theme = Theme::light();
    let context = RenderContext::default();

    c.bench_function("render_snapshot", |b| {
        b.iter(|| render(black_box(&snapshot), &theme, &context))
    });
}

fn render_to_html(c: &mut Criterion) {
    let theme = Theme::dark();

    c.bench_function("render_markdown_to_html", |b| {
        b.iter(|| {
            render_markdown(black_box(DOCUMENT), &theme, Audience::External)
                .map(|tree| tree.to_html())
        })
    });
}

criterion_group!(benches, import_document, render_snapshot, render_to_html);
criterion_main!(benches);
