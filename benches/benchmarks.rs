use criterion::{black_box, criterion_group, criterion_main, Criterion};
use strix::parser::HtmlParser;
use strix::text;

fn sample_document(rows: usize) -> String {
    let mut html = String::from(
        "<html><head><title>bench</title><style>.odd { background: #eee }</style></head><body>",
    );
    for i in 0..rows {
        html.push_str(&format!(
            "<div class=\"row {}\"><h2>Row {i}</h2><p>Paragraph with <b>bold</b> and \
             <a href=\"/item/{i}\">a link</a>.</p></div>",
            if i % 2 == 0 { "even" } else { "odd" },
        ));
    }
    html.push_str("</body></html>");
    html
}

fn benchmark_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");
    let small = sample_document(10);
    let large = sample_document(500);

    group.bench_function("parse_small", |b| {
        let parser = HtmlParser::new();
        b.iter(|| parser.parse(black_box(&small)).unwrap())
    });

    group.bench_function("parse_large", |b| {
        let parser = HtmlParser::new();
        b.iter(|| parser.parse(black_box(&large)).unwrap())
    });

    group.finish();
}

fn benchmark_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("rendering");
    let doc = HtmlParser::new().parse(&sample_document(200)).unwrap();

    group.bench_function("visible_text", |b| {
        b.iter(|| text::page_text(black_box(&doc)))
    });

    group.bench_function("serialize_html", |b| {
        b.iter(|| text::outer_html(black_box(&doc), doc.root()))
    });

    group.finish();
}

criterion_group!(benches, benchmark_parsing, benchmark_rendering);
criterion_main!(benches);
