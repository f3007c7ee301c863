extern crate criterion;

use criterion::{criterion_group, criterion_main, Criterion};

use pagecraft_lib::{Command, Editor, EditorConfig};
use std::time::Instant;

fn large_page() -> String {
    let mut html = String::with_capacity(2_000_000);
    html.push_str("<style>.card { padding: 8px; } .card:hover { color: #333; }</style>");
    for i in 0..5_000 {
        html.push_str(&format!(
            "<section class=\"card\"><h2>Title {}</h2><p>Body text {}</p></section>",
            i, i
        ));
    }
    html.push_str("<p id=\"target\">edit me</p>");
    html
}

fn bench_snapshot_capture(c: &mut Criterion) {
    let page = large_page();
    let mut editor = Editor::headless(EditorConfig::default());
    editor.load(&page);
    let _ = editor.select("#target");

    let mut counter = 0u64;
    c.bench_function("snapshot_capture", |b| {
        b.iter(|| {
            counter += 1;
            let _ = editor.execute(Command::SetText(counter.to_string()), &mut |_: &str| true);
        })
    });
}

fn bench_undo_redo(c: &mut Criterion) {
    let page = large_page();
    let mut editor = Editor::headless(EditorConfig::default());
    editor.load(&page);
    let _ = editor.select("#target");
    for i in 0..10 {
        let _ = editor.execute(Command::SetText(i.to_string()), &mut |_: &str| true);
    }

    let now = Instant::now();
    c.bench_function("undo_redo", |b| {
        b.iter(|| {
            editor.undo(now);
            editor.redo(now);
        })
    });
}

criterion_group!(benches, bench_snapshot_capture, bench_undo_redo);
criterion_main!(benches);
