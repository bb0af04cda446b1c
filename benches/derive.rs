use criterion::{criterion_group, criterion_main, Criterion};
use d7460n::inject::Item;
use d7460n::Page;

const PAGE: &str = r#"<main>
  <input type=checkbox><nav><a>home</a><a>records</a></nav>
  <table><thead><tr><th>name</th><th>email</th></tr></thead><tbody></tbody></table>
  <aside></aside>
  <form>
    <fieldset>
      <input name="name" required minlength="2">
      <input name="email" type="email" required>
      <input name="age" type="number" min="0" max="150">
    </fieldset>
    <button type="submit">Save</button>
  </form>
</main>"#;

fn records(count: usize) -> Vec<Item> {
    (0..count)
        .map(|idx| {
            Item::new()
                .with("id", &idx.to_string())
                .with("name", &format!("record {idx}"))
                .with("email", &format!("record{idx}@example.com"))
        })
        .collect()
}

fn derive_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("Derive");
    group.significance_level(0.1).sample_size(100);

    for count in [10, 500] {
        let page = Page::load_with_builtin(PAGE).unwrap();
        page.inject("records", &records(count)).unwrap();

        group.bench_function(format!("{count} rows"), |b| {
            b.iter(|| page.derive());
        });
    }

    group.finish();
}

fn inject_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("Inject");
    group.significance_level(0.1).sample_size(100);

    let page = Page::load_with_builtin(PAGE).unwrap();
    let items = records(500);
    group.bench_function("500 rows", |b| {
        b.iter(|| page.inject("records", &items).unwrap());
    });

    group.finish();
}

criterion_group!(benches, derive_table, inject_table);
criterion_main!(benches);
