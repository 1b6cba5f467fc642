#![allow(
    clippy::tests_outside_test_module,
    clippy::unwrap_used,
    reason = "benchmark"
)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use twoway_sql::{Params, Template};

const QUERY: &str = "\
SELECT DISTINCT
  i.id AS item_id
  ,d.display_name AS display_name
  ,h.status AS status_id
FROM
  some_schema.item i
  INNER JOIN some_schema.item_detail d
    ON i.id = d.item_id
  INNER JOIN some_schema.item_history h
    ON i.id = h.item_id
/*BEGIN*/WHERE
  /*IF ctx[:name] */AND i.name ILIKE /*ctx[:name]*/'hoge%'/*END*/
  /*IF ctx[:status] */AND h.status IN /*ctx[:status]*/(3, 4, 9)/*END*/
/*END*/
/*IF ctx[:limit] */ LIMIT /*ctx[:limit]*/10/*END*/
";

fn sample_params(n: i64) -> Params {
    let mut params = Params::new();
    params
        .set("name", format!("item-{n}%"))
        .set("status", vec![n, n + 1])
        .set("limit", 50);
    params
}

fn twoway_sql_benchmark(c: &mut Criterion) {
    let param_sets: Vec<Params> = (0..100).map(sample_params).collect();

    let mut group = c.benchmark_group("Two-way SQL");
    group.sample_size(50);

    group.bench_function("parse", |b| {
        b.iter(|| black_box(Template::parse(QUERY).unwrap()));
    });

    let template = Template::parse(QUERY).unwrap();
    group.bench_function("merge", |b| {
        b.iter(|| {
            for params in &param_sets {
                black_box(template.merge(params).unwrap());
            }
        });
    });

    group.finish();
}

criterion_group!(benches, twoway_sql_benchmark);
criterion_main!(benches);
