use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgqs::counter::PositionalCounter;
use pgqs::{Entity, Fragment, RowState, Value};

#[derive(Debug, Entity)]
#[orm(table = "event")]
#[allow(dead_code)]
struct Event {
    #[orm(id, auto)]
    id: i64,
    kind: String,
    weight: f64,
    archived: Option<bool>,
    state: RowState,
}

/// AND of `n` comparisons, each taking one placeholder.
fn conjunction(n: usize) -> Fragment {
    Fragment::And(
        (0..n)
            .map(|i| Fragment::compare(&format!("col{i}"), "=", Value::Int64(i as i64)))
            .collect(),
    )
}

fn bench_fragment_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragment/compile");

    for n in [1, 5, 10, 50, 100] {
        let fragment = conjunction(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &fragment, |b, f| {
            b.iter(|| black_box(f.compile(&mut PositionalCounter::new())));
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("queryset/in_list");

    for n in [5, 20, 100, 500] {
        let ids: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &ids, |b, ids| {
            b.iter(|| black_box(Event::query().id_in(ids.iter().copied()).to_select_sql()));
        });
    }

    group.finish();
}

fn bench_build_and_render(c: &mut Criterion) {
    c.bench_function("queryset/build_and_render", |b| {
        b.iter(|| {
            let query = Event::query()
                .kind_eq("click")
                .weight_gt(0.5)
                .archived_is_null()
                .or([Event::query().id_lt(10), Event::query().kind_ne("view")])
                .order_by_weight_desc()
                .for_update_skip_locked();
            black_box(query.to_first_sql())
        });
    });
}

fn bench_subquery(c: &mut Criterion) {
    let inner = Event::query().kind_in(["a", "b", "c"]).weight_ge(1.0);
    c.bench_function("queryset/subquery", |b| {
        b.iter(|| {
            black_box(
                Event::query()
                    .weight_le(9.0)
                    .filter(Fragment::InSubquery {
                        column: "id".to_string(),
                        subquery: inner.query_set().subquery(),
                    })
                    .to_count_sql(),
            )
        });
    });
}

criterion_group!(
    benches,
    bench_fragment_compile,
    bench_in_list,
    bench_build_and_render,
    bench_subquery
);
criterion_main!(benches);
