use criterion::{criterion_group, criterion_main, Criterion};
use llsql::{runtime::Parser, sql, ParseTable};

criterion_main!(benches);
criterion_group!(benches, bench_compile, bench_parse);

fn bench_compile(c: &mut Criterion) {
    let grammar = sql::grammar().expect("invalid SQL grammar");

    let mut group = c.benchmark_group("compile");
    group.bench_function("normalize", |b| {
        b.iter(|| grammar.clone().normalize());
    });
    group.bench_function("table", |b| {
        b.iter(|| llsql::compile(grammar.clone()));
    });
    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let table: ParseTable = sql::grammar()
        .and_then(llsql::compile)
        .expect("invalid SQL grammar");
    let source = "CREATE TABLE t (a INT, b CHAR(10), c NUMBER(10, 2), PRIMARY KEY (a));\n\
                  INSERT INTO t (a, b, c) VALUES (1, 'x', 2.5);\n\
                  SELECT a, b FROM t WHERE a BETWEEN 1 AND 10 OR NOT (b = 'y') AND c < 1e3;\n"
        .repeat(64);

    let mut group = c.benchmark_group("parse");
    group.bench_function("sql", |b| {
        b.iter(|| {
            let mut parser = Parser::new(&table, source.chars());
            parser.continue_parse()
        });
    });
    group.finish();
}
