use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sable_compiler::{
    compile_str,
    lex::{log_syntax_error, TokenIter},
};

/// Many functions with loops, branches and member access.
fn generate_source(function_count: usize) -> String {
    let mut source = String::from("struct Counter { value: int, step: int }\n");
    for i in 0..function_count {
        source.push_str(&format!(
            "fn tick{i}(mut counter: Counter, limit: int) -> int {{
    mut total = 0;
    while (total < limit) {{
        if (total % 2 == 0) {{
            total = total + counter.step;
        }} else {{
            total = total + 1;
        }}
        counter.value = total;
    }}
    return total;
}}
"
        ));
    }
    source
}

fn criterion_benchmark(c: &mut Criterion) {
    let source = generate_source(200);

    c.bench_function("tokenize", |b| {
        b.iter(|| {
            let mut reporter = log_syntax_error;
            let tokens = TokenIter::new("bench.sable", black_box(&source), &mut reporter);
            black_box(tokens.count())
        })
    });

    c.bench_function("compile", |b| {
        b.iter(|| black_box(compile_str("bench.sable", black_box(&source)).is_ok()))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
