use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use czar::pass::PassId;
use czar::pipeline::Transpiler;

// Throughput scenarios of increasing size, in the spirit of a KPI suite:
// a trivial program, a struct-and-method program exercising the receiver
// transforms, and a larger program that exercises every structural pass at
// once (struct, method, enum, foreach, defer, named args, mutability).

const TINY: &str = r#"
fn main() -> i32 { return 0; }
"#;

const STRUCT_AND_METHODS: &str = r#"
struct Vec2 { i32 x; i32 y; };
fn Vec2.len(Vec2 v) -> i32 { return v.x + v.y; }
fn Vec2:scale(Vec2 v, i32 k) -> void { v.x = v.x * k; v.y = v.y * k; }
fn main() -> i32 {
    Vec2 a = { 1, 2 };
    a:scale(3);
    return a.len();
}
"#;

const LARGE_PIPELINE: &str = r#"
enum Color { RED, GREEN, BLUE }

struct Pixel { i32 x; i32 y; Color c; };

fn Pixel.brightness(Pixel p) -> i32 {
    switch (p.c) {
        case RED: return 1;
        case GREEN: return 2;
        case BLUE: return 3;
        default: return 0;
    }
}

fn Pixel:shift(Pixel p, i32 dx, i32 dy) -> void {
    p.x = p.x + dx;
    p.y = p.y + dy;
}

fn paint_row(i32 width, i32 row) -> void {
    for (u8 col : 0..width) {
        FILE * log = fopen("row.log", "a") #defer { fclose(log); };
        cz_log_info("painting col {col} of row {row}");
    }
}

fn sum_brightness(Pixel a, Pixel b) -> i32 {
    i32 total = a.len() + b.len();
    return total;
}

fn move_both(Pixel a, Pixel b) -> void {
    a:shift(dx = 1, dy = 2);
    b:shift(dx = 2, dy = 1);
}

fn main() -> i32 {
    Pixel a = { 0, 0, RED };
    Pixel b = { 1, 1, BLUE };
    paint_row(4, 0);
    i32 total = sum_brightness(a, b);
    move_both(a, b);
    _ = total;
    return 0;
}
"#;

fn scenarios() -> [(&'static str, &'static str); 3] {
    [
        ("tiny", TINY),
        ("struct_and_methods", STRUCT_AND_METHODS),
        ("large_pipeline", LARGE_PIPELINE),
    ]
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("transpile/full_pipeline");
    for (name, source) in scenarios() {
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, source| {
            b.iter(|| {
                let out = Transpiler::run(
                    black_box(source),
                    "bench.cz",
                    PassId::TransformCasts,
                    false,
                    false,
                    |_, _| {},
                );
                black_box(out.is_ok());
            });
        });
    }
    group.finish();
}

fn bench_lex_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("transpile/lex_only");
    for (name, source) in scenarios() {
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, source| {
            b.iter(|| {
                let result = czar::lexer::lex(black_box(source));
                black_box(result.tokens.len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_full_pipeline, bench_lex_only);
criterion_main!(benches);
