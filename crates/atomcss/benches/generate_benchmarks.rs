use std::collections::BTreeSet;

use atomcss::{GenerateInput, GenerateOptions, Generator, UserConfig, create_generator, presets};
use atomcss_syntax::expand_variant_group;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use futures::executor::block_on;

const TOKENS: &[&str] = &[
    "flex", "grid", "hidden", "m-2", "mx-4", "-mt-1", "p-1", "px-4", "py-2", "w-1/2", "h-screen",
    "text-red-500", "bg-blue-500/50", "border", "border-gray-300", "opacity-50", "z-10",
    "hover:text-red-700", "focus:bg-white", "md:p-4", "lg:w-1/4", "dark:bg-black", "!p-2",
    "group-hover:opacity-100", "[--brand:#0af]",
];

fn generator() -> Generator {
    block_on(create_generator(UserConfig::new().preset(presets::mini())))
        .expect("mini preset resolves")
}

/// Token sets of growing size, built by cycling spacing values.
fn token_set(len: usize) -> BTreeSet<String> {
    (0..len)
        .map(|i| match i % 4 {
            0 => format!("m-{}", i),
            1 => format!("px-{}", i),
            2 => format!("hover:mt-{}", i),
            _ => format!("md:p-{}", i),
        })
        .collect()
}

fn bench_generate_cold(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_cold");

    for len in [10, 100, 500] {
        let tokens = token_set(len);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("tokens", len), &tokens, |b, tokens| {
            let generator = generator();
            let options = GenerateOptions::default();
            b.iter(|| {
                generator.clear_cache();
                block_on(generator.generate(black_box(tokens.clone()).into(), &options))
            })
        });
    }

    group.finish();
}

fn bench_generate_cached(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_cached");
    let generator = generator();
    let options = GenerateOptions::default();
    let input = GenerateInput::tokens(TOKENS.iter().copied());

    // warm the cache once
    let _ = block_on(generator.generate(input.clone(), &options));

    group.bench_function("mixed", |b| {
        b.iter(|| block_on(generator.generate(black_box(input.clone()), &options)))
    });
    group.bench_function("mixed_minified", |b| {
        let options = GenerateOptions {
            minify: true,
            ..Default::default()
        };
        b.iter(|| block_on(generator.generate(black_box(input.clone()), &options)))
    });

    group.finish();
}

fn bench_extract_source(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_source");
    let generator = generator();

    let line = r#"<div class="flex md:p-4 hover:text-red-500 bg-blue-500/50">{{ title }}</div>"#;
    for lines in [10, 100] {
        let code = std::iter::repeat_n(line, lines).collect::<Vec<_>>().join("\n");
        group.throughput(Throughput::Bytes(code.len() as u64));
        group.bench_with_input(BenchmarkId::new("lines", lines), &code, |b, code| {
            b.iter(|| block_on(generator.extract(black_box(code), Some("bench.html"))))
        });
    }

    group.finish();
}

fn bench_variant_groups(c: &mut Criterion) {
    let mut group = c.benchmark_group("variant_groups");

    let flat = "flex m-2 p-4 text-red-500";
    let nested = "md:(p-4 hover:(bg-red-500 !text-white)) grid-(cols-2 gap-1) lg:(m-2 p-2)";

    group.bench_function("flat", |b| b.iter(|| expand_variant_group(black_box(flat))));
    group.bench_function("nested", |b| {
        b.iter(|| expand_variant_group(black_box(nested)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_generate_cold,
    bench_generate_cached,
    bench_extract_source,
    bench_variant_groups,
);
criterion_main!(benches);
