//! Benchmarks for class-file remapping.
//!
//! Measures:
//! - Parsing only (the validation every remap pays for)
//! - A class without any mapped name, returned as a copy
//! - A class with renamed members, classes, descriptors and signatures
//! - A whole module through the compilation interceptor

extern crate classremap;

#[path = "../src/test/builder.rs"]
mod builder;

use std::{hint::black_box, sync::Arc};

use builder::ClassBuilder;
use classremap::{classfile::ClassFile, prelude::*};
use criterion::{criterion_group, criterion_main, Criterion};

fn symbols() -> SymbolMap {
    let mut builder = SymbolMap::builder()
        .class("a/b", "net/example/Entity")
        .class("a/c", "net/example/Projectile");
    for i in 0..5_000 {
        builder = builder
            .method(format!("m_{i}_"), format!("method{i}"))
            .field(format!("f_{i}_"), format!("field{i}"));
    }
    builder.build().unwrap()
}

fn mapped_class(name: &str) -> Vec<u8> {
    let mut builder = ClassBuilder::new(name)
        .super_class("a/c")
        .class_signature("La/c;Ljava/lang/Comparable<La/b;>;");
    for i in 0..50 {
        builder = builder
            .field(&format!("f_{i}_"), "La/b;")
            .method(&format!("m_{i}_"), "(La/b;I)La/c;")
            .field_ref("a/b", &format!("f_{}_", i + 100), "D")
            .method_ref("a/b", &format!("m_{}_", i + 100), "(La/c;)V");
    }
    builder.build()
}

fn unmapped_class() -> Vec<u8> {
    let mut builder = ClassBuilder::new("scripts/Plain");
    for i in 0..50 {
        builder = builder
            .field(&format!("value{i}"), "Ljava/lang/String;")
            .method(&format!("compute{i}"), "(I)I")
            .method_ref("java/lang/Math", &format!("max{i}"), "(II)I");
    }
    builder.build()
}

fn bench_parse(c: &mut Criterion) {
    let bytes = mapped_class("scripts/Arrow");

    c.bench_function("classfile_parse", |b| {
        b.iter(|| {
            let class = ClassFile::parse(black_box(&bytes)).unwrap();
            black_box(class.pool.count())
        });
    });
}

fn bench_remap_unmapped(c: &mut Criterion) {
    let symbols = symbols();
    let config = RemapConfig::production();
    let remapper = BytecodeRemapper::new(&symbols, &config);
    let bytes = unmapped_class();

    c.bench_function("remap_unmapped", |b| {
        b.iter(|| black_box(remapper.remap(black_box(&bytes)).unwrap()));
    });
}

fn bench_remap_mapped(c: &mut Criterion) {
    let symbols = symbols();
    let config = RemapConfig::production();
    let remapper = BytecodeRemapper::new(&symbols, &config);
    let bytes = mapped_class("scripts/Arrow");

    c.bench_function("remap_mapped", |b| {
        b.iter(|| black_box(remapper.remap(black_box(&bytes)).unwrap()));
    });
}

fn bench_finalize_module(c: &mut Criterion) {
    let interceptor = CompilationInterceptor::new(Arc::new(symbols()), RemapConfig::production());
    let artifacts: Vec<_> = (0..64)
        .map(|i| {
            let name = format!("scripts/Class{i}");
            ClassFileArtifact::new(format!("{name}.class"), mapped_class(&name))
        })
        .collect();

    c.bench_function("finalize_module_64", |b| {
        b.iter(|| black_box(interceptor.finalize_module(black_box(&artifacts)).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_remap_unmapped,
    bench_remap_mapped,
    bench_finalize_module
);
criterion_main!(benches);
