//! Benchmarks for the bag's token removal strategies.
//!
//! Removal scans backward from the most recent insertion, so removing recent
//! tokens should be much cheaper than removing the oldest ones.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint;

use criterion::{Criterion, criterion_group, criterion_main};
use token_bag::Bag;

const BAG_SIZE: usize = 1000;

fn removal_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("removal_patterns");

    group.bench_function("insert_remove_immediately", |b| {
        let mut bag = Bag::new();
        for i in 0..BAG_SIZE {
            drop(bag.insert(i));
        }

        b.iter(|| {
            let token = bag.insert(hint::black_box(BAG_SIZE));
            bag.remove(&token);
        });
    });

    group.bench_function("remove_reverse_insertion_order", |b| {
        b.iter(|| {
            let mut bag = Bag::new();
            let tokens: Vec<_> = (0..BAG_SIZE).map(|i| bag.insert(i)).collect();

            for token in tokens.iter().rev() {
                bag.remove(token);
            }

            hint::black_box(bag.is_empty());
        });
    });

    group.bench_function("remove_insertion_order", |b| {
        b.iter(|| {
            let mut bag = Bag::new();
            let tokens: Vec<_> = (0..BAG_SIZE).map(|i| bag.insert(i)).collect();

            for token in &tokens {
                bag.remove(token);
            }

            hint::black_box(bag.is_empty());
        });
    });

    group.finish();
}

criterion_group!(benches, removal_patterns);
criterion_main!(benches);
