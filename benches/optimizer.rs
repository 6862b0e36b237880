use criterion::*;
use cutstock_core::algorithms::{Algorithm1D, Algorithm2D};
use cutstock_core::model::{AlgorithmOptions, Piece1D, Piece2D, Stock1D, Stock2D};
use cutstock_core::{Bfd, BottomLeftFill, Ffd, Guillotine};

fn pieces_1d(count: u32) -> Vec<Piece1D> {
    (0..count)
        .map(|i| Piece1D {
            id: format!("p{i}"),
            order_item_id: format!("o{i}"),
            length: 100 + (i % 17) * 13,
            quantity: 1,
        })
        .collect()
}

fn stock_1d() -> Vec<Stock1D> {
    vec![
        Stock1D { id: "s1".into(), length: 2400, available: 50, unit_price: None },
        Stock1D { id: "s2".into(), length: 3000, available: 50, unit_price: None },
    ]
}

fn pieces_2d(count: u32) -> Vec<Piece2D> {
    (0..count)
        .map(|i| Piece2D {
            id: format!("p{i}"),
            order_item_id: format!("o{i}"),
            width: 100 + (i % 11) * 17,
            height: 80 + (i % 7) * 23,
            quantity: 1,
            can_rotate: true,
        })
        .collect()
}

fn stock_2d() -> Vec<Stock2D> {
    vec![Stock2D { id: "sheet1".into(), width: 1220, height: 2440, available: 50, unit_price: None }]
}

fn benchmark_ffd(c: &mut Criterion) {
    let pieces = pieces_1d(40);
    let stock = stock_1d();
    c.bench_function("1d ffd", |b| b.iter(|| Ffd.execute(black_box(&pieces), black_box(&stock), AlgorithmOptions::default())));
}

fn benchmark_bfd(c: &mut Criterion) {
    let pieces = pieces_1d(40);
    let stock = stock_1d();
    c.bench_function("1d bfd", |b| b.iter(|| Bfd.execute(black_box(&pieces), black_box(&stock), AlgorithmOptions::default())));
}

fn benchmark_bottom_left_fill(c: &mut Criterion) {
    let pieces = pieces_2d(30);
    let stock = stock_2d();
    c.bench_function("2d bottom-left fill", |b| {
        b.iter(|| BottomLeftFill.execute(black_box(&pieces), black_box(&stock), AlgorithmOptions::default()))
    });
}

fn benchmark_guillotine(c: &mut Criterion) {
    let pieces = pieces_2d(30);
    let stock = stock_2d();
    c.bench_function("2d guillotine", |b| b.iter(|| Guillotine.execute(black_box(&pieces), black_box(&stock), AlgorithmOptions::default())));
}

criterion_group!(benches, benchmark_ffd, benchmark_bfd, benchmark_bottom_left_fill, benchmark_guillotine);
criterion_main!(benches);
