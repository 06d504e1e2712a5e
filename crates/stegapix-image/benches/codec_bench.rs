// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the LSB codec in the stegapix-image crate.
// Embeds and extracts a 512x512 RGB message, the size range search results
// typically land in after the veil has been resized.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use stegapix_image::{LsbCodec, PixelGrid};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn synthetic_grid(size: u32, seed: usize) -> PixelGrid {
    let len = (size * size * 3) as usize;
    let data = (0..len).map(|i| ((i * 31 + seed) % 256) as u8).collect();
    PixelGrid::new(size, size, 3, data).expect("synthetic grid")
}

fn bench_embed(c: &mut Criterion) {
    let codec = LsbCodec::default();
    let veil = synthetic_grid(512, 7);
    let message = synthetic_grid(512, 101);

    c.bench_function("lsb_embed (512x512 rgb, 2 bits)", |b| {
        b.iter(|| {
            let steg = codec
                .embed(black_box(&veil), black_box(&message))
                .expect("embed");
            black_box(steg);
        });
    });
}

fn bench_extract(c: &mut Criterion) {
    let codec = LsbCodec::default();
    let steg = codec
        .embed(&synthetic_grid(512, 7), &synthetic_grid(512, 101))
        .expect("embed");

    c.bench_function("lsb_extract (512x512 rgb, 2 bits)", |b| {
        b.iter(|| {
            let recovered = codec.extract(black_box(&steg)).expect("extract");
            black_box(recovered);
        });
    });
}

criterion_group!(benches, bench_embed, bench_extract);
criterion_main!(benches);
