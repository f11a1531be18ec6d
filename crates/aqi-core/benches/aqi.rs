use aqi_core::{calculate_aqi, safety_score, AirSample};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_calculate_aqi(c: &mut Criterion) {
    c.bench_function("calculate_aqi_sweep", |b| {
        b.iter(|| {
            let mut total = 0u32;
            let mut pm25 = 0.0;
            while pm25 < 520.0 {
                total += calculate_aqi(black_box(pm25));
                pm25 += 0.7;
            }
            total
        })
    });
}

fn bench_safety_score(c: &mut Criterion) {
    let sample = AirSample {
        pm10: 80.0,
        pm25: 42.0,
        co2: 950.0,
        humidity: 72.0,
        temperature: 31.0,
    };
    c.bench_function("safety_score", |b| b.iter(|| safety_score(black_box(&sample))));
}

criterion_group!(benches, bench_calculate_aqi, bench_safety_score);
criterion_main!(benches);
