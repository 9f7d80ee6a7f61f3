use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use eventcast::{
    Event, ForecastShifter, HistoryWindow, LoopConfig, MarkovModel, MarkovParams, ModelOptions,
    PredictionLoop, PredictiveModel, RawPrediction, Tick,
};

fn steady_state_loop() -> PredictionLoop<MarkovModel> {
    let mut model = MarkovModel::new(MarkovParams {
        order: 2,
        alphabet: None,
    });
    model
        .configure(ModelOptions::with_horizons("event", [1, 5, 10]))
        .unwrap();
    let mut pipeline = PredictionLoop::new(model, LoopConfig::default()).unwrap();
    pipeline.start().unwrap();

    // Warm up so every tick resolves.
    for i in 0..1_000u32 {
        pipeline.step(Event::new(1 + i % 4)).unwrap();
    }
    pipeline
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Elements(1));

    group.bench_function("tick/markov_three_horizons", |b| {
        let mut pipeline = steady_state_loop();
        let mut i = 0u32;
        b.iter(|| {
            i = i.wrapping_add(1);
            black_box(pipeline.step(Event::new(1 + i % 4)).unwrap());
        });
    });

    group.bench_function("shifter/accept_resolve", |b| {
        let raw = RawPrediction::new()
            .with(1, Some(Event::new(1)))
            .with(5, Some(Event::new(2)))
            .with(10, Some(Event::new(3)));
        b.iter_batched_ref(
            ForecastShifter::new,
            |shifter| {
                for t in 0..64 {
                    let tick = Tick::new(t);
                    shifter.accept(tick, &raw);
                    black_box(shifter.resolve(tick));
                }
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("history/record_snapshot", |b| {
        let mut window = HistoryWindow::default();
        let mut t = 0u64;
        b.iter(|| {
            t += 1;
            window.record(1.0, 2.0);
            black_box(window.snapshot(Tick::new(t), true));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);
