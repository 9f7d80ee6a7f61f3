use std::collections::BTreeSet;

use eventcast::{
    Event, EventSource, EventcastError, HistorySnapshot, LoopConfig, LoopState, MarkovModel,
    MarkovParams, ModelError, ModelOptions, NullSink, PredictionLoop, PredictiveModel,
    RawPrediction, ScriptedSource, SourceError, SourceSignal, Tick, VisualizationSink,
};

/// Predicts that the current event repeats at every horizon, so each
/// forecast carries the identity of the tick it was made at.
#[derive(Debug, Default)]
struct Echo {
    options: Option<ModelOptions>,
    runs: usize,
}

impl PredictiveModel for Echo {
    fn configure(&mut self, options: ModelOptions) -> Result<(), ModelError> {
        options.validate()?;
        self.options = Some(options);
        Ok(())
    }

    fn run(&mut self, event: Event) -> Result<RawPrediction, ModelError> {
        let options = self.options.as_ref().ok_or(ModelError::Unconfigured)?;
        self.runs += 1;
        Ok(options.horizons.iter().map(|h| (*h, Some(event))).collect())
    }

    fn options(&self) -> Option<&ModelOptions> {
        self.options.as_ref()
    }
}

#[derive(Debug, Default)]
struct RecordingSink {
    snapshots: Vec<HistorySnapshot>,
}

impl VisualizationSink for RecordingSink {
    fn render(&mut self, snapshot: &HistorySnapshot) {
        self.snapshots.push(snapshot.clone());
    }
}

fn echo_pipeline(horizons: &[u32], window: usize) -> PredictionLoop<Echo> {
    let mut model = Echo::default();
    model
        .configure(ModelOptions::with_horizons("event", horizons.iter().copied()))
        .unwrap();
    PredictionLoop::new(
        model,
        LoopConfig {
            window,
            display_horizon: None,
        },
    )
    .unwrap()
}

fn events(codes: impl IntoIterator<Item = u32>) -> ScriptedSource {
    ScriptedSource::new(codes.into_iter().map(Event::new))
}

#[test]
fn horizon_five_window_three_scenario() {
    let mut pipeline = echo_pipeline(&[5], 3);
    pipeline.start().unwrap();

    let mut resolved_at = Vec::new();
    for code in 1..=8 {
        let outcome = pipeline.step(Event::new(code)).unwrap();
        if let Some(resolution) = &outcome.resolution {
            resolved_at.push((outcome.tick, resolution.get(5)));
        }
    }

    assert_eq!(resolved_at[0], (Tick::new(5), Some(Event::new(1))));
    assert_eq!(resolved_at.iter().map(|(t, _)| t.index()).collect::<Vec<_>>(), vec![5, 6, 7]);
    assert_eq!(pipeline.history().actual(), vec![6.0, 7.0, 8.0]);
    assert_eq!(pipeline.history().predicted(), vec![1.0, 2.0, 3.0]);
}

#[test]
fn warm_up_boundary_matches_horizon() {
    for horizon in [1, 2, 5, 9] {
        let mut pipeline = echo_pipeline(&[horizon], 4);
        pipeline.start().unwrap();
        let resolved: Vec<bool> = (0..20)
            .map(|code| pipeline.step(Event::new(code)).unwrap().resolution.is_some())
            .collect();
        let h = horizon as usize;
        assert!(resolved[..h].iter().all(|r| !r), "horizon {horizon}");
        assert!(resolved[h..].iter().all(|r| *r), "horizon {horizon}");
    }
}

#[test]
fn pairs_stay_aligned_after_eviction() {
    // Event code == tick index, so an aligned pair differs by the horizon.
    let mut pipeline = echo_pipeline(&[3], 7);
    let mut sink = RecordingSink::default();
    let summary = pipeline.run(&mut events(0..100), &mut sink).unwrap();

    assert_eq!(summary.ticks, 100);
    assert_eq!(summary.resolved, 97);

    let actual = pipeline.history().actual();
    let predicted = pipeline.history().predicted();
    assert_eq!(actual, (93..100u32).map(f64::from).collect::<Vec<_>>());
    for (a, p) in actual.iter().zip(&predicted) {
        assert_eq!(a - p, 3.0);
    }
}

#[test]
fn capacity_holds_on_every_tick() {
    let mut pipeline = echo_pipeline(&[2], 5);
    assert_eq!(pipeline.history().actual().len(), 5);
    assert_eq!(pipeline.history().predicted(), vec![0.0; 5]);

    let mut sink = RecordingSink::default();
    pipeline.run(&mut events(1..=30), &mut sink).unwrap();

    assert_eq!(sink.snapshots.len(), 30);
    for snap in &sink.snapshots {
        assert_eq!(snap.actual.len(), 5);
        assert_eq!(snap.predicted.len(), 5);
    }
    // Sentinels remain until real pairs push them out.
    assert_eq!(sink.snapshots[2].actual, vec![0.0, 0.0, 0.0, 0.0, 3.0]);
    assert!(!sink.snapshots[1].resolved);
    assert!(sink.snapshots[2].resolved);
}

#[test]
fn multi_horizon_forecasts_land_on_their_ticks() {
    let mut model = Echo::default();
    model
        .configure(ModelOptions::with_horizons("event", [1, 4]))
        .unwrap();
    let mut pipeline = PredictionLoop::new(
        model,
        LoopConfig {
            window: 3,
            display_horizon: Some(4),
        },
    )
    .unwrap();
    pipeline.start().unwrap();

    let mut last = None;
    for code in 0..10 {
        last = Some(pipeline.step(Event::new(code)).unwrap());
    }
    let last = last.unwrap();
    let resolution = last.resolution.unwrap();
    assert_eq!(resolution.get(1), Some(Event::new(8)));
    assert_eq!(resolution.get(4), Some(Event::new(5)));
    assert_eq!(pipeline.history().actual(), vec![7.0, 8.0, 9.0]);
    assert_eq!(pipeline.history().predicted(), vec![3.0, 4.0, 5.0]);
}

#[test]
fn quit_mid_loop_stops_model() {
    let mut pipeline = echo_pipeline(&[5], 60);
    let mut source = events([3, 3, 1, 4]);
    let summary = pipeline.run(&mut source, &mut NullSink).unwrap();

    assert_eq!(pipeline.state(), LoopState::Terminated);
    assert_eq!(summary.ticks, 4);
    assert_eq!(summary.resolved, 0);
    assert_eq!(pipeline.model().runs, 4);
    assert!(summary.finished_at >= summary.started_at);

    // A terminated loop never runs the model again.
    let err = pipeline.run(&mut events([1]), &mut NullSink).unwrap_err();
    assert!(err.is_loop());
    assert_eq!(pipeline.model().runs, 4);
}

struct FailingSource {
    remaining: u32,
}

impl EventSource for FailingSource {
    fn next_signal(&mut self) -> Result<SourceSignal, SourceError> {
        if self.remaining == 0 {
            return Err(SourceError::Replay {
                reason: "truncated".to_string(),
            });
        }
        self.remaining -= 1;
        Ok(SourceSignal::Event(Event::new(1)))
    }
}

#[test]
fn source_error_terminates_and_propagates() {
    let mut pipeline = echo_pipeline(&[1], 3);
    let err = pipeline
        .run(&mut FailingSource { remaining: 2 }, &mut NullSink)
        .unwrap_err();
    assert!(matches!(err, EventcastError::Source(SourceError::Replay { .. })));
    assert_eq!(pipeline.state(), LoopState::Terminated);
    assert_eq!(pipeline.tick(), Tick::new(2));
}

#[test]
fn malformed_event_terminates_and_propagates() {
    let mut model = MarkovModel::new(MarkovParams {
        order: 1,
        alphabet: Some(BTreeSet::from([1, 2, 3, 4])),
    });
    model.configure(ModelOptions::default()).unwrap();
    let mut pipeline = PredictionLoop::new(model, LoopConfig::default()).unwrap();

    let mut source = events([1, 2, 9, 3]);
    let err = pipeline.run(&mut source, &mut NullSink).unwrap_err();
    assert!(matches!(
        err,
        EventcastError::Model(ModelError::MalformedEvent { event: 9, .. })
    ));
    assert_eq!(pipeline.state(), LoopState::Terminated);
    assert_eq!(pipeline.model().observed(), 2);
    assert_eq!(source.remaining(), 1);
}

#[test]
fn markov_model_locks_onto_periodic_steering() {
    // right, right, up, up, ...
    let cycle: Vec<u32> = [3, 3, 1, 1].repeat(10);
    let mut model = MarkovModel::new(MarkovParams {
        order: 2,
        alphabet: None,
    });
    model.configure(ModelOptions::default()).unwrap();
    let mut pipeline = PredictionLoop::new(model, LoopConfig::default()).unwrap();
    pipeline.start().unwrap();

    let outcomes: Vec<_> = cycle
        .iter()
        .map(|code| pipeline.step(Event::new(*code)).unwrap())
        .collect();

    for outcome in &outcomes[20..] {
        let (actual, predicted) = outcome.recorded.expect("steady state resolves every tick");
        assert_eq!(actual, predicted, "tick {}", outcome.tick);
    }
}
