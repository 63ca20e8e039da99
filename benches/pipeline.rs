use criterion::{black_box, criterion_group, criterion_main, Criterion};
use handtype::gesture::{classify, GestureParams};
use handtype::vision::synthetic;
use handtype::{HandTypeConfig, LandmarkFrame, Session, SessionCommand, TextConnector};
use std::time::Duration;

fn bench_classify(c: &mut Criterion) {
    let params = GestureParams::default();
    let screen = HandTypeConfig::default().screen;
    let open = synthetic::open_hand(0.4, 0.7);
    let pinch = synthetic::pinch(0.4, 0.7);

    c.bench_function("classify_open_hand", |b| {
        b.iter(|| classify(black_box(Some(&open)), &params, screen))
    });
    c.bench_function("classify_pinch", |b| {
        b.iter(|| classify(black_box(Some(&pinch)), &params, screen))
    });
}

fn bench_process_frame(c: &mut Criterion) {
    let mut session = Session::new(
        HandTypeConfig::default(),
        TextConnector::heuristic(Duration::from_secs(1)),
    );
    session.apply_command(SessionCommand::Mount);

    let frames: Vec<LandmarkFrame> = (0..64)
        .map(|i| {
            let x = 0.2 + 0.6 * (i as f32 / 64.0);
            let hand = if i % 16 < 12 {
                synthetic::open_hand(x, 0.75)
            } else {
                synthetic::pinch(x, 0.75)
            };
            LandmarkFrame::with_hand(hand)
        })
        .collect();

    c.bench_function("process_frame", |b| {
        let mut i = 0;
        b.iter(|| {
            let event = session.process_frame(black_box(&frames[i % frames.len()]));
            i += 1;
            // Keep the buffer from growing without bound.
            if i % 1024 == 0 {
                session.apply_command(SessionCommand::Key("clear".into()));
                session.take_requests();
            }
            event
        })
    });
}

criterion_group!(benches, bench_classify, bench_process_frame);
criterion_main!(benches);
