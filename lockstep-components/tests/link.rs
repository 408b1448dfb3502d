use lockstep_components::link::{LinkConfig, LossyLink};
use lockstep_components::sink::Sink;
use lockstep_components::source::Source;
use lockstep_components::{connect_port, option_box_repeat};
use lockstep_engine::run_simulation;
use lockstep_engine::test_helpers::start_test;

#[test]
fn a_perfect_link_delivers_everything() {
    let mut engine = start_test(file!());

    let source = Source::new_and_register(
        &engine,
        engine.top(),
        "source",
        option_box_repeat!(7 ; 20),
    );
    let link =
        LossyLink::new_and_register(&engine, engine.top(), "link", LinkConfig::default()).unwrap();
    let sink = Sink::new_and_register(&engine, engine.top(), "sink");
    connect_port!(source, tx => link, rx).unwrap();
    connect_port!(link, tx => sink, rx).unwrap();

    run_simulation!(engine);
    assert_eq!(sink.num_sunk(), 20);
    assert_eq!(link.num_dropped(), 0);
    assert_eq!(link.num_duplicated(), 0);
}

#[test]
fn jitter_delays_but_never_loses() {
    let mut engine = start_test(file!());

    let source = Source::new_and_register(
        &engine,
        engine.top(),
        "source",
        option_box_repeat!(1 ; 10),
    );
    let config = LinkConfig {
        delay_ticks: 2,
        jitter_ticks: 5,
        seed: 7,
        ..LinkConfig::default()
    };
    let link = LossyLink::new_and_register(&engine, engine.top(), "link", config).unwrap();
    let sink = Sink::new_and_register(&engine, engine.top(), "sink");
    connect_port!(source, tx => link, rx).unwrap();
    connect_port!(link, tx => sink, rx).unwrap();

    run_simulation!(engine);
    assert_eq!(sink.num_sunk(), 10);
}

fn run_lossy(seed: u64) -> (usize, u64) {
    let mut engine = start_test(file!());

    let source = Source::new_and_register(
        &engine,
        engine.top(),
        "source",
        option_box_repeat!(3 ; 50),
    );
    let config = LinkConfig {
        loss_probability: 0.3,
        seed,
        ..LinkConfig::default()
    };
    let link = LossyLink::new_and_register(&engine, engine.top(), "link", config).unwrap();
    let sink = Sink::new_and_register(&engine, engine.top(), "sink");
    connect_port!(source, tx => link, rx).unwrap();
    connect_port!(link, tx => sink, rx).unwrap();

    run_simulation!(engine);
    (sink.num_sunk(), link.num_dropped())
}

#[test]
fn losses_are_seeded_and_reproducible() {
    let (sunk_a, dropped_a) = run_lossy(42);
    let (sunk_b, dropped_b) = run_lossy(42);

    assert_eq!(sunk_a, sunk_b);
    assert_eq!(dropped_a, dropped_b);
    // Every message is either delivered or counted as dropped.
    assert_eq!(sunk_a + dropped_a as usize, 50);
}

#[test]
fn probabilities_outside_the_unit_interval_are_rejected() {
    let engine = start_test(file!());
    let config = LinkConfig {
        loss_probability: 1.5,
        ..LinkConfig::default()
    };
    assert!(LossyLink::<i32>::new_and_register(&engine, engine.top(), "link", config).is_err());
}
