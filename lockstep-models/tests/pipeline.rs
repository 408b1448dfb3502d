use approx::assert_relative_eq;
use lockstep_components::link::{LinkConfig, LossyLink};
use lockstep_components::policy::SubstitutionPolicy;
use lockstep_components::{connect_port, option_box_repeat};
use lockstep_engine::run_simulation;
use lockstep_engine::test_helpers::start_test;
use lockstep_models::sensor::{Sensor, SensorConfig};
use lockstep_models::stage::{Stage, StageConfig, weighted_sum};

const SENSOR_CONFIG: SensorConfig = SensorConfig {
    start_tick: 0,
    period: 10,
    wcet: 2,
};

const STAGE_CONFIG: StageConfig = StageConfig {
    start_tick: 5,
    period: 10,
    wcet: 2,
    num_iterations: 10,
    tokens_per_iteration: 1,
    buffer_capacity: 4,
    policy: SubstitutionPolicy::Static,
};

#[test]
fn a_perfect_pipeline_computes_every_iteration() {
    let mut engine = start_test(file!());

    let sensor = Sensor::new_and_register(
        &engine,
        engine.top(),
        "sensor",
        1,
        SENSOR_CONFIG,
        option_box_repeat!(1.0 ; 10),
    )
    .unwrap();
    let link =
        LossyLink::new_and_register(&engine, engine.top(), "link", LinkConfig::default()).unwrap();
    let stage = Stage::new_and_register(
        &engine,
        engine.top(),
        "stage",
        1,
        0,
        STAGE_CONFIG,
        0.0,
        weighted_sum(vec![2.0]),
    )
    .unwrap();
    connect_port!(sensor, tx, 0 => link, rx).unwrap();
    connect_port!(link, tx => stage, rx, 0).unwrap();

    run_simulation!(engine);

    let outputs = stage.outputs();
    assert_eq!(outputs.len(), 10);
    for output in outputs {
        assert_relative_eq!(output, 2.0);
    }
    assert_eq!(stage.num_lost(0), 0);
    assert_eq!(stage.num_dropped(0), 0);
    assert_eq!(link.num_dropped(), 0);
}

#[test]
fn a_stage_combines_all_of_its_inputs() {
    let mut engine = start_test(file!());

    let stage = Stage::new_and_register(
        &engine,
        engine.top(),
        "stage",
        2,
        0,
        STAGE_CONFIG,
        0.0,
        weighted_sum(vec![1.0, 2.0]),
    )
    .unwrap();

    for (index, reading) in [1.0, 2.0].into_iter().enumerate() {
        let sensor = Sensor::new_and_register(
            &engine,
            engine.top(),
            &format!("sensor{index}"),
            1,
            SENSOR_CONFIG,
            option_box_repeat!(reading ; 10),
        )
        .unwrap();
        let link = LossyLink::new_and_register(
            &engine,
            engine.top(),
            &format!("link{index}"),
            LinkConfig::default(),
        )
        .unwrap();
        connect_port!(sensor, tx, 0 => link, rx).unwrap();
        connect_port!(link, tx => stage, rx, index).unwrap();
    }

    run_simulation!(engine);

    let outputs = stage.outputs();
    assert_eq!(outputs.len(), 10);
    for output in outputs {
        assert_relative_eq!(output, 1.0 * 1.0 + 2.0 * 2.0);
    }
}

#[test]
fn a_slow_stage_gathers_several_tokens_per_iteration() {
    let mut engine = start_test(file!());

    let sensor = Sensor::new_and_register(
        &engine,
        engine.top(),
        "sensor",
        1,
        SENSOR_CONFIG,
        option_box_repeat!(1.0 ; 10),
    )
    .unwrap();
    let link =
        LossyLink::new_and_register(&engine, engine.top(), "link", LinkConfig::default()).unwrap();
    // Half the sensor rate, consuming two readings at a time.
    let stage = Stage::new_and_register(
        &engine,
        engine.top(),
        "stage",
        1,
        0,
        StageConfig {
            start_tick: 25,
            period: 20,
            num_iterations: 5,
            tokens_per_iteration: 2,
            ..STAGE_CONFIG
        },
        0.0,
        weighted_sum(vec![1.0, 1.0]),
    )
    .unwrap();
    connect_port!(sensor, tx, 0 => link, rx).unwrap();
    connect_port!(link, tx => stage, rx, 0).unwrap();

    run_simulation!(engine);

    let outputs = stage.outputs();
    assert_eq!(outputs.len(), 5);
    for output in outputs {
        assert_relative_eq!(output, 2.0);
    }
    assert_eq!(stage.num_lost(0), 0);
}

#[test]
fn a_stage_demanding_more_than_its_buffers_hold_is_rejected() {
    let engine = start_test(file!());

    let result = Stage::new_and_register(
        &engine,
        engine.top(),
        "stage",
        1,
        0,
        StageConfig {
            tokens_per_iteration: 5,
            ..STAGE_CONFIG
        },
        0.0,
        weighted_sum(vec![1.0]),
    );
    // Misconfiguration must fail at construction, not on the first
    // activation.
    assert!(result.is_err());
}

#[test]
fn losses_are_substituted_and_counted() {
    let mut engine = start_test(file!());

    let sensor = Sensor::new_and_register(
        &engine,
        engine.top(),
        "sensor",
        1,
        SENSOR_CONFIG,
        option_box_repeat!(1.0 ; 10),
    )
    .unwrap();
    let config = LinkConfig {
        loss_probability: 0.3,
        seed: 9,
        ..LinkConfig::default()
    };
    let link = LossyLink::new_and_register(&engine, engine.top(), "link", config).unwrap();
    let stage = Stage::new_and_register(
        &engine,
        engine.top(),
        "stage",
        1,
        0,
        StageConfig {
            policy: SubstitutionPolicy::LastSeen,
            ..STAGE_CONFIG
        },
        0.0,
        weighted_sum(vec![1.0]),
    )
    .unwrap();
    connect_port!(sensor, tx, 0 => link, rx).unwrap();
    connect_port!(link, tx => stage, rx, 0).unwrap();

    run_simulation!(engine);

    // The cadence holds whatever the link did.
    assert_eq!(stage.outputs().len(), 10);
    // With a fixed single-tick delay, every loss is a substitution and
    // every delivery arrives in time.
    assert_eq!(stage.num_lost(0), link.num_dropped());
    assert_relative_eq!(stage.loss_rate(0), stage.num_lost(0) as f64 / 10.0);
}

#[test]
fn a_dead_link_falls_back_to_the_static_default() {
    let mut engine = start_test(file!());

    let sensor = Sensor::new_and_register(
        &engine,
        engine.top(),
        "sensor",
        1,
        SENSOR_CONFIG,
        option_box_repeat!(1.0 ; 10),
    )
    .unwrap();
    let config = LinkConfig {
        loss_probability: 1.0,
        ..LinkConfig::default()
    };
    let link = LossyLink::new_and_register(&engine, engine.top(), "link", config).unwrap();
    let stage = Stage::new_and_register(
        &engine,
        engine.top(),
        "stage",
        1,
        0,
        STAGE_CONFIG,
        3.0,
        weighted_sum(vec![1.0]),
    )
    .unwrap();
    connect_port!(sensor, tx, 0 => link, rx).unwrap();
    connect_port!(link, tx => stage, rx, 0).unwrap();

    run_simulation!(engine);

    let outputs = stage.outputs();
    assert_eq!(outputs.len(), 10);
    for output in outputs {
        assert_relative_eq!(output, 3.0);
    }
    assert_eq!(stage.num_lost(0), 10);
    assert_eq!(link.num_dropped(), 10);
    assert_relative_eq!(stage.loss_rate(0), 1.0);
}
