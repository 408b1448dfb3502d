use std::cell::RefCell;
use std::rc::Rc;

use lockstep_engine::run_simulation;
use lockstep_engine::test_helpers::start_test;

#[test]
fn waits_complete_in_time_order() {
    let mut engine = start_test(file!());
    let clock = engine.clock();
    let order: Rc<RefCell<Vec<(u64, &str)>>> = Rc::new(RefCell::new(Vec::new()));

    {
        let clock = clock.clone();
        let order = order.clone();
        engine.spawn(async move {
            clock.wait_ticks(10).await;
            order.borrow_mut().push((clock.tick_now(), "a"));
            Ok(())
        });
    }
    {
        let clock = clock.clone();
        let order = order.clone();
        engine.spawn(async move {
            clock.wait_ticks(5).await;
            order.borrow_mut().push((clock.tick_now(), "b"));
            clock.wait_ticks(10).await;
            order.borrow_mut().push((clock.tick_now(), "b"));
            Ok(())
        });
    }

    run_simulation!(engine);

    assert_eq!(
        *order.borrow(),
        vec![(5, "b"), (10, "a"), (15, "b")],
        "tasks must be woken in tick order"
    );
    assert_eq!(clock.tick_now(), 15);
}

#[test]
fn wait_until_gives_a_drift_free_cadence() {
    let mut engine = start_test(file!());
    let clock = engine.clock();
    let ticks: Rc<RefCell<Vec<u64>>> = Rc::new(RefCell::new(Vec::new()));

    const PERIOD: u64 = 7;

    {
        let clock = clock.clone();
        let ticks = ticks.clone();
        engine.spawn(async move {
            for i in 1..=4u64 {
                clock.wait_until(i * PERIOD).await;
                ticks.borrow_mut().push(clock.tick_now());
            }
            Ok(())
        });
    }

    run_simulation!(engine);
    assert_eq!(*ticks.borrow(), vec![7, 14, 21, 28]);
}

#[test]
fn wait_until_the_past_completes_immediately() {
    let mut engine = start_test(file!());
    let clock = engine.clock();

    {
        let clock = clock.clone();
        engine.spawn(async move {
            clock.wait_ticks(3).await;
            // Already at tick 3 - must not park forever.
            clock.wait_until(1).await;
            assert_eq!(clock.tick_now(), 3);
            Ok(())
        });
    }

    run_simulation!(engine);
}

#[test]
fn background_wait_does_not_hold_the_simulation_open() {
    let mut engine = start_test(file!());
    let clock = engine.clock();
    let background_wakes = Rc::new(RefCell::new(0usize));

    {
        let clock = clock.clone();
        let background_wakes = background_wakes.clone();
        engine.spawn(async move {
            loop {
                clock.wait_ticks_or_exit(2).await;
                *background_wakes.borrow_mut() += 1;
            }
        });
    }
    {
        let clock = clock.clone();
        engine.spawn(async move {
            clock.wait_ticks(5).await;
            Ok(())
        });
    }

    run_simulation!(engine);

    // The background task ticks along only while the foreground task keeps
    // the clock alive.
    assert_eq!(clock.tick_now(), 5);
    assert_eq!(*background_wakes.borrow(), 2);
}
