use approx::assert_relative_eq;
use lockstep_components::policy::{Estimator, SubstitutionPolicy};

#[test]
fn static_policy_always_uses_the_default() {
    let mut estimator = Estimator::new(SubstitutionPolicy::Static, 0.5);
    assert_relative_eq!(estimator.substitute(), 0.5);
    estimator.record(&9.0);
    assert_relative_eq!(estimator.substitute(), 0.5);
}

#[test]
fn last_seen_tracks_the_most_recent_value() {
    let mut estimator = Estimator::new(SubstitutionPolicy::LastSeen, 0.0);
    estimator.record(&1.0);
    estimator.record(&2.5);
    assert_relative_eq!(estimator.substitute(), 2.5);
}

#[test]
fn last_seen_before_any_arrival_uses_the_default() {
    let mut estimator = Estimator::new(SubstitutionPolicy::LastSeen, 0.25);
    assert_relative_eq!(estimator.substitute(), 0.25);
}

#[test]
fn running_average_substitutes_the_mean_of_what_arrived() {
    let mut estimator = Estimator::new(SubstitutionPolicy::RunningAverage, 0.0);
    estimator.record(&2.0);
    estimator.record(&4.0);
    assert_relative_eq!(estimator.substitute(), 3.0);
}

#[test]
fn running_average_with_nothing_received_is_zero() {
    let mut estimator = Estimator::new(SubstitutionPolicy::RunningAverage, 0.9);
    assert_relative_eq!(estimator.substitute(), 0.0);
}

#[test]
fn losses_are_counted_for_the_loss_rate() {
    let mut estimator = Estimator::new(SubstitutionPolicy::Static, 0.0);
    assert_relative_eq!(estimator.loss_rate(), 0.0);

    estimator.record(&1.0);
    estimator.record(&1.0);
    estimator.record(&1.0);
    estimator.substitute();
    assert_eq!(estimator.num_received(), 3);
    assert_eq!(estimator.num_lost(), 1);
    assert_relative_eq!(estimator.loss_rate(), 0.25);
}

#[test]
fn policies_parse_from_their_names() {
    assert_eq!(
        "static".parse::<SubstitutionPolicy>().unwrap(),
        SubstitutionPolicy::Static
    );
    assert_eq!(
        "last-seen".parse::<SubstitutionPolicy>().unwrap(),
        SubstitutionPolicy::LastSeen
    );
    assert_eq!(
        "running-average".parse::<SubstitutionPolicy>().unwrap(),
        SubstitutionPolicy::RunningAverage
    );
    assert!("best-effort".parse::<SubstitutionPolicy>().is_err());
}
