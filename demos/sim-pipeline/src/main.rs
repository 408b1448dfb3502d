//! Simulate a sensor feeding a chain of compute stages over lossy links.
//!
//! The sensor emits one reading per period. Every hop goes through a link
//! that delays, jitters and loses traffic, so each stage leans on its
//! sequenced buffers and substitution policy to keep its cadence. At the
//! end of the run the per-stage loss statistics are reported.

use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use lockstep_components::connect_port;
use lockstep_components::link::{LinkConfig, LossyLink};
use lockstep_components::policy::SubstitutionPolicy;
use lockstep_engine::engine::Engine;
use lockstep_engine::types::{SimError, SimResult};
use lockstep_models::sensor::{Sensor, SensorConfig};
use lockstep_models::stage::{Stage, StageConfig, weighted_sum};
use lockstep_track::{info, logger};
use serde::{Deserialize, Serialize};

/// Command-line arguments.
#[derive(Parser)]
#[command(about = "Lossy pipeline simulation")]
struct Cli {
    /// Enable logging to the console.
    #[arg(long, default_value = "false")]
    stdout: bool,

    /// Level of log message to display.
    #[arg(long, default_value = "Info")]
    stdout_level: log::Level,

    /// A TOML file with a [`Config`] to load before applying overrides.
    #[arg(long)]
    config: Option<String>,

    /// Override the number of compute stages in the chain.
    #[arg(long)]
    stages: Option<usize>,

    /// Override the number of iterations to simulate.
    #[arg(long)]
    iterations: Option<u64>,

    /// Override the ticks between activations.
    #[arg(long)]
    period: Option<u64>,

    /// Override the ticks each activation computes for.
    #[arg(long)]
    wcet: Option<u64>,

    /// Override the per-input buffer capacity in tokens.
    #[arg(long)]
    buffer_capacity: Option<usize>,

    /// Override the substitution policy
    /// (static | last-seen | running-average).
    #[arg(long)]
    policy: Option<String>,

    /// Override the value substituted by the static policy.
    #[arg(long)]
    default_value: Option<f64>,

    /// Override the base link delay in ticks.
    #[arg(long)]
    delay_ticks: Option<u64>,

    /// Override the extra uniformly-drawn link delay in ticks.
    #[arg(long)]
    jitter_ticks: Option<u64>,

    /// Override the probability that a link loses a message.
    #[arg(long)]
    loss_probability: Option<f64>,

    /// Override the probability that a link duplicates a message.
    #[arg(long)]
    duplicate_probability: Option<f64>,

    /// Override the seed for the links' random generators.
    #[arg(long)]
    seed: Option<u64>,
}

/// The simulated platform.
#[derive(Debug, Serialize, Deserialize)]
struct Config {
    stages: usize,
    iterations: u64,
    period: u64,
    wcet: u64,
    buffer_capacity: usize,
    policy: String,
    default_value: f64,
    delay_ticks: u64,
    jitter_ticks: u64,
    loss_probability: f64,
    duplicate_probability: f64,
    seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stages: 3,
            iterations: 100,
            period: 20,
            wcet: 2,
            buffer_capacity: 8,
            policy: "last-seen".to_string(),
            default_value: 0.0,
            delay_ticks: 2,
            jitter_ticks: 4,
            loss_probability: 0.1,
            duplicate_probability: 0.0,
            seed: 1,
        }
    }
}

impl Config {
    /// Layer the defaults, an optional TOML file, environment variables
    /// and finally the command-line overrides.
    fn parse_all_sources(cli: &Cli) -> Result<Self, SimError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(file) = &cli.config {
            figment = figment.merge(Toml::file(file));
        }
        figment = figment.merge(Env::prefixed("LOCKSTEP_"));
        let mut config: Config = figment
            .extract()
            .map_err(|e| SimError(format!("bad configuration: {e}")))?;

        macro_rules! cli_override {
            ($($field:ident),+) => {
                $(if let Some(value) = &cli.$field {
                    config.$field = value.clone();
                })+
            };
        }
        cli_override!(
            stages,
            iterations,
            period,
            wcet,
            buffer_capacity,
            policy,
            default_value,
            delay_ticks,
            jitter_ticks,
            loss_probability,
            duplicate_probability,
            seed
        );
        Ok(config)
    }
}

fn main() -> SimResult {
    let cli = Cli::parse();
    let config = Config::parse_all_sources(&cli)?;

    if cli.stdout {
        logger::init_stdout(cli.stdout_level)
            .map_err(|e| SimError(format!("failed to install the logger: {e}")))?;
    }

    let policy = config
        .policy
        .parse::<SubstitutionPolicy>()
        .map_err(SimError)?;

    let mut engine = Engine::new("pipeline");
    let top = engine.top().clone();
    info!(top ;
        "{} stages, {} iterations of period {}, {policy} policy, {:.0}% loss per link",
        config.stages, config.iterations, config.period,
        config.loss_probability * 100.0);

    let sensor = Sensor::new_and_register(
        &engine,
        &top,
        "sensor",
        1,
        SensorConfig {
            start_tick: 0,
            period: config.period,
            wcet: config.wcet,
        },
        Some(Box::new(
            (0..config.iterations).map(|i| (i % 16) as f64),
        )),
    )?;

    // Stagger the stages so that an on-time packet beats the reader even
    // with the worst jitter.
    let phase = config.wcet + config.delay_ticks + config.jitter_ticks + 1;

    let mut links = Vec::with_capacity(config.stages);
    let mut stages: Vec<std::rc::Rc<Stage<f64>>> = Vec::with_capacity(config.stages);
    for index in 0..config.stages {
        let last = index + 1 == config.stages;
        let link = LossyLink::new_and_register(
            &engine,
            &top,
            &format!("link{index}"),
            LinkConfig {
                delay_ticks: config.delay_ticks,
                jitter_ticks: config.jitter_ticks,
                loss_probability: config.loss_probability,
                duplicate_probability: config.duplicate_probability,
                seed: config.seed.wrapping_add(index as u64),
            },
        )?;
        let stage = Stage::new_and_register(
            &engine,
            &top,
            &format!("stage{index}"),
            1,
            if last { 0 } else { 1 },
            StageConfig {
                start_tick: phase * (index as u64 + 1),
                period: config.period,
                wcet: config.wcet,
                num_iterations: config.iterations,
                tokens_per_iteration: 1,
                buffer_capacity: config.buffer_capacity,
                policy,
            },
            config.default_value,
            weighted_sum(vec![1.0]),
        )?;

        if index == 0 {
            connect_port!(sensor, tx, 0 => link, rx)?;
        } else {
            connect_port!(stages[index - 1], tx, 0 => link, rx)?;
        }
        connect_port!(link, tx => stage, rx, 0)?;

        links.push(link);
        stages.push(stage);
    }

    run_simulation_and_report(&mut engine, &config, &links, &stages)
}

type Links = [std::rc::Rc<LossyLink<lockstep_models::packet::Packet<f64>>>];
type Stages = [std::rc::Rc<Stage<f64>>];

fn run_simulation_and_report(
    engine: &mut Engine,
    config: &Config,
    links: &Links,
    stages: &Stages,
) -> SimResult {
    engine.run()?;

    println!("completed {} iterations", config.iterations);
    for (index, (link, stage)) in links.iter().zip(stages).enumerate() {
        println!(
            "stage{index}: lost {} of {} ({:.1}%), link dropped {} duplicated {}, \
             window overflow dropped {}",
            stage.num_lost(0),
            config.iterations,
            stage.loss_rate(0) * 100.0,
            link.num_dropped(),
            link.num_duplicated(),
            stage.num_dropped(0),
        );
    }
    if let Some(last) = stages.last() {
        let outputs = last.outputs();
        if let Some(output) = outputs.last() {
            println!("final output after {} iterations: {output}", outputs.len());
        }
    }
    Ok(())
}
