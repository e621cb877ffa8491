use clap::Parser;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

use rusty_gasnet::error::GasNetError;
use rusty_gasnet::gas::{DispersionKind, Gas};
use rusty_gasnet::network::{step_population, Network};

#[derive(Parser, Debug)]
struct Args {
    /// The seed used for network sampling and neuron activity
    #[arg(long, default_value = "0")]
    seed: u64,
    /// The number of neurons
    #[arg(short = 'L', long, default_value = "50")]
    num_neurons: usize,
    /// The side of the square the neurons are placed in
    #[arg(long, default_value = "20.0")]
    extent: f64,
    /// The number of emitting neurons
    #[arg(long, default_value = "5")]
    num_emitters: usize,
    /// The emission radius of every emitter
    #[arg(long, default_value = "8.0")]
    emission_radius: f64,
    /// The propagation speed of the gas
    #[arg(long, default_value = "2.0")]
    speed: f64,
    /// The dispersion kind of the gas, must be one of: flat, decay
    #[arg(long, default_value = "decay")]
    dispersion: String,
    /// The probability for a neuron to be active at each tick
    #[arg(long, default_value = "0.5")]
    firing_rate: f64,
    /// The fraction of buildup kept from one tick to the next
    #[arg(long, default_value = "0.5")]
    retention: f64,
    /// The number of simulated ticks
    #[arg(short = 'T', long, default_value = "20")]
    num_ticks: usize,
    /// The number of network copies in the population
    #[arg(long, default_value = "16")]
    population: usize,
    /// The log level
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn main() -> Result<(), GasNetError> {
    let args = Args::parse();

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{l} - {m}\n")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(args.log_level))
        .map_err(|e| GasNetError::ConfigurationError(e.to_string()))?;
    log4rs::init_config(config).map_err(|e| GasNetError::ConfigurationError(e.to_string()))?;

    log::info!("{:?}", args);

    if !(0.0..=1.0).contains(&args.firing_rate) {
        return Err(GasNetError::ConfigurationError(format!(
            "Firing rate must be in [0, 1], got {}",
            args.firing_rate
        )));
    }

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut network = Network::rand(args.num_neurons, args.extent, &mut rng)?;
    let kind = args.dispersion.parse::<DispersionKind>()?;
    network.add_gas(Gas::new("no", args.speed, kind)?);
    for source_id in 0..args.num_emitters.min(args.num_neurons) {
        let strength = rng.gen_range(0.0..=0.5);
        network.add_emitter(source_id, "no", args.emission_radius, strength)?;
    }
    log::info!("Network sampling: done!");

    let mut population = network.replicate(args.population.max(1));
    for tick in 0..args.num_ticks {
        let active: HashSet<usize> = (0..args.num_neurons)
            .filter(|_| rng.gen_bool(args.firing_rate))
            .collect();

        step_population(&mut population, &active)?;

        let total: f64 = population[0]
            .neuron_ids()
            .into_iter()
            .filter_map(|id| population[0].neuron(id))
            .map(|neuron| neuron.receptor().buildup("no"))
            .sum();
        log::info!(
            "Tick {}: {} active neurons, total buildup {:.4}",
            tick,
            active.len(),
            total
        );

        population
            .iter_mut()
            .for_each(|network| network.decay_buildups(args.retention));
    }

    let strengths: Vec<f64> = population[0]
        .emitters()
        .iter()
        .map(|emitter| emitter.unit().current_strength())
        .collect();
    log::info!("Final emitter strengths: {:?}", strengths);
    Ok(())
}
