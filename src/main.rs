#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use clap::Parser;
    use pasture::engine::{Engine, SCENARIO_SHEEP_AND_WOLVES};
    use pasture::models::pasture::DEFAULT_SEED;
    use pasture::{PastureConfig, Result, logging};
    use std::path::PathBuf;

    /// Headless sheep-vs-wolves run
    #[derive(Parser)]
    #[command(author, version, about, long_about = None)]
    struct Args {
        /// Built-in scenario id
        #[arg(long, default_value = SCENARIO_SHEEP_AND_WOLVES)]
        scenario: String,

        /// Number of ticks to simulate
        #[arg(long, default_value_t = 500)]
        ticks: u64,

        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Override the flock size (switches to a custom run)
        #[arg(long)]
        sheep: Option<usize>,

        /// Override the founder wolf count (switches to a custom run)
        #[arg(long)]
        wolves: Option<usize>,

        /// JSON pasture config; takes precedence over --scenario
        #[arg(long)]
        config: Option<PathBuf>,

        /// Log the census every N ticks (0 disables)
        #[arg(long, default_value_t = 50)]
        report_every: u64,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    }

    fn build_engine(args: &Args) -> Result<Engine> {
        if let Some(path) = &args.config {
            let text = std::fs::read_to_string(path)?;
            let mut config = PastureConfig::from_json(&text)?;
            config.sheep = args.sheep.unwrap_or(config.sheep);
            config.wolves = args.wolves.unwrap_or(config.wolves);
            return Engine::from_config(&config);
        }
        if args.sheep.is_none() && args.wolves.is_none() {
            return Engine::new_builtin(&args.scenario, args.seed);
        }
        let mut config = PastureConfig { seed: args.seed, ..PastureConfig::default() };
        config.sheep = args.sheep.unwrap_or(config.sheep);
        config.wolves = args.wolves.unwrap_or(config.wolves);
        Engine::from_config(&config)
    }

    fn report(engine: &Engine) {
        let census = engine
            .census()
            .iter()
            .map(|(class, n)| format!("{}={}", class, n))
            .collect::<Vec<_>>()
            .join(" ");
        log::info!("tick {}: {}", engine.tick_count(), census);
    }

    pub fn run() -> Result<()> {
        let args = Args::parse();
        logging::init(args.verbose);

        let mut engine = build_engine(&args)?;
        report(&engine);
        for _ in 0..args.ticks {
            engine.tick();
            if args.report_every > 0 && engine.tick_count() % args.report_every == 0 {
                report(&engine);
            }
        }
        if args.report_every == 0 || args.ticks % args.report_every != 0 {
            report(&engine);
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(e) = cli::run() {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
