#![warn(clippy::pedantic)]

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{OptionExt, eyre};
use env_logger::TimestampPrecision;
use itertools::Itertools;
use log::{LevelFilter, error, info};
use lookup_table::LookupTable;
use nnn_core::{Config, Cube, FaceOrder, moves_to_string, parse_moves, random_moves};
use owo_colors::OwoColorize;

/// Works with NxNxN cubes: applies moves, checks parity and finishes reduced
/// cubes
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Solver configuration, in TOML format. Defaults are used when omitted.
    #[arg(long, short = 'c', value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (can be repeated)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, ValueEnum)]
enum StateOrder {
    /// U, L, F, R, B, D
    Ulfrbd,
    /// U, R, F, D, L, B as used by kociemba
    Urfdlb,
}

impl From<StateOrder> for FaceOrder {
    fn from(order: StateOrder) -> Self {
        match order {
            StateOrder::Ulfrbd => FaceOrder::Ulfrbd,
            StateOrder::Urfdlb => FaceOrder::Urfdlb,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a move sequence and print the cube.
    Rotate {
        #[arg(long, short)]
        size: usize,
        /// Starting facelets; a solved cube when omitted.
        #[arg(long)]
        state: Option<String>,
        #[arg(long, value_enum, default_value_t = StateOrder::Ulfrbd)]
        order: StateOrder,
        /// The moves, e.g. "Rw U2 3F' x".
        moves: String,
    },
    /// Print a random scramble.
    Scramble {
        #[arg(long, short)]
        size: usize,
        #[arg(long, short, default_value_t = 40)]
        length: usize,
        /// Seed for a reproducible scramble.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print swap counts and parity predictions for a cube.
    Parity {
        #[arg(long, short)]
        size: usize,
        #[arg(long)]
        state: String,
        #[arg(long, value_enum, default_value_t = StateOrder::Ulfrbd)]
        order: StateOrder,
    },
    /// Look a state up in a pattern database.
    Lookup {
        file: PathBuf,
        key: String,
        /// The file has fixed-width lines.
        #[arg(long)]
        fixed: bool,
    },
    /// Finish a cube whose centers are solved and edges are paired.
    Solve333 {
        #[arg(long, short)]
        size: usize,
        #[arg(long)]
        state: String,
        #[arg(long, value_enum, default_value_t = StateOrder::Ulfrbd)]
        order: StateOrder,
    },
}

fn load_cube(
    size: usize,
    config: &Config,
    state: Option<&str>,
    order: StateOrder,
) -> color_eyre::Result<Cube> {
    let mut cube = Cube::with_config(size, config, 0)?;
    if let Some(state) = state {
        cube.load_state(state, order.into())?;
        cube.sanity_check()?;
    }
    Ok(cube)
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .format_timestamp(Some(TimestampPrecision::Millis))
        .init();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Rotate {
            size,
            state,
            order,
            moves,
        } => {
            let mut cube = load_cube(size, &config, state.as_deref(), order)?;
            cube.rotate_moves(&parse_moves(&moves)?)?;
            print!("{}", cube.colored_net());
            println!("{}", cube.state_string());
        }
        Commands::Scramble { size, length, seed } => {
            if size < 2 {
                return Err(eyre!("A {size}x{size}x{size} cube can't be scrambled"));
            }
            let mut rng = seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
            println!("{}", moves_to_string(&random_moves(size, length, &mut rng)));
        }
        Commands::Parity { size, state, order } => {
            let mut cube = load_cube(size, &config, Some(&state), order)?;
            println!("corner swaps: {}", cube.get_corner_swap_count()?);
            if size > 2 {
                if cube.edges_paired() {
                    println!("edge swaps:   {}", cube.get_edge_swap_count(true, None, false)?);
                    println!(
                        "PLL parity:   {}",
                        cube.edge_solution_leads_to_pll_parity(false)?
                    );
                }
                let orbits = cube.center_solution_leads_to_oll_parity(false)?;
                println!(
                    "OLL parity:   {}",
                    if orbits.is_empty() {
                        "none".to_owned()
                    } else {
                        format!("orbits {}", orbits.iter().join(", "))
                    }
                );
            }
        }
        Commands::Lookup { file, key, fixed } => {
            let mut table = LookupTable::open(&file, fixed)?;
            let value = table
                .get(&key)?
                .ok_or_eyre(format!("{key} is not in {}", file.display()))?;
            println!("{value}");
        }
        Commands::Solve333 { size, state, order } => {
            let mut cube = load_cube(size, &config, Some(&state), order)?;
            if let Err(e) = cube.solve_333(&config) {
                error!("Could not solve the cube: {e}");
                return Err(e.into());
            }

            let solution = cube.solution_mut();
            let stats = solution.compress(size);
            println!("{}", solution.to_string().bold());
            for (phase, count) in &stats.phases {
                println!("{phase}: {count} moves");
            }
            info!("{} rotations removed", stats.rotations_removed);
            println!("total: {} moves", stats.total());
        }
    }

    Ok(())
}
