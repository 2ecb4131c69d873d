mod bytecode;
mod catalog;
mod output;
mod program;
mod synth;

use std::error::Error;
use std::io;

use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::{Catalog, Selection};
use crate::output::Format;
use crate::program::Program;
use crate::synth::marginal::{self, MarginalParams};
use crate::synth::random::{self, RandomParams};

const DEFAULT_OPCODES_FILE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/opcodes.csv");
const DEFAULT_SELECTION_FILE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/selection.csv");

#[derive(Parser)]
#[command(name = "evmgen", version, about = "EVM bytecode test-vector generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Arguments shared by both generation engines.
#[derive(Args)]
struct CommonArgs {
    /// Operation catalog CSV
    #[arg(long, default_value = DEFAULT_OPCODES_FILE)]
    opcodes_file: String,

    /// Selection CSV scoping which operations are generated
    #[arg(long, default_value = DEFAULT_SELECTION_FILE)]
    selection_file: String,

    /// Seed for every random draw of the run
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// One bytecode per line instead of CSV
    #[arg(long)]
    plain: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Sweep isolation programs whose shape does not depend on the
    /// repetition count
    Marginal {
        /// Generate for this mnemonic only, instead of the whole selection
        #[arg(long)]
        opcode: Option<String>,

        /// Largest repetition count in the sweep
        #[arg(long, default_value_t = 50)]
        max_op_count: u32,

        /// Distance between consecutive repetition counts
        #[arg(long, default_value_t = 5)]
        step_op_count: u32,

        /// Shuffle the repetition counts before sweeping
        #[arg(long)]
        shuffle_counts: bool,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Generate randomized stack-consistent programs
    Random {
        /// Number of programs to generate
        #[arg(long, default_value_t = 1)]
        count: u32,

        /// Instruction-count limit per program, pushes included
        #[arg(long)]
        ops_limit: Option<u32>,

        /// Byte-length limit per program
        #[arg(long)]
        bytecode_limit: Option<usize>,

        /// Draw each program's ops limit uniformly from 1..=ops-limit
        #[arg(long)]
        randomize_ops_limit: bool,

        /// Mnemonic drawn with probability one half ahead of the uniform
        /// draw
        #[arg(long)]
        dominant: Option<String>,

        /// Operand push width in bytes, 1..=32
        #[arg(long, default_value_t = 32)]
        push_width: u8,

        /// Pop every operation's results before the next draw
        #[arg(long)]
        clean_stack: bool,

        /// Draw each operand's width uniformly from 1..=push-width
        #[arg(long)]
        randomize_push_width: bool,

        #[command(flatten)]
        common: CommonArgs,
    },
}

fn main() {
    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Marginal {
            opcode,
            max_op_count,
            step_op_count,
            shuffle_counts,
            common,
        } => {
            let (catalog, selection) = load_data(&common)?;
            let mut rng = StdRng::seed_from_u64(common.seed);
            let params = MarginalParams {
                opcode,
                max_op_count,
                step_op_count,
                shuffle_counts,
            };

            let programs = marginal::sweep(&catalog, &selection, &params, &mut rng)?;
            output::write_marginal(io::stdout().lock(), &programs, format_of(&common))?;
        }

        Command::Random {
            count,
            ops_limit,
            bytecode_limit,
            randomize_ops_limit,
            dominant,
            push_width,
            clean_stack,
            randomize_push_width,
            common,
        } => {
            let (catalog, selection) = load_data(&common)?;
            let mut rng = StdRng::seed_from_u64(common.seed);
            let ops_limit = if ops_limit.is_none() && bytecode_limit.is_none() {
                Some(100)
            } else {
                ops_limit
            };

            let mut programs = Vec::with_capacity(count as usize);
            for index in 0..count {
                let drawn_limit = match ops_limit {
                    Some(limit) if randomize_ops_limit => Some(rng.gen_range(1..=limit)),
                    other => other,
                };
                let params = RandomParams {
                    ops_limit: drawn_limit,
                    bytecode_limit,
                    dominant: dominant.clone(),
                    push_width,
                    clean_stack,
                    randomize_push_width,
                };

                let (bytecode, op_count) =
                    random::synthesize(&catalog, &selection, &params, &mut rng)?;
                programs.push(Program {
                    bytecode,
                    label: index.to_string(),
                    op_count,
                });
            }
            output::write_random(io::stdout().lock(), &programs, format_of(&common))?;
        }
    }
    Ok(())
}

fn load_data(common: &CommonArgs) -> Result<(Catalog, Selection), Box<dyn Error>> {
    let catalog = Catalog::load(&common.opcodes_file)?;
    let selection = Selection::load(&common.selection_file, &catalog)?;
    Ok((catalog, selection))
}

fn format_of(common: &CommonArgs) -> Format {
    if common.plain {
        Format::Plain
    } else {
        Format::Csv
    }
}
