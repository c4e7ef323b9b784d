use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sim_lib::encoder;
use sim_lib::error::SimulatorResult;
use sim_lib::machine::Machine;
use sim_lib::trace::{register_name, RunSummary};

/// Pipelined MIPS-like CPU simulator.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Program image of big-endian 32-bit words; the built-in
    /// vector-sum demo runs when omitted
    image: Option<PathBuf>,

    /// Maximum number of clock cycles
    #[arg(short = 'c', long, default_value_t = 10_000)]
    max_cycles: u64,

    /// Narrate every cycle on stdout
    #[arg(short, long)]
    trace: bool,

    /// Print the final register file
    #[arg(short, long)]
    registers: bool,

    /// Write the built-in demo program to this path and exit
    #[arg(long, value_name = "PATH")]
    emit_demo: Option<PathBuf>,
}

fn main() -> SimulatorResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Some(path) = args.emit_demo {
        encoder::write_image(&path, &encoder::vector_sum_demo())?;
        println!("demo image written to {}", path.display());
        return Ok(());
    }

    let mut machine = Machine::new();
    match &args.image {
        Some(path) => machine.load_image(path)?,
        None => machine.load_words(&encoder::vector_sum_demo())?,
    }

    let cycles = if args.trace {
        let start = machine.cpu.cycles;
        while machine.cpu.running && machine.cpu.cycles - start < args.max_cycles
        {
            machine.step();
            println!("{}", machine.snapshot());
        }
        machine.cpu.cycles - start
    } else {
        machine.run(args.max_cycles)
    };

    if machine.cpu.running {
        println!("cycle limit reached after {cycles} cycles");
    }

    if args.registers {
        for index in 0..32 {
            let value = machine.cpu.register(index);
            if value != 0 {
                println!("{:>5} = {:#010x} ({})", register_name(index), value, value);
            }
        }
    }

    let summary = RunSummary {
        cycles,
        retired: machine.cpu.retired,
        stats: machine.cache.stats,
    };
    print!("{summary}");

    Ok(())
}
