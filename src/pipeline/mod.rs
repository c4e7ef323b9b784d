//! Pipeline driver: one call advances the machine by one clock cycle.

use tracing::{debug, error};

use crate::cpu::Cpu;
use crate::memory::cache::Cache;

pub mod latches;
pub mod stages;

use latches::{IdEx, PipelineState};

/// Runs the five stages for one cycle and returns the latch state they
/// produced.
///
/// Stage order is WB, MEM, EX, ID, IF: every stage reads `cur`, the
/// latches as of the end of the previous cycle, and writes the state
/// returned here. PC is the one exception; a branch or jump resolved
/// in EX replaces it before fetch runs, so fetch resumes at the target
/// in the same cycle and the two younger instructions are squashed.
pub fn step(cpu: &mut Cpu, cache: &mut Cache, cur: &PipelineState) -> PipelineState {
    cpu.cycles += 1;
    let mut next = PipelineState::default();

    stages::write_back(cpu, cur);

    if let Err(fault) = stages::memory_access(cache, cur, &mut next) {
        error!(%fault, "memory stage fault, halting");
        cpu.running = false;
        return next;
    }

    let redirect = stages::execute(cur, &mut next);

    if let Some(target) = redirect {
        debug!(
            from = format_args!("{:#010x}", cpu.pc),
            to = format_args!("{target:#010x}"),
            "control flow redirect"
        );
        cpu.pc = target;
        // The instruction awaiting decode is younger than the branch;
        // squash it. Fetch restarts at the target immediately.
        next.id_ex = IdEx::default();
        stages::instruction_fetch(cpu, cache, &mut next);
    } else if cur.load_use_hazard() {
        debug!("load-use hazard, stalling the front end");
        // Hold PC and the fetched instruction; send a bubble onward.
        next.if_id = cur.if_id;
        next.id_ex = IdEx::default();
    } else {
        stages::instruction_decode(cpu, cur, &mut next);
        stages::instruction_fetch(cpu, cache, &mut next);
    }

    next
}
