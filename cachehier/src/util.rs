use std::io::Write;

use crate::trace::{AccessKind, TraceEvent};

/// Writes an event in the fixed width trace layout. Sizes above 999 don't fit the three digit
/// field and are written unpadded, which the general parser still accepts
pub fn write_record<W: Write>(out: &mut W, event: &TraceEvent) -> std::io::Result<()> {
    let op = match event.op {
        AccessKind::Read => 'R',
        AccessKind::Write => 'W',
    };
    writeln!(out, "{:016x} {:016x} {op} {:03}", event.pc, event.address, event.size)
}

/// Deterministic stream of accesses for tests and benchmarks
///
/// Mixes a sequential sweep through `working_set` bytes with uniformly random accesses inside the
/// same range. The generator is seeded, so the same seed always gives the same trace
pub fn synthetic_events(accesses: usize, working_set: u64, seed: u64) -> Vec<TraceEvent> {
    const SIZES: [u32; 5] = [1, 2, 4, 8, 16];
    let working_set = working_set.max(1);
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut cursor = 0u64;
    (0..accesses)
        .map(|i| {
            let address = if rng.u8(..4) == 0 {
                rng.u64(..working_set)
            } else {
                cursor = (cursor + 8) % working_set;
                cursor
            };
            TraceEvent {
                pc: 0x40_0000 + (i as u64 % 64) * 4,
                address,
                op: if rng.bool() { AccessKind::Write } else { AccessKind::Read },
                size: SIZES[rng.usize(..SIZES.len())],
            }
        })
        .collect()
}

/// [`synthetic_events`] rendered as a trace file
pub fn synthetic_trace(accesses: usize, working_set: u64, seed: u64) -> std::io::Result<Vec<u8>> {
    let events = synthetic_events(accesses, working_set, seed);
    let mut out = Vec::with_capacity(events.len() * 40);
    for event in &events {
        write_record(&mut out, event)?;
    }
    Ok(out)
}
