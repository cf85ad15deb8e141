//! Common rendering helpers for gcsimt commands.
//!
//! Text output draws the cell grid with one glyph per state, followed by
//! per-space usage and the running statistics.

use gcsim::{CellState, HeapSnapshot, StepOutcome, StepReport};
use std::fmt::Write as _;

use crate::config::OutputConfig;
use crate::error::Result;

// ============================================================================
// Glyphs
// ============================================================================

/// Grid glyph for a cell state.
pub fn glyph(state: CellState) -> char {
    match state {
        CellState::Free => '.',
        CellState::Referenced => 'r',
        CellState::Dereferenced => 'x',
        CellState::Marked => 'M',
        CellState::Survived => 'S',
        CellState::Copying => 'C',
    }
}

/// One-line legend for the grid glyphs.
pub fn legend() -> String {
    CellState::ALL
        .iter()
        .map(|&state| format!("{} {}", glyph(state), state.name()))
        .collect::<Vec<_>>()
        .join("  ")
}

// ============================================================================
// Snapshot Rendering
// ============================================================================

/// Render a snapshot as plain text.
pub fn render_snapshot(snap: &HeapSnapshot, grid: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "collector: {} | phase: {} | step: {} | cycles: {}",
        snap.collector, snap.phase, snap.current_step, snap.gc_cycles
    );
    let _ = writeln!(out, "{}", snap.message);

    if let Some(active) = snap.active_space {
        let _ = writeln!(out, "active space: {:?}", active);
    }
    if let Some(active) = snap.active_survivor {
        let _ = writeln!(out, "active survivor: {:?}", active);
    }
    if let Some(eden) = snap.current_eden_region_count {
        let _ = writeln!(out, "eden regions: {}", eden);
    }

    if grid {
        out.push('\n');
        for row in snap.grid() {
            let line: String = row.iter().map(|cell| glyph(cell.state)).collect();
            let _ = writeln!(out, "  {}", line);
        }
        let _ = writeln!(out, "\n  {}", legend());
    }

    out.push('\n');
    for space in &snap.spaces {
        let _ = writeln!(
            out,
            "  {:<10} capacity {:>4}  free {:>4}  occupied {:>4}  occupancy {:>3}%",
            format!("{:?}", space.tag),
            space.capacity,
            space.free,
            space.occupied,
            space.occupancy
        );
    }
    for region in &snap.regions {
        let _ = writeln!(
            out,
            "  #{:<3} {:<12} capacity {:>4}  free {:>4}  occupancy {:>3}%",
            region.id,
            format!("{:?}", region.kind),
            region.capacity,
            region.free,
            region.occupancy
        );
    }

    let counts: Vec<String> = snap
        .state_counts
        .iter()
        .map(|(state, count)| format!("{} {}", state.name(), count))
        .collect();
    let _ = writeln!(out, "\ncells: {}", counts.join(", "));

    let stats = &snap.stats;
    let _ = writeln!(
        out,
        "stats: allocated {}, reclaimed {}, copied {}, promoted {}, overflowed {}",
        stats.cells_allocated,
        stats.cells_reclaimed,
        stats.cells_copied,
        stats.cells_promoted,
        stats.overflowed
    );
    out
}

/// Print a snapshot in the configured format.
pub fn print_snapshot(snap: &HeapSnapshot, output: &OutputConfig) -> Result<()> {
    if output.json {
        println!("{}", serde_json::to_string_pretty(snap)?);
    } else {
        print!("{}", render_snapshot(snap, output.grid));
    }
    Ok(())
}

// ============================================================================
// Step Reports
// ============================================================================

/// One progress line for a step report.
pub fn render_report(report: &StepReport) -> String {
    let mut line = match report.outcome {
        StepOutcome::Advanced => format!(
            "step {:>4}: {} -> {}",
            report.step, report.from, report.to
        ),
        StepOutcome::Allocated => format!("step {:>4}: allocation round", report.step),
        other => format!("step {:>4}: {:?}", report.step, other),
    };
    if report.overflowed > 0 {
        let _ = write!(line, " ({} objects dropped)", report.overflowed);
    }
    if let Some(hold) = report.hold {
        let _ = write!(line, " [hold {}]", hold.phase());
    }
    line
}
