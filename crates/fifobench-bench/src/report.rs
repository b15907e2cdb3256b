//! Stdout report formatting (§6). These lines are a stable output contract
//! and always go straight to `println!`, never through the logger.

use fifobench_core::plugin::OpKind;
use fifobench_core::stats::{GlobalStats, PhaseKind};

/// Sum of `.err` across the op kinds relevant to a phase's summary line.
fn phase_error_count(global: &GlobalStats) -> u64 {
    let kinds: &[OpKind] = match global.phase {
        PhaseKind::Precreate => &[OpKind::DsetName, OpKind::DsetCreate, OpKind::ObjName, OpKind::ObjCreate],
        PhaseKind::Benchmark => &[
            OpKind::DsetName,
            OpKind::ObjName,
            OpKind::ObjStat,
            OpKind::ObjRead,
            OpKind::ObjDelete,
            OpKind::ObjCreate,
        ],
        PhaseKind::Cleanup => &[OpKind::ObjDelete, OpKind::DsetDelete],
    };
    kinds.iter().map(|k| global.op(*k).err).sum()
}

/// Prints the one-line phase summary. Called only by rank 0 (the only rank
/// that gets a `GlobalStats` back from the aggregator).
pub fn print_summary(global: &GlobalStats, object_size: u64) {
    let mut line = format!(
        "{} t_max:{:.6} min:{:.6} mean:{:.6} balance:{:.2}% stddev:{:.6}",
        global.phase.name(),
        global.t_max,
        global.min_t(),
        global.mean_t(),
        global.balance_pct(),
        global.stddev_t(),
    );

    match global.phase {
        PhaseKind::Benchmark => {
            let total_ops = global.op(OpKind::ObjStat).suc
                + global.op(OpKind::ObjRead).suc
                + global.op(OpKind::ObjDelete).suc
                + global.op(OpKind::ObjCreate).suc;
            let rate = rate_per_s(total_ops, global.t_incl_barrier_max);
            let objects = global.op(OpKind::ObjRead).suc;
            let obj_rate = rate_per_s(objects, global.t_incl_barrier_max);
            line.push_str(&format!(
                " rate:{rate:.2} objects:{objects} rate:{obj_rate:.2} tp:{:.3} op-max:{:.6}",
                global.throughput_mib_s(object_size),
                global.max_op_time_max,
            ));
        }
        PhaseKind::Precreate => {
            let dsets = global.op(OpKind::DsetCreate).suc;
            let objects = global.op(OpKind::ObjCreate).suc;
            line.push_str(&format!(
                " dsets:{dsets} rate:{:.2} objects:{objects} rate:{:.2}",
                rate_per_s(dsets, global.t_incl_barrier_max),
                rate_per_s(objects, global.t_incl_barrier_max),
            ));
        }
        PhaseKind::Cleanup => {
            let deletes = global.op(OpKind::ObjDelete).suc + global.op(OpKind::DsetDelete).suc;
            line.push_str(&format!(
                " deletes:{deletes} rate:{:.2}",
                rate_per_s(deletes, global.t_incl_barrier_max),
            ));
        }
    }

    let errs = phase_error_count(global);
    if errs > 0 {
        line.push_str(&format!(" ({errs} errs!!!)"));
    } else {
        line.push_str(" (0 errs)");
    }

    if global.stonewall_hit {
        line.push_str(&format!(" stonewall-iter:{}", global.repeats_min));
    }

    println!("{line}");
}

fn rate_per_s(count: u64, seconds: f64) -> f64 {
    if seconds <= 0.0 {
        0.0
    } else {
        count as f64 / seconds
    }
}

/// `--print-detailed-stats`: one row per op kind, (suc, err, noop) columns.
pub fn print_detailed(global: &GlobalStats) {
    println!("{:<12} {:>10} {:>10} {:>10}", global.phase.name(), "suc", "err", "noop");
    for kind in OpKind::ALL {
        let op = global.op(kind);
        println!("{:<12} {:>10} {:>10} {:>10}", format!("{kind:?}"), op.suc, op.err, op.noop);
    }
}

/// Prints every collected per-rank process-report line, in rank order.
pub fn print_process_reports(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fifobench_core::stats::OpStat;

    fn base_global(phase: PhaseKind) -> GlobalStats {
        GlobalStats {
            phase,
            t_per_worker: vec![1.0, 1.0],
            t_max: 1.0,
            t_incl_barrier_max: 1.0,
            max_op_time_max: 0.01,
            ops: [OpStat::default(); OpKind::ALL.len()],
            repeats_min: 10,
            stonewall_hit: false,
        }
    }

    #[test]
    fn phase_error_count_sums_only_relevant_kinds() {
        let mut global = base_global(PhaseKind::Cleanup);
        global.ops[OpKind::ObjDelete.index()].err = 2;
        global.ops[OpKind::ObjCreate.index()].err = 5; // irrelevant for cleanup
        assert_eq!(phase_error_count(&global), 2);
    }

    #[test]
    fn rate_per_s_is_zero_for_nonpositive_duration() {
        assert_eq!(rate_per_s(10, 0.0), 0.0);
        assert_eq!(rate_per_s(10, -1.0), 0.0);
    }
}
