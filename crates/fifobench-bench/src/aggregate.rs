//! Statistics Aggregator (§4.4): reduces one worker's `PhaseStats` into a
//! rank-0 `GlobalStats`, and exchanges optional per-rank process reports.

use fifobench_core::config::BenchmarkConfig;
use fifobench_core::plugin::OpKind;
use fifobench_core::stats::{GlobalStats, LatencyKind, PhaseStats};
use fifobench_core::transport::{ReduceOp, Transport};

const REPORT_TAG: i32 = 7;

/// Runs the full reduction sequence. Every rank must call this, including
/// the root — the underlying collectives are synchronous. Returns `Some` only
/// on `root`.
pub fn aggregate(
    stats: &mut PhaseStats,
    transport: &dyn Transport,
    root: i32,
) -> Option<GlobalStats> {
    stats.sample_t();
    transport.barrier();
    stats.sample_t_incl_barrier();

    let timings = transport.reduce_to_root(
        &[stats.t, stats.t_incl_barrier, stats.max_op_time],
        ReduceOp::Max,
        root,
    );

    let t_per_worker = transport.gather_to_root(stats.t, root);

    let ops_f64: Vec<f64> = stats.ops_as_vec().into_iter().map(|v| v as f64).collect();
    let ops_reduced = transport.reduce_to_root(&ops_f64, ReduceOp::Sum, root);

    let repeats_reduced =
        transport.reduce_to_root(&[stats.repeats as f64], ReduceOp::Min, root);

    let stonewall_reduced = transport.reduce_to_root(
        &[if stats.stonewall_hit { 1.0 } else { 0.0 }],
        ReduceOp::Max,
        root,
    );

    if transport.rank() != root {
        return None;
    }

    let ops_u64: Vec<u64> = ops_reduced.into_iter().map(|v| v.round() as u64).collect();

    Some(GlobalStats {
        phase: stats.phase,
        t_per_worker,
        t_max: timings[0],
        t_incl_barrier_max: timings[1],
        max_op_time_max: timings[2],
        ops: PhaseStats::ops_from_vec(&ops_u64),
        repeats_min: repeats_reduced[0].round() as u64,
        stonewall_hit: stonewall_reduced[0] > 0.0,
    })
}

/// One line summarizing this worker's phase for `--process-reports`.
fn format_report_line(cfg: &BenchmarkConfig, stats: &PhaseStats) -> String {
    format!(
        "rank {} phase={} t={:.6} t_incl_barrier={:.6} repeats={}",
        cfg.rank,
        stats.phase.name(),
        stats.t,
        stats.t_incl_barrier,
        stats.repeats
    )
}

/// Sends this worker's report line to rank 0 (a no-op on rank 0 itself) when
/// `--process-reports` is set.
pub fn send_process_report(cfg: &BenchmarkConfig, stats: &PhaseStats, transport: &dyn Transport) {
    if !cfg.process_reports || transport.rank() == 0 {
        return;
    }
    let line = format_report_line(cfg, stats);
    transport.send_bytes(0, REPORT_TAG, line.as_bytes());
}

/// Rank 0 collects every other rank's report line, in rank order, prefixing
/// its own. No-op (returns an empty vec) when `--process-reports` is unset.
pub fn collect_process_reports(
    cfg: &BenchmarkConfig,
    stats: &PhaseStats,
    transport: &dyn Transport,
) -> Vec<String> {
    if !cfg.process_reports || transport.rank() != 0 {
        return Vec::new();
    }
    let mut lines = vec![format_report_line(cfg, stats)];
    for src in 1..transport.size() {
        let bytes = transport.recv_bytes(src, REPORT_TAG);
        lines.push(String::from_utf8_lossy(&bytes).into_owned());
    }
    lines
}

/// Writes the captured latency CSVs for this phase, if `--latency` is set.
/// Only rank 0 writes unless `--latency-all` keeps every rank's samples.
pub fn write_latency_csvs(
    cfg: &BenchmarkConfig,
    iteration: u32,
    stats: &PhaseStats,
) -> std::io::Result<Vec<String>> {
    let Some(prefix) = &cfg.latency_prefix else {
        return Ok(Vec::new());
    };
    if cfg.rank != 0 && !cfg.latency_keep_all {
        return Ok(Vec::new());
    }

    let arrays: [(LatencyKind, &str, &[fifobench_core::stats::LatencySample]); 4] = [
        (LatencyKind::Create, "create", &stats.time_create),
        (LatencyKind::Read, "read", &stats.time_read),
        (LatencyKind::Stat, "stat", &stats.time_stat),
        (LatencyKind::Delete, "delete", &stats.time_delete),
    ];

    let mut written = Vec::new();
    for (_, name, samples) in arrays {
        if samples.is_empty() {
            continue;
        }
        let path = fifobench_core::latency::write_latency_csv(
            prefix,
            iteration,
            name,
            cfg.rank,
            samples,
        )?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fifobench_core::stats::PhaseKind;
    use fifobench_core::transport::NullTransport;

    fn base_cfg() -> BenchmarkConfig {
        BenchmarkConfig {
            num_workers: 1,
            rank: 0,
            datasets: 1,
            precreate: 1,
            obj_per_proc: 1,
            object_size: 16,
            offset: 1,
            iterations: 1,
            phase_precreate: true,
            phase_benchmark: true,
            phase_cleanup: true,
            stonewall_timer: 0.0,
            stonewall_wear_out: false,
            read_only: false,
            ignore_precreate_errors: false,
            latency_prefix: None,
            latency_keep_all: false,
            verbosity: 0,
            process_reports: false,
            print_detailed_stats: false,
            interface: "dummy".to_string(),
            checkpoint_path: None,
            lim_free_mem_mib: None,
            lim_free_mem_phase_mib: None,
        }
    }

    #[test]
    fn single_rank_aggregate_matches_local_values() {
        let mut stats = PhaseStats::start(PhaseKind::Precreate, 4);
        stats.record_op(OpKind::ObjCreate, true);
        stats.record_op(OpKind::ObjCreate, true);
        stats.repeats = 2;
        let transport = NullTransport;
        let global = aggregate(&mut stats, &transport, 0).expect("rank 0 gets a result");
        assert_eq!(global.op(OpKind::ObjCreate).suc, 2);
        assert_eq!(global.repeats_min, 2);
        assert_eq!(global.t_per_worker.len(), 1);
    }

    #[test]
    fn process_reports_are_empty_when_disabled() {
        let cfg = base_cfg();
        let stats = PhaseStats::start(PhaseKind::Precreate, 1);
        let transport = NullTransport;
        assert!(collect_process_reports(&cfg, &stats, &transport).is_empty());
    }

    #[test]
    fn latency_csvs_are_empty_without_a_prefix() {
        let cfg = base_cfg();
        let stats = PhaseStats::start(PhaseKind::Precreate, 1);
        assert!(write_latency_csvs(&cfg, 0, &stats).unwrap().is_empty());
    }
}
