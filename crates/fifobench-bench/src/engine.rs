//! The three phase routines (§4.3): precreate, benchmark, cleanup.

use fifobench_core::config::BenchmarkConfig;
use fifobench_core::error::EngineError;
use fifobench_core::plugin::{OpKind, PluginResult, StoragePlugin};
use fifobench_core::stats::{LatencyKind, PhaseKind, PhaseStats};
use fifobench_core::timer::now;
use fifobench_core::transport::Transport;

/// Maps a plug-in result to a (counted, success) pair. `None` means the
/// call was a `Noop` and the engine counts neither success nor failure.
fn classify(result: PluginResult) -> Option<bool> {
    match result {
        PluginResult::Noop => None,
        PluginResult::Ok => Some(true),
        PluginResult::Error | PluginResult::ErrorCreate | PluginResult::ErrorFind => Some(false),
    }
}

fn record(stats: &mut PhaseStats, kind: OpKind, result: PluginResult) -> PluginResult {
    match classify(result) {
        Some(success) => stats.record_op(kind, success),
        None => stats.record_op_noop(kind),
    }
    result
}

/// `((r - O*(d+1)) mod W + W) mod W` — the peer worker to read from.
fn reader_target(rank: i32, offset: u64, dataset_index: u64, num_workers: i32) -> i32 {
    peer_at_distance(rank, -(offset as i64) * (dataset_index as i64 + 1), num_workers)
}

/// `(r + O*(d+1)) mod W` — the peer worker to write for.
fn writer_target(rank: i32, offset: u64, dataset_index: u64, num_workers: i32) -> i32 {
    peer_at_distance(rank, (offset as i64) * (dataset_index as i64 + 1), num_workers)
}

fn peer_at_distance(rank: i32, delta: i64, num_workers: i32) -> i32 {
    let w = num_workers as i64;
    (((rank as i64 + delta) % w + w) % w) as i32
}

/// Precreate phase: each worker populates its own datasets with `P` objects.
pub fn run_precreate(
    cfg: &BenchmarkConfig,
    plugin: &dyn StoragePlugin,
) -> Result<PhaseStats, EngineError> {
    let expected_slots = (cfg.precreate * cfg.datasets) as usize;
    let mut stats = PhaseStats::start(PhaseKind::Precreate, expected_slots);

    for d in 0..cfg.datasets {
        let dset = match plugin.def_dset_name(cfg.rank, d) {
            Ok(name) => {
                stats.record_op(OpKind::DsetName, true);
                name
            }
            Err(e) => {
                stats.record_op(OpKind::DsetName, false);
                if cfg.ignore_precreate_errors {
                    continue;
                }
                tracing::error!("dataset name generation failed: {e}");
                return Err(EngineError::Abort(1));
            }
        };

        let result = record(&mut stats, OpKind::DsetCreate, plugin.create_dset(&dset));
        if result.is_error() && !cfg.ignore_precreate_errors {
            tracing::error!("create_dset({dset}) failed: {result}");
            return Err(EngineError::Abort(1));
        }
    }

    let capture = cfg.latency_prefix.is_some();
    for f in 0..cfg.precreate {
        for d in 0..cfg.datasets {
            let dset = match plugin.def_dset_name(cfg.rank, d) {
                Ok(name) => name,
                Err(_) if cfg.ignore_precreate_errors => continue,
                Err(e) => {
                    tracing::error!("dataset name generation failed: {e}");
                    return Err(EngineError::Abort(1));
                }
            };
            let obj = match plugin.def_obj_name(cfg.rank, d, f) {
                Ok(name) => {
                    stats.record_op(OpKind::ObjName, true);
                    name
                }
                Err(e) => {
                    stats.record_op(OpKind::ObjName, false);
                    if cfg.ignore_precreate_errors {
                        continue;
                    }
                    tracing::error!("object name generation failed: {e}");
                    return Err(EngineError::Abort(1));
                }
            };

            let payload = vec![cfg.rank as u8; cfg.object_size as usize];
            let start = now();
            let result = plugin.write_obj(&dset, &obj, &payload);
            let duration = now() - start;
            stats.record_timing(capture, LatencyKind::Create, duration);
            let result = record(&mut stats, OpKind::ObjCreate, result);
            if result.is_error() && !cfg.ignore_precreate_errors {
                tracing::error!("write_obj({dset}/{obj}) failed: {result}");
                return Err(EngineError::Abort(1));
            }
        }
    }

    stats.repeats = cfg.precreate * cfg.datasets;
    Ok(stats)
}

/// Outcome of one benchmark-phase outer-loop execution (one of the driver's
/// `I` repetitions).
pub struct BenchmarkOutcome {
    pub stats: PhaseStats,
    pub next_start_index: u64,
}

/// Benchmark phase: one full inner `f`-loop (up to `N` or stonewall) over
/// all datasets, for a single driver iteration.
pub fn run_benchmark_iteration(
    cfg: &BenchmarkConfig,
    plugin: &dyn StoragePlugin,
    transport: &dyn Transport,
    start_index: u64,
) -> BenchmarkOutcome {
    let expected_slots = (cfg.obj_per_proc * cfg.datasets) as usize;
    let mut stats = PhaseStats::start(PhaseKind::Benchmark, expected_slots);
    let capture = cfg.latency_prefix.is_some();

    let armed_stonewall = cfg.stonewall_timer > 0.0;
    let mut total_num = cfg.obj_per_proc;
    let mut completed_outer = 0u64;
    // Mirrors the original's `armed_stone_wall`: true only while wear-out is
    // enabled and this rank hasn't yet crossed the deadline inline. Cleared
    // the moment this rank does, so the post-loop fallback below fires at
    // most once per rank per iteration.
    let mut wear_out_armed = armed_stonewall && cfg.stonewall_wear_out;

    let mut f = 0u64;
    while f < total_num {
        for d in 0..cfg.datasets {
            let prev = f + start_index;

            let reader = reader_target(cfg.rank, cfg.offset, d, cfg.num_workers);
            let (reader_dset, reader_obj) = match (
                plugin.def_dset_name(reader, d),
                plugin.def_obj_name(reader, d, prev),
            ) {
                (Ok(dset), Ok(obj)) => {
                    stats.record_op(OpKind::DsetName, true);
                    stats.record_op(OpKind::ObjName, true);
                    (Some(dset), Some(obj))
                }
                _ => {
                    stats.record_op(OpKind::DsetName, false);
                    (None, None)
                }
            };

            if let (Some(dset), Some(obj)) = (&reader_dset, &reader_obj) {
                let start = now();
                let result = plugin.stat_obj(dset, obj, cfg.object_size);
                let duration = now() - start;
                stats.record_timing(capture, LatencyKind::Stat, duration);
                let result = record(&mut stats, OpKind::ObjStat, result);

                if result.is_success() || result == PluginResult::Noop {
                    let start = now();
                    let mut buf = vec![0u8; cfg.object_size as usize];
                    let result = plugin.read_obj(dset, obj, &mut buf);
                    let duration = now() - start;
                    stats.record_timing(capture, LatencyKind::Read, duration);
                    record(&mut stats, OpKind::ObjRead, result);

                    if !cfg.read_only {
                        let start = now();
                        let result = plugin.delete_obj(dset, obj);
                        let duration = now() - start;
                        stats.record_timing(capture, LatencyKind::Delete, duration);
                        record(&mut stats, OpKind::ObjDelete, result);
                    }
                }
            }

            if !cfg.read_only {
                let writer = writer_target(cfg.rank, cfg.offset, d, cfg.num_workers);
                match (
                    plugin.def_dset_name(writer, d),
                    plugin.def_obj_name(writer, d, prev + cfg.precreate),
                ) {
                    (Ok(dset), Ok(obj)) => {
                        stats.record_op(OpKind::DsetName, true);
                        stats.record_op(OpKind::ObjName, true);
                        let payload = vec![writer as u8; cfg.object_size as usize];
                        let start = now();
                        let result = plugin.write_obj(&dset, &obj, &payload);
                        let duration = now() - start;
                        stats.record_timing(capture, LatencyKind::Create, duration);
                        record(&mut stats, OpKind::ObjCreate, result);
                    }
                    _ => {
                        stats.record_op(OpKind::DsetName, false);
                    }
                }
            }
        }

        f += 1;
        completed_outer = f;

        let bench_runtime = now() - stats.phase_start();
        if armed_stonewall && !stats.stonewall_hit && bench_runtime >= cfg.stonewall_timer {
            stats.stonewall_hit = true;
            if !cfg.stonewall_wear_out {
                break;
            }
            total_num = transport.all_reduce_max_i64(f as i64) as u64;
            wear_out_armed = false;
        }
    }

    if wear_out_armed {
        // This rank never crossed the deadline inline, so it still owes the
        // all-reduce that crossing ranks already made above.
        transport.all_reduce_max_i64(total_num as i64);
        stats.stonewall_hit = true;
    }
    if armed_stonewall && !cfg.stonewall_wear_out {
        stats.stonewall_hit = transport.all_reduce_or_bool(stats.stonewall_hit);
    }

    stats.repeats = completed_outer * cfg.datasets;
    let next_start_index = if cfg.read_only {
        start_index
    } else {
        start_index + completed_outer
    };

    BenchmarkOutcome {
        stats,
        next_start_index,
    }
}

/// Cleanup phase: mirror of precreate using `start_index`.
pub fn run_cleanup(
    cfg: &BenchmarkConfig,
    plugin: &dyn StoragePlugin,
    start_index: u64,
) -> PhaseStats {
    let expected_slots = (cfg.precreate * cfg.datasets) as usize;
    let mut stats = PhaseStats::start(PhaseKind::Cleanup, expected_slots);
    let capture = cfg.latency_prefix.is_some();

    for d in 0..cfg.datasets {
        for f in 0..cfg.precreate {
            if let (Ok(dset), Ok(obj)) = (
                plugin.def_dset_name(cfg.rank, d),
                plugin.def_obj_name(cfg.rank, d, start_index + f),
            ) {
                let start = now();
                let result = plugin.delete_obj(&dset, &obj);
                let duration = now() - start;
                stats.record_timing(capture, LatencyKind::Delete, duration);
                record(&mut stats, OpKind::ObjDelete, result);
            }
        }
        if let Ok(dset) = plugin.def_dset_name(cfg.rank, d) {
            let result = plugin.rm_dset(&dset);
            record(&mut stats, OpKind::DsetDelete, result);
        }
    }

    stats.repeats = cfg.precreate * cfg.datasets;
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use fifobench_core::dummy::DummyPlugin;
    use fifobench_core::transport::NullTransport;

    fn cfg(num_workers: i32, rank: i32) -> BenchmarkConfig {
        BenchmarkConfig {
            num_workers,
            rank,
            datasets: 1,
            precreate: 4,
            obj_per_proc: 2,
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
    fn peer_routing_wraps_with_modulo() {
        assert_eq!(reader_target(0, 1, 0, 2), 1);
        assert_eq!(writer_target(0, 1, 0, 2), 1);
        assert_eq!(reader_target(0, 5, 0, 2), 1); // O=5 wraps mod W=2
    }

    #[test]
    fn single_worker_reads_and_writes_itself() {
        assert_eq!(reader_target(0, 1, 0, 1), 0);
        assert_eq!(writer_target(0, 1, 0, 1), 0);
    }

    #[test]
    fn precreate_with_dummy_plugin_reports_noop_not_success() {
        // DummyPlugin returns Noop for everything, so no successes are
        // counted even though nothing failed.
        let cfg = cfg(1, 0);
        let plugin = DummyPlugin::new();
        let stats = run_precreate(&cfg, &plugin).unwrap();
        assert_eq!(stats.op(OpKind::ObjCreate).suc, 0);
        assert_eq!(stats.op(OpKind::ObjCreate).err, 0);
    }

    #[test]
    fn read_only_benchmark_does_not_advance_start_index() {
        let mut cfg = cfg(2, 0);
        cfg.read_only = true;
        let plugin = DummyPlugin::new();
        let transport = NullTransport;
        let outcome = run_benchmark_iteration(&cfg, &plugin, &transport, 0);
        assert_eq!(outcome.next_start_index, 0);
    }

    #[test]
    fn benchmark_advances_start_index_by_completed_iterations() {
        let cfg = cfg(2, 0);
        let plugin = DummyPlugin::new();
        let transport = NullTransport;
        let outcome = run_benchmark_iteration(&cfg, &plugin, &transport, 0);
        assert_eq!(outcome.next_start_index, cfg.obj_per_proc);
    }

    #[test]
    fn cleanup_counts_precreate_times_datasets_slots() {
        let cfg = cfg(1, 0);
        let plugin = DummyPlugin::new();
        let stats = run_cleanup(&cfg, &plugin, 0);
        assert_eq!(stats.repeats, cfg.precreate * cfg.datasets);
    }
}
