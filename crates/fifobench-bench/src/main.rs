mod aggregate;
mod cli;
mod engine;
mod logging;
mod report;
mod transport_mpi;

use clap::Parser;
use mpi::traits::*;

use cli::CliArgs;
use fifobench_core::checkpoint::{read_checkpoint, write_checkpoint};
use fifobench_core::config::BenchmarkConfig;
use fifobench_core::plugin::{PluginRegistry, StoragePlugin};
use fifobench_core::transport::Transport;
use fifobench_core::{balloon, extract_backend_options};
use transport_mpi::MpiTransport;

fn registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.register("posix", || Box::new(fifobench_backend_posix::PosixPlugin::new()));
    registry.register("dummy", || Box::new(fifobench_core::dummy::DummyPlugin::new()));
    registry
}

fn main() {
    let universe = mpi::initialize().expect("MPI_Init failed");
    let world = universe.world();
    let rank = world.rank();
    let num_workers = world.size();
    let transport = MpiTransport::new(&world);

    let raw_args: Vec<String> = std::env::args().collect();
    let (filtered_args, backend_options) = extract_backend_options(raw_args);
    let args = CliArgs::parse_from(filtered_args);
    let interface = args.interface.clone();

    logging::init(if args.quiet { 0 } else { args.verbose + 1 });

    let plugins = registry();
    if interface == "list" {
        if rank == 0 {
            for name in plugins.names() {
                println!("{name}");
            }
        }
        world.barrier();
        return;
    }

    let cfg = args.into_config(rank, num_workers);
    if let Err(e) = cfg.validate() {
        if rank == 0 {
            eprintln!("ERROR: {e}");
        }
        transport.abort(1);
    }

    if rank == 0 {
        print_configuration(&cfg);
        if cfg.warns_objects_may_run_out() {
            tracing::warn!(
                "obj_per_proc ({}) exceeds precreate ({}): benchmark may exhaust precreated objects",
                cfg.obj_per_proc,
                cfg.precreate
            );
        }
    }

    let mut plugin = match plugins.build(&cfg.interface) {
        Ok(p) => p,
        Err(e) => {
            if rank == 0 {
                eprintln!("ERROR: {e}");
            }
            transport.abort(1);
        }
    };

    if let Err(e) = plugin.configure(&backend_options) {
        if rank == 0 {
            eprintln!("ERROR: invalid backend option: {e}");
        }
        transport.abort(1);
    }
    if let Err(e) = plugin.initialize() {
        if rank == 0 {
            eprintln!("ERROR: plug-in initialize failed: {e}");
        }
        transport.abort(1);
    }

    if rank == 0 {
        plugin.prepare_global();
    }
    world.barrier();

    let mut balloon_chunks = Vec::new();
    if let Some(mib) = cfg.lim_free_mem_mib {
        balloon::balloon_to_threshold(&mut balloon_chunks, mib);
    }

    let mut start_index = 0u64;
    if !cfg.phase_precreate {
        if let Some(path) = &cfg.checkpoint_path {
            let mut from_root = 0u64;
            if rank == 0 {
                match read_checkpoint(path) {
                    Ok(pos) => from_root = pos,
                    Err(e) => tracing::warn!("could not read checkpoint {path}: {e}"),
                }
            }
            start_index = transport.broadcast_u64(from_root, 0);
        }
    }

    if cfg.phase_precreate {
        run_phase_with_ballooning(&cfg, || {
            let mut stats = match engine::run_precreate(&cfg, plugin.as_ref()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!("precreate failed: {e}");
                    transport.abort(1);
                }
            };
            finish_phase(&cfg, &transport, &mut stats, 0);
        });
    }

    if cfg.phase_benchmark {
        for iteration in 0..cfg.iterations {
            run_phase_with_ballooning(&cfg, || {
                let outcome =
                    engine::run_benchmark_iteration(&cfg, plugin.as_ref(), &transport, start_index);
                start_index = outcome.next_start_index;
                let mut stats = outcome.stats;
                finish_phase(&cfg, &transport, &mut stats, iteration);
            });
        }
    }

    if cfg.phase_cleanup {
        run_phase_with_ballooning(&cfg, || {
            let mut stats = engine::run_cleanup(&cfg, plugin.as_ref(), start_index);
            finish_phase(&cfg, &transport, &mut stats, 0);
        });
    } else if let Some(path) = &cfg.checkpoint_path {
        if rank == 0 {
            if let Err(e) = write_checkpoint(path, start_index) {
                tracing::warn!("could not write checkpoint {path}: {e}");
            }
        }
    }

    world.barrier();
    if rank == 0 {
        plugin.purge_global();
    }
    if let Err(e) = plugin.finalize() {
        tracing::warn!("plug-in finalize failed: {e}");
    }

    balloon::release(&mut balloon_chunks);
    world.barrier();
    // MPI_Finalize happens on drop of `universe`
}

fn run_phase_with_ballooning(cfg: &BenchmarkConfig, f: impl FnOnce()) {
    let mut chunks = Vec::new();
    if let Some(mib) = cfg.lim_free_mem_phase_mib {
        balloon::balloon_to_threshold(&mut chunks, mib);
    }
    f();
    balloon::release(&mut chunks);
}

fn finish_phase(
    cfg: &BenchmarkConfig,
    transport: &MpiTransport,
    stats: &mut fifobench_core::stats::PhaseStats,
    iteration: u32,
) {
    aggregate::send_process_report(cfg, stats, transport);
    let reports = aggregate::collect_process_reports(cfg, stats, transport);
    if let Err(e) = aggregate::write_latency_csvs(cfg, iteration, stats) {
        tracing::warn!("could not write latency CSV: {e}");
    }

    if let Some(global) = aggregate::aggregate(stats, transport, 0) {
        report::print_summary(&global, cfg.object_size);
        if cfg.print_detailed_stats {
            report::print_detailed(&global);
        }
        if !reports.is_empty() {
            report::print_process_reports(&reports);
        }
    }
}

fn print_configuration(cfg: &BenchmarkConfig) {
    println!("fifobench");
    println!("  interface         = {}", cfg.interface);
    println!("  num_workers       = {}", cfg.num_workers);
    println!("  datasets          = {}", cfg.datasets);
    println!("  precreate         = {}", cfg.precreate);
    println!("  obj_per_proc      = {}", cfg.obj_per_proc);
    println!("  object_size       = {}", cfg.object_size);
    println!("  offset            = {}", cfg.offset);
    println!("  iterations        = {}", cfg.iterations);
    println!(
        "  phases            = {}{}{}",
        if cfg.phase_precreate { "precreate " } else { "" },
        if cfg.phase_benchmark { "benchmark " } else { "" },
        if cfg.phase_cleanup { "cleanup" } else { "" },
    );
    println!("  stonewall_timer   = {}", cfg.stonewall_timer);
    println!("  stonewall_wear_out= {}", cfg.stonewall_wear_out);
    println!("  read_only         = {}", cfg.read_only);
}
