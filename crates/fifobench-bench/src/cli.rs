use clap::Parser;
use fifobench_core::config::BenchmarkConfig;

/// Parallel, distributed metadata/small-object I/O benchmark.
#[derive(Parser, Debug)]
#[command(name = "fifobench", version)]
pub struct CliArgs {
    /// Plug-in name (or `list` to print available plug-ins and exit).
    #[arg(short = 'i', long = "interface", default_value = "posix")]
    pub interface: String,

    /// Benchmark ops per dataset per worker (N).
    #[arg(short = 'I', long = "obj-per-proc", default_value_t = 10)]
    pub obj_per_proc: u64,

    /// Precreate count per dataset (P).
    #[arg(short = 'P', long = "precreate-per-set", default_value_t = 10)]
    pub precreate_per_set: u64,

    /// Datasets per worker (D).
    #[arg(short = 'D', long = "data-sets", default_value_t = 1)]
    pub data_sets: u64,

    /// Peer offset (O): modular distance to the worker read from / written for.
    #[arg(short = 'O', long = "offset", default_value_t = 1)]
    pub offset: u64,

    /// Payload size in bytes (S).
    #[arg(short = 'S', long = "object-size", default_value_t = 1024)]
    pub object_size: u64,

    /// Benchmark repetitions (I).
    #[arg(short = 'R', long = "iterations", default_value_t = 1)]
    pub iterations: u32,

    /// Enable precreate phase. If none of -1/-2/-3 are given, all run.
    #[arg(short = '1')]
    pub phase_precreate: bool,
    /// Enable benchmark phase.
    #[arg(short = '2')]
    pub phase_benchmark: bool,
    /// Enable cleanup phase.
    #[arg(short = '3')]
    pub phase_cleanup: bool,

    /// Stop each benchmark iteration after this many seconds.
    #[arg(short = 'w', long = "stonewall-timer", default_value_t = 0.0)]
    pub stonewall_timer: f64,
    /// Stonewall wear-out: equalize iteration counts across workers.
    #[arg(short = 'W', long = "stonewall-wear-out")]
    pub stonewall_wear_out: bool,

    /// Capture per-operation latency, writing CSVs under this prefix.
    #[arg(short = 'L', long = "latency")]
    pub latency: Option<String>,
    /// Keep latency CSVs from every rank, not just rank 0.
    #[arg(long = "latency-all")]
    pub latency_all: bool,

    /// Skip writes and deletes during benchmark.
    #[arg(long = "read-only")]
    pub read_only: bool,
    /// Tolerate precreate errors instead of aborting the cohort.
    #[arg(long = "ignore-precreate-errors")]
    pub ignore_precreate_errors: bool,

    /// Print machine-parsable per-operation tabular statistics.
    #[arg(long = "print-detailed-stats")]
    pub print_detailed_stats: bool,
    /// Have every rank send a report line to rank 0.
    #[arg(long = "process-reports")]
    pub process_reports: bool,

    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Allocate until this many MiB remain free, before the run.
    #[arg(short = 'm', long = "lim-free-mem")]
    pub lim_free_mem: Option<u64>,
    /// Allocate until this many MiB remain free, before each phase.
    #[arg(short = 'M', long = "lim-free-mem-phase")]
    pub lim_free_mem_phase: Option<u64>,

    /// Checkpoint file path.
    #[arg(long = "run-info-file")]
    pub run_info_file: Option<String>,
}

impl CliArgs {
    pub fn into_config(self, rank: i32, num_workers: i32) -> BenchmarkConfig {
        let no_phase_selected = !self.phase_precreate && !self.phase_benchmark && !self.phase_cleanup;

        BenchmarkConfig {
            num_workers,
            rank,
            datasets: self.data_sets,
            precreate: self.precreate_per_set,
            obj_per_proc: self.obj_per_proc,
            object_size: self.object_size,
            offset: self.offset,
            iterations: self.iterations,
            phase_precreate: no_phase_selected || self.phase_precreate,
            phase_benchmark: no_phase_selected || self.phase_benchmark,
            phase_cleanup: no_phase_selected || self.phase_cleanup,
            stonewall_timer: self.stonewall_timer,
            stonewall_wear_out: self.stonewall_wear_out,
            read_only: self.read_only,
            ignore_precreate_errors: self.ignore_precreate_errors,
            latency_prefix: self.latency,
            latency_keep_all: self.latency_all,
            verbosity: if self.quiet { 0 } else { self.verbose + 1 },
            process_reports: self.process_reports,
            print_detailed_stats: self.print_detailed_stats,
            interface: self.interface,
            checkpoint_path: self.run_info_file,
            lim_free_mem_mib: self.lim_free_mem,
            lim_free_mem_phase_mib: self.lim_free_mem_phase,
        }
    }
}
