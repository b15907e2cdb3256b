/// Immutable configuration for one benchmark run, built once at startup and
/// passed by shared reference into every component. No process-wide
/// singletons.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Total worker count (cohort size `W`).
    pub num_workers: i32,
    /// This process's rank `r`.
    pub rank: i32,

    /// Datasets per worker (`D`).
    pub datasets: u64,
    /// Precreate count per dataset (`P`).
    pub precreate: u64,
    /// Benchmark ops per dataset per iteration (`N`).
    pub obj_per_proc: u64,
    /// Payload size in bytes (`S`).
    pub object_size: u64,
    /// Peer offset (`O`).
    pub offset: u64,
    /// Benchmark outer-iteration count (`I`).
    pub iterations: u32,

    pub phase_precreate: bool,
    pub phase_benchmark: bool,
    pub phase_cleanup: bool,

    /// Stonewall deadline in seconds; 0 disables stonewalling.
    pub stonewall_timer: f64,
    pub stonewall_wear_out: bool,

    pub read_only: bool,
    pub ignore_precreate_errors: bool,

    pub latency_prefix: Option<String>,
    pub latency_keep_all: bool,

    pub verbosity: u8,
    pub process_reports: bool,
    pub print_detailed_stats: bool,

    pub interface: String,
    pub checkpoint_path: Option<String>,

    pub lim_free_mem_mib: Option<u64>,
    pub lim_free_mem_phase_mib: Option<u64>,
}

impl BenchmarkConfig {
    /// Validate the cross-field rule from the external interface contract:
    /// running only the benchmark phase under stonewall requires wear-out,
    /// since otherwise every worker would end at a different `start_index`
    /// with no way to resynchronize for a later cleanup/benchmark run.
    pub fn validate(&self) -> Result<(), String> {
        if !self.phase_precreate
            && self.phase_benchmark
            && self.stonewall_timer > 0.0
            && !self.stonewall_wear_out
        {
            return Err(
                "invalid options: running only the benchmark phase with a stonewall timer \
                 requires stonewall wear-out"
                    .to_string(),
            );
        }
        Ok(())
    }

    /// True if `obj_per_proc` exceeds `precreate`, meaning the benchmark
    /// phase may run out of precreated objects to read from partway through.
    pub fn warns_objects_may_run_out(&self) -> bool {
        self.obj_per_proc > self.precreate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> BenchmarkConfig {
        BenchmarkConfig {
            num_workers: 2,
            rank: 0,
            datasets: 1,
            precreate: 4,
            obj_per_proc: 2,
            object_size: 1024,
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
    fn benchmark_only_with_stonewall_requires_wear_out() {
        let mut cfg = base_config();
        cfg.phase_precreate = false;
        cfg.stonewall_timer = 1.0;
        assert!(cfg.validate().is_err());
        cfg.stonewall_wear_out = true;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn warns_when_obj_per_proc_exceeds_precreate() {
        let mut cfg = base_config();
        cfg.obj_per_proc = 10;
        cfg.precreate = 4;
        assert!(cfg.warns_objects_may_run_out());
    }
}
