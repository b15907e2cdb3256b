use crate::plugin::OpKind;
use crate::timer::now;

/// (successes, errors, noops) for one operation kind. `noop` is tracked
/// separately per the detailed-stats contract: a `Noop` result is neither a
/// success nor a failure, but `--print-detailed-stats` still needs to show a
/// reader why a phase's throughput came out zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpStat {
    pub suc: u64,
    pub err: u64,
    pub noop: u64,
}

impl OpStat {
    pub fn record(&mut self, success: bool) {
        if success {
            self.suc += 1;
        } else {
            self.err += 1;
        }
    }

    pub fn record_noop(&mut self) {
        self.noop += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Precreate,
    Benchmark,
    Cleanup,
}

impl PhaseKind {
    pub fn name(self) -> &'static str {
        match self {
            PhaseKind::Precreate => "precreate",
            PhaseKind::Benchmark => "benchmark",
            PhaseKind::Cleanup => "cleanup",
        }
    }
}

/// One (time-since-phase-start, duration) latency sample.
#[derive(Debug, Clone, Copy)]
pub struct LatencySample {
    pub time_since_phase_start: f64,
    pub runtime: f64,
}

/// Per-worker, per-phase statistics (§3 Phase statistics).
#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: PhaseKind,
    ops: [OpStat; OpKind::ALL.len()],
    phase_start: f64,
    pub t: f64,
    pub t_incl_barrier: f64,
    pub max_op_time: f64,
    pub repeats: u64,
    pub stonewall_hit: bool,

    pub time_create: Vec<LatencySample>,
    pub time_read: Vec<LatencySample>,
    pub time_stat: Vec<LatencySample>,
    pub time_delete: Vec<LatencySample>,
}

impl PhaseStats {
    pub fn start(phase: PhaseKind, expected_slots: usize) -> Self {
        Self {
            phase,
            ops: [OpStat::default(); OpKind::ALL.len()],
            phase_start: now(),
            t: 0.0,
            t_incl_barrier: 0.0,
            max_op_time: 0.0,
            repeats: 0,
            stonewall_hit: false,
            time_create: Vec::with_capacity(expected_slots),
            time_read: Vec::with_capacity(expected_slots),
            time_stat: Vec::with_capacity(expected_slots),
            time_delete: Vec::with_capacity(expected_slots),
        }
    }

    pub fn phase_start(&self) -> f64 {
        self.phase_start
    }

    pub fn op(&self, kind: OpKind) -> OpStat {
        self.ops[kind.index()]
    }

    pub fn record_op(&mut self, kind: OpKind, success: bool) {
        self.ops[kind.index()].record(success);
    }

    pub fn record_op_noop(&mut self, kind: OpKind) {
        self.ops[kind.index()].record_noop();
    }

    pub fn ops_as_vec(&self) -> Vec<u64> {
        // Plain numeric vector (length = 3 * number of counter triples) for
        // the reduction, rather than relying on struct layout.
        let mut v = Vec::with_capacity(self.ops.len() * 3);
        for op in &self.ops {
            v.push(op.suc);
            v.push(op.err);
            v.push(op.noop);
        }
        v
    }

    pub fn ops_from_vec(v: &[u64]) -> [OpStat; OpKind::ALL.len()] {
        let mut ops = [OpStat::default(); OpKind::ALL.len()];
        for (i, op) in ops.iter_mut().enumerate() {
            op.suc = v[i * 3];
            op.err = v[i * 3 + 1];
            op.noop = v[i * 3 + 2];
        }
        ops
    }

    /// Record `duration` against the largest-observed-single-op tracker and
    /// capture a latency sample if `capture` is enabled.
    pub fn record_timing(
        &mut self,
        capture: bool,
        kind_arrays: LatencyKind,
        duration: f64,
    ) {
        if duration > self.max_op_time {
            self.max_op_time = duration;
        }
        if !capture {
            return;
        }
        let sample = LatencySample {
            time_since_phase_start: now() - self.phase_start,
            runtime: duration,
        };
        match kind_arrays {
            LatencyKind::Create => self.time_create.push(sample),
            LatencyKind::Read => self.time_read.push(sample),
            LatencyKind::Stat => self.time_stat.push(sample),
            LatencyKind::Delete => self.time_delete.push(sample),
        }
    }

    pub fn sample_t(&mut self) {
        self.t = now() - self.phase_start;
    }

    pub fn sample_t_incl_barrier(&mut self) {
        self.t_incl_barrier = now() - self.phase_start;
    }
}

#[derive(Debug, Clone, Copy)]
pub enum LatencyKind {
    Create,
    Read,
    Stat,
    Delete,
}

/// Rank-0-only reduced view across the whole cohort (§3 Global statistics).
#[derive(Debug, Clone)]
pub struct GlobalStats {
    pub phase: PhaseKind,
    /// Per-worker `t`, gathered in rank order.
    pub t_per_worker: Vec<f64>,
    pub t_max: f64,
    pub t_incl_barrier_max: f64,
    pub max_op_time_max: f64,
    pub ops: [OpStat; OpKind::ALL.len()],
    pub repeats_min: u64,
    pub stonewall_hit: bool,
}

impl GlobalStats {
    pub fn mean_t(&self) -> f64 {
        if self.t_per_worker.is_empty() {
            return 0.0;
        }
        self.t_per_worker.iter().sum::<f64>() / self.t_per_worker.len() as f64
    }

    pub fn min_t(&self) -> f64 {
        self.t_per_worker.iter().cloned().fold(f64::INFINITY, f64::min)
    }

    pub fn max_t(&self) -> f64 {
        self.t_per_worker
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn stddev_t(&self) -> f64 {
        if self.t_per_worker.len() < 2 {
            return 0.0;
        }
        let mean = self.mean_t();
        let variance = self
            .t_per_worker
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / self.t_per_worker.len() as f64;
        variance.sqrt()
    }

    /// Load-balance ratio `min/max * 100`; 100 means perfectly balanced.
    pub fn balance_pct(&self) -> f64 {
        let max = self.max_t();
        if max <= 0.0 {
            return 100.0;
        }
        self.min_t() / max * 100.0
    }

    pub fn op(&self, kind: OpKind) -> OpStat {
        self.ops[kind.index()]
    }

    /// Aggregate throughput in MiB/s: `(obj_create.suc + obj_read.suc) * S / t_incl_barrier / MiB`.
    pub fn throughput_mib_s(&self, object_size: u64) -> f64 {
        if self.t_incl_barrier_max <= 0.0 {
            return 0.0;
        }
        let bytes = (self.op(OpKind::ObjCreate).suc + self.op(OpKind::ObjRead).suc) * object_size;
        bytes as f64 / self.t_incl_barrier_max / (1024.0 * 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ops_vec_roundtrip() {
        let mut stats = PhaseStats::start(PhaseKind::Precreate, 4);
        stats.record_op(OpKind::ObjCreate, true);
        stats.record_op(OpKind::ObjCreate, true);
        stats.record_op(OpKind::ObjCreate, false);
        let v = stats.ops_as_vec();
        let ops = PhaseStats::ops_from_vec(&v);
        assert_eq!(ops[OpKind::ObjCreate.index()].suc, 2);
        assert_eq!(ops[OpKind::ObjCreate.index()].err, 1);
    }

    #[test]
    fn balance_pct_is_100_when_equal() {
        let stats = GlobalStats {
            phase: PhaseKind::Precreate,
            t_per_worker: vec![1.0, 1.0, 1.0],
            t_max: 1.0,
            t_incl_barrier_max: 1.0,
            max_op_time_max: 0.1,
            ops: [OpStat::default(); OpKind::ALL.len()],
            repeats_min: 0,
            stonewall_hit: false,
        };
        assert!((stats.balance_pct() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn balance_pct_reflects_imbalance() {
        let stats = GlobalStats {
            phase: PhaseKind::Precreate,
            t_per_worker: vec![1.0, 2.0],
            t_max: 2.0,
            t_incl_barrier_max: 2.0,
            max_op_time_max: 0.1,
            ops: [OpStat::default(); OpKind::ALL.len()],
            repeats_min: 0,
            stonewall_hit: false,
        };
        assert!((stats.balance_pct() - 50.0).abs() < 1e-9);
    }
}
