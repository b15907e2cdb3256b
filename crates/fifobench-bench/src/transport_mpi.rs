use fifobench_core::transport::{ReduceOp, Transport};
use mpi::collective::SystemOperation;
use mpi::topology::SystemCommunicator;
use mpi::traits::*;

/// MPI-backed Collective Transport (§4.2). Rank 0 of `comm` is always the
/// root for reductions and the sole checkpoint reader/writer.
pub struct MpiTransport<'a> {
    comm: &'a SystemCommunicator,
}

impl<'a> MpiTransport<'a> {
    pub fn new(comm: &'a SystemCommunicator) -> Self {
        Self { comm }
    }
}

impl Transport for MpiTransport<'_> {
    fn rank(&self) -> i32 {
        self.comm.rank()
    }

    fn size(&self) -> i32 {
        self.comm.size()
    }

    fn barrier(&self) {
        self.comm.barrier();
    }

    fn reduce_to_root(&self, values: &[f64], op: ReduceOp, root: i32) -> Vec<f64> {
        let root_process = self.comm.process_at_rank(root);
        let sys_op = match op {
            ReduceOp::Max => SystemOperation::max(),
            ReduceOp::Min => SystemOperation::min(),
            ReduceOp::Sum => SystemOperation::sum(),
        };

        if self.rank() == root {
            let mut reduced = vec![0.0f64; values.len()];
            root_process.reduce_into_root(values, &mut reduced[..], sys_op);
            reduced
        } else {
            root_process.reduce_into(values, sys_op);
            Vec::new()
        }
    }

    fn gather_to_root(&self, value: f64, root: i32) -> Vec<f64> {
        let root_process = self.comm.process_at_rank(root);
        if self.rank() == root {
            let mut buf = vec![0.0f64; self.size() as usize];
            root_process.gather_into_root(&value, &mut buf[..]);
            buf
        } else {
            root_process.gather_into(&value);
            Vec::new()
        }
    }

    fn all_reduce_max_i64(&self, value: i64) -> i64 {
        let mut result = 0i64;
        self.comm
            .all_reduce_into(&value, &mut result, SystemOperation::max());
        result
    }

    fn broadcast_u64(&self, value: u64, root: i32) -> u64 {
        let mut v = value as i64;
        self.comm.process_at_rank(root).broadcast_into(&mut v);
        v as u64
    }

    fn send_bytes(&self, dst: i32, tag: i32, bytes: &[u8]) {
        self.comm.process_at_rank(dst).send_with_tag(bytes, tag);
    }

    fn recv_bytes(&self, src: i32, tag: i32) -> Vec<u8> {
        let (bytes, _status) = self.comm.process_at_rank(src).receive_vec_with_tag::<u8>(tag);
        bytes
    }

    fn abort(&self, code: i32) -> ! {
        self.comm.abort(code);
        unreachable!("MPI_Abort does not return")
    }
}
