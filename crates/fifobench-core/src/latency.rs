use std::fs::File;
use std::io::{self, Write};

use crate::stats::LatencySample;

/// Write one latency CSV: `time,runtime` header, one row per sample, with
/// `time` at 7 decimal places and `runtime` in 4-significant-digit
/// scientific notation — matching the external CSV contract (§6).
///
/// File name: `<prefix>-<iteration>-<kind>-<rank>.csv`.
pub fn write_latency_csv(
    prefix: &str,
    iteration: u32,
    kind: &str,
    rank: i32,
    samples: &[LatencySample],
) -> io::Result<String> {
    let path = format!("{prefix}-{iteration}-{kind}-{rank}.csv");
    let mut file = File::create(&path)?;
    writeln!(file, "time,runtime")?;
    for sample in samples {
        writeln!(
            file,
            "{:.7},{}",
            sample.time_since_phase_start,
            format_runtime(sample.runtime)
        )?;
    }
    Ok(path)
}

/// 4-significant-digit scientific notation, e.g. `1.234e-3`.
fn format_runtime(v: f64) -> String {
    format!("{:.3e}", v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn format_runtime_uses_scientific_notation() {
        assert_eq!(format_runtime(0.0012345), "1.235e-3");
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = std::env::temp_dir().join(format!("fifobench-latency-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let prefix = dir.join("lat").to_string_lossy().to_string();
        let samples = vec![LatencySample {
            time_since_phase_start: 0.1234567,
            runtime: 0.002,
        }];
        let path = write_latency_csv(&prefix, 0, "create", 0, &samples).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("time,runtime\n"));
        assert!(content.contains("0.1234567,"));
        fs::remove_file(&path).ok();
        fs::remove_dir_all(&dir).ok();
    }
}
