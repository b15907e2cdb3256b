//! Memory ballooning: allocate towards a free-memory threshold so the
//! benchmark can be run under realistic memory pressure. An out-of-core
//! collaborator whose contract is allocate-until-threshold, then
//! optionally free; failures are logged, never fatal (§9 Design Notes).

const CHUNK_BYTES: usize = 1024 * 1024;

/// Grows `held` in 1 MiB chunks while `/proc/meminfo`'s `MemAvailable`
/// stays above `threshold_mib`. Any failure to read or parse
/// `/proc/meminfo` is logged and treated as "stop ballooning", not an
/// error returned to the caller.
pub fn balloon_to_threshold(held: &mut Vec<Vec<u8>>, threshold_mib: u64) {
    loop {
        let available = match read_mem_available_mib() {
            Some(mib) => mib,
            None => {
                tracing::warn!("could not read /proc/meminfo; stopping memory balloon");
                return;
            }
        };
        if available <= threshold_mib {
            return;
        }
        held.push(vec![0u8; CHUNK_BYTES]);
    }
}

/// Free all held balloon chunks.
pub fn release(held: &mut Vec<Vec<u8>>) {
    held.clear();
}

fn read_mem_available_mib() -> Option<u64> {
    let content = std::fs::read_to_string("/proc/meminfo").ok()?;
    parse_mem_available_kib(&content).map(|kib| kib / 1024)
}

fn parse_mem_available_kib(meminfo: &str) -> Option<u64> {
    for line in meminfo.lines() {
        if let Some(rest) = line.strip_prefix("MemAvailable:") {
            let digits: String = rest.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            return digits.parse().ok();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mem_available_line() {
        let meminfo = "MemTotal:       16384000 kB\nMemAvailable:    8192000 kB\n";
        assert_eq!(parse_mem_available_kib(meminfo), Some(8192000));
    }

    #[test]
    fn missing_field_is_none() {
        assert_eq!(parse_mem_available_kib("MemTotal: 123 kB\n"), None);
    }

    #[test]
    fn release_empties_held_chunks() {
        let mut held = vec![vec![0u8; 16]];
        release(&mut held);
        assert!(held.is_empty());
    }
}
