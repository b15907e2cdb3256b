use std::fs;

use crate::error::EngineError;

/// Read the checkpoint file, returning the stored `pos`. Only rank 0 calls
/// this, and only outside any timed phase.
pub fn read_checkpoint(path: &str) -> Result<u64, EngineError> {
    let content = fs::read_to_string(path)?;
    parse_checkpoint(&content)
        .ok_or_else(|| EngineError::Checkpoint(format!("malformed checkpoint file: {path}")))
}

/// Write `pos: <N>\n` to the checkpoint file, overwriting any prior content.
pub fn write_checkpoint(path: &str, pos: u64) -> Result<(), EngineError> {
    fs::write(path, format!("pos: {pos}\n"))?;
    Ok(())
}

fn parse_checkpoint(content: &str) -> Option<u64> {
    let rest = content.trim().strip_prefix("pos:")?;
    rest.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_form() {
        assert_eq!(parse_checkpoint("pos: 42\n"), Some(42));
    }

    #[test]
    fn rejects_malformed_content() {
        assert_eq!(parse_checkpoint("position: 42\n"), None);
        assert_eq!(parse_checkpoint(""), None);
    }

    #[test]
    fn round_trips_through_the_filesystem() {
        let path = std::env::temp_dir().join(format!(
            "fifobench-checkpoint-test-{}-{}.txt",
            std::process::id(),
            0
        ));
        let path = path.to_string_lossy().to_string();
        write_checkpoint(&path, 7).unwrap();
        assert_eq!(read_checkpoint(&path).unwrap(), 7);
        std::fs::remove_file(&path).ok();
    }
}
