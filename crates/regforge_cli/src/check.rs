//! `regforge check`: load and validate a map without generating.

use std::path::Path;

use log::info;
use regforge_diagnostics::DiagnosticSink;

use crate::pipeline::{load, report};
use crate::GlobalArgs;

/// Runs the `regforge check` command.
pub fn run(map: &str, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let sink = DiagnosticSink::new();
    if let Some(map) = load(Path::new(map), &sink) {
        info!(
            "{}: {} nodes, {} bus, {} bytes",
            map.name(),
            map.len(),
            map.bus(),
            map.root_data().size
        );
    }
    Ok(report(&sink, global))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn global() -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config: None,
        }
    }

    #[test]
    fn valid_map_passes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("map.json");
        fs::write(
            &path,
            r#"{"name": "Ok", "bus": "cern-be-vme-16", "word_size": 2, "size": 4, "blk_bits": 2,
                "elements": [{"kind": "reg", "name": "r", "access": "ro", "width": 16,
                              "fields": [{"lo": 0, "hi": 15}]}]}"#,
        )
        .unwrap();
        assert_eq!(run(&path.display().to_string(), &global()).unwrap(), 0);
    }

    #[test]
    fn overlapping_fields_fail() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("map.json");
        fs::write(
            &path,
            r#"{"name": "Bad", "bus": "wb-32-be", "word_size": 4, "size": 4, "blk_bits": 2,
                "elements": [{"kind": "reg", "name": "r", "access": "rw", "width": 32,
                              "fields": [{"name": "a", "lo": 0, "hi": 7},
                                         {"name": "b", "lo": 4, "hi": 11}]}]}"#,
        )
        .unwrap();
        assert_eq!(run(&path.display().to_string(), &global()).unwrap(), 1);
    }

    #[test]
    fn malformed_json_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("map.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(run(&path.display().to_string(), &global()).unwrap(), 1);
    }
}
