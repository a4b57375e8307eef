use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

/// Pretty JSON to `out`, or to stdout when no path is given.
pub fn emit<T: Serialize>(value: &T, out: Option<&Path>) -> Result<(), String> {
    let Some(path) = out else {
        return write_json(io::stdout().lock(), value)
            .map_err(|err| format!("Failed to write report to stdout: {err}"));
    };
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .map_err(|err| format!("Cannot create output directory '{}': {err}", dir.display()))?;
    }
    let file = File::create(path)
        .map_err(|err| format!("Cannot create report '{}': {err}", path.display()))?;
    write_json(BufWriter::new(file), value)
        .map_err(|err| format!("Cannot write report '{}': {err}", path.display()))
}

fn write_json<W: Write, T: Serialize>(mut writer: W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()
}
