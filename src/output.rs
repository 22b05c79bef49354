use std::io::{self, Write};

use serde::Serialize;

use crate::pipeline::{LoadResult, ProgressEvent, ProgressSink};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Log,
    Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenomeListing {
    pub store: String,
    pub genomes: Vec<i64>,
}

pub struct JsonOutput;

#[derive(Serialize)]
struct ProgressLine<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_ms: Option<u64>,
}

impl JsonOutput {
    pub fn print_load(result: &LoadResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_genomes(listing: &GenomeListing) -> io::Result<()> {
        Self::print_json(listing)
    }

    /// Writes one progress event as a single JSON line.
    pub fn write_progress<W: Write>(writer: &mut W, event: &ProgressEvent) -> io::Result<()> {
        let line = ProgressLine {
            message: &event.message,
            elapsed_ms: event.elapsed.map(|elapsed| elapsed.as_millis() as u64),
        };
        serde_json::to_writer(&mut *writer, &line).map_err(io::Error::other)?;
        writer.write_all(b"\n")
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Progress goes to stderr so stdout stays a single JSON document.
impl ProgressSink for JsonOutput {
    fn event(&self, event: ProgressEvent) {
        let _ = Self::write_progress(&mut io::stderr().lock(), &event);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn progress_event_is_one_json_line() {
        let mut buf = Vec::new();
        JsonOutput::write_progress(
            &mut buf,
            &ProgressEvent {
                message: "phase=Store; records=2".to_string(),
                elapsed: Some(Duration::from_millis(1500)),
            },
        )
        .unwrap();
        JsonOutput::write_progress(
            &mut buf,
            &ProgressEvent {
                message: "phase=Open; a.gb".to_string(),
                elapsed: None,
            },
        )
        .unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["message"], "phase=Store; records=2");
        assert_eq!(lines[0]["elapsed_ms"], 1500);
        assert!(lines[1].get("elapsed_ms").is_none());
    }
}
