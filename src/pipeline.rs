use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::counter::{IngestCounter, Summary};
use crate::domain::RawRecord;
use crate::error::LoaderError;
use crate::genbank;
use crate::parser::{ParseOutcome, RecordParser};
use crate::store::GenomeStore;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Sink that drops every event.
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn event(&self, _event: ProgressEvent) {}
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub summary: Option<Summary>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadResult {
    pub files: Vec<FileReport>,
}

impl LoadResult {
    pub fn failed(&self) -> usize {
        self.files.iter().filter(|file| file.error.is_some()).count()
    }

    pub fn total(&self) -> Summary {
        self.files
            .iter()
            .filter_map(|file| file.summary)
            .fold(Summary::default(), |acc, summary| Summary {
                records: acc.records + summary.records,
                genomes: acc.genomes + summary.genomes,
                features: acc.features + summary.features,
                sequences: acc.sequences + summary.sequences,
            })
    }
}

/// Loads GenBank records into a [`GenomeStore`].
#[derive(Clone)]
pub struct Loader<S: GenomeStore> {
    store: S,
}

impl<S: GenomeStore> Loader<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads every file in order. A failing file is reported and the next one is started with
    /// fresh counters and a fresh dedup snapshot.
    pub fn load_files(&self, paths: &[PathBuf], sink: &dyn ProgressSink) -> LoadResult {
        let files = paths
            .iter()
            .map(|path| match self.load_file(path, sink) {
                Ok(summary) => FileReport {
                    path: path.display().to_string(),
                    summary: Some(summary),
                    error: None,
                },
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "file aborted");
                    FileReport {
                        path: path.display().to_string(),
                        summary: None,
                        error: Some(err.to_string()),
                    }
                }
            })
            .collect();
        LoadResult { files }
    }

    pub fn load_file(
        &self,
        path: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<Summary, LoaderError> {
        info!("Scanning GenBank File {}", path.display());
        sink.event(ProgressEvent {
            message: format!("phase=Open; {}", path.display()),
            elapsed: None,
        });
        let records = genbank::open(path)?;
        self.process(records, sink)
    }

    /// Runs one file's worth of records through the parser and into the store.
    ///
    /// The store is asked for its genome ids once, before the first record is pulled. Each
    /// record's documents are persisted before the next record is decoded.
    pub fn process<I>(&self, source: I, sink: &dyn ProgressSink) -> Result<Summary, LoaderError>
    where
        I: IntoIterator<Item = Result<RawRecord, LoaderError>>,
    {
        let start = Instant::now();
        let existing = self.store.existing_genome_ids()?;
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; {} genomes already stored", existing.len()),
            elapsed: Some(start.elapsed()),
        });

        let parser = RecordParser::new(&existing);
        let mut counter = IngestCounter::new();
        for record in source {
            let record = record?;
            match parser.parse(&record, &mut counter)? {
                ParseOutcome::Deduped => {}
                ParseOutcome::Parsed(mut parsed) => {
                    self.store.persist(
                        &parsed.genome,
                        &mut parsed.features,
                        parsed.sequence.as_deref(),
                    )?;
                }
            }
        }

        let summary = counter.finish();
        log_summary(&summary);
        sink.event(ProgressEvent {
            message: format!(
                "phase=Store; records={} genomes={} features={} sequences={}",
                summary.records, summary.genomes, summary.features, summary.sequences
            ),
            elapsed: Some(start.elapsed()),
        });
        Ok(summary)
    }
}

pub fn log_summary(summary: &Summary) {
    for line in summary.lines() {
        info!("{line}");
    }
}
