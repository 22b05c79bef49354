use std::collections::HashSet;
use std::iter::Skip;
use std::slice;
use std::vec;

use tracing::debug;

use crate::counter::{IngestCounter, Tally};
use crate::domain::{FeatureDoc, GenomeDoc, RawFeature, RawRecord};
use crate::error::LoaderError;
use crate::features::build_features;
use crate::genome::extract_genome;
use crate::sequence::extract_sequence;

/// Result of looking at one record.
#[derive(Debug)]
pub enum ParseOutcome<'a> {
    /// The genome is already in the store; nothing was extracted.
    Deduped,
    Parsed(ParsedRecord<'a>),
}

#[derive(Debug)]
pub struct ParsedRecord<'a> {
    pub genome: GenomeDoc,
    pub features: FeatureDocs<'a>,
    pub sequence: Option<String>,
}

/// Turns records into documents, skipping genomes listed in the dedup snapshot.
#[derive(Debug, Clone, Copy)]
pub struct RecordParser<'s> {
    existing: &'s HashSet<i64>,
}

impl<'s> RecordParser<'s> {
    pub fn new(existing: &'s HashSet<i64>) -> Self {
        Self { existing }
    }

    pub fn is_known(&self, record: &RawRecord) -> bool {
        record
            .annotations
            .gi
            .is_some_and(|gi| self.existing.contains(&gi))
    }

    pub fn parse<'a>(
        &self,
        record: &'a RawRecord,
        counter: &'a mut IngestCounter,
    ) -> Result<ParseOutcome<'a>, LoaderError> {
        counter.records.increment();

        if self.is_known(record) {
            debug!(accession = %record.name, "genome already stored, skipping");
            return Ok(ParseOutcome::Deduped);
        }

        let genome = extract_genome(record, &mut counter.genomes)?;
        let sequence = extract_sequence(&record.sequence, &mut counter.sequences);
        debug!(gi = genome.gi, accession = %genome.accession, "parsed genome");
        let features = FeatureDocs::new(record, genome.clone(), &mut counter.features);

        Ok(ParseOutcome::Parsed(ParsedRecord {
            genome,
            features,
            sequence,
        }))
    }
}

/// Feature documents of one record, built on demand.
///
/// The first feature is skipped and only `gene` and `CDS` features are used. Documents are
/// counted as each feature is expanded, so a partially consumed iterator counts only what it
/// produced.
#[derive(Debug)]
pub struct FeatureDocs<'a> {
    genome: GenomeDoc,
    remaining: Skip<slice::Iter<'a, RawFeature>>,
    pending: vec::IntoIter<FeatureDoc>,
    features_added: &'a mut Tally,
}

impl<'a> FeatureDocs<'a> {
    fn new(record: &'a RawRecord, genome: GenomeDoc, features_added: &'a mut Tally) -> Self {
        Self {
            genome,
            remaining: record.features.iter().skip(1),
            pending: Vec::new().into_iter(),
            features_added,
        }
    }
}

impl Iterator for FeatureDocs<'_> {
    type Item = FeatureDoc;

    fn next(&mut self) -> Option<FeatureDoc> {
        loop {
            if let Some(doc) = self.pending.next() {
                return Some(doc);
            }
            let feature = self.remaining.find(|feature| feature.is_loaded_type())?;
            self.pending =
                build_features(feature, &self.genome, self.features_added).into_iter();
        }
    }
}
