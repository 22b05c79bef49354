use crate::counter::Tally;
use crate::domain::{GenomeDoc, RawRecord};
use crate::error::LoaderError;

/// Maps record-level annotations onto a genome document.
///
/// Length and strand come from the first feature, which spans the whole record.
pub fn extract_genome(
    record: &RawRecord,
    genomes_added: &mut Tally,
) -> Result<GenomeDoc, LoaderError> {
    genomes_added.increment();

    let annotations = &record.annotations;
    let gi = annotations.gi.ok_or_else(|| LoaderError::missing("gi"))?;
    let version = annotations
        .sequence_version
        .ok_or_else(|| LoaderError::missing("sequence_version"))?;
    let source = record
        .features
        .first()
        .ok_or_else(|| LoaderError::missing("source feature"))?;
    let taxonomy = annotations
        .taxonomy
        .clone()
        .ok_or_else(|| LoaderError::missing("taxonomy"))?;
    let organism = annotations
        .organism
        .clone()
        .ok_or_else(|| LoaderError::missing("organism"))?;

    Ok(GenomeDoc {
        gi,
        name: record.description.clone(),
        accession: record.name.clone(),
        version,
        length: source.location.end,
        strand: source.strand,
        taxonomy,
        organism,
    })
}
