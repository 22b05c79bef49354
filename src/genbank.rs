use std::fs::File;
use std::io::{BufRead, BufReader, Chain, Cursor, Read};
use std::path::Path;
use std::sync::LazyLock;

use flate2::read::MultiGzDecoder;
use gb_io::reader::SeqReader;
use gb_io::seq::{Feature, Location, Seq};
use regex::Regex;

use crate::domain::{Annotations, FeatureLocation, Qualifiers, RawFeature, RawRecord, Strand};
use crate::error::LoaderError;

static GI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bGI:(\d+)").expect("GI pattern compiles"));

type Positioned<R> = Chain<Cursor<Vec<u8>>, BufReader<R>>;

/// Streams GenBank entries as [`RawRecord`]s, decoding one entry per call to `next`.
///
/// Anything before the first `LOCUS` line is skipped. Input without a `LOCUS` line (blank
/// files, plain text) yields no records.
pub struct GenbankReader<R: Read> {
    inner: Option<SeqReader<Positioned<R>>>,
}

impl<R: Read> GenbankReader<R> {
    pub fn new(reader: R) -> Result<Self, LoaderError> {
        let mut reader = BufReader::new(reader);
        let mut line = Vec::new();
        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(|err| LoaderError::RecordParse(err.to_string()))?;
            if read == 0 {
                tracing::debug!("no LOCUS line in input");
                return Ok(Self { inner: None });
            }
            if line.starts_with(b"LOCUS") {
                break;
            }
        }
        Ok(Self {
            inner: Some(SeqReader::new(Cursor::new(line).chain(reader))),
        })
    }
}

impl<R: Read> Iterator for GenbankReader<R> {
    type Item = Result<RawRecord, LoaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.as_mut()?.next()?;
        Some(
            item.map(|seq| to_raw_record(&seq))
                .map_err(|err| LoaderError::RecordParse(err.to_string())),
        )
    }
}

/// Opens a GenBank file, decompressing it when the name ends in `.gz`.
pub fn open(path: &Path) -> Result<GenbankReader<Box<dyn Read>>, LoaderError> {
    let file = File::open(path).map_err(|err| LoaderError::FileAccess {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(MultiGzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    GenbankReader::new(reader)
}

pub fn to_raw_record(seq: &Seq) -> RawRecord {
    let (organism, taxonomy) = seq
        .source
        .as_ref()
        .and_then(|source| source.organism.as_deref())
        .map(split_organism)
        .unzip();

    RawRecord {
        name: seq.name.clone().unwrap_or_default(),
        description: seq.definition.clone().unwrap_or_default(),
        annotations: Annotations {
            gi: seq.version.as_deref().and_then(parse_gi),
            sequence_version: seq.version.as_deref().and_then(parse_sequence_version),
            taxonomy,
            organism,
        },
        features: seq.features.iter().map(to_raw_feature).collect(),
        sequence: String::from_utf8_lossy(&seq.seq).to_ascii_uppercase(),
    }
}

pub fn to_raw_feature(feature: &Feature) -> RawFeature {
    let qualifiers: Qualifiers = feature
        .qualifiers
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone().unwrap_or_default()))
        .collect();

    let (operator, parts) = match strip_complement(&feature.location) {
        Location::Join(parts) => (Some("join"), parts.as_slice()),
        Location::Order(parts) => (Some("order"), parts.as_slice()),
        Location::Bond(parts) => (Some("bond"), parts.as_slice()),
        Location::OneOf(parts) => (Some("one-of"), parts.as_slice()),
        _ => (None, &[] as &[Location]),
    };

    RawFeature {
        kind: feature.kind.to_string(),
        location: span(&feature.location).unwrap_or(FeatureLocation::new(0, 0)),
        strand: strand(&feature.location),
        operator: operator.map(str::to_string),
        sub_locations: parts.iter().filter_map(span).collect(),
        qualifiers,
    }
}

/// `ACCESSION.VERSION [GI:n]` to the GI number.
pub fn parse_gi(version: &str) -> Option<i64> {
    GI_RE
        .captures(version)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// `ACCESSION.VERSION [GI:n]` to the numeric version.
pub fn parse_sequence_version(version: &str) -> Option<i64> {
    let accession_version = version.split_whitespace().next()?;
    let (_, number) = accession_version.rsplit_once('.')?;
    number.parse().ok()
}

/// Splits the ORGANISM block into the organism name and its `; `-joined lineage.
pub fn split_organism(block: &str) -> (String, String) {
    let mut lines = block.lines();
    let organism = lines.next().unwrap_or_default().trim().to_string();
    let lineage = lines.map(str::trim).collect::<Vec<_>>().join(" ");
    let taxonomy = lineage
        .trim_end_matches('.')
        .split(';')
        .map(str::trim)
        .filter(|rank| !rank.is_empty())
        .collect::<Vec<_>>()
        .join("; ");
    (organism, taxonomy)
}

fn strip_complement(location: &Location) -> &Location {
    match location {
        Location::Complement(inner) => strip_complement(inner),
        other => other,
    }
}

/// Smallest start and largest end over every concrete range in the location.
fn span(location: &Location) -> Option<FeatureLocation> {
    let mut ranges = Vec::new();
    collect_ranges(location, &mut ranges);
    let start = ranges.iter().map(|(start, _)| *start).min()?;
    let end = ranges.iter().map(|(_, end)| *end).max()?;
    Some(FeatureLocation::new(start, end))
}

fn collect_ranges(location: &Location, ranges: &mut Vec<(i64, i64)>) {
    match location {
        Location::Range((start, _), (end, _)) | Location::Between(start, end) => {
            ranges.push((*start, *end));
        }
        Location::Complement(inner) => collect_ranges(inner, ranges),
        Location::Join(parts)
        | Location::Order(parts)
        | Location::Bond(parts)
        | Location::OneOf(parts) => {
            for part in parts {
                collect_ranges(part, ranges);
            }
        }
        Location::External(_, Some(inner)) => collect_ranges(inner, ranges),
        Location::External(_, None) | Location::Gap(_) => {}
    }
}

fn strand(location: &Location) -> Strand {
    let mut strands = Vec::new();
    collect_strands(location, false, &mut strands);
    if strands.is_empty() {
        Strand::Unknown
    } else if strands.iter().all(|reverse| *reverse) {
        Strand::Reverse
    } else if strands.iter().all(|reverse| !*reverse) {
        Strand::Forward
    } else {
        Strand::Unknown
    }
}

fn collect_strands(location: &Location, reverse: bool, strands: &mut Vec<bool>) {
    match location {
        Location::Range(_, _) | Location::Between(_, _) => strands.push(reverse),
        Location::Complement(inner) => collect_strands(inner, !reverse, strands),
        Location::Join(parts)
        | Location::Order(parts)
        | Location::Bond(parts)
        | Location::OneOf(parts) => {
            for part in parts {
                collect_strands(part, reverse, strands);
            }
        }
        Location::External(_, Some(inner)) => collect_strands(inner, reverse, strands),
        Location::External(_, None) | Location::Gap(_) => {}
    }
}
