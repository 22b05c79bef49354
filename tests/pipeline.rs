use std::path::{Path, PathBuf};

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use genome_loader::counter::Summary;
use genome_loader::domain::{Annotations, FeatureLocation, RawFeature, RawRecord, Strand};
use genome_loader::error::LoaderError;
use genome_loader::pipeline::{Loader, NoopSink};
use genome_loader::store::{FsStore, GenomeStore, MemoryStore};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn record(gi: i64, features: Vec<RawFeature>, sequence: &str) -> RawRecord {
    let mut all = vec![RawFeature::new(
        "source",
        FeatureLocation::new(0, sequence.len() as i64),
        Strand::Forward,
    )];
    all.extend(features);
    RawRecord {
        name: format!("NC_{gi:06}"),
        description: format!("genome {gi}"),
        annotations: Annotations {
            gi: Some(gi),
            sequence_version: Some(1),
            taxonomy: Some("Viruses; Caudoviricetes".to_string()),
            organism: Some("test phage".to_string()),
        },
        features: all,
        sequence: sequence.to_string(),
    }
}

fn gene(start: i64, end: i64, name: &str) -> RawFeature {
    let mut feature = RawFeature::new("gene", FeatureLocation::new(start, end), Strand::Forward);
    feature.qualifiers.push("gene", name);
    feature
}

#[test]
fn new_genome_after_known_ones() {
    let store = MemoryStore::with_existing([10, 20]);
    let loader = Loader::new(store);
    let source = vec![
        Ok(record(10, vec![gene(0, 5, "a")], "ACGT")),
        Ok(record(20, vec![gene(0, 5, "b")], "ACGT")),
        Ok(record(
            30,
            vec![
                gene(0, 5, "c"),
                RawFeature::new("tRNA", FeatureLocation::new(5, 8), Strand::Forward),
                gene(8, 12, "d"),
            ],
            "ACGTACGTACGT",
        )),
    ];

    let summary = loader.process(source, &NoopSink).unwrap();

    assert_eq!(
        summary,
        Summary {
            records: 3,
            genomes: 1,
            features: 2,
            sequences: 1,
        }
    );
    let stored = loader.store().genome(30).unwrap();
    assert_eq!(stored.features.len(), 2);
    assert!(stored.features.iter().all(|doc| doc.genome == 30));
    assert_eq!(loader.store().sequence(30).as_deref(), Some("ACGTACGTACGT"));
    assert!(loader.store().genome(10).is_none());
}

#[test]
fn empty_source_reports_no_genomes() {
    let loader = Loader::new(MemoryStore::default());

    let summary = loader.process(Vec::new(), &NoopSink).unwrap();

    assert_eq!(summary, Summary::default());
    assert!(!summary.found_records());
    assert_eq!(
        summary.lines(),
        vec!["No Genomes found, make sure this is a GenBank file.".to_string()]
    );
}

#[test]
fn input_without_genbank_records_reports_no_genomes() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().join("store")).unwrap();
    let loader = Loader::new(FsStore::new_with_root(root, 80));

    for (name, content) in [
        ("blank.gb", "\n\n"),
        ("notes.txt", "hello world\nthis is not genbank\n"),
    ] {
        let path = temp.path().join(name);
        std::fs::write(&path, content).unwrap();

        let summary = loader.load_file(&path, &NoopSink).unwrap();

        assert_eq!(summary, Summary::default(), "{name}");
        assert_eq!(
            summary.lines(),
            vec!["No Genomes found, make sure this is a GenBank file.".to_string()]
        );
    }
    assert!(loader.store().existing_genome_ids().unwrap().is_empty());
}

#[test]
fn unknown_sequence_is_counted_but_not_stored() {
    let loader = Loader::new(MemoryStore::default());
    let source = vec![Ok(record(40, vec![gene(0, 4, "x")], "ACNT"))];

    let summary = loader.process(source, &NoopSink).unwrap();

    assert_eq!(summary.sequences, 1);
    assert!(loader.store().genome(40).is_some());
    assert_eq!(loader.store().sequence(40), None);
}

#[test]
fn missing_annotation_aborts_the_file() {
    let loader = Loader::new(MemoryStore::default());
    let mut broken = record(50, vec![], "ACGT");
    broken.annotations.organism = None;
    let source = vec![
        Ok(record(49, vec![], "ACGT")),
        Ok(broken),
        Ok(record(51, vec![], "ACGT")),
    ];

    let err = loader.process(source, &NoopSink).unwrap_err();

    assert_matches!(err, LoaderError::MissingField { field: "organism" });
    assert!(loader.store().genome(49).is_some());
    assert!(loader.store().genome(51).is_none());
}

#[test]
fn duplicate_within_one_file_is_reported_by_the_store() {
    let loader = Loader::new(MemoryStore::default());
    let source = vec![
        Ok(record(60, vec![], "ACGT")),
        Ok(record(60, vec![], "ACGT")),
    ];

    let err = loader.process(source, &NoopSink).unwrap_err();

    assert_matches!(err, LoaderError::DuplicateGenome(60));
}

#[test]
fn loads_genbank_file_into_directory_store() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().join("store")).unwrap();
    let loader = Loader::new(FsStore::new_with_root(root, 80));

    let summary = loader
        .load_file(&fixture("two_phages.gb"), &NoopSink)
        .unwrap();

    assert_eq!(
        summary,
        Summary {
            records: 2,
            genomes: 2,
            features: 5,
            sequences: 2,
        }
    );
    let store = loader.store();
    let ids = store.existing_genome_ids().unwrap();
    assert!(ids.contains(&1001) && ids.contains(&1002));

    let genome = store.read_genome(1001).unwrap().unwrap();
    assert_eq!(genome.accession, "TESTPH01");
    assert_eq!(genome.version, 1);
    assert_eq!(genome.length, 60);

    let features = store.read_features(1001).unwrap();
    let spans: Vec<_> = features
        .iter()
        .map(|doc| (doc.name.as_str(), doc.start, doc.end))
        .collect();
    assert_eq!(
        spans,
        vec![("A", 3, 20), ("A", 3, 10), ("A", 15, 20), ("tp02", 40, 55)]
    );
    assert_eq!(features[3].strand, Strand::Reverse);

    let sequence = store.read_sequence(1001).unwrap().unwrap();
    assert_eq!(sequence.len(), 60);
    assert!(sequence.starts_with("GAGTTTTATC"));
    assert_eq!(store.read_sequence(1002).unwrap(), None);
}

#[test]
fn second_run_over_same_file_adds_nothing() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().join("store")).unwrap();
    let loader = Loader::new(FsStore::new_with_root(root, 80));
    let path = fixture("two_phages.gb");

    loader.load_file(&path, &NoopSink).unwrap();
    let again = loader.load_file(&path, &NoopSink).unwrap();

    assert_eq!(
        again,
        Summary {
            records: 2,
            genomes: 0,
            features: 0,
            sequences: 0,
        }
    );
}

#[test]
fn unreadable_file_does_not_stop_later_files() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().join("store")).unwrap();
    let loader = Loader::new(FsStore::new_with_root(root, 80));
    let paths = vec![temp.path().join("missing.gb"), fixture("two_phages.gb")];

    let result = loader.load_files(&paths, &NoopSink);

    assert_eq!(result.failed(), 1);
    assert!(result.files[0].error.as_deref().unwrap().contains("missing.gb"));
    assert_eq!(result.files[1].summary.unwrap().genomes, 2);
}

#[test]
fn missing_file_is_a_file_access_error() {
    let loader = Loader::new(MemoryStore::default());

    let err = loader
        .load_file(Path::new("/nonexistent/input.gbff"), &NoopSink)
        .unwrap_err();

    assert_matches!(err, LoaderError::FileAccess { .. });
}
