use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::sync::{Mutex, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::Builder;

use crate::domain::{FeatureDoc, GenomeDoc};
use crate::error::LoaderError;
use crate::sequence::{self, DEFAULT_CHUNK_SIZE};

/// Where parsed genomes end up.
pub trait GenomeStore {
    /// Genome ids currently stored.
    fn existing_genome_ids(&self) -> Result<HashSet<i64>, LoaderError>;

    /// Stores a genome, its features, then its sequence if there is one.
    ///
    /// Fails with [`LoaderError::DuplicateGenome`] when the genome is already stored.
    fn persist(
        &self,
        genome: &GenomeDoc,
        features: &mut dyn Iterator<Item = FeatureDoc>,
        sequence: Option<&str>,
    ) -> Result<(), LoaderError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceFile {
    pub gi: i64,
    pub length: usize,
    pub chunk_size: usize,
    pub chunks: usize,
    pub upload_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceChunk {
    pub files_id: i64,
    pub n: usize,
    pub data: String,
}

#[derive(Deserialize)]
struct StoredGi {
    gi: i64,
}

/// Directory-backed document store.
///
/// ```text
/// <root>/genome/<gi>.json
/// <root>/feature/<gi>.jsonl
/// <root>/sequence/<gi>.files.json
/// <root>/sequence/<gi>.chunks.jsonl
/// ```
#[derive(Debug, Clone)]
pub struct FsStore {
    root: Utf8PathBuf,
    chunk_size: usize,
}

impl FsStore {
    pub fn new() -> Result<Self, LoaderError> {
        Ok(Self::new_with_root(Self::default_root()?, DEFAULT_CHUNK_SIZE))
    }

    pub fn new_with_root(root: Utf8PathBuf, chunk_size: usize) -> Self {
        Self {
            root,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn default_root() -> Result<Utf8PathBuf, LoaderError> {
        BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(
                    dirs.home_dir()
                        .join(".cache")
                        .join("genome-loader")
                        .join("store"),
                )
                .ok()
            })
            .ok_or_else(|| LoaderError::Store("unable to resolve store directory".to_string()))
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn genome_path(&self, gi: i64) -> Utf8PathBuf {
        self.root.join("genome").join(format!("{gi}.json"))
    }

    pub fn feature_path(&self, gi: i64) -> Utf8PathBuf {
        self.root.join("feature").join(format!("{gi}.jsonl"))
    }

    pub fn sequence_file_path(&self, gi: i64) -> Utf8PathBuf {
        self.root.join("sequence").join(format!("{gi}.files.json"))
    }

    pub fn sequence_chunks_path(&self, gi: i64) -> Utf8PathBuf {
        self.root.join("sequence").join(format!("{gi}.chunks.jsonl"))
    }

    pub fn ensure_root(&self) -> Result<(), LoaderError> {
        for dir in ["genome", "feature", "sequence"] {
            fs::create_dir_all(self.root.join(dir).as_std_path()).map_err(store_err)?;
        }
        Ok(())
    }

    pub fn read_genome(&self, gi: i64) -> Result<Option<GenomeDoc>, LoaderError> {
        let path = self.genome_path(gi);
        if !path.as_std_path().exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    pub fn read_features(&self, gi: i64) -> Result<Vec<FeatureDoc>, LoaderError> {
        let path = self.feature_path(gi);
        if !path.as_std_path().exists() {
            return Ok(Vec::new());
        }
        read_json_lines(&path)
    }

    /// Reassembles a stored sequence from its chunks.
    pub fn read_sequence(&self, gi: i64) -> Result<Option<String>, LoaderError> {
        let file_path = self.sequence_file_path(gi);
        if !file_path.as_std_path().exists() {
            return Ok(None);
        }
        let file: SequenceFile = read_json(&file_path)?;
        let mut chunks: Vec<SequenceChunk> = read_json_lines(&self.sequence_chunks_path(gi))?;
        if chunks.len() != file.chunks {
            return Err(LoaderError::Store(format!(
                "sequence {gi} has {} chunks, expected {}",
                chunks.len(),
                file.chunks
            )));
        }
        chunks.sort_by_key(|chunk| chunk.n);
        Ok(Some(chunks.into_iter().map(|chunk| chunk.data).collect()))
    }

    fn write_features(
        &self,
        gi: i64,
        features: &mut dyn Iterator<Item = FeatureDoc>,
    ) -> Result<(), LoaderError> {
        write_lines_atomic(&self.feature_path(gi), features)
    }

    fn write_sequence(&self, gi: i64, payload: &str) -> Result<(), LoaderError> {
        let chunks = sequence::chunks(payload, self.chunk_size)
            .enumerate()
            .map(|(n, data)| SequenceChunk {
                files_id: gi,
                n,
                data: String::from_utf8_lossy(data).into_owned(),
            });
        write_lines_atomic(&self.sequence_chunks_path(gi), chunks)?;

        let file = SequenceFile {
            gi,
            length: payload.len(),
            chunk_size: self.chunk_size,
            chunks: payload.len().div_ceil(self.chunk_size),
            upload_date: chrono::Utc::now().to_rfc3339(),
        };
        write_json_atomic(&self.sequence_file_path(gi), &file)
    }
}

impl GenomeStore for FsStore {
    fn existing_genome_ids(&self) -> Result<HashSet<i64>, LoaderError> {
        let genome_dir = self.root.join("genome");
        if !genome_dir.as_std_path().exists() {
            return Ok(HashSet::new());
        }
        let mut ids = HashSet::new();
        for entry in fs::read_dir(genome_dir.as_std_path()).map_err(store_err)? {
            let path = entry.map_err(store_err)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                let content = fs::read_to_string(&path).map_err(store_err)?;
                let stored: StoredGi = serde_json::from_str(&content).map_err(store_err)?;
                ids.insert(stored.gi);
            }
        }
        Ok(ids)
    }

    fn persist(
        &self,
        genome: &GenomeDoc,
        features: &mut dyn Iterator<Item = FeatureDoc>,
        sequence: Option<&str>,
    ) -> Result<(), LoaderError> {
        self.ensure_root()?;
        let genome_path = self.genome_path(genome.gi);
        if genome_path.as_std_path().exists() {
            return Err(LoaderError::DuplicateGenome(genome.gi));
        }
        // The genome document goes last: its presence is what marks the gi as loaded.
        self.write_features(genome.gi, features)?;
        if let Some(payload) = sequence {
            self.write_sequence(genome.gi, payload)?;
        }
        write_json_atomic(&genome_path, genome)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredGenome {
    pub genome: GenomeDoc,
    pub features: Vec<FeatureDoc>,
    pub sequence_chunks: Option<Vec<String>>,
}

/// In-process store, handy for tests and dry runs.
#[derive(Debug)]
pub struct MemoryStore {
    chunk_size: usize,
    genomes: Mutex<BTreeMap<i64, StoredGenome>>,
    preloaded: HashSet<i64>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl MemoryStore {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            genomes: Mutex::new(BTreeMap::new()),
            preloaded: HashSet::new(),
        }
    }

    /// A store that reports `ids` as already present without holding their documents.
    pub fn with_existing(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            preloaded: ids.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn genome(&self, gi: i64) -> Option<StoredGenome> {
        self.genomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&gi)
            .cloned()
    }

    pub fn sequence(&self, gi: i64) -> Option<String> {
        self.genome(gi)
            .and_then(|stored| stored.sequence_chunks)
            .map(|chunks| chunks.concat())
    }

    pub fn len(&self) -> usize {
        self.genomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GenomeStore for MemoryStore {
    fn existing_genome_ids(&self) -> Result<HashSet<i64>, LoaderError> {
        let genomes = self.genomes.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(genomes
            .keys()
            .copied()
            .chain(self.preloaded.iter().copied())
            .collect())
    }

    fn persist(
        &self,
        genome: &GenomeDoc,
        features: &mut dyn Iterator<Item = FeatureDoc>,
        sequence: Option<&str>,
    ) -> Result<(), LoaderError> {
        let mut genomes = self.genomes.lock().unwrap_or_else(PoisonError::into_inner);
        if self.preloaded.contains(&genome.gi) || genomes.contains_key(&genome.gi) {
            return Err(LoaderError::DuplicateGenome(genome.gi));
        }
        let sequence_chunks = sequence.map(|payload| {
            sequence::chunks(payload, self.chunk_size)
                .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                .collect()
        });
        genomes.insert(
            genome.gi,
            StoredGenome {
                genome: genome.clone(),
                features: features.collect(),
                sequence_chunks,
            },
        );
        Ok(())
    }
}

/// Writes through a uniquely named temp file in the destination directory, then renames it
/// into place.
fn write_atomic(
    path: &Utf8Path,
    write: impl FnOnce(&mut BufWriter<&fs::File>) -> Result<(), LoaderError>,
) -> Result<(), LoaderError> {
    let parent = path
        .parent()
        .ok_or_else(|| LoaderError::Store("invalid destination path".to_string()))?;
    fs::create_dir_all(parent.as_std_path()).map_err(store_err)?;
    let temp = Builder::new()
        .prefix(".gbloader-")
        .tempfile_in(parent.as_std_path())
        .map_err(store_err)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        write(&mut writer)?;
        writer.flush().map_err(store_err)?;
    }
    temp.persist(path.as_std_path()).map_err(store_err)?;
    Ok(())
}

fn write_json_atomic<T: Serialize>(path: &Utf8Path, value: &T) -> Result<(), LoaderError> {
    write_atomic(path, |writer| {
        serde_json::to_writer_pretty(&mut *writer, value).map_err(store_err)
    })
}

fn write_lines_atomic<T: Serialize>(
    path: &Utf8Path,
    items: impl Iterator<Item = T>,
) -> Result<(), LoaderError> {
    write_atomic(path, |writer| {
        for item in items {
            serde_json::to_writer(&mut *writer, &item).map_err(store_err)?;
            writer.write_all(b"\n").map_err(store_err)?;
        }
        Ok(())
    })
}

fn read_json<T: DeserializeOwned>(path: &Utf8Path) -> Result<T, LoaderError> {
    let content = fs::read_to_string(path.as_std_path()).map_err(store_err)?;
    serde_json::from_str(&content).map_err(store_err)
}

fn read_json_lines<T: DeserializeOwned>(path: &Utf8Path) -> Result<Vec<T>, LoaderError> {
    let file = fs::File::open(path.as_std_path()).map_err(store_err)?;
    let mut items = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(store_err)?;
        if line.trim().is_empty() {
            continue;
        }
        items.push(serde_json::from_str(&line).map_err(store_err)?);
    }
    Ok(items)
}

fn store_err(err: impl std::fmt::Display) -> LoaderError {
    LoaderError::Store(err.to_string())
}
