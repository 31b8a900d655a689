use crate::Corpus;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: u32 = 1;
pub const DEFAULT_SNAPSHOT_FILE: &str = "snapshot.bin";

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub vocabulary_size: u32,
    pub created_at: String,
    pub version: u32,
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    corpus: Corpus,
}

// Same layout as `Snapshot`, borrowed for writing.
#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    corpus: &'a Corpus,
}

pub struct SnapshotPaths {
    pub root: PathBuf,
    snapshot_file: String,
}

impl SnapshotPaths {
    #[cfg(test)]
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self::with_file(root, DEFAULT_SNAPSHOT_FILE)
    }
    pub fn with_file<P: AsRef<Path>>(root: P, snapshot_file: &str) -> Self {
        Self { root: root.as_ref().to_path_buf(), snapshot_file: snapshot_file.to_string() }
    }
    pub fn snapshot(&self) -> PathBuf { self.root.join(&self.snapshot_file) }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

// Write to a sibling temp file, then rename over the target.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let mut f = File::create(&tmp)?;
    f.write_all(bytes)?;
    f.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn save_snapshot(paths: &SnapshotPaths, corpus: &Corpus) -> Result<()> {
    create_dir_all(&paths.root)?;
    let snapshot = SnapshotRef { version: SNAPSHOT_VERSION, corpus };
    let bytes = bincode::serialize(&snapshot)?;
    write_atomic(&paths.snapshot(), &bytes)?;
    Ok(())
}

pub fn load_snapshot(paths: &SnapshotPaths) -> Result<Corpus> {
    let mut f = File::open(paths.snapshot())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let snapshot: Snapshot = bincode::deserialize(&buf)?;
    if snapshot.version != SNAPSHOT_VERSION {
        bail!("unsupported snapshot version {}", snapshot.version);
    }
    if !snapshot.corpus.is_consistent() {
        bail!(
            "snapshot has {} documents but {} vectors",
            snapshot.corpus.documents.len(),
            snapshot.corpus.vectors.len()
        );
    }
    Ok(snapshot.corpus)
}

pub fn save_meta(paths: &SnapshotPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let json = serde_json::to_string_pretty(meta)?;
    write_atomic(&paths.meta(), json.as_bytes())?;
    Ok(())
}

#[cfg(test)]
pub fn load_meta(paths: &SnapshotPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

pub fn meta_for(corpus: &Corpus) -> MetaFile {
    MetaFile {
        num_docs: corpus.documents.len() as u32,
        vocabulary_size: corpus.vocabulary.len() as u32,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: SNAPSHOT_VERSION,
    }
}

/// Persist the corpus and its sidecar metadata.
pub fn save_all(paths: &SnapshotPaths, corpus: &Corpus) -> Result<()> {
    save_snapshot(paths, corpus)?;
    save_meta(paths, &meta_for(corpus))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocMeta, Document, IdfMode};
    use tempfile::tempdir;

    fn sample_corpus() -> Corpus {
        let mut corpus = Corpus::new();
        corpus.documents.push(Document::new(
            "ADC conversion with DMA",
            DocMeta::new().with_category("hardware").with_chunk_id("rm0410.pdf_0").with_extra("chunk_index", 0i64),
        ));
        let tokens = crate::tokenizer::tokenize(&corpus.documents[0].content);
        corpus.vocabulary.extend(tokens.iter().cloned());
        corpus.idf.recompute(std::iter::once(tokens.as_slice()), IdfMode::Smoothed);
        corpus.vectors.push(corpus.idf.weight_vector(&tokens));
        corpus
    }

    #[test]
    fn snapshot_round_trips_exactly() {
        let dir = tempdir().unwrap();
        let paths = SnapshotPaths::new(dir.path());
        let corpus = sample_corpus();
        save_all(&paths, &corpus).unwrap();
        assert_eq!(load_snapshot(&paths).unwrap(), corpus);
        let meta = load_meta(&paths).unwrap();
        assert_eq!(meta.num_docs, 1);
        assert_eq!(meta.vocabulary_size, corpus.vocabulary.len() as u32);
        assert!(!paths.root.join("snapshot.bin.tmp").exists());
    }

    #[test]
    fn garbage_and_inconsistent_snapshots_are_rejected() {
        let dir = tempdir().unwrap();
        let paths = SnapshotPaths::new(dir.path());
        std::fs::write(paths.snapshot(), b"not a snapshot").unwrap();
        assert!(load_snapshot(&paths).is_err());

        let mut corpus = sample_corpus();
        corpus.vectors.clear();
        save_snapshot(&paths, &corpus).unwrap();
        assert!(load_snapshot(&paths).is_err());
    }
}
