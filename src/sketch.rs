//! Scaled MinHash signatures built with `sourmash`.
//!
//! Records are folded into a sourmash [`Signature`](sourmash::signature::Signature)
//! one sequence at a time; the serialized form is the JSON array that
//! `sourmash` and gather servers read. [`SketchSink`] feeds pipeline records
//! straight into any [`Sketch`].

use crate::pipeline::RecordSink;
use crate::types::SequenceRecord;
use crate::{Error, Result};
use sourmash::cmd::ComputeParameters;
use sourmash::signature::{Signature as SourmashSignature, SigsTrait};
use sourmash::sketch::Sketch as SketchKind;
use sourmash::sketch::minhash::{KmerMinHash, max_hash_for_scaled};
use std::path::Path;

pub const DEFAULT_KSIZE: u32 = 21;
pub const DEFAULT_SCALED: u32 = 2000;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SketchParams {
    pub ksize: u32,
    pub scaled: u32,
    pub seed: u64,
}

impl Default for SketchParams {
    fn default() -> Self {
        Self {
            ksize: DEFAULT_KSIZE,
            scaled: DEFAULT_SCALED,
            seed: DEFAULT_SEED,
        }
    }
}

impl SketchParams {
    pub fn new(ksize: u32, scaled: u32) -> Result<Self> {
        if ksize == 0 {
            return Err(Error::InvalidInput("ksize must be at least 1".to_string()));
        }
        if scaled == 0 {
            return Err(Error::InvalidInput("scaled must be at least 1".to_string()));
        }
        Ok(Self {
            ksize,
            scaled,
            ..Self::default()
        })
    }

    pub fn max_hash(&self) -> u64 {
        max_hash_for_scaled(self.scaled.into())
    }

    fn compute_parameters(&self) -> ComputeParameters {
        ComputeParameters::builder()
            .ksizes(vec![self.ksize])
            .num_hashes(0)
            .scaled(self.scaled)
            .seed(self.seed)
            .build()
    }
}

/// Incremental sketch built from raw sequences.
pub trait Sketch {
    fn add_sequence(&mut self, sequence: &[u8]) -> Result<()>;

    fn serialize(&self) -> Result<Vec<u8>>;
}

/// A named DNA signature holding one scaled MinHash.
#[derive(Debug, Clone)]
pub struct Signature {
    inner: SourmashSignature,
}

impl Signature {
    pub fn new(name: &str, filename: &str, params: SketchParams) -> Self {
        let mut inner = SourmashSignature::from_params(&params.compute_parameters());
        inner.set_name(name);
        inner.set_filename(filename);
        Self { inner }
    }

    fn minhash(&self) -> Option<KmerMinHash> {
        self.inner.sketches().into_iter().find_map(|sketch| match sketch {
            SketchKind::MinHash(mh) => Some(mh),
            _ => None,
        })
    }

    /// Retained hashes in ascending order.
    pub fn mins(&self) -> Vec<u64> {
        self.minhash().map(|mh| mh.mins()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.minhash().map(|mh| mh.size()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Sketch for Signature {
    /// k-mers containing non-ACGT bases are skipped.
    fn add_sequence(&mut self, sequence: &[u8]) -> Result<()> {
        self.inner.add_sequence(sequence, true)?;
        Ok(())
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&[&self.inner])
            .map_err(|e| Error::Internal(format!("failed to serialize signature: {}", e)))
    }
}

/// Adapts a [`Sketch`] into a pipeline [`RecordSink`].
///
/// The first sketch error stops further sketching and is returned by
/// [`SketchSink::into_inner`].
pub struct SketchSink<K> {
    sketch: K,
    sequences: u64,
    error: Option<Error>,
}

impl<K: Sketch> SketchSink<K> {
    pub fn new(sketch: K) -> Self {
        Self {
            sketch,
            sequences: 0,
            error: None,
        }
    }

    pub fn sequences(&self) -> u64 {
        self.sequences
    }

    pub fn into_inner(self) -> Result<K> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.sketch),
        }
    }
}

impl<K: Sketch> RecordSink for SketchSink<K> {
    fn on_record(&mut self, record: SequenceRecord) {
        if self.error.is_some() {
            return;
        }
        match self.sketch.add_sequence(record.sequence.as_bytes()) {
            Ok(()) => self.sequences += 1,
            Err(e) => {
                tracing::warn!(record = %record.identifier, error = %e, "sketching failed");
                self.error = Some(e);
            }
        }
    }

    fn on_complete(&mut self) {
        tracing::debug!(sequences = self.sequences, "sketch input complete");
    }
}

/// Write a serialized signature to `path`.
pub async fn save_signature(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes).await?;
    tracing::info!(path = %path.display(), size = bytes.len(), "signature saved");
    Ok(())
}
