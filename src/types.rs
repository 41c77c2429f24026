use serde::{Deserialize, Serialize};

/// One parsed FASTA or FASTQ record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceRecord {
    pub identifier: String,
    pub sequence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
}

impl SequenceRecord {
    pub fn fasta(identifier: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            sequence: sequence.into(),
            quality: None,
        }
    }

    pub fn fastq(
        identifier: impl Into<String>,
        sequence: impl Into<String>,
        quality: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            sequence: sequence.into(),
            quality: Some(quality.into()),
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Compression layer detected on the raw byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Gzip,
    Plain,
}

/// Sequence format detected on the decompressed byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SequenceFormat {
    Fasta,
    Fastq,
}

/// Outcome of a successful pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub compression: Compression,
    pub format: SequenceFormat,
    pub records: u64,
    pub bases: u64,
}

/// One ranked match returned by a gather server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatherResult {
    pub intersect_bp: u64,
    pub f_orig_query: f64,
    pub f_match: f64,
    pub filename: String,
    pub name: String,
    pub average_abund: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f_unique_to_query: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f_unique_weighted: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median_abund: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_abund: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f_match_orig: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_intersect_bp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gather_result_rank: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_bp: Option<u64>,
}

/// Service info response
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub version: String,
    pub formats: Vec<SequenceFormat>,
    pub compressions: Vec<Compression>,
    pub sketch: SketchInfo,
    #[serde(rename = "gatherEnabled")]
    pub gather_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct SketchInfo {
    pub ksize: u32,
    pub scaled: u32,
    pub seed: u64,
    pub molecule: String,
}
