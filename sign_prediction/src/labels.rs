use crate::config::LabelsConfig;
use std::{
    fs::{self, File},
    io::{self, BufRead},
    path::Path,
};

/// Class names indexed by model output position.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// An explicit labels file wins over the dataset directory listing.
    pub fn load(labels_cfg: &LabelsConfig) -> io::Result<Self> {
        match &labels_cfg.labels_file {
            Some(labels_file) => Self::from_file(labels_file),
            None => Self::from_dir(&labels_cfg.dataset_dir),
        }
    }

    /// Sorted entry names of `dataset_dir`, or an empty table when the
    /// directory does not exist.
    pub fn from_dir(dataset_dir: &Path) -> io::Result<Self> {
        let entries = match fs::read_dir(dataset_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(
                    "Dataset directory {:?} not found, predictions will use class indices",
                    dataset_dir
                );
                return Ok(Self::default());
            }
            Err(e) => return Err(e),
        };

        let mut labels = entries
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<io::Result<Vec<_>>>()?;
        labels.sort();

        Ok(Self { labels })
    }

    pub fn from_file(filepath: &Path) -> io::Result<Self> {
        let file = File::open(filepath)?;
        let reader = io::BufReader::new(file);
        let mut labels = Vec::new();

        for line_result in reader.lines() {
            let line = line_result?;
            let label = line.trim();
            if !label.is_empty() {
                labels.push(label.to_string());
            }
        }

        Ok(Self { labels })
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }
}
