use crate::utils::{open_text_reader, Result};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

/// Random-access source of raw signal samples, keyed by read identifier.
///
/// Implementations wrap a signal container; the engine only needs
/// per-read lookup, never iteration.
pub trait SignalSource {
    /// Raw samples for a read, or `None` when the container has no
    /// entry for that identifier.
    fn signal(&mut self, read_id: &str) -> Result<Option<Vec<f32>>>;
}

/// In-memory signal table loaded from a tab-separated file with one
/// `read_id <TAB> sample,sample,...` line per read (plain or gzipped).
#[derive(Debug, Default, Clone)]
pub struct SignalTable {
    signals: HashMap<String, Vec<f32>>,
}

impl SignalTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = open_text_reader(path)?;
        let mut table = Self::new();

        for (line_number, line) in reader.lines().enumerate() {
            let line =
                line.map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.splitn(2, '\t');
            let id = parts.next().unwrap().trim();
            let values = parts.next().ok_or_else(|| {
                format!("Missing sample values at line {}: {}", line_number + 1, id)
            })?;

            let samples = values
                .split(',')
                .map(|v| {
                    v.trim().parse::<f32>().map_err(|_| {
                        format!("Invalid sample value {:?} at line {}", v, line_number + 1)
                    })
                })
                .collect::<std::result::Result<Vec<f32>, String>>()?;

            if table.signals.insert(id.to_string(), samples).is_some() {
                return Err(format!(
                    "Duplicate read identifier at line {}: {}",
                    line_number + 1,
                    id
                ));
            }
        }

        Ok(table)
    }

    pub fn insert(&mut self, read_id: impl Into<String>, samples: Vec<f32>) {
        self.signals.insert(read_id.into(), samples);
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

impl SignalSource for SignalTable {
    fn signal(&mut self, read_id: &str) -> Result<Option<Vec<f32>>> {
        Ok(self.signals.get(read_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn table_from_tsv_ok() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# read_id\tsamples").unwrap();
        writeln!(file, "read-1\t80.5,81.25,79.0").unwrap();
        writeln!(file, "read-2\t100.0").unwrap();
        let mut table = SignalTable::from_path(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.signal("read-1").unwrap(),
            Some(vec![80.5, 81.25, 79.0])
        );
        assert_eq!(table.signal("read-3").unwrap(), None);
    }

    #[test]
    fn table_rejects_duplicates_and_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "read-1\t1.0,2.0").unwrap();
        writeln!(file, "read-1\t3.0").unwrap();
        let err = SignalTable::from_path(file.path()).unwrap_err();
        assert_eq!(err, "Duplicate read identifier at line 2: read-1");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "read-1\t1.0,abc").unwrap();
        assert!(SignalTable::from_path(file.path()).is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "read-1").unwrap();
        assert!(SignalTable::from_path(file.path()).is_err());
    }
}
