//! Dataset Store
//!
//! JSON files holding an array of respondent records.

use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::error::{SimResult, SimulationError};
use crate::model::{PhaseDataset, RespondentRecord};

pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record; the first malformed one fails the load
    pub async fn load(&self) -> SimResult<Vec<RespondentRecord>> {
        let content = fs::read_to_string(&self.path).await?;
        let rows = match serde_json::from_str::<Value>(&content)? {
            Value::Array(rows) => rows,
            _ => {
                return Err(SimulationError::invalid_input(format!(
                    "{} does not contain a JSON array of records",
                    self.path.display()
                )))
            }
        };

        let records = rows
            .into_iter()
            .enumerate()
            .map(|(position, row)| RespondentRecord::from_json_value(row, position))
            .collect::<SimResult<Vec<_>>>()?;
        info!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }

    pub async fn save(&self, dataset: &PhaseDataset) -> SimResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(&dataset.records)?;
        fs::write(&self.path, content).await?;
        info!(
            "Saved {} records of wave '{}' to {}",
            dataset.len(),
            dataset.wave_label,
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CapabilityScores, SentimentScores};
    use chrono::{TimeZone, Utc};
    use tempfile::NamedTempFile;

    fn dataset() -> PhaseDataset {
        let records = (1..=3)
            .map(|i| {
                RespondentRecord::new(
                    format!("w-{:04}", i),
                    "w",
                    "acme",
                    Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
                    SentimentScores::uniform(1.5 + i as f64 * 0.25),
                    CapabilityScores::uniform(4.0),
                )
            })
            .collect();
        PhaseDataset {
            wave_label: "w".to_string(),
            applied_interventions: vec!["A1".to_string()],
            records,
        }
    }

    #[tokio::test]
    async fn test_save_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = DatasetStore::new(temp_file.path());

        let original = dataset();
        store.save(&original).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, original.records);
    }

    #[tokio::test]
    async fn test_attributes_survive_round_trip() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = DatasetStore::new(temp_file.path());

        let mut original = dataset();
        original.records[0] = original.records[0]
            .clone()
            .with_attribute("Department", "Finance")
            .with_attribute("Region", "EMEA");
        store.save(&original).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded[0].attributes["Department"], "Finance");
        assert_eq!(loaded[0].attributes["Region"], "EMEA");
        assert!(loaded[1].attributes.is_empty());
    }

    #[tokio::test]
    async fn test_flat_rows_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut row = serde_json::json!({
            "respondent_id": "b-1",
            "survey_wave": "baseline",
            "company_id": "acme",
            "assessment_date": "2024-11-01T00:00:00Z",
            "Department": "Finance",
        });
        let obj = row.as_object_mut().unwrap();
        for n in 1..=25 {
            obj.insert(format!("sentiment_{}", n), serde_json::json!(2.0));
        }
        for d in 1..=8 {
            for c in 1..=4 {
                obj.insert(format!("dim{}_construct{}", d, c), serde_json::json!(4.5));
            }
        }
        std::fs::write(temp_file.path(), serde_json::to_string(&vec![row]).unwrap()).unwrap();

        let loaded = DatasetStore::new(temp_file.path()).load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].attributes["Department"], "Finance");
        assert_eq!(loaded[0].capability.values()[31], 4.5);
    }

    #[tokio::test]
    async fn test_save_creates_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(temp_dir.path().join("out").join("phase2.json"));
        store.save(&dataset()).await.unwrap();
        assert_eq!(store.load().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_non_array_rejected() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), r#"{"respondent_id": "x"}"#).unwrap();
        let err = DatasetStore::new(temp_file.path()).load().await.unwrap_err();
        assert!(err.is_input());
    }

    #[tokio::test]
    async fn test_malformed_record_named() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), r#"[{"respondent_id": "bad-7", "sentiment": {}}]"#).unwrap();
        let err = DatasetStore::new(temp_file.path()).load().await.unwrap_err();
        assert!(matches!(err, SimulationError::MalformedRecord { ref record, .. } if record == "bad-7"));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = DatasetStore::new(temp_dir.path().join("nope.json")).load().await.unwrap_err();
        assert!(matches!(err, SimulationError::Io(_)));
    }
}
