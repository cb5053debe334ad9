//! Respondent Records
//!
//! One row per survey participant for one phase. Scores are held in fixed
//! arrays indexed by unit and serialised as maps keyed by unit id. Any other
//! top-level column (region, department, ...) rides along as an attribute.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::units::{ConstructId, SentimentCell, CONSTRUCT_COUNT, SENTIMENT_CELL_COUNT};
use crate::error::SimulationError;

/// The 25 sentiment cell scores of one respondent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct SentimentScores([f64; SENTIMENT_CELL_COUNT]);

impl SentimentScores {
    pub fn new(values: [f64; SENTIMENT_CELL_COUNT]) -> Self {
        Self(values)
    }

    pub fn uniform(value: f64) -> Self {
        Self([value; SENTIMENT_CELL_COUNT])
    }

    pub fn get(&self, cell: SentimentCell) -> f64 {
        self.0[cell.index()]
    }

    pub fn set(&mut self, cell: SentimentCell, value: f64) {
        self.0[cell.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (SentimentCell, f64)> + '_ {
        SentimentCell::all().map(move |cell| (cell, self.get(cell)))
    }

    pub fn values(&self) -> &[f64; SENTIMENT_CELL_COUNT] {
        &self.0
    }
}

impl TryFrom<BTreeMap<String, f64>> for SentimentScores {
    type Error = SimulationError;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut values = [f64::NAN; SENTIMENT_CELL_COUNT];
        let mut seen = [false; SENTIMENT_CELL_COUNT];
        for (key, value) in map {
            let cell = SentimentCell::parse(&key)?;
            if seen[cell.index()] {
                return Err(SimulationError::invalid_input(format!("duplicate score for sentiment cell {}", cell)));
            }
            if !value.is_finite() {
                return Err(SimulationError::invalid_input(format!("non-finite score for sentiment cell {}", cell)));
            }
            seen[cell.index()] = true;
            values[cell.index()] = value;
        }
        if let Some(missing) = seen.iter().position(|s| !s) {
            let cell = SentimentCell::from_index(missing).map(|c| c.to_string()).unwrap_or_default();
            return Err(SimulationError::invalid_input(format!("missing score for sentiment cell {}", cell)));
        }
        Ok(Self(values))
    }
}

impl From<SentimentScores> for BTreeMap<String, f64> {
    fn from(scores: SentimentScores) -> Self {
        scores.iter().map(|(cell, v)| (cell.to_string(), v)).collect()
    }
}

/// The 32 capability construct scores of one respondent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct CapabilityScores([f64; CONSTRUCT_COUNT]);

impl CapabilityScores {
    pub fn new(values: [f64; CONSTRUCT_COUNT]) -> Self {
        Self(values)
    }

    pub fn uniform(value: f64) -> Self {
        Self([value; CONSTRUCT_COUNT])
    }

    pub fn get(&self, construct: ConstructId) -> f64 {
        self.0[construct.index()]
    }

    pub fn set(&mut self, construct: ConstructId, value: f64) {
        self.0[construct.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConstructId, f64)> + '_ {
        ConstructId::all().map(move |c| (c, self.get(c)))
    }

    pub fn values(&self) -> &[f64; CONSTRUCT_COUNT] {
        &self.0
    }
}

impl TryFrom<BTreeMap<String, f64>> for CapabilityScores {
    type Error = SimulationError;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut values = [f64::NAN; CONSTRUCT_COUNT];
        let mut seen = [false; CONSTRUCT_COUNT];
        for (key, value) in map {
            let construct = ConstructId::parse(&key)?;
            if seen[construct.index()] {
                return Err(SimulationError::invalid_input(format!("duplicate score for construct {}", construct)));
            }
            if !value.is_finite() {
                return Err(SimulationError::invalid_input(format!("non-finite score for construct {}", construct)));
            }
            seen[construct.index()] = true;
            values[construct.index()] = value;
        }
        if let Some(missing) = seen.iter().position(|s| !s) {
            let construct = ConstructId::from_index(missing).map(|c| c.to_string()).unwrap_or_default();
            return Err(SimulationError::invalid_input(format!("missing score for construct {}", construct)));
        }
        Ok(Self(values))
    }
}

impl From<CapabilityScores> for BTreeMap<String, f64> {
    fn from(scores: CapabilityScores) -> Self {
        scores.iter().map(|(c, v)| (c.to_string(), v)).collect()
    }
}

/// One survey participant in one phase. Never mutated once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RespondentRecord {
    /// Unique within its wave
    pub respondent_id: String,
    pub survey_wave: String,
    pub company_id: String,
    pub assessment_date: DateTime<Utc>,
    pub sentiment: SentimentScores,
    pub capability: CapabilityScores,
    /// Non-score columns, carried unchanged into later phases
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl RespondentRecord {
    pub fn new(
        respondent_id: impl Into<String>,
        survey_wave: impl Into<String>,
        company_id: impl Into<String>,
        assessment_date: DateTime<Utc>,
        sentiment: SentimentScores,
        capability: CapabilityScores,
    ) -> Self {
        Self {
            respondent_id: respondent_id.into(),
            survey_wave: survey_wave.into(),
            company_id: company_id.into(),
            assessment_date,
            sentiment,
            capability,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Parse one record from JSON, mapping shape problems to a malformed-record error.
    /// Rows with score columns at top level (`sentiment_4`, `dim4_construct2`) are accepted.
    pub fn from_json_value(mut value: Value, position: usize) -> Result<Self, SimulationError> {
        let label = value
            .get("respondent_id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", position + 1));
        if let Value::Object(row) = &mut value {
            nest_flat_columns(row);
        }
        serde_json::from_value(value).map_err(|e| SimulationError::malformed(label, e.to_string()))
    }
}

/// Move top-level score columns into `sentiment` / `capability` maps, unless
/// the row already has the nested form
fn nest_flat_columns(row: &mut Map<String, Value>) {
    let nest_sentiment = !row.contains_key("sentiment");
    let nest_capability = !row.contains_key("capability");
    if !nest_sentiment && !nest_capability {
        return;
    }

    let mut sentiment = Map::new();
    let mut capability = Map::new();
    let keys: Vec<String> = row.keys().cloned().collect();
    for key in keys {
        let target = if nest_sentiment && SentimentCell::parse(&key).is_ok() {
            &mut sentiment
        } else if nest_capability && ConstructId::parse(&key).is_ok() {
            &mut capability
        } else {
            continue;
        };
        if let Some(v) = row.remove(&key) {
            target.insert(key, v);
        }
    }

    if !sentiment.is_empty() {
        row.insert("sentiment".to_string(), Value::Object(sentiment));
    }
    if !capability.is_empty() {
        row.insert("capability".to_string(), Value::Object(capability));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> RespondentRecord {
        RespondentRecord::new(
            "baseline-0001",
            "baseline",
            "acme",
            Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap(),
            SentimentScores::uniform(2.0),
            CapabilityScores::uniform(4.0),
        )
    }

    #[test]
    fn test_record_json_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["respondent_id"], "baseline-0001");
        assert_eq!(value["sentiment"]["L1_C4"], 2.0);
        assert_eq!(value["capability"]["dim8_construct4"], 4.0);
        assert_eq!(value["sentiment"].as_object().unwrap().len(), 25);
        assert_eq!(value["capability"].as_object().unwrap().len(), 32);

        let back = RespondentRecord::from_json_value(value, 0).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_legacy_sentiment_columns_accepted() {
        let mut value = serde_json::to_value(sample()).unwrap();
        let sentiment = value["sentiment"].as_object_mut().unwrap();
        let v = sentiment.remove("L1_C4").unwrap();
        sentiment.insert("sentiment_4".to_string(), v);

        let record = RespondentRecord::from_json_value(value, 0).unwrap();
        assert_eq!(record.sentiment.get(SentimentCell::new(1, 4).unwrap()), 2.0);
    }

    #[test]
    fn test_missing_cell_is_malformed() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["sentiment"].as_object_mut().unwrap().remove("L3_C2");

        let err = RespondentRecord::from_json_value(value, 0).unwrap_err();
        assert!(err.is_input());
        assert!(err.to_string().contains("baseline-0001"));
        assert!(err.to_string().contains("L3_C2"));
    }

    #[test]
    fn test_unknown_construct_is_malformed() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["capability"]
            .as_object_mut()
            .unwrap()
            .insert("dim9_construct1".to_string(), serde_json::json!(3.0));

        assert!(RespondentRecord::from_json_value(value, 4).is_err());
    }

    #[test]
    fn test_duplicate_construct_spelling_is_malformed() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["capability"]
            .as_object_mut()
            .unwrap()
            .insert("dim01_construct1".to_string(), serde_json::json!(3.0));

        let err = RespondentRecord::from_json_value(value, 0).unwrap_err();
        assert!(err.to_string().contains("duplicate score for construct dim1_construct1"));
    }

    #[test]
    fn test_extra_columns_kept_as_attributes() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["Department"] = serde_json::json!("Finance");
        value["Age"] = serde_json::json!(41);

        let record = RespondentRecord::from_json_value(value, 0).unwrap();
        assert_eq!(record.attributes["Department"], "Finance");
        assert_eq!(record.attributes["Age"], 41);

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["Department"], "Finance");
        assert!(back.get("attributes").is_none());
    }

    #[test]
    fn test_flat_row_layout_accepted() {
        let mut row = serde_json::json!({
            "respondent_id": "b-1",
            "survey_wave": "baseline",
            "company_id": "acme",
            "assessment_date": "2024-11-01T00:00:00.000Z",
            "Region": "EMEA",
        });
        let obj = row.as_object_mut().unwrap();
        for n in 1..=25 {
            obj.insert(format!("sentiment_{}", n), serde_json::json!(2.5));
        }
        for construct in ConstructId::all() {
            obj.insert(construct.to_string(), serde_json::json!(5));
        }

        let record = RespondentRecord::from_json_value(row, 0).unwrap();
        assert_eq!(record.sentiment.get(SentimentCell::new(5, 5).unwrap()), 2.5);
        assert_eq!(record.capability.get(ConstructId::parse("dim4_construct2").unwrap()), 5.0);
        assert_eq!(record.attributes.len(), 1);
        assert_eq!(record.attributes["Region"], "EMEA");
    }

    #[test]
    fn test_flat_row_missing_column_is_malformed() {
        let mut value = serde_json::to_value(sample()).unwrap();
        let obj = value.as_object_mut().unwrap();
        let sentiment = obj.remove("sentiment").unwrap();
        for (k, v) in sentiment.as_object().unwrap() {
            if k != "L2_C2" {
                obj.insert(k.clone(), v.clone());
            }
        }

        let err = RespondentRecord::from_json_value(value, 0).unwrap_err();
        assert!(err.to_string().contains("L2_C2"));
    }
}
