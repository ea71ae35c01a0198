use std::collections::HashMap;

use anyhow::{anyhow, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{MacroGoals, MetricKind, RawSample};

/// Where a screen gets its samples and goals from. The app injects a
/// network- or health-store-backed implementation; tests and previews use
/// [`InMemorySource`].
pub trait SampleSource {
    fn fetch_samples(&self, kind: MetricKind) -> Result<Vec<RawSample>>;

    fn delete_sample(&mut self, kind: MetricKind, id: &str) -> Result<()>;

    fn fetch_goals(&self) -> Result<MacroGoals>;
}

/// Map-backed [`SampleSource`].
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    samples: HashMap<MetricKind, Vec<RawSample>>,
    goals: MacroGoals,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_samples(mut self, kind: MetricKind, samples: Vec<RawSample>) -> Self {
        self.samples.insert(kind, samples);
        self
    }

    pub fn with_goals(mut self, goals: MacroGoals) -> Self {
        self.goals = goals;
        self
    }
}

impl SampleSource for InMemorySource {
    fn fetch_samples(&self, kind: MetricKind) -> Result<Vec<RawSample>> {
        Ok(self.samples.get(&kind).cloned().unwrap_or_default())
    }

    fn delete_sample(&mut self, kind: MetricKind, id: &str) -> Result<()> {
        let samples = self
            .samples
            .get_mut(&kind)
            .ok_or_else(|| anyhow!("No {} samples stored", kind))?;
        let before = samples.len();
        samples.retain(|s| s.id != id);
        if samples.len() == before {
            return Err(anyhow!("No {} sample with id {}", kind, id));
        }
        debug!(%kind, id, "deleted sample");
        Ok(())
    }

    fn fetch_goals(&self) -> Result<MacroGoals> {
        Ok(self.goals.clone())
    }
}

/// Read a number the service may have sent as a JSON number or a numeric
/// string.
pub fn lenient_f64(v: &Value) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Decode a sample collection payload.
///
/// Accepts a bare array or an object with a `samples` array. Each record
/// needs an `id` (string or integer) and a `date` or `timestamp` string;
/// records missing either are skipped. Values are kept raw so
/// [`crate::series::parse_samples`] can apply its own dropping rules.
pub fn decode_samples(json: &str) -> Result<Vec<RawSample>> {
    let payload: Value = serde_json::from_str(json)?;
    let records = payload
        .as_array()
        .or_else(|| payload.get("samples").and_then(|v| v.as_array()))
        .ok_or_else(|| anyhow!("Sample payload is neither an array nor has a samples array"))?;

    let mut samples = Vec::with_capacity(records.len());
    for record in records {
        let id = record.get("id").and_then(|v| {
            v.as_str()
                .map(String::from)
                .or_else(|| v.as_i64().map(|n| n.to_string()))
        });
        let date = record
            .get("date")
            .or_else(|| record.get("timestamp"))
            .and_then(|v| v.as_str())
            .map(String::from);

        match (id, date) {
            (Some(id), Some(date)) => samples.push(RawSample {
                id,
                date,
                value: record.get("value").cloned().unwrap_or(Value::Null),
            }),
            _ => warn!(%record, "skipping sample record without id or date"),
        }
    }

    Ok(samples)
}

/// Decode a nutrition goal record.
///
/// Targets may sit at the top level or under `planner`. Each target is a
/// per-weekday list or a single value applying every day.
pub fn decode_goals(json: &str) -> Result<MacroGoals> {
    let payload: Value = serde_json::from_str(json)?;
    let planner = payload.get("planner").unwrap_or(&payload);
    if !planner.is_object() {
        return Err(anyhow!("Goal payload is not an object"));
    }

    let parse_vec = |key: &str| -> Vec<f64> {
        match planner.get(key) {
            Some(Value::Array(arr)) => arr.iter().filter_map(lenient_f64).collect(),
            Some(v) => lenient_f64(v).into_iter().collect(),
            None => Vec::new(),
        }
    };

    Ok(MacroGoals {
        calories: parse_vec("calories"),
        protein: parse_vec("protein"),
        carbs: parse_vec("carbs"),
        fat: parse_vec("fat"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lenient_numbers() {
        assert_eq!(lenient_f64(&json!(72.5)), Some(72.5));
        assert_eq!(lenient_f64(&json!(" 72.5 ")), Some(72.5));
        assert_eq!(lenient_f64(&json!(3)), Some(3.0));
        assert_eq!(lenient_f64(&json!("abc")), None);
        assert_eq!(lenient_f64(&Value::Null), None);
    }

    #[test]
    fn decodes_wrapped_and_bare_payloads() {
        let bare = r#"[{"id": 17, "date": "2024-03-10", "value": "72.1"}]"#;
        let samples = decode_samples(bare).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].id, "17");
        assert_eq!(samples[0].value, json!("72.1"));

        let wrapped = r#"{"samples": [
            {"id": "a", "timestamp": "2024-03-10T08:00:00Z", "value": 180},
            {"date": "2024-03-11", "value": 181},
            {"id": "c", "value": 182}
        ]}"#;
        let samples = decode_samples(wrapped).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].date, "2024-03-10T08:00:00Z");

        assert!(decode_samples(r#"{"rows": []}"#).is_err());
        assert!(decode_samples("not json").is_err());
    }

    #[test]
    fn decodes_goals_lists_and_scalars() {
        let goals = decode_goals(
            r#"{"planner": {"calories": ["2000", 2100], "protein": 160, "fat": [70]}}"#,
        )
        .unwrap();
        assert_eq!(goals.calories, vec![2000.0, 2100.0]);
        assert_eq!(goals.protein, vec![160.0]);
        assert!(goals.carbs.is_empty());
        assert_eq!(goals.fat, vec![70.0]);

        assert!(decode_goals("[1, 2]").is_err());
    }

    #[test]
    fn in_memory_delete_requires_known_id() {
        let mut source = InMemorySource::new().with_samples(
            MetricKind::Weight,
            vec![RawSample {
                id: "w1".into(),
                date: "2024-03-10".into(),
                value: json!(72.0),
            }],
        );

        assert!(source.delete_sample(MetricKind::Weight, "missing").is_err());
        assert!(source.delete_sample(MetricKind::Height, "w1").is_err());
        source.delete_sample(MetricKind::Weight, "w1").unwrap();
        assert!(source.fetch_samples(MetricKind::Weight).unwrap().is_empty());
    }
}
