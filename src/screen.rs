use std::collections::{HashMap, HashSet};

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone, Utc};
use tracing::{debug, info};

use crate::config::Config;
use crate::models::{BucketedSeries, MetricKind, RawSample, TimeSeriesSample};
use crate::series::{bucket_series_at, parse_samples, SeriesSummary, Timeframe};
use crate::source::SampleSource;
use crate::swipe::{
    SwipeAction, SwipeConfig, SwipeEvent, SwipePermissions, SwipeRow, SwipeState,
};

/// State behind a body-metric screen: the fetched samples of one metric,
/// the selected timeframe and each log row's swipe state.
///
/// Charts and summaries are computed from the current samples on every
/// call, so deleting a sample is reflected the next time they are read.
#[derive(Debug, Clone)]
pub struct MetricScreen {
    kind: MetricKind,
    timeframe: Timeframe,
    samples: Vec<TimeSeriesSample>,
    rows: HashMap<String, SwipeRow>,
    saved: HashSet<String>,
    swipe: SwipeConfig,
    permissions: SwipePermissions,
}

impl MetricScreen {
    pub fn new(kind: MetricKind, config: &Config) -> Self {
        Self {
            kind,
            timeframe: config.default_timeframe,
            samples: Vec::new(),
            rows: HashMap::new(),
            saved: HashSet::new(),
            swipe: config.swipe,
            permissions: SwipePermissions::delete_only(),
        }
    }

    /// Offer `permissions` on every row. Rows are rebuilt.
    pub fn with_permissions(mut self, permissions: SwipePermissions) -> Self {
        self.permissions = permissions;
        self.rebuild_rows();
        self
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn set_timeframe(&mut self, timeframe: Timeframe) {
        self.timeframe = timeframe;
    }

    /// Replace the samples with a freshly fetched collection.
    pub fn load(&mut self, raw: &[RawSample]) {
        self.samples = parse_samples(raw);
        self.rebuild_rows();
        debug!(
            kind = %self.kind,
            received = raw.len(),
            kept = self.samples.len(),
            "loaded samples"
        );
    }

    pub fn refresh(&mut self, source: &impl SampleSource) -> Result<()> {
        let raw = source.fetch_samples(self.kind)?;
        self.load(&raw);
        Ok(())
    }

    pub fn samples(&self) -> &[TimeSeriesSample] {
        &self.samples
    }

    /// All samples, newest first, as the log list shows them.
    pub fn rows(&self) -> Vec<&TimeSeriesSample> {
        let mut rows: Vec<&TimeSeriesSample> = self.samples.iter().collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        rows
    }

    pub fn chart(&self) -> BucketedSeries {
        self.chart_at(Utc::now(), &Local)
    }

    pub fn chart_at<Tz: TimeZone>(&self, now: DateTime<Utc>, tz: &Tz) -> BucketedSeries {
        bucket_series_at(&self.samples, self.timeframe, now, tz)
    }

    pub fn summary(&self) -> Option<SeriesSummary> {
        self.summary_at(Utc::now())
    }

    pub fn summary_at(&self, now: DateTime<Utc>) -> Option<SeriesSummary> {
        SeriesSummary::for_timeframe(&self.samples, self.timeframe, now)
    }

    pub fn row_state(&self, id: &str) -> Option<SwipeState> {
        self.rows.get(id).map(SwipeRow::state)
    }

    pub fn row_offset(&self, id: &str) -> Option<f64> {
        self.rows.get(id).map(SwipeRow::offset)
    }

    pub fn is_saved(&self, id: &str) -> bool {
        self.saved.contains(id)
    }

    /// Feed a gesture event to the row `id`.
    ///
    /// A committed `Save` toggles the row's saved flag here. A committed
    /// `Delete` is returned for the caller to carry out with
    /// [`MetricScreen::delete_with`] or [`MetricScreen::delete_sample`].
    /// Opening one row closes any other open row.
    pub fn handle_swipe(&mut self, id: &str, event: SwipeEvent) -> Option<SwipeAction> {
        let row = self.rows.get_mut(id)?;
        let action = row.update(event);
        let opened = row.is_revealed();

        if opened {
            for (other_id, other) in self.rows.iter_mut() {
                if other_id != id && other.is_revealed() {
                    other.update(SwipeEvent::Dismiss);
                }
            }
        }

        if action == Some(SwipeAction::Save) && !self.saved.remove(id) {
            self.saved.insert(id.to_string());
        }
        action
    }

    /// Drop a sample from memory. Returns false for an unknown id.
    pub fn delete_sample(&mut self, id: &str) -> bool {
        let before = self.samples.len();
        self.samples.retain(|s| s.id != id);
        self.rows.remove(id);
        self.saved.remove(id);
        self.samples.len() != before
    }

    /// Delete through `source`, then locally. Nothing changes locally if
    /// the source refuses.
    pub fn delete_with(&mut self, source: &mut impl SampleSource, id: &str) -> Result<()> {
        source.delete_sample(self.kind, id)?;
        self.delete_sample(id);
        info!(kind = %self.kind, id, "sample deleted");
        Ok(())
    }

    fn rebuild_rows(&mut self) {
        self.rows = self
            .samples
            .iter()
            .map(|s| (s.id.clone(), SwipeRow::new(self.permissions, self.swipe)))
            .collect();
        self.saved.retain(|id| self.rows.contains_key(id));
    }
}
