//! Query construction for device telemetry reads

use chrono::{DateTime, FixedOffset, SecondsFormat};
use tracing::debug;
use url::Url;

/// Builder for the `GET /telemetry/devices/{id}` query string.
///
/// Parameters are appended only when present:
/// - `metric` when set and non-empty
/// - `from` / `to` when the bound was given as a valid RFC 3339 timestamp.
///   A bound that does not parse is dropped silently; the read then simply
///   runs unbounded on that side. Callers rely on this, so it must not be
///   turned into an error.
/// - `aggregation` always; defaulting it is the caller's job
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryQuery {
    metric: Option<String>,
    from: Option<DateTime<FixedOffset>>,
    to: Option<DateTime<FixedOffset>>,
    aggregation: String,
}

impl TelemetryQuery {
    pub fn new(aggregation: impl Into<String>) -> Self {
        Self {
            metric: None,
            from: None,
            to: None,
            aggregation: aggregation.into(),
        }
    }

    /// Restrict to one metric; `None` or `""` leaves the query unfiltered
    pub fn metric(mut self, metric: Option<&str>) -> Self {
        self.metric = metric.filter(|m| !m.is_empty()).map(str::to_owned);
        self
    }

    /// Lower bound from an already parsed timestamp
    pub fn from_time(mut self, from: DateTime<FixedOffset>) -> Self {
        self.from = Some(from);
        self
    }

    /// Upper bound from an already parsed timestamp
    pub fn to_time(mut self, to: DateTime<FixedOffset>) -> Self {
        self.to = Some(to);
        self
    }

    /// Lower bound from raw caller input; omitted when it does not parse
    pub fn from_rfc3339(mut self, raw: Option<&str>) -> Self {
        self.from = parse_bound("from", raw);
        self
    }

    /// Upper bound from raw caller input; omitted when it does not parse
    pub fn to_rfc3339(mut self, raw: Option<&str>) -> Self {
        self.to = parse_bound("to", raw);
        self
    }

    pub fn aggregation(&self) -> &str {
        &self.aggregation
    }

    /// Query parameters in the order they are sent
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(4);
        if let Some(metric) = &self.metric {
            pairs.push(("metric", metric.clone()));
        }
        if let Some(from) = &self.from {
            pairs.push(("from", format_bound(from)));
        }
        if let Some(to) = &self.to {
            pairs.push(("to", format_bound(to)));
        }
        pairs.push(("aggregation", self.aggregation.clone()));
        pairs
    }

    /// Append the query parameters to `url`
    pub fn apply(&self, url: &mut Url) {
        let mut query = url.query_pairs_mut();
        for (key, value) in self.pairs() {
            query.append_pair(key, &value);
        }
    }
}

fn parse_bound(name: &'static str, raw: Option<&str>) -> Option<DateTime<FixedOffset>> {
    let raw = raw.filter(|r| !r.is_empty())?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts),
        Err(e) => {
            debug!(bound = name, value = raw, error = %e, "Dropping unparsable time bound");
            None
        }
    }
}

fn format_bound(ts: &DateTime<FixedOffset>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url_with(query: &TelemetryQuery) -> Url {
        let mut url = Url::parse("http://telemetry.local/telemetry/devices/5").unwrap();
        query.apply(&mut url);
        url
    }

    #[test]
    fn test_aggregation_always_present() {
        let url = url_with(&TelemetryQuery::new("raw"));
        assert_eq!(url.query(), Some("aggregation=raw"));
    }

    #[test]
    fn test_all_parameters() {
        let query = TelemetryQuery::new("hourly")
            .metric(Some("temperature"))
            .from_rfc3339(Some("2024-05-01T00:00:00Z"))
            .to_rfc3339(Some("2024-05-02T00:00:00Z"));
        assert_eq!(
            url_with(&query).query(),
            Some(
                "metric=temperature&from=2024-05-01T00%3A00%3A00Z\
                 &to=2024-05-02T00%3A00%3A00Z&aggregation=hourly"
            )
        );
    }

    #[test]
    fn test_unparsable_bound_is_omitted() {
        let query = TelemetryQuery::new("raw")
            .from_rfc3339(Some("not-a-timestamp"))
            .to_rfc3339(Some("2024-05-02T00:00:00Z"));
        let keys: Vec<_> = query.pairs().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["to", "aggregation"]);
    }

    #[test]
    fn test_empty_metric_is_omitted() {
        let query = TelemetryQuery::new("raw").metric(Some(""));
        assert_eq!(query.pairs(), vec![("aggregation", "raw".to_string())]);
    }

    #[test]
    fn test_offset_is_preserved_and_encoded() {
        let query = TelemetryQuery::new("raw").from_rfc3339(Some("2024-05-01T08:30:00.250+02:00"));
        assert_eq!(
            query.pairs()[0],
            ("from", "2024-05-01T08:30:00+02:00".to_string())
        );
        assert!(url_with(&query)
            .query()
            .unwrap()
            .starts_with("from=2024-05-01T08%3A30%3A00%2B02%3A00"));
    }

    #[test]
    fn test_typed_bounds() {
        let from = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
        let query = TelemetryQuery::new("daily").from_time(from).to_time(from);
        assert_eq!(query.pairs().len(), 3);
        assert_eq!(query.aggregation(), "daily");
    }
}
