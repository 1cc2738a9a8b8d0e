//! Merging of batched GA4 reports.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A metric column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricHeader {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub metric_type: Option<String>,
}

/// One row of dimension and metric values, flattened from the API's
/// `{"value": ...}` wrappers.
///
/// `dimensions` names the columns `dimension_values` belong to; batches split
/// by dimension each contribute rows with their own columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub dimensions: Vec<String>,
    pub dimension_values: Vec<String>,
    pub metric_values: Vec<String>,
}

/// Deduplicated union of several `runReport` responses for one property.
///
/// - Headers appear once each, in first-seen order.
/// - A dimension-value tuple appears in at most one row per set of dimension
///   names: the first one seen. `date=(not set)` and `country=(not set)` are
///   different rows.
/// - `totals`, `maximums` and `minimums` are per-batch aggregates and are
///   concatenated as-is.
/// - `row_count` is the sum over batches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergedMetricSet {
    pub dimension_headers: Vec<String>,
    pub metric_headers: Vec<MetricHeader>,
    pub rows: Vec<ReportRow>,
    pub totals: Vec<ReportRow>,
    pub maximums: Vec<ReportRow>,
    pub minimums: Vec<ReportRow>,
    pub row_count: u64,
}

/// `runReport` response body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    #[serde(default)]
    pub dimension_headers: Vec<NamedHeader>,
    #[serde(default)]
    pub metric_headers: Vec<MetricHeader>,
    #[serde(default)]
    pub rows: Vec<RawRow>,
    #[serde(default)]
    pub totals: Vec<RawRow>,
    #[serde(default)]
    pub maximums: Vec<RawRow>,
    #[serde(default)]
    pub minimums: Vec<RawRow>,
    #[serde(default)]
    pub row_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedHeader {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRow {
    #[serde(default)]
    pub dimension_values: Vec<RawValue>,
    #[serde(default)]
    pub metric_values: Vec<RawValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawValue {
    #[serde(default)]
    pub value: String,
}

impl ReportRow {
    fn from_raw(raw: RawRow, dimensions: &[String]) -> Self {
        Self {
            dimensions: dimensions.to_vec(),
            dimension_values: raw.dimension_values.into_iter().map(|v| v.value).collect(),
            metric_values: raw.metric_values.into_iter().map(|v| v.value).collect(),
        }
    }
}

/// Merges batch reports in the order given.
///
/// Callers collect every batch before merging; the result does not depend on
/// which request finished first, only on batch order.
pub fn merge_batches(batches: impl IntoIterator<Item = BatchReport>) -> MergedMetricSet {
    let mut merged = MergedMetricSet::default();
    let mut seen_dimensions = HashSet::new();
    let mut seen_metrics = HashSet::new();
    let mut seen_tuples: HashSet<(Vec<String>, Vec<String>)> = HashSet::new();

    for batch in batches {
        let names: Vec<String> = batch.dimension_headers.into_iter().map(|h| h.name).collect();
        for name in &names {
            if seen_dimensions.insert(name.clone()) {
                merged.dimension_headers.push(name.clone());
            }
        }
        for header in batch.metric_headers {
            if seen_metrics.insert(header.name.clone()) {
                merged.metric_headers.push(header);
            }
        }
        for row in batch.rows {
            let row = ReportRow::from_raw(row, &names);
            if seen_tuples.insert((row.dimensions.clone(), row.dimension_values.clone())) {
                merged.rows.push(row);
            }
        }
        let convert = |raw: RawRow| ReportRow::from_raw(raw, &names);
        merged.totals.extend(batch.totals.into_iter().map(convert));
        merged.maximums.extend(batch.maximums.into_iter().map(convert));
        merged.minimums.extend(batch.minimums.into_iter().map(convert));
        merged.row_count += batch.row_count;
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn header(name: &str) -> NamedHeader {
        NamedHeader {
            name: name.to_string(),
        }
    }

    fn metric(name: &str) -> MetricHeader {
        MetricHeader {
            name: name.to_string(),
            metric_type: Some("TYPE_INTEGER".to_string()),
        }
    }

    fn row(dimensions: &[&str], metrics: &[&str]) -> RawRow {
        RawRow {
            dimension_values: dimensions
                .iter()
                .map(|v| RawValue {
                    value: v.to_string(),
                })
                .collect(),
            metric_values: metrics
                .iter()
                .map(|v| RawValue {
                    value: v.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_merge_deduplicates_headers_in_first_seen_order() {
        let merged = merge_batches([
            BatchReport {
                dimension_headers: vec![header("date"), header("country")],
                metric_headers: vec![metric("sessions")],
                ..Default::default()
            },
            BatchReport {
                dimension_headers: vec![header("country"), header("deviceCategory")],
                metric_headers: vec![metric("activeUsers"), metric("sessions")],
                ..Default::default()
            },
        ]);
        assert_eq!(
            merged.dimension_headers,
            vec!["date", "country", "deviceCategory"]
        );
        let metric_names: Vec<_> = merged.metric_headers.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(metric_names, vec!["sessions", "activeUsers"]);
    }

    #[test]
    fn test_merge_keeps_first_row_for_duplicate_tuple() {
        let merged = merge_batches([
            BatchReport {
                rows: vec![row(&["20240101", "FR"], &["10"]), row(&["20240102", "FR"], &["3"])],
                row_count: 2,
                ..Default::default()
            },
            BatchReport {
                rows: vec![row(&["20240101", "FR"], &["99"]), row(&["FR", "20240101"], &["5"])],
                row_count: 2,
                ..Default::default()
            },
        ]);
        assert_eq!(merged.rows.len(), 3);
        assert_eq!(merged.rows[0].metric_values, vec!["10"]);
        // Tuple equality is order-sensitive
        assert_eq!(merged.rows[2].dimension_values, vec!["FR", "20240101"]);
        assert_eq!(merged.row_count, 4);
    }

    #[test]
    fn test_merge_keeps_rows_from_batches_split_by_dimension() {
        let merged = merge_batches([
            BatchReport {
                dimension_headers: vec![header("date")],
                rows: vec![row(&["(not set)"], &["4"])],
                row_count: 1,
                ..Default::default()
            },
            BatchReport {
                dimension_headers: vec![header("country")],
                rows: vec![row(&["(not set)"], &["7"])],
                row_count: 1,
                ..Default::default()
            },
            BatchReport {
                dimension_headers: vec![header("sessionSource"), header("sessionMedium")],
                rows: vec![row(&["google", "organic"], &["2"])],
                row_count: 1,
                ..Default::default()
            },
        ]);
        assert_eq!(merged.rows.len(), 3);
        assert_eq!(merged.row_count, 3);
        assert_eq!(merged.rows[0].dimensions, vec!["date"]);
        assert_eq!(merged.rows[1].dimensions, vec!["country"]);
        assert_eq!(merged.rows[1].metric_values, vec!["7"]);
        assert_eq!(merged.rows[2].dimensions, vec!["sessionSource", "sessionMedium"]);
    }

    #[test]
    fn test_merge_concatenates_aggregates() {
        let merged = merge_batches([
            BatchReport {
                totals: vec![row(&["RESERVED_TOTAL"], &["13"])],
                maximums: vec![row(&["RESERVED_MAX"], &["10"])],
                ..Default::default()
            },
            BatchReport {
                totals: vec![row(&["RESERVED_TOTAL"], &["13"])],
                minimums: vec![row(&["RESERVED_MIN"], &["1"])],
                ..Default::default()
            },
        ]);
        assert_eq!(merged.totals.len(), 2);
        assert_eq!(merged.maximums.len(), 1);
        assert_eq!(merged.minimums.len(), 1);
    }

    #[test]
    fn test_merge_of_nothing_is_empty() {
        assert_eq!(merge_batches(Vec::new()), MergedMetricSet::default());
    }

    #[test]
    fn test_batch_report_deserializes_run_report_response() {
        let report: BatchReport = serde_json::from_str(
            r#"{
                "dimensionHeaders": [{"name": "date"}],
                "metricHeaders": [{"name": "sessions", "type": "TYPE_INTEGER"}],
                "rows": [{"dimensionValues": [{"value": "20240101"}], "metricValues": [{"value": "12"}]}],
                "totals": [{"dimensionValues": [{"value": "RESERVED_TOTAL"}], "metricValues": [{"value": "12"}]}],
                "rowCount": 1,
                "metadata": {"currencyCode": "USD", "timeZone": "Europe/Paris"},
                "kind": "analyticsData#runReport"
            }"#,
        )
        .unwrap();
        let merged = merge_batches([report]);
        assert_eq!(merged.rows[0].dimension_values, vec!["20240101"]);
        assert_eq!(merged.metric_headers[0].metric_type.as_deref(), Some("TYPE_INTEGER"));
        assert_eq!(merged.row_count, 1);
    }

    proptest! {
        #[test]
        fn test_merged_headers_unique_and_first_seen(
            batches in prop::collection::vec(prop::collection::vec("[a-e]", 0..6), 0..6)
        ) {
            let reports = batches.iter().map(|names| BatchReport {
                dimension_headers: names.iter().map(|n| header(n)).collect(),
                ..Default::default()
            });
            let merged = merge_batches(reports);

            let mut expected: Vec<String> = Vec::new();
            for name in batches.iter().flatten() {
                if !expected.contains(name) {
                    expected.push(name.clone());
                }
            }
            prop_assert_eq!(merged.dimension_headers, expected);
        }

        #[test]
        fn test_merged_rows_have_unique_tuples(
            batches in prop::collection::vec(
                prop::collection::vec((prop::collection::vec("[xy]", 1..3), "[0-9]{1,3}"), 0..8),
                1..5,
            )
        ) {
            let reports = batches.iter().map(|rows| BatchReport {
                rows: rows
                    .iter()
                    .map(|(dims, value)| {
                        let dims: Vec<&str> = dims.iter().map(String::as_str).collect();
                        row(&dims, &[value.as_str()])
                    })
                    .collect(),
                ..Default::default()
            });
            let merged = merge_batches(reports);

            let tuples: HashSet<_> = merged.rows.iter().map(|r| r.dimension_values.clone()).collect();
            prop_assert_eq!(tuples.len(), merged.rows.len());

            // The kept row for each tuple is the first one encountered
            for kept in &merged.rows {
                let first = batches
                    .iter()
                    .flatten()
                    .find(|(dims, _)| *dims == kept.dimension_values)
                    .map(|(_, value)| value.clone());
                prop_assert_eq!(Some(kept.metric_values[0].clone()), first);
            }
        }
    }
}
