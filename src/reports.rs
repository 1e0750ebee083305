use crate::classifier::Partition;
use crate::types::{
    AggregationRow, AssetRecord, Category, CategorySummary, ComparisonPoint, FormattedRow, Metric,
    RowKey,
};
use crate::util::{format_int, format_number};
use std::collections::BTreeMap;

impl AggregationRow {
    fn empty(key: RowKey) -> Self {
        AggregationRow {
            key,
            count: 0,
            sum_acquisition: 0.0,
            sum_amortization: 0.0,
            sum_book_value: 0.0,
            sum_quantity: 0.0,
        }
    }
}

/// One row per activation year, ascending. Null amounts add nothing but the
/// record is still counted.
pub fn aggregate_by_year(records: &[AssetRecord]) -> Vec<AggregationRow> {
    let mut map: BTreeMap<i32, AggregationRow> = BTreeMap::new();
    for r in records {
        let e = map
            .entry(r.year)
            .or_insert_with(|| AggregationRow::empty(RowKey::Year(r.year)));
        e.count += 1;
        e.sum_acquisition += r.acquisition.unwrap_or(0.0);
        e.sum_amortization += r.amortization.unwrap_or(0.0);
        e.sum_book_value += r.book_value.unwrap_or(0.0);
        e.sum_quantity += r.quantity.unwrap_or(0.0);
    }
    map.into_values().collect()
}

/// Year rows followed by their TOTAL, summed from the year rows themselves.
pub fn append_total(mut rows: Vec<AggregationRow>) -> Vec<AggregationRow> {
    let total = rows
        .iter()
        .fold(AggregationRow::empty(RowKey::Total), |mut acc, r| {
            acc.count += r.count;
            acc.sum_acquisition += r.sum_acquisition;
            acc.sum_amortization += r.sum_amortization;
            acc.sum_book_value += r.sum_book_value;
            acc.sum_quantity += r.sum_quantity;
            acc
        });
    rows.push(total);
    rows
}

/// Summary of one category's records, or `None` when there are none.
pub fn summarize(records: &[AssetRecord], category: Category) -> Option<CategorySummary> {
    if records.is_empty() {
        return None;
    }
    Some(CategorySummary {
        category,
        rows: append_total(aggregate_by_year(records)),
    })
}

/// Summaries of every non-empty category, in presentation order.
pub fn summarize_all(partition: &Partition) -> Vec<CategorySummary> {
    Category::ALL
        .iter()
        .filter_map(|&c| summarize(partition.records(c), c))
        .collect()
}

pub fn format_row(row: &AggregationRow) -> FormattedRow {
    let (year, is_total) = match row.key {
        RowKey::Year(y) => (y.to_string(), false),
        RowKey::Total => ("TOTAL".to_string(), true),
    };
    FormattedRow {
        year,
        count: format_int(row.count),
        acquisition: format_number(row.sum_acquisition, 2),
        amortization: format_number(row.sum_amortization, 2),
        book_value: format_number(row.sum_book_value, 2),
        is_total,
    }
}

pub fn format_summary(summary: &CategorySummary) -> Vec<FormattedRow> {
    summary.rows.iter().map(format_row).collect()
}

/// Year rows of every summary as `(category, year, value)` points.
pub fn build_comparison(summaries: &[CategorySummary], metric: Metric) -> Vec<ComparisonPoint> {
    summaries
        .iter()
        .flat_map(|s| {
            s.year_rows().filter_map(move |r| match r.key {
                RowKey::Year(year) => Some(ComparisonPoint {
                    category: s.category,
                    year,
                    value: metric.of(r),
                }),
                RowKey::Total => None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{partition, Classifier, UnrecognizedPolicy};

    fn rec(label: &str, year: i32, acq: Option<f64>) -> AssetRecord {
        AssetRecord {
            asset_id: None,
            label: if label.is_empty() { None } else { Some(label.to_string()) },
            year,
            acquisition: acq,
            amortization: acq.map(|v| v / 10.0),
            book_value: acq.map(|v| v - v / 10.0),
            quantity: Some(1.0),
        }
    }

    fn summaries_for(records: Vec<AssetRecord>) -> Vec<CategorySummary> {
        let p = partition(records, &Classifier::default(), UnrecognizedPolicy::Separate).unwrap();
        summarize_all(&p)
    }

    #[test]
    fn groups_by_year_ascending() {
        let rows = aggregate_by_year(&[
            rec("x", 2021, Some(1.0)),
            rec("x", 2019, Some(2.0)),
            rec("x", 2021, Some(3.0)),
        ]);
        let keys: Vec<RowKey> = rows.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![RowKey::Year(2019), RowKey::Year(2021)]);
        assert_eq!(rows[1].count, 2);
        assert_eq!(rows[1].sum_acquisition, 4.0);
    }

    #[test]
    fn null_amounts_still_count() {
        let rows = aggregate_by_year(&[rec("x", 2020, None), rec("x", 2020, Some(5.0))]);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].sum_acquisition, 5.0);
        assert_eq!(rows[0].sum_amortization, 0.5);
    }

    #[test]
    fn total_matches_year_rows() {
        let records: Vec<AssetRecord> = (0..40)
            .map(|i| rec("LED ALTA INTENSIDAD", 2010 + (i % 7), Some(0.1 * i as f64 + 1000.0)))
            .collect();
        let s = summarize(&records, Category::HighIntensity).unwrap();
        let total = s.total().unwrap();
        let years: Vec<&AggregationRow> = s.year_rows().collect();
        assert_eq!(total.count, years.iter().map(|r| r.count).sum::<usize>());
        assert_eq!(total.count, records.len());
        let sum_acq: f64 = years.iter().map(|r| r.sum_acquisition).sum();
        let sum_amo: f64 = years.iter().map(|r| r.sum_amortization).sum();
        let sum_book: f64 = years.iter().map(|r| r.sum_book_value).sum();
        assert!((total.sum_acquisition - sum_acq).abs() < 1e-6);
        assert!((total.sum_amortization - sum_amo).abs() < 1e-6);
        assert!((total.sum_book_value - sum_book).abs() < 1e-6);
        assert_eq!(s.rows.last().map(|r| r.key), Some(RowKey::Total));
    }

    #[test]
    fn empty_category_is_omitted() {
        assert!(summarize(&[], Category::LowIntensity).is_none());
        let out = summaries_for(vec![rec("LED ALTA INTENSIDAD", 2020, Some(1.0))]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category, Category::HighIntensity);
    }

    #[test]
    fn high_intensity_and_blank_scenario() {
        let out = summaries_for(vec![
            rec("High-Intensity LED", 2020, Some(1000.0)),
            rec("High-Intensity LED", 2020, Some(500.0)),
            rec("", 2021, Some(300.0)),
        ]);
        assert_eq!(out.len(), 2);
        let high = &out[0];
        assert_eq!(high.category, Category::HighIntensity);
        assert_eq!(high.rows.len(), 2);
        let fmt = format_summary(high);
        assert_eq!(fmt[0].year, "2020");
        assert_eq!(fmt[0].count, "2");
        assert_eq!(fmt[0].acquisition, "1,500.00");
        assert_eq!(fmt[1].year, "TOTAL");
        assert_eq!(fmt[1].count, "2");
        assert_eq!(fmt[1].acquisition, "1,500.00");
        assert!(fmt[1].is_total && !fmt[0].is_total);

        let blank = &out[1];
        assert_eq!(blank.category, Category::Uncategorized);
        let fmt = format_summary(blank);
        assert_eq!(fmt[0].year, "2021");
        assert_eq!(fmt[0].acquisition, "300.00");
        assert_eq!(
            (fmt[1].count.as_str(), fmt[1].acquisition.as_str()),
            (fmt[0].count.as_str(), fmt[0].acquisition.as_str())
        );
    }

    #[test]
    fn spanish_labels_summarize_the_same_way() {
        let out = summaries_for(vec![
            rec("LED ALTA INTENSIDAD", 2020, Some(1000.0)),
            rec("led alta intensidad", 2020, Some(500.0)),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category, Category::HighIntensity);
        assert_eq!(out[0].total().map(|t| (t.count, t.sum_acquisition)), Some((2, 1500.0)));
    }

    #[test]
    fn formatting_leaves_numbers_untouched() {
        let s = summarize(&[rec("x", 2020, Some(1234567.891))], Category::Unrecognized).unwrap();
        let before = s.clone();
        let fmt = format_summary(&s);
        assert_eq!(fmt[0].acquisition, "1,234,567.89");
        assert_eq!(s, before);
        assert_eq!(s.rows[0].sum_acquisition, 1234567.891);
    }

    #[test]
    fn comparison_skips_totals_and_tags_categories() {
        let out = summaries_for(vec![
            rec("LED ALTA INTENSIDAD", 2020, Some(10.0)),
            rec("LED ALTA INTENSIDAD", 2021, Some(20.0)),
            rec("LED BAJA INTENSIDAD", 2020, Some(5.0)),
        ]);
        let points = build_comparison(&out, Metric::Acquisition);
        assert_eq!(
            points,
            vec![
                ComparisonPoint { category: Category::HighIntensity, year: 2020, value: 10.0 },
                ComparisonPoint { category: Category::HighIntensity, year: 2021, value: 20.0 },
                ComparisonPoint { category: Category::LowIntensity, year: 2020, value: 5.0 },
            ]
        );
        let counts = build_comparison(&out, Metric::Count);
        assert!(counts.iter().all(|p| p.value == 1.0));
    }
}
