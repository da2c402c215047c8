use crate::constants::{AVG_RENT, EMPLOYMENT_RATE, EMPLOYMENT_YOY_PCT, EMPLOYMENT_YOY_PP, RENT_YOY_PCT};
use crate::types::MergedTable;

/// Period-over-period percent change. The first entry is always `None`, as is
/// any entry whose current or previous value is missing or whose previous value is zero.
pub fn pct_change(values: &[Option<f64>]) -> Vec<Option<f64>> {
    pairwise(values, |prev, cur| {
        (prev != 0.0).then(|| (cur - prev) / prev * 100.0)
    })
}

/// Period-over-period difference, with the same null rules as [`pct_change`]
/// minus the zero check.
pub fn diff(values: &[Option<f64>]) -> Vec<Option<f64>> {
    pairwise(values, |prev, cur| Some(cur - prev))
}

fn pairwise<F>(values: &[Option<f64>], f: F) -> Vec<Option<f64>>
where
    F: Fn(f64, f64) -> Option<f64>,
{
    std::iter::once(None)
        .chain(values.windows(2).map(|w| match (w[0], w[1]) {
            (Some(prev), Some(cur)) => f(prev, cur).filter(|v| v.is_finite()),
            _ => None,
        }))
        .take(values.len())
        .collect()
}

/// Append the year-over-year columns for whichever source fields are present.
pub fn add_derived_metrics(table: &mut MergedTable) {
    if let Some(rent) = table.field(AVG_RENT) {
        table.push_field(RENT_YOY_PCT, pct_change(&rent));
    }
    if let Some(emp) = table.field(EMPLOYMENT_RATE) {
        table.push_field(EMPLOYMENT_YOY_PP, diff(&emp));
        table.push_field(EMPLOYMENT_YOY_PCT, pct_change(&emp));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MergedRow;

    fn assert_close(actual: &[Option<f64>], expected: &[Option<f64>]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            match (a, e) {
                (Some(a), Some(e)) => assert!((a - e).abs() < 1e-9, "{a} != {e}"),
                (None, None) => {}
                _ => panic!("{actual:?} != {expected:?}"),
            }
        }
    }

    #[test]
    fn test_pct_change_of_rent_series() {
        let out = pct_change(&[Some(1000.0), Some(1100.0), Some(990.0)]);
        assert_close(&out, &[None, Some(10.0), Some(-10.0)]);
    }

    #[test]
    fn test_pct_change_nulls_on_zero_or_missing_previous() {
        let out = pct_change(&[Some(0.0), Some(5.0), None, Some(7.0)]);
        assert_close(&out, &[None, None, None, None]);
    }

    #[test]
    fn test_diff_is_point_change() {
        let out = diff(&[Some(60.0), Some(61.5), None, Some(59.0)]);
        assert_close(&out, &[None, Some(1.5), None, None]);
    }

    #[test]
    fn test_empty_series() {
        assert!(pct_change(&[]).is_empty());
        assert_eq!(diff(&[Some(1.0)]), vec![None]);
    }

    #[test]
    fn test_rent_only_table_gets_rent_change_only() {
        let mut table = MergedTable {
            fields: vec![AVG_RENT.into()],
            rows: vec![
                MergedRow { year: 2019, values: vec![Some(1000.0)] },
                MergedRow { year: 2020, values: vec![Some(1100.0)] },
            ],
        };
        add_derived_metrics(&mut table);
        assert_eq!(table.fields, vec![AVG_RENT, RENT_YOY_PCT]);
    }

    #[test]
    fn test_employment_changes_are_appended_after_rent_change() {
        let mut table = MergedTable {
            fields: vec![AVG_RENT.into(), EMPLOYMENT_RATE.into()],
            rows: vec![
                MergedRow { year: 2019, values: vec![Some(1000.0), Some(60.0)] },
                MergedRow { year: 2020, values: vec![Some(1100.0), Some(63.0)] },
            ],
        };
        add_derived_metrics(&mut table);
        assert_eq!(
            table.fields,
            vec![AVG_RENT, EMPLOYMENT_RATE, RENT_YOY_PCT, EMPLOYMENT_YOY_PP, EMPLOYMENT_YOY_PCT]
        );
        assert_close(&table.field(EMPLOYMENT_YOY_PP).unwrap(), &[None, Some(3.0)]);
        assert_close(&table.field(EMPLOYMENT_YOY_PCT).unwrap(), &[None, Some(5.0)]);
    }
}
