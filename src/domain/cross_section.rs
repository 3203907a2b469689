//! Cross-sectional standardization.
//!
//! z-scores one metric against the same metric across every instrument on
//! the same date. A flat cross-section (population σ = 0) standardizes to 0
//! for every member rather than failing.

use std::collections::BTreeMap;

use super::rolling::mean_and_std;

/// Standardizes one date's cross-section. Infinite inputs count as 0;
/// `NaN` inputs are dropped from the result.
pub fn standardize<K: Clone>(values: &[(K, f64)]) -> Vec<(K, f64)> {
    let members: Vec<(K, f64)> = values
        .iter()
        .filter(|(_, v)| !v.is_nan())
        .map(|(k, v)| (k.clone(), if v.is_infinite() { 0.0 } else { *v }))
        .collect();

    let raw: Vec<f64> = members.iter().map(|(_, v)| *v).collect();
    let Some((mean, std)) = mean_and_std(&raw) else {
        return Vec::new();
    };
    // Rounding in the mean can leave a tiny σ on identical inputs.
    let flat = raw.iter().all(|v| *v == raw[0]);

    members
        .into_iter()
        .map(|(k, v)| {
            let z = if !flat && std > 0.0 { (v - mean) / std } else { 0.0 };
            (k, z)
        })
        .collect()
}

/// Standardizes every date of a set of aligned columns. Rows where an
/// instrument has no value stay missing and do not take part in that
/// date's statistics.
pub fn standardize_columns(
    columns: &BTreeMap<String, Vec<Option<f64>>>,
    len: usize,
) -> BTreeMap<String, Vec<Option<f64>>> {
    let mut out: BTreeMap<String, Vec<Option<f64>>> = columns
        .keys()
        .map(|code| (code.clone(), vec![None; len]))
        .collect();

    for t in 0..len {
        let section: Vec<(&String, f64)> = columns
            .iter()
            .filter_map(|(code, values)| values.get(t).copied().flatten().map(|v| (code, v)))
            .collect();

        for (code, z) in standardize(&section) {
            if let Some(column) = out.get_mut(code) {
                column[t] = Some(z);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn standardize_known_values() {
        let z = standardize(&[("A", 1.0), ("B", 2.0), ("C", 3.0)]);
        let std = (2.0_f64 / 3.0).sqrt();
        assert_relative_eq!(z[0].1, -1.0 / std, epsilon = 1e-12);
        assert_relative_eq!(z[1].1, 0.0, epsilon = 1e-12);
        assert_relative_eq!(z[2].1, 1.0 / std, epsilon = 1e-12);
    }

    #[test]
    fn flat_cross_section_is_zero() {
        let z = standardize(&[("A", 5.0), ("B", 5.0), ("C", 5.0)]);
        assert!(z.iter().all(|(_, v)| *v == 0.0));
    }

    #[test]
    fn single_member_is_zero() {
        let z = standardize(&[("A", 42.0)]);
        assert_eq!(z, vec![("A", 0.0)]);
    }

    #[test]
    fn empty_section() {
        let z: Vec<(&str, f64)> = standardize(&[]);
        assert!(z.is_empty());
    }

    #[test]
    fn infinite_counts_as_zero() {
        let z = standardize(&[("A", f64::INFINITY), ("B", 2.0)]);
        // values become [0, 2]: mean 1, σ 1
        assert_relative_eq!(z[0].1, -1.0, epsilon = 1e-12);
        assert_relative_eq!(z[1].1, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn nan_is_dropped() {
        let z = standardize(&[("A", f64::NAN), ("B", 1.0), ("C", 3.0)]);
        assert_eq!(z.len(), 2);
        assert_eq!(z[0].0, "B");
    }

    #[test]
    fn columns_skip_missing_rows() {
        let mut columns = BTreeMap::new();
        columns.insert("A".to_string(), vec![None, Some(1.0), Some(4.0)]);
        columns.insert("B".to_string(), vec![Some(2.0), Some(3.0), Some(4.0)]);

        let out = standardize_columns(&columns, 3);
        assert_eq!(out["A"][0], None);
        assert_eq!(out["B"][0], Some(0.0));
        assert_relative_eq!(out["A"][1].unwrap(), -1.0, epsilon = 1e-12);
        assert_relative_eq!(out["B"][1].unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(out["A"][2], Some(0.0));
        assert_eq!(out["B"][2], Some(0.0));
    }

    proptest! {
        #[test]
        fn identical_values_standardize_to_zero(value in -1e6f64..1e6, n in 1usize..20) {
            let section: Vec<(usize, f64)> = (0..n).map(|i| (i, value)).collect();
            let z = standardize(&section);
            prop_assert_eq!(z.len(), n);
            prop_assert!(z.iter().all(|(_, v)| *v == 0.0));
        }

        #[test]
        fn standardized_mean_is_zero(values in proptest::collection::vec(-1e3f64..1e3, 2..30)) {
            let section: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
            let z = standardize(&section);
            let mean = z.iter().map(|(_, v)| v).sum::<f64>() / z.len() as f64;
            prop_assert!(mean.abs() < 1e-9);
        }
    }
}
