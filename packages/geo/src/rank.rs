//! Stable descending top-K selection.

/// Returns at most `k` records ordered by `key`, highest first.
///
/// Records with equal keys keep their relative input order. `k` larger
/// than the input returns the whole input sorted; `k == 0` returns an empty
/// vector.
pub fn top_k<T>(records: impl IntoIterator<Item = T>, key: impl Fn(&T) -> f64, k: usize) -> Vec<T> {
    if k == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<T> = records.into_iter().collect();
    // `sort_by` is stable, so ties stay in input order.
    ranked.sort_by(|a, b| key(b).total_cmp(&key(a)));
    ranked.truncate(k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descending_and_truncated() {
        let result = top_k(vec![3.0, 9.0, 1.0, 7.0], |v| *v, 2);
        assert_eq!(result, vec![9.0, 7.0]);
    }

    #[test]
    fn k_larger_than_input_returns_everything_sorted() {
        let result = top_k(vec![3.0, 9.0, 1.0], |v| *v, 10);
        assert_eq!(result, vec![9.0, 3.0, 1.0]);
    }

    #[test]
    fn k_zero_is_empty() {
        assert!(top_k(vec![1.0, 2.0], |v| *v, 0).is_empty());
    }

    #[test]
    fn ties_keep_input_order() {
        let records = vec![("a", 5.0), ("b", 8.0), ("c", 5.0), ("d", 8.0), ("e", 5.0)];

        let result = top_k(records, |(_, h)| *h, 4);

        let names: Vec<&str> = result.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["b", "d", "a", "c"]);
    }
}
