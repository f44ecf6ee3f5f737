use std::collections::HashSet;
use std::hash::Hash;

/// Keep the first occurrence of each key, preserving input order.
pub fn dedupe_by_key<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}

/// Distinct keys in first-seen order, used to batch parent lookups.
pub fn unique_keys<T, K, F>(items: &[T], key: F) -> Vec<K>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::with_capacity(items.len());
    let mut keys = Vec::new();
    for item in items {
        let k = key(item);
        if seen.insert(k.clone()) {
            keys.push(k);
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        label: &'static str,
    }

    fn row(id: u32, label: &'static str) -> Row {
        Row { id, label }
    }

    #[test]
    fn test_keeps_first_occurrence() {
        let rows = vec![row(1, "a"), row(2, "b"), row(1, "c"), row(3, "d"), row(2, "e")];
        let out = dedupe_by_key(rows, |r| r.id);
        assert_eq!(out, vec![row(1, "a"), row(2, "b"), row(3, "d")]);
    }

    #[test]
    fn test_first_occurrence_in_any_order() {
        let orderings = [
            vec![row(7, "x"), row(7, "y"), row(7, "z")],
            vec![row(7, "z"), row(7, "x"), row(7, "y")],
            vec![row(7, "y"), row(7, "z"), row(7, "x")],
        ];
        for rows in orderings {
            let first = rows[0].clone();
            let out = dedupe_by_key(rows, |r| r.id);
            assert_eq!(out, vec![first]);
        }
    }

    #[test]
    fn test_unique_keys() {
        let rows = vec![row(3, "a"), row(1, "b"), row(3, "c")];
        assert_eq!(unique_keys(&rows, |r| r.id), vec![3, 1]);
        assert!(unique_keys(&Vec::<Row>::new(), |r| r.id).is_empty());
    }
}
