//! In-memory hash join over [`Frame`]s.
//!
//! The right side is hashed by its composite key; the left side streams past
//! it. A key with any absent component never matches, but the row carrying it
//! is still emitted as unmatched.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use log::debug;

use crate::frame::{Frame, present};

const KEY_SEPARATOR: &str = "\u{1f}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Left,
    Full,
}

/// What happens to the right table's key columns in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RightKeys {
    /// Keys share the left key columns (join on equally named columns).
    Merge,
    /// Keys are carried as ordinary right columns (join on differently named columns).
    Keep,
}

#[derive(Debug, Clone)]
pub struct JoinOutput {
    pub frame: Frame,
    /// Number of (left, right) row pairs emitted.
    pub matched_rows: usize,
    /// Whether each output row had a right-side match, aligned with `frame.rows`.
    pub matched: Vec<bool>,
}

pub fn join(
    left: &Frame,
    right: &Frame,
    left_keys: &[usize],
    right_keys: &[usize],
    kind: JoinKind,
    right_key_columns: RightKeys,
) -> JoinOutput {
    debug_assert_eq!(left_keys.len(), right_keys.len());

    let mut lookup: HashMap<String, Vec<usize>> = HashMap::new();
    for (row_idx, row) in right.rows.iter().enumerate() {
        if let Some(key) = build_key(row, right_keys) {
            lookup.entry(key).or_default().push(row_idx);
        }
    }

    let skipped: &[usize] = match right_key_columns {
        RightKeys::Merge => right_keys,
        RightKeys::Keep => &[],
    };
    let (headers, right_columns) = build_output_headers(&left.headers, &right.headers, skipped);
    let mut rows = Vec::with_capacity(left.len());
    let mut matched = Vec::with_capacity(left.len());
    let mut right_used = vec![false; right.len()];
    let mut matched_rows = 0usize;

    for row in &left.rows {
        let bucket = build_key(row, left_keys).and_then(|key| lookup.get(&key));
        match bucket {
            Some(bucket) => {
                for &right_idx in bucket {
                    right_used[right_idx] = true;
                    let right_row = &right.rows[right_idx];
                    let mut combined = row.clone();
                    combined.extend(right_columns.iter().map(|idx| right_row[*idx].clone()));
                    rows.push(combined);
                    matched.push(true);
                    matched_rows += 1;
                }
            }
            None => {
                let mut combined = row.clone();
                combined.extend(right_columns.iter().map(|_| String::new()));
                rows.push(combined);
                matched.push(false);
            }
        }
    }

    if kind == JoinKind::Full {
        for (right_idx, right_row) in right.rows.iter().enumerate() {
            if right_used[right_idx] {
                continue;
            }
            let mut combined = vec![String::new(); left.width()];
            if right_key_columns == RightKeys::Merge {
                for (left_idx, right_key_idx) in left_keys.iter().zip(right_keys) {
                    combined[*left_idx] = right_row[*right_key_idx].clone();
                }
            }
            combined.extend(right_columns.iter().map(|idx| right_row[*idx].clone()));
            rows.push(combined);
            matched.push(false);
        }
    }

    debug!(
        "Join ({kind:?}): {} left row(s), {} right row(s), {} output row(s), {} matched pair(s)",
        left.len(),
        right.len(),
        rows.len(),
        matched_rows
    );

    JoinOutput {
        frame: Frame { headers, rows },
        matched_rows,
        matched,
    }
}

fn build_key(row: &[String], key_indices: &[usize]) -> Option<String> {
    let parts = key_indices
        .iter()
        .map(|idx| row.get(*idx).and_then(|value| present(value)))
        .collect::<Option<Vec<&str>>>()?;
    Some(parts.into_iter().join(KEY_SEPARATOR))
}

fn build_output_headers(
    left_headers: &[String],
    right_headers: &[String],
    skipped_right: &[usize],
) -> (Vec<String>, Vec<usize>) {
    let mut headers = left_headers.to_vec();
    let mut seen: HashSet<String> = headers.iter().cloned().collect();
    let mut right_columns = Vec::new();

    for (idx, name) in right_headers.iter().enumerate() {
        if skipped_right.contains(&idx) {
            continue;
        }
        let mut candidate = name.clone();
        if seen.contains(&candidate) {
            let mut counter = 1usize;
            let base = candidate.clone();
            while seen.contains(&candidate) {
                candidate = format!("right_{base}_{counter}");
                counter += 1;
            }
        }
        seen.insert(candidate.clone());
        headers.push(candidate);
        right_columns.push(idx);
    }

    (headers, right_columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(headers: &[&str], rows: &[&[&str]]) -> Frame {
        Frame::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn full_join_keeps_rows_unique_to_either_side() {
        let left = frame(
            &["Item No. EUR", "PRODUCT", "COLOR"],
            &[&["1", "Table", "White"], &["2", "Chair", "Black"]],
        );
        let right = frame(
            &["Item No. GBP", "PRODUCT", "COLOR"],
            &[&["1", "Table", "White"], &["9", "Lamp", "Grey"]],
        );
        let out = join(&left, &right, &[1, 2], &[1, 2], JoinKind::Full, RightKeys::Merge);

        assert_eq!(
            out.frame.headers,
            vec!["Item No. EUR", "PRODUCT", "COLOR", "Item No. GBP"]
        );
        assert_eq!(out.frame.rows[0], vec!["1", "Table", "White", "1"]);
        assert_eq!(out.frame.rows[1], vec!["2", "Chair", "Black", ""]);
        assert_eq!(out.frame.rows[2], vec!["", "Lamp", "Grey", "9"]);
        assert_eq!(out.matched_rows, 1);
        assert_eq!(out.matched, vec![true, false, false]);
    }

    #[test]
    fn duplicate_keys_fan_out() {
        let left = frame(&["k", "a"], &[&["x", "1"]]);
        let right = frame(&["k", "b"], &[&["x", "p"], &["x", "q"]]);
        let out = join(&left, &right, &[0], &[0], JoinKind::Left, RightKeys::Merge);
        assert_eq!(out.frame.len(), 2);
        assert_eq!(out.matched_rows, 2);
    }

    #[test]
    fn absent_keys_never_match() {
        let left = frame(&["k", "a"], &[&["", "1"]]);
        let right = frame(&["k", "b"], &[&[" ", "p"]]);
        let out = join(&left, &right, &[0], &[0], JoinKind::Full, RightKeys::Merge);
        assert_eq!(out.frame.len(), 2);
        assert_eq!(out.matched_rows, 0);
    }

    #[test]
    fn kept_right_keys_stay_in_output() {
        let left = frame(&["Item no.", "Qty"], &[&["65001", "2"], &["99", "1"]]);
        let right = frame(&["Product", "Item No. EUR"], &[&["Table", "65001"]]);
        let out = join(&left, &right, &[0], &[1], JoinKind::Left, RightKeys::Keep);
        assert_eq!(
            out.frame.headers,
            vec!["Item no.", "Qty", "Product", "Item No. EUR"]
        );
        assert_eq!(out.frame.rows[0], vec!["65001", "2", "Table", "65001"]);
        assert_eq!(out.frame.rows[1], vec!["99", "1", "", ""]);
    }

    #[test]
    fn colliding_right_headers_are_renamed() {
        let left = frame(&["k", "Product"], &[&["x", "mine"]]);
        let right = frame(&["k", "Product"], &[&["x", "theirs"]]);
        let out = join(&left, &right, &[0], &[0], JoinKind::Left, RightKeys::Merge);
        assert_eq!(out.frame.headers, vec!["k", "Product", "right_Product_1"]);
    }
}
