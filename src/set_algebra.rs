//! Set algebra over sorted id sequences (§4.7 "Set algebra"): pairwise
//! intersection/difference with galloping advance, and k-way leapfrog join.
//!
//! Every function here assumes its inputs are already sorted ascending; a
//! caller with unsorted input must sort first.

/// Galloping search for the first index in `slice[start..]` whose value is
/// `>= target`. Falls back to binary search once the exponential probe
/// overshoots, giving O(log d) work where `d` is the distance to the
/// target rather than O(log n) over the whole remaining slice.
fn gallop(slice: &[u64], start: usize, target: u64) -> usize {
    if start >= slice.len() || slice[start] >= target {
        return start;
    }
    let mut jump = 1;
    let mut prev = start;
    loop {
        let probe = prev + jump;
        if probe >= slice.len() || slice[probe] >= target {
            let hi = probe.min(slice.len());
            return prev + slice[prev..hi].partition_point(|&v| v < target);
        }
        prev = probe;
        jump *= 2;
    }
}

/// Intersect two sorted, deduplicated slices. Uses a galloping advance when
/// one side is much longer than the other, falling back to a linear merge
/// otherwise.
pub fn intersect(a: &[u64], b: &[u64]) -> Vec<u64> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    let gallop_threshold = 8;

    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            out.push(a[i]);
            i += 1;
            j += 1;
        } else if a[i] < b[j] {
            if b.len() - j > gallop_threshold {
                i = gallop(a, i, b[j]);
            } else {
                i += 1;
            }
        } else if a.len() - i > gallop_threshold {
            j = gallop(b, j, a[i]);
        } else {
            j += 1;
        }
    }
    out
}

/// `a - b`: elements of sorted `a` not present in sorted `b`.
pub fn difference(a: &[u64], b: &[u64]) -> Vec<u64> {
    let mut out = Vec::with_capacity(a.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() {
        if j >= b.len() || a[i] < b[j] {
            out.push(a[i]);
            i += 1;
        } else if a[i] == b[j] {
            i += 1;
            j += 1;
        } else {
            j = gallop(b, j, a[i]);
        }
    }
    out
}

/// K-way sorted-sequence intersection via leapfrog join: maintain one
/// cursor per sequence, track the running max, and advance every cursor
/// that lags it via an exponential-then-binary seek. Sequences that are
/// empty make the whole intersection empty.
pub fn leapfrog_intersect(sequences: &[&[u64]]) -> Vec<u64> {
    let k = sequences.len();
    if k == 0 || sequences.iter().any(|s| s.is_empty()) {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by_key(|&i| sequences[i][0]);

    let mut cursors = vec![0usize; k];
    let mut out = Vec::new();
    let mut p = 0usize;

    loop {
        let cur_idx = order[p];
        let prev_idx = order[(p + k - 1) % k];
        let cur_key = sequences[cur_idx][cursors[cur_idx]];
        let prev_key = sequences[prev_idx][cursors[prev_idx]];

        if cur_key == prev_key {
            out.push(cur_key);
            cursors[cur_idx] += 1;
            if cursors[cur_idx] >= sequences[cur_idx].len() {
                return out;
            }
        } else {
            let advanced = gallop(sequences[cur_idx], cursors[cur_idx], prev_key);
            if advanced >= sequences[cur_idx].len() {
                return out;
            }
            cursors[cur_idx] = advanced;
        }
        p = (p + 1) % k;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn intersect_basic() {
        let a = vec![1, 2, 3, 5, 8];
        let b = vec![2, 3, 4, 8];
        assert_eq!(intersect(&a, &b), vec![2, 3, 8]);
    }

    #[test]
    fn intersect_large_skew_uses_gallop() {
        let a: Vec<u64> = (0..10_000).collect();
        let b = vec![5, 9_999];
        assert_eq!(intersect(&a, &b), vec![5, 9_999]);
    }

    #[test]
    fn difference_basic() {
        let a = vec![1, 2, 3, 4, 5];
        let b = vec![2, 4];
        assert_eq!(difference(&a, &b), vec![1, 3, 5]);
    }

    #[test]
    fn leapfrog_three_way() {
        let a = vec![1, 2, 3, 4, 5, 6];
        let b = vec![2, 3, 4, 6];
        let c = vec![0, 3, 4, 6, 9];
        assert_eq!(leapfrog_intersect(&[&a, &b, &c]), vec![3, 4, 6]);
    }

    #[test]
    fn leapfrog_empty_sequence_short_circuits() {
        let a = vec![1, 2, 3];
        let b: Vec<u64> = vec![];
        assert_eq!(leapfrog_intersect(&[&a, &b]), Vec::<u64>::new());
    }

    #[test]
    fn leapfrog_matches_pairwise_intersect() {
        let a: Vec<u64> = (0..200).filter(|x| x % 3 == 0).collect();
        let b: Vec<u64> = (0..200).filter(|x| x % 5 == 0).collect();
        let c: Vec<u64> = (0..200).filter(|x| x % 2 == 0).collect();
        let expected = intersect(&intersect(&a, &b), &c);
        assert_eq!(leapfrog_intersect(&[&a, &b, &c]), expected);
    }
}
