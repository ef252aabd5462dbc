//! Approximate substring matching.

/// Best similarity (0-100) of `a` against any substring of `b`, or of `b`
/// against any substring of `a`, whichever string is shorter.
///
/// Similarity is the normalized indel distance: with `d` insertions and
/// deletions turning the shorter string into a substring of length `len`,
/// the ratio is `100 * (1 - d / (m + len))`. The search is a semi-global
/// alignment where the substring may start and end anywhere, so it runs in
/// `O(n * m)` time and `O(n)` space.
///
/// Returns 0 when either string is empty.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (needle, hay) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    let m = needle.len();
    let n = hay.len();
    if m == 0 || n == 0 {
        return 0.0;
    }

    // prev[j] / curr[j]: (distance, start) of aligning needle[..i]
    // against a substring of hay ending at j.
    let mut prev: Vec<(usize, usize)> = (0..=n).map(|j| (0, j)).collect();
    let mut curr: Vec<(usize, usize)> = vec![(0, 0); n + 1];

    for i in 1..=m {
        curr[0] = (i, 0);
        for j in 1..=n {
            let mut best = (prev[j].0 + 1, prev[j].1);
            let left = (curr[j - 1].0 + 1, curr[j - 1].1);
            if better(left, best) {
                best = left;
            }
            if needle[i - 1] == hay[j - 1] {
                let diag = prev[j - 1];
                if better(diag, best) {
                    best = diag;
                }
            }
            curr[j] = best;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let mut best_ratio = 0.0f64;
    for (j, &(dist, start)) in prev.iter().enumerate() {
        let len = j - start;
        let total = (m + len) as f64;
        let ratio = 100.0 * (1.0 - dist as f64 / total);
        if ratio > best_ratio {
            best_ratio = ratio;
        }
    }
    best_ratio
}

// Lower distance wins; on a tie the longer substring (earlier start) wins,
// since it never lowers the ratio.
fn better(candidate: (usize, usize), current: (usize, usize)) -> bool {
    candidate.0 < current.0 || (candidate.0 == current.0 && candidate.1 < current.1)
}
