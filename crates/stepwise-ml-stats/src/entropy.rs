/// Contribution `−p·log₂p` of one class; zero for `p = 0`.
pub fn entropy_term(p: f64) -> f64 {
    if p > 0.0 {
        -p * p.log2()
    } else {
        0.0
    }
}

/// Shannon entropy `−Σ p(c)·log₂p(c)` of a class distribution.
///
/// Classes with a zero count contribute nothing; `total = 0` gives 0.
pub fn entropy(class_counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    let h: f64 = class_counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| entropy_term(c as f64 / n))
        .sum();
    // A pure node sums to -0.0.
    h.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_pure_and_balanced() {
        assert_eq!(entropy(&[7, 0], 7), 0.0);
        assert_abs_diff_eq!(entropy(&[5, 5], 10), 1.0);
        assert_abs_diff_eq!(entropy(&[3, 3, 3, 3], 12), 2.0);
        assert_eq!(entropy(&[], 0), 0.0);
    }

    #[test]
    fn test_classic_play_tennis() {
        // 9 yes / 5 no
        assert_abs_diff_eq!(entropy(&[9, 5], 14), 0.940_285_958_670_631, epsilon = 1e-12);
    }

    #[test]
    fn test_bounds() {
        for counts in [vec![1, 2, 3], vec![10, 1], vec![4, 4, 1, 0]] {
            let total: usize = counts.iter().sum();
            let h = entropy(&counts, total);
            let classes = counts.iter().filter(|&&c| c > 0).count() as f64;
            assert!(h >= 0.0);
            assert!(h <= classes.log2() + 1e-12);
        }
    }
}
