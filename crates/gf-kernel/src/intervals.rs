//! Sorted, disjoint sets of closed intervals on a line.
//!
//! Solids are evaluated one sample line at a time; along each line a solid is
//! an `IntervalSet` and the CSG operators become set operations here.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalSet {
    spans: Vec<(f64, f64)>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self { spans: Vec::new() }
    }

    pub fn single(a: f64, b: f64) -> Self {
        let mut s = Self::new();
        s.push(a, b);
        s
    }

    /// Build from arbitrary (possibly overlapping, unsorted) intervals.
    pub fn from_unsorted(mut spans: Vec<(f64, f64)>) -> Self {
        spans.retain(|(a, b)| b > a);
        spans.sort_by(|x, y| x.0.total_cmp(&y.0));
        let mut out: Vec<(f64, f64)> = Vec::with_capacity(spans.len());
        for (a, b) in spans {
            match out.last_mut() {
                Some(last) if a <= last.1 => last.1 = last.1.max(b),
                _ => out.push((a, b)),
            }
        }
        Self { spans: out }
    }

    /// Append an interval lying entirely to the right of the current content.
    pub fn push(&mut self, a: f64, b: f64) {
        if b <= a {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if a <= last.1 => last.1 = last.1.max(b),
            _ => self.spans.push((a, b)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn spans(&self) -> &[(f64, f64)] {
        &self.spans
    }

    pub fn measure(&self) -> f64 {
        self.spans.iter().map(|(a, b)| b - a).sum()
    }

    pub fn contains(&self, x: f64) -> bool {
        self.spans.iter().any(|&(a, b)| x >= a && x <= b)
    }

    pub fn union(&self, other: &IntervalSet) -> IntervalSet {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut merged = Vec::with_capacity(self.spans.len() + other.spans.len());
        let (mut i, mut j) = (0, 0);
        while i < self.spans.len() || j < other.spans.len() {
            let take_self = j >= other.spans.len()
                || (i < self.spans.len() && self.spans[i].0 <= other.spans[j].0);
            if take_self {
                merged.push(self.spans[i]);
                i += 1;
            } else {
                merged.push(other.spans[j]);
                j += 1;
            }
        }
        let mut out = IntervalSet::new();
        for (a, b) in merged {
            out.push(a, b);
        }
        out
    }

    pub fn intersect(&self, other: &IntervalSet) -> IntervalSet {
        let mut out = IntervalSet::new();
        let (mut i, mut j) = (0, 0);
        while i < self.spans.len() && j < other.spans.len() {
            let (a0, a1) = self.spans[i];
            let (b0, b1) = other.spans[j];
            out.push(a0.max(b0), a1.min(b1));
            if a1 < b1 {
                i += 1;
            } else {
                j += 1;
            }
        }
        out
    }

    pub fn subtract(&self, other: &IntervalSet) -> IntervalSet {
        if self.is_empty() || other.is_empty() {
            return self.clone();
        }
        let mut out = IntervalSet::new();
        let mut j = 0;
        for &(a0, a1) in &self.spans {
            let mut start = a0;
            while j < other.spans.len() && other.spans[j].1 <= start {
                j += 1;
            }
            let mut k = j;
            while k < other.spans.len() && other.spans[k].0 < a1 {
                let (b0, b1) = other.spans[k];
                out.push(start, b0.min(a1));
                start = start.max(b1);
                if start >= a1 {
                    break;
                }
                k += 1;
            }
            out.push(start, a1);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(spans: &[(f64, f64)]) -> IntervalSet {
        IntervalSet::from_unsorted(spans.to_vec())
    }

    #[test]
    fn from_unsorted_merges_overlaps() {
        let s = set(&[(5.0, 6.0), (0.0, 2.0), (1.0, 3.0), (4.0, 4.0)]);
        assert_eq!(s.spans(), &[(0.0, 3.0), (5.0, 6.0)]);
        assert_eq!(s.measure(), 4.0);
    }

    #[test]
    fn union_interleaves() {
        let a = set(&[(0.0, 1.0), (4.0, 5.0)]);
        let b = set(&[(0.5, 2.0), (3.0, 4.0)]);
        assert_eq!(a.union(&b).spans(), &[(0.0, 2.0), (3.0, 5.0)]);
    }

    #[test]
    fn intersect_keeps_overlaps_only() {
        let a = set(&[(0.0, 3.0), (5.0, 8.0)]);
        let b = set(&[(2.0, 6.0)]);
        assert_eq!(a.intersect(&b).spans(), &[(2.0, 3.0), (5.0, 6.0)]);
        assert!(a.intersect(&set(&[(3.5, 4.5)])).is_empty());
    }

    #[test]
    fn subtract_punches_holes() {
        let a = set(&[(0.0, 10.0)]);
        let b = set(&[(1.0, 2.0), (4.0, 5.0), (9.0, 12.0)]);
        assert_eq!(a.subtract(&b).spans(), &[(0.0, 1.0), (2.0, 4.0), (5.0, 9.0)]);
    }

    #[test]
    fn subtract_across_several_spans() {
        let a = set(&[(0.0, 2.0), (3.0, 5.0), (6.0, 8.0)]);
        let b = set(&[(1.0, 7.0)]);
        assert_eq!(a.subtract(&b).spans(), &[(0.0, 1.0), (7.0, 8.0)]);
    }

    #[test]
    fn subtract_disjoint_is_identity() {
        let a = set(&[(0.0, 1.0)]);
        let b = set(&[(2.0, 3.0)]);
        assert_eq!(a.subtract(&b), a);
    }
}
