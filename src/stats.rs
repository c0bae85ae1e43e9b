//! Running summary statistics over temperature samples.

use std::ops::AddAssign;

use ndarray::{ArrayBase, Data, Dimension};
use rayon::prelude::*;
use serde_derive::*;

/// Count, extremes and mean of a set of samples. NaN samples
/// are skipped.
///
/// Accumulate with `stats += value` and merge partial
/// results with `stats += &other`, which makes it usable
/// directly in a rayon `fold` / `reduce`.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    #[serde(skip)]
    sum: f64,
}

impl Default for Stats {
    fn default() -> Self {
        Stats {
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            mean: f64::NAN,
            sum: 0.,
        }
    }
}

impl Stats {
    /// Stats of every sample of an array, computed in
    /// parallel.
    pub fn of_array<S, D>(array: &ArrayBase<S, D>) -> Self
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        array
            .view()
            .into_par_iter()
            .fold(Stats::default, |mut acc, &val| {
                acc += val as f64;
                acc
            })
            .reduce(Stats::default, |mut acc, val| {
                acc += &val;
                acc
            })
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn update_mean(&mut self) {
        if self.count > 0 {
            self.mean = self.sum / self.count as f64;
        }
    }
}

impl AddAssign<f64> for Stats {
    fn add_assign(&mut self, val: f64) {
        if val.is_nan() {
            return;
        }
        self.count += 1;
        self.sum += val;
        self.min = self.min.min(val);
        self.max = self.max.max(val);
        self.update_mean();
    }
}

impl AddAssign<&Stats> for Stats {
    fn add_assign(&mut self, other: &Stats) {
        self.count += other.count;
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.update_mean();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn accumulate_and_merge() {
        let mut a = Stats::default();
        a += 1.;
        a += 3.;
        let mut b = Stats::default();
        b += -2.;
        b += f64::NAN;

        a += &b;
        assert_eq!(a.count, 3);
        assert_eq!(a.min, -2.);
        assert_eq!(a.max, 3.);
        assert!((a.mean - 2. / 3.).abs() < 1e-12);
    }

    #[test]
    fn empty_has_no_mean() {
        let s = Stats::default();
        assert!(s.is_empty());
        assert!(s.mean.is_nan());

        let mut merged = Stats::default();
        merged += &Stats::default();
        assert!(merged.is_empty());
        assert!(merged.mean.is_nan());
    }

    #[test]
    fn array_stats() {
        let s = Stats::of_array(&array![[20f32, 30.], [40., 50.]]);
        assert_eq!(s.count, 4);
        assert_eq!(s.min, 20.);
        assert_eq!(s.max, 50.);
        assert_eq!(s.mean, 35.);
    }

    #[test]
    fn view_stats() {
        let image = array![[f32::NAN, 1., 2.], [3., 4., 100.]];
        let s = Stats::of_array(&image.slice(ndarray::s![.., ..2]));
        assert_eq!(s.count, 3);
        assert_eq!(s.min, 1.);
        assert_eq!(s.max, 4.);
        assert!((s.mean - 8. / 3.).abs() < 1e-12);
    }
}
