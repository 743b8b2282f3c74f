//! Position scales used to lay out marks.
//!
//! - [`LinearScale`]: continuous domain → continuous range, with "nice" ticks
//! - [`BandScale`]: discrete domain → evenly spaced bands
//! - [`PointScale`]: discrete domain → evenly spaced points
//! - [`QuantileScale`]: continuous domain → discrete classes of equal population
//!
//! ```rust
//! use climviz_core::scale::LinearScale;
//!
//! let x = LinearScale::new((0.0, 200.0), (0.0, 670.0));
//! assert_eq!(x.apply(100.0), 335.0);
//! assert_eq!(x.ticks(5), vec![0.0, 50.0, 100.0, 150.0, 200.0]);
//! ```

use crate::dataset::FloatValue;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (FloatValue, FloatValue),
    range: (FloatValue, FloatValue),
}

impl LinearScale {
    pub fn new(domain: (FloatValue, FloatValue), range: (FloatValue, FloatValue)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (FloatValue, FloatValue) {
        self.domain
    }

    pub fn range(&self) -> (FloatValue, FloatValue) {
        self.range
    }

    /// Map a domain value onto the range.
    ///
    /// A collapsed domain maps everything to the middle of the range.
    pub fn apply(&self, value: FloatValue) -> FloatValue {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let t = if d1 == d0 { 0.5 } else { (value - d0) / (d1 - d0) };
        r0 + (r1 - r0) * t
    }

    /// Roughly `count` round-numbered ticks covering the domain
    pub fn ticks(&self, count: usize) -> Vec<FloatValue> {
        let (mut start, mut stop) = self.domain;
        if !(start.is_finite() && stop.is_finite()) || count == 0 {
            return Vec::new();
        }
        if start == stop {
            return vec![start];
        }
        let reverse = stop < start;
        if reverse {
            std::mem::swap(&mut start, &mut stop);
        }

        let step = (stop - start) / count as FloatValue;
        let power = step.log10().floor();
        let error = step / 10f64.powf(power);
        let factor = if error >= 50f64.sqrt() {
            10.0
        } else if error >= 10f64.sqrt() {
            5.0
        } else if error >= 2f64.sqrt() {
            2.0
        } else {
            1.0
        };

        let mut ticks: Vec<FloatValue> = if power >= 0.0 {
            let increment = factor * 10f64.powf(power);
            let first = (start / increment).ceil() as i64;
            let last = (stop / increment).floor() as i64;
            (first..=last).map(|i| i as FloatValue * increment).collect()
        } else {
            // Divide by the inverse to avoid 0.30000000000000004
            let inverse = 10f64.powf(-power) / factor;
            let first = (start * inverse).ceil() as i64;
            let last = (stop * inverse).floor() as i64;
            (first..=last).map(|i| i as FloatValue / inverse).collect()
        };
        if reverse {
            ticks.reverse();
        }
        ticks
    }
}

/// Evenly spaced bands for a discrete domain
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    domain: Vec<String>,
    range: (FloatValue, FloatValue),
    padding_inner: FloatValue,
    padding_outer: FloatValue,
}

impl BandScale {
    pub fn new<I, S>(domain: I, range: (FloatValue, FloatValue)) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domain: domain.into_iter().map(Into::into).collect(),
            range,
            padding_inner: 0.0,
            padding_outer: 0.0,
        }
    }

    /// Set both inner and outer padding, as a fraction of the step
    pub fn with_padding(mut self, padding: FloatValue) -> Self {
        self.padding_inner = padding.clamp(0.0, 1.0);
        self.padding_outer = padding;
        self
    }

    pub fn with_padding_inner(mut self, padding: FloatValue) -> Self {
        self.padding_inner = padding.clamp(0.0, 1.0);
        self
    }

    pub fn with_padding_outer(mut self, padding: FloatValue) -> Self {
        self.padding_outer = padding;
        self
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    /// Distance between the starts of adjacent bands
    pub fn step(&self) -> FloatValue {
        let n = self.domain.len() as FloatValue;
        let (r0, r1) = self.range;
        (r1 - r0) / (n - self.padding_inner + 2.0 * self.padding_outer).max(1.0)
    }

    pub fn bandwidth(&self) -> FloatValue {
        self.step() * (1.0 - self.padding_inner)
    }

    fn start(&self) -> FloatValue {
        let n = self.domain.len() as FloatValue;
        let (r0, r1) = self.range;
        r0 + ((r1 - r0) - self.step() * (n - self.padding_inner)) * 0.5
    }

    /// Start of the band for `key`, `None` if the key is not in the domain
    pub fn apply(&self, key: &str) -> Option<FloatValue> {
        let index = self.domain.iter().position(|d| d == key)?;
        Some(self.position(index))
    }

    pub fn position(&self, index: usize) -> FloatValue {
        self.start() + self.step() * index as FloatValue
    }

    /// Middle of the band for `key`
    pub fn center(&self, key: &str) -> Option<FloatValue> {
        self.apply(key).map(|start| start + self.bandwidth() / 2.0)
    }
}

/// Evenly spaced points for a discrete domain (a band scale with zero-width bands)
#[derive(Debug, Clone, PartialEq)]
pub struct PointScale {
    bands: BandScale,
}

impl PointScale {
    pub fn new<I, S>(domain: I, range: (FloatValue, FloatValue)) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bands: BandScale::new(domain, range).with_padding_inner(1.0),
        }
    }

    pub fn with_padding(mut self, padding: FloatValue) -> Self {
        self.bands = self.bands.with_padding_outer(padding);
        self
    }

    pub fn domain(&self) -> &[String] {
        self.bands.domain()
    }

    pub fn step(&self) -> FloatValue {
        self.bands.step()
    }

    pub fn apply(&self, key: &str) -> Option<FloatValue> {
        self.bands.apply(key)
    }

    pub fn position(&self, index: usize) -> FloatValue {
        self.bands.position(index)
    }
}

/// Quantile of an ascending slice using linear interpolation between order statistics
pub fn quantile_sorted(sorted: &[FloatValue], p: FloatValue) -> Option<FloatValue> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if p <= 0.0 || n < 2 {
        return Some(sorted[0]);
    }
    if p >= 1.0 {
        return Some(sorted[n - 1]);
    }
    let i = (n - 1) as FloatValue * p;
    let i0 = i.floor() as usize;
    let (v0, v1) = (sorted[i0], sorted[i0 + 1]);
    Some(v0 + (v1 - v0) * (i - i0 as FloatValue))
}

/// Assigns values to `range.len()` classes holding roughly equal numbers of
/// domain samples
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileScale<R> {
    thresholds: Vec<FloatValue>,
    range: Vec<R>,
}

impl<R: Clone> QuantileScale<R> {
    /// Non-finite samples are ignored.
    pub fn new(domain: impl IntoIterator<Item = FloatValue>, range: &[R]) -> Self {
        let mut sorted: Vec<FloatValue> = domain.into_iter().filter(|v| v.is_finite()).collect();
        sorted.sort_by(FloatValue::total_cmp);

        let classes = range.len();
        let thresholds = if sorted.is_empty() {
            Vec::new()
        } else {
            (1..classes)
                .filter_map(|i| quantile_sorted(&sorted, i as FloatValue / classes as FloatValue))
                .collect()
        };
        Self {
            thresholds,
            range: range.to_vec(),
        }
    }

    pub fn thresholds(&self) -> &[FloatValue] {
        &self.thresholds
    }

    /// Class for `value`, `None` when the domain was empty
    pub fn apply(&self, value: FloatValue) -> Option<&R> {
        if self.range.is_empty() || (self.thresholds.is_empty() && self.range.len() > 1) {
            return None;
        }
        let index = self.thresholds.partition_point(|t| *t <= value);
        self.range.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn linear_collapsed_domain_maps_to_middle() {
        let scale = LinearScale::new((5.0, 5.0), (0.0, 100.0));
        assert_eq!(scale.apply(5.0), 50.0);
    }

    #[test]
    fn linear_inverted_range() {
        let y = LinearScale::new((0.0, 100.0), (470.0, 60.0));
        assert_eq!(y.apply(0.0), 470.0);
        assert_eq!(y.apply(100.0), 60.0);
    }

    #[test]
    fn ticks_small_steps() {
        let scale = LinearScale::new((0.0, 1.0), (0.0, 1.0));
        assert_eq!(scale.ticks(5), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
    }

    #[test]
    fn ticks_uneven_domain() {
        let scale = LinearScale::new((0.0, 1234.0), (0.0, 1.0));
        assert_eq!(scale.ticks(5), vec![0.0, 200.0, 400.0, 600.0, 800.0, 1000.0, 1200.0]);
    }

    #[test]
    fn band_scale_matches_padding() {
        let bands = BandScale::new(["a", "b", "c", "d"], (0.0, 100.0)).with_padding(0.2);
        // step = 100 / (4 - 0.2 + 0.4) = 23.8095...
        let step = 100.0 / 4.2;
        assert_relative_eq!(bands.step(), step, epsilon = 1e-9);
        assert_relative_eq!(bands.bandwidth(), step * 0.8, epsilon = 1e-9);
        assert_relative_eq!(bands.apply("a").unwrap(), step * 0.2, epsilon = 1e-9);
        assert_eq!(bands.apply("z"), None);
    }

    #[test]
    fn band_scale_full_padding_behaves_like_points() {
        let bands = BandScale::new(["a", "b", "c"], (0.0, 100.0)).with_padding(1.0);
        assert_eq!(bands.bandwidth(), 0.0);
        assert_relative_eq!(bands.apply("a").unwrap(), 25.0, epsilon = 1e-9);
        assert_relative_eq!(bands.apply("c").unwrap(), 75.0, epsilon = 1e-9);
    }

    #[test]
    fn point_scale_spans_range() {
        let points = PointScale::new(["2019", "2020", "2021"], (60.0, 870.0));
        assert_eq!(points.apply("2019"), Some(60.0));
        assert_eq!(points.apply("2020"), Some(465.0));
        assert_eq!(points.apply("2021"), Some(870.0));
    }

    #[test]
    fn quantiles() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile_sorted(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile_sorted(&sorted, 1.0), Some(4.0));
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn quantile_scale_classes() {
        let scale = QuantileScale::new([4.0, 1.0, 3.0, 2.0], &["low", "high"]);
        assert_eq!(scale.thresholds(), &[2.5]);
        assert_eq!(scale.apply(1.0), Some(&"low"));
        assert_eq!(scale.apply(2.5), Some(&"high"));
        assert_eq!(scale.apply(100.0), Some(&"high"));
    }

    #[test]
    fn quantile_scale_empty_domain() {
        let scale = QuantileScale::new(Vec::new(), &["low", "high"]);
        assert_eq!(scale.apply(1.0), None);
    }
}
