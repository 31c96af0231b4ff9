//! Whole-track statistics used to derive adaptive thresholds.

use serde::{Deserialize, Serialize};

/// Summary of a calibration pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub frames: usize,
    /// 90th-percentile loudness.
    pub loudness_p90: f32,
    pub mean_loudness: f32,
    pub mean_rms: f32,
    /// Mean energy per band, in the order the bands were pushed.
    pub mean_band_energy: Vec<f32>,
}

/// Accumulates per-frame statistics.
#[derive(Debug, Clone)]
pub struct Calibrator {
    loudness: Vec<f32>,
    rms_sum: f64,
    band_sums: Vec<f64>,
}

impl Calibrator {
    pub fn new(bands: usize) -> Self {
        Self {
            loudness: Vec::new(),
            rms_sum: 0.0,
            band_sums: vec![0.0; bands],
        }
    }

    pub fn push(&mut self, loudness: f32, rms: f32, band_energy: &[f32]) {
        self.loudness.push(loudness);
        self.rms_sum += rms as f64;
        for (sum, energy) in self.band_sums.iter_mut().zip(band_energy) {
            *sum += *energy as f64;
        }
    }

    pub fn finish(mut self) -> Calibration {
        let frames = self.loudness.len();
        let mean = |sum: f64| if frames == 0 { 0.0 } else { (sum / frames as f64) as f32 };

        let loudness_sum: f64 = self.loudness.iter().map(|&l| l as f64).sum();
        self.loudness.sort_by(f32::total_cmp);

        Calibration {
            frames,
            loudness_p90: percentile(&self.loudness, 0.9),
            mean_loudness: mean(loudness_sum),
            mean_rms: mean(self.rms_sum),
            mean_band_energy: self.band_sums.iter().map(|&s| mean(s)).collect(),
        }
    }
}

/// Value at fraction `p` of an ascending slice (0 when empty).
pub fn percentile(sorted: &[f32], p: f32) -> f32 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((sorted.len() as f32 * p).floor() as usize).min(sorted.len() - 1);
    sorted[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_lookup() {
        let sorted: Vec<f32> = (0..10).map(|i| i as f32).collect();
        assert_eq!(percentile(&sorted, 0.9), 9.0);
        assert_eq!(percentile(&sorted, 0.5), 5.0);
        assert_eq!(percentile(&sorted, 1.0), 9.0);
        assert_eq!(percentile(&[], 0.9), 0.0);
    }

    #[test]
    fn test_calibration_means() {
        let mut calibrator = Calibrator::new(2);
        for i in 0..100 {
            calibrator.push(i as f32, 0.5, &[1.0, i as f32]);
        }
        let calibration = calibrator.finish();
        assert_eq!(calibration.frames, 100);
        assert_eq!(calibration.loudness_p90, 90.0);
        assert!((calibration.mean_loudness - 49.5).abs() < 1e-4);
        assert!((calibration.mean_rms - 0.5).abs() < 1e-6);
        assert!((calibration.mean_band_energy[0] - 1.0).abs() < 1e-6);
        assert!((calibration.mean_band_energy[1] - 49.5).abs() < 1e-4);
    }

    #[test]
    fn test_empty_calibration() {
        let calibration = Calibrator::new(3).finish();
        assert_eq!(calibration.frames, 0);
        assert_eq!(calibration.mean_band_energy, vec![0.0; 3]);
    }
}
