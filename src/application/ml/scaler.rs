use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Per-column standardization `(x - mean) / scale`.
///
/// Scale is the population standard deviation; constant columns get scale 1.0
/// so they map to zero instead of NaN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Learns column statistics from `rows`. All rows must have the same width.
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let mut means = Vec::with_capacity(width);
        let mut scales = Vec::with_capacity(width);

        for col in 0..width {
            let column: Vec<f64> = rows.iter().map(|row| row[col]).collect();
            let mean = column.iter().mean();
            let std_dev = column.iter().population_std_dev();
            means.push(if mean.is_finite() { mean } else { 0.0 });
            scales.push(if std_dev.is_finite() && std_dev > 0.0 {
                std_dev
            } else {
                1.0
            });
        }

        Self { means, scales }
    }

    pub fn width(&self) -> usize {
        self.means.len()
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(self.scales.iter()))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }
}
