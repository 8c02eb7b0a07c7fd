//! PNG rendering of the mean-reward curve using plotters.

use std::path::Path;

use plotters::prelude::*;

use crate::error::{HarnessError, Result};

/// Renders mean reward against episode count.
pub struct RewardPlot {
    /// Image width in pixels.
    width: u32,
    /// Image height in pixels.
    height: u32,
}

impl Default for RewardPlot {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl RewardPlot {
    /// Create a plot with the specified dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Render the curve to a PNG file, replacing any previous image.
    pub fn render_to_file(
        &self,
        title: &str,
        episodes: &[f64],
        mean_rewards: &[f64],
        path: impl AsRef<Path>,
    ) -> Result<()> {
        if episodes.is_empty() {
            return Err(HarnessError::Plot("reward history is empty".to_string()));
        }
        if episodes.len() != mean_rewards.len() {
            return Err(HarnessError::Plot(format!(
                "{} episodes but {} rewards",
                episodes.len(),
                mean_rewards.len()
            )));
        }

        let (x_min, x_max) = axis_range(episodes);
        let (y_min, y_max) = axis_range(mean_rewards);

        let root =
            BitMapBackend::new(path.as_ref(), (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| HarnessError::Plot(format!("{:?}", e)))?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(|e| HarnessError::Plot(format!("{:?}", e)))?;

        chart
            .configure_mesh()
            .x_desc("Episodes")
            .y_desc("Mean reward")
            .draw()
            .map_err(|e| HarnessError::Plot(format!("{:?}", e)))?;

        chart
            .draw_series(LineSeries::new(
                episodes.iter().copied().zip(mean_rewards.iter().copied()),
                BLUE.stroke_width(2),
            ))
            .map_err(|e| HarnessError::Plot(format!("{:?}", e)))?;

        root.present()
            .map_err(|e| HarnessError::Plot(format!("{:?}", e)))?;

        Ok(())
    }
}

/// Min/max of the data, widened when degenerate so the axis is never empty.
fn axis_range(values: &[f64]) -> (f64, f64) {
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() {
        return (0.0, 1.0);
    }
    if max - min < 1e-9 {
        let pad = (min.abs() * 0.1).max(1.0);
        return (min - pad, max + pad);
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_range() {
        assert_eq!(axis_range(&[3.0, -1.0, 2.0]), (-1.0, 3.0));
        assert_eq!(axis_range(&[5.0]), (4.0, 6.0));
        assert_eq!(axis_range(&[f64::NAN]), (0.0, 1.0));
    }

    #[test]
    fn test_render_to_file() {
        let plot = RewardPlot::new(320, 240);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reward.png");

        plot.render_to_file("HalfCheetah", &[20.0, 40.0, 60.0], &[-5.0, 3.0, 12.5], &path)
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_rejects_bad_history() {
        let plot = RewardPlot::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");

        assert!(matches!(
            plot.render_to_file("empty", &[], &[], &path),
            Err(HarnessError::Plot(_))
        ));
        assert!(matches!(
            plot.render_to_file("mismatch", &[1.0, 2.0], &[1.0], &path),
            Err(HarnessError::Plot(_))
        ));
        assert!(!path.exists());
    }
}
