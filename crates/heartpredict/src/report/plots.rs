use std::fs;
use std::path::Path;

use plotly::common::{Line, LineShape, Mode};
use plotly::layout::{Axis, Layout};
use plotly::{Bar, Plot, Scatter};

use crate::descriptive::ValueDistribution;
use crate::error::{HeartPredictError, Result};
use crate::survival::Stratum;

/// Step plot of one Kaplan-Meier curve per stratum.
pub fn plot_kaplan_meier(strata: &[Stratum], title: &str) -> Plot {
    let mut plot = Plot::new();
    for stratum in strata {
        // every curve starts at S(0) = 1
        let mut x = vec![0.0];
        let mut y = vec![1.0];
        x.extend(stratum.curve.times.iter().copied());
        y.extend(stratum.curve.survival_prob.iter().copied());

        let trace = Scatter::new(x, y)
            .mode(Mode::Lines)
            .name(format!("{} (n = {})", stratum.label, stratum.rows.len()))
            .line(Line::new().shape(LineShape::Hv));
        plot.add_trace(trace);
    }
    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("Follow-up time (days)"))
            .y_axis(Axis::new().title("Survival probability")),
    );
    plot
}

/// Bar plot of a value distribution, most frequent value first.
pub fn plot_value_distribution(distribution: &ValueDistribution) -> Plot {
    let trace = Bar::new(distribution.labels(), distribution.counts()).name(distribution.column.as_str());
    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(
        Layout::new()
            .title(format!("Distribution of {}", distribution.column).as_str())
            .x_axis(Axis::new().title(distribution.column.as_str()))
            .y_axis(Axis::new().title("Count")),
    );
    plot
}

/// Render `plot` as a standalone HTML page at `path`.
pub fn save_plot<P: AsRef<Path>>(plot: &Plot, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, plot.to_html()).map_err(|e| HeartPredictError::from_io(path, e))?;
    log::debug!("Wrote plot to {}", path.display());
    Ok(())
}
