//! Samples an expression `f(x, y)` over a rectangular grid and renders the
//! result as an ASCII shade map.
//!
//! Rows are sampled in parallel on the rayon pool when the `parallel` feature
//! is enabled.

use crate::error::{FormulonError, Result};
use formulon_lang::{CompiledFunction, EvaluationContext, Type};

/// Characters from the lowest to the highest value.
const SHADES: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];
const NOT_FINITE: char = '?';

pub type Surface = CompiledFunction<(f64, f64), f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct PlotSettings {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub columns: usize,
    pub rows: usize,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            x_min: -1.0,
            x_max: 1.0,
            y_min: -1.0,
            y_max: 1.0,
            columns: 64,
            rows: 24,
        }
    }
}

impl PlotSettings {
    pub fn validate(&self) -> Result<()> {
        let bounds = [self.x_min, self.x_max, self.y_min, self.y_max];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(FormulonError::Plot("bounds must be finite".to_string()));
        }
        if self.x_min >= self.x_max || self.y_min >= self.y_max {
            return Err(FormulonError::Plot(format!(
                "empty range x {}..{}, y {}..{}",
                self.x_min, self.x_max, self.y_min, self.y_max
            )));
        }
        if self.columns == 0 || self.rows == 0 {
            return Err(FormulonError::Plot("the grid needs at least one cell".to_string()));
        }
        Ok(())
    }

    fn step(min: f64, max: f64, index: usize, count: usize) -> f64 {
        if count < 2 {
            min
        } else {
            min + (max - min) * index as f64 / (count - 1) as f64
        }
    }

    pub fn x_at(&self, column: usize) -> f64 {
        Self::step(self.x_min, self.x_max, column, self.columns)
    }

    /// Row 0 is the top of the plot, i.e. `y_max`.
    pub fn y_at(&self, row: usize) -> f64 {
        Self::step(self.y_max, self.y_min, row, self.rows)
    }
}

/// Sampled values in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    columns: usize,
    rows: usize,
    values: Vec<f64>,
}

impl Grid {
    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn value(&self, column: usize, row: usize) -> Option<f64> {
        if column >= self.columns {
            return None;
        }
        self.values.get(row * self.columns + column).copied()
    }

    /// Minimum and maximum of the finite values.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |range, v| match range {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    pub fn render(&self) -> String {
        let (lo, hi) = self.range().unwrap_or((0.0, 0.0));
        let span = hi - lo;
        let top = (SHADES.len() - 1) as f64;
        let mut out = String::with_capacity((self.columns + 1) * self.rows);
        for row in self.values.chunks(self.columns) {
            for &v in row {
                let shade = if !v.is_finite() {
                    NOT_FINITE
                } else if span == 0.0 {
                    SHADES[0]
                } else {
                    SHADES[((v - lo) / span * top).round() as usize]
                };
                out.push(shade);
            }
            out.push('\n');
        }
        out
    }
}

/// Declares the parameters `x` and `y` on `ctx` and compiles `text` into a
/// surface function.
pub fn compile_surface(ctx: &mut EvaluationContext, text: &str) -> Result<Surface> {
    ctx.set_parameters([("x", Type::F64), ("y", Type::F64)])?;
    Ok(ctx.compile::<(f64, f64), f64>(text)?)
}

fn sample_row(surface: &Surface, settings: &PlotSettings, row: usize) -> Result<Vec<f64>> {
    let y = settings.y_at(row);
    (0..settings.columns)
        .map(|column| Ok(surface.call((settings.x_at(column), y))?))
        .collect()
}

#[cfg(feature = "parallel")]
fn sample_rows(surface: &Surface, settings: &PlotSettings) -> Result<Vec<Vec<f64>>> {
    use rayon::prelude::*;
    (0..settings.rows)
        .into_par_iter()
        .map(|row| sample_row(surface, settings, row))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn sample_rows(surface: &Surface, settings: &PlotSettings) -> Result<Vec<Vec<f64>>> {
    (0..settings.rows)
        .map(|row| sample_row(surface, settings, row))
        .collect()
}

pub fn sample(surface: &Surface, settings: &PlotSettings) -> Result<Grid> {
    settings.validate()?;
    log::debug!(
        "Sampling {}x{} grid over x {}..{}, y {}..{}",
        settings.columns,
        settings.rows,
        settings.x_min,
        settings.x_max,
        settings.y_min,
        settings.y_max
    );
    let rows = sample_rows(surface, settings)?;
    Ok(Grid {
        columns: settings.columns,
        rows: settings.rows,
        values: rows.into_iter().flatten().collect(),
    })
}
