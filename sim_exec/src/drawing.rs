//! # Drawing loader
//!
//! Loads a drawing from a CSV file and fits it into the robot's workspace.
//!
//! Each row of the file is `x,y,drawing`, where the pen is down while moving
//! to the point if `drawing` is `true`. The drawing is scaled into the
//! largest rectangle of the same aspect ratio which fits the workspace, its
//! bottom edge on the inner workspace circle and its top corners on the
//! outer circles. The rectangle is centred between the motors.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Standard
use std::{io, path::Path};

// External
use csv::{ReaderBuilder, Trim};
use log::debug;

// Internal
use crate::robot::RobotConfig;
use comms_if::{pos::CartesianPosition, tc::Command};
use util::maths::{lin_map, quadratic_roots};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A drawing in its own units.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawing {
    points: Vec<DrawingPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawingPoint {
    pub position: [f64; 2],
    pub drawing: bool,
}

/// The rectangle a drawing is scaled into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintingArea {
    /// Bottom left corner
    ///
    /// Units: meters
    pub origin_m: CartesianPosition,

    /// Units: meters
    pub width_m: f64,

    /// Units: meters
    pub height_m: f64,
}

/// Bounding box of a drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DrawingError {
    #[error("Could not read the drawing: {0}")]
    CsvError(csv::Error),

    #[error("Point {0} of the drawing is not finite")]
    NonFinitePoint(usize),

    #[error("The drawing contains no points")]
    Empty,

    #[error("The drawing has no extent in {0}, cannot compute its aspect ratio")]
    DegenerateExtent(&'static str),

    #[error("No printing area with aspect ratio {0} fits the robot's workspace")]
    NoPrintingArea(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Drawing {
    /// Load a drawing from a headerless CSV file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DrawingError> {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .trim(Trim::All)
            .from_path(path)
            .map_err(DrawingError::CsvError)?;

        Self::from_csv(reader)
    }

    /// Read a drawing from headerless CSV data.
    pub fn from_reader<R: io::Read>(rdr: R) -> Result<Self, DrawingError> {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .trim(Trim::All)
            .from_reader(rdr);

        Self::from_csv(reader)
    }

    fn from_csv<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self, DrawingError> {
        let mut points = Vec::new();

        for (i, row) in reader.deserialize().enumerate() {
            let (x, y, drawing): (f64, f64, String) = row.map_err(DrawingError::CsvError)?;

            if !(x.is_finite() && y.is_finite()) {
                return Err(DrawingError::NonFinitePoint(i));
            }

            points.push(DrawingPoint {
                position: [x, y],
                drawing: drawing == "true",
            });
        }

        if points.is_empty() {
            return Err(DrawingError::Empty);
        }

        debug!("Loaded drawing of {} points", points.len());

        Ok(Self { points })
    }

    pub fn points(&self) -> &[DrawingPoint] {
        &self.points
    }

    pub fn extent(&self) -> Extent {
        let mut extent = Extent {
            min: [f64::INFINITY; 2],
            max: [f64::NEG_INFINITY; 2],
        };

        for p in &self.points {
            for i in 0..2 {
                extent.min[i] = extent.min[i].min(p.position[i]);
                extent.max[i] = extent.max[i].max(p.position[i]);
            }
        }

        extent
    }

    /// Scale the drawing into the printing area of the given robot and
    /// convert each point into a move command.
    pub fn to_commands(&self, config: &RobotConfig) -> Result<Vec<Command>, DrawingError> {
        let extent = self.extent();

        let width = extent.max[0] - extent.min[0];
        let height = extent.max[1] - extent.min[1];

        if width <= 0.0 {
            return Err(DrawingError::DegenerateExtent("x"));
        }
        if height <= 0.0 {
            return Err(DrawingError::DegenerateExtent("y"));
        }

        let area = PrintingArea::fit(config, height / width)?;
        debug!("Printing area: {:?}", area);

        let x_range = (area.origin_m.x, area.origin_m.x + area.width_m);
        let y_range = (area.origin_m.y, area.origin_m.y + area.height_m);

        Ok(self
            .points
            .iter()
            .map(|p| {
                Command::new(
                    lin_map((extent.min[0], extent.max[0]), x_range, p.position[0]),
                    lin_map((extent.min[1], extent.max[1]), y_range, p.position[1]),
                    p.drawing,
                )
            })
            .collect())
    }
}

impl PrintingArea {
    /// Find the largest rectangle with the given aspect ratio (height over
    /// width) which fits the robot's workspace.
    ///
    /// With `d = |la - lb|` and `L = la + lb`, the bottom edge sits at
    /// `y = d` and the top left corner must lie on the circle of radius `L`
    /// about the right motor:
    ///
    /// ```text
    /// ((w + lc) / 2)^2 + (d + w r)^2 = L^2
    /// ```
    ///
    /// which is a quadratic in the width `w`.
    pub fn fit(config: &RobotConfig, ratio: f64) -> Result<Self, DrawingError> {
        let la = config.base_arm_length_m;
        let lb = config.link_arm_length_m;
        let lc = config.motor_distance_m;

        let d = (la - lb).abs();
        let l = la + lb;

        let a = 0.25 + ratio.powi(2);
        let b = 0.5 * lc + 2.0 * d * ratio;
        let c = 0.25 * lc.powi(2) + d.powi(2) - l.powi(2);

        // c < 0 is needed for a positive root
        let width_m = match quadratic_roots(a, b, c) {
            Some((w, _)) if c < 0.0 && w > 0.0 && ratio.is_finite() => w,
            _ => return Err(DrawingError::NoPrintingArea(ratio)),
        };

        Ok(Self {
            origin_m: CartesianPosition::new(0.5 * (lc - width_m), d) + config.tcp_offset(),
            width_m,
            height_m: width_m * ratio,
        })
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
