//! Application of transformation pipelines to single points and to
//! batches of named points.

use crate::authoring::*;
use std::fmt;

/// A named 2D or 3D coordinate tuple. For geographic CRS, `x` is the
/// longitude and `y` the latitude, in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointRecord {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl PointRecord {
    pub fn new_2d(x: f64, y: f64) -> PointRecord {
        PointRecord { x, y, z: None }
    }

    pub fn new_3d(x: f64, y: f64, z: f64) -> PointRecord {
        PointRecord { x, y, z: Some(z) }
    }

    pub fn is_3d(&self) -> bool {
        self.z.is_some()
    }
}

impl fmt::Display for PointRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.z {
            Some(z) => write!(f, "{} {} {z}", self.x, self.y),
            None => write!(f, "{} {}", self.x, self.y),
        }
    }
}

/// The outcome of a batch transformation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub succeeded: usize,
    /// Point id and error message, in batch order
    pub errors: Vec<(String, String)>,
    /// The transformed points
    pub transformed: BTreeMap<String, PointRecord>,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    /// All errors, one per line
    pub fn error_text(&self) -> String {
        self.errors
            .iter()
            .map(|(id, message)| format!("{id}: {message}\n"))
            .collect()
    }
}

// ----- T H E   E X E C U T O R -------------------------------------------------------

/// Transform `point` by applying each step of `pipeline` in order.
/// A 2D point is accepted only if no end point of the pipeline needs a
/// height. A 3D point stays 3D, even when the target CRS is 2D: the
/// height is carried through as an ellipsoidal height
pub fn transform_one(
    ctx: &dyn Context,
    pipeline: &TransformationPipeline,
    point: &PointRecord,
) -> Result<PointRecord, Error> {
    if point.z.is_none() && pipeline.requires_3d() {
        return Err(Error::IncompatibleDimensionality(format!(
            "{} -> {}",
            pipeline.source(),
            pipeline.target()
        )));
    }

    let mut work = [Coor4D::raw(point.x, point.y, point.z.unwrap_or(0.), 0.)];
    for step in pipeline.steps() {
        let successes = ctx
            .apply(step.op, Fwd, &mut work)
            .map_err(|e| Error::TransformFailure(format!("{step}: {e}")))?;
        if successes != 1 || work[0].is_nan() {
            return Err(Error::TransformFailure(step.to_string()));
        }
    }

    let (x, y, z) = work[0].xyz();
    Ok(PointRecord {
        x,
        y,
        z: point.z.map(|_| z),
    })
}

/// Transform all `points`, in map order. Failing points are reported,
/// and do not stop the batch. With `mutate_in_place`, the successfully
/// transformed points are updated in `points`, while the failing ones
/// are left untouched
pub fn transform_batch(
    ctx: &dyn Context,
    pipeline: &TransformationPipeline,
    points: &mut BTreeMap<String, PointRecord>,
    mutate_in_place: bool,
) -> BatchReport {
    let mut report = BatchReport::default();
    for (id, point) in points.iter_mut() {
        match transform_one(ctx, pipeline, point) {
            Ok(result) => {
                if mutate_in_place {
                    *point = result;
                }
                report.transformed.insert(id.clone(), result);
                report.succeeded += 1;
            }
            Err(e) => {
                debug!("{id}: {e}");
                report.errors.push((id.clone(), e.to_string()));
            }
        }
    }
    report
}

// ----- T E S T S ---------------------------------------------------------------------
