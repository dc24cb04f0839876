//! Resolution of coordinate reference system identifiers into transformation
//! pipelines, and application of those pipelines to named point sets.
//!
//! Three kinds of CRS identifiers are understood:
//!
//! - Plain authority codes, e.g. `EPSG:25830`
//! - Compound horizontal+vertical codes, e.g. `EPSG:25830+5782`
//! - Local tangent plane frames anchored at a caller supplied origin,
//!   e.g. `ENU:EPSG:4937;-4.495021180808;36.756413127079;142.1590`
//!
//! The geodetic heavy lifting is done by a small operator engine, where
//! transformations are written as pipelines of elementary steps
//! (`cart ellps=intl | helmert x=-87 y=-98 z=-121`), instantiated through
//! a [`Context`](crate::context::Context), and applied to anything
//! implementing [`CoordinateSet`](crate::coordinate::set::CoordinateSet).
//!
//! ```
//! use crstools::prelude::*;
//! # fn main() -> Result<(), Error> {
//! let tools = CrsTools::new(Minimal::new());
//! tools.initialize(true)?;
//!
//! let (mut x, mut y, mut z) = (-8.380627694, 43.326214300, 70.097);
//! tools.crs_operation("EPSG:4937", "EPSG:25830", &mut x, &mut y, &mut z)?;
//! assert!((x - 63723.324).abs() < 1e-3);
//! assert!((y - 4811118.823).abs() < 1e-3);
//! # Ok(())
//! # }
//! ```

/// The bread-and-butter, shrink-wrapped and ready to use
pub mod prelude {
    pub use crate::context::CatalogEntry;
    pub use crate::context::Context;
    pub use crate::context::CrsClass;
    #[cfg(feature = "with_plain")]
    pub use crate::context::Plain;
    pub use crate::context::Minimal;
    pub use crate::coordinate::coor4d::Coor4D;
    pub use crate::coordinate::set::CoordinateSet;
    pub use crate::coordinate::AngularUnits;
    pub use crate::crs::CrsDescriptor;
    pub use crate::ellipsoid::Ellipsoid;
    pub use crate::executor::BatchReport;
    pub use crate::executor::PointRecord;
    pub use crate::op::OpHandle;
    pub use crate::pipeline::PipelineBuilder;
    pub use crate::pipeline::StepKind;
    pub use crate::pipeline::TransformationPipeline;
    pub use crate::registry::CrsInfo;
    pub use crate::registry::Registry;
    pub use crate::tools::CrsTools;
    pub use crate::Direction;
    pub use crate::Direction::Fwd;
    pub use crate::Direction::Inv;
    pub use crate::Error;
}

/// Preamble for crate-internal modules, and authoring of user defined operators
pub mod authoring {
    pub use crate::prelude::*;

    pub use crate::grid::BaseGrid;
    pub use crate::inner_op::InnerOp;
    pub use crate::inner_op::OpConstructor;
    pub use crate::op::Op;
    pub use crate::op::OpDescriptor;
    pub use crate::op::OpParameter;
    pub use crate::op::ParsedParameters;
    pub use crate::op::RawParameters;
    pub use crate::token::Tokenize;

    pub use crate::math::angular;
    pub use crate::math::fourier;
    pub use crate::math::gudermannian;
    pub use crate::math::taylor;
    pub use crate::math::FourierCoefficients;
    pub use crate::math::PolynomialCoefficients;

    pub use log::debug;
    pub use log::error;
    pub use log::info;
    pub use log::trace;
    pub use log::warn;

    pub use std::collections::BTreeMap;
    pub use std::sync::Arc;

    // Test material
    #[cfg(test)]
    pub use float_eq::assert_float_eq;
}

pub mod context;
pub mod coordinate;
pub mod crs;
pub mod ellipsoid;
pub mod executor;
pub mod grid;
pub mod inner_op;
pub mod math;
pub mod op;
pub mod pipeline;
pub mod precision;
pub mod registry;
pub mod token;
pub mod tools;

use thiserror::Error;

/// Errors from the operator engine and from CRS resolution
#[derive(Error, Debug)]
pub enum Error {
    #[error("i/o error")]
    Io(#[from] std::io::Error),

    #[error("General error: '{0}'")]
    General(&'static str),

    #[error("Syntax error: '{0}'")]
    Syntax(String),

    #[error("{0}: {1}")]
    Operator(&'static str, &'static str),

    #[error("Invalid CRS identifier: '{0}'")]
    InvalidFormat(String),

    #[error("The CRS registry has not been initialized")]
    NotInitialized,

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Unknown CRS: '{0}'")]
    UnknownCrs(String),

    #[error("Deprecated CRS: '{0}'")]
    DeprecatedCrs(String),

    #[error("Invalid compound CRS: {0}")]
    InvalidCompound(String),

    #[error("A 3D coordinate is needed: {0}")]
    IncompatibleDimensionality(String),

    #[error("Geodesy provider error: {0}")]
    Provider(String),

    #[error("Transformation failed: {0}")]
    TransformFailure(String),

    #[error("{0} not found{1}")]
    NotFound(String, String),

    #[error("Recursion too deep for {0}, at {1}")]
    Recursion(String, String),

    #[error("Attempt to invert a non-invertible item: {0}")]
    NonInvertible(String),

    #[error("Missing required parameter '{0}'")]
    MissingParam(String),

    #[error("Malformed value for parameter '{0}': {1}")]
    BadParam(String, String),
}

/// `Fwd`: Indicate that a two-way operator, function, or method,
/// should run in the *forward* direction.
/// `Inv`: Indicate that a two-way operator, function, or method,
/// should run in the *inverse* direction.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Direction {
    Fwd,
    Inv,
}
