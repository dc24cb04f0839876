use crate::authoring::*;
pub mod coor4d;
pub mod set;

/// Methods for changing the representation of angles. The methods operate
/// on the first two elements of a coordinate tuple only.
pub trait AngularUnits {
    /// Transform the first two elements of a coordinate tuple from degrees to radians
    #[must_use]
    fn to_radians(self) -> Self;

    /// Transform the first two elements of a coordinate tuple from radians to degrees
    #[must_use]
    fn to_degrees(self) -> Self;

    /// Transform the internal lon/lat(/h/t)-in-radians to lat/lon(/h/t)-in-degrees
    #[must_use]
    fn to_geo(self) -> Self;
}
