//! Grid characteristics and interpolation.

use crate::authoring::*;
use std::{fmt::Debug, io::BufRead};

pub trait Grid: Debug + Sync + Send {
    fn bands(&self) -> usize;

    /// Returns true if `coord` is contained by `self` or lies within a margin of
    /// `margin` grid cell units. Typically `margin` should be on the order of 1
    fn contains(&self, coord: &Coor4D, margin: f64) -> bool;

    /// Returns `None` if the grid does not contain the point, in the
    /// sense of the `contains` method
    fn at(&self, at: &Coor4D, margin: f64) -> Option<Coor4D>;
}

/// Grid characteristics and interpolation.
///
/// In principle grid format agnostic, but includes a parser for
/// geodetic grids in the Gravsoft format. Angular boundaries are
/// stored in radians.
#[derive(Debug, Default, Clone)]
pub struct BaseGrid {
    pub name: String,
    pub lat_n: f64, // Latitude of the first (typically northernmost) row of the grid
    pub lat_s: f64, // Latitude of the last (typically southernmost) row of the grid
    pub lon_w: f64, // Longitude of the first (typically westernmost) column of each row
    pub lon_e: f64, // Longitude of the last (typically easternmost) column of each row
    pub dlat: f64,  // Signed distance between two consecutive rows
    pub dlon: f64,  // Signed distance between two consecutive columns
    pub rows: usize,
    pub cols: usize,
    pub bands: usize,
    pub grid: Vec<f32>,
}

impl Grid for BaseGrid {
    fn bands(&self) -> usize {
        self.bands
    }

    /// Determine whether a given coordinate falls within the grid boundaries + margin.
    /// "On the boundary" qualifies as within.
    fn contains(&self, position: &Coor4D, margin: f64) -> bool {
        let (lon, lat) = position.xy();
        if lon.is_nan() || lat.is_nan() {
            return false;
        }

        // We start by assuming that the last row (latitude) is the southernmost
        let mut lat_min = self.lat_s;
        let mut lat_max = self.lat_n;
        // If it's not, we swap
        if self.dlat > 0. {
            (lat_min, lat_max) = (lat_max, lat_min);
        }

        let lat_grace = margin * self.dlat.abs();
        if lat < lat_min - lat_grace || lat > lat_max + lat_grace {
            return false;
        }

        // The default assumption is the other way round for columns (longitudes)
        let mut lon_min = self.lon_w;
        let mut lon_max = self.lon_e;
        if self.dlon < 0. {
            (lon_min, lon_max) = (lon_max, lon_min);
        }

        let lon_grace = margin * self.dlon.abs();
        !(lon < lon_min - lon_grace || lon > lon_max + lon_grace)
    }

    // Since we store the entire grid in a single vector, the interpolation
    // routine here looks strongly like a case of "writing Fortran 77 in Rust".
    // It is, however, one of the cases where a more extensive use of abstractions
    // leads to a significantly larger code base, much harder to maintain and
    // comprehend.
    fn at(&self, at: &Coor4D, margin: f64) -> Option<Coor4D> {
        if !self.contains(at, margin) {
            return None;
        };

        // Top-to-bottom, left-to-right scan order only
        let dlat = self.dlat.abs();
        let dlon = self.dlon.abs();

        // The interpolation coordinate relative to the grid origin
        let rlon = at[0] - self.lon_w;
        let rlat = self.lat_n - at[1];

        // The (row, column) of the lower left node of the grid cell containing
        // the interpolation coordinate - or, in the case of extrapolation:
        // the nearest cell inside the grid.
        let row = (rlat / dlat).ceil() as i64;
        let col = (rlon / dlon).floor() as i64;

        let col = col.clamp(0_i64, (self.cols - 2) as i64) as usize;
        let row = row.clamp(1_i64, (self.rows - 1) as i64) as usize;

        // Index of the first band element of each corner value
        #[rustfmt::skip]
        let (ll, lr, ul, ur) = (
            self.bands * (self.cols *  row      + col    ),
            self.bands * (self.cols *  row      + col + 1),
            self.bands * (self.cols * (row - 1) + col    ),
            self.bands * (self.cols * (row - 1) + col + 1),
        );

        let ll_lon = self.lon_w + col as f64 * dlon;
        let ll_lat = self.lat_n - row as f64 * dlat;

        // Cell relative, cell unit coordinates in a right handed CS
        let rlon = (at[0] - ll_lon) / dlon;
        let rlat = (at[1] - ll_lat) / dlat;

        // We cannot return more than 4 bands in a Coor4D,
        // so we ignore any exceeding bands
        let maxbands = self.bands.min(4);

        // Interpolate (or extrapolate, if we're outside of the physical grid)
        let mut result = Coor4D::origin();
        for i in 0..maxbands {
            let left = (1. - rlat) * self.grid[ll + i] as f64 + rlat * self.grid[ul + i] as f64;
            let right = (1. - rlat) * self.grid[lr + i] as f64 + rlat * self.grid[ur + i] as f64;
            result[i] = (1. - rlon) * left + rlon * right;
        }

        Some(result)
    }
}

impl BaseGrid {
    /// A grid from a plain header, `[lat_n, lat_s, lon_w, lon_e, dlat, dlon, bands]`,
    /// and the grid values in row major order, north to south and west to east
    pub fn new(name: &str, header: &[f64], grid: &[f32]) -> Result<Self, Error> {
        if header.len() < 7 {
            return Err(Error::General("Malformed header"));
        }

        let lat_n = header[0];
        let lat_s = header[1];
        let lon_w = header[2];
        let lon_e = header[3];

        let dlat = header[4].copysign(lat_s - lat_n);
        let dlon = header[5].copysign(lon_e - lon_w);

        let bands = header[6] as usize;
        let rows = ((lat_s - lat_n) / dlat + 1.5).floor() as usize;
        let cols = ((lon_e - lon_w) / dlon + 1.5).floor() as usize;
        let elements = rows * cols * bands;

        if elements == 0 || rows < 2 || cols < 2 || elements > grid.len() || bands < 1 {
            return Err(Error::General("Malformed grid"));
        }

        Ok(BaseGrid {
            name: name.to_string(),
            lat_n,
            lat_s,
            lon_w,
            lon_e,
            dlat,
            dlon,
            rows,
            cols,
            bands,
            grid: Vec::from(grid),
        })
    }

    pub fn gravsoft(name: &str, buf: &[u8]) -> Result<Self, Error> {
        let (header, grid) = gravsoft_grid_reader(buf)?;
        BaseGrid::new(name, &header, &grid)
    }
}

// If the Gravsoft grid appears to be in angular units, convert the header to radians.
// Geoid grid values are in meters, and stay that way
fn normalize_gravsoft_grid_values(header: &mut [f64]) {
    // If any boundary is outside of [-720; 720], the grid must (by a wide margin) be
    // in projected coordinates, so we simply return
    if header.iter().take(4).any(|h| h.abs() > 720.0) {
        return;
    }

    for h in header.iter_mut().take(6) {
        *h = h.to_radians();
    }
}

// Read a gravsoft geoid grid. Discard '#'-style comments
pub fn gravsoft_grid_reader(buf: &[u8]) -> Result<(Vec<f64>, Vec<f32>), Error> {
    let all = std::io::BufReader::new(buf);
    let mut grid = Vec::<f32>::new();
    let mut header = Vec::<f64>::new();

    for line in all.lines() {
        let line = line?;
        let line = line.split('#').next().unwrap_or_default();
        for item in line.split_whitespace() {
            let Ok(value) = item.parse::<f64>() else {
                return Err(Error::Syntax(format!("Gravsoft grid: cannot parse '{item}'")));
            };
            // In Gravsoft grids, the header is the first 6 numbers of the file
            if header.len() < 6 {
                header.push(value);
            } else {
                grid.push(value as f32);
            }
        }
    }

    if header.len() < 6 {
        return Err(Error::General("Incomplete Gravsoft header"));
    }

    // The Gravsoft header has lat_s before lat_n
    header.swap(0, 1);

    let lat_n = header[0];
    let lat_s = header[1];
    let lon_w = header[2];
    let lon_e = header[3];

    // The Gravsoft header has inverted sign for dlat. We force
    // the two deltas to have signs compatible with the grid
    // organization
    let dlat = header[4].copysign(lat_s - lat_n);
    let dlon = header[5].copysign(lon_e - lon_w);
    let rows = ((lat_s - lat_n) / dlat + 1.5).floor() as usize;
    let cols = ((lon_e - lon_w) / dlon + 1.5).floor() as usize;
    if rows * cols == 0 {
        return Err(Error::General("Malformed Gravsoft header"));
    }

    let bands = grid.len() / (rows * cols);
    if bands < 1 {
        return Err(Error::General("Incomplete Gravsoft grid"));
    }
    if (rows * cols * bands) != grid.len() {
        return Err(Error::General(
            "Unrecognized material at end of Gravsoft grid",
        ));
    }
    if bands != 1 {
        return Err(Error::General(
            "Only single band (geoid) Gravsoft grids are supported",
        ));
    }

    header.push(bands as f64);
    normalize_gravsoft_grid_values(&mut header);
    Ok((header, grid))
}

/// Find the most appropriate grid value from a stack (i.e. slice) of grids.
/// Search the grids in slice order and return the first hit.
/// If no hits are found, try once more, this time adding a half grid-cell
/// margin around each grid
pub fn grids_at(grids: &[Arc<BaseGrid>], coord: &Coor4D) -> Option<Coor4D> {
    for margin in [0.0, 0.5] {
        for grid in grids.iter() {
            let d = grid.at(coord, margin);
            if d.is_some() {
                return d;
            }
        }
    }
    None
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    // A synthetic geoid model over Iberia and the Balearic islands:
    // N = 10 + lat - 0.1 lon (degrees in, meters out), sampled on a
    // 1 degree grid, so bilinear interpolation reproduces it exactly
    pub(crate) fn synthetic_geoid(name: &str) -> Result<BaseGrid, Error> {
        let header = [
            45_f64.to_radians(),
            35_f64.to_radians(),
            (-10_f64).to_radians(),
            5_f64.to_radians(),
            1_f64.to_radians(),
            1_f64.to_radians(),
            1.,
        ];
        let mut grid = Vec::new();
        for row in 0..11 {
            let lat = 45. - row as f64;
            for col in 0..16 {
                let lon = -10. + col as f64;
                grid.push(synthetic_undulation(lon, lat) as f32);
            }
        }
        BaseGrid::new(name, &header, &grid)
    }

    pub(crate) fn synthetic_undulation(lon: f64, lat: f64) -> f64 {
        10. + lat - 0.1 * lon
    }

    #[test]
    fn interpolation() -> Result<(), Error> {
        let geoid = synthetic_geoid("test")?;
        assert_eq!(geoid.rows, 11);
        assert_eq!(geoid.cols, 16);

        let c = Coor4D::gis(-8.380627694, 43.326214300, 0., 0.);
        assert!(geoid.contains(&c, 0.0));
        let n = geoid.at(&c, 0.0).ok_or(Error::General("outside"))?;
        assert_float_eq!(n[0], synthetic_undulation(-8.380627694, 43.326214300), abs <= 1e-4);

        // Outside, but within the margin
        let c = Coor4D::gis(5.25, 39.5, 0., 0.);
        assert!(!geoid.contains(&c, 0.0));
        assert!(geoid.contains(&c, 0.5));
        assert!(geoid.at(&c, 0.0).is_none());
        assert!(grids_at(&[Arc::new(geoid.clone())], &c).is_some());

        // Far outside
        let c = Coor4D::gis(12., 55., 0., 0.);
        assert!(grids_at(&[Arc::new(geoid)], &c).is_none());
        Ok(())
    }

    #[test]
    fn gravsoft() -> Result<(), Error> {
        // lat_s lat_n lon_w lon_e dlat dlon, then rows from north to south
        let text = "
            # A tiny geoid
            36 37 -5 -3 1 1
            47.9 48.0 48.1
            46.9 47.0 47.1
        ";
        let grid = BaseGrid::gravsoft("tiny", text.as_bytes())?;
        assert_eq!(grid.rows, 2);
        assert_eq!(grid.cols, 3);
        assert_float_eq!(grid.lat_n, 37_f64.to_radians(), abs <= 1e-15);
        let n = grid
            .at(&Coor4D::gis(-4., 36.5, 0., 0.), 0.)
            .ok_or(Error::General("outside"))?;
        assert_float_eq!(n[0], 47.5, abs <= 1e-5);

        assert!(BaseGrid::gravsoft("bad", b"36 37 -5 -3 1 1 47.9 48.0").is_err());
        assert!(BaseGrid::gravsoft("bad", b"36 37 -5 -3 1 foo").is_err());
        Ok(())
    }
}
