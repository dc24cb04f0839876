//! The caller facing API: a provider context, the registry built from its
//! catalog, and a pipeline builder, bundled together.

use crate::authoring::*;
use crate::executor::{transform_batch, transform_one};
use crate::precision::enu_identifier;
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// CRS services on top of the provider context `C`.
///
/// ```
/// use crstools::prelude::*;
/// # fn main() -> Result<(), Error> {
/// let tools = CrsTools::new(Minimal::new());
/// tools.initialize(true)?;
/// assert_eq!(tools.crs_precision("EPSG:25830")?, (3, 4));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CrsTools<C: Context> {
    ctx: Mutex<C>,
    registry: Registry,
    builder: PipelineBuilder,
}

impl<C: Context> CrsTools<C> {
    pub fn new(ctx: C) -> CrsTools<C> {
        CrsTools {
            ctx: Mutex::new(ctx),
            registry: Registry::new(),
            builder: PipelineBuilder::new(),
        }
    }

    /// Read the provider catalog into the registry. Must be called before
    /// anything else. Only the first successful call has any effect
    pub fn initialize(&self, ignore_deprecated: bool) -> Result<(), Error> {
        let ctx = self.context()?;
        self.registry.initialize(&*ctx, ignore_deprecated)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Exclusive access to the provider context, e.g. for registering grids
    pub fn context(&self) -> Result<MutexGuard<'_, C>, Error> {
        self.ctx
            .lock()
            .map_err(|_| Error::General("CrsTools: context poisoned"))
    }

    /// The (cached) pipeline from `source` to `target`
    pub fn pipeline(&self, source: &str, target: &str) -> Result<TransformationPipeline, Error> {
        let mut ctx = self.context()?;
        self.builder
            .build(&self.registry, &mut *ctx, source, target)
    }

    // ----- Transformations ----------------------------------------------------------

    /// Transform a single 3D point in place
    pub fn crs_operation(
        &self,
        source: &str,
        target: &str,
        x: &mut f64,
        y: &mut f64,
        z: &mut f64,
    ) -> Result<(), Error> {
        let pipeline = self.pipeline(source, target)?;
        let ctx = self.context()?;
        let result = transform_one(&*ctx, &pipeline, &PointRecord::new_3d(*x, *y, *z))?;
        (*x, *y) = (result.x, result.y);
        *z = result.z.unwrap_or(*z);
        Ok(())
    }

    /// Transform a single 2D point in place
    pub fn crs_operation_2d(
        &self,
        source: &str,
        target: &str,
        x: &mut f64,
        y: &mut f64,
    ) -> Result<(), Error> {
        let pipeline = self.pipeline(source, target)?;
        let ctx = self.context()?;
        let result = transform_one(&*ctx, &pipeline, &PointRecord::new_2d(*x, *y))?;
        (*x, *y) = (result.x, result.y);
        Ok(())
    }

    /// Transform `points` in place. Failing points are left untouched, and
    /// listed in the report. With `log_errors`, they are also logged
    pub fn crs_operation_batch(
        &self,
        source: &str,
        target: &str,
        points: &mut BTreeMap<String, PointRecord>,
        log_errors: bool,
    ) -> Result<BatchReport, Error> {
        let pipeline = self.pipeline(source, target)?;
        let ctx = self.context()?;
        let report = transform_batch(&*ctx, &pipeline, points, true);
        if log_errors {
            for (id, message) in &report.errors {
                error!("{source} -> {target}, point {id}: {message}");
            }
        }
        Ok(report)
    }

    /// The identifier of the topocentric frame with its origin at the point
    /// `(x, y, z)` in `crs`, expressed in the geographic base CRS of `crs`
    pub fn crs_enu(&self, crs: &str, x: f64, y: f64, z: f64) -> Result<String, Error> {
        let base = self.registry.base_of(crs)?;
        let (mut lon, mut lat, mut h) = (x, y, z);
        self.crs_operation(crs, &base, &mut lon, &mut lat, &mut h)?;
        Ok(enu_identifier(&base, lon, lat, h))
    }

    // ----- Registry queries ---------------------------------------------------------

    pub fn crs_precision(&self, crs: &str) -> Result<(usize, usize), Error> {
        self.registry.precision_of(crs)
    }

    pub fn crs_info(&self) -> Result<Vec<CrsInfo>, Error> {
        self.registry.all_crs_info()
    }

    pub fn crs_for_2d_applications(&self) -> Result<Vec<CrsInfo>, Error> {
        self.registry.crs_for_2d_applications()
    }

    /// The vertical CRS which can be combined with `horizontal`
    pub fn crs_vertical(&self, horizontal: &str) -> Result<Vec<CrsInfo>, Error> {
        let ctx = self.context()?;
        self.registry.vertical_crs_compatible_with(&*ctx, horizontal)
    }

    /// Write the registry contents to `path`, as `;`-separated text
    pub fn dump_crs_info_to_file(&self, path: &Path) -> Result<(), Error> {
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        writeln!(file, "id;auth_name;code;type;name;projection_method_name;area_name;")?;
        for info in self.registry.all_crs_info()? {
            writeln!(
                file,
                "{};{};{};{};{};{};{};",
                info.code,
                info.auth_name,
                info.code_number,
                info.class.type_name(),
                info.name,
                info.projection_method,
                info.area
            )?;
        }
        file.flush()?;
        Ok(())
    }

    /// For a projected CRS: the compound identifier making its heights
    /// explicitly ellipsoidal, `<crs>+<code of the 3D geographic base>`.
    /// Empty for everything else
    pub fn crs_id_ellipsoid_heights_for_pdal(&self, crs: &str) -> Result<String, Error> {
        let CrsDescriptor::Plain { code } = CrsDescriptor::parse(crs)? else {
            return Ok(String::new());
        };
        let info = self.registry.lookup(&code)?;
        if !info.is_projected() {
            return Ok(String::new());
        }

        let base = self.registry.lookup(&info.base)?;
        let base = self
            .registry
            .all_crs_info()?
            .into_iter()
            .find(|i| i.class == CrsClass::Geographic3D && i.datum == base.datum && !i.deprecated)
            .unwrap_or(base);
        Ok(format!("{code}+{}", base.code_number))
    }
}

// ----- T E S T S ---------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::*;

    fn tools() -> Result<CrsTools<Minimal>, Error> {
        let tools = CrsTools::new(Minimal::new());
        tools.initialize(true)?;
        Ok(tools)
    }

    #[test]
    fn operations() -> Result<(), Error> {
        let tools = tools()?;
        let (_, lon, lat, h) = SPANISH_CONTROL_POINTS[0];

        let (mut x, mut y, mut z) = (lon, lat, h);
        tools.crs_operation("EPSG:4937", "EPSG:25830", &mut x, &mut y, &mut z)?;
        assert_float_eq!(x, 63723.324, abs <= 5e-4);
        assert_float_eq!(y, 4811118.823, abs <= 5e-4);
        assert_float_eq!(z, 70.097, abs <= 5e-4);

        let (mut x, mut y) = (lon, lat);
        tools.crs_operation_2d("EPSG:4258", "EPSG:25830", &mut x, &mut y)?;
        assert_float_eq!(x, 63723.324, abs <= 5e-4);

        let (mut x, mut y) = (lon, lat);
        assert!(matches!(
            tools.crs_operation_2d("EPSG:4258", "EPSG:4936", &mut x, &mut y),
            Err(Error::IncompatibleDimensionality(_))
        ));
        // Untouched on failure
        assert_eq!((x, y), (lon, lat));
        Ok(())
    }

    #[test]
    fn batch() -> Result<(), Error> {
        let tools = tools()?;
        let mut points = BTreeMap::new();
        for (id, lon, lat, _) in SPANISH_CONTROL_POINTS {
            points.insert(id.to_string(), PointRecord::new_2d(lon, lat));
        }
        let report = tools.crs_operation_batch("EPSG:4258", "EPSG:25830", &mut points, true)?;
        assert_eq!(report.succeeded, 5);
        assert!(report.error_text().is_empty());
        assert_float_eq!(points["1013"].x, 988552.725, abs <= 1e-3);
        Ok(())
    }

    #[test]
    fn enu() -> Result<(), Error> {
        let tools = tools()?;
        let (mut x, mut y, mut z) = (-4.495021180808, 36.756413127079, 142.1590);
        tools.crs_operation("EPSG:4258", "EPSG:25830", &mut x, &mut y, &mut z)?;
        let id = tools.crs_enu("EPSG:25830", x, y, z)?;
        assert_eq!(id, "ENU:4258;-4.495021181;36.756413127;142.1590");

        // The origin of the frame is its own origin
        let (mut e, mut n, mut u) = (-4.495021180808, 36.756413127079, 142.1590);
        tools.crs_operation("EPSG:4258", &id, &mut e, &mut n, &mut u)?;
        assert!(e.hypot(n).hypot(u) < 1e-3);
        Ok(())
    }

    #[test]
    fn queries() -> Result<(), Error> {
        let tools = tools()?;
        assert_eq!(tools.crs_precision("EPSG:4937")?, (9, 4));
        assert_eq!(tools.crs_info()?.len(), 23);
        assert!(tools.crs_for_2d_applications()?.len() < 23);

        let vertical: Vec<String> = tools
            .crs_vertical("EPSG:25830")?
            .into_iter()
            .map(|i| i.code)
            .collect();
        for code in ["EPSG:5782", "EPSG:9392", "EPSG:9393"] {
            assert!(vertical.contains(&code.to_string()));
        }

        assert_eq!(
            tools.crs_id_ellipsoid_heights_for_pdal("EPSG:25830")?,
            "EPSG:25830+4937"
        );
        assert_eq!(
            tools.crs_id_ellipsoid_heights_for_pdal("EPSG:32630")?,
            "EPSG:32630+4979"
        );
        // No geographic 3D ED50 in the catalog
        assert_eq!(
            tools.crs_id_ellipsoid_heights_for_pdal("EPSG:23030")?,
            "EPSG:23030+4230"
        );
        for crs in ["EPSG:4937", "EPSG:4936", "EPSG:25830+5782", "ENU:4937;0;0;0"] {
            assert!(tools.crs_id_ellipsoid_heights_for_pdal(crs)?.is_empty());
        }
        Ok(())
    }

    #[test]
    fn uninitialized() {
        let tools = CrsTools::new(Minimal::new());
        let (mut x, mut y) = (0., 0.);
        assert!(matches!(
            tools.crs_operation_2d("EPSG:4258", "EPSG:25830", &mut x, &mut y),
            Err(Error::NotInitialized)
        ));
        assert!(matches!(tools.crs_info(), Err(Error::NotInitialized)));
    }
}
