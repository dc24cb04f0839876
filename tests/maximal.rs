use crstools::authoring::*;
use crstools::context::{parse_catalog, BUILTIN_ADAPTORS};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

// ----- U S E R   P R O V I D E D   C O N T E X T ----------------------------------

/// A user provided context, with its own CRS catalog: ETRS89 on the Iberian
/// peninsula, with heights given by the synthetic geoid model in
/// `./crstools/gsa/test_geoid.gsa`.
///
/// Since the integration tests in the "tests" directory of a crate are handled as
/// independent crates, this provider could just as well have been built entirely
/// outside of the crstools source tree.
#[derive(Debug, Default)]
pub struct Maximal {
    /// Constructors for user defined operators
    constructors: BTreeMap<String, OpConstructor>,
    /// User defined resources (macros)
    resources: BTreeMap<String, String>,
    /// Instantiations of operators
    operators: BTreeMap<OpHandle, Op>,
}

const BAD_ID_MESSAGE: Error = Error::General("Maximal: Unknown operator id");

const CATALOG: &str = "
EPSG:4258;  ETRS89;                geographic2d; 0; 9; 4; ETRS89; GRS80; EPSG:4258;;                    Spain; gis:in;                          cart ellps=GRS80
EPSG:4937;  ETRS89;                geographic3d; 0; 9; 4; ETRS89; GRS80; EPSG:4937;;                    Spain; gis:in;                          cart ellps=GRS80
EPSG:25830; ETRS89 / UTM zone 30N; projected;    0; 3; 4; ETRS89; GRS80; EPSG:4258; Transverse Mercator; Spain; utm zone=30 inv ellps=GRS80;     cart ellps=GRS80
EPSG:5782;  Alicante height;       vertical;     0; 3; 4; ETRS89; GRS80; EPSG:4258;;                    Spain; geoid inv grids=test_geoid.gsa;  noop
";

impl Context for Maximal {
    fn new() -> Maximal {
        let mut ctx = Maximal::default();
        for item in BUILTIN_ADAPTORS {
            ctx.register_resource(item.0, item.1);
        }
        ctx
    }

    fn op(&mut self, definition: &str) -> Result<OpHandle, Error> {
        let op = Op::new(definition, self)?;
        let id = op.id;
        self.operators.insert(id, op);
        Ok(id)
    }

    fn apply(
        &self,
        op: OpHandle,
        direction: Direction,
        operands: &mut dyn CoordinateSet,
    ) -> Result<usize, Error> {
        let op = self.operators.get(&op).ok_or(BAD_ID_MESSAGE)?;
        Ok(op.apply(self, operands, direction))
    }

    fn steps(&self, op: OpHandle) -> Result<&Vec<String>, Error> {
        let op = self.operators.get(&op).ok_or(BAD_ID_MESSAGE)?;
        Ok(&op.descriptor.steps)
    }

    fn params(&self, op: OpHandle, index: usize) -> Result<&ParsedParameters, Error> {
        let op = self.operators.get(&op).ok_or(BAD_ID_MESSAGE)?;
        // Leaf level?
        if op.steps.is_empty() {
            if index > 0 {
                return Err(Error::General("Maximal: Bad step index"));
            }
            return Ok(&op.params);
        }

        // Not leaf level
        if index >= op.steps.len() {
            return Err(Error::General("Maximal: Bad step index"));
        }
        Ok(&op.steps[index].params)
    }

    fn globals(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("ellps".to_string(), "GRS80".to_string())])
    }

    fn register_op(&mut self, name: &str, constructor: OpConstructor) {
        self.constructors.insert(String::from(name), constructor);
    }

    fn get_op(&self, name: &str) -> Result<OpConstructor, Error> {
        if let Some(result) = self.constructors.get(name) {
            return Ok(*result);
        }

        Err(Error::NotFound(
            name.to_string(),
            ": User defined constructor".to_string(),
        ))
    }

    fn register_resource(&mut self, name: &str, definition: &str) {
        self.resources
            .insert(String::from(name), String::from(definition));
    }

    fn get_resource(&self, name: &str) -> Result<String, Error> {
        if let Some(result) = self.resources.get(name) {
            return Ok(result.to_string());
        }

        Err(Error::NotFound(
            name.to_string(),
            ": User defined resource".to_string(),
        ))
    }

    fn get_blob(&self, name: &str) -> Result<Vec<u8>, Error> {
        let n = PathBuf::from(name);
        let ext = n
            .extension()
            .unwrap_or_default()
            .to_str()
            .unwrap_or_default();
        let path: PathBuf = [".", "crstools", ext, name].iter().collect();
        Ok(std::fs::read(path)?)
    }

    /// Access grid resources by identifier
    fn get_grid(&self, name: &str) -> Result<Arc<BaseGrid>, Error> {
        let buf = self.get_blob(name)?;
        Ok(Arc::new(BaseGrid::gravsoft(name, &buf)?))
    }

    fn catalog(&self) -> Result<Vec<CatalogEntry>, Error> {
        parse_catalog(CATALOG)
    }
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::Maximal;
    use crstools::authoring::*;
    use std::collections::BTreeMap;

    // Longitude, latitude, ellipsoidal height
    const POINTS: [(&str, f64, f64, f64); 5] = [
        ("1001", -8.380627694, 43.326214300, 70.097),
        ("1003", -1.955086196, 39.003867259, 750.786),
        ("1012", -4.443571654, 36.684036053, 117.310),
        ("1015", -5.443845659, 40.913368096, 861.337),
        // Tenerife, outside of the geoid model
        ("2001", -16.5, 28.3, 100.0),
    ];

    fn undulation(lon: f64, lat: f64) -> f64 {
        10. + lat - 0.1 * lon
    }

    // Test that the fundamental tokenization functionality also works
    // outside of the library
    #[test]
    fn token() -> Result<(), Error> {
        assert_eq!(
            "EPSG:4937 |  EPSG:25830+5782  inv".normalize(),
            "EPSG:4937|EPSG:25830+5782 inv"
        );
        assert_eq!("EPSG:4937 | EPSG:25830 inv".split_into_steps().0[1], "EPSG:25830 inv");
        assert!("EPSG:25830+5782".is_resource_name());
        assert_eq!("geoid inv grids=a.gsa".operator_name(""), "geoid");
        Ok(())
    }

    #[test]
    fn maximal() -> Result<(), Error> {
        let tools = CrsTools::new(Maximal::new());
        tools.initialize(true)?;
        assert_eq!(tools.crs_info()?.len(), 4);

        // Ellipsoidal to orthometric heights
        let (_, lon, lat, h) = POINTS[0];
        let (mut x, mut y, mut z) = (lon, lat, h);
        tools.crs_operation("EPSG:4937", "EPSG:25830+5782", &mut x, &mut y, &mut z)?;
        assert!((x - 63723.324).abs() < 1e-3);
        assert!((y - 4811118.823).abs() < 1e-3);
        assert!((z - (h - undulation(lon, lat))).abs() < 1e-4);

        // ...and back
        tools.crs_operation("EPSG:25830+5782", "EPSG:4937", &mut x, &mut y, &mut z)?;
        assert!((x - lon).abs() < 1e-9);
        assert!((y - lat).abs() < 1e-9);
        assert!((z - h).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn compound_idempotence() -> Result<(), Error> {
        let tools = CrsTools::new(Maximal::new());
        tools.initialize(true)?;
        let (_, lon, lat, h) = POINTS[2];
        let orthometric = h - undulation(lon, lat);

        let (mut x, mut y, mut z) = (lon, lat, orthometric);
        tools.crs_operation("EPSG:4258+5782", "EPSG:4937", &mut x, &mut y, &mut z)?;
        assert!((z - h).abs() < 1e-4);
        tools.crs_operation("EPSG:4937", "EPSG:4258+5782", &mut x, &mut y, &mut z)?;
        assert!((x - lon).abs() < 1e-9);
        assert!((y - lat).abs() < 1e-9);
        assert!((z - orthometric).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn batch_resilience() -> Result<(), Error> {
        let tools = CrsTools::new(Maximal::new());
        tools.initialize(true)?;

        let mut points = BTreeMap::new();
        for (id, lon, lat, h) in POINTS {
            points.insert(id.to_string(), PointRecord::new_3d(lon, lat, h));
        }
        let original = points.clone();

        let report = tools.crs_operation_batch("EPSG:4937", "EPSG:25830+5782", &mut points, true)?;
        assert_eq!(report.succeeded, 4);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].0, "2001");
        assert!(report.error_text().contains("Transformation failed"));

        // The failing point is left untouched, the others are transformed
        assert_eq!(points["2001"], original["2001"]);
        assert!((points["1012"].x - 371023.221).abs() < 1e-3);
        Ok(())
    }

    #[test]
    fn vertical() -> Result<(), Error> {
        let tools = CrsTools::new(Maximal::new());
        tools.initialize(true)?;
        let vertical = tools.crs_vertical("EPSG:25830")?;
        assert_eq!(vertical.len(), 1);
        assert_eq!(vertical[0].code, "EPSG:5782");
        assert_eq!(tools.crs_precision("EPSG:25830+5782")?, (3, 4));
        Ok(())
    }
}
