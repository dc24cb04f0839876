use super::{parse_catalog, BUILTIN_ADAPTORS};
use crate::authoring::*;
use std::path::PathBuf;

// ----- T H E   M I N I M A L   P R O V I D E R ---------------------------------------

/// A minimalistic context provider, supporting built in and run-time defined
/// operators, run-time registered grids, and the builtin CRS catalog.
/// Sufficient for the Iberian use cases, and for internal test authoring.
#[derive(Debug, Default)]
pub struct Minimal {
    /// Constructors for user defined operators
    constructors: BTreeMap<String, OpConstructor>,
    /// User defined resources (macros)
    resources: BTreeMap<String, String>,
    /// Instantiations of operators
    operators: BTreeMap<OpHandle, Op>,
    /// Run-time registered grids
    grids: BTreeMap<String, Arc<BaseGrid>>,
    /// The CRS catalog, in catalog order
    catalog: Vec<CatalogEntry>,
}

const BAD_ID_MESSAGE: Error = Error::General("Minimal: Unknown operator id");

impl Context for Minimal {
    fn new() -> Minimal {
        let mut ctx = Minimal::default();
        for item in BUILTIN_ADAPTORS {
            ctx.register_resource(item.0, item.1);
        }
        match parse_catalog(BUILTIN_CATALOG) {
            Ok(catalog) => ctx.catalog = catalog,
            Err(e) => error!("Minimal: malformed builtin catalog: {e}"),
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

    fn globals(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("ellps".to_string(), "GRS80".to_string())])
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
                return Err(Error::General("Minimal: Bad step index"));
            }
            return Ok(&op.params);
        }

        // Not leaf level
        if index >= op.steps.len() {
            return Err(Error::General("Minimal: Bad step index"));
        }
        Ok(&op.steps[index].params)
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

    fn get_grid(&self, name: &str) -> Result<Arc<BaseGrid>, Error> {
        if let Some(grid) = self.grids.get(name) {
            return Ok(grid.clone());
        }
        Err(Error::NotFound(
            name.to_string(),
            ": Registered grid".to_string(),
        ))
    }

    fn catalog(&self) -> Result<Vec<CatalogEntry>, Error> {
        if self.catalog.is_empty() {
            return Err(Error::Initialization(
                "Minimal: empty CRS catalog".to_string(),
            ));
        }
        Ok(self.catalog.clone())
    }
}

impl Minimal {
    /// Make `grid` available under `name`, e.g. for use by the `geoid` operator
    pub fn register_grid(&mut self, name: &str, grid: BaseGrid) {
        self.grids.insert(name.to_string(), Arc::new(grid));
    }

    /// Add `entry` to the catalog, replacing any entry with the same code
    pub fn register_crs(&mut self, entry: CatalogEntry) {
        match self.catalog.iter_mut().find(|e| e.code == entry.code) {
            Some(existing) => *existing = entry,
            None => self.catalog.push(entry),
        }
    }
}

// ----- T H E   B U I L T I N   C A T A L O G -----------------------------------------

// code; name; class; deprecated; horizontal digits; vertical digits; datum; ellps;
// base; projection method; area of use; definition; datum shift
#[rustfmt::skip]
const BUILTIN_CATALOG: &str = "
EPSG:4258;  ETRS89;                  geographic2d; 0; 9; 4; ETRS89; GRS80; EPSG:4258;;                    Europe - ETRS89;                 gis:in;                      cart ellps=GRS80
EPSG:4937;  ETRS89;                  geographic3d; 0; 9; 4; ETRS89; GRS80; EPSG:4937;;                    Europe - ETRS89;                 gis:in;                      cart ellps=GRS80
EPSG:4936;  ETRS89;                  geocentric;   0; 3; 3; ETRS89; GRS80; EPSG:4937;;                    Europe - ETRS89;                 cart inv ellps=GRS80;        cart ellps=GRS80
EPSG:4346;  ETRS89;                  geocentric;   1; 3; 3; ETRS89; GRS80; EPSG:4937;;                    Europe - ETRS89;                 cart inv ellps=GRS80;        cart ellps=GRS80
EPSG:4326;  WGS 84;                  geographic2d; 0; 9; 4; WGS 84; WGS84; EPSG:4326;;                    World;                           gis:in;                      cart ellps=WGS84
EPSG:4979;  WGS 84;                  geographic3d; 0; 9; 4; WGS 84; WGS84; EPSG:4979;;                    World;                           gis:in;                      cart ellps=WGS84
EPSG:4978;  WGS 84;                  geocentric;   0; 3; 3; WGS 84; WGS84; EPSG:4979;;                    World;                           cart inv ellps=WGS84;        cart ellps=WGS84
EPSG:25828; ETRS89 / UTM zone 28N;   projected;    0; 3; 4; ETRS89; GRS80; EPSG:4258; Transverse Mercator; Europe between 18°W and 12°W;    utm zone=28 inv ellps=GRS80; cart ellps=GRS80
EPSG:25829; ETRS89 / UTM zone 29N;   projected;    0; 3; 4; ETRS89; GRS80; EPSG:4258; Transverse Mercator; Europe between 12°W and 6°W;     utm zone=29 inv ellps=GRS80; cart ellps=GRS80
EPSG:25830; ETRS89 / UTM zone 30N;   projected;    0; 3; 4; ETRS89; GRS80; EPSG:4258; Transverse Mercator; Europe between 6°W and 0°W;      utm zone=30 inv ellps=GRS80; cart ellps=GRS80
EPSG:25831; ETRS89 / UTM zone 31N;   projected;    0; 3; 4; ETRS89; GRS80; EPSG:4258; Transverse Mercator; Europe between 0°E and 6°E;      utm zone=31 inv ellps=GRS80; cart ellps=GRS80
EPSG:32628; WGS 84 / UTM zone 28N;   projected;    0; 3; 4; WGS 84; WGS84; EPSG:4326; Transverse Mercator; Between 18°W and 12°W, northern hemisphere; utm zone=28 inv ellps=WGS84; cart ellps=WGS84
EPSG:32629; WGS 84 / UTM zone 29N;   projected;    0; 3; 4; WGS 84; WGS84; EPSG:4326; Transverse Mercator; Between 12°W and 6°W, northern hemisphere;  utm zone=29 inv ellps=WGS84; cart ellps=WGS84
EPSG:32630; WGS 84 / UTM zone 30N;   projected;    0; 3; 4; WGS 84; WGS84; EPSG:4326; Transverse Mercator; Between 6°W and 0°W, northern hemisphere;   utm zone=30 inv ellps=WGS84; cart ellps=WGS84
EPSG:32631; WGS 84 / UTM zone 31N;   projected;    0; 3; 4; WGS 84; WGS84; EPSG:4326; Transverse Mercator; Between 0°E and 6°E, northern hemisphere;   utm zone=31 inv ellps=WGS84; cart ellps=WGS84
EPSG:4230;  ED50;                    geographic2d; 0; 9; 4; ED50;   intl;  EPSG:4230;;                    Europe - ED50 by country;        gis:in;                      cart ellps=intl | helmert x=-131.032 y=-100.251 z=-163.354 rx=-1.2438 ry=-0.0195 rz=-1.1436 s=-9.39 convention=position_vector exact
EPSG:23029; ED50 / UTM zone 29N;     projected;    0; 3; 4; ED50;   intl;  EPSG:4230; Transverse Mercator; Europe - between 12°W and 6°W;   utm zone=29 inv ellps=intl;  cart ellps=intl | helmert x=-131.032 y=-100.251 z=-163.354 rx=-1.2438 ry=-0.0195 rz=-1.1436 s=-9.39 convention=position_vector exact
EPSG:23030; ED50 / UTM zone 30N;     projected;    0; 3; 4; ED50;   intl;  EPSG:4230; Transverse Mercator; Europe - between 6°W and 0°W;    utm zone=30 inv ellps=intl;  cart ellps=intl | helmert x=-131.032 y=-100.251 z=-163.354 rx=-1.2438 ry=-0.0195 rz=-1.1436 s=-9.39 convention=position_vector exact
EPSG:23031; ED50 / UTM zone 31N;     projected;    0; 3; 4; ED50;   intl;  EPSG:4230; Transverse Mercator; Europe - between 0°E and 6°E;    utm zone=31 inv ellps=intl;  cart ellps=intl | helmert x=-131.032 y=-100.251 z=-163.354 rx=-1.2438 ry=-0.0195 rz=-1.1436 s=-9.39 convention=position_vector exact
EPSG:5782;  Alicante height;         vertical;     0; 3; 4; ETRS89; GRS80; EPSG:4258;;                    Spain - mainland onshore;        geoid inv grids=egm08_rednap.gsa;          noop
EPSG:9392;  Mallorca height;         vertical;     0; 3; 4; ETRS89; GRS80; EPSG:4258;;                    Spain - Balearic Islands - Mallorca; geoid inv grids=egm08_rednap_baleares.gsa; noop
EPSG:9393;  Menorca height;          vertical;     0; 3; 4; ETRS89; GRS80; EPSG:4258;;                    Spain - Balearic Islands - Menorca;  geoid inv grids=egm08_rednap_baleares.gsa; noop
EPSG:3855;  EGM2008 height;          vertical;     0; 3; 4; WGS 84; WGS84; EPSG:4326;;                    World;                           geoid inv grids=egm08.gsa;                 noop
";

// ----- T E S T S ------------------------------------------------------------------
