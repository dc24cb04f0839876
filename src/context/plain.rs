use super::{parse_catalog, BUILTIN_ADAPTORS};
use crate::authoring::*;
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::Mutex;

// ----- T H E   P L A I N   C O N T E X T ---------------------------------------------

/// A context provider, supporting built in and run-time defined operators,
/// plus macros, CRS catalogs and geoid grids found in the search paths,
/// `./crstools` and `<data_local_dir>/crstools`.
///
/// Catalogs are `catalog/*.catalog` files, read once, on first use, in
/// file name order. Grids are Gravsoft files in `gsa/`, read on first
/// use and kept for the lifetime of the context.
#[derive(Debug)]
pub struct Plain {
    constructors: BTreeMap<String, OpConstructor>,
    resources: BTreeMap<String, String>,
    operators: BTreeMap<OpHandle, Op>,
    paths: Vec<PathBuf>,
    catalog: OnceCell<Vec<CatalogEntry>>,
    grids: Mutex<BTreeMap<String, Arc<BaseGrid>>>,
}

const BAD_ID_MESSAGE: Error = Error::General("Plain: Unknown operator id");

impl Default for Plain {
    fn default() -> Plain {
        let mut paths = Vec::new();

        let localpath: PathBuf = [".", "crstools"].iter().collect();
        paths.push(localpath);

        if let Some(mut userpath) = dirs::data_local_dir() {
            userpath.push("crstools");
            paths.push(userpath);
        }

        Plain::with_paths(paths)
    }
}

impl Plain {
    /// A `Plain` context searching `paths`, rather than the default locations
    pub fn with_paths(paths: Vec<PathBuf>) -> Plain {
        Plain {
            constructors: BTreeMap::new(),
            resources: BTreeMap::new(),
            operators: BTreeMap::new(),
            paths,
            catalog: OnceCell::new(),
            grids: Mutex::new(BTreeMap::new()),
        }
    }

    fn read_catalogs(&self) -> Result<Vec<CatalogEntry>, Error> {
        let mut entries = Vec::new();
        let mut found = 0;
        for path in &self.paths {
            let mut dir = path.clone();
            dir.push("catalog");
            let Ok(listing) = std::fs::read_dir(&dir) else {
                continue;
            };
            let mut files: Vec<PathBuf> = listing
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().map_or(false, |ext| ext == "catalog"))
                .collect();
            files.sort();

            for file in files {
                debug!("Plain: reading catalog {}", file.display());
                let text = std::fs::read_to_string(&file)?;
                let mut more = parse_catalog(&text).map_err(|e| {
                    Error::Initialization(format!("{}: {e}", file.display()))
                })?;
                entries.append(&mut more);
                found += 1;
            }
        }

        if found == 0 {
            return Err(Error::Initialization(format!(
                "Plain: no CRS catalog found in {:?}",
                self.paths
            )));
        }
        if entries.is_empty() {
            return Err(Error::Initialization(
                "Plain: empty CRS catalog".to_string(),
            ));
        }
        Ok(entries)
    }
}

impl Context for Plain {
    fn new() -> Plain {
        let mut ctx = Plain::default();
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
                return Err(Error::General("Plain: Bad step index"));
            }
            return Ok(&op.params);
        }

        // Not leaf level
        if index >= op.steps.len() {
            return Err(Error::General("Plain: Bad step index"));
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
        // Run-time registered resources (including the CRS definitions
        // registered by `create_transform`) take precedence
        if let Some(result) = self.resources.get(name) {
            return Ok(result.to_string());
        }

        let Some((prefix, suffix)) = name.split_once(':') else {
            return Err(Error::BadParam(
                "needing prefix:suffix format".to_string(),
                name.to_string(),
            ));
        };

        // A macro `prefix:suffix` lives in `resources/prefix_suffix.resource`
        let resource = format!("{prefix}_{suffix}.resource");
        for path in &self.paths {
            let mut full_path = path.clone();
            full_path.push("resources");
            full_path.push(&resource);
            if let Ok(result) = std::fs::read_to_string(full_path) {
                return Ok(result.trim().to_string());
            }
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
        for path in &self.paths {
            let mut path = path.clone();
            path.push(ext);
            path.push(name);
            if let Ok(result) = std::fs::read(path) {
                return Ok(result);
            }
        }
        Err(Error::NotFound(name.to_string(), ": Blob".to_string()))
    }

    fn get_grid(&self, name: &str) -> Result<Arc<BaseGrid>, Error> {
        let mut grids = self
            .grids
            .lock()
            .map_err(|_| Error::General("Plain: Grid cache poisoned"))?;
        if let Some(grid) = grids.get(name) {
            return Ok(grid.clone());
        }

        let buf = self.get_blob(name)?;
        let grid = Arc::new(BaseGrid::gravsoft(name, &buf)?);
        grids.insert(name.to_string(), grid.clone());
        Ok(grid)
    }

    fn catalog(&self) -> Result<Vec<CatalogEntry>, Error> {
        Ok(self.catalog.get_or_try_init(|| self.read_catalogs())?.clone())
    }
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic() -> Result<(), Error> {
        let mut ctx = Plain::new();

        // Test the check for syntactic correctness (i.e. prefix:suffix-form)
        assert!(matches!(
            ctx.get_resource("foo"),
            Err(Error::BadParam(_, _))
        ));
        // Do we get the proper error code for non-existing resources?
        assert!(matches!(
            ctx.get_resource("foo:bar"),
            Err(Error::NotFound(_, _))
        ));
        // ...and the proper error code for non-existing grids?
        assert!(matches!(
            ctx.get_grid("foo.gsa"),
            Err(Error::NotFound(_, _))
        ));

        // The macro in crstools/resources/ed50_spain.resource
        let op = ctx.op("ed50:spain")?;
        let mut data = [Coor4D::raw(4597588.151, -677324.441, 4353984.396, 0.)];
        ctx.apply(op, Fwd, &mut data)?;
        ctx.apply(op, Inv, &mut data)?;
        assert_float_eq!(data[0][0], 4597588.151, abs <= 1e-6);

        // Make sure we can access "sigil-less runtime defined resources"
        ctx.register_resource("foo", "bar");
        assert!(ctx.get_resource("foo")? == "bar");

        // We are *not* supposed to be able to instantiate a sigil-less resource
        ctx.register_resource("baz", "utm zone=30");
        assert!(ctx.op("baz").is_err());
        Ok(())
    }

    #[test]
    fn catalog_and_grids() -> Result<(), Error> {
        let mut ctx = Plain::new();
        let catalog = ctx.catalog()?;
        assert!(catalog.iter().any(|e| e.code == "EPSG:25830"));
        assert!(catalog.iter().any(|e| e.code == "EPSG:5782"));

        // The grid in crstools/gsa/test_geoid.gsa: N = 10 + lat - 0.1 lon
        let grid = ctx.get_grid("test_geoid.gsa")?;
        assert_eq!((grid.rows, grid.cols), (11, 16));
        let op = ctx.op("geoid grids=test_geoid.gsa")?;
        let mut data = [Coor4D::gis(-4., 40., 100., 0.)];
        ctx.apply(op, Fwd, &mut data)?;
        assert_float_eq!(data[0][2], 100. - 50.4, abs <= 1e-4);
        Ok(())
    }

    #[test]
    fn nothing_found() {
        let ctx = Plain::with_paths(vec![PathBuf::from("./no/such/place")]);
        assert!(matches!(ctx.catalog(), Err(Error::Initialization(_))));
    }
}
