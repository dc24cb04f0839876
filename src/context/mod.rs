use crate::authoring::*;
use std::str::FromStr;

mod minimal;
#[cfg(feature = "with_plain")]
mod plain;
pub use minimal::Minimal;
#[cfg(feature = "with_plain")]
pub use plain::Plain;

// ----- T H E   C O N T E X T   T R A I T ---------------------------------------------

/// The `Context` trait defines the mode of communication between the CRS machinery
/// and the geodesy provider, i.e. the owner of the CRS catalog, the grids, and the
/// operator instantiations.
pub trait Context {
    /// In general, implementations should make sure that `new` differs from `default`
    /// only by adding access to the builtin adaptors (`gis:in`, `geo:out` etc.), and
    /// to the catalog
    fn new() -> Self
    where
        Self: Sized;

    /// Instantiate the operation given by `definition`
    fn op(&mut self, definition: &str) -> Result<OpHandle, Error>;

    /// Apply operation `op` to `operands`
    fn apply(
        &self,
        op: OpHandle,
        direction: Direction,
        operands: &mut dyn CoordinateSet,
    ) -> Result<usize, Error>;

    /// Globally defined default values (typically just `ellps=GRS80`)
    fn globals(&self) -> BTreeMap<String, String>;

    /// Definitions of steps
    fn steps(&self, op: OpHandle) -> Result<&Vec<String>, Error>;

    /// Parsed parameters of a specific step
    fn params(&self, op: OpHandle, index: usize) -> Result<&ParsedParameters, Error>;

    /// Register a new user-defined operator
    fn register_op(&mut self, name: &str, constructor: OpConstructor);
    /// Register a new user-defined resource (macro)
    fn register_resource(&mut self, name: &str, definition: &str);

    /// Helper for the `Op` instantiation logic in `Op::op(...)`
    fn get_op(&self, name: &str) -> Result<OpConstructor, Error>;
    /// Helper for the `Op` instantiation logic in `Op::op(...)`
    fn get_resource(&self, name: &str) -> Result<String, Error>;

    /// Access `blob`-like resources by identifier
    fn get_blob(&self, name: &str) -> Result<Vec<u8>, Error>;

    /// Access grid resources by identifier
    fn get_grid(&self, name: &str) -> Result<Arc<BaseGrid>, Error>;

    /// Enumerate the CRS catalog, in catalog order
    fn catalog(&self) -> Result<Vec<CatalogEntry>, Error>;

    // ----- Provided methods: CRS level services built on the above -----

    /// The catalog entry for the plain CRS `code`
    fn catalog_entry(&self, code: &str) -> Result<CatalogEntry, Error> {
        self.catalog()?
            .into_iter()
            .find(|entry| entry.code == code)
            .ok_or_else(|| Error::UnknownCrs(code.to_string()))
    }

    /// The operator pipeline taking coordinates of the CRS `identifier`
    /// to the common ETRS89/WGS84 geocentric hub frame
    fn to_hub_definition(&self, identifier: &str) -> Result<String, Error> {
        match CrsDescriptor::parse(identifier)? {
            CrsDescriptor::Plain { code } => {
                let entry = self.catalog_entry(&code)?;
                match entry.class {
                    CrsClass::Vertical => Err(Error::Provider(format!(
                        "{code}: a vertical CRS needs a horizontal companion"
                    ))),
                    // A catalogued compound names its components in `base`
                    CrsClass::Compound => self.to_hub_definition(&entry.base),
                    _ => Ok(format!("{} | {}", entry.definition, entry.datum_shift)),
                }
            }
            CrsDescriptor::Compound {
                horizontal,
                vertical,
            } => {
                let h = self.catalog_entry(&horizontal)?;
                let v = self.catalog_entry(&vertical)?;
                Ok(format!(
                    "{} | {} | {}",
                    h.definition, v.definition, h.datum_shift
                ))
            }
            CrsDescriptor::Enu { .. } => Err(Error::Provider(format!(
                "{identifier}: topocentric frames are not catalog CRS"
            ))),
        }
    }

    /// Instantiate the transformation from `source` to `target`. Between two
    /// CRS without a height component, the incoming height is carried through
    /// unchanged
    fn create_transform(&mut self, source: &str, target: &str) -> Result<OpHandle, Error> {
        let carry_height = self.is_heightless(source) && self.is_heightless(target);
        self.instantiate_transform(source, target, carry_height)
    }

    /// Instantiate the transformation from `source` to `target`, by registering
    /// the to-hub definition of each as a macro named by its identifier, and
    /// chaining the two through the hub. With `carry_height`, both ends are
    /// taken as horizontal only: they meet on the surface of the hub ellipsoid,
    /// and the third coordinate is stacked away and restored around the shift
    fn instantiate_transform(
        &mut self,
        source: &str,
        target: &str,
        carry_height: bool,
    ) -> Result<OpHandle, Error> {
        let wrap = |e: Error| Error::Provider(format!("{source} -> {target}: {e}"));
        for identifier in [source, target] {
            let definition = self.to_hub_definition(identifier).map_err(wrap)?;
            trace!("Registering {identifier} as {definition}");
            self.register_resource(identifier, &definition);
        }
        let definition = if carry_height {
            format!("stack push=3 | surface via={source} | surface via={target} inv | stack pop=3")
        } else {
            format!("{source} | {target} inv")
        };
        self.op(&definition).map_err(wrap)
    }

    /// True for plain 2D geographic and projected CRS, where the third
    /// coordinate is not part of the CRS
    fn is_heightless(&self, identifier: &str) -> bool {
        let Ok(CrsDescriptor::Plain { code }) = CrsDescriptor::parse(identifier) else {
            return false;
        };
        self.catalog_entry(&code).map_or(false, |entry| {
            matches!(entry.class, CrsClass::Geographic2D | CrsClass::Projected)
        })
    }

    /// The ellipsoid of the geodetic datum of `identifier`
    fn ellipsoid_parameters_for(&self, identifier: &str) -> Result<Ellipsoid, Error> {
        let code = match CrsDescriptor::parse(identifier)? {
            CrsDescriptor::Plain { code } => code,
            CrsDescriptor::Compound { horizontal, .. } => horizontal,
            CrsDescriptor::Enu { base, .. } => base,
        };
        let entry = self.catalog_entry(&code)?;
        Ellipsoid::named(&entry.ellps)
            .map_err(|e| Error::Provider(format!("{code}: {e}")))
    }

    /// Codes of the vertical CRS referenced to the same geodetic datum
    /// as the horizontal CRS `code`
    fn compatible_vertical_crs(&self, code: &str) -> Result<Vec<String>, Error> {
        let catalog = self.catalog()?;
        let horizontal = catalog
            .iter()
            .find(|entry| entry.code == code)
            .ok_or_else(|| Error::UnknownCrs(code.to_string()))?;
        Ok(catalog
            .iter()
            .filter(|entry| entry.class == CrsClass::Vertical && entry.datum == horizontal.datum)
            .map(|entry| entry.code.clone())
            .collect())
    }
}

// Help context providers provide canonically named, built in coordinate adaptors
#[rustfmt::skip]
pub const BUILTIN_ADAPTORS: [(&str, &str); 4] = [
    ("geo:in",  "adapt from=neut_deg"),
    ("geo:out", "adapt to=neut_deg"  ),
    ("gis:in",  "adapt from=enut_deg"),
    ("gis:out", "adapt to=enut_deg"  ),
];

// ----- T H E   C A T A L O G ---------------------------------------------------------

/// The kind of coordinate reference system
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CrsClass {
    Geographic2D,
    Geographic3D,
    Projected,
    Geocentric,
    Vertical,
    Compound,
}

impl CrsClass {
    /// The type names used in CSV dumps, following the PROJ type vocabulary
    pub fn type_name(&self) -> &'static str {
        match self {
            CrsClass::Geographic2D => "Geographic 2D CRS",
            CrsClass::Geographic3D => "Geographic 3D CRS",
            CrsClass::Projected => "Projected CRS",
            CrsClass::Geocentric => "Geocentric CRS",
            CrsClass::Vertical => "Vertical CRS",
            CrsClass::Compound => "Compound CRS",
        }
    }
}

impl FromStr for CrsClass {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "geographic2d" => Ok(CrsClass::Geographic2D),
            "geographic3d" => Ok(CrsClass::Geographic3D),
            "projected" => Ok(CrsClass::Projected),
            "geocentric" => Ok(CrsClass::Geocentric),
            "vertical" => Ok(CrsClass::Vertical),
            "compound" => Ok(CrsClass::Compound),
            _ => Err(Error::BadParam("class".to_string(), s.to_string())),
        }
    }
}

/// One record of a provider's CRS catalog.
///
/// `definition` takes coordinates of the CRS to its datum-native frame:
/// longitude, latitude (radians) and ellipsoidal height. For vertical CRS,
/// it converts heights of the CRS to ellipsoidal heights in that frame.
/// `datum_shift` takes the datum-native frame to the common geocentric hub.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub code: String,
    pub name: String,
    pub class: CrsClass,
    pub deprecated: bool,
    pub horizontal_digits: usize,
    pub vertical_digits: usize,
    pub datum: String,
    pub ellps: String,
    pub base: String,
    pub method: String,
    pub area: String,
    pub definition: String,
    pub datum_shift: String,
}

const CATALOG_FIELDS: usize = 13;

impl FromStr for CatalogEntry {
    type Err = Error;

    /// `code;name;class;deprecated;horizontal_digits;vertical_digits;datum;ellps;base;method;area;definition;datum_shift`
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split(';').map(|f| f.trim()).collect();
        if fields.len() != CATALOG_FIELDS {
            return Err(Error::Syntax(format!(
                "Expected {CATALOG_FIELDS} fields in catalog record '{line}'"
            )));
        }
        let digits = |key: &str, value: &str| {
            value
                .parse::<usize>()
                .map_err(|_| Error::BadParam(key.to_string(), value.to_string()))
        };
        let deprecated = match fields[3].to_lowercase().as_str() {
            "" | "0" | "false" => false,
            "1" | "true" | "deprecated" => true,
            other => return Err(Error::BadParam("deprecated".to_string(), other.to_string())),
        };
        let code = fields[0].to_string();
        if !code.contains(':') {
            return Err(Error::Syntax(format!("Catalog code '{code}' lacks authority")));
        }

        Ok(CatalogEntry {
            code,
            name: fields[1].to_string(),
            class: fields[2].parse()?,
            deprecated,
            horizontal_digits: digits("horizontal_digits", fields[4])?,
            vertical_digits: digits("vertical_digits", fields[5])?,
            datum: fields[6].to_string(),
            ellps: fields[7].to_string(),
            base: fields[8].to_string(),
            method: fields[9].to_string(),
            area: fields[10].to_string(),
            definition: fields[11].to_string(),
            datum_shift: fields[12].to_string(),
        })
    }
}

/// Parse a catalog text: one record per line, `#`-comments and blank lines ignored
pub fn parse_catalog(text: &str) -> Result<Vec<CatalogEntry>, Error> {
    let mut entries = Vec::new();
    for line in text.lines() {
        let line = line.remove_comments();
        if line.is_empty() {
            continue;
        }
        entries.push(line.parse::<CatalogEntry>()?);
    }
    Ok(entries)
}

// ----- T E S T S ---------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_record() -> Result<(), Error> {
        let line = "EPSG:23030; ED50 / UTM zone 30N; projected; 0; 3; 4; ED50; intl; EPSG:4230; \
                    Transverse Mercator; Europe - 6°W to 0°W; utm zone=30 inv ellps=intl; cart ellps=intl";
        let entry: CatalogEntry = line.parse()?;
        assert_eq!(entry.code, "EPSG:23030");
        assert_eq!(entry.class, CrsClass::Projected);
        assert!(!entry.deprecated);
        assert_eq!(entry.horizontal_digits, 3);
        assert_eq!(entry.base, "EPSG:4230");
        assert_eq!(entry.definition, "utm zone=30 inv ellps=intl");

        assert!(matches!(
            "EPSG:1;too;few".parse::<CatalogEntry>(),
            Err(Error::Syntax(_))
        ));
        assert!(matches!(
            "EPSG:1;x;spherical;0;3;3;d;GRS80;;;;noop;noop".parse::<CatalogEntry>(),
            Err(Error::BadParam(_, _))
        ));
        Ok(())
    }

    #[test]
    fn catalog_text() -> Result<(), Error> {
        let text = "
            # code;name;class;deprecated;hd;vd;datum;ellps;base;method;area;definition;datum_shift
            EPSG:4258;ETRS89;geographic2d;0;9;4;ETRS89;GRS80;EPSG:4258;;Europe;gis:in;cart

            EPSG:4346;ETRS89;geocentric;1;3;3;ETRS89;GRS80;EPSG:4346;;Europe;cart inv;cart # superseded
        ";
        let entries = parse_catalog(text)?;
        assert_eq!(entries.len(), 2);
        assert!(entries[1].deprecated);
        assert_eq!(entries[1].datum_shift, "cart");
        Ok(())
    }

    #[test]
    fn hub_definitions() -> Result<(), Error> {
        let ctx = Minimal::new();
        let def = ctx.to_hub_definition("EPSG:25830")?;
        assert!(def.starts_with("utm zone=30 inv"));

        let def = ctx.to_hub_definition("EPSG:25830+5782")?;
        assert!(def.contains("geoid"));
        assert!(matches!(
            ctx.to_hub_definition("EPSG:5782"),
            Err(Error::Provider(_))
        ));
        assert!(matches!(
            ctx.to_hub_definition("EPSG:999999"),
            Err(Error::UnknownCrs(_))
        ));

        let intl = ctx.ellipsoid_parameters_for("EPSG:23030")?;
        assert_float_eq!(intl.reciprocal_flattening(), 297., abs <= 1e-9);

        assert!(ctx.is_heightless("EPSG:23030"));
        assert!(ctx.is_heightless("EPSG:4258"));
        assert!(!ctx.is_heightless("EPSG:4937"));
        assert!(!ctx.is_heightless("EPSG:25830+5782"));

        let vertical = ctx.compatible_vertical_crs("EPSG:25830")?;
        assert!(vertical.contains(&"EPSG:5782".to_string()));
        assert!(!vertical.contains(&"EPSG:3855".to_string()));
        Ok(())
    }

    #[test]
    fn height_carried_between_2d_crs() -> Result<(), Error> {
        let mut ctx = Minimal::new();
        let (lon, lat) = (-8.380627694, 43.326214300);

        // ETRS89 to ED50 and back: the datum shift moves the height by tens
        // of meters, but between 2D CRS it is just carried along
        let op = ctx.create_transform("EPSG:4258", "EPSG:23030")?;
        let mut data = [Coor4D::raw(lon, lat, 0., 0.)];
        ctx.apply(op, Fwd, &mut data)?;
        assert_eq!(data[0][2], 0.);
        let back = ctx.create_transform("EPSG:23030", "EPSG:4258")?;
        ctx.apply(back, Fwd, &mut data)?;
        assert_float_eq!(data[0][0], lon, abs <= 5e-10);
        assert_float_eq!(data[0][1], lat, abs <= 5e-10);
        assert_eq!(data[0][2], 0.);

        // ...while into a 3D CRS the height is transformed
        let op = ctx.create_transform("EPSG:23030", "EPSG:4937")?;
        let mut data = [Coor4D::raw(63835.641, 4811324.773, 0., 0.)];
        ctx.apply(op, Fwd, &mut data)?;
        assert!(data[0][2].abs() > 1.);
        Ok(())
    }
}
