//! The CRS registry: catalog metadata, validity under the deprecation
//! policy, and output precision for each CRS.

use crate::authoring::*;
use crate::crs::{authority_code, split_code};
use once_cell::sync::OnceCell;

/// Digits for angular coordinates (degrees)
pub const ANGLE_PRECISION: usize = 9;
/// Digits for linear coordinates (meters)
pub const LINEAR_PRECISION: usize = 3;
/// Digits for heights (meters)
pub const HEIGHT_PRECISION: usize = 4;
/// Digits for all components of topocentric coordinates
pub const ENU_PRECISION: usize = 4;

// ----- C R S I N F O -----------------------------------------------------------------

/// Registry metadata for one CRS
#[derive(Debug, Clone, PartialEq)]
pub struct CrsInfo {
    /// Normalized `AUTH:CODE`
    pub code: String,
    pub auth_name: String,
    /// The part of `code` following the authority
    pub code_number: String,
    pub name: String,
    pub class: CrsClass,
    pub deprecated: bool,
    pub horizontal_digits: usize,
    pub vertical_digits: usize,
    /// Empty unless projected
    pub projection_method: String,
    pub area: String,
    pub datum: String,
    /// The geodetic base CRS; for compounds, the `H+V` components
    pub base: String,
}

impl From<&CatalogEntry> for CrsInfo {
    fn from(entry: &CatalogEntry) -> Self {
        let (auth_name, code_number) = split_code(&entry.code);
        let projection_method = if entry.class == CrsClass::Projected {
            entry.method.clone()
        } else {
            String::new()
        };
        CrsInfo {
            code: entry.code.clone(),
            auth_name: auth_name.to_string(),
            code_number: code_number.to_string(),
            name: entry.name.clone(),
            class: entry.class,
            deprecated: entry.deprecated,
            horizontal_digits: entry.horizontal_digits,
            vertical_digits: entry.vertical_digits,
            projection_method,
            area: entry.area.clone(),
            datum: entry.datum.clone(),
            base: entry.base.clone(),
        }
    }
}

impl CrsInfo {
    pub fn is_geographic(&self) -> bool {
        matches!(self.class, CrsClass::Geographic2D | CrsClass::Geographic3D)
    }
    pub fn is_projected(&self) -> bool {
        self.class == CrsClass::Projected
    }
    pub fn is_geocentric(&self) -> bool {
        self.class == CrsClass::Geocentric
    }
    pub fn is_vertical(&self) -> bool {
        self.class == CrsClass::Vertical
    }
    pub fn is_compound(&self) -> bool {
        self.class == CrsClass::Compound
    }

    /// Can this CRS be the horizontal part of a compound, or the base of an ENU frame?
    pub fn is_horizontal(&self) -> bool {
        self.is_geographic() || self.is_projected() || self.is_geocentric()
    }
}

// ----- T H E   R E G I S T R Y -------------------------------------------------------

#[derive(Debug)]
struct Catalog {
    entries: Vec<CrsInfo>,
    index: BTreeMap<String, usize>,
    ignore_deprecated: bool,
}

/// The set of known CRS, enumerated once from a [`Context`], and shared
/// read-only afterwards
#[derive(Debug, Default)]
pub struct Registry {
    catalog: OnceCell<Catalog>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Enumerate the provider catalog. Only the first successful call has any
    /// effect: the catalog, and the deprecation policy, are fixed from then on
    pub fn initialize(&self, ctx: &dyn Context, ignore_deprecated: bool) -> Result<(), Error> {
        if let Some(catalog) = self.catalog.get() {
            if catalog.ignore_deprecated != ignore_deprecated {
                warn!(
                    "Registry already initialized with ignore_deprecated={}",
                    catalog.ignore_deprecated
                );
            }
            return Ok(());
        }

        self.catalog.get_or_try_init(|| {
            let entries = ctx.catalog().map_err(|e| match e {
                Error::Initialization(_) => e,
                other => Error::Initialization(other.to_string()),
            })?;
            if entries.is_empty() {
                return Err(Error::Initialization("empty CRS catalog".to_string()));
            }

            let entries: Vec<CrsInfo> = entries.iter().map(CrsInfo::from).collect();
            let mut index = BTreeMap::new();
            for (i, info) in entries.iter().enumerate() {
                if index.insert(info.code.clone(), i).is_some() {
                    warn!("Registry: duplicate catalog entry for {}", info.code);
                }
            }
            info!(
                "Registry: {} CRS, {} deprecated",
                entries.len(),
                entries.iter().filter(|e| e.deprecated).count()
            );
            Ok(Catalog {
                entries,
                index,
                ignore_deprecated,
            })
        })?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.catalog.get().is_some()
    }

    fn catalog(&self) -> Result<&Catalog, Error> {
        self.catalog.get().ok_or(Error::NotInitialized)
    }

    fn get(&self, code: &str) -> Result<&CrsInfo, Error> {
        let catalog = self.catalog()?;
        let unknown = || Error::UnknownCrs(code.to_string());
        let normalized = authority_code(code).ok_or_else(unknown)?;
        let i = catalog.index.get(&normalized).ok_or_else(unknown)?;
        Ok(&catalog.entries[*i])
    }

    /// Metadata for `code`, whether deprecated or not
    pub fn lookup(&self, code: &str) -> Result<CrsInfo, Error> {
        self.get(code).cloned()
    }

    /// Metadata for `code`, provided it is usable under the deprecation policy
    pub fn validate(&self, code: &str) -> Result<&CrsInfo, Error> {
        let info = self.get(code)?;
        if info.deprecated && self.catalog()?.ignore_deprecated {
            return Err(Error::DeprecatedCrs(info.code.clone()));
        }
        Ok(info)
    }

    pub fn is_valid(&self, code: &str) -> bool {
        self.validate(code).is_ok()
    }

    /// Check that all codes of `crs` are valid, and that they fit together
    pub fn validate_descriptor(&self, crs: &CrsDescriptor) -> Result<(), Error> {
        match crs {
            CrsDescriptor::Plain { code } => {
                self.validate(code)?;
            }
            CrsDescriptor::Compound {
                horizontal,
                vertical,
            } => {
                let h = self.validate(horizontal)?;
                let v = self.validate(vertical)?;
                if !h.is_horizontal() {
                    return Err(Error::InvalidCompound(format!(
                        "{horizontal} is not a horizontal CRS"
                    )));
                }
                if !v.is_vertical() {
                    return Err(Error::InvalidCompound(format!(
                        "{vertical} is not a vertical CRS"
                    )));
                }
            }
            CrsDescriptor::Enu { base, .. } => {
                if !self.validate(base)?.is_horizontal() {
                    return Err(Error::InvalidCompound(format!(
                        "{base} cannot be the base of a topocentric frame"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Output digits `(horizontal, vertical)` for coordinates in `identifier`
    pub fn precision_of(&self, identifier: &str) -> Result<(usize, usize), Error> {
        match CrsDescriptor::parse(identifier)? {
            CrsDescriptor::Plain { code } => {
                let info = self.get(&code)?;
                Ok((info.horizontal_digits, info.vertical_digits))
            }
            CrsDescriptor::Compound {
                horizontal,
                vertical,
            } => Ok((
                self.get(&horizontal)?.horizontal_digits,
                self.get(&vertical)?.vertical_digits,
            )),
            CrsDescriptor::Enu { .. } => Ok((ENU_PRECISION, ENU_PRECISION)),
        }
    }

    /// All entries, in catalog order
    pub fn all_crs_info(&self) -> Result<Vec<CrsInfo>, Error> {
        Ok(self.catalog()?.entries.clone())
    }

    /// The geographic and projected entries
    pub fn crs_for_2d_applications(&self) -> Result<Vec<CrsInfo>, Error> {
        Ok(self
            .catalog()?
            .entries
            .iter()
            .filter(|info| info.is_geographic() || info.is_projected())
            .cloned()
            .collect())
    }

    /// The vertical CRS which can be combined with `horizontal`. For a
    /// compound identifier, its horizontal part is used
    pub fn vertical_crs_compatible_with(
        &self,
        ctx: &dyn Context,
        horizontal: &str,
    ) -> Result<Vec<CrsInfo>, Error> {
        let crs = CrsDescriptor::parse(horizontal)?;
        let code = &self.get(crs.horizontal())?.code;
        let mut result = Vec::new();
        for vertical in ctx.compatible_vertical_crs(code)? {
            match self.get(&vertical) {
                Ok(info) => result.push(info.clone()),
                Err(e) => warn!("Registry: skipping vertical CRS {vertical}: {e}"),
            }
        }
        Ok(result)
    }

    /// The code of the geodetic (geographic) base CRS of `identifier`
    pub fn base_of(&self, identifier: &str) -> Result<String, Error> {
        let crs = CrsDescriptor::parse(identifier)?;
        let info = self.get(crs.horizontal())?;
        if info.is_compound() {
            return self.base_of(&info.base);
        }
        if info.base.is_empty() {
            return Ok(info.code.clone());
        }
        Ok(self.get(&info.base)?.code.clone())
    }
}

// ----- T E S T S ---------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(ignore_deprecated: bool) -> Result<Registry, Error> {
        let registry = Registry::new();
        registry.initialize(&Minimal::new(), ignore_deprecated)?;
        Ok(registry)
    }

    #[test]
    fn initialization() -> Result<(), Error> {
        let registry = Registry::new();
        assert!(matches!(
            registry.lookup("EPSG:25830"),
            Err(Error::NotInitialized)
        ));
        assert!(!registry.is_valid("EPSG:25830"));

        // A provider without a catalog cannot initialize the registry
        assert!(matches!(
            registry.initialize(&Minimal::default(), true),
            Err(Error::Initialization(_))
        ));
        assert!(!registry.is_initialized());

        registry.initialize(&Minimal::new(), true)?;
        assert!(registry.is_initialized());
        let n = registry.all_crs_info()?.len();

        // Later calls are no-ops, even with another policy
        registry.initialize(&Minimal::new(), false)?;
        assert_eq!(registry.all_crs_info()?.len(), n);
        assert!(!registry.is_valid("EPSG:4346"));
        Ok(())
    }

    #[test]
    fn lookup() -> Result<(), Error> {
        let registry = registry(true)?;
        let info = registry.lookup("EPSG:25830")?;
        assert_eq!(info.name, "ETRS89 / UTM zone 30N");
        assert_eq!(info.auth_name, "EPSG");
        assert_eq!(info.code_number, "25830");
        assert!(info.is_projected());
        assert!(!info.is_geographic());
        assert_eq!(info.projection_method, "Transverse Mercator");
        assert_eq!((info.horizontal_digits, info.vertical_digits), (3, 4));

        // Spelling variants
        assert_eq!(registry.lookup("epsg:25830")?, info);
        assert_eq!(registry.lookup(" EPSG:25830")?, info);

        assert!(registry.lookup("EPSG:4937")?.is_geographic());
        assert!(registry.lookup("EPSG:4936")?.is_geocentric());
        assert!(registry.lookup("EPSG:5782")?.is_vertical());
        assert!(registry.lookup("EPSG:4937")?.projection_method.is_empty());

        assert!(matches!(
            registry.lookup("EPSG:999999"),
            Err(Error::UnknownCrs(_))
        ));
        Ok(())
    }

    #[test]
    fn deprecation_policy() -> Result<(), Error> {
        let strict = registry(true)?;
        assert!(strict.lookup("EPSG:4346")?.deprecated);
        assert!(!strict.is_valid("EPSG:4346"));
        assert!(matches!(
            strict.validate("EPSG:4346"),
            Err(Error::DeprecatedCrs(_))
        ));
        assert!(strict.is_valid("EPSG:4936"));

        let lenient = registry(false)?;
        assert!(lenient.is_valid("EPSG:4346"));
        assert!(matches!(
            lenient.validate("EPSG:999999"),
            Err(Error::UnknownCrs(_))
        ));
        Ok(())
    }

    #[test]
    fn descriptors() -> Result<(), Error> {
        let registry = registry(true)?;
        let check = |id: &str| registry.validate_descriptor(&CrsDescriptor::parse(id)?);

        check("EPSG:25830")?;
        check("EPSG:25830+5782")?;
        check("EPSG:4936+5782")?;
        check("ENU:4937;-4.495021180808;36.756413127079;142.1590")?;

        assert!(matches!(check("EPSG:25830+4258"), Err(Error::InvalidCompound(_))));
        assert!(matches!(check("EPSG:5782+5782"), Err(Error::InvalidCompound(_))));
        assert!(matches!(check("ENU:5782;0;0;0"), Err(Error::InvalidCompound(_))));
        assert!(matches!(check("EPSG:25830+999999"), Err(Error::UnknownCrs(_))));
        assert!(matches!(check("EPSG:4346+5782"), Err(Error::DeprecatedCrs(_))));
        Ok(())
    }

    #[test]
    fn precision() -> Result<(), Error> {
        let registry = registry(true)?;
        assert_eq!(registry.precision_of("EPSG:4937")?, (ANGLE_PRECISION, HEIGHT_PRECISION));
        assert_eq!(registry.precision_of("EPSG:25830")?, (LINEAR_PRECISION, HEIGHT_PRECISION));
        assert_eq!(registry.precision_of("EPSG:4936")?, (3, 3));
        assert_eq!(registry.precision_of("EPSG:4258+5782")?, (9, 4));
        assert_eq!(
            registry.precision_of("ENU:4937;-4.495021180808;36.756413127079;142.1590")?,
            (ENU_PRECISION, ENU_PRECISION)
        );
        assert!(matches!(
            registry.precision_of("nonsense"),
            Err(Error::InvalidFormat(_))
        ));
        Ok(())
    }

    #[test]
    fn selections() -> Result<(), Error> {
        let registry = registry(true)?;
        let all = registry.all_crs_info()?;
        assert_eq!(all[0].code, "EPSG:4258");

        let flat = registry.crs_for_2d_applications()?;
        assert!(flat.iter().all(|i| i.is_geographic() || i.is_projected()));
        assert!(flat.iter().any(|i| i.code == "EPSG:23030"));
        assert!(!flat.iter().any(|i| i.code == "EPSG:4936"));

        let ctx = Minimal::new();
        let vertical: Vec<String> = registry
            .vertical_crs_compatible_with(&ctx, "EPSG:25830")?
            .into_iter()
            .map(|i| i.code)
            .collect();
        assert_eq!(vertical, ["EPSG:5782", "EPSG:9392", "EPSG:9393"]);
        let wgs84 = registry.vertical_crs_compatible_with(&ctx, "EPSG:32630+3855")?;
        assert_eq!(wgs84.len(), 1);

        assert_eq!(registry.base_of("EPSG:25830")?, "EPSG:4258");
        assert_eq!(registry.base_of("EPSG:23030+5782")?, "EPSG:4230");
        assert_eq!(registry.base_of("EPSG:4936")?, "EPSG:4937");
        Ok(())
    }
}
