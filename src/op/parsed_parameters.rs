use super::*;
use std::collections::BTreeSet;

/// The parameters of an operator, parsed and type checked against its gamut
#[derive(Debug, Default)]
pub struct ParsedParameters {
    pub name: String,

    // Commonly used options have hard-coded slots. Angles in radians
    pub ellps: [Ellipsoid; 2],
    pub lat: [f64; 4],
    pub lon: [f64; 4],
    pub x: [f64; 4],
    pub y: [f64; 4],
    pub k: [f64; 4],

    // Op-specific options are stored in B-Trees
    pub boolean: BTreeSet<&'static str>,
    pub natural: BTreeMap<&'static str, usize>,
    pub real: BTreeMap<&'static str, f64>,
    pub series: BTreeMap<&'static str, Vec<f64>>,
    pub text: BTreeMap<&'static str, String>,
    pub fourier_coefficients: BTreeMap<&'static str, FourierCoefficients>,
    pub ignored: Vec<String>,
    pub given: BTreeMap<String, String>,
}

// Accessors
impl ParsedParameters {
    pub fn boolean(&self, key: &str) -> bool {
        self.boolean.contains(key)
    }
    pub fn natural(&self, key: &str) -> Result<usize, Error> {
        if let Some(value) = self.natural.get(key) {
            return Ok(*value);
        }
        Err(Error::MissingParam(key.to_string()))
    }
    pub fn real(&self, key: &str) -> Result<f64, Error> {
        if let Some(value) = self.real.get(key) {
            return Ok(*value);
        }
        Err(Error::MissingParam(key.to_string()))
    }
    pub fn series(&self, key: &str) -> Result<&[f64], Error> {
        if let Some(value) = self.series.get(key) {
            return Ok(value);
        }
        Err(Error::MissingParam(key.to_string()))
    }
    pub fn text(&self, key: &str) -> Result<String, Error> {
        if let Some(value) = self.text.get(key) {
            return Ok(value.to_string());
        }
        Err(Error::MissingParam(key.to_string()))
    }
    pub fn fourier_coefficients(&self, key: &str) -> Result<FourierCoefficients, Error> {
        if let Some(value) = self.fourier_coefficients.get(key) {
            return Ok(*value);
        }
        Err(Error::MissingParam(key.to_string()))
    }
    pub fn ellps(&self, index: usize) -> &Ellipsoid {
        &self.ellps[index]
    }
    pub fn x(&self, index: usize) -> f64 {
        self.x[index]
    }
    pub fn y(&self, index: usize) -> f64 {
        self.y[index]
    }
    pub fn lat(&self, index: usize) -> f64 {
        self.lat[index]
    }
    pub fn lon(&self, index: usize) -> f64 {
        self.lon[index]
    }
    pub fn k(&self, index: usize) -> f64 {
        self.k[index]
    }
}

impl ParsedParameters {
    pub fn new(
        parameters: &RawParameters,
        gamut: &[OpParameter],
    ) -> Result<ParsedParameters, Error> {
        let locals = parameters.definition.split_into_parameters();
        let globals = &parameters.globals;
        let mut boolean = BTreeSet::<&'static str>::new();
        let mut natural = BTreeMap::<&'static str, usize>::new();
        let mut real = BTreeMap::<&'static str, f64>::new();
        let mut series = BTreeMap::<&'static str, Vec<f64>>::new();
        let mut text = BTreeMap::<&'static str, String>::new();

        // Locate all accepted parameters, type check, and place them
        // into their proper bins
        for p in gamut {
            match *p {
                OpParameter::Flag { key } => {
                    if let Some(value) = chase(globals, &locals, key)? {
                        if value.is_empty() || value.to_lowercase() == "true" {
                            boolean.insert(key);
                            continue;
                        }
                        warn!("Cannot parse {key}:{value} as a boolean constant!");
                        return Err(Error::BadParam(key.to_string(), value));
                    }
                    // Flags are implicitly false when not given
                    continue;
                }

                OpParameter::Natural { key, default } => {
                    if let Some(value) = chase(globals, &locals, key)? {
                        if let Ok(v) = value.parse::<usize>() {
                            natural.insert(key, v);
                            continue;
                        }
                        warn!("Cannot parse {key}:{value} as a natural number!");
                        return Err(Error::BadParam(key.to_string(), value));
                    }
                    if let Some(value) = default {
                        natural.insert(key, value);
                        continue;
                    }
                    error!("Missing required parameter '{key}'");
                    return Err(Error::MissingParam(key.to_string()));
                }

                OpParameter::Real { key, default } => {
                    if let Some(value) = chase(globals, &locals, key)? {
                        if let Ok(v) = value.parse::<f64>() {
                            real.insert(key, v);
                            continue;
                        }
                        warn!("Cannot parse {key}:{value} as a real number");
                        return Err(Error::BadParam(key.to_string(), value));
                    }
                    if let Some(value) = default {
                        real.insert(key, value);
                        continue;
                    }
                    error!("Missing required parameter '{key}'");
                    return Err(Error::MissingParam(key.to_string()));
                }

                OpParameter::Series { key, default } => {
                    let value = match chase(globals, &locals, key)? {
                        Some(value) => value,
                        None => match default {
                            // Defaults to nothing
                            Some("") => continue,
                            Some(value) => value.to_string(),
                            None => {
                                error!("Missing required parameter '{key}'");
                                return Err(Error::MissingParam(key.to_string()));
                            }
                        },
                    };
                    let mut elements = Vec::<f64>::new();
                    for element in value.split(',') {
                        let Ok(v) = element.parse::<f64>() else {
                            warn!("Cannot parse {key}:{value} as a series");
                            return Err(Error::BadParam(key.to_string(), value.clone()));
                        };
                        elements.push(v);
                    }
                    series.insert(key, elements);
                }

                OpParameter::Text { key, default } => {
                    if let Some(value) = chase(globals, &locals, key)? {
                        text.insert(key, value);
                        continue;
                    }
                    if let Some(value) = default {
                        text.insert(key, value.to_string());
                        continue;
                    }
                    error!("Missing required parameter '{key}'");
                    return Err(Error::MissingParam(key.to_string()));
                }
            };
        }

        // Now handle the commonly used options with the hard-coded slots

        let mut ellps = [Ellipsoid::default(), Ellipsoid::default()];
        let mut lat = [0.; 4];
        let mut lon = [0.; 4];
        let mut x = [0.; 4];
        let mut y = [0.; 4];
        let mut k = [0.; 4];

        for (i, e) in ellps.iter_mut().enumerate() {
            if let Some(name) = text.get(&format!("ellps_{i}")[..]) {
                *e = Ellipsoid::named(name)?;
            }
        }
        // `ellps` trumps `ellps_0`
        if let Some(name) = text.get("ellps") {
            ellps[0] = Ellipsoid::named(name)?;
        }

        let slot = |prefix: &str, i: usize| *real.get(&format!("{prefix}_{i}")[..]).unwrap_or(&0.);
        for i in 0..4 {
            lat[i] = slot("lat", i).to_radians();
            lon[i] = slot("lon", i).to_radians();
            x[i] = slot("x", i);
            y[i] = slot("y", i);
            k[i] = slot("k", i);
        }

        let name = locals
            .get("name")
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());

        // Params specified, but not part of the gamut
        let ignored: Vec<String> = locals
            .keys()
            .filter(|key| *key != "name" && !gamut.iter().any(|p| p.key() == *key))
            .cloned()
            .collect();
        if !ignored.is_empty() {
            warn!("{name}: ignoring unknown parameter(s) {ignored:?}");
        }

        Ok(ParsedParameters {
            name,
            ellps,
            lat,
            lon,
            x,
            y,
            k,
            boolean,
            natural,
            real,
            series,
            text,
            fourier_coefficients: BTreeMap::new(),
            ignored,
            given: locals,
        })
    }
}

// ----- A N C I L L A R Y   F U N C T I O N S -----------------------------------------

/// Look up `key` among the locals, then among the globals, recursively chasing
/// look-ups (`key=^other`) and handling macro provided defaults (`key=*value`)
pub fn chase(
    globals: &BTreeMap<String, String>,
    locals: &BTreeMap<String, String>,
    key: &str,
) -> Result<Option<String>, Error> {
    // The haystack is a reverse iterator over both lists in series
    let mut haystack = globals.iter().chain(locals.iter()).rev();

    let key = key.trim();
    if key.is_empty() {
        return Err(Error::Syntax(String::from("Empty key")));
    }

    let mut default = "";
    let mut needle = key;
    let mut chasing = false;

    loop {
        let Some(found) = haystack.find(|&x| x.0 == needle) else {
            if !default.is_empty() {
                return Ok(Some(String::from(default)));
            }
            if chasing {
                return Err(Error::Syntax(format!("Incomplete definition for '{key}'")));
            }
            return Ok(None);
        };
        let value = found.1.trim();

        // A(nother) lookup: continue the search in the same iterator,
        // using the current value as the new search key
        if let Some(stripped) = value.strip_prefix('^') {
            chasing = true;
            needle = stripped;
            continue;
        }

        // A provided default: continue the search using the same key,
        // in case a proper value is provided
        if let Some(stripped) = value.strip_prefix('*') {
            chasing = true;
            needle = key;
            default = stripped;
            continue;
        }

        return Ok(Some(value.to_string()));
    }
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    const GAMUT: [OpParameter; 6] = [
        OpParameter::Flag    { key: "flag" },
        OpParameter::Natural { key: "zone",     default: Some(30) },
        OpParameter::Real    { key: "lat_0",    default: Some(36.5) },
        OpParameter::Series  { key: "origin",   default: Some("1,2,3") },
        OpParameter::Text    { key: "grids",    default: Some("egm08_rednap.gsa") },
        OpParameter::Text    { key: "ellps_0",  default: Some("6400000, 300") },
    ];

    #[test]
    fn basic() -> Result<(), Error> {
        let globals = BTreeMap::<String, String>::new();
        let raw = RawParameters::new("geoid flag ellps_0=6378388 , 297 unknown=1", &globals);
        let p = ParsedParameters::new(&raw, &GAMUT)?;

        assert!(p.boolean("flag"));
        assert!(!p.boolean("galf"));

        let origin = p.series("origin")?;
        assert_eq!(origin, &[1., 2., 3.]);
        assert_eq!(p.natural("zone")?, 30);
        assert_eq!(p.text("grids")?, "egm08_rednap.gsa");
        assert!((p.lat(0) - 36.5_f64.to_radians()).abs() < 1e-15);
        assert_eq!(p.ellps(0), &Ellipsoid::named("intl")?);
        assert_eq!(p.name, "geoid");
        assert_eq!(p.ignored, vec!["unknown".to_string()]);
        assert!(matches!(p.real("nothing"), Err(Error::MissingParam(_))));

        let raw = RawParameters::new("geoid zone=thirty", &globals);
        assert!(matches!(
            ParsedParameters::new(&raw, &GAMUT),
            Err(Error::BadParam(_, _))
        ));
        Ok(())
    }

    #[test]
    fn chasing() -> Result<(), Error> {
        let globals = BTreeMap::from([("ellps".to_string(), "GRS80".to_string())]);
        let locals = BTreeMap::from([
            ("ellps_1".to_string(), "^ellps".to_string()),
            ("x".to_string(), "*1".to_string()),
        ]);
        assert_eq!(chase(&globals, &locals, "ellps_1")?, Some("GRS80".to_string()));
        assert_eq!(chase(&globals, &locals, "x")?, Some("1".to_string()));
        assert_eq!(chase(&globals, &locals, "y")?, None);
        Ok(())
    }
}
