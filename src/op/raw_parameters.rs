use super::*;

/// Macros may expand into macros. Deeper nesting than this is taken as
/// a sign of mutually recursive definitions
const MAX_NESTING: usize = 100;

/// The vehicle used by the operator factory, [`Op::op`], to ferry the
/// definition of an operator, and the context globals, into the
/// constructor of the individual [`InnerOp`]s.
///
/// The constructors typically interpret the contents of `RawParameters`,
/// and convert it into the more runtime friendly [`ParsedParameters`].
#[derive(Debug, Default, Clone)]
pub struct RawParameters {
    pub invocation: String,
    pub definition: String,
    pub globals: BTreeMap<String, String>,
    recursion_level: usize,
}

impl RawParameters {
    pub fn new(invocation: &str, globals: &BTreeMap<String, String>) -> RawParameters {
        let invocation = invocation.remove_comments().normalize();
        let definition = invocation.clone();
        RawParameters {
            invocation,
            definition,
            globals: globals.clone(),
            recursion_level: 0,
        }
    }

    /// The parameters for the next level of the instantiation: a pipeline
    /// step, or the expansion of a macro
    pub fn next(&self, definition: &str) -> RawParameters {
        RawParameters {
            invocation: self.invocation.clone(),
            definition: definition.remove_comments().normalize(),
            globals: self.globals.clone(),
            recursion_level: self.recursion_level + 1,
        }
    }

    pub fn nesting_too_deep(&self) -> bool {
        self.recursion_level > MAX_NESTING
    }
}

// ----- T E S T S ---------------------------------------------------------------------

// RawParameters gets most of its test coverage from the tests in `op/mod.rs`

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_level() {
        let globals = BTreeMap::from([("ellps".to_string(), "GRS80".to_string())]);
        let raw = RawParameters::new("EPSG:25830   inv # comment", &globals);
        assert_eq!(raw.definition, "EPSG:25830 inv");

        let next = raw.next("utm  zone = 30");
        assert_eq!(next.invocation, "EPSG:25830 inv");
        assert_eq!(next.definition, "utm zone=30");
        assert_eq!(next.globals["ellps"], "GRS80");
        assert!(!next.nesting_too_deep());
    }
}
