use super::*;

/// The fundamental elements of an operator (i.e. everything but steps and args)
#[derive(Debug, Default)]
pub struct OpDescriptor {
    /// The definition as written, e.g. `EPSG:23030 inv`
    pub invoked_as: String,
    /// The definition actually instantiated, e.g. the macro expansion
    /// `utm zone=30 ellps=intl | cart ellps=intl | helmert ...`
    pub instantiated_as: String,
    /// The step definitions, for pipelines. A single step otherwise
    pub steps: Vec<String>,
    pub invertible: bool,
    pub inverted: bool,
    pub fwd: InnerOp,
    pub inv: InnerOp,
}

impl OpDescriptor {
    pub fn new(definition: &str, fwd: InnerOp, inv: Option<InnerOp>) -> OpDescriptor {
        let instantiated_as = definition.to_string();
        let steps = instantiated_as.split_into_steps().0;
        let invertible = inv.is_some();
        let inv = inv.unwrap_or_default();
        OpDescriptor {
            // Invocation and inversion are handled higher up in the call hierarchy
            invoked_as: String::new(),
            instantiated_as,
            steps,
            invertible,
            inverted: false,
            fwd,
            inv,
        }
    }
}
