use crate::authoring::*;

// ----- B U I L T I N   O P E R A T O R S ---------------------------------------------

// Install new builtin operators by adding them in the `mod` and
// `BUILTIN_OPERATORS` blocks below

mod adapt;
mod cart;
mod geoid;
mod helmert;
mod noop;
pub(crate) mod pipeline; // Needed by Op for instantiation
mod stack;
mod surface;
mod tmerc;
mod topocentric;

#[rustfmt::skip]
const BUILTIN_OPERATORS: [(&str, OpConstructor); 13] = [
    ("adapt",        OpConstructor(adapt::new)),
    ("cart",         OpConstructor(cart::new)),
    ("geoid",        OpConstructor(geoid::new)),
    ("helmert",      OpConstructor(helmert::new)),
    ("tmerc",        OpConstructor(tmerc::new)),
    ("surface",      OpConstructor(surface::new)),
    ("topocentric",  OpConstructor(topocentric::new)),
    ("utm",          OpConstructor(tmerc::utm)),

    // Pipeline handler
    ("pipeline",     OpConstructor(pipeline::new)),
    ("stack",        OpConstructor(stack::new)),

    // Some commonly used noop-aliases
    ("noop",         OpConstructor(noop::new)),
    ("longlat",      OpConstructor(noop::new)),
    ("lonlat",       OpConstructor(noop::new)),
];
// A BTreeMap would have been a better choice for BUILTIN_OPERATORS, except
// for the annoying fact that it cannot be compile-time const-constructed.

/// Handle instantiation of built-in operators, as defined in
/// `BUILTIN_OPERATORS` above.
pub(crate) fn builtin(name: &str) -> Result<OpConstructor, Error> {
    for p in BUILTIN_OPERATORS {
        if p.0 == name {
            return Ok(p.1);
        }
    }
    Err(Error::NotFound(name.to_string(), String::default()))
}

// ----- S T R U C T   O P C O N S T R U C T O R ---------------------------------------

/// Blueprint for the overall instantiation of an operator.
///
/// OpConstructor needs to be a newtype, rather than a type alias,
/// since we must implement the Debug-trait for OpConstructor (to
/// make auto derive of the Debug-trait work for any derived type).
#[derive(Clone, Copy)]
pub struct OpConstructor(pub fn(args: &RawParameters, ctx: &dyn Context) -> Result<Op, Error>);

// Cannot autoderive the Debug trait
impl core::fmt::Debug for OpConstructor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "OpConstructor")
    }
}

// ----- S T R U C T   I N N E R O P ---------------------------------------------------

/// Blueprint for the functions doing the actual transformation work.
///
/// InnerOp needs to be a newtype, rather than a type alias, since we
/// must implement the Debug-trait for InnerOp (to make auto derive
/// of the Debug-trait work for any derived type).
pub struct InnerOp(pub fn(op: &Op, ctx: &dyn Context, operands: &mut dyn CoordinateSet) -> usize);

// Cannot autoderive the Debug trait
impl core::fmt::Debug for InnerOp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "InnerOp")
    }
}

// Defaults to no_op
impl Default for InnerOp {
    fn default() -> InnerOp {
        InnerOp(noop_placeholder)
    }
}

fn noop_placeholder(_op: &Op, _ctx: &dyn Context, _operands: &mut dyn CoordinateSet) -> usize {
    0
}

// ----- T E S T S ---------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup() {
        assert!(builtin("utm").is_ok());
        assert!(builtin("topocentric").is_ok());
        assert!(matches!(builtin("addone"), Err(Error::NotFound(_, _))));
    }
}
