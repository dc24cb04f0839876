use crate::authoring::*;

mod op_descriptor;
mod parameter;
mod parsed_parameters;
mod raw_parameters;

pub use op_descriptor::OpDescriptor;
pub use parameter::OpParameter;
pub use parsed_parameters::ParsedParameters;
pub use raw_parameters::RawParameters;

/// Opaque handle to an operator instantiated by a [`Context`]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash)]
pub struct OpHandle(uuid::Uuid);
impl OpHandle {
    pub fn new() -> Self {
        OpHandle(uuid::Uuid::new_v4())
    }
}
impl Default for OpHandle {
    fn default() -> Self {
        OpHandle::new()
    }
}

/// The defining parameters and functions for an operator
#[derive(Debug)]
pub struct Op {
    pub descriptor: OpDescriptor,
    pub params: ParsedParameters,
    pub steps: Vec<Op>,
    pub id: OpHandle,
}

impl Op {
    /// Operate fwd/inv, taking operator inversion into account.
    /// Returns the number of successfully transformed coordinate tuples
    pub fn apply(
        &self,
        ctx: &dyn Context,
        operands: &mut dyn CoordinateSet,
        direction: Direction,
    ) -> usize {
        let forward = direction == Direction::Fwd;
        // Short form of (inverted && !forward) || (forward && !inverted)
        if self.descriptor.inverted != forward {
            return self.descriptor.fwd.0(self, ctx, operands);
        }
        self.descriptor.inv.0(self, ctx, operands)
    }

    pub fn new(definition: &str, ctx: &dyn Context) -> Result<Op, Error> {
        let globals = ctx.globals();
        let parameters = RawParameters::new(definition, &globals);
        Self::op(parameters, ctx)
    }

    /// Instantiate an `Op` for the simple (and common) case, where the
    /// `InnerOp` constructor needs no other parameters than the ones
    /// given in the definition
    pub fn plain(
        parameters: &RawParameters,
        fwd: InnerOp,
        inv: Option<InnerOp>,
        gamut: &[OpParameter],
        _ctx: &dyn Context,
    ) -> Result<Op, Error> {
        let def = parameters.definition.as_str();
        let params = ParsedParameters::new(parameters, gamut)?;
        let descriptor = OpDescriptor::new(def, fwd, inv);
        let steps = Vec::<Op>::new();
        let id = OpHandle::new();

        Ok(Op {
            descriptor,
            params,
            steps,
            id,
        })
    }

    /// Instantiate the actual operator, taking into account the relative order
    /// of precedence between pipelines, user defined operators, macros, and
    /// built-in operators
    #[allow(clippy::self_named_constructors)]
    pub fn op(parameters: RawParameters, ctx: &dyn Context) -> Result<Op, Error> {
        if parameters.nesting_too_deep() {
            return Err(Error::Recursion(
                parameters.invocation,
                parameters.definition,
            ));
        }

        let name = parameters.definition.operator_name("");

        // A pipeline?
        if parameters.definition.is_pipeline() {
            return crate::inner_op::pipeline::new(&parameters, ctx);
        }

        // A user defined operator?
        if !name.is_resource_name() {
            if let Ok(constructor) = ctx.get_op(&name) {
                return constructor.0(&parameters, ctx)?.handle_op_inversion();
            }
        }
        // A macro, e.g. the definition of a CRS registered under its identifier?
        else if let Ok(macro_definition) = ctx.get_resource(&name) {
            // The " " sentinel lets us search for " inv " as a word,
            // not as part of e.g. "invariant"
            let def = parameters.definition.clone() + " ";
            let inverted = def.contains(" inv ");
            trace!("Expanding macro {name} into {macro_definition}");
            let mut next_param = parameters.next(&macro_definition);
            next_param.globals.extend(macro_arguments(&parameters.definition));
            let mut op = Op::op(next_param, ctx)?.handle_inversion(inverted)?;
            op.descriptor.invoked_as = parameters.definition;
            return Ok(op);
        }

        // A built in operator?
        if let Ok(constructor) = crate::inner_op::builtin(&name) {
            return constructor.0(&parameters, ctx)?.handle_op_inversion();
        }

        Err(Error::NotFound(
            name,
            ": ".to_string() + &parameters.definition,
        ))
    }

    fn handle_op_inversion(self) -> Result<Op, Error> {
        let inverted = self.params.boolean("inv");
        self.handle_inversion(inverted)
    }

    fn handle_inversion(mut self, inverted: bool) -> Result<Op, Error> {
        if self.descriptor.invertible {
            if inverted {
                self.descriptor.inverted = !self.descriptor.inverted;
            }
            return Ok(self);
        }
        if inverted {
            return Err(Error::NonInvertible(self.descriptor.instantiated_as));
        }
        Ok(self)
    }
}

// Arguments given at macro invocation, e.g. `x=2` in `helmert:one x=2`, are handed
// down to the expansion as globals, where they override any `*`-defaults
fn macro_arguments(definition: &str) -> BTreeMap<String, String> {
    let mut arguments = definition.split_into_parameters();
    arguments.remove("name");
    arguments.remove("inv");
    arguments
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // Instantiate an Op, and invoke its forward and inverse operational modes
    #[test]
    fn basic() -> Result<(), Error> {
        let mut ctx = Minimal::default();

        // Try to invoke garbage as a user defined Op
        assert!(matches!(
            Op::new("_foo", &ctx),
            Err(Error::NotFound(_, _))
        ));

        let op = ctx.op("helmert x=1")?;
        let mut data = crate::test_data::coor4d();
        ctx.apply(op, Fwd, &mut data)?;
        assert_eq!(data[0][0], 56.);
        assert_eq!(data[1][0], 60.);
        ctx.apply(op, Inv, &mut data)?;
        assert_eq!(data[0][0], 55.);
        assert_eq!(data[1][0], 59.);

        // Also for an inverted operator
        let op = ctx.op("helmert x=1 inv")?;
        let mut data = crate::test_data::coor4d();
        ctx.apply(op, Fwd, &mut data)?;
        assert_eq!(data[0][0], 54.);
        assert_eq!(data[1][0], 58.);
        ctx.apply(op, Inv, &mut data)?;
        assert_eq!(data[0][0], 55.);
        assert_eq!(data[1][0], 59.);
        Ok(())
    }

    // Two mutually dependent macros must make the instantiation fail
    // with an `Error::Recursion(...)`
    #[test]
    fn nesting() -> Result<(), Error> {
        let mut ctx = Minimal::default();
        ctx.register_resource("foo:baz", "foo:bar");
        ctx.register_resource("foo:bar", "foo:baz");

        assert_eq!("foo:baz", ctx.get_resource("foo:bar")?);
        assert_eq!("foo:bar", ctx.get_resource("foo:baz")?);

        assert!(matches!(ctx.op("foo:baz"), Err(Error::Recursion(_, _))));
        Ok(())
    }

    #[test]
    fn macro_expansion_inverted() -> Result<(), Error> {
        let mut data = crate::test_data::coor4d();
        let mut ctx = Minimal::default();
        ctx.register_resource("sub:one", "helmert x=1 inv");
        let op = ctx.op("helmert x=1 | sub:one inv | helmert x=1")?;

        ctx.apply(op, Fwd, &mut data)?;
        assert_eq!(data[0][0], 58.);
        assert_eq!(data[1][0], 62.);

        ctx.apply(op, Inv, &mut data)?;
        assert_eq!(data[0][0], 55.);
        assert_eq!(data[1][0], 59.);
        Ok(())
    }

    #[test]
    fn macro_expansion_with_embedded_pipeline() -> Result<(), Error> {
        let mut data = crate::test_data::coor4d();
        let mut ctx = Minimal::default();
        ctx.register_resource("sub:three", "helmert x=-1 | helmert x=-1 | helmert x=-1");
        let op = ctx.op("helmert x=1 | sub:three")?;

        ctx.apply(op, Fwd, &mut data)?;
        assert_eq!(data[0][0], 53.);
        assert_eq!(data[1][0], 57.);

        let op = ctx.op("helmert x=1 | sub:three inv")?;
        ctx.apply(op, Fwd, &mut data)?;
        assert_eq!(data[0][0], 57.);
        assert_eq!(data[1][0], 61.);
        Ok(())
    }

    #[test]
    fn macro_expansion_with_defaults_provided() -> Result<(), Error> {
        let mut data = crate::test_data::coor4d();
        let mut ctx = Minimal::default();

        // A macro providing a default value of 1 for the x parameter
        ctx.register_resource("helmert:one", "helmert x=*1");

        let op = ctx.op("helmert:one")?;
        ctx.apply(op, Fwd, &mut data)?;
        assert_eq!(data[0][0], 56.);

        // Overriding the default
        let op = ctx.op("helmert:one x=2 inv")?;
        ctx.apply(op, Fwd, &mut data)?;
        assert_eq!(data[0][0], 54.);
        Ok(())
    }

    #[test]
    fn unresolvable() -> Result<(), Error> {
        let mut ctx = Minimal::default();
        // A macro referring to a grid the context does not know
        ctx.register_resource("crs:nogrid", "geoid grids=nowhere.gsa");
        assert!(matches!(ctx.op("crs:nogrid inv"), Err(Error::NotFound(_, _))));
        // An unregistered macro
        assert!(matches!(ctx.op("crs:nowhere"), Err(Error::NotFound(_, _))));
        Ok(())
    }
}
