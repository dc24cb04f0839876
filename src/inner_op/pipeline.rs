use super::*;

// ----- F O R W A R D -----------------------------------------------------------------

fn pipeline_fwd(op: &Op, ctx: &dyn Context, operands: &mut dyn CoordinateSet) -> usize {
    let mut stack = Vec::new();
    let mut n = usize::MAX;
    for step in &op.steps {
        n = n.min(apply_step(step, ctx, operands, &mut stack, Direction::Fwd));
    }
    n
}

// ----- I N V E R S E -----------------------------------------------------------------

fn pipeline_inv(op: &Op, ctx: &dyn Context, operands: &mut dyn CoordinateSet) -> usize {
    let mut stack = Vec::new();
    let mut n = usize::MAX;
    for step in op.steps.iter().rev() {
        n = n.min(apply_step(step, ctx, operands, &mut stack, Direction::Inv));
    }
    n
}

// Stack steps operate on the stack owned by the pipeline, everything else on its own
fn apply_step(
    step: &Op,
    ctx: &dyn Context,
    operands: &mut dyn CoordinateSet,
    stack: &mut Vec<Vec<f64>>,
    direction: Direction,
) -> usize {
    if step.descriptor.instantiated_as.operator_name("") != "stack" {
        return step.apply(ctx, operands, direction);
    }
    let direction = match (direction, step.descriptor.inverted) {
        (Direction::Fwd, true) => Direction::Inv,
        (Direction::Inv, true) => Direction::Fwd,
        (direction, false) => direction,
    };
    super::stack::stack_apply(stack, operands, &step.params, direction)
}

// ----- C O N S T R U C T O R ---------------------------------------------------------

#[rustfmt::skip]
pub const GAMUT: [OpParameter; 1] = [
    OpParameter::Flag { key: "inv" },
];

pub fn new(parameters: &RawParameters, ctx: &dyn Context) -> Result<Op, Error> {
    let definition = &parameters.definition;
    let thesteps = definition.split_into_steps().0;
    let mut steps = Vec::new();

    for step in thesteps {
        let step_parameters = parameters.next(&step);
        steps.push(Op::op(step_parameters, ctx)?);
    }

    // The pipeline itself takes no parameters, and is never inverted as a whole
    // through its own definition: "inv" belongs to the individual steps
    let params = ParsedParameters::default();
    let fwd = InnerOp(pipeline_fwd);
    let inv = InnerOp(pipeline_inv);
    let descriptor = OpDescriptor::new(definition, fwd, Some(inv));
    let id = OpHandle::new();
    Ok(Op {
        descriptor,
        params,
        steps,
        id,
    })
}

// ----- T E S T S ---------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline() -> Result<(), Error> {
        let mut ctx = Minimal::default();
        let op = ctx.op("helmert x=1 | helmert x=1 | helmert x=1")?;
        let mut data = crate::test_data::coor4d();
        assert_eq!(ctx.apply(op, Fwd, &mut data)?, 2);
        assert_eq!(data[0][0], 58.);
        assert_eq!(data[1][0], 62.);
        ctx.apply(op, Inv, &mut data)?;
        assert_eq!(data[0][0], 55.);
        assert_eq!(data[1][0], 59.);

        let op = ctx.op("helmert x=1 | helmert x=1 inv | helmert x=1")?;
        let mut data = crate::test_data::coor4d();
        ctx.apply(op, Fwd, &mut data)?;
        assert_eq!(data[0][0], 56.);
        assert_eq!(data[1][0], 60.);
        ctx.apply(op, Inv, &mut data)?;
        assert_eq!(data[0][0], 55.);
        assert_eq!(data[1][0], 59.);

        // Try to invoke garbage as a pipeline step
        assert!(matches!(
            ctx.op("helmert x=1 | helmert x=1 | _garbage"),
            Err(Error::NotFound(_, _))
        ));

        Ok(())
    }
}
