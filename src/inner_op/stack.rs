/// Stack functionality for pipelines (push/pop)
use crate::authoring::*;

#[rustfmt::skip]
pub const STACK_GAMUT: [OpParameter; 2] = [
    OpParameter::Series  { key: "push", default: Some("") },
    OpParameter::Series  { key: "pop",  default: Some("") },
];

/// Construct a new stack operator. Check the syntax and semantics
pub fn new(parameters: &RawParameters, _ctx: &dyn Context) -> Result<Op, Error> {
    let def = &parameters.definition;
    let mut params = ParsedParameters::new(parameters, &STACK_GAMUT)?;

    // Coordinate dimensions are given 1-based, and stored as f64
    let valid_indices = [1., 2., 3., 4.];
    let mut subcommands_given: usize = 0;

    for action in ["push", "pop"] {
        let Ok(args) = params.series(action) else {
            continue;
        };
        if let Some(bad) = args.iter().find(|i| !valid_indices.contains(*i)) {
            return Err(Error::BadParam(action.to_string(), bad.to_string()));
        }
        subcommands_given += 1;
        params.text.insert("action", action.to_string());
    }

    if subcommands_given != 1 {
        return Err(Error::MissingParam(
            "stack: must specify exactly one of push/pop".to_string(),
        ));
    }

    // The true action is handled by 'pipeline', so the `InnerOp`s are placeholders
    let descriptor = OpDescriptor::new(def, InnerOp::default(), Some(InnerOp::default()));
    let steps = Vec::new();
    let id = OpHandle::new();

    Ok(Op {
        descriptor,
        params,
        steps,
        id,
    })
}

/// Called by the pipeline to execute a stack step. In the inverse direction,
/// push and pop switch roles, and their argument order is reversed
pub(super) fn stack_apply(
    stack: &mut Vec<Vec<f64>>,
    operands: &mut dyn CoordinateSet,
    params: &ParsedParameters,
    direction: Direction,
) -> usize {
    let Some(action) = params.text.get("action") else {
        return 0;
    };
    let Ok(args) = params.series(action) else {
        return 0;
    };

    // Turn f64 dimensions 1-4 into usize indices 0-3
    let mut args: Vec<usize> = args.iter().map(|i| *i as usize - 1).collect();
    if direction == Direction::Inv {
        args.reverse();
    }

    match (action.as_str(), direction) {
        ("push", Direction::Fwd) | ("pop", Direction::Inv) => stack_push(stack, operands, &args),
        ("pop", Direction::Fwd) | ("push", Direction::Inv) => stack_pop(stack, operands, &args),
        _ => 0,
    }
}

/// Push elements from a CoordinateSet onto the stack
fn stack_push(stack: &mut Vec<Vec<f64>>, operands: &mut dyn CoordinateSet, args: &[usize]) -> usize {
    let number_of_operands = operands.len();
    let mut ext = vec![vec![0f64; number_of_operands]; args.len()];
    for i in 0..number_of_operands {
        let coord = operands.get_coord(i);
        for (j, arg) in args.iter().enumerate() {
            ext[j][i] = coord[*arg];
        }
    }
    stack.extend(ext);
    number_of_operands
}

/// Pop elements from the stack into elements of a CoordinateSet
fn stack_pop(stack: &mut Vec<Vec<f64>>, operands: &mut dyn CoordinateSet, args: &[usize]) -> usize {
    let number_of_operands = operands.len();

    // In case of underflow, we stomp on all input coordinates
    if stack.len() < args.len() {
        warn!("Stack underflow in pipeline");
        let nanny = Coor4D::nan();
        for i in 0..number_of_operands {
            operands.set_coord(i, &nanny);
        }
        return 0;
    }

    // Top-of-stack goes into the first dimension named
    let ext = stack.split_off(stack.len() - args.len());
    for i in 0..number_of_operands {
        let mut coord = operands.get_coord(i);
        for (j, arg) in args.iter().enumerate() {
            coord[*arg] = ext[ext.len() - 1 - j][i];
        }
        operands.set_coord(i, &coord);
    }
    number_of_operands
}

// ----- T E S T S ---------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack() -> Result<(), Error> {
        let mut ctx = Minimal::default();
        let master_data = vec![Coor4D([11., 12., 13., 14.]), Coor4D([21., 22., 23., 24.])];

        // Exactly one subcommand per step
        assert!(ctx.op("stack push=2,2,1,1 pop=1,1,2").is_err());
        assert!(ctx.op("stack").is_err());
        assert!(matches!(ctx.op("stack push=5"), Err(Error::BadParam(_, _))));
        assert!(ctx.op("stack push=2,2,1,1 | stack pop=1,1,2").is_ok());

        // Swap the first and second coordinate dimensions by a push/pop dance
        let mut data = master_data.clone();
        let op = ctx.op("stack push=1,2|stack pop=1,2")?;
        ctx.apply(op, Fwd, &mut data)?;
        assert_eq!(data[0][0], 12.);
        assert_eq!(data[1][1], 21.);
        ctx.apply(op, Inv, &mut data)?;
        assert_eq!(data, master_data);

        // The height survives a step that changes it
        let op = ctx.op("stack push=3 | helmert z=100 | stack pop=3")?;
        let mut data = master_data.clone();
        ctx.apply(op, Fwd, &mut data)?;
        assert_eq!(data[0][2], 13.);
        ctx.apply(op, Inv, &mut data)?;
        assert_eq!(data, master_data);

        // Underflow: everything is stomped on
        let op = ctx.op("noop | stack pop=3")?;
        let mut data = master_data.clone();
        assert_eq!(ctx.apply(op, Fwd, &mut data)?, 0);
        assert!(data[0][0].is_nan());
        Ok(())
    }
}
