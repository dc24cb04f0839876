/// The no-operation. Does nothing, and is good at it
use super::*;

// ----- F O R W A R D --------------------------------------------------------------

fn noop(_op: &Op, _ctx: &dyn Context, operands: &mut dyn CoordinateSet) -> usize {
    operands.len()
}

// ----- C O N S T R U C T O R ------------------------------------------------------

#[rustfmt::skip]
pub const GAMUT: [OpParameter; 1] = [
    OpParameter::Flag { key: "inv" },
];

pub fn new(parameters: &RawParameters, ctx: &dyn Context) -> Result<Op, Error> {
    Op::plain(parameters, InnerOp(noop), Some(InnerOp(noop)), &GAMUT, ctx)
}

// ----- T E S T S ------------------------------------------------------------------
