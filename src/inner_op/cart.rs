/// Geographic to geocentric cartesian (and v.v.) conversion
use crate::authoring::*;

// ----- F O R W A R D --------------------------------------------------------------

fn cart_fwd(op: &Op, _ctx: &dyn Context, operands: &mut dyn CoordinateSet) -> usize {
    let ellps = op.params.ellps(0);
    let mut successes = 0;
    for i in 0..operands.len() {
        let coord = ellps.cartesian(&operands.get_coord(i));
        if !coord.is_nan() {
            successes += 1;
        }
        operands.set_coord(i, &coord);
    }
    successes
}

// ----- I N V E R S E --------------------------------------------------------------

fn cart_inv(op: &Op, _ctx: &dyn Context, operands: &mut dyn CoordinateSet) -> usize {
    let ellps = op.params.ellps(0);
    let mut successes = 0;
    for i in 0..operands.len() {
        let coord = ellps.geographic(&operands.get_coord(i));
        if !coord.is_nan() {
            successes += 1;
        }
        operands.set_coord(i, &coord);
    }
    successes
}

// ----- C O N S T R U C T O R ------------------------------------------------------

#[rustfmt::skip]
pub const GAMUT: [OpParameter; 2] = [
    OpParameter::Flag { key: "inv" },
    OpParameter::Text { key: "ellps", default: Some("GRS80") },
];

pub fn new(parameters: &RawParameters, ctx: &dyn Context) -> Result<Op, Error> {
    Op::plain(
        parameters,
        InnerOp(cart_fwd),
        Some(InnerOp(cart_inv)),
        &GAMUT,
        ctx,
    )
}

// ----- T E S T S ------------------------------------------------------------------
