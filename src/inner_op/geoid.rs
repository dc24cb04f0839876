/// Height conversion using a geoid model grid. Forward converts ellipsoidal
/// heights to heights above the geoid, `H = h - N`, for geographic
/// coordinates in radians. Points outside of the grids become NaN.
use crate::authoring::*;
use crate::grid::grids_at;

// ----- F O R W A R D --------------------------------------------------------------

fn geoid_fwd(op: &Op, ctx: &dyn Context, operands: &mut dyn CoordinateSet) -> usize {
    geoid_common(op, ctx, operands, -1.)
}

// ----- I N V E R S E --------------------------------------------------------------

fn geoid_inv(op: &Op, ctx: &dyn Context, operands: &mut dyn CoordinateSet) -> usize {
    geoid_common(op, ctx, operands, 1.)
}

fn geoid_common(op: &Op, ctx: &dyn Context, operands: &mut dyn CoordinateSet, sign: f64) -> usize {
    let mut grids = Vec::new();
    for name in op.params.text("grids").unwrap_or_default().split(',') {
        match ctx.get_grid(name) {
            Ok(grid) => grids.push(grid),
            Err(e) => {
                warn!("geoid: grid '{name}' vanished: {e}");
                operands.stomp();
                return 0;
            }
        }
    }

    let mut successes = 0;
    for i in 0..operands.len() {
        let mut coord = operands.get_coord(i);
        let Some(n) = grids_at(&grids, &coord) else {
            debug!("geoid: point {i} outside of the grids");
            operands.set_coord(i, &Coor4D::nan());
            continue;
        };
        coord[2] += sign * n[0];
        operands.set_coord(i, &coord);
        successes += 1;
    }
    successes
}

// ----- C O N S T R U C T O R ------------------------------------------------------

#[rustfmt::skip]
pub const GAMUT: [OpParameter; 2] = [
    OpParameter::Flag { key: "inv" },
    OpParameter::Text { key: "grids", default: None },
];

pub fn new(parameters: &RawParameters, ctx: &dyn Context) -> Result<Op, Error> {
    let op = Op::plain(
        parameters,
        InnerOp(geoid_fwd),
        Some(InnerOp(geoid_inv)),
        &GAMUT,
        ctx,
    )?;

    // Check up front that all the grids are available
    for name in op.params.text("grids")?.split(',') {
        ctx.get_grid(name)?;
    }
    Ok(op)
}

// ----- T E S T S ------------------------------------------------------------------
