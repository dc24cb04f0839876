/// Horizontal-only access to the hub frame. The steps named by `via` take
/// coordinates of some CRS to geocentric cartesian hub coordinates. Forward
/// ignores the incoming height, and selects the one for which the hub point
/// lands on the surface of the hub ellipsoid `ellps`. Inverse is `via`
/// inverted. Hence, two 2D CRS on different datums are connected through the
/// same hub point in both directions, and round trips are exact.
use crate::authoring::*;

const MAX_ITERATIONS: usize = 10;
const TOLERANCE: f64 = 1e-10;

// ----- F O R W A R D --------------------------------------------------------------

fn surface_fwd(op: &Op, ctx: &dyn Context, operands: &mut dyn CoordinateSet) -> usize {
    let Some(via) = op.steps.first() else {
        return 0;
    };
    let ellps = op.params.ellps(0);
    let n = operands.len();

    let mut heights = vec![0.; n];
    let mut work: Vec<Coor4D> = vec![Coor4D::default(); n];
    for _ in 0..MAX_ITERATIONS {
        for (i, w) in work.iter_mut().enumerate() {
            let mut coord = operands.get_coord(i);
            coord[2] = heights[i];
            *w = coord;
        }
        via.apply(ctx, &mut work, Direction::Fwd);

        // Move each point along its own normal by its height above the hub ellipsoid
        let mut worst: f64 = 0.;
        for (i, w) in work.iter().enumerate() {
            let residual = ellps.geographic(w)[2];
            heights[i] -= residual;
            worst = worst.max(residual.abs());
        }
        if worst < TOLERANCE {
            break;
        }
    }

    let mut successes = 0;
    for (i, w) in work.iter().enumerate() {
        if !w.is_nan() {
            successes += 1;
        }
        operands.set_coord(i, w);
    }
    successes
}

// ----- I N V E R S E --------------------------------------------------------------

fn surface_inv(op: &Op, ctx: &dyn Context, operands: &mut dyn CoordinateSet) -> usize {
    let Some(via) = op.steps.first() else {
        return 0;
    };
    via.apply(ctx, operands, Direction::Inv)
}

// ----- C O N S T R U C T O R ------------------------------------------------------

#[rustfmt::skip]
pub const GAMUT: [OpParameter; 3] = [
    OpParameter::Flag { key: "inv" },
    OpParameter::Text { key: "via", default: None },
    OpParameter::Text { key: "ellps", default: Some("GRS80") },
];

pub fn new(parameters: &RawParameters, ctx: &dyn Context) -> Result<Op, Error> {
    let mut op = Op::plain(
        parameters,
        InnerOp(surface_fwd),
        Some(InnerOp(surface_inv)),
        &GAMUT,
        ctx,
    )?;
    let via = op.params.text("via")?;
    op.steps.push(Op::op(parameters.next(&via), ctx)?);
    Ok(op)
}

// ----- T E S T S ------------------------------------------------------------------
