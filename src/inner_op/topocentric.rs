/// Geocentric cartesian to local east-north-up (and v.v.), around an
/// origin given by its geographic coordinates
use crate::authoring::*;

// ----- F O R W A R D --------------------------------------------------------------

fn topocentric_fwd(op: &Op, _ctx: &dyn Context, operands: &mut dyn CoordinateSet) -> usize {
    let Ok((origin, rotation)) = frame(&op.params) else {
        warn!("topocentric: missing precomputed frame");
        return 0;
    };

    let mut successes = 0;
    for i in 0..operands.len() {
        let (x, y, z) = operands.xyz(i);
        let d = [x - origin[0], y - origin[1], z - origin[2]];
        let [e, n, u] = crate::math::rotate(&rotation, d);
        operands.set_xyz(i, e, n, u);
        if !(e.is_nan() || n.is_nan() || u.is_nan()) {
            successes += 1;
        }
    }
    successes
}

// ----- I N V E R S E --------------------------------------------------------------

fn topocentric_inv(op: &Op, _ctx: &dyn Context, operands: &mut dyn CoordinateSet) -> usize {
    let Ok((origin, rotation)) = frame(&op.params) else {
        warn!("topocentric: missing precomputed frame");
        return 0;
    };

    let mut successes = 0;
    for i in 0..operands.len() {
        let (e, n, u) = operands.xyz(i);
        let d = crate::math::rotate_transposed(&rotation, [e, n, u]);
        let (x, y, z) = (origin[0] + d[0], origin[1] + d[1], origin[2] + d[2]);
        operands.set_xyz(i, x, y, z);
        if !(x.is_nan() || y.is_nan() || z.is_nan()) {
            successes += 1;
        }
    }
    successes
}

// ----- C O N S T R U C T O R ------------------------------------------------------

#[rustfmt::skip]
pub const GAMUT: [OpParameter; 5] = [
    OpParameter::Flag { key: "inv" },
    OpParameter::Text { key: "ellps", default: Some("GRS80") },

    // The origin: longitude and latitude in degrees, ellipsoidal height in meters
    OpParameter::Real { key: "lon_0", default: None },
    OpParameter::Real { key: "lat_0", default: None },
    OpParameter::Real { key: "h_0",   default: Some(0_f64) },
];

pub fn new(parameters: &RawParameters, ctx: &dyn Context) -> Result<Op, Error> {
    let mut op = Op::plain(
        parameters,
        InnerOp(topocentric_fwd),
        Some(InnerOp(topocentric_inv)),
        &GAMUT,
        ctx,
    )?;

    let lon_0 = op.params.lon(0);
    let lat_0 = op.params.lat(0);
    if lat_0.abs() > std::f64::consts::FRAC_PI_2 {
        return Err(Error::BadParam("lat_0".to_string(), lat_0.to_degrees().to_string()));
    }
    let h_0 = op.params.real("h_0")?;

    // The origin in geocentric cartesian coordinates, and the rotation into ENU
    let origin = op.params.ellps(0).cartesian(&Coor4D::raw(lon_0, lat_0, h_0, 0.));
    let rotation = crate::math::topocentric_rotation(lon_0, lat_0);
    op.params
        .series
        .insert("origin", vec![origin[0], origin[1], origin[2]]);
    op.params
        .series
        .insert("rotation", rotation.iter().flatten().copied().collect());
    Ok(op)
}

// ----- A N C I L L A R Y   F U N C T I O N S -----------------------------------------

fn frame(params: &ParsedParameters) -> Result<([f64; 3], [[f64; 3]; 3]), Error> {
    let o = params.series("origin")?;
    let m = params.series("rotation")?;
    if o.len() != 3 || m.len() != 9 {
        return Err(Error::Operator("topocentric", "Malformed frame"));
    }
    Ok((
        [o[0], o[1], o[2]],
        [[m[0], m[1], m[2]], [m[3], m[4], m[5]], [m[6], m[7], m[8]]],
    ))
}

// ----- T E S T S ------------------------------------------------------------------
