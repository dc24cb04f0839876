#![allow(non_snake_case)]
/// The Helmert transform performs datum shifts between static reference frames,
/// operating on 3D geocentric cartesian coordinates.
use crate::authoring::*;

// ----- C O M M O N -------------------------------------------------------------------

// The forward and inverse implementations are virtually identical, so we combine them
// into one, with the functionality selected from the "direction" parameter.

fn helmert_common(op: &Op, operands: &mut dyn CoordinateSet, direction: Direction) -> usize {
    let Ok(shift) = Shift::from_params(&op.params) else {
        warn!("helmert: missing precomputed parameters");
        return 0;
    };
    let rotated = op.params.boolean("rotated");
    let (T, S, ROT) = (shift.translation, shift.scale, shift.rotation);

    let n = operands.len();
    for i in 0..n {
        let c = operands.get_coord(i);
        let v = [c[0], c[1], c[2]];

        let [x, y, z] = if direction == Direction::Fwd {
            // Rotate, then scale and offset
            let r = if rotated { crate::math::rotate(&ROT, v) } else { v };
            [S * r[0] + T[0], S * r[1] + T[1], S * r[2] + T[2]]
        } else {
            // Deoffset and unscale, then rotate back by transposed multiplication
            let d = [(v[0] - T[0]) / S, (v[1] - T[1]) / S, (v[2] - T[2]) / S];
            if rotated {
                crate::math::rotate_transposed(&ROT, d)
            } else {
                d
            }
        };
        operands.set_xyz(i, x, y, z);
    }
    n
}

// ----- F O R W A R D --------------------------------------------------------------

fn helmert_fwd(op: &Op, _ctx: &dyn Context, operands: &mut dyn CoordinateSet) -> usize {
    helmert_common(op, operands, Direction::Fwd)
}

// ----- I N V E R S E --------------------------------------------------------------

fn helmert_inv(op: &Op, _ctx: &dyn Context, operands: &mut dyn CoordinateSet) -> usize {
    helmert_common(op, operands, Direction::Inv)
}

// ----- C O N S T R U C T O R ------------------------------------------------------

#[rustfmt::skip]
pub const GAMUT: [OpParameter; 10] = [
    OpParameter::Flag { key: "inv" },

    // Translation (m)
    OpParameter::Real { key: "x", default: Some(0f64) },
    OpParameter::Real { key: "y", default: Some(0f64) },
    OpParameter::Real { key: "z", default: Some(0f64) },

    // Rotation (arcsec)
    OpParameter::Real { key: "rx", default: Some(0f64) },
    OpParameter::Real { key: "ry", default: Some(0f64) },
    OpParameter::Real { key: "rz", default: Some(0f64) },

    // Handling of rotation
    OpParameter::Text { key: "convention", default: Some("") },
    OpParameter::Flag { key: "exact" },

    // Scale (ppm)
    OpParameter::Real { key: "s",  default: Some(0f64) },
];

pub fn new(parameters: &RawParameters, ctx: &dyn Context) -> Result<Op, Error> {
    let mut op = Op::plain(
        parameters,
        InnerOp(helmert_fwd),
        Some(InnerOp(helmert_inv)),
        &GAMUT,
        ctx,
    )?;
    let params = &mut op.params;

    let T = [params.real("x")?, params.real("y")?, params.real("z")?];
    let R = [
        (params.real("rx")? / 3600.).to_radians(),
        (params.real("ry")? / 3600.).to_radians(),
        (params.real("rz")? / 3600.).to_radians(),
    ];
    let S = 1.0 + params.real("s")? * 1e-6;

    // Handling of rotations: position vector vs. coordinate frame conventions.
    let convention = params.text("convention")?;
    let rotated = R != [0., 0., 0.];
    let mut position_vector = true;
    if rotated {
        if !["position_vector", "coordinate_frame"].contains(&convention.as_str()) {
            return Err(Error::BadParam("convention".to_string(), convention));
        }
        position_vector = convention == "position_vector";
        params.boolean.insert("rotated");
    }

    let ROT = rotation_matrix(&R, params.boolean("exact"), position_vector);

    // The 3x3 goes into the series store as a flat 1x9
    let ROTFLAT: Vec<f64> = ROT.iter().flatten().copied().collect();
    params.series.insert("T", Vec::from(T));
    params.series.insert("ROTFLAT", ROTFLAT);
    params.real.insert("S", S);
    Ok(op)
}

// ----- A N C I L L A R Y   F U N C T I O N S -----------------------------------------

struct Shift {
    translation: [f64; 3],
    rotation: [[f64; 3]; 3],
    scale: f64,
}

impl Shift {
    fn from_params(params: &ParsedParameters) -> Result<Shift, Error> {
        let T = params.series("T")?;
        let M = params.series("ROTFLAT")?;
        if T.len() != 3 || M.len() != 9 {
            return Err(Error::Operator("helmert", "Malformed precomputed parameters"));
        }
        Ok(Shift {
            translation: [T[0], T[1], T[2]],
            rotation: [[M[0], M[1], M[2]], [M[3], M[4], M[5]], [M[6], M[7], M[8]]],
            scale: params.real("S")?,
        })
    }
}

// ----- R O T A T I O N   M A T R I X   B U I L D E R ---------------------------------

// Optional small-angle approximation, and selection between
// the "position vector" and "coordinate frame" rotation conventions.
//
// TO' = scale * [ROTZ * ROTY * ROTX] * FROM' + [translation x, y, z]'
//
//        | cz sz 0 |           | cy 0 -sy |           | 1   0  0 |
// ROTZ = |-sz cz 0 |,   ROTY = | 0  1   0 |,   ROTX = | 0  cx sx |
//        |  0  0 1 |           | sy 0  cy |           | 0 -sx cx |
//
fn rotation_matrix(r: &[f64; 3], exact: bool, position_vector: bool) -> [[f64; 3]; 3] {
    let (rx, ry, rz) = (r[0], r[1], r[2]);

    // Small-angle approximations: sx = sin(rx) = rx,  cx = cos(rx) = 1,  etc.
    let (mut sx, mut sy, mut sz) = (rx, ry, rz);
    let (mut cx, mut cy, mut cz) = (1.0, 1.0, 1.0);

    if exact {
        (sx, cx) = rx.sin_cos();
        (sy, cy) = ry.sin_cos();
        (sz, cz) = rz.sin_cos();
    }

    let r11 = cy * cz;
    let mut r12 = cx * sz;
    let mut r13 = -cx * sy * cz;

    let r21 = -cy * sz;
    let mut r22 = cx * cz;
    let mut r23 = sx * cz;

    let r31 = sy;
    let r32 = -sx * cy;
    let r33 = cx * cy;

    // Second order terms only in the exact case
    if exact {
        r12 += sx * sy * cz;
        r13 += sx * sz;

        r22 -= sx * sy * sz;
        r23 += cx * sy * sz;
    }

    if position_vector {
        return [[r11, r21, r31], [r12, r22, r32], [r13, r23, r33]];
    }
    [[r11, r12, r13], [r21, r22, r23], [r31, r32, r33]]
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    const GDA94: Coor4D = Coor4D([-4052051.7643, 4212836.2017, -2545106.0245, 0.0]);
    const GDA2020A: Coor4D = Coor4D([-4052052.7379, 4212835.9897, -2545104.5898, 0.0]);

    #[test]
    fn translation() -> Result<(), Error> {
        let mut ctx = Minimal::default();
        let op = ctx.op("helmert x=-87 y=-98 z=-121")?;

        // EPSG:1133 - 3 parameter, ED50/WGS84
        let mut operands = [Coor4D::origin()];

        ctx.apply(op, Fwd, &mut operands)?;
        assert_eq!(operands[0][0], -87.);
        assert_eq!(operands[0][1], -98.);
        assert_eq!(operands[0][2], -121.);

        ctx.apply(op, Inv, &mut operands)?;
        assert_eq!(operands[0][0], 0.);
        assert_eq!(operands[0][1], 0.);
        assert_eq!(operands[0][2], 0.);
        Ok(())
    }

    // Test case from "Intergovernmental Committee on Surveying and Mapping (ICSM)
    // Permanent Committee on Geodesy (PCG)": Geocentric Datum of Australia 2020,
    // Technical Manual Version 1.0, 25 July 2017.
    // Transformation from GDA94 to GDA2020.
    #[test]
    fn translation_rotation_and_scale() -> Result<(), Error> {
        let mut ctx = Minimal::default();
        let definition = "
            helmert convention = coordinate_frame
            x =  0.06155  rx = -0.0394924
            y = -0.01087  ry = -0.0327221
            z = -0.04019  rz = -0.0328979
            s = -0.009994 exact
        ";
        let op = ctx.op(definition)?;

        // The forward transformation should hit closer than 75 um
        let mut operands = [GDA94];
        ctx.apply(op, Fwd, &mut operands)?;
        assert!(GDA2020A.hypot3(&operands[0]) < 75e-6);

        // ... and an even better roundtrip
        ctx.apply(op, Inv, &mut operands)?;
        assert!(GDA94.hypot3(&operands[0]) < 75e-7);
        Ok(())
    }

    #[test]
    fn rotation_needs_a_convention() {
        let mut ctx = Minimal::default();
        assert!(matches!(
            ctx.op("helmert rz=1"),
            Err(Error::BadParam(_, _))
        ));
    }

    // Position vector and coordinate frame rotations are each other's inverse
    #[test]
    fn conventions() -> Result<(), Error> {
        let mut ctx = Minimal::default();
        let pv = ctx.op("helmert rx=-1.2438 ry=-0.0195 rz=-1.1436 convention=position_vector")?;
        let cf = ctx.op("helmert rx=-1.2438 ry=-0.0195 rz=-1.1436 convention=coordinate_frame")?;
        let point = Coor4D::raw(4597588.151, -677324.441, 4353984.396, 0.);
        let mut operands = [point];
        ctx.apply(pv, Fwd, &mut operands)?;
        assert!(operands[0].hypot3(&point) > 1.);
        ctx.apply(cf, Fwd, &mut operands)?;
        assert!(operands[0].hypot3(&point) < 1e-3);
        Ok(())
    }
}
