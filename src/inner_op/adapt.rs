/*! Declarative adaptation between external coordinate conventions and the
internal one.

```sh
adapt from=enut_deg
```

Each of the four axes of a coordinate tuple is described by one letter:
*eastish, northish, upish, timish* (`e, n, u, t`), or the axis reverted
*westish, southish, downish, reversed-timeish* (`w, s, d, r`). An optional
angular unit suffix, `_deg`, `_gon` or `_rad`, tells how the first two
(horizontal) axes are measured.

Internally, a coordinate tuple is `enut_rad`: longitude/easting first,
and angles in radians. Catalog definitions of geographic CRS start with
`adapt from=enut_deg`, since the public coordinate convention is
longitude, latitude in degrees.

You never tell `adapt` what to do, only where you come `from`, and where
you want to go `to` (defaulting to the internal representation).
`adapt to=...` and `adapt inv from=...` are equivalent.
!*/

use super::*;

// ----- F O R W A R D --------------------------------------------------------------

fn adapt_fwd(op: &Op, _ctx: &dyn Context, operands: &mut dyn CoordinateSet) -> usize {
    let n = operands.len();
    if op.params.boolean("noop") {
        return n;
    }
    let Ok(plan) = AxisPlan::from_params(&op.params) else {
        return 0;
    };

    for i in 0..n {
        let c = operands.get_coord(i);
        let mut adapted = Coor4D::default();
        for axis in 0..4 {
            adapted[axis] = c[plan.post[axis]] * plan.mult[axis];
        }
        operands.set_coord(i, &adapted);
    }
    n
}

// ----- I N V E R S E --------------------------------------------------------------

fn adapt_inv(op: &Op, _ctx: &dyn Context, operands: &mut dyn CoordinateSet) -> usize {
    let n = operands.len();
    if op.params.boolean("noop") {
        return n;
    }
    let Ok(plan) = AxisPlan::from_params(&op.params) else {
        return 0;
    };

    for i in 0..n {
        let c = operands.get_coord(i);
        let mut adapted = Coor4D::default();
        for axis in 0..4 {
            adapted[plan.post[axis]] = c[axis] / plan.mult[axis];
        }
        operands.set_coord(i, &adapted);
    }
    n
}

// ----- C O N S T R U C T O R ------------------------------------------------------

#[rustfmt::skip]
pub const GAMUT: [OpParameter; 3] = [
    OpParameter::Flag { key: "inv" },
    OpParameter::Text { key: "from", default: Some("enut") },
    OpParameter::Text { key: "to",   default: Some("enut") },
];

pub fn new(parameters: &RawParameters, ctx: &dyn Context) -> Result<Op, Error> {
    let mut op = Op::plain(
        parameters,
        InnerOp(adapt_fwd),
        Some(InnerOp(adapt_inv)),
        &GAMUT,
        ctx,
    )?;

    let from = AxisPlan::parse(&op.params.text("from")?)
        .ok_or(Error::Operator("adapt", "Bad value for 'from'"))?;
    let to = AxisPlan::parse(&op.params.text("to")?)
        .ok_or(Error::Operator("adapt", "Bad value for 'to'"))?;

    // Precompute the combined plan, and stash it in the parameter bins
    let plan = from.combine(&to)?;
    if plan.is_noop() {
        op.params.boolean.insert("noop");
    }
    op.params
        .series
        .insert("post", plan.post.iter().map(|&p| p as f64).collect());
    op.params.series.insert("mult", Vec::from(plan.mult));
    Ok(op)
}

// ----- A N C I L L A R Y   F U N C T I O N S -----------------------------------------

/// Where each internal axis comes from, and the factor to apply on the way
#[derive(Debug, Clone, PartialEq)]
struct AxisPlan {
    post: [usize; 4],
    mult: [f64; 4],
}

impl AxisPlan {
    fn parse(desc: &str) -> Option<AxisPlan> {
        let (axes, unit) = match desc.split_once('_') {
            Some((axes, unit)) => (axes, Some(unit)),
            None => (desc, None),
        };
        let to_radians = match unit {
            None | Some("rad") | Some("any") => 1.0,
            Some("deg") => std::f64::consts::PI / 180.,
            Some("gon") => std::f64::consts::PI / 200.,
            Some(_) => return None,
        };
        if axes.chars().count() != 4 {
            return None;
        }

        let mut post = [0_usize; 4];
        let mut mult = [1_f64; 4];
        let mut seen = [false; 4];
        for (i, designator) in axes.chars().enumerate() {
            let (axis, sign) = match designator {
                'e' => (0, 1.),
                'n' => (1, 1.),
                'u' => (2, 1.),
                't' => (3, 1.),
                'w' => (0, -1.),
                's' => (1, -1.),
                'd' => (2, -1.),
                'r' => (3, -1.),
                _ => return None,
            };
            // Each internal axis must be fed exactly once
            if seen[axis] {
                return None;
            }
            seen[axis] = true;
            post[i] = axis;
            mult[i] = sign * if axis < 2 { to_radians } else { 1.0 };
        }
        Some(AxisPlan { post, mult })
    }

    /// The single step plan going from `self` to `to`
    fn combine(&self, to: &AxisPlan) -> Result<AxisPlan, Error> {
        let mut post = [0_usize; 4];
        let mut mult = [1_f64; 4];
        for i in 0..4 {
            let source = self
                .post
                .iter()
                .position(|&p| p == to.post[i])
                .ok_or(Error::Operator("adapt", "Inconsistent axis descriptors"))?;
            post[i] = source;
            mult[i] = self.mult[source] / to.mult[i];
        }
        Ok(AxisPlan { post, mult })
    }

    #[allow(clippy::float_cmp)]
    fn is_noop(&self) -> bool {
        self.post == [0, 1, 2, 3] && self.mult == [1.; 4]
    }

    fn from_params(params: &ParsedParameters) -> Result<AxisPlan, Error> {
        let post = params.series("post")?;
        let mult = params.series("mult")?;
        if post.len() != 4 || mult.len() != 4 {
            return Err(Error::Operator("adapt", "Malformed axis plan"));
        }
        Ok(AxisPlan {
            post: [
                post[0] as usize,
                post[1] as usize,
                post[2] as usize,
                post[3] as usize,
            ],
            mult: [mult[0], mult[1], mult[2], mult[3]],
        })
    }
}

// ----- T E S T S ------------------------------------------------------------------
