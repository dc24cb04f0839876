//! Construction of transformation pipelines between pairs of CRS identifiers.

use crate::authoring::*;
use crate::registry::Registry;
use std::fmt;
use std::sync::Mutex;

/// The role of a single pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Between two catalog CRS, possibly across datums
    DatumShift,
    /// Between two CRS differing only in their vertical component
    HeightConversion,
    /// From a catalog CRS into a local east-north-up frame
    GeocentricToTopocentric,
    /// From a local east-north-up frame into its base CRS
    TopocentricToGeocentric,
}

/// One step of a [`TransformationPipeline`], executed by the provider
/// operator `op`
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStep {
    pub kind: StepKind,
    pub source: String,
    pub target: String,
    pub op: OpHandle,
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {} -> {}", self.kind, self.source, self.target)
    }
}

/// An ordered sequence of steps, where each step picks up where its
/// predecessor left off. Empty for the identity
#[derive(Debug, Clone, PartialEq)]
pub struct TransformationPipeline {
    source: String,
    target: String,
    steps: Vec<PipelineStep>,
    requires_3d: bool,
}

impl TransformationPipeline {
    fn new(
        source: &CrsDescriptor,
        target: &CrsDescriptor,
        steps: Vec<PipelineStep>,
        requires_3d: bool,
    ) -> TransformationPipeline {
        let pipeline = TransformationPipeline {
            source: source.to_string(),
            target: target.to_string(),
            steps,
            requires_3d,
        };
        debug_assert!(pipeline.is_chained());
        pipeline
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    /// True if any end point lives in a frame where a height is needed
    pub fn requires_3d(&self) -> bool {
        self.requires_3d
    }

    /// Does each step start where the previous one ended, and do the
    /// steps span the pipeline end points?
    pub fn is_chained(&self) -> bool {
        let Some(first) = self.steps.first() else {
            return true;
        };
        let last = &self.steps[self.steps.len() - 1];
        first.source == self.source
            && last.target == self.target
            && self.steps.windows(2).all(|w| w[0].target == w[1].source)
    }
}

// ----- T H E   B U I L D E R ---------------------------------------------------------

/// Builds, and caches, [`TransformationPipeline`]s.
///
/// The cached pipelines refer to operators instantiated in the provider
/// context given to [`PipelineBuilder::build`], so a builder should be
/// used with one context only.
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    cache: Mutex<BTreeMap<(String, String), TransformationPipeline>>,
    /// Base CRS to datum-native geographic, one per topocentric base
    natives: Mutex<BTreeMap<String, OpHandle>>,
}

impl PipelineBuilder {
    pub fn new() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn build(
        &self,
        registry: &Registry,
        ctx: &mut dyn Context,
        source: &str,
        target: &str,
    ) -> Result<TransformationPipeline, Error> {
        let source = CrsDescriptor::parse(source)?;
        let target = CrsDescriptor::parse(target)?;
        registry.validate_descriptor(&source)?;
        registry.validate_descriptor(&target)?;

        let key = (source.to_string(), target.to_string());
        if let Some(pipeline) = self.lock()?.get(&key) {
            trace!("Pipeline cache hit: {} -> {}", key.0, key.1);
            return Ok(pipeline.clone());
        }

        let requires_3d = needs_height(registry, &source)? || needs_height(registry, &target)?;
        let steps = if source == target {
            Vec::new()
        } else {
            let mut natives = self
                .natives
                .lock()
                .map_err(|_| Error::General("PipelineBuilder: cache poisoned"))?;
            build_steps(ctx, &mut natives, &source, &target)?
        };
        let pipeline = TransformationPipeline::new(&source, &target, steps, requires_3d);
        debug!(
            "Built pipeline {} -> {}: {} steps",
            key.0,
            key.1,
            pipeline.steps.len()
        );

        self.lock()?.insert(key, pipeline.clone());
        Ok(pipeline)
    }

    pub fn clear_cache(&self) -> Result<(), Error> {
        self.lock()?.clear();
        Ok(())
    }

    pub fn cached(&self) -> usize {
        self.lock().map(|cache| cache.len()).unwrap_or_default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<(String, String), TransformationPipeline>>, Error>
    {
        self.cache
            .lock()
            .map_err(|_| Error::General("PipelineBuilder: cache poisoned"))
    }
}

// ----- A N C I L L A R Y   F U N C T I O N S -----------------------------------------

fn needs_height(registry: &Registry, crs: &CrsDescriptor) -> Result<bool, Error> {
    Ok(match crs {
        CrsDescriptor::Plain { code } => {
            let info = registry.lookup(code)?;
            info.is_geocentric() || info.is_compound()
        }
        CrsDescriptor::Compound { .. } | CrsDescriptor::Enu { .. } => true,
    })
}

fn build_steps(
    ctx: &mut dyn Context,
    natives: &mut BTreeMap<String, OpHandle>,
    source: &CrsDescriptor,
    target: &CrsDescriptor,
) -> Result<Vec<PipelineStep>, Error> {
    let mut steps = Vec::new();

    // Source side: leave the topocentric frame for its base CRS
    let from = match source {
        CrsDescriptor::Enu { base, origin } => {
            let frame = topocentric_frame(ctx, natives, base, origin)?;
            let definition = format!(
                "{} inv | cart inv ellps={} | {} inv",
                frame.topocentric, frame.ellps, frame.native
            );
            steps.push(PipelineStep {
                kind: StepKind::TopocentricToGeocentric,
                source: source.to_string(),
                target: base.clone(),
                op: ctx.op(&definition).map_err(provider_error)?,
            });
            base.clone()
        }
        _ => source.to_string(),
    };

    // Target side: the catalog CRS we must reach before entering a topocentric frame
    let to = match target {
        CrsDescriptor::Enu { base, .. } => base.clone(),
        _ => target.to_string(),
    };

    if from != to {
        // Next to a topocentric frame, the height is always significant
        let (kind, op) = match (source, target) {
            (CrsDescriptor::Enu { .. }, _) | (_, CrsDescriptor::Enu { .. }) => (
                StepKind::DatumShift,
                ctx.instantiate_transform(&from, &to, false)?,
            ),
            _ if source.horizontal() == target.horizontal() => {
                (StepKind::HeightConversion, ctx.create_transform(&from, &to)?)
            }
            _ => (StepKind::DatumShift, ctx.create_transform(&from, &to)?),
        };
        steps.push(PipelineStep {
            kind,
            source: from.clone(),
            target: to.clone(),
            op,
        });
    }

    if let CrsDescriptor::Enu { base, origin } = target {
        let frame = topocentric_frame(ctx, natives, base, origin)?;
        let definition = format!(
            "{} | cart ellps={} | {}",
            frame.native, frame.ellps, frame.topocentric
        );
        steps.push(PipelineStep {
            kind: StepKind::GeocentricToTopocentric,
            source: to,
            target: target.to_string(),
            op: ctx.op(&definition).map_err(provider_error)?,
        });
    }

    Ok(steps)
}

// The operator definitions needed for entering and leaving a topocentric frame
struct TopocentricFrame {
    /// Macro taking the base CRS to its datum-native geographic frame
    native: String,
    /// The base datum ellipsoid, as `a,rf`
    ellps: String,
    /// The topocentric operator, with the origin in geographic coordinates
    topocentric: String,
}

fn topocentric_frame(
    ctx: &mut dyn Context,
    natives: &mut BTreeMap<String, OpHandle>,
    base: &str,
    origin: &[f64; 3],
) -> Result<TopocentricFrame, Error> {
    let entry = ctx.catalog_entry(base)?;
    let native = format!("native:{base}");
    ctx.register_resource(&native, &entry.definition);

    let ellipsoid = ctx.ellipsoid_parameters_for(base)?;
    let ellps = format!(
        "{},{}",
        ellipsoid.semimajor_axis(),
        ellipsoid.reciprocal_flattening()
    );

    // The origin, converted from base coordinates to geographic ones
    let op = match natives.get(base) {
        Some(op) => *op,
        None => {
            let op = ctx.op(&native).map_err(provider_error)?;
            natives.insert(base.to_string(), op);
            op
        }
    };
    let mut position = [Coor4D::raw(origin[0], origin[1], origin[2], 0.)];
    if ctx.apply(op, Fwd, &mut position)? != 1 || position[0].is_nan() {
        return Err(Error::Provider(format!(
            "Cannot convert the origin of the {base} topocentric frame"
        )));
    }
    let (lon, lat, h) = position[0].xyz();

    let topocentric = format!(
        "topocentric ellps={ellps} lon_0={} lat_0={} h_0={h}",
        lon.to_degrees(),
        lat.to_degrees()
    );
    trace!("Topocentric frame: {topocentric}");
    Ok(TopocentricFrame {
        native,
        ellps,
        topocentric,
    })
}

fn provider_error(e: Error) -> Error {
    match e {
        Error::Provider(_) => e,
        other => Error::Provider(other.to_string()),
    }
}

// ----- T E S T S ---------------------------------------------------------------------
