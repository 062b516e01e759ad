use crate::error::DataMgrError;
use std::collections::{HashMap, HashSet};

/// One of a pipeline's required inputs: a variable name plus a refinement
/// level offset relative to the level the derived output is requested at
/// (almost always `0`; present for pipelines that need coarser inputs).
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub var: String,
    pub level_offset: i32,
}

impl PipelineInput {
    pub fn same_level(var: impl Into<String>) -> Self {
        PipelineInput { var: var.into(), level_offset: 0 }
    }
}

pub type ComputeFn = fn(inputs: &[&[f64]], dims: [usize; 3], missing: f64) -> Vec<Vec<f64>>;

/// A derived-variable recipe: named inputs feed a pure function producing
/// one or more named outputs, all sharing the same grid shape as the
/// inputs.
#[derive(Clone)]
pub struct Pipeline {
    pub name: String,
    pub inputs: Vec<PipelineInput>,
    pub outputs: Vec<String>,
    pub compute: ComputeFn,
}

/// Registry of derived-variable pipelines, rejecting any registration
/// whose input/output variables would form a cycle through the existing
/// set (a derived variable may not, directly or transitively, depend on
/// itself).
#[derive(Default)]
pub struct PipelineRegistry {
    pipelines: Vec<Pipeline>,
    producer: HashMap<String, usize>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        PipelineRegistry::default()
    }

    pub fn register(&mut self, pipeline: Pipeline) -> Result<(), DataMgrError> {
        if self.creates_cycle(&pipeline) {
            return Err(DataMgrError::InvalidParam(format!("pipeline {} would introduce a dependency cycle", pipeline.name)));
        }
        let idx = self.pipelines.len();
        for out in &pipeline.outputs {
            self.producer.insert(out.clone(), idx);
        }
        self.pipelines.push(pipeline);
        Ok(())
    }

    pub fn lookup(&self, var: &str) -> Option<&Pipeline> {
        self.producer.get(var).map(|&i| &self.pipelines[i])
    }

    pub fn is_derived(&self, var: &str) -> bool {
        self.producer.contains_key(var)
    }

    fn creates_cycle(&self, candidate: &Pipeline) -> bool {
        // Walk every input's transitive dependency chain; if any of the
        // candidate's own outputs is reachable, registering it would close
        // a cycle.
        let mut visited = HashSet::new();
        let mut stack: Vec<String> = candidate.inputs.iter().map(|i| i.var.clone()).collect();
        while let Some(var) = stack.pop() {
            if candidate.outputs.contains(&var) {
                return true;
            }
            if !visited.insert(var.clone()) {
                continue;
            }
            if let Some(p) = self.lookup(&var) {
                stack.extend(p.inputs.iter().map(|i| i.var.clone()));
            }
        }
        false
    }
}

const GRAVITY: f64 = 9.81;

fn elevation(inputs: &[&[f64]], dims: [usize; 3], missing: f64) -> Vec<Vec<f64>> {
    let (ph, phb) = (inputs[0], inputs[1]);
    let n = dims[0] * dims[1] * dims[2];
    let mut out = vec![0.0; n];
    for i in 0..n {
        out[i] = if ph[i] == missing || phb[i] == missing { missing } else { (ph[i] + phb[i]) / GRAVITY };
    }
    vec![out]
}

fn full_pressure(inputs: &[&[f64]], dims: [usize; 3], missing: f64) -> Vec<Vec<f64>> {
    let (p, pb) = (inputs[0], inputs[1]);
    let n = dims[0] * dims[1] * dims[2];
    let mut out = vec![0.0; n];
    for i in 0..n {
        out[i] = if p[i] == missing || pb[i] == missing { missing } else { p[i] + pb[i] };
    }
    vec![out]
}

fn theta(inputs: &[&[f64]], dims: [usize; 3], missing: f64) -> Vec<Vec<f64>> {
    let t = inputs[0];
    let n = dims[0] * dims[1] * dims[2];
    let mut out = vec![0.0; n];
    for i in 0..n {
        out[i] = if t[i] == missing { missing } else { t[i] + 300.0 };
    }
    vec![out]
}

fn temperature_kelvin(inputs: &[&[f64]], dims: [usize; 3], missing: f64) -> Vec<Vec<f64>> {
    let (theta, p_full) = (inputs[0], inputs[1]);
    let n = dims[0] * dims[1] * dims[2];
    let mut out = vec![0.0; n];
    for i in 0..n {
        out[i] = if theta[i] == missing || p_full[i] == missing { missing } else { 0.037 * theta[i] * p_full[i].powf(0.29) };
    }
    vec![out]
}

fn wind_magnitude(inputs: &[&[f64]], dims: [usize; 3], missing: f64) -> Vec<Vec<f64>> {
    let (u, v, w) = (inputs[0], inputs[1], inputs[2]);
    let n = dims[0] * dims[1] * dims[2];
    let mut out = vec![0.0; n];
    for i in 0..n {
        out[i] = if u[i] == missing || v[i] == missing || w[i] == missing {
            missing
        } else {
            (u[i] * u[i] + v[i] * v[i] + w[i] * w[i]).sqrt()
        };
    }
    vec![out]
}

/// `z = eta*(depth+zeta) + depth` for the `ocean_s_coordinate` family's
/// simplified (non-stretching-function) form.
fn ocean_s_coordinate(inputs: &[&[f64]], dims: [usize; 3], missing: f64) -> Vec<Vec<f64>> {
    let (s, depth, zeta) = (inputs[0], inputs[1], inputs[2]);
    let n = dims[0] * dims[1] * dims[2];
    let mut out = vec![0.0; n];
    for i in 0..n {
        out[i] = if s[i] == missing || depth[i] == missing || zeta[i] == missing {
            missing
        } else {
            s[i] * (depth[i] + zeta[i]) + depth[i]
        };
    }
    vec![out]
}

/// Registers the built-in atmospheric/oceanic pipelines named in the core.
/// Callers needing only a subset may build a bare `PipelineRegistry` and
/// register selectively instead.
pub fn builtin_registry() -> PipelineRegistry {
    let mut r = PipelineRegistry::new();
    r.register(Pipeline {
        name: "ELEVATION".to_string(),
        inputs: vec![PipelineInput::same_level("PH"), PipelineInput::same_level("PHB")],
        outputs: vec!["ELEVATION".to_string()],
        compute: elevation,
    })
    .expect("builtin pipeline registration cannot cycle");
    r.register(Pipeline {
        name: "P_full".to_string(),
        inputs: vec![PipelineInput::same_level("P"), PipelineInput::same_level("PB")],
        outputs: vec!["P_full".to_string()],
        compute: full_pressure,
    })
    .expect("builtin pipeline registration cannot cycle");
    r.register(Pipeline {
        name: "Theta".to_string(),
        inputs: vec![PipelineInput::same_level("T")],
        outputs: vec!["Theta".to_string()],
        compute: theta,
    })
    .expect("builtin pipeline registration cannot cycle");
    r.register(Pipeline {
        name: "TK".to_string(),
        inputs: vec![PipelineInput::same_level("Theta"), PipelineInput::same_level("P_full")],
        outputs: vec!["TK".to_string()],
        compute: temperature_kelvin,
    })
    .expect("builtin pipeline registration cannot cycle");
    r.register(Pipeline {
        name: "wind_magnitude".to_string(),
        inputs: vec![PipelineInput::same_level("U"), PipelineInput::same_level("V"), PipelineInput::same_level("W")],
        outputs: vec!["wind_magnitude".to_string()],
        compute: wind_magnitude,
    })
    .expect("builtin pipeline registration cannot cycle");
    r.register(Pipeline {
        name: "ocean_s_coordinate".to_string(),
        inputs: vec![PipelineInput::same_level("s_rho"), PipelineInput::same_level("h"), PipelineInput::same_level("zeta")],
        outputs: vec!["z_rho".to_string()],
        compute: ocean_s_coordinate,
    })
    .expect("builtin pipeline registration cannot cycle");
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(_inputs: &[&[f64]], dims: [usize; 3], _missing: f64) -> Vec<Vec<f64>> {
        vec![vec![0.0; dims[0] * dims[1] * dims[2]]]
    }

    #[test]
    fn builtin_registry_resolves_elevation_and_tk() {
        let r = builtin_registry();
        assert!(r.is_derived("ELEVATION"));
        assert!(r.is_derived("TK"));
        assert!(!r.is_derived("PH"));
        let tk = r.lookup("TK").unwrap();
        assert_eq!(tk.inputs.len(), 2);
    }

    #[test]
    fn direct_self_cycle_is_rejected() {
        let mut r = PipelineRegistry::new();
        let p = Pipeline { name: "bad".to_string(), inputs: vec![PipelineInput::same_level("bad")], outputs: vec!["bad".to_string()], compute: identity };
        assert!(r.register(p).is_err());
    }

    #[test]
    fn transitive_cycle_through_existing_pipeline_is_rejected() {
        let mut r = PipelineRegistry::new();
        r.register(Pipeline { name: "a".to_string(), inputs: vec![PipelineInput::same_level("b")], outputs: vec!["a".to_string()], compute: identity }).unwrap();
        let back = Pipeline { name: "b".to_string(), inputs: vec![PipelineInput::same_level("a")], outputs: vec!["b".to_string()], compute: identity };
        assert!(r.register(back).is_err());
    }

    #[test]
    fn independent_pipelines_register_fine() {
        let mut r = PipelineRegistry::new();
        r.register(Pipeline { name: "a".to_string(), inputs: vec![PipelineInput::same_level("x")], outputs: vec!["a".to_string()], compute: identity }).unwrap();
        r.register(Pipeline { name: "b".to_string(), inputs: vec![PipelineInput::same_level("a")], outputs: vec!["b".to_string()], compute: identity }).unwrap();
        assert!(r.is_derived("b"));
    }

    #[test]
    fn elevation_propagates_missing_from_either_input() {
        let missing = -9999.0;
        let ph = [1.0, missing];
        let phb = [2.0, 3.0];
        let out = elevation(&[&ph, &phb], [2, 1, 1], missing);
        assert!((out[0][0] - 3.0 / GRAVITY).abs() < 1e-9);
        assert_eq!(out[0][1], missing);
    }
}
