use crate::attribute::AttrDict;

/// Per-axis stretched-grid coordinate arrays, present only when the
/// collection's grid type calls for them.
#[derive(Debug, Clone, Default)]
pub struct StretchedCoords {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct TimestepDef {
    pub user_time: f64,
    pub timestamp: Option<String>,
    pub coords: Option<StretchedCoords>,
    pub extent_min: [f64; 3],
    pub extent_max: [f64; 3],
    pub attrs: AttrDict,
}

impl TimestepDef {
    pub fn new(user_time: f64, extent_min: [f64; 3], extent_max: [f64; 3]) -> Self {
        TimestepDef {
            user_time,
            timestamp: None,
            coords: None,
            extent_min,
            extent_max,
            attrs: AttrDict::new(),
        }
    }
}
