use crate::attribute::AttrDict;

/// Which grid axes a variable varies over. 2-D variables live on one of the
/// three coordinate planes of a 3-D collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    ThreeD,
    TwoDXY,
    TwoDXZ,
    TwoDYZ,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::ThreeD => "3D",
            Orientation::TwoDXY => "2DXY",
            Orientation::TwoDXZ => "2DXZ",
            Orientation::TwoDYZ => "2DYZ",
        }
    }

    pub fn from_str(s: &str) -> Option<Orientation> {
        match s {
            "3D" => Some(Orientation::ThreeD),
            "2DXY" => Some(Orientation::TwoDXY),
            "2DXZ" => Some(Orientation::TwoDXZ),
            "2DYZ" => Some(Orientation::TwoDYZ),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericType {
    F32,
    F64,
}

impl NumericType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NumericType::F32 => "f32",
            NumericType::F64 => "f64",
        }
    }

    pub fn from_str(s: &str) -> Option<NumericType> {
        match s {
            "f32" => Some(NumericType::F32),
            "f64" => Some(NumericType::F64),
            _ => None,
        }
    }
}

/// A variable's schema entry: everything needed to locate and decode its
/// bricks, independent of any one timestep's data.
#[derive(Debug, Clone)]
pub struct VariableDef {
    pub name: String,
    pub orientation: Orientation,
    pub numeric_type: NumericType,
    pub compressed: bool,
    pub coord_vars: Vec<String>,
    pub missing_value: Option<f64>,
    pub attrs: AttrDict,
}

impl VariableDef {
    pub fn new(name: impl Into<String>, orientation: Orientation, numeric_type: NumericType) -> Self {
        VariableDef {
            name: name.into(),
            orientation,
            numeric_type,
            compressed: true,
            coord_vars: Vec::new(),
            missing_value: None,
            attrs: AttrDict::new(),
        }
    }
}
