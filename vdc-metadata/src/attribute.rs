use std::collections::BTreeMap;

/// A single attribute value. Richer than a plain string so that numeric
/// metadata (grid offsets, calibration constants) round-trips without a
/// text-parsing step on every read.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Int(i64),
    Float(f64),
    IntVec(Vec<i64>),
    FloatVec(Vec<f64>),
}

impl AttrValue {
    pub fn kind(&self) -> &'static str {
        match self {
            AttrValue::Text(_) => "text",
            AttrValue::Int(_) => "int",
            AttrValue::Float(_) => "float",
            AttrValue::IntVec(_) => "intvec",
            AttrValue::FloatVec(_) => "floatvec",
        }
    }
}

/// An ordered, name-keyed free-form attribute dictionary, attachable at the
/// root level, per-variable, or per-timestep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrDict {
    entries: BTreeMap<String, AttrValue>,
}

impl AttrDict {
    pub fn new() -> Self {
        AttrDict::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: AttrValue) {
        self.entries.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_round_trips_each_kind() {
        let mut d = AttrDict::new();
        d.set("title", AttrValue::Text("ocean run".to_string()));
        d.set("cycle", AttrValue::Int(42));
        d.set("dt", AttrValue::Float(0.25));
        d.set("levels", AttrValue::IntVec(vec![1, 2, 3]));
        d.set("weights", AttrValue::FloatVec(vec![0.1, 0.2]));
        assert_eq!(d.get("title"), Some(&AttrValue::Text("ocean run".to_string())));
        assert_eq!(d.get("cycle"), Some(&AttrValue::Int(42)));
        assert_eq!(d.len(), 5);
    }

    #[test]
    fn overwriting_a_name_replaces_the_value() {
        let mut d = AttrDict::new();
        d.set("x", AttrValue::Int(1));
        d.set("x", AttrValue::Int(2));
        assert_eq!(d.get("x"), Some(&AttrValue::Int(2)));
        assert_eq!(d.len(), 1);
    }
}
