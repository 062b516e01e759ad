//! A minimal XML-equivalent textual format for the master file: a
//! hand-written `write!`-based emitter paired with a hand-written
//! recursive-descent reader, replacing the Expat-style streaming parser the
//! original tooling used (the schema below is flat enough that a full
//! streaming callback interface isn't needed).

use crate::attribute::{AttrDict, AttrValue};
use crate::error::MetadataError;
use crate::master::{MasterFile, VdcType};
use crate::timestep::{StretchedCoords, TimestepDef};
use crate::variable::{NumericType, Orientation, VariableDef};
use core::fmt::Write as _;

const SCHEMA_VERSION: &str = "1";

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn unescape(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&amp;", "&")
}

fn join_usize(v: &[usize]) -> String {
    v.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(",")
}

fn join_f64(v: &[f64]) -> String {
    v.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(",")
}

fn parse_usize_list(s: &str) -> Result<Vec<usize>, MetadataError> {
    s.split(',')
        .map(|tok| {
            tok.trim()
                .parse::<usize>()
                .map_err(|_| MetadataError::Corrupt(format!("expected integer list, got {:?}", s)))
        })
        .collect()
}

fn parse_f64_list(s: &str) -> Result<Vec<f64>, MetadataError> {
    s.split(',')
        .map(|tok| {
            tok.trim()
                .parse::<f64>()
                .map_err(|_| MetadataError::Corrupt(format!("expected float list, got {:?}", s)))
        })
        .collect()
}

fn attr_xml(indent: &str, name: &str, value: &AttrValue) -> String {
    let mut out = String::new();
    match value {
        AttrValue::Text(s) => {
            let _ = write!(out, "{}<vdc:attr name=\"{}\" type=\"text\">{}</vdc:attr>\n", indent, escape(name), escape(s));
        }
        AttrValue::Int(n) => {
            let _ = write!(out, "{}<vdc:attr name=\"{}\" type=\"int\">{}</vdc:attr>\n", indent, escape(name), n);
        }
        AttrValue::Float(n) => {
            let _ = write!(out, "{}<vdc:attr name=\"{}\" type=\"float\">{}</vdc:attr>\n", indent, escape(name), n);
        }
        AttrValue::IntVec(v) => {
            let _ = write!(
                out,
                "{}<vdc:attr name=\"{}\" type=\"intvec\">{}</vdc:attr>\n",
                indent,
                escape(name),
                v.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(",")
            );
        }
        AttrValue::FloatVec(v) => {
            let _ = write!(out, "{}<vdc:attr name=\"{}\" type=\"floatvec\">{}</vdc:attr>\n", indent, escape(name), join_f64(v));
        }
    }
    out
}

/// Serializes a master file into its textual representation.
pub fn serialize(m: &MasterFile) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<vdc:master version=\"{}\" dims=\"{}\" brick=\"{}\" levels=\"{}\" cratios=\"{}\" wavelet=\"{}\" vdc_type=\"{}\">\n",
        SCHEMA_VERSION,
        join_usize(&m.dims),
        join_usize(&m.brick_size),
        m.num_levels,
        join_usize(&m.cratios),
        escape(&m.wavelet_name),
        match m.vdc_type {
            VdcType::Type1 => 1,
            VdcType::Type2 => 2,
        }
    );

    for (name, value) in m.root_attrs.iter() {
        out.push_str(&attr_xml("  ", name, value));
    }

    for v in m.variables() {
        let _ = write!(
            out,
            "  <vdc:variable name=\"{}\" orientation=\"{}\" type=\"{}\" compressed=\"{}\">\n",
            escape(&v.name),
            v.orientation.as_str(),
            v.numeric_type.as_str(),
            v.compressed
        );
        for cv in &v.coord_vars {
            let _ = write!(out, "    <vdc:coordvar>{}</vdc:coordvar>\n", escape(cv));
        }
        if let Some(mv) = v.missing_value {
            let _ = write!(out, "    <vdc:missing>{}</vdc:missing>\n", mv);
        }
        for (name, value) in v.attrs.iter() {
            out.push_str(&attr_xml("    ", name, value));
        }
        out.push_str("  </vdc:variable>\n");
    }

    for ts in m.timesteps() {
        let _ = write!(
            out,
            "  <vdc:timestep user_time=\"{}\" min=\"{}\" max=\"{}\">\n",
            ts.user_time,
            join_f64(&ts.extent_min),
            join_f64(&ts.extent_max)
        );
        if let Some(stamp) = &ts.timestamp {
            let _ = write!(out, "    <vdc:timestamp>{}</vdc:timestamp>\n", escape(stamp));
        }
        if let Some(coords) = &ts.coords {
            let _ = write!(out, "    <vdc:coords axis=\"x\">{}</vdc:coords>\n", join_f64(&coords.x));
            let _ = write!(out, "    <vdc:coords axis=\"y\">{}</vdc:coords>\n", join_f64(&coords.y));
            let _ = write!(out, "    <vdc:coords axis=\"z\">{}</vdc:coords>\n", join_f64(&coords.z));
        }
        for (name, value) in ts.attrs.iter() {
            out.push_str(&attr_xml("    ", name, value));
        }
        out.push_str("  </vdc:timestep>\n");
    }

    out.push_str("</vdc:master>\n");
    out
}

/// One parsed element: a start tag's attributes plus its text content and
/// nested elements, in document order. The format always puts either text
/// or children inside an element, never both, which keeps this a flat
/// one-pass parser instead of a full mixed-content XML reader.
#[derive(Debug)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn attr(&self, name: &str) -> Result<&str, MetadataError> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .ok_or_else(|| MetadataError::Corrupt(format!("<{}> missing attribute {:?}", self.name, name)))
    }
}

struct Tokenizer<'a> {
    bytes: &'a [u8],
    pos: usize,
}

enum Token {
    Start { name: String, attrs: Vec<(String, String)>, self_closing: bool },
    End { name: String },
    Text(String),
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Tokenizer { bytes: input.as_bytes(), pos: 0 }
    }

    fn next_token(&mut self) -> Result<Option<Token>, MetadataError> {
        if self.pos >= self.bytes.len() {
            return Ok(None);
        }
        if self.bytes[self.pos] != b'<' {
            let start = self.pos;
            while self.pos < self.bytes.len() && self.bytes[self.pos] != b'<' {
                self.pos += 1;
            }
            let text = std::str::from_utf8(&self.bytes[start..self.pos])
                .map_err(|_| MetadataError::Corrupt("invalid utf8".to_string()))?
                .trim()
                .to_string();
            if text.is_empty() {
                return self.next_token();
            }
            return Ok(Some(Token::Text(unescape(&text))));
        }

        let close = self.find(b'>', self.pos)?;
        let raw = std::str::from_utf8(&self.bytes[self.pos + 1..close])
            .map_err(|_| MetadataError::Corrupt("invalid utf8 in tag".to_string()))?
            .trim();
        self.pos = close + 1;

        if let Some(name) = raw.strip_prefix('/') {
            return Ok(Some(Token::End { name: name.trim().to_string() }));
        }

        let self_closing = raw.ends_with('/');
        let body = raw.trim_end_matches('/').trim();
        let mut parts = body.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or("").to_string();
        let rest = parts.next().unwrap_or("");
        let attrs = parse_attrs(rest)?;
        Ok(Some(Token::Start { name, attrs, self_closing }))
    }

    fn find(&self, needle: u8, from: usize) -> Result<usize, MetadataError> {
        self.bytes[from..]
            .iter()
            .position(|&b| b == needle)
            .map(|p| p + from)
            .ok_or_else(|| MetadataError::Corrupt("unterminated tag".to_string()))
    }
}

fn parse_attrs(s: &str) -> Result<Vec<(String, String)>, MetadataError> {
    let mut out = Vec::new();
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        let name_start = i;
        while i < bytes.len() && bytes[i] != b'=' {
            i += 1;
        }
        let name = s[name_start..i].trim().to_string();
        i += 1; // skip '='
        if i >= bytes.len() || bytes[i] != b'"' {
            return Err(MetadataError::Corrupt(format!("malformed attribute near {:?}", s)));
        }
        i += 1;
        let val_start = i;
        while i < bytes.len() && bytes[i] != b'"' {
            i += 1;
        }
        if i >= bytes.len() {
            return Err(MetadataError::Corrupt("unterminated attribute value".to_string()));
        }
        let value = unescape(&s[val_start..i]);
        i += 1;
        if !name.is_empty() {
            out.push((name, value));
        }
    }
    Ok(out)
}

/// Parses children of an already-opened element until its matching end tag.
fn parse_children(tok: &mut Tokenizer, parent_name: &str) -> Result<Vec<Element>, MetadataError> {
    let mut children = Vec::new();
    loop {
        match tok.next_token()? {
            Some(Token::End { name }) => {
                if name != parent_name {
                    return Err(MetadataError::Corrupt(format!(
                        "mismatched closing tag: expected </{}>, found </{}>",
                        parent_name, name
                    )));
                }
                return Ok(children);
            }
            Some(Token::Text(_)) => continue,
            Some(Token::Start { name, attrs, self_closing }) => {
                let mut el = Element { name: name.clone(), attrs, children: Vec::new(), text: String::new() };
                if !self_closing {
                    let mut text = String::new();
                    loop {
                        let before = tok.pos;
                        match tok.next_token()? {
                            Some(Token::Text(t)) => text.push_str(&t),
                            Some(Token::End { name: end_name }) if end_name == name => break,
                            Some(Token::Start { .. }) => {
                                tok.pos = before;
                                el.children = parse_children(tok, &name)?;
                                break;
                            }
                            Some(Token::End { name: end_name }) => {
                                return Err(MetadataError::Corrupt(format!(
                                    "mismatched closing tag: expected </{}>, found </{}>",
                                    name, end_name
                                )))
                            }
                            None => return Err(MetadataError::Corrupt(format!("unexpected end of input inside <{}>", name))),
                        }
                    }
                    el.text = text;
                }
                children.push(el);
            }
            None => return Err(MetadataError::Corrupt(format!("unexpected end of input inside <{}>", parent_name))),
        }
    }
}

fn parse_attr_value(kind: &str, text: &str) -> Result<AttrValue, MetadataError> {
    match kind {
        "text" => Ok(AttrValue::Text(text.to_string())),
        "int" => text
            .parse::<i64>()
            .map(AttrValue::Int)
            .map_err(|_| MetadataError::Corrupt(format!("expected int attribute, got {:?}", text))),
        "float" => text
            .parse::<f64>()
            .map(AttrValue::Float)
            .map_err(|_| MetadataError::Corrupt(format!("expected float attribute, got {:?}", text))),
        "intvec" => {
            if text.trim().is_empty() {
                Ok(AttrValue::IntVec(Vec::new()))
            } else {
                text.split(',')
                    .map(|t| t.trim().parse::<i64>())
                    .collect::<Result<Vec<_>, _>>()
                    .map(AttrValue::IntVec)
                    .map_err(|_| MetadataError::Corrupt(format!("expected intvec attribute, got {:?}", text)))
            }
        }
        "floatvec" => {
            if text.trim().is_empty() {
                Ok(AttrValue::FloatVec(Vec::new()))
            } else {
                Ok(AttrValue::FloatVec(parse_f64_list(text)?))
            }
        }
        other => Err(MetadataError::Corrupt(format!("unknown attribute type {:?}", other))),
    }
}

fn collect_attrs(elements: &[Element], into: &mut AttrDict) -> Result<(), MetadataError> {
    for el in elements {
        if el.name != "vdc:attr" {
            continue;
        }
        let name = el.attr("name")?.to_string();
        let kind = el.attr("type")?.to_string();
        into.set(name, parse_attr_value(&kind, &el.text)?);
    }
    Ok(())
}

/// Parses a master file from its textual representation.
pub fn deserialize(input: &str) -> Result<MasterFile, MetadataError> {
    let mut tok = Tokenizer::new(input);
    let root = match tok.next_token()? {
        Some(Token::Start { name, attrs, self_closing }) if name == "vdc:master" && !self_closing => {
            let children = parse_children(&mut tok, &name)?;
            Element { name, attrs, children, text: String::new() }
        }
        _ => return Err(MetadataError::Corrupt("expected root element <vdc:master>".to_string())),
    };

    let dims = parse_usize_list(root.attr("dims")?)?;
    let brick = parse_usize_list(root.attr("brick")?)?;
    if dims.len() != 3 || brick.len() != 3 {
        return Err(MetadataError::Corrupt("dims/brick must each have 3 components".to_string()));
    }
    let levels: usize = root
        .attr("levels")?
        .parse()
        .map_err(|_| MetadataError::Corrupt("levels must be an integer".to_string()))?;
    let cratios = parse_usize_list(root.attr("cratios")?)?;
    let wavelet_name = root.attr("wavelet")?.to_string();
    let vdc_type = match root.attr("vdc_type")? {
        "1" => VdcType::Type1,
        "2" => VdcType::Type2,
        other => return Err(MetadataError::Corrupt(format!("unknown vdc_type {:?}", other))),
    };

    let mut m = MasterFile::new(
        [dims[0], dims[1], dims[2]],
        [brick[0], brick[1], brick[2]],
        levels,
        cratios,
        wavelet_name,
        vdc_type,
    )?;

    collect_attrs(&root.children, &mut m.root_attrs)?;

    for el in &root.children {
        match el.name.as_str() {
            "vdc:variable" => {
                let name = el.attr("name")?.to_string();
                let orientation = Orientation::from_str(el.attr("orientation")?)
                    .ok_or_else(|| MetadataError::Corrupt("unknown orientation".to_string()))?;
                let numeric_type = NumericType::from_str(el.attr("type")?)
                    .ok_or_else(|| MetadataError::Corrupt("unknown numeric type".to_string()))?;
                let compressed = el.attr("compressed")?.parse::<bool>().unwrap_or(true);
                let mut v = VariableDef::new(name, orientation, numeric_type);
                v.compressed = compressed;
                for child in &el.children {
                    match child.name.as_str() {
                        "vdc:coordvar" => v.coord_vars.push(child.text.clone()),
                        "vdc:missing" => {
                            v.missing_value = Some(
                                child
                                    .text
                                    .parse()
                                    .map_err(|_| MetadataError::Corrupt("malformed missing value".to_string()))?,
                            )
                        }
                        "vdc:attr" => {}
                        other => return Err(MetadataError::Corrupt(format!("unexpected element <{}>", other))),
                    }
                }
                collect_attrs(&el.children, &mut v.attrs)?;
                m.add_variable(v)?;
            }
            "vdc:timestep" => {
                let user_time: f64 = el
                    .attr("user_time")?
                    .parse()
                    .map_err(|_| MetadataError::Corrupt("malformed user_time".to_string()))?;
                let min = parse_f64_list(el.attr("min")?)?;
                let max = parse_f64_list(el.attr("max")?)?;
                if min.len() != 3 || max.len() != 3 {
                    return Err(MetadataError::Corrupt("timestep min/max must have 3 components".to_string()));
                }
                let mut ts = TimestepDef::new(user_time, [min[0], min[1], min[2]], [max[0], max[1], max[2]]);
                let mut coords = StretchedCoords::default();
                let mut has_coords = false;
                for child in &el.children {
                    match child.name.as_str() {
                        "vdc:timestamp" => ts.timestamp = Some(child.text.clone()),
                        "vdc:coords" => {
                            has_coords = true;
                            let axis = child.attr("axis")?;
                            let vals = parse_f64_list(&child.text)?;
                            match axis {
                                "x" => coords.x = vals,
                                "y" => coords.y = vals,
                                "z" => coords.z = vals,
                                other => return Err(MetadataError::Corrupt(format!("unknown coords axis {:?}", other))),
                            }
                        }
                        "vdc:attr" => {}
                        other => return Err(MetadataError::Corrupt(format!("unexpected element <{}>", other))),
                    }
                }
                if has_coords {
                    ts.coords = Some(coords);
                }
                collect_attrs(&el.children, &mut ts.attrs)?;
                m.add_timestep(ts)?;
            }
            "vdc:attr" => {}
            other => return Err(MetadataError::Corrupt(format!("unexpected element <{}>", other))),
        }
    }

    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::{NumericType, Orientation};

    fn sample() -> MasterFile {
        let mut m = MasterFile::new([64, 64, 32], [32, 32, 32], 2, vec![1, 10, 100], "bior3.3", VdcType::Type2).unwrap();
        m.set_root_attr("title", AttrValue::Text("test run".to_string())).unwrap();
        let mut v = VariableDef::new("u", Orientation::ThreeD, NumericType::F32);
        v.coord_vars.push("x".to_string());
        v.missing_value = Some(1e37);
        v.attrs.set("units", AttrValue::Text("m/s".to_string()));
        m.add_variable(v).unwrap();
        let mut ts = TimestepDef::new(0.0, [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        ts.timestamp = Some("2026-01-01".to_string());
        ts.coords = Some(StretchedCoords { x: vec![0.0, 1.0], y: vec![0.0, 1.0], z: vec![0.0, 0.5, 1.0] });
        m.add_timestep(ts).unwrap();
        m
    }

    #[test]
    fn round_trips_full_schema() {
        let m = sample();
        let text = serialize(&m);
        let back = deserialize(&text).unwrap();
        assert_eq!(back.dims, m.dims);
        assert_eq!(back.brick_size, m.brick_size);
        assert_eq!(back.cratios, m.cratios);
        assert_eq!(back.wavelet_name, m.wavelet_name);
        assert_eq!(back.variables().len(), 1);
        assert_eq!(back.variables()[0].name, "u");
        assert_eq!(back.variables()[0].missing_value, Some(1e37));
        assert_eq!(back.timesteps().len(), 1);
        assert_eq!(back.timesteps()[0].timestamp.as_deref(), Some("2026-01-01"));
        assert_eq!(back.root_attrs.get("title"), Some(&AttrValue::Text("test run".to_string())));
    }

    #[test]
    fn escapes_special_characters_in_text_attrs() {
        let mut m = MasterFile::new([4, 4, 4], [2, 2, 2], 1, vec![1], "haar", VdcType::Type1).unwrap();
        m.set_root_attr("note", AttrValue::Text("a < b & c > \"d\"".to_string())).unwrap();
        let text = serialize(&m);
        let back = deserialize(&text).unwrap();
        assert_eq!(back.root_attrs.get("note"), Some(&AttrValue::Text("a < b & c > \"d\"".to_string())));
    }

    #[test]
    fn rejects_truncated_document() {
        let m = sample();
        let mut text = serialize(&m);
        text.truncate(text.len() / 2);
        assert!(deserialize(&text).is_err());
    }
}
