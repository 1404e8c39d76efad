//! SVG composition for speaker icons.
//!
//! An icon is a country flag with a small gender glyph (Venus or Mars) drawn
//! in its lower-right corner. Both inputs are plain SVG documents; the flag's
//! children are copied verbatim and the glyph's children are recolored and
//! wrapped in a translated, scaled `<g>`.

use std::io::Write;

use anyhow::{Context, Result, anyhow, bail};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

const SVG_NS: &str = "http://www.w3.org/2000/svg";
/// Width/height assumed when the flag root omits them.
const DEFAULT_SIZE: f64 = 24.0;
/// Glyph documents are drawn on a 512-unit canvas.
const GLYPH_UNITS: f64 = 512.0;
/// Gap between the glyph and the flag's lower-right edge, in flag units.
pub const GLYPH_OFFSET: f64 = 5.0;

/// Elements whose own fill is never rewritten.
const PAINT_SERVER_TAGS: [&str; 6] = [
    "defs",
    "mask",
    "clipPath",
    "pattern",
    "linearGradient",
    "radialGradient",
];
const SHAPE_TAGS: [&str; 7] = [
    "path", "circle", "rect", "ellipse", "polygon", "polyline", "line",
];

/// Gender glyph drawn over a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenderMark {
    Venus,
    Mars,
}

impl GenderMark {
    /// Classify a free-form gender label. "female" is tested first because it
    /// contains "male".
    pub fn from_gender(gender: &str) -> Option<Self> {
        let lower = gender.to_lowercase();
        if lower.contains("female") {
            Some(Self::Venus)
        } else if lower.contains("male") {
            Some(Self::Mars)
        } else {
            None
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Venus => "#FF69B4",
            Self::Mars => "#1E90FF",
        }
    }
}

/// File name for the icon of a (gender, ISO code) pair.
pub fn icon_file_name(gender: &str, iso_code: &str) -> String {
    let gender = gender.to_lowercase().replace(' ', "_");
    format!("{gender}_{iso_code}.svg")
}

/// Icon file names to try for a speaker, most specific first.
///
/// Only the exact labels "male"/"female" (any case) select a gendered icon.
pub fn icon_candidates(gender: &str, iso_code: &str) -> [String; 3] {
    let lower = gender.to_lowercase();
    let prefix = if lower == "male" || lower == "female" {
        format!("{lower}_")
    } else {
        String::new()
    };
    [
        format!("{prefix}{iso_code}.svg"),
        format!("_{iso_code}.svg"),
        format!("{iso_code}.svg"),
    ]
}

/// Recolored glyph children, ready to embed in a flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    markup: String,
}

impl Glyph {
    pub fn from_svg(svg: &str, color: &str) -> Result<Self> {
        let parts = split_root(svg, |element| recolor_element(element, color))
            .context("parse glyph svg")?;
        Ok(Self {
            markup: parts.children,
        })
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }
}

/// Build the composite icon document for `flag_svg`.
pub fn compose_icon(flag_svg: &str, glyph: Option<&Glyph>) -> Result<String> {
    let flag = split_root(flag_svg, |element| Ok(element)).context("parse flag svg")?;
    let width = flag.number_attr("width")?.unwrap_or(DEFAULT_SIZE);
    let height = flag.number_attr("height")?.unwrap_or(DEFAULT_SIZE);
    let view_box = match flag.attr("viewBox") {
        Some(raw) => raw
            .split_whitespace()
            .map(|part| {
                part.parse::<f64>()
                    .map_err(|_| anyhow!("invalid viewBox value '{raw}'"))
            })
            .collect::<Result<Vec<_>>>()?,
        None => vec![0.0, 0.0, width, height],
    };
    let [vb_x, vb_y, vb_width, vb_height] = view_box[..] else {
        bail!("viewBox must have 4 numbers, got {}", view_box.len());
    };

    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut root = BytesStart::new("svg");
    root.push_attribute(("xmlns", SVG_NS));
    for (key, value) in &flag.namespaces {
        root.push_attribute((key.as_str(), value.as_str()));
    }
    root.push_attribute(("width", width.to_string().as_str()));
    root.push_attribute(("height", height.to_string().as_str()));
    let view_box = format!("{vb_x} {vb_y} {vb_width} {vb_height}");
    root.push_attribute(("viewBox", view_box.as_str()));
    writer.write_event(Event::Start(root))?;
    writer.get_mut().write_all(flag.children.as_bytes())?;

    if let Some(glyph) = glyph {
        let size = vb_width.min(vb_height) / 4.0;
        let x = vb_x + vb_width - size - GLYPH_OFFSET;
        let y = vb_y + vb_height - size - GLYPH_OFFSET;
        let transform = format!("translate({x}, {y}) scale({})", size / GLYPH_UNITS);
        let group = BytesStart::new("g").with_attributes([("transform", transform.as_str())]);
        writer.write_event(Event::Start(group))?;
        writer.get_mut().write_all(glyph.markup.as_bytes())?;
        writer.write_event(Event::End(BytesEnd::new("g")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("svg")))?;
    String::from_utf8(writer.into_inner()).context("composite svg is not utf-8")
}

/// Root `<svg>` attributes plus its re-serialized children.
struct SvgParts {
    attrs: Vec<(String, String)>,
    namespaces: Vec<(String, String)>,
    children: String,
}

impl SvgParts {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn number_attr(&self, key: &str) -> Result<Option<f64>> {
        self.attr(key)
            .map(|raw| {
                raw.trim()
                    .parse::<f64>()
                    .map_err(|_| anyhow!("invalid {key} value '{raw}'"))
            })
            .transpose()
    }
}

/// Split a document into its root element and children, passing every child
/// start/empty tag through `rewrite`.
fn split_root<F>(svg: &str, mut rewrite: F) -> Result<SvgParts>
where
    F: FnMut(BytesStart<'_>) -> Result<BytesStart<'_>>,
{
    let mut reader = Reader::from_str(svg);
    let mut writer = Writer::new(Vec::new());
    let mut root: Option<BytesStart<'static>> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Eof => {
                if root.is_none() {
                    bail!("document has no root element");
                }
                bail!("unexpected end of document inside <svg>");
            }
            Event::Start(element) if root.is_none() => {
                root = Some(checked_root(element)?);
            }
            Event::Empty(element) if root.is_none() => {
                root = Some(checked_root(element)?);
                break;
            }
            // Prolog: declaration, doctype, comments, whitespace.
            _ if root.is_none() => {}
            Event::Start(element) => {
                depth += 1;
                writer.write_event(Event::Start(rewrite(element)?))?;
            }
            Event::Empty(element) => {
                writer.write_event(Event::Empty(rewrite(element)?))?;
            }
            Event::End(element) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                writer.write_event(Event::End(element))?;
            }
            event => writer.write_event(event)?,
        }
    }

    let root = root.ok_or_else(|| anyhow!("document has no root element"))?;
    let mut attrs = Vec::new();
    let mut namespaces = Vec::new();
    for attr in root.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        if key.starts_with("xmlns:") {
            namespaces.push((key, value));
        } else {
            attrs.push((key, value));
        }
    }
    let children = String::from_utf8(writer.into_inner()).context("svg body is not utf-8")?;
    Ok(SvgParts {
        attrs,
        namespaces,
        children,
    })
}

fn checked_root(element: BytesStart<'_>) -> Result<BytesStart<'static>> {
    if element.local_name().as_ref() != b"svg" {
        bail!(
            "root element is <{}>, expected <svg>",
            String::from_utf8_lossy(element.name().as_ref())
        );
    }
    Ok(element.into_owned())
}

fn recolor_element<'a>(element: BytesStart<'a>, color: &str) -> Result<BytesStart<'a>> {
    let tag = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
    if PAINT_SERVER_TAGS.contains(&tag.as_str()) {
        return Ok(element);
    }

    let mut fill = None;
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"fill" {
            fill = Some(attr.unescape_value()?.into_owned());
        }
    }

    match fill.as_deref() {
        Some("none" | "transparent") => Ok(element),
        Some(_) => replace_fill(&element, color),
        None if SHAPE_TAGS.contains(&tag.as_str()) => {
            let mut element = element;
            element.push_attribute(("fill", color));
            Ok(element)
        }
        None => Ok(element),
    }
}

fn replace_fill(element: &BytesStart<'_>, color: &str) -> Result<BytesStart<'static>> {
    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
    let mut rewritten = BytesStart::new(name);
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"fill" {
            rewritten.push_attribute(("fill", color));
        } else {
            rewritten.push_attribute(attr);
        }
    }
    Ok(rewritten)
}
