//! Streaming adapter from OSM XML to typed element events.
//!
//! [`ElementStream`] pulls events from a `quick-xml` reader one at a time and
//! translates the four element kinds the pipeline understands (`node`, `way`,
//! `nd` and `tag`) into [`ElementEvent`]s with their attributes already parsed.
//! Every other element (`osm`, `bounds`, `relation`, `member`, ...) is skipped.
//! Self-closing `<node/>` and `<way/>` elements produce their open and close
//! events back to back.

use std::io::BufRead;
use std::ops::RangeInclusive;

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use osmgrid_core::NodeId;

mod error;

pub use error::ElementStreamError;

const LATITUDE_RANGE: RangeInclusive<f64> = -90.0..=90.0;
const LONGITUDE_RANGE: RangeInclusive<f64> = -180.0..=180.0;

/// A parsed OSM XML element boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementEvent {
    /// Start of a `<node>` with its identifier and coordinates.
    PointOpen {
        /// Node identifier.
        id: NodeId,
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lon: f64,
    },
    /// End of a `<node>`.
    PointClose,
    /// Start of a `<way>`.
    WayOpen,
    /// End of a `<way>`.
    WayClose,
    /// An `<nd ref="..."/>` reference.
    NodeRef {
        /// Referenced node identifier.
        id: NodeId,
    },
    /// A `<tag k="..." v="..."/>`; either side may be absent.
    Tag {
        /// Tag key.
        key: Option<String>,
        /// Tag value.
        value: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementKind {
    Point,
    Way,
    NodeRef,
    Tag,
}

impl ElementKind {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"node" => Some(Self::Point),
            b"way" => Some(Self::Way),
            b"nd" => Some(Self::NodeRef),
            b"tag" => Some(Self::Tag),
            _ => None,
        }
    }
}

/// Lazy, forward-only iterator of [`ElementEvent`]s.
///
/// The iterator is fused: after it yields an error or reaches the end of the
/// document it keeps returning `None`.
///
/// # Examples
/// ```
/// use osmgrid_data::{ElementEvent, ElementStream};
///
/// let xml = r#"<osm><node id="1" lat="1.5" lon="2.5"/></osm>"#;
/// let events: Vec<_> = ElementStream::new(xml.as_bytes())
///     .collect::<Result<_, _>>()
///     .expect("valid document");
///
/// assert_eq!(
///     events,
///     vec![
///         ElementEvent::PointOpen { id: "1".into(), lat: 1.5, lon: 2.5 },
///         ElementEvent::PointClose,
///     ]
/// );
/// ```
pub struct ElementStream<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    pending: Option<ElementEvent>,
    finished: bool,
}

impl<R: BufRead> ElementStream<R> {
    /// Wrap a buffered byte source.
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
            pending: None,
            finished: false,
        }
    }

    /// Approximate byte offset of the reader in the underlying source.
    #[must_use]
    pub fn position(&self) -> usize {
        self.reader.buffer_position()
    }

    fn read_next(&mut self) -> Result<Option<ElementEvent>, ElementStreamError> {
        loop {
            self.buf.clear();
            let position = self.reader.buffer_position();
            let translated = match self.reader.read_event_into(&mut self.buf) {
                Err(source) => return Err(ElementStreamError::Xml { position, source }),
                Ok(Event::Eof) => return Ok(None),
                Ok(Event::Start(start)) => translate_start(&start, position, false)?,
                Ok(Event::Empty(start)) => translate_start(&start, position, true)?,
                Ok(Event::End(end)) => translate_end(end.name().as_ref()).map(|event| (event, None)),
                Ok(_) => None,
            };
            if let Some((event, follow_up)) = translated {
                self.pending = follow_up;
                return Ok(Some(event));
            }
        }
    }
}

impl<R: BufRead> Iterator for ElementStream<R> {
    type Item = Result<ElementEvent, ElementStreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.pending.take() {
            return Some(Ok(event));
        }
        if self.finished {
            return None;
        }
        match self.read_next() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

impl<R: BufRead> std::iter::FusedIterator for ElementStream<R> {}

type Translated = Option<(ElementEvent, Option<ElementEvent>)>;

fn translate_start(
    start: &BytesStart<'_>,
    position: usize,
    self_closing: bool,
) -> Result<Translated, ElementStreamError> {
    let Some(kind) = ElementKind::from_name(start.name().as_ref()) else {
        return Ok(None);
    };
    let translated = match kind {
        ElementKind::Point => (
            point_open(start, position)?,
            self_closing.then_some(ElementEvent::PointClose),
        ),
        ElementKind::Way => (
            ElementEvent::WayOpen,
            self_closing.then_some(ElementEvent::WayClose),
        ),
        ElementKind::NodeRef => {
            let [reference] = read_attributes(start, "nd", ["ref"], position)?;
            let id = require(reference, "nd", "ref", position)?;
            (ElementEvent::NodeRef { id }, None)
        }
        ElementKind::Tag => {
            let [key, value] = read_attributes(start, "tag", ["k", "v"], position)?;
            (ElementEvent::Tag { key, value }, None)
        }
    };
    Ok(Some(translated))
}

fn translate_end(name: &[u8]) -> Option<ElementEvent> {
    match ElementKind::from_name(name)? {
        ElementKind::Point => Some(ElementEvent::PointClose),
        ElementKind::Way => Some(ElementEvent::WayClose),
        ElementKind::NodeRef | ElementKind::Tag => None,
    }
}

fn point_open(start: &BytesStart<'_>, position: usize) -> Result<ElementEvent, ElementStreamError> {
    let [id, lat, lon] = read_attributes(start, "node", ["id", "lat", "lon"], position)?;
    let id = require(id, "node", "id", position)?;
    let lat = coordinate(require(lat, "node", "lat", position)?, "lat", &LATITUDE_RANGE, position)?;
    let lon = coordinate(require(lon, "node", "lon", position)?, "lon", &LONGITUDE_RANGE, position)?;
    Ok(ElementEvent::PointOpen { id, lat, lon })
}

/// Collect the named attributes of an element, unescaped, in `names` order.
fn read_attributes<const N: usize>(
    start: &BytesStart<'_>,
    element: &'static str,
    names: [&'static str; N],
    position: usize,
) -> Result<[Option<String>; N], ElementStreamError> {
    let mut values: [Option<String>; N] = std::array::from_fn(|_| None);
    for entry in start.attributes() {
        let attribute = entry.map_err(|source| ElementStreamError::Attribute {
            element,
            position,
            source,
        })?;
        let key = attribute.key.as_ref();
        let Some(slot) = names.iter().position(|name| name.as_bytes() == key) else {
            continue;
        };
        let value = attribute
            .unescape_value()
            .map_err(|source| ElementStreamError::Xml { position, source })?;
        if let Some(target) = values.get_mut(slot) {
            *target = Some(value.into_owned());
        }
    }
    Ok(values)
}

fn require(
    value: Option<String>,
    element: &'static str,
    attribute: &'static str,
    position: usize,
) -> Result<String, ElementStreamError> {
    value.ok_or(ElementStreamError::MissingAttribute {
        element,
        attribute,
        position,
    })
}

fn coordinate(
    raw: String,
    attribute: &'static str,
    range: &RangeInclusive<f64>,
    position: usize,
) -> Result<f64, ElementStreamError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => {
            if !range.contains(&value) {
                debug!("<node> near byte {position} has out-of-range {attribute} {value}");
            }
            Ok(value)
        }
        _ => Err(ElementStreamError::InvalidCoordinate {
            element: "node",
            attribute,
            value: raw,
            position,
        }),
    }
}
