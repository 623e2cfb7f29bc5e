//! Record accumulation over the element event stream.
//!
//! Folds [`ElementEvent`]s into finished [`Point`] and [`Way`] records. At
//! most one record is open at a time; tags and node references outside a way
//! (node or relation tags, for instance) are ignored.

use osmgrid_core::{Point, Way};
use thiserror::Error;

use crate::xml::ElementEvent;

/// A record completed by a closing event.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A finished point.
    Point(Point),
    /// A finished way.
    Way(Way),
}

/// Structurally invalid event sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccumulatorError {
    /// An event arrived in a state that cannot accept it.
    #[error("unexpected {event} while {state}")]
    UnexpectedState {
        /// Offending event.
        event: &'static str,
        /// State the accumulator was in.
        state: &'static str,
    },
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    InPoint(Point),
    InWay(Way),
}

impl State {
    const fn describe(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::InPoint(_) => "inside a node",
            Self::InWay(_) => "inside a way",
        }
    }
}

const fn event_name(event: &ElementEvent) -> &'static str {
    match event {
        ElementEvent::PointOpen { .. } => "node start",
        ElementEvent::PointClose => "node end",
        ElementEvent::WayOpen => "way start",
        ElementEvent::WayClose => "way end",
        ElementEvent::NodeRef { .. } => "node reference",
        ElementEvent::Tag { .. } => "tag",
    }
}

/// Idle / in-point / in-way state machine.
///
/// # Examples
/// ```
/// use osmgrid_data::{Accumulator, ElementEvent, Record};
///
/// let mut accumulator = Accumulator::default();
/// assert_eq!(accumulator.apply(ElementEvent::WayOpen), Ok(None));
/// accumulator.apply(ElementEvent::NodeRef { id: "1".into() }).expect("inside a way");
/// let Some(Record::Way(way)) = accumulator.apply(ElementEvent::WayClose).expect("closes") else {
///     panic!("expected a way");
/// };
/// assert_eq!(way.node_refs, ["1"]);
/// ```
#[derive(Debug, Default)]
pub struct Accumulator {
    state: State,
}

impl Accumulator {
    /// Advance the state machine, returning a record when one completes.
    pub fn apply(&mut self, event: ElementEvent) -> Result<Option<Record>, AccumulatorError> {
        let name = event_name(&event);
        match (std::mem::take(&mut self.state), event) {
            (State::Idle, ElementEvent::PointOpen { id, lat, lon }) => {
                self.state = State::InPoint(Point::new(id, lat, lon));
                Ok(None)
            }
            (State::Idle, ElementEvent::WayOpen) => {
                self.state = State::InWay(Way::default());
                Ok(None)
            }
            (State::InPoint(point), ElementEvent::PointClose) => Ok(Some(Record::Point(point))),
            (State::InWay(way), ElementEvent::WayClose) => Ok(Some(Record::Way(way))),
            (State::InWay(mut way), ElementEvent::NodeRef { id }) => {
                way.push_node_ref(id);
                self.state = State::InWay(way);
                Ok(None)
            }
            (State::InWay(mut way), ElementEvent::Tag { key, value }) => {
                if let (Some(key), Some(value)) = (key, value) {
                    way.insert_tag(key, value);
                }
                self.state = State::InWay(way);
                Ok(None)
            }
            (state, ElementEvent::NodeRef { .. } | ElementEvent::Tag { .. }) => {
                self.state = state;
                Ok(None)
            }
            (state, _) => {
                let described = state.describe();
                self.state = state;
                Err(AccumulatorError::UnexpectedState {
                    event: name,
                    state: described,
                })
            }
        }
    }

    /// Whether a record is currently open.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }

    /// Check that no record is left open at the end of the document.
    pub const fn finish(&self) -> Result<(), AccumulatorError> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(AccumulatorError::UnexpectedState {
                event: "end of document",
                state: self.state.describe(),
            })
        }
    }
}
