//! Finished records pulled from an XML source.

use std::io::BufRead;

use crate::xml::ElementStream;

use super::OsmIngestError;
use super::accumulator::{Accumulator, Record};

/// Iterator of [`Record`]s built from an OSM XML byte source.
///
/// Yields at most one error, after which it is exhausted.
pub struct RecordStream<R: BufRead> {
    events: ElementStream<R>,
    accumulator: Accumulator,
    done: bool,
}

impl<R: BufRead> RecordStream<R> {
    /// Stream records from a buffered source.
    pub fn new(source: R) -> Self {
        Self {
            events: ElementStream::new(source),
            accumulator: Accumulator::default(),
            done: false,
        }
    }

    fn fail(&mut self, err: OsmIngestError) -> Option<Result<Record, OsmIngestError>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<R: BufRead> Iterator for RecordStream<R> {
    type Item = Result<Record, OsmIngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let Some(item) = self.events.next() else {
                self.done = true;
                return match self.accumulator.finish() {
                    Ok(()) => None,
                    Err(source) => Some(Err(OsmIngestError::State {
                        position: self.events.position(),
                        source,
                    })),
                };
            };
            let event = match item {
                Ok(event) => event,
                Err(source) => return self.fail(OsmIngestError::Stream { source }),
            };
            match self.accumulator.apply(event) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => {}
                Err(source) => {
                    let position = self.events.position();
                    return self.fail(OsmIngestError::State { position, source });
                }
            }
        }
    }
}

impl<R: BufRead> std::iter::FusedIterator for RecordStream<R> {}
