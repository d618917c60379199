//! Per-chat conversation state for a chat front-end.
//!
//! A chat moves between two states: waiting for a JPEG document, then waiting
//! for a position. Once a position arrives the stored photo is geotagged and
//! handed back as a [`Delivery`]. Transport, message wording, and downloading
//! the photo are left to the caller, which feeds [`Incoming`] events into
//! [`Conversation::handle`] and renders the returned [`Reply`].

mod store;

pub use store::{ChatId, InMemorySessionStore, SessionStore};

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::config::{Config, OutputConfig};
use crate::exif::{write_geotag_with, LayoutOptions};
use crate::pipeline::has_jpeg_suffix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatState {
    #[default]
    WaitingForPhoto,
    WaitingForCoordinates,
}

/// A photo received as a document, held until coordinates arrive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub state: ChatState,
    pub photo: Option<Photo>,
}

/// An inbound chat event.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// A slash command, without the slash.
    Command(String),
    /// A file sent as a document, already downloaded by the caller.
    Document { file_name: String, bytes: Vec<u8> },
    /// A shared map location.
    Location { latitude: f64, longitude: f64 },
    Text(String),
}

/// The geotagged file to send back.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<FixedOffset>,
}

/// What the front-end should tell the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Welcome,
    Cancelled,
    Unknown,
    /// A JPEG document was expected.
    PhotoExpected,
    PhotoAccepted,
    /// Text did not split into exactly two comma-separated parts.
    InvalidCoordinateFormat,
    CoordinatesNotNumeric,
    /// Neither a location nor coordinate text was sent.
    LocationExpected,
    ProcessingFailed(String),
    Delivered(Delivery),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinateParseError {
    #[error("expected coordinates as 'lat, lon'")]
    Format,
    #[error("coordinates must be numbers")]
    NotNumeric,
}

/// Parse `"lat, lon"` text into a pair of decimal degrees.
pub fn parse_coordinates(text: &str) -> Result<(f64, f64), CoordinateParseError> {
    let parts: Vec<&str> = text.split(',').collect();
    if parts.len() != 2 {
        return Err(CoordinateParseError::Format);
    }

    let lat = parts[0].trim().parse::<f64>().map_err(|_| CoordinateParseError::NotNumeric)?;
    let lon = parts[1].trim().parse::<f64>().map_err(|_| CoordinateParseError::NotNumeric)?;
    Ok((lat, lon))
}

/// Drives the per-chat state machine over a [`SessionStore`].
pub struct Conversation<S: SessionStore> {
    store: S,
    layout: LayoutOptions,
    output: OutputConfig,
}

impl<S: SessionStore> Conversation<S> {
    pub fn new(store: S, config: &Config) -> Self {
        Self {
            store,
            layout: config.layout,
            output: config.output.clone(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply one inbound event for `chat_id`. `now` is the capture time used
    /// if this event completes a geotag.
    pub fn handle(&self, chat_id: ChatId, incoming: Incoming, now: DateTime<FixedOffset>) -> Reply {
        match incoming {
            Incoming::Command(command) => self.handle_command(chat_id, &command),
            // A JPEG document is accepted in any state.
            Incoming::Document { file_name, bytes } if has_jpeg_suffix(&file_name) => {
                self.accept_photo(chat_id, file_name, bytes)
            }
            other => self.handle_in_state(chat_id, other, now),
        }
    }

    fn handle_command(&self, chat_id: ChatId, command: &str) -> Reply {
        match command {
            "start" => {
                self.store.put(chat_id, Session::default());
                Reply::Welcome
            }
            "cancel" | "batal" => {
                if self.store.get(chat_id).is_some() {
                    self.store.put(chat_id, Session::default());
                }
                Reply::Cancelled
            }
            other => {
                log::debug!("Chat {chat_id}: unknown command /{other}");
                Reply::Unknown
            }
        }
    }

    fn accept_photo(&self, chat_id: ChatId, file_name: String, bytes: Vec<u8>) -> Reply {
        log::info!("Chat {chat_id}: received {file_name} ({} bytes)", bytes.len());
        self.store.put(
            chat_id,
            Session {
                state: ChatState::WaitingForCoordinates,
                photo: Some(Photo { file_name, bytes }),
            },
        );
        Reply::PhotoAccepted
    }

    fn handle_in_state(&self, chat_id: ChatId, incoming: Incoming, now: DateTime<FixedOffset>) -> Reply {
        let Some(session) = self.store.get(chat_id) else {
            self.store.put(chat_id, Session::default());
            return Reply::Welcome;
        };

        match session.state {
            ChatState::WaitingForPhoto => Reply::PhotoExpected,
            ChatState::WaitingForCoordinates => self.handle_coordinates(chat_id, session, incoming, now),
        }
    }

    fn handle_coordinates(
        &self,
        chat_id: ChatId,
        session: Session,
        incoming: Incoming,
        now: DateTime<FixedOffset>,
    ) -> Reply {
        let (latitude, longitude) = match incoming {
            Incoming::Location { latitude, longitude } => (latitude, longitude),
            Incoming::Text(text) if !text.is_empty() => match parse_coordinates(&text) {
                Ok(coords) => coords,
                Err(CoordinateParseError::Format) => return Reply::InvalidCoordinateFormat,
                Err(CoordinateParseError::NotNumeric) => return Reply::CoordinatesNotNumeric,
            },
            _ => return Reply::LocationExpected,
        };

        // State says a photo is present; an empty one behaves like a bad JPEG.
        let photo = session.photo.unwrap_or(Photo { file_name: String::new(), bytes: Vec::new() });

        match write_geotag_with(&photo.bytes, latitude, longitude, &now, &self.layout) {
            Ok(bytes) => {
                self.store.put(chat_id, Session::default());
                let file_name = self.output.file_name(&now);
                log::info!("Chat {chat_id}: geotagged {} as {file_name}", photo.file_name);
                Reply::Delivered(Delivery { file_name, bytes, latitude, longitude, timestamp: now })
            }
            Err(e) => {
                log::error!("Chat {chat_id}: error processing EXIF: {e}");
                Reply::ProcessingFailed(e.to_string())
            }
        }
    }
}
