pub mod capability;
pub mod config;
pub mod error;
pub mod message;
pub mod paths;
pub mod pattern;
pub mod profile;
pub mod types;

pub use capability::CapabilityDescriptor;
pub use config::Config;
pub use error::{Error, Result};
pub use message::{Conversation, Message, Role};
pub use paths::Paths;
pub use pattern::{CountMap, HourCounts, PatternState};
pub use profile::UserProfile;
pub use types::{
    ActionKind, Clock, CommunicationSample, EventContext, FixedClock, Formality, InteractionEvent,
    StyleProfile, SystemClock, UserId, Verbosity,
};
