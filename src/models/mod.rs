mod event;
mod profile;

pub use event::{numeric_suffix, Event, EventDraft, InterestMark, CATEGORIES};
pub use profile::{ProfileDraft, PsychosocialProfile, UserProfile, UserRecord};
