pub mod events;
pub mod pipeline;
pub mod profiles;
pub mod recommender;
pub mod relevance;

pub use events::{EventCatalog, InterestWatch};
pub use pipeline::{Pipeline, ScoredEvent};
pub use profiles::ProfileStore;
pub use recommender::{GeminiClient, Recommender, TextGenerator};
