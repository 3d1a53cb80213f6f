pub mod config;
pub mod doctor;
pub mod editor;
pub mod error;
pub mod format;
pub mod index;
pub mod models;
pub mod normalize;
pub mod service;
pub mod store;
pub mod tui;

pub use config::Config;
pub use editor::{Editor, ExternalEditor};
pub use error::{NoteError, Result};
pub use index::TagIndex;
pub use models::{Note, NoteId};
pub use service::{EditOutcome, ListNotesOptions, NoteService, SortOrder};
pub use store::NoteStore;
