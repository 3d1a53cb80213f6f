mod ids;
mod note;

pub use ids::{NOTE_EXTENSION, NoteId};
pub use note::Note;
