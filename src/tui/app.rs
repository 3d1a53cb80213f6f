use crate::models::Note;

/// A note offered by the picker, with the text the query is matched against.
#[derive(Debug, Clone)]
struct Candidate {
    note: Note,
    haystack: String,
}

impl Candidate {
    fn new(note: Note) -> Self {
        let haystack = format!("{} {} {}", note.id, note.title, note.tag_line()).to_lowercase();
        Self { note, haystack }
    }
}

/// State of the note picker.
///
/// Holds every candidate note, the query being typed, and the indices of the
/// candidates that match it, best match first.
#[derive(Debug, Clone)]
pub struct App {
    candidates: Vec<Candidate>,
    /// Indices into `candidates`, ranked.
    matches: Vec<usize>,
    /// Position within `matches`.
    selected: Option<usize>,
    query: String,
}

impl App {
    /// Creates a picker over `notes` with an empty query.
    ///
    /// # Examples
    ///
    /// ```
    /// use notes::tui::App;
    ///
    /// let app = App::new(Vec::new());
    /// assert!(app.matches().is_empty());
    /// assert_eq!(app.selected_index(), None);
    /// ```
    pub fn new(notes: Vec<Note>) -> Self {
        let mut app = Self {
            candidates: notes.into_iter().map(Candidate::new).collect(),
            matches: Vec::new(),
            selected: None,
            query: String::new(),
        };
        app.apply_filter();
        app
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Number of candidate notes, matching or not.
    pub fn total(&self) -> usize {
        self.candidates.len()
    }

    /// Notes matching the current query, best match first.
    pub fn matches(&self) -> Vec<&Note> {
        self.matches
            .iter()
            .map(|&i| &self.candidates[i].note)
            .collect()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_note(&self) -> Option<&Note> {
        let position = self.selected?;
        let index = *self.matches.get(position)?;
        Some(&self.candidates[index].note)
    }

    pub fn push_query_char(&mut self, c: char) {
        self.query.push(c);
        self.apply_filter();
    }

    pub fn pop_query_char(&mut self) {
        if self.query.pop().is_some() {
            self.apply_filter();
        }
    }

    /// Moves the selection down, wrapping to the top.
    pub fn select_next(&mut self) {
        if self.matches.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) if i + 1 < self.matches.len() => i + 1,
            _ => 0,
        });
    }

    /// Moves the selection up, wrapping to the bottom.
    pub fn select_previous(&mut self) {
        if self.matches.is_empty() {
            return;
        }
        let last = self.matches.len() - 1;
        self.selected = Some(match self.selected {
            Some(0) | None => last,
            Some(i) => i - 1,
        });
    }

    /// Re-ranks candidates against the query and selects the best match.
    ///
    /// An empty query keeps every candidate in its original order. Ties keep
    /// their original relative order.
    fn apply_filter(&mut self) {
        let query = self.query.to_lowercase();
        let mut scored: Vec<(usize, i64)> = self
            .candidates
            .iter()
            .enumerate()
            .filter_map(|(i, c)| fuzzy_score(&query, &c.haystack).map(|score| (i, score)))
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        self.matches = scored.into_iter().map(|(i, _)| i).collect();
        self.selected = if self.matches.is_empty() {
            None
        } else {
            Some(0)
        };
    }
}

/// Scores `haystack` against `query` as a subsequence match.
///
/// Returns `None` unless every query character appears in order. Higher is
/// better: consecutive matches and matches at word starts earn bonuses, and
/// a late first match costs a little. Whitespace in the query is ignored.
pub fn fuzzy_score(query: &str, haystack: &str) -> Option<i64> {
    let mut score = 0i64;
    let mut previous: Option<usize> = None;
    let mut first: Option<usize> = None;
    let mut chars = haystack.char_indices().peekable();
    let mut before = ' ';

    for q in query.chars().filter(|c| !c.is_whitespace()) {
        loop {
            let (pos, c) = chars.next()?;
            let at_word_start = !before.is_alphanumeric();
            before = c;
            if c != q {
                continue;
            }

            score += 1;
            if at_word_start {
                score += 3;
            }
            if previous.is_some_and(|p| p + 1 == pos) {
                score += 5;
            }
            first.get_or_insert(pos);
            previous = Some(pos + c.len_utf8() - 1);
            break;
        }
    }

    let offset = first.map_or(0, |p| p as i64);
    Some(score * 10 - offset)
}
