// Pure keep/drop predicates over records and UI-selected criteria.
// Predicates compose by logical AND and never mutate the source list.

use crate::models::{Event, Facility, Notification, Player, Team};

pub trait Predicate<T: ?Sized> {
    fn keep(&self, record: &T) -> bool;
}

impl<T: ?Sized, P: Predicate<T> + ?Sized> Predicate<T> for &P {
    fn keep(&self, record: &T) -> bool {
        (**self).keep(record)
    }
}

impl<T: ?Sized, P: Predicate<T> + ?Sized> Predicate<T> for Box<P> {
    fn keep(&self, record: &T) -> bool {
        (**self).keep(record)
    }
}

/// Records exposing the string fields a search box matches against.
pub trait Searchable {
    fn search_fields(&self) -> Vec<Option<&str>>;
}

/// Case-insensitive substring match over a record's search fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchText {
    needle: String,
}

impl SearchText {
    pub fn new(text: &str) -> Self {
        Self {
            needle: text.to_lowercase(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.needle
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }
}

impl<T: Searchable + ?Sized> Predicate<T> for SearchText {
    fn keep(&self, record: &T) -> bool {
        record
            .search_fields()
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&self.needle))
    }
}

/// Exact-match selection with an `All` sentinel that accepts everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<V> {
    All,
    Only(V),
}

impl<V> Default for Selection<V> {
    fn default() -> Self {
        Selection::All
    }
}

impl<V: PartialEq> Selection<V> {
    pub fn matches(&self, value: Option<&V>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(expected) => value == Some(expected),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl<V: From<String>> Selection<V> {
    /// Parse a UI select value; `"all"` is the sentinel.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("all") || raw.trim().is_empty() {
            Selection::All
        } else {
            Selection::Only(V::from(raw.to_string()))
        }
    }
}

impl Selection<i64> {
    /// Parse an id select value. Anything that is neither `"all"` nor an
    /// integer falls back to `All`.
    pub fn parse_id(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(id) => Selection::Only(id),
            Err(_) => {
                if !raw.trim().eq_ignore_ascii_case("all") {
                    tracing::debug!("Ignoring unparseable id selection {:?}", raw);
                }
                Selection::All
            }
        }
    }
}

/// Applies a [`Selection`] to one field of a record.
pub struct FieldMatch<T: ?Sized, V> {
    selection: Selection<V>,
    field: fn(&T) -> Option<V>,
}

impl<T: ?Sized, V> FieldMatch<T, V> {
    pub fn new(selection: Selection<V>, field: fn(&T) -> Option<V>) -> Self {
        Self { selection, field }
    }
}

impl<T: ?Sized, V: PartialEq> Predicate<T> for FieldMatch<T, V> {
    fn keep(&self, record: &T) -> bool {
        match &self.selection {
            Selection::All => true,
            selection => selection.matches((self.field)(record).as_ref()),
        }
    }
}

pub trait Readable {
    fn is_read(&self) -> bool;
}

impl Readable for Notification {
    fn is_read(&self) -> bool {
        self.read
    }
}

/// Read-state tabs. `Unread` and `Read` are disjoint and together cover `All`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReadTab {
    #[default]
    All,
    Unread,
    Read,
}

impl ReadTab {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "unread" => ReadTab::Unread,
            "read" => ReadTab::Read,
            _ => ReadTab::All,
        }
    }
}

impl<T: Readable + ?Sized> Predicate<T> for ReadTab {
    fn keep(&self, record: &T) -> bool {
        match self {
            ReadTab::All => true,
            ReadTab::Unread => !record.is_read(),
            ReadTab::Read => record.is_read(),
        }
    }
}

/// Logical AND of any number of predicates. Empty accepts everything.
pub struct AllOf<'a, T: ?Sized> {
    predicates: Vec<Box<dyn Predicate<T> + Send + Sync + 'a>>,
}

impl<'a, T: ?Sized> Default for AllOf<'a, T> {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }
}

impl<'a, T: ?Sized> AllOf<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, predicate: impl Predicate<T> + Send + Sync + 'a) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl<'a, T: ?Sized> Predicate<T> for AllOf<'a, T> {
    fn keep(&self, record: &T) -> bool {
        self.predicates.iter().all(|p| p.keep(record))
    }
}

/// Kept records in source order; the source is left untouched.
pub fn apply<T: Clone, P: Predicate<T> + ?Sized>(records: &[T], predicate: &P) -> Vec<T> {
    records
        .iter()
        .filter(|record| predicate.keep(record))
        .cloned()
        .collect()
}

pub fn count<T, P: Predicate<T> + ?Sized>(records: &[T], predicate: &P) -> usize {
    records.iter().filter(|record| predicate.keep(record)).count()
}

impl Searchable for Team {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![Some(self.name.as_str()), Some(self.sport.as_str())]
    }
}

impl Searchable for Player {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.first_name.as_str()),
            Some(self.last_name.as_str()),
            self.position.as_deref(),
        ]
    }
}

impl Searchable for Facility {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.name.as_str()),
            Some(self.kind.as_str()),
            Some(self.location.as_str()),
        ]
    }
}

impl Searchable for Notification {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![Some(self.title.as_str()), Some(self.message.as_str())]
    }
}

impl Searchable for Event {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![Some(self.title.as_str()), Some(self.location.as_str())]
    }
}
