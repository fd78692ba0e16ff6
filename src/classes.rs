use crate::models::Student;
use serde::{Serialize, Serializer};
use std::{cmp::Ordering, collections::BTreeSet, fmt};

pub const ALL_LABEL: &str = "Semua";
/// "No class selected" label used by the graph selector.
pub const NONE_LABEL: &str = "Tidak Ada";

/// Class scope of a view: every student, or one normalized class label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ClassFilter {
    #[default]
    All,
    Class(String),
}

impl ClassFilter {
    pub fn parse(value: &str) -> Self {
        match normalize_class(value) {
            Some(label) if !is_all_label(&label) => Self::Class(label),
            _ => Self::All,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => ALL_LABEL,
            Self::Class(label) => label,
        }
    }

    /// Value of the `kelas` query parameter; empty means every class.
    pub fn wire(&self) -> &str {
        match self {
            Self::All => "",
            Self::Class(label) => label,
        }
    }

    pub fn matches(&self, kelas: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Class(label) => kelas.is_some_and(|value| value.trim() == label),
        }
    }

    pub fn matches_student(&self, student: &Student) -> bool {
        self.matches(student.kelas.as_deref())
    }
}

impl fmt::Display for ClassFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ClassFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

fn is_all_label(label: &str) -> bool {
    label == ALL_LABEL || label == NONE_LABEL || label.eq_ignore_ascii_case("all")
}

/// Trims a raw class label and drops empty or stringified-null artifacts.
pub fn normalize_class(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    match trimmed {
        "" | "undefined" | "null" => None,
        label => Some(label.to_string()),
    }
}

/// Distinct class labels of the roster, preceded by [`ClassFilter::All`].
pub fn classify<'a>(students: impl IntoIterator<Item = &'a Student>) -> Vec<ClassFilter> {
    let labels = students
        .into_iter()
        .filter_map(|student| student.kelas.as_deref().and_then(normalize_class));
    classify_labels(labels)
}

pub fn classify_labels(labels: impl IntoIterator<Item = String>) -> Vec<ClassFilter> {
    let distinct: BTreeSet<String> = labels
        .into_iter()
        .filter_map(|label| normalize_class(&label))
        .collect();

    let mut sorted: Vec<String> = distinct.into_iter().collect();
    sorted.sort_by(|a, b| compare_labels(a, b));

    std::iter::once(ClassFilter::All)
        .chain(sorted.into_iter().map(ClassFilter::Class))
        .collect()
}

/// Numeric labels first, by value; the rest lexically.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    match (is_numeric(a), is_numeric(b)) {
        (true, true) => compare_numeric(a, b),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}

fn is_numeric(label: &str) -> bool {
    !label.is_empty() && label.bytes().all(|b| b.is_ascii_digit())
}

// Digit strings of any length: strip leading zeros, then longer is larger.
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a_digits = a.trim_start_matches('0');
    let b_digits = b.trim_start_matches('0');
    a_digits
        .len()
        .cmp(&b_digits.len())
        .then_with(|| a_digits.cmp(b_digits))
        .then_with(|| a.cmp(b))
}
