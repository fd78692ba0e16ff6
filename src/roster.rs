use crate::classes::{classify, ClassFilter};
use crate::models::{Student, StudentRow};

/// Last roster snapshot fetched from the remote store.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    students: Vec<Student>,
}

impl Roster {
    pub fn new(students: Vec<Student>) -> Self {
        Self { students }
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn classes(&self) -> Vec<ClassFilter> {
        classify(&self.students)
    }

    pub fn find(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|student| student.id == id)
    }

    pub fn filter(&self, class: &ClassFilter) -> Vec<&Student> {
        self.students
            .iter()
            .filter(|student| class.matches_student(student))
            .collect()
    }

    /// Case-insensitive substring match on name or nisn, within `class`.
    pub fn search(&self, query: &str, class: &ClassFilter) -> Vec<&Student> {
        let query = query.trim().to_lowercase();
        self.filter(class)
            .into_iter()
            .filter(|student| {
                query.is_empty()
                    || contains_query(student.name.as_deref(), &query)
                    || contains_query(student.nisn.as_deref(), &query)
            })
            .collect()
    }

    /// Whether `nisn` identifies at most one roster entry.
    pub fn nisn_is_unique(&self, nisn: &str) -> bool {
        let nisn = nisn.trim();
        self.students
            .iter()
            .filter(|student| student.nisn.as_deref().map(str::trim) == Some(nisn))
            .count()
            <= 1
    }
}

fn contains_query(field: Option<&str>, query: &str) -> bool {
    field.is_some_and(|value| value.to_lowercase().contains(query))
}

impl From<&Student> for StudentRow {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id.clone(),
            name: student.display_name().to_string(),
            nisn: student.display_nisn().to_string(),
            kelas: student.display_kelas().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        Roster::new(vec![
            Student {
                id: "1".into(),
                name: Some("Budi Santoso".into()),
                nisn: Some("0051".into()),
                kelas: Some("7".into()),
            },
            Student {
                id: "2".into(),
                name: Some("Siti Aminah".into()),
                nisn: Some("0052".into()),
                kelas: Some("8 ".into()),
            },
            Student {
                id: "3".into(),
                name: None,
                nisn: Some("0052".into()),
                kelas: None,
            },
        ])
    }

    #[test]
    fn search_matches_name_or_nisn_within_class() {
        let roster = roster();
        let hits = roster.search("budi", &ClassFilter::All);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");

        let hits = roster.search("0052", &ClassFilter::Class("8".into()));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "2");

        assert_eq!(roster.search("", &ClassFilter::All).len(), 3);
    }

    #[test]
    fn filter_outlives_a_temporary_class() {
        let roster = roster();
        let seventh = roster.filter(&ClassFilter::Class("7".into()));
        assert_eq!(seventh.len(), 1);
        assert_eq!(seventh[0].id, "1");
        assert_eq!(roster.filter(&ClassFilter::All).len(), 3);
    }

    #[test]
    fn duplicate_nisn_is_reported() {
        let roster = roster();
        assert!(roster.nisn_is_unique("0051"));
        assert!(!roster.nisn_is_unique("0052"));
    }

    #[test]
    fn rows_render_placeholders() {
        let roster = roster();
        let row = StudentRow::from(roster.find("3").unwrap());
        assert_eq!(row.name, "N/A");
        assert_eq!(row.kelas, "N/A");
        assert_eq!(row.nisn, "0052");
    }
}
