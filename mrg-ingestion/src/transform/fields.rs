use std::fmt;

use crate::sheet::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    ConnectionPoint,
    Mg,
    Km,
    Period,
    LoadLevel,
    ActualFlow,
    TechnicalFlow,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Name,
        Field::ConnectionPoint,
        Field::Mg,
        Field::Km,
        Field::Period,
        Field::LoadLevel,
        Field::ActualFlow,
        Field::TechnicalFlow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::ConnectionPoint => "connectionPoint",
            Field::Mg => "mg",
            Field::Km => "km",
            Field::Period => "period",
            Field::LoadLevel => "loadLevel",
            Field::ActualFlow => "actualFlow",
            Field::TechnicalFlow => "technicalFlow",
        }
    }

    /// Accepted header labels, highest priority first.
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Field::Name => &["Магистральный распределительный газопровод"],
            Field::ConnectionPoint | Field::Mg => &["Точка подключения МГ (РГ, КС, УРГ)"],
            Field::Km => &["Точка подключения км", "км", " Точка подключения км"],
            Field::Period => &["Период", " Период"],
            Field::LoadLevel => &["Уровень загрузки"],
            Field::ActualFlow => &["Факт. среднесут. расход, млн.м3/сут"],
            Field::TechnicalFlow => &["ТВПС, млн. м3/сут"],
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column candidates per field, resolved once against a header sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    columns: [Vec<usize>; 8],
}

impl FieldMap {
    /// For each label (in priority order) the right-most column carrying it
    /// becomes a candidate.
    pub fn resolve(headers: &[String]) -> Self {
        let mut map = Self::default();
        for field in Field::ALL {
            let candidates = &mut map.columns[field.index()];
            for label in field.labels() {
                if let Some(col) = headers.iter().rposition(|h| h == label) {
                    if !candidates.contains(&col) {
                        candidates.push(col);
                    }
                }
            }
        }
        map
    }

    pub fn columns(&self, field: Field) -> &[usize] {
        &self.columns[field.index()]
    }

    pub fn unresolved(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| self.columns(*f).is_empty())
            .collect()
    }

    /// First non-blank candidate cell of `field` in `row`.
    pub fn lookup<'a>(&self, field: Field, row: &'a [Cell]) -> Option<&'a Cell> {
        self.columns(field)
            .iter()
            .filter_map(|col| row.get(*col))
            .find(|cell| !cell.is_blank())
    }
}
