/// Selection value meaning "no constraint on this column".
pub const ALL_SENTINEL: &str = "Todos";

pub const SELECT_COLUMNS: &str =
    "id, sede, escuela, carrera, nivel, jornada, usuario, nombre, apellido";

/// The six filterable columns of the responsables table. Column names reach
/// SQL text only through this enum, never from caller-supplied strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterColumn {
    Sede,
    Escuela,
    Carrera,
    Nivel,
    Jornada,
    Usuario,
}

impl FilterColumn {
    /// Fixed composition order for predicate clauses.
    pub const ORDER: [FilterColumn; 6] = [
        FilterColumn::Sede,
        FilterColumn::Escuela,
        FilterColumn::Carrera,
        FilterColumn::Nivel,
        FilterColumn::Jornada,
        FilterColumn::Usuario,
    ];

    pub fn as_sql(self) -> &'static str {
        match self {
            FilterColumn::Sede => "sede",
            FilterColumn::Escuela => "escuela",
            FilterColumn::Carrera => "carrera",
            FilterColumn::Nivel => "nivel",
            FilterColumn::Jornada => "jornada",
            FilterColumn::Usuario => "usuario",
        }
    }

    pub fn parse(name: &str) -> Option<FilterColumn> {
        FilterColumn::ORDER.iter().copied().find(|c| c.as_sql() == name)
    }
}

/// One selection per filterable column; `None` (or the sentinel, or an empty
/// string) means the column is unconstrained.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FilterSet {
    pub sede: Option<String>,
    pub escuela: Option<String>,
    pub carrera: Option<String>,
    pub nivel: Option<String>,
    pub jornada: Option<String>,
    pub usuario: Option<String>,
}

impl FilterSet {
    /// Builds a filter set from a request's `filters` object. Missing keys,
    /// nulls, empty strings and the sentinel all mean "no constraint".
    pub fn from_params(params: &serde_json::Value) -> FilterSet {
        let mut filter = FilterSet::default();
        if let Some(obj) = params.as_object() {
            for column in FilterColumn::ORDER {
                if let Some(value) = obj.get(column.as_sql()).and_then(|v| v.as_str()) {
                    *filter.slot_mut(column) = Some(value.to_string());
                }
            }
        }
        filter
    }

    fn slot(&self, column: FilterColumn) -> &Option<String> {
        match column {
            FilterColumn::Sede => &self.sede,
            FilterColumn::Escuela => &self.escuela,
            FilterColumn::Carrera => &self.carrera,
            FilterColumn::Nivel => &self.nivel,
            FilterColumn::Jornada => &self.jornada,
            FilterColumn::Usuario => &self.usuario,
        }
    }

    fn slot_mut(&mut self, column: FilterColumn) -> &mut Option<String> {
        match column {
            FilterColumn::Sede => &mut self.sede,
            FilterColumn::Escuela => &mut self.escuela,
            FilterColumn::Carrera => &mut self.carrera,
            FilterColumn::Nivel => &mut self.nivel,
            FilterColumn::Jornada => &mut self.jornada,
            FilterColumn::Usuario => &mut self.usuario,
        }
    }

    /// The concrete selection for a column, if it constrains the query.
    pub fn selection(&self, column: FilterColumn) -> Option<&str> {
        self.slot(column)
            .as_deref()
            .filter(|v| !v.is_empty() && *v != ALL_SENTINEL)
    }

    /// Concrete selections in fixed column order.
    pub fn selections(&self) -> Vec<(FilterColumn, &str)> {
        FilterColumn::ORDER
            .iter()
            .filter_map(|&c| self.selection(c).map(|v| (c, v)))
            .collect()
    }

    pub fn is_unfiltered(&self) -> bool {
        self.selections().is_empty()
    }

    /// Stable cache key: one segment per column in fixed order.
    pub fn cache_key(&self) -> String {
        FilterColumn::ORDER
            .iter()
            .map(|&c| self.selection(c).unwrap_or(ALL_SENTINEL))
            .collect::<Vec<_>>()
            .join("\u{1f}")
    }
}

/// Builds the filtered SELECT: the unconditionally-true base predicate plus
/// one bound equality clause per concrete selection, in fixed column order.
/// `placeholder` is the parameter prefix (`?` for SQLite, `$` for Postgres).
pub fn compose_select(filter: &FilterSet, placeholder: char) -> (String, Vec<String>) {
    let mut sql = format!("SELECT {SELECT_COLUMNS} FROM responsables WHERE 1=1");
    let mut params = Vec::new();
    for (column, value) in filter.selections() {
        params.push(value.to_string());
        sql.push_str(&format!(
            " AND {} = {}{}",
            column.as_sql(),
            placeholder,
            params.len()
        ));
    }
    sql.push_str(" ORDER BY id");
    (sql, params)
}
