//! Definition fetching per object kind

use crate::error::DbError;
use crate::executor::SessionProvider;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const STORED_PROC_SQL: &str = "\
SELECT ROUTINE_NAME, ROUTINE_DEFINITION
FROM INFORMATION_SCHEMA.ROUTINES
WHERE ROUTINE_TYPE = 'PROCEDURE' AND ROUTINE_SCHEMA = ?";

const FUNCTION_SQL: &str = "\
SELECT ROUTINE_NAME, ROUTINE_DEFINITION
FROM INFORMATION_SCHEMA.ROUTINES
WHERE ROUTINE_TYPE = 'FUNCTION' AND ROUTINE_SCHEMA = ?
AND ROUTINE_NAME <> 'fn_diagramobjects'";

const VIEW_SQL: &str = "\
SELECT TABLE_NAME, VIEW_DEFINITION
FROM INFORMATION_SCHEMA.VIEWS
WHERE TABLE_SCHEMA = ?";

const TRIGGER_SQL: &str = "\
SELECT tr.name, OBJECT_DEFINITION(tr.object_id)
FROM sys.triggers tr
INNER JOIN sys.objects o ON tr.parent_id = o.object_id
INNER JOIN sys.schemas s ON o.schema_id = s.schema_id
WHERE s.name = ?";

/// One row per user table; the definition is its column list
const TABLE_SQL: &str = "\
SELECT t.name, STRING_AGG(CONCAT(
    c.name, ' ', UPPER(ty.name),
    CASE
        WHEN ty.name IN ('varchar', 'nvarchar', 'char', 'nchar') THEN CONCAT('(',
            CASE WHEN c.max_length = -1 THEN 'MAX'
                ELSE CAST(CASE WHEN ty.name LIKE 'n%' THEN c.max_length / 2
                    ELSE c.max_length END AS VARCHAR)
            END, ')')
        WHEN ty.name IN ('decimal', 'numeric') THEN CONCAT('(', c.precision, ',', c.scale, ')')
        ELSE ''
    END,
    CASE WHEN c.is_nullable = 1 THEN ' NULL' ELSE ' NOT NULL' END,
    CASE WHEN c.is_identity = 1 THEN ' IDENTITY' ELSE '' END
), ',')
FROM sys.tables t
INNER JOIN sys.schemas s ON t.schema_id = s.schema_id
INNER JOIN sys.columns c ON t.object_id = c.object_id
INNER JOIN sys.types ty ON c.user_type_id = ty.user_type_id
WHERE s.name = ?
AND t.is_external = 0 AND t.type = 'U' AND t.is_ms_shipped = 0
AND t.name NOT IN ('sysdiagrams', 'database_firewall_rules')
GROUP BY t.name";

const SEQUENCE_SQL: &str = "\
SELECT seq.name, CONCAT(
    'TYPE=', t.name,
    ', START=', CAST(seq.start_value AS VARCHAR),
    ', INCREMENT=', CAST(seq.increment AS VARCHAR),
    CASE WHEN seq.minimum_value IS NOT NULL
        THEN CONCAT(', MIN=', CAST(seq.minimum_value AS VARCHAR)) ELSE '' END,
    CASE WHEN seq.maximum_value IS NOT NULL
        THEN CONCAT(', MAX=', CAST(seq.maximum_value AS VARCHAR)) ELSE '' END,
    CASE WHEN seq.is_cycling = 1 THEN ', CYCLE' ELSE ', NO CYCLE' END,
    CASE WHEN seq.is_cached = 1
        THEN CONCAT(', CACHE ', CAST(seq.cache_size AS VARCHAR)) ELSE ', NO CACHE' END
)
FROM sys.sequences seq
INNER JOIN sys.schemas s ON seq.schema_id = s.schema_id
INNER JOIN sys.types t ON seq.user_type_id = t.user_type_id
WHERE s.name = ?";

/// Named, non-heap indexes on user objects; the definition lists key columns
const INDEX_SQL: &str = "\
SELECT i.name, CONCAT(
    'ON ', OBJECT_NAME(i.object_id), ' (',
    STRING_AGG(CONCAT(
        c.name, CASE WHEN ic.is_descending_key = 1 THEN ' DESC' ELSE ' ASC' END
    ), ', ')
        WITHIN GROUP (ORDER BY ic.key_ordinal),
    ')',
    CASE WHEN i.is_unique = 1 THEN ' UNIQUE' ELSE '' END,
    CASE i.type
        WHEN 1 THEN ' CLUSTERED'
        WHEN 2 THEN ' NONCLUSTERED'
        WHEN 3 THEN ' XML'
        WHEN 4 THEN ' SPATIAL'
        WHEN 5 THEN ' CLUSTERED COLUMNSTORE'
        WHEN 6 THEN ' NONCLUSTERED COLUMNSTORE'
        WHEN 7 THEN ' NONCLUSTERED HASH'
        ELSE ''
    END,
    CASE WHEN i.filter_definition IS NOT NULL
        THEN CONCAT(' WHERE ', i.filter_definition) ELSE '' END
)
FROM sys.indexes i
INNER JOIN sys.objects o ON i.object_id = o.object_id
INNER JOIN sys.schemas s ON o.schema_id = s.schema_id
INNER JOIN sys.index_columns ic ON i.object_id = ic.object_id AND i.index_id = ic.index_id
INNER JOIN sys.columns c ON ic.object_id = c.object_id AND ic.column_id = c.column_id
WHERE s.name = ?
AND i.name IS NOT NULL
AND o.is_ms_shipped = 0
AND OBJECT_NAME(i.object_id) <> 'sysdiagrams'
AND NOT (i.is_primary_key = 1 AND o.type = 'TF')
AND i.type > 0
GROUP BY i.object_id, i.name, i.is_unique, i.type, i.filter_definition";

/// Kind of schema object whose definitions are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    StoredProc,
    View,
    Function,
    Trigger,
    Table,
    Sequence,
    Index,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 7] = [
        ObjectKind::StoredProc,
        ObjectKind::View,
        ObjectKind::Function,
        ObjectKind::Trigger,
        ObjectKind::Table,
        ObjectKind::Sequence,
        ObjectKind::Index,
    ];

    /// Configuration name (`stored_proc`, `view`, ...)
    pub fn key(&self) -> &'static str {
        match self {
            ObjectKind::StoredProc => "stored_proc",
            ObjectKind::View => "view",
            ObjectKind::Function => "function",
            ObjectKind::Trigger => "trigger",
            ObjectKind::Table => "table",
            ObjectKind::Sequence => "sequence",
            ObjectKind::Index => "index",
        }
    }

    /// Singular, lowercase name for messages
    pub fn display_name(&self) -> &'static str {
        match self {
            ObjectKind::StoredProc => "stored procedure",
            ObjectKind::View => "view",
            ObjectKind::Function => "function",
            ObjectKind::Trigger => "trigger",
            ObjectKind::Table => "table",
            ObjectKind::Sequence => "sequence",
            ObjectKind::Index => "index",
        }
    }

    /// Heading used above a diff table
    pub fn report_title(&self) -> &'static str {
        match self {
            ObjectKind::StoredProc => "Stored procs",
            ObjectKind::View => "Views",
            ObjectKind::Function => "Functions",
            ObjectKind::Trigger => "Triggers",
            ObjectKind::Table => "Tables",
            ObjectKind::Sequence => "Sequences",
            ObjectKind::Index => "Indexes",
        }
    }

    /// First column header of a diff table
    pub fn name_header(&self) -> &'static str {
        match self {
            ObjectKind::StoredProc => "Procedure Name",
            ObjectKind::View => "View Name",
            ObjectKind::Function => "Function Name",
            ObjectKind::Trigger => "Trigger Name",
            ObjectKind::Table => "Table Name",
            ObjectKind::Sequence => "Sequence Name",
            ObjectKind::Index => "Index Name",
        }
    }

    /// Metadata query returning `(name, definition)`; the schema binds to `?`
    pub fn definitions_query(&self) -> &'static str {
        match self {
            ObjectKind::StoredProc => STORED_PROC_SQL,
            ObjectKind::View => VIEW_SQL,
            ObjectKind::Function => FUNCTION_SQL,
            ObjectKind::Trigger => TRIGGER_SQL,
            ObjectKind::Table => TABLE_SQL,
            ObjectKind::Sequence => SEQUENCE_SQL,
            ObjectKind::Index => INDEX_SQL,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ObjectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectKind::ALL
            .into_iter()
            .find(|kind| kind.key() == s.trim())
            .ok_or_else(|| format!("Unknown object type '{}'", s))
    }
}

/// Parse configured object-type names, warning about and skipping unknown ones
pub fn parse_object_kinds<S: AsRef<str>>(names: &[S]) -> Vec<ObjectKind> {
    let mut kinds = Vec::new();
    for name in names {
        match name.as_ref().parse::<ObjectKind>() {
            Ok(kind) if !kinds.contains(&kind) => kinds.push(kind),
            Ok(_) => {}
            Err(e) => log::warn!("{}, skipped", e),
        }
    }
    kinds
}

/// Fetch `name -> definition` for every object of `kind` in `schema`
///
/// A `NULL` definition is kept as `None`; the name is still present.
pub fn fetch_definitions<P: SessionProvider>(
    provider: &P,
    schema: &str,
    kind: ObjectKind,
) -> Result<BTreeMap<String, Option<String>>, DbError> {
    let rows = provider.run_query(kind.definitions_query(), &[schema])?;

    let mut definitions = BTreeMap::new();
    for row in rows {
        let Some(name) = row.get(0) else {
            log::debug!("Skipping {} row without a name", kind.display_name());
            continue;
        };
        definitions.insert(name.to_string(), row.get(1).map(str::to_string));
    }
    Ok(definitions)
}
