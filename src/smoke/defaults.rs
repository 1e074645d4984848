//! Argument synthesis for procedure calls.
//!
//! Each declared parameter gets a literal from [`ParameterDefaults`]:
//! date-like types are chosen by parameter name, everything else by declared
//! type, and unknown types become `NULL`.

use crate::config::ParameterDefaults;
use std::fmt;

/// Declared types that take a date default
const DATE_TYPES: [&str; 3] = ["date", "datetime", "smalldatetime"];

/// A declared procedure parameter, as listed in `INFORMATION_SCHEMA.PARAMETERS`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureParameter {
    pub name: String,
    pub data_type: String,
}

impl ProcedureParameter {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// One positional argument of a generated call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    /// Substituted as a quoted literal
    Literal(String),
    /// Substituted as SQL `NULL`
    Null,
}

impl ArgValue {
    /// SQL text for this argument
    ///
    /// Literals are wrapped in single quotes without escaping; default values
    /// come from operator configuration and are trusted.
    pub fn to_sql(&self) -> String {
        match self {
            ArgValue::Literal(value) => format!("'{}'", value),
            ArgValue::Null => "NULL".to_string(),
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

pub fn is_date_type(data_type: &str) -> bool {
    DATE_TYPES.iter().any(|t| t.eq_ignore_ascii_case(data_type.trim()))
}

/// Date default for a date-typed parameter, chosen by its name
///
/// `start` selects the start defaults and `end` the end defaults, each using
/// the datetime variant when the name also contains `datetime`. Names with
/// neither fall back to the start date.
pub fn date_default<'a>(param_name: &str, defaults: &'a ParameterDefaults) -> &'a str {
    let name = param_name.to_lowercase();
    let is_datetime = name.contains("datetime");

    if name.contains("start") {
        if is_datetime {
            defaults.start_datetime.as_str()
        } else {
            defaults.start_date.as_str()
        }
    } else if name.contains("end") {
        if is_datetime {
            defaults.end_datetime.as_str()
        } else {
            defaults.end_date.as_str()
        }
    } else {
        defaults.start_date.as_str()
    }
}

/// Default for a non-date declared type, `None` if the type is not mapped
pub fn type_default<'a>(data_type: &str, defaults: &'a ParameterDefaults) -> Option<&'a str> {
    match data_type.trim().to_ascii_lowercase().as_str() {
        "int" => Some(defaults.integer.as_str()),
        "bit" => Some(defaults.bit.as_str()),
        "decimal" => Some(defaults.decimal.as_str()),
        "varchar" | "nvarchar" => Some(defaults.varchar.as_str()),
        _ => None,
    }
}

/// Argument for one parameter
pub fn default_for(param: &ProcedureParameter, defaults: &ParameterDefaults) -> ArgValue {
    if is_date_type(&param.data_type) {
        return ArgValue::Literal(date_default(&param.name, defaults).to_string());
    }
    match type_default(&param.data_type, defaults) {
        Some(value) => ArgValue::Literal(value.to_string()),
        None => ArgValue::Null,
    }
}

/// Arguments for all parameters, in declaration order
pub fn synthesize_arguments(
    params: &[ProcedureParameter],
    defaults: &ParameterDefaults,
) -> Vec<ArgValue> {
    params.iter().map(|p| default_for(p, defaults)).collect()
}

/// `EXEC [schema].[proc] arg1, arg2, ...`
pub fn build_exec_statement(schema: &str, proc_name: &str, args: &[ArgValue]) -> String {
    let mut statement = format!("EXEC [{}].[{}]", schema, proc_name);
    if !args.is_empty() {
        let rendered: Vec<String> = args.iter().map(ArgValue::to_sql).collect();
        statement.push(' ');
        statement.push_str(&rendered.join(", "));
    }
    statement
}

/// `[a, b, NULL]`, as printed after a verbose execution
pub fn format_arguments(args: &[ArgValue]) -> String {
    let rendered: Vec<String> = args.iter().map(ArgValue::to_sql).collect();
    format!("[{}]", rendered.join(", "))
}
