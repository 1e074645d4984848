//! Definition-diff pipeline
//!
//! For each environment, fetch every definition of one object kind in a
//! schema, checksum it, and report the objects whose checksum differs between
//! environments or that are missing from some of them.
//!
//! Environments are processed one at a time, in the order given; that order
//! is also the column order of the report. A failing environment is logged
//! and contributes an empty object set.
//!
//! # Example
//!
//! ```rust,no_run
//! use procguard::compare::{compare_definitions, ObjectKind};
//! use procguard::{Connection, ConnectionSettings};
//!
//! let settings = ConnectionSettings::default();
//! let environments = vec![
//!     ("dev".to_string(), Connection::from_env("DEV_DB", &settings)?),
//!     ("prod".to_string(), Connection::from_env("PROD_DB", &settings)?),
//! ];
//!
//! let report = compare_definitions(&environments, "dbo", ObjectKind::StoredProc);
//! print!("{}", report.render(false));
//! # Ok::<(), procguard::ConnectionError>(())
//! ```

pub mod checksum;
pub mod fetch;
pub mod matrix;
pub mod report;

pub use checksum::{collapse_whitespace, definition_checksum, CHECKSUM_LEN};
pub use fetch::{fetch_definitions, parse_object_kinds, ObjectKind};
pub use matrix::{ChecksumMatrix, DiffRow, ABSENT};
pub use report::DiffReport;

use crate::executor::SessionProvider;

/// Build the checksum matrix for `kind` across `environments`
pub fn build_matrix<P: SessionProvider>(
    environments: &[(String, P)],
    schema: &str,
    kind: ObjectKind,
) -> ChecksumMatrix {
    let mut matrix = ChecksumMatrix::new();

    for (env, provider) in environments {
        let definitions = match fetch_definitions(provider, schema, kind) {
            Ok(definitions) => definitions,
            Err(e) => {
                log::error!(
                    "Error fetching {} definitions for schema '{}' in environment '{}': {}",
                    kind.display_name(),
                    schema,
                    env,
                    e
                );
                Default::default()
            }
        };
        log::debug!(
            "Fetched {} {} definition(s) from '{}'",
            definitions.len(),
            kind.display_name(),
            env
        );
        matrix.add_environment(env.clone(), definitions);
    }

    matrix
}

/// Compare definitions of `kind` in `schema` across `environments`
pub fn compare_definitions<P: SessionProvider>(
    environments: &[(String, P)],
    schema: &str,
    kind: ObjectKind,
) -> DiffReport {
    let matrix = build_matrix(environments, schema, kind);
    let rows = matrix.differences();

    log::info!(
        "Compared {} {}(s) across {} environment(s): {} difference(s)",
        matrix.object_names().len(),
        kind.display_name(),
        environments.len(),
        rows.len()
    );

    DiffReport {
        schema: schema.to_string(),
        object_kind: kind,
        environments: matrix.environments().to_vec(),
        rows,
    }
}
