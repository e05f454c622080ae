pub mod appointment;
pub mod task;

pub use appointment::{
    Appointment, AppointmentFilters, AppointmentInput, AppointmentRepository,
    SqliteAppointmentRepository,
};
pub use task::{SqliteTaskRepository, Task, TaskFilters, TaskInput, TaskRepository};

use sqlx::{QueryBuilder, Sqlite};

use crate::sanitize::escape_like;

/// One filter condition. Filters collected from the request are turned
/// into a list of these and translated into bound SQL in a single
/// place; user input is never concatenated into query text.
pub(crate) enum Predicate {
    /// Exact match on a column.
    Eq(&'static str, String),
    /// Literal substring match on a column (wildcards escaped).
    Like(&'static str, String),
    /// Inclusive lower bound.
    Gte(&'static str, String),
    /// Inclusive upper bound.
    Lte(&'static str, String),
    /// Literal substring match against any of the listed columns.
    LikeAny(&'static [&'static str], String),
}

pub(crate) fn apply_predicates(builder: &mut QueryBuilder<'_, Sqlite>, predicates: Vec<Predicate>) {
    for predicate in predicates {
        match predicate {
            Predicate::Eq(column, value) => {
                builder.push(format!(" AND {} = ", column));
                builder.push_bind(value);
            }
            Predicate::Like(column, value) => {
                builder.push(format!(" AND {} LIKE ", column));
                builder.push_bind(format!("%{}%", escape_like(&value)));
                builder.push(" ESCAPE '\\'");
            }
            Predicate::Gte(column, value) => {
                builder.push(format!(" AND {} >= ", column));
                builder.push_bind(value);
            }
            Predicate::Lte(column, value) => {
                builder.push(format!(" AND {} <= ", column));
                builder.push_bind(value);
            }
            Predicate::LikeAny(columns, value) => {
                let pattern = format!("%{}%", escape_like(&value));
                builder.push(" AND (");
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        builder.push(" OR ");
                    }
                    builder.push(format!("{} LIKE ", column));
                    builder.push_bind(pattern.clone());
                    builder.push(" ESCAPE '\\'");
                }
                builder.push(")");
            }
        }
    }
}
