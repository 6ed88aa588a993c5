//! Typed Field References
//!
//! A [`Field<M, T>`] names one column of model `M` holding values of type `T`.
//! Query builders accept fields instead of column strings, so a join between
//! mismatched value types, or a sort on another model's column, does not
//! compile. Models expose their fields as associated consts:
//!
//! ```
//! use elif_relations::Field;
//! # #[derive(Debug)] struct Friendship;
//! impl Friendship {
//!     pub const LEFT: Field<Friendship, i64> = Field::new("left_id");
//!     pub const RIGHT: Field<Friendship, i64> = Field::new("right_id");
//! }
//! assert_ne!(Friendship::LEFT, Friendship::RIGHT);
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::error::{ModelError, ModelResult};
use crate::model::Model;
use crate::security::validate_identifier;

/// Compile-time typed handle to a column of model `M` with value type `T`
pub struct Field<M, T> {
    column: &'static str,
    _marker: PhantomData<fn() -> (M, T)>,
}

impl<M, T> Field<M, T> {
    /// Create a field reference for `column`
    pub const fn new(column: &'static str) -> Self {
        Self {
            column,
            _marker: PhantomData,
        }
    }

    /// Bare column name
    pub fn column(&self) -> &'static str {
        self.column
    }
}

impl<M: Model, T> Field<M, T> {
    /// Column name qualified with the owning model's table
    pub fn qualified(&self) -> String {
        format!("{}.{}", M::table_name(), self.column)
    }

    /// Check the column against the model's declared columns.
    ///
    /// This is the registration-time fallback for pairings the type system
    /// cannot see, such as a field constant built with a misspelled column.
    pub fn validate(&self) -> ModelResult<()> {
        validate_identifier(self.column)?;

        if !M::columns().contains(&self.column) {
            return Err(ModelError::Configuration(format!(
                "Column '{}' is not declared on '{}'",
                self.column,
                M::table_name()
            )));
        }

        Ok(())
    }
}

impl<M, T> Clone for Field<M, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M, T> Copy for Field<M, T> {}

impl<M, T> PartialEq for Field<M, T> {
    fn eq(&self, other: &Self) -> bool {
        self.column == other.column
    }
}

impl<M, T> Eq for Field<M, T> {}

impl<M, T> Hash for Field<M, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.column.hash(state);
    }
}

impl<M, T> fmt::Debug for Field<M, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("model", &std::any::type_name::<M>())
            .field("column", &self.column)
            .field("value", &std::any::type_name::<T>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Friendship, User};
    use uuid::Uuid;

    #[test]
    fn test_field_identity() {
        assert_eq!(Friendship::LEFT, Field::<Friendship, Uuid>::new("left_id"));
        assert_ne!(Friendship::LEFT, Friendship::RIGHT);
        assert_eq!(Friendship::LEFT.column(), "left_id");
    }

    #[test]
    fn test_qualified_column() {
        assert_eq!(Friendship::RIGHT.qualified(), "friendships.right_id");
        assert_eq!(User::ID.qualified(), "users.id");
    }

    #[test]
    fn test_validate_against_declared_columns() {
        assert!(Friendship::LEFT.validate().is_ok());

        let bogus: Field<Friendship, Uuid> = Field::new("lefty_id");
        let err = bogus.validate().unwrap_err();
        assert!(matches!(err, ModelError::Configuration(msg) if msg.contains("lefty_id")));

        let hostile: Field<Friendship, Uuid> = Field::new("left_id OR 1=1");
        assert!(matches!(hostile.validate().unwrap_err(), ModelError::Query(_)));
    }

    #[test]
    fn test_debug_names_model() {
        let rendered = format!("{:?}", Friendship::LEFT);
        assert!(rendered.contains("Friendship"));
        assert!(rendered.contains("left_id"));
    }
}
