//! The record engine: one instance per table row.
//!
//! A [`Record`] binds a [`RecordState`] to a database handle and runs the
//! load/save/delete state machine:
//!
//! - `load(id)` is valid from `Unloaded` and moves to `Loaded`.
//! - `save()` inserts when the primary key is empty and updates otherwise.
//!   A never-loaded record can be saved; success moves it to `Loaded`.
//! - `delete()` needs a non-empty primary key and moves to `Deleted`, which
//!   is terminal.
//!
//! Save and delete raise `Before*`/`After*` events. A `Before*` listener
//! that clears `is_valid` aborts the operation, which then returns
//! `Ok(false)` without touching the database.

use crate::database::{Database, DatabaseError};
use crate::error::{RecordError, SchemaError};
use crate::events::{AfterDelete, AfterSave, BeforeDelete, BeforeSave, EventHub, ListenerResult};
use crate::metrics::{self, Operation, Outcome};
use crate::schema::{registry, LogicalType, SchemaDeclaration, SchemaDescriptor};
use crate::sql::{self, Statement};
use crate::state::{FieldErrors, RecordState};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::time::Instant;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// A record type: a table declaration plus optional validation.
///
/// Usually implemented with `#[derive(DbRecord)]`.
pub trait RecordType: 'static {
    /// Field declarations for this type. Called once; see [`RecordType::schema`].
    fn declaration() -> SchemaDeclaration;

    /// Memoized schema descriptor for this type.
    ///
    /// # Errors
    ///
    /// The [`SchemaError`] raised while building the declaration.
    fn schema() -> Result<&'static SchemaDescriptor, SchemaError>
    where
        Self: Sized,
    {
        registry::resolve::<Self>()
    }

    /// Fill `errors` with one message per invalid field.
    fn validate(_record: &RecordState, _errors: &mut FieldErrors) {}
}

/// Typed conversion between a struct and its record state.
///
/// Generated by `#[derive(DbRecord)]` when every field has a supported kind.
pub trait RecordModel: RecordType + Sized {
    /// Read every field from `state`; unset or unreadable values become the
    /// field type's default.
    fn from_state(state: &RecordState) -> Self;

    /// Column name and value for every field.
    fn to_values(&self) -> Vec<(&'static str, Value)>;
}

/// Persistence status of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordStatus {
    Unloaded,
    Loaded,
    Deleted,
}

/// One table row of type `T`, bound to a database handle.
pub struct Record<'db, T: RecordType> {
    db: &'db dyn Database,
    state: RecordState,
    events: EventHub,
    status: RecordStatus,
    _type: PhantomData<fn() -> T>,
}

impl<T: RecordType> fmt::Debug for Record<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("table", &self.state.schema().table_name())
            .field("dialect", &self.db.dialect())
            .field("status", &self.status)
            .field("state", &self.state)
            .field("events", &self.events)
            .finish()
    }
}

impl<T: RecordType> Deref for Record<'_, T> {
    type Target = RecordState;

    fn deref(&self) -> &RecordState {
        &self.state
    }
}

impl<T: RecordType> DerefMut for Record<'_, T> {
    fn deref_mut(&mut self) -> &mut RecordState {
        &mut self.state
    }
}

impl<'db, T: RecordType> Record<'db, T> {
    /// An empty record, a candidate for insertion.
    ///
    /// # Errors
    ///
    /// [`RecordError::Schema`] if `T`'s declaration does not build.
    pub fn new(db: &'db dyn Database) -> Result<Self, RecordError> {
        Ok(Self {
            db,
            state: RecordState::new(T::schema()?),
            events: EventHub::new(),
            status: RecordStatus::Unloaded,
            _type: PhantomData,
        })
    }

    /// Create a record and load the row with primary key `id`.
    ///
    /// # Errors
    ///
    /// See [`Record::new`] and [`Record::load`].
    pub fn find(db: &'db dyn Database, id: impl Into<Value>) -> Result<Self, RecordError> {
        let mut record = Self::new(db)?;
        record.load(id)?;
        Ok(record)
    }

    /// Create an unsaved record holding `values`.
    ///
    /// # Errors
    ///
    /// See [`Record::new`] and [`RecordState::bind`].
    pub fn with_values<I, K, V>(db: &'db dyn Database, values: I) -> Result<Self, RecordError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut record = Self::new(db)?;
        record.state.bind(values)?;
        Ok(record)
    }

    pub fn status(&self) -> RecordStatus {
        self.status
    }

    pub fn schema(&self) -> &'static SchemaDescriptor {
        self.state.schema()
    }

    pub fn state(&self) -> &RecordState {
        &self.state
    }

    pub fn events_mut(&mut self) -> &mut EventHub {
        &mut self.events
    }

    pub fn on_before_save<F>(&mut self, listener: F)
    where
        F: for<'a> FnMut(&mut BeforeSave<'a>) -> ListenerResult + 'static,
    {
        self.events.on_before_save(listener);
    }

    pub fn on_after_save<F>(&mut self, listener: F)
    where
        F: for<'a> FnMut(&mut AfterSave<'a>) -> ListenerResult + 'static,
    {
        self.events.on_after_save(listener);
    }

    pub fn on_before_delete<F>(&mut self, listener: F)
    where
        F: for<'a> FnMut(&mut BeforeDelete<'a>) -> ListenerResult + 'static,
    {
        self.events.on_before_delete(listener);
    }

    pub fn on_after_delete<F>(&mut self, listener: F)
    where
        F: for<'a> FnMut(&mut AfterDelete<'a>) -> ListenerResult + 'static,
    {
        self.events.on_after_delete(listener);
    }

    /// Rebuild the field-error map from [`RecordType::validate`].
    pub fn is_valid(&mut self) -> bool {
        let mut errors = FieldErrors::new();
        T::validate(&self.state, &mut errors);
        let valid = errors.is_empty();
        self.state.replace_errors(errors);
        valid
    }

    fn require_status(&self, operation: &'static str, allowed: &[RecordStatus]) -> Result<(), RecordError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(RecordError::InvalidState {
                operation,
                status: self.status,
            })
        }
    }

    fn persistence_error(&self, statement: &Statement, err: DatabaseError) -> RecordError {
        emit!(
            warn,
            "{} on table {} failed: {}",
            statement.sql,
            self.schema().table_name(),
            err
        );
        RecordError::Persistence {
            query: statement.sql.clone(),
            message: err.message,
        }
    }

    fn execute(&self, statement: &Statement) -> Result<u64, RecordError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::statement_span(&statement.sql).entered();

        emit!(debug, "{} -- {:?}", statement.sql, statement.params);
        self.db
            .execute(&statement.sql, &statement.params)
            .map_err(|e| self.persistence_error(statement, e))
    }

    /// Load the row whose primary key equals `id` into this record.
    ///
    /// # Errors
    ///
    /// - [`RecordError::Schema`] if the primary key is not a column; no query runs.
    /// - [`RecordError::NotFound`] if no row matches.
    /// - [`RecordError::InvalidState`] unless the record is `Unloaded`.
    /// - [`RecordError::Persistence`] if the backend fails.
    pub fn load(&mut self, id: impl Into<Value>) -> Result<&mut Self, RecordError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::load_span(self.schema().table_name()).entered();

        let started = Instant::now();
        let result = self.load_row(id.into());
        let outcome = if result.is_ok() { Outcome::Success } else { Outcome::Failed };
        metrics::observe(Operation::Load, started, outcome);
        result?;
        Ok(self)
    }

    fn load_row(&mut self, id: Value) -> Result<(), RecordError> {
        self.require_status("load", &[RecordStatus::Unloaded])?;

        let schema = self.schema();
        let key_type = schema.check_primary_key()?;
        let key = id.to_param(schema.primary_key(), key_type)?;
        let statement = sql::select_by_key(self.db.dialect(), schema, key);
        let types: Vec<LogicalType> = schema.columns().iter().map(|c| c.logical_type).collect();

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::statement_span(&statement.sql).entered();

        emit!(debug, "{} -- {:?}", statement.sql, statement.params);
        let row = self
            .db
            .query_row(&statement.sql, &statement.params, &types)
            .map_err(|e| self.persistence_error(&statement, e))?
            .ok_or_else(|| RecordError::NotFound {
                table: schema.table_name().to_string(),
                id,
            })?;

        for (column, value) in schema.columns().iter().zip(row) {
            self.state.put(&column.name, value);
        }
        self.status = RecordStatus::Loaded;
        Ok(())
    }

    /// Insert or update this record.
    ///
    /// Returns `Ok(false)` when a `BeforeSave` listener vetoes the save.
    ///
    /// # Errors
    ///
    /// - [`RecordError::Schema`] if the primary key is not a column.
    /// - [`RecordError::InvalidValue`] if a field cannot be bound as its type.
    /// - [`RecordError::Persistence`] if the backend fails.
    /// - [`RecordError::Listener`] if a listener fails.
    /// - [`RecordError::InvalidState`] on a deleted record.
    pub fn save(&mut self) -> Result<bool, RecordError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::save_span(
            self.schema().table_name(),
            self.state.primary_key_value().is_empty(),
        )
        .entered();

        let started = Instant::now();
        let result = self.save_row();
        metrics::observe(Operation::Save, started, outcome_of(&result));
        result
    }

    fn save_row(&mut self) -> Result<bool, RecordError> {
        self.require_status("save", &[RecordStatus::Unloaded, RecordStatus::Loaded])?;

        let schema = self.schema();
        let key_type = schema.check_primary_key()?;
        let insert = self.state.primary_key_value().is_empty();

        let mut event = BeforeSave::new(&mut self.state, insert);
        self.events.trigger(&mut event)?;
        if !event.is_valid {
            emit!(
                info,
                "{} on table {} vetoed by listener",
                if insert { "insert" } else { "update" },
                schema.table_name()
            );
            return Ok(false);
        }

        let dialect = self.db.dialect();
        if insert {
            let statement = sql::insert(dialect, schema, &self.state)?;
            self.execute(&statement)?;
            let id = self
                .db
                .last_insert_id()
                .map_err(|e| self.persistence_error(&statement, e))?;
            let key = match key_type {
                LogicalType::Int => Value::Int(id),
                LogicalType::String => Value::String(id.to_string()),
                LogicalType::Bool => Value::Bool(id != 0),
            };
            self.state.put(schema.primary_key(), key);
        } else {
            let current = self.state.primary_key_value();
            let key = current.as_int().unwrap_or_else(|| {
                emit!(
                    warn,
                    "primary key {:?} on table {} is not an integer; updating row 0",
                    current,
                    schema.table_name()
                );
                0
            });
            if let Some(statement) = sql::update(dialect, schema, &self.state, key)? {
                self.execute(&statement)?;
            }
        }
        self.status = RecordStatus::Loaded;

        self.events.trigger(&mut AfterSave {
            record: &mut self.state,
        })?;
        Ok(true)
    }

    /// Delete this record's row.
    ///
    /// Returns `Ok(false)` when a `BeforeDelete` listener vetoes the delete.
    /// On success the primary key is cleared and the record becomes
    /// `Deleted`; it must not be reused.
    ///
    /// # Errors
    ///
    /// - [`RecordError::NotLoaded`] if the primary key holds no value.
    /// - [`RecordError::Persistence`] if the backend fails.
    /// - [`RecordError::Listener`] if a listener fails.
    /// - [`RecordError::InvalidState`] on a deleted record.
    pub fn delete(&mut self) -> Result<bool, RecordError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::delete_span(self.schema().table_name()).entered();

        let started = Instant::now();
        let result = self.delete_row();
        metrics::observe(Operation::Delete, started, outcome_of(&result));
        result
    }

    fn delete_row(&mut self) -> Result<bool, RecordError> {
        self.require_status("delete", &[RecordStatus::Unloaded, RecordStatus::Loaded])?;

        let schema = self.schema();
        let key = self.state.primary_key_value();
        if key.is_empty() {
            return Err(RecordError::NotLoaded {
                table: schema.table_name().to_string(),
            });
        }
        schema.check_primary_key()?;

        let mut event = BeforeDelete::new(&mut self.state);
        self.events.trigger(&mut event)?;
        if !event.is_valid {
            emit!(info, "delete on table {} vetoed by listener", schema.table_name());
            return Ok(false);
        }

        let key = key
            .to_param(schema.primary_key(), LogicalType::Int)?
            .as_int()
            .unwrap_or_default();
        let statement = sql::delete_by_key(self.db.dialect(), schema, key);
        self.execute(&statement)?;
        self.state.remove(schema.primary_key());
        self.status = RecordStatus::Deleted;

        self.events.trigger(&mut AfterDelete {
            record: &mut self.state,
        })?;
        Ok(true)
    }
}

impl<'db, T: RecordModel> Record<'db, T> {
    /// Create an unsaved record from a model's field values.
    ///
    /// # Errors
    ///
    /// See [`Record::with_values`].
    pub fn from_model(db: &'db dyn Database, model: &T) -> Result<Self, RecordError> {
        Self::with_values(db, model.to_values())
    }

    pub fn to_model(&self) -> T {
        T::from_state(&self.state)
    }
}

fn outcome_of(result: &Result<bool, RecordError>) -> Outcome {
    match result {
        Ok(true) => Outcome::Success,
        Ok(false) => Outcome::Vetoed,
        Err(_) => Outcome::Failed,
    }
}
