//! Schema descriptors derived from record declarations.
//!
//! A record type declares its fields once (via `#[derive(DbRecord)]` or a
//! hand-written [`SchemaDeclaration`]). The declaration is built into an
//! immutable [`SchemaDescriptor`] holding the table name, the ordered
//! column map and the primary-key name. Descriptors are memoized per type
//! by [`registry`].

pub mod registry;

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Binding type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalType {
    Int,
    String,
    Bool,
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalType::Int => write!(f, "int"),
            LogicalType::String => write!(f, "string"),
            LogicalType::Bool => write!(f, "bool"),
        }
    }
}

/// Kind of a declared field, as written in the record declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredKind {
    Integer,
    String,
    Boolean,
    Float,
    /// Anything else, carrying the declared type's name.
    Other(String),
}

impl DeclaredKind {
    /// Map a declared kind to its logical type.
    ///
    /// Floating point maps to `String`: values are stored as text so they
    /// round-trip on every backend.
    pub fn logical_type(&self) -> Option<LogicalType> {
        match self {
            DeclaredKind::Integer => Some(LogicalType::Int),
            DeclaredKind::String | DeclaredKind::Float => Some(LogicalType::String),
            DeclaredKind::Boolean => Some(LogicalType::Bool),
            DeclaredKind::Other(_) => None,
        }
    }
}

impl fmt::Display for DeclaredKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredKind::Integer => write!(f, "integer"),
            DeclaredKind::String => write!(f, "string"),
            DeclaredKind::Boolean => write!(f, "boolean"),
            DeclaredKind::Float => write!(f, "float"),
            DeclaredKind::Other(name) => write!(f, "{name}"),
        }
    }
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub field: String,
    /// Explicit column name; defaults to the field name.
    pub column: Option<String>,
    pub primary_key: bool,
    pub kind: DeclaredKind,
}

impl FieldDecl {
    pub fn new(field: impl Into<String>, kind: DeclaredKind) -> Self {
        Self {
            field: field.into(),
            column: None,
            primary_key: false,
            kind,
        }
    }

    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.field)
    }
}

/// Source form of a schema: table name plus field declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDeclaration {
    pub table_name: String,
    pub fields: Vec<FieldDecl>,
    /// Explicit primary-key column, overriding any field flag.
    pub primary_key: Option<String>,
}

impl SchemaDeclaration {
    pub fn new(table_name: impl Into<String>, fields: Vec<FieldDecl>) -> Self {
        Self {
            table_name: table_name.into(),
            fields,
            primary_key: None,
        }
    }

    /// Build the descriptor.
    ///
    /// # Errors
    ///
    /// Fails on unsupported field kinds, duplicate columns, more than one
    /// primary-key flag or an empty table name. A primary key that names no
    /// column is *not* reported here; see
    /// [`SchemaDescriptor::check_primary_key`].
    pub fn build(&self) -> Result<SchemaDescriptor, SchemaError> {
        if self.table_name.is_empty() {
            return Err(SchemaError::EmptyTable);
        }

        let mut columns = Vec::with_capacity(self.fields.len());
        let mut index = HashMap::with_capacity(self.fields.len());
        let mut flagged: Option<String> = None;

        for decl in &self.fields {
            let logical_type = decl.kind.logical_type().ok_or_else(|| SchemaError::UnsupportedType {
                field: decl.field.clone(),
                kind: decl.kind.to_string(),
            })?;
            let name = decl.column_name().to_string();

            if index.insert(name.clone(), columns.len()).is_some() {
                return Err(SchemaError::DuplicateColumn {
                    table: self.table_name.clone(),
                    column: name,
                });
            }

            if decl.primary_key {
                if let Some(first) = &flagged {
                    return Err(SchemaError::MultiplePrimaryKeys {
                        table: self.table_name.clone(),
                        first: first.clone(),
                        second: name,
                    });
                }
                flagged = Some(name.clone());
            }

            columns.push(ColumnDef { name, logical_type });
        }

        let primary_key = self
            .primary_key
            .clone()
            .or(flagged)
            .unwrap_or_else(|| DEFAULT_PRIMARY_KEY.to_string());

        Ok(SchemaDescriptor {
            table_name: self.table_name.clone(),
            primary_key,
            columns,
            index,
        })
    }
}

/// Primary-key name used when no field is flagged.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// A column of a [`SchemaDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub logical_type: LogicalType,
}

/// Immutable table metadata shared by all records of one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    table_name: String,
    primary_key: String,
    columns: Vec<ColumnDef>,
    index: HashMap<String, usize>,
}

impl SchemaDescriptor {
    /// Start a legacy explicit declaration: a column map with logical types.
    pub fn builder(table_name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            table_name: table_name.into(),
            columns: Vec::new(),
            primary_key: None,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn logical_type(&self, name: &str) -> Option<LogicalType> {
        self.column(name).map(|c| c.logical_type)
    }

    /// Columns other than the primary key, in declaration order.
    pub fn value_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(move |c| c.name != self.primary_key)
    }

    /// Logical type of the primary key.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingPrimaryKey`] when the primary key is not
    /// one of the columns.
    pub fn check_primary_key(&self) -> Result<LogicalType, SchemaError> {
        self.logical_type(&self.primary_key)
            .ok_or_else(|| SchemaError::MissingPrimaryKey {
                table: self.table_name.clone(),
                primary_key: self.primary_key.clone(),
            })
    }
}

/// Builder for explicit column maps.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    table_name: String,
    columns: Vec<(String, LogicalType)>,
    primary_key: Option<String>,
}

impl SchemaBuilder {
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, logical_type: LogicalType) -> Self {
        self.columns.push((name.into(), logical_type));
        self
    }

    /// Override the primary-key name (defaults to `id`).
    #[must_use]
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = Some(name.into());
        self
    }

    /// Convert into a [`SchemaDeclaration`].
    pub fn declaration(self) -> SchemaDeclaration {
        let fields = self
            .columns
            .into_iter()
            .map(|(name, ty)| {
                let kind = match ty {
                    LogicalType::Int => DeclaredKind::Integer,
                    LogicalType::String => DeclaredKind::String,
                    LogicalType::Bool => DeclaredKind::Boolean,
                };
                FieldDecl::new(name, kind)
            })
            .collect();

        SchemaDeclaration {
            table_name: self.table_name,
            fields,
            primary_key: self.primary_key,
        }
    }

    /// # Errors
    ///
    /// See [`SchemaDeclaration::build`].
    pub fn build(self) -> Result<SchemaDescriptor, SchemaError> {
        self.declaration().build()
    }
}
