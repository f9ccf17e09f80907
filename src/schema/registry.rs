//! Per-type memoization of schema descriptors.
//!
//! The first resolution of a record type builds its declaration and leaks
//! the descriptor so every record of that type shares one `'static`
//! value. Failed builds are not cached.

use super::SchemaDescriptor;
use crate::error::SchemaError;
use crate::record::RecordType;
use once_cell::sync::Lazy;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

static REGISTRY: Lazy<Mutex<HashMap<TypeId, &'static SchemaDescriptor>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Resolve the descriptor of `T`, building it on first use.
///
/// # Errors
///
/// Returns the [`SchemaError`] raised by the declaration's build.
pub fn resolve<T: RecordType>() -> Result<&'static SchemaDescriptor, SchemaError> {
    let key = TypeId::of::<T>();
    let mut registry = REGISTRY.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(schema) = registry.get(&key) {
        return Ok(schema);
    }

    let schema: &'static SchemaDescriptor = Box::leak(Box::new(T::declaration().build()?));
    log::debug!(
        "registered schema for table {} ({} columns, primary key {})",
        schema.table_name(),
        schema.columns().len(),
        schema.primary_key()
    );
    registry.insert(key, schema);
    Ok(schema)
}

/// Whether `T` has already been resolved.
pub fn is_registered<T: RecordType>() -> bool {
    REGISTRY
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .contains_key(&TypeId::of::<T>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DeclaredKind, FieldDecl, SchemaDeclaration};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static BUILDS: AtomicUsize = AtomicUsize::new(0);

    struct Counted;

    impl RecordType for Counted {
        fn declaration() -> SchemaDeclaration {
            BUILDS.fetch_add(1, Ordering::SeqCst);
            SchemaDeclaration::new(
                "counted",
                vec![FieldDecl::new("id", DeclaredKind::Integer).primary_key()],
            )
        }
    }

    struct Broken;

    impl RecordType for Broken {
        fn declaration() -> SchemaDeclaration {
            SchemaDeclaration::new(
                "broken",
                vec![FieldDecl::new("blob", DeclaredKind::Other("Vec<u8>".to_string()))],
            )
        }
    }

    #[test]
    fn test_resolve_builds_once() {
        let first = resolve::<Counted>().unwrap();
        let second = resolve::<Counted>().unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
        assert!(is_registered::<Counted>());
    }

    #[test]
    fn test_failed_build_not_cached() {
        assert!(matches!(
            resolve::<Broken>(),
            Err(SchemaError::UnsupportedType { .. })
        ));
        assert!(!is_registered::<Broken>());
    }
}
