//! Tests for the generated `RecordModel` conversions

use dbrecord::{DbRecord, Record, RecordModel, RecordState, RecordType, SqliteDatabase, Value};
use fake::{Dummy, Fake, Faker};

#[derive(Debug, Clone, PartialEq, DbRecord, Dummy)]
#[table_name = "contact"]
struct Contact {
    #[primary_key]
    id: i64,
    name: String,
    order: i32,
    active: bool,
    nickname: Option<String>,
}

#[test]
fn test_to_values_then_from_state() {
    let schema = Contact::schema().unwrap();
    for _ in 0..20 {
        let contact: Contact = Faker.fake();
        let mut state = RecordState::new(schema);
        state.bind(contact.to_values()).unwrap();
        assert_eq!(Contact::from_state(&state), contact);
    }
}

#[test]
fn test_from_state_defaults_unset_fields() {
    let mut state = RecordState::new(Contact::schema().unwrap());
    state.set(ContactColumn::Name, "Toto").unwrap();

    let contact = Contact::from_state(&state);
    assert_eq!(contact.id, 0);
    assert_eq!(contact.name, "Toto");
    assert!(!contact.active);
    assert_eq!(contact.nickname, None);
}

#[test]
fn test_record_from_model_round_trip() {
    let db = SqliteDatabase::open_in_memory().unwrap();
    db.connection()
        .execute_batch(
            "CREATE TABLE contact (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, \
             \"order\" INTEGER, active BOOLEAN, nickname TEXT)",
        )
        .unwrap();

    let model = Contact {
        id: 0,
        name: "Paul".to_string(),
        order: 2,
        active: true,
        nickname: Some("Macca".to_string()),
    };
    let mut record = Record::from_model(&db, &model).unwrap();
    assert!(record.save().unwrap());
    let id = record.get(ContactColumn::Id).unwrap();
    assert_eq!(id, Value::Int(1));

    let loaded = Record::<Contact>::find(&db, id).unwrap();
    assert_eq!(loaded.to_model(), Contact { id: 1, ..model });
}
