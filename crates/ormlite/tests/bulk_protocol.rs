//! Statement-level behaviour of the bulk operations, observed through a
//! recording connection.

use ormlite::{
    Connection, Criteria, Dialect, Entity, FieldRow, Mapping, MappingRegistry, OrmError,
    OrmLite, OrmLiteConfig, OrmResult, Params, QueryContext, QueryLogger, QueryResult, Row,
    ToValue, Value, criteria,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
struct Person {
    // Declared in a different order from the mapping on purpose.
    name: String,
    age: Option<i32>,
    id: i64,
}

impl Entity for Person {
    fn field_value(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.to_value()),
            "name" => Some(self.name.to_value()),
            "age" => Some(self.age.to_value()),
            _ => None,
        }
    }

    fn from_row(row: &FieldRow<'_>) -> OrmResult<Self> {
        Ok(Self {
            name: row.get("name")?,
            age: row.get("age")?,
            id: row.get("id")?,
        })
    }
}

fn person(id: i64) -> Person {
    Person {
        name: format!("person-{id}"),
        age: Some(20 + (id % 50) as i32),
        id,
    }
}

fn people(n: i64) -> Vec<Person> {
    (1..=n).map(person).collect()
}

fn registry() -> MappingRegistry {
    MappingRegistry::new().with::<Person>(
        Mapping::builder("people")
            .column("id", "id")
            .column("name", "full_name")
            .column("age", "age")
            .primary_key("id")
            .build()
            .unwrap(),
    )
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Begin,
    Commit,
    Rollback,
    Execute(String, Params),
    Query(String, Params),
}

type AffectedFn = Box<dyn FnMut(&str, &Params) -> u64>;

/// Records every call; can fail the n-th `execute` (1-based).
struct RecordingConnection {
    dialect: Dialect,
    events: Vec<Event>,
    executes: usize,
    fail_at: Option<usize>,
    affected: AffectedFn,
    rows: Vec<Row>,
}

impl RecordingConnection {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            events: Vec::new(),
            executes: 0,
            fail_at: None,
            affected: Box::new(default_affected),
            rows: Vec::new(),
        }
    }

    fn failing_at(mut self, n: usize) -> Self {
        self.fail_at = Some(n);
        self
    }

    fn with_affected(mut self, f: impl FnMut(&str, &Params) -> u64 + 'static) -> Self {
        self.affected = Box::new(f);
        self
    }

    fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    fn executed(&self) -> Vec<(&str, &Params)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Execute(sql, params) => Some((sql.as_str(), params)),
                _ => None,
            })
            .collect()
    }
}

fn default_affected(sql: &str, _params: &Params) -> u64 {
    if sql.starts_with("INSERT") {
        sql.matches("), (").count() as u64 + 1
    } else if sql.starts_with("DELETE") {
        sql.matches(", ").count() as u64 + 1
    } else {
        1
    }
}

impl Connection for RecordingConnection {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn begin(&mut self) -> OrmResult<()> {
        self.events.push(Event::Begin);
        Ok(())
    }

    fn commit(&mut self) -> OrmResult<()> {
        self.events.push(Event::Commit);
        Ok(())
    }

    fn rollback(&mut self) -> OrmResult<()> {
        self.events.push(Event::Rollback);
        Ok(())
    }

    fn execute(&mut self, sql: &str, params: &Params) -> OrmResult<u64> {
        self.executes += 1;
        self.events.push(Event::Execute(sql.to_string(), params.clone()));
        if self.fail_at == Some(self.executes) {
            return Err(OrmError::Query("injected failure".into()));
        }
        Ok((self.affected)(sql, params))
    }

    fn query(&mut self, sql: &str, params: &Params) -> OrmResult<Vec<Row>> {
        self.events.push(Event::Query(sql.to_string(), params.clone()));
        Ok(self.rows.clone())
    }
}

#[derive(Default)]
struct RecordingLogger {
    seen: Mutex<Vec<(String, Option<String>, Option<String>, bool)>>,
}

impl QueryLogger for RecordingLogger {
    fn after_query(&self, ctx: &QueryContext, _duration: Duration, result: &QueryResult) {
        self.seen.lock().unwrap().push((
            ctx.sql.clone(),
            ctx.tag.clone(),
            ctx.fields.get("chunk").cloned(),
            result.is_error(),
        ));
    }
}

#[test]
fn insert_chunks_into_bounded_statements_inside_one_transaction() {
    let orm = OrmLite::new(registry());
    let mut conn = RecordingConnection::new(Dialect::Sqlite);

    let inserted = orm.insert(&mut conn, &people(250)).unwrap();
    assert_eq!(inserted, 250);

    assert_eq!(conn.events.first(), Some(&Event::Begin));
    assert_eq!(conn.events.last(), Some(&Event::Commit));
    assert_eq!(conn.events.len(), 5);

    let executed = conn.executed();
    let sizes: Vec<usize> = executed.iter().map(|(_, p)| p.len()).collect();
    assert_eq!(sizes, vec![300, 300, 150]);
    for (sql, _) in &executed {
        assert!(sql.starts_with("INSERT INTO people (id, full_name, age) VALUES (?, ?, ?), "));
    }
}

#[test]
fn insert_parameters_follow_mapping_order() {
    let orm = OrmLite::new(registry());
    let mut conn = RecordingConnection::new(Dialect::Postgres);
    orm.insert(&mut conn, &[person(1), person(2)]).unwrap();

    let executed = conn.executed();
    assert_eq!(executed.len(), 1);
    let (sql, params) = executed[0];
    assert_eq!(
        sql,
        "INSERT INTO people (id, full_name, age) VALUES ($1, $2, $3), ($4, $5, $6)"
    );
    assert_eq!(
        params,
        &Params::Positional(vec![
            Value::Int(1),
            Value::Text("person-1".into()),
            Value::Int(21),
            Value::Int(2),
            Value::Text("person-2".into()),
            Value::Int(22),
        ])
    );
}

#[test]
fn insert_chunk_size_is_configurable() {
    let mut orm = OrmLite::new(registry());
    orm.set_max_insert_size(3).unwrap();
    let mut conn = RecordingConnection::new(Dialect::Sqlite);

    orm.insert(&mut conn, &people(7)).unwrap();
    let sizes: Vec<usize> = conn.executed().iter().map(|(_, p)| p.len() / 3).collect();
    assert_eq!(sizes, vec![3, 3, 1]);
}

#[test]
fn insert_failure_rolls_back_and_stops() {
    let orm = OrmLite::new(registry());
    let mut conn = RecordingConnection::new(Dialect::Sqlite).failing_at(2);

    let err = orm.insert(&mut conn, &people(250)).unwrap_err();
    assert!(matches!(err, OrmError::Query(ref m) if m == "injected failure"));

    assert_eq!(conn.executed().len(), 2);
    assert_eq!(conn.events.first(), Some(&Event::Begin));
    assert_eq!(conn.events.last(), Some(&Event::Rollback));
    assert!(!conn.events.contains(&Event::Commit));
}

#[test]
fn empty_batches_do_no_io() {
    let orm = OrmLite::new(registry());
    let mut conn = RecordingConnection::new(Dialect::Sqlite);

    assert_eq!(orm.insert::<Person, _>(&mut conn, &[]).unwrap(), 0);
    assert!(orm.update::<Person, _>(&mut conn, &[]).unwrap().is_empty());
    assert_eq!(orm.delete::<Person, _>(&mut conn, &[]).unwrap(), 0);
    assert!(conn.events.is_empty());
}

#[test]
fn unmapped_type_fails_before_any_io() {
    let orm = OrmLite::new(MappingRegistry::new());
    let mut conn = RecordingConnection::new(Dialect::Sqlite);

    let err = orm.insert(&mut conn, &[person(1)]).unwrap_err();
    assert!(err.is_unmapped_type());
    assert!(orm.update(&mut conn, &[person(1)]).unwrap_err().is_unmapped_type());
    assert!(orm.find_all::<Person, _>(&mut conn).unwrap_err().is_unmapped_type());
    assert!(conn.events.is_empty());
}

#[test]
fn update_rebinds_one_statement_per_record() {
    let orm = OrmLite::new(registry());
    let mut conn = RecordingConnection::new(Dialect::Sqlite).with_affected(|_, params| {
        // Record 2 no longer exists.
        match params.values().last() {
            Some(Value::Int(2)) => 0,
            _ => 1,
        }
    });

    let report = orm.update(&mut conn, &people(3)).unwrap();
    assert_eq!(report.affected(), &[1, 0, 1]);
    assert_eq!(report.total(), 2);
    assert_eq!(report.unmatched(), vec![1]);

    let executed = conn.executed();
    assert_eq!(executed.len(), 3);
    for (sql, _) in &executed {
        assert_eq!(
            *sql,
            "UPDATE people SET id = ?, full_name = ?, age = ? WHERE id = ?"
        );
    }
    assert_eq!(
        executed[0].1,
        &Params::Positional(vec![
            Value::Int(1),
            Value::Text("person-1".into()),
            Value::Int(21),
            Value::Int(1),
        ])
    );
    assert_eq!(conn.events.first(), Some(&Event::Begin));
    assert_eq!(conn.events.last(), Some(&Event::Commit));
}

#[test]
fn update_can_leave_primary_key_out_of_set() {
    let orm = OrmLite::new(registry())
        .with_config(OrmLiteConfig::new().exclude_primary_key_from_set())
        .unwrap();
    let mut conn = RecordingConnection::new(Dialect::Postgres);

    orm.update(&mut conn, &[person(4)]).unwrap();
    let executed = conn.executed();
    assert_eq!(
        executed[0].0,
        "UPDATE people SET full_name = $1, age = $2 WHERE id = $3"
    );
    assert_eq!(executed[0].1.len(), 3);
}

#[test]
fn update_failure_rolls_back() {
    let orm = OrmLite::new(registry());
    let mut conn = RecordingConnection::new(Dialect::Sqlite).failing_at(2);

    assert!(orm.update(&mut conn, &people(5)).is_err());
    assert_eq!(conn.executed().len(), 2);
    assert_eq!(conn.events.last(), Some(&Event::Rollback));
}

#[derive(Debug, Clone)]
struct Tag {
    label: String,
}

impl Entity for Tag {
    fn field_value(&self, field: &str) -> Option<Value> {
        (field == "label").then(|| self.label.to_value())
    }

    fn from_row(row: &FieldRow<'_>) -> OrmResult<Self> {
        Ok(Self {
            label: row.get("label")?,
        })
    }
}

#[test]
fn delete_embeds_quoted_keys_without_a_transaction() {
    let registry = MappingRegistry::new().with::<Tag>(
        Mapping::builder("tags")
            .column("label", "label")
            .primary_key("label")
            .build()
            .unwrap(),
    );
    let orm = OrmLite::new(registry);
    let mut conn = RecordingConnection::new(Dialect::Sqlite);

    let tags = [
        Tag { label: "rust".into() },
        Tag { label: "o'brien".into() },
        Tag { label: "x'); DROP TABLE tags; --".into() },
    ];
    let deleted = orm.delete(&mut conn, &tags).unwrap();
    assert_eq!(deleted, 3);

    assert_eq!(conn.events.len(), 1);
    let (sql, params) = conn.executed()[0];
    assert_eq!(
        sql,
        "DELETE FROM tags WHERE label IN ('rust', 'o''brien', 'x''); DROP TABLE tags; --')"
    );
    assert!(params.is_empty());
}

#[test]
fn delete_integer_keys() {
    let orm = OrmLite::new(registry());
    let mut conn = RecordingConnection::new(Dialect::Postgres);
    orm.delete(&mut conn, &people(3)).unwrap();
    assert_eq!(conn.executed()[0].0, "DELETE FROM people WHERE id IN (1, 2, 3)");
}

fn person_rows() -> Vec<Row> {
    let columns: Arc<[String]> =
        vec!["id".to_string(), "full_name".to_string(), "age".to_string()].into();
    vec![
        Row::new(
            Arc::clone(&columns),
            vec![Value::Int(7), Value::Text("Ada".into()), Value::Int(36)],
        ),
        Row::new(columns, vec![Value::Int(8), Value::Text("Alan".into()), Value::Null]),
    ]
}

#[test]
fn find_by_binds_named_parameters() {
    let orm = OrmLite::new(registry());
    let mut conn = RecordingConnection::new(Dialect::Sqlite).with_rows(person_rows());

    let found: Vec<Person> = orm
        .find_by(&mut conn, &criteria! { "name" => "Ada", "age" => 36 })
        .unwrap();
    assert_eq!(
        found,
        vec![
            Person { name: "Ada".into(), age: Some(36), id: 7 },
            Person { name: "Alan".into(), age: None, id: 8 },
        ]
    );

    assert_eq!(
        conn.events,
        vec![Event::Query(
            "SELECT id, full_name, age FROM people WHERE age = :age AND full_name = :name".into(),
            Params::Named(vec![
                ("age".into(), Value::Int(36)),
                ("name".into(), Value::Text("Ada".into())),
            ]),
        )]
    );
}

#[test]
fn find_all_and_find_one() {
    let orm = OrmLite::new(registry());
    let mut conn = RecordingConnection::new(Dialect::Postgres).with_rows(person_rows());

    let all: Vec<Person> = orm.find_all(&mut conn).unwrap();
    assert_eq!(all.len(), 2);

    let one: Option<Person> = orm
        .find_one_by(&mut conn, &criteria! { "id" => 7_i64 })
        .unwrap();
    assert_eq!(one.map(|p| p.name), Some("Ada".to_string()));

    let sqls: Vec<&str> = conn
        .events
        .iter()
        .filter_map(|e| match e {
            Event::Query(sql, _) => Some(sql.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        sqls,
        vec![
            "SELECT id, full_name, age FROM people",
            "SELECT id, full_name, age FROM people WHERE id = $1 LIMIT 1",
        ]
    );

    let mut empty = RecordingConnection::new(Dialect::Postgres);
    let none: Option<Person> = orm.find_one_by(&mut empty, &Criteria::new()).unwrap();
    assert!(none.is_none());
}

#[test]
fn find_by_unknown_field_fails_before_any_io() {
    let orm = OrmLite::new(registry());
    let mut conn = RecordingConnection::new(Dialect::Sqlite);

    let err = orm
        .find_by::<Person, _>(&mut conn, &criteria! { "email" => "a@b.c" })
        .unwrap_err();
    assert!(err.is_invalid_field());
    assert!(conn.events.is_empty());
}

#[test]
fn bulk_statements_carry_the_bulk_tag() {
    let logger = Arc::new(RecordingLogger::default());
    let mut orm = OrmLite::new(registry()).with_logger_arc(logger.clone());
    orm.set_max_insert_size(2).unwrap();
    let mut conn = RecordingConnection::new(Dialect::Sqlite).failing_at(6);

    orm.insert(&mut conn, &people(3)).unwrap();
    orm.update(&mut conn, &people(1)).unwrap();
    orm.delete(&mut conn, &people(1)).unwrap();
    orm.find_all::<Person, _>(&mut conn).unwrap();
    assert!(orm.update(&mut conn, &people(2)).is_err());

    let seen = logger.seen.lock().unwrap();
    let tags: Vec<Option<&str>> = seen.iter().map(|(_, tag, _, _)| tag.as_deref()).collect();
    assert_eq!(
        tags,
        vec![
            Some("bulk"),
            Some("bulk"),
            Some("bulk"),
            None,
            None,
            Some("bulk"),
            Some("bulk"),
        ]
    );
    assert_eq!(seen[0].2.as_deref(), Some("1/2"));
    assert_eq!(seen[1].2.as_deref(), Some("2/2"));
    assert!(seen[..6].iter().all(|(_, _, _, failed)| !failed));
    assert!(seen[6].3);
}
