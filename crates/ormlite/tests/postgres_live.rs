//! Runs only when `DATABASE_URL` points at a PostgreSQL server.

#![cfg(feature = "postgres")]

use chrono::{NaiveDate, NaiveDateTime};
use ormlite::{
    Connection, Entity, FieldRow, Mapping, MappingRegistry, OrmLite, OrmResult, PgConnection,
    ToValue, Value, criteria,
};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq)]
struct Reading {
    sensor: String,
    taken_at: NaiveDateTime,
    celsius: f64,
    flagged: bool,
    samples: i32,
}

impl Entity for Reading {
    fn field_value(&self, field: &str) -> Option<Value> {
        match field {
            "sensor" => Some(self.sensor.to_value()),
            "taken_at" => Some(self.taken_at.to_value()),
            "celsius" => Some(self.celsius.to_value()),
            "flagged" => Some(self.flagged.to_value()),
            "samples" => Some(self.samples.to_value()),
            _ => None,
        }
    }

    fn from_row(row: &FieldRow<'_>) -> OrmResult<Self> {
        Ok(Self {
            sensor: row.get("sensor")?,
            taken_at: row.get("taken_at")?,
            celsius: row.get("celsius")?,
            flagged: row.get("flagged")?,
            samples: row.get("samples")?,
        })
    }
}

fn reading(n: u32) -> Reading {
    Reading {
        sensor: format!("s-{n:04}"),
        taken_at: NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, n % 60, 0)
            .unwrap(),
        celsius: f64::from(n) / 4.0,
        flagged: n % 10 == 0,
        samples: n as i32,
    }
}

fn connect() -> Option<PgConnection> {
    dotenvy::dotenv().ok();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping postgres_live");
            return None;
        }
    };
    Some(PgConnection::connect(&database_url).unwrap())
}

#[test]
fn bulk_roundtrip() {
    let Some(mut conn) = connect() else {
        return;
    };

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before UNIX_EPOCH")
        .as_nanos();
    let table = format!("ormlite_readings_{}_{}", std::process::id(), nanos);
    conn.batch_execute(&format!(
        "CREATE TABLE {table} (
            sensor TEXT PRIMARY KEY,
            taken_at TIMESTAMP NOT NULL,
            celsius DOUBLE PRECISION NOT NULL,
            flagged BOOLEAN NOT NULL,
            samples INTEGER NOT NULL
        )"
    ))
    .unwrap();

    let mapping = Mapping::builder(&table)
        .column("sensor", "sensor")
        .column("taken_at", "taken_at")
        .column("celsius", "celsius")
        .column("flagged", "flagged")
        .column("samples", "samples")
        .primary_key("sensor")
        .build()
        .unwrap();
    let orm = OrmLite::new(MappingRegistry::new().with::<Reading>(mapping));

    let mut readings: Vec<Reading> = (0..230).map(reading).collect();
    assert_eq!(orm.insert(&mut conn, &readings).unwrap(), 230);

    let flagged: Vec<Reading> = orm
        .find_by(&mut conn, &criteria! { "flagged" => true })
        .unwrap();
    assert_eq!(flagged.len(), 23);

    readings[5].celsius = -1.5;
    readings[6].flagged = true;
    let report = orm.update(&mut conn, &readings[5..7]).unwrap();
    assert!(report.all_matched());

    let updated = orm
        .find_one_by::<Reading, _>(&mut conn, &criteria! { "sensor" => "s-0005" })
        .unwrap();
    assert_eq!(updated.as_ref(), Some(&readings[5]));

    assert_eq!(orm.delete(&mut conn, &readings[..30]).unwrap(), 30);
    assert_eq!(orm.find_all::<Reading, _>(&mut conn).unwrap().len(), 200);

    // Duplicate key in the last chunk undoes the first two.
    let retry: Vec<Reading> = (300..530).map(reading).chain([reading(300)]).collect();
    let err = orm.insert(&mut conn, &retry).unwrap_err();
    assert!(err.is_unique_violation(), "unexpected error: {err}");
    assert_eq!(orm.find_all::<Reading, _>(&mut conn).unwrap().len(), 200);

    conn.execute(&format!("DROP TABLE {table}"), &ormlite::Params::none())
        .unwrap();
}
