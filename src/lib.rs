#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{AwsFairing, ConfigFairing, DatabaseFairing};
use crate::logging::LoggerFairing;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod notification;

pub use config::Config;

/// Assemble the server: routes, catchers, and the fairings that load
/// configuration and connect to the database and notification services.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .register("/", api::catchers())
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .attach(AwsFairing)
}

/// Connect to the database named by the `db_uri` config key (test version).
#[cfg(test)]
async fn db_client() -> mongodb::Client {
    let db_uri = rocket::Config::figment()
        .extract_inner::<String>("db_uri")
        .expect("`db_uri` not set");
    mongodb::Client::with_uri_str(&db_uri)
        .await
        .expect("failed to connect to test database")
}

/// Name of a fresh database for a single test.
#[cfg(test)]
fn database() -> String {
    config::get_database_name()
}

/// Build a server that uses the given pre-connected database instead of
/// [`DatabaseFairing`], so that tests can inspect the same database.
#[cfg(test)]
async fn rocket_for_db(db_client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    use crate::model::mongodb::{ensure_counters_exist, ensure_indexes_exist, Coll};

    let db = db_client.database(db_name);
    ensure_indexes_exist(&db).await.unwrap();
    ensure_counters_exist(&Coll::from_db(&db)).await.unwrap();

    rocket::build()
        .mount("/", api::routes())
        .register("/", api::catchers())
        .attach(ConfigFairing)
        .attach(AwsFairing)
        .manage(db_client)
        .manage(db)
}
