//! Reset the super-admin's password directly in the database, for when it
//! has been lost. Reads `db_uri` and `super_admin` from the same config as
//! the server.

use std::io::BufRead;

use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{error, info};
use thiserror::Error;

use evote_backend::{
    config::DATABASE_NAME,
    error::Error as BackendError,
    model::{db::user::User, mongodb::Coll},
};

const PROGRAM_NAME: &str = "reset-admin-password";

const ABOUT_TEXT: &str = "Reset the super-admin's password.

The new password is taken from --password, then the NEW_ADMIN_PASSWORD
environment variable, then the first line of standard input.";

const PASSWORD: &str = "PASSWORD";

const PASSWORD_ENV: &str = "NEW_ADMIN_PASSWORD";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME).about(ABOUT_TEXT).arg(
        Arg::new(PASSWORD)
            .long("password")
            .help("The new password")
            .action(ArgAction::Set),
    )
}

/// Errors that this program may produce.
#[derive(Debug, Error)]
enum Error {
    #[error("Failed to read config: {0}")]
    Config(String),
    #[error("Failed to read password: {0}")]
    Io(#[from] std::io::Error),
    #[error("No password given")]
    NoPassword,
    #[error("Failed to connect to database: {0}")]
    Connect(#[from] mongodb::error::Error),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Pick the new password from the first source that provides one.
fn choose_password(
    flag: Option<String>,
    env: Option<String>,
    stdin: impl BufRead,
) -> Result<String, Error> {
    let given = |p: &String| !p.is_empty();
    if let Some(password) = flag.filter(given).or_else(|| env.filter(given)) {
        return Ok(password);
    }
    let line = stdin.lines().next().transpose()?.unwrap_or_default();
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        Err(Error::NoPassword)
    } else {
        Ok(password)
    }
}

async fn run(args: &ArgMatches) -> Result<(), Error> {
    let figment = rocket::Config::figment();
    let db_uri: String = figment
        .extract_inner("db_uri")
        .map_err(|e| Error::Config(e.to_string()))?;
    let super_admin: String = figment
        .extract_inner("super_admin")
        .map_err(|e| Error::Config(e.to_string()))?;

    let password = choose_password(
        args.get_one::<String>(PASSWORD).cloned(),
        std::env::var(PASSWORD_ENV).ok(),
        std::io::stdin().lock(),
    )?;

    let client = mongodb::Client::with_uri_str(db_uri).await?;
    let users = Coll::<User>::from_db(&client.database(DATABASE_NAME));
    match User::reset_password(&users, &super_admin, &password).await {
        Ok(()) => {
            info!("Password reset for {super_admin}");
            Ok(())
        }
        Err(e @ BackendError::NotFound(_)) => {
            error!("{super_admin} has not registered yet, register them through the API first");
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

#[rocket::main]
async fn main() {
    if let Err(e) = log4rs::init_file("log4rs.yaml", log4rs_dynamic_filters::default_deserializers())
    {
        eprintln!("Failed to initialise logging: {e}");
    }

    let args = cli().get_matches();
    if let Err(err) = run(&args).await {
        error!("{err}");
        std::process::exit(1)
    }
}
