use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use claybook::schema::Entity;
use claybook::{open_store, Store, StoreConfig, StoreError, StoreState};

fn setup_logging() {
    // Set up subscriber with env filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}

/// Open (or recover) the store, make sure settings exist, report what is there
fn main() -> ExitCode {
    setup_logging();

    let config = match StoreConfig::default_location() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "cannot locate the store");
            return ExitCode::FAILURE;
        }
    };

    // Recovery runs before anything else may touch the store
    let store = match open_store(&config) {
        StoreState::Healthy(store) => store,
        StoreState::RecoveredFromBackup { store, backup, cause } => {
            warn!(
                backup_dir = %backup.backup_dir.display(),
                backed_up = backup.backed_up.len(),
                skipped = backup.skipped.len(),
                cause = %cause,
                "your previous records could not be opened; they were backed up and \
                 Claybook started with an empty library"
            );
            store
        }
        StoreState::Failed(err) => {
            error!(
                error = %err,
                path = %config.store_path().display(),
                "no usable store, giving up"
            );
            return ExitCode::FAILURE;
        }
    };

    match report(&store) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "startup failed");
            ExitCode::FAILURE
        }
    }
}

fn report(store: &Store) -> Result<(), StoreError> {
    let mut library = store.library()?;
    let settings = library.fetch_or_create_settings()?;
    library.save()?;

    let pieces = library.count(Entity::Item)?;
    let loads = library.count(Entity::KilnLoad)?;
    info!(
        path = %store.path().display(),
        schema_version = store.schema_version(),
        pieces,
        kiln_loads = loads,
        units = settings.measurement_unit.abbreviation(),
        weekend_reminder = settings.weekend_reminder_enabled,
        "claybook ready"
    );
    Ok(())
}
