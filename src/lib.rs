/// Claybook persistence core
///
/// - schema: frozen layouts of every shipped store version and the
///   pipeline that migrates between them
/// - store: locating, opening and recovering the store at startup
/// - state: the entity graph and the unit of work that reads and writes it
///
/// Startup goes through `store::recovery::open_store`, which yields the one
/// `Store` handle every other component receives.

pub mod schema;
pub mod state;
pub mod store;

pub use state::data::{ColorEntry, GlazeEntry, Item, KilnLoad, Photo, StageLog};
pub use state::library::{ItemFilter, Library};
pub use state::settings::{AppearanceMode, MeasurementUnit, UserSettings, ViewMode};
pub use state::stage::{ItemType, StageType};
pub use store::config::StoreConfig;
pub use store::recovery::{open_store, StoreState};
pub use store::{Store, StoreError};
