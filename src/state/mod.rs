/// State management module
///
/// This module handles the pottery record itself:
/// - The unit of work over the store, items and stage logs (library.rs)
/// - Shared data structures (data.rs)
/// - Stage and piece-type enums (stage.rs)
/// - The settings singleton (settings.rs)
/// - Kiln loads and batch firing (kiln.rs)
/// - Autocomplete from existing values (suggest.rs)

pub mod data;
pub mod kiln;
pub mod library;
pub mod settings;
pub mod stage;
pub mod suggest;
