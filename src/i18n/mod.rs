//! Display languages and everything keyed by them.
//!
//! - `registry`: the supported languages and their metadata
//! - `language`: validated `Language` handle, the key of every cache
//! - `ui_text`: translated UI strings with reverse lookup
//! - `validator`: translation drift checks (brand, glyphs, figures)
//! - `metrics`: cache and gateway counters

mod language;
mod metrics;
mod registry;
mod ui_text;
mod validator;

pub use language::Language;
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguageConfig, LanguageRegistry};
pub use ui_text::UiTextSet;
pub use validator::{TranslationValidator, ValidationReport};
