//! Keeps canonical records, their translations and what is on screen in step.

mod cache;
mod chat;
mod selection;
mod slot;

pub use cache::LanguageCache;
pub use chat::{ChatCommit, ChatJob, ChatState, ChatView};
pub use selection::{Selection, SelectionUpdate};
pub use slot::{
    CommitOutcome, FetchOutcome, FetchTicket, Landing, Phase, Plan, ProductSlot, ProductView,
    Ready, TranslationJob, Waiter,
};
