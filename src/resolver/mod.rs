//! QR resolution and redirect dispatch

pub mod dispatcher;
pub mod engine;
pub mod navigator;
pub mod outcome;
pub mod selector;

pub use dispatcher::{ActionDispatcher, ActionKind};
pub use engine::{RedirectResolver, ResolveError};
pub use navigator::Navigator;
pub use outcome::{
    normalize_url, DownloadFile, FailureKind, ImmediateAction, ImmediateKind, ResolutionOutcome,
    TapOutcome,
};
pub use selector::MultiUrlSelector;
