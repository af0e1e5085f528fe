pub mod api;
pub mod flows;
pub mod gateway;
pub mod identity;
pub mod notice;
pub mod settings;
pub mod shell;

pub use flows::{CaseForm, FlowError, HistoryFlow, SubmissionFlow, SubmissionState};
pub use gateway::{Endpoint, Gateway, HttpGateway};
pub use identity::{FileIdentityStore, IdentityProvider, IdentityStore, MemoryIdentityStore};
pub use notice::{Notice, NoticeLevel};
pub use settings::{load_settings, ClientSettings};
pub use shell::{MountedFlow, NavigationError, Route, SettingsView, Shell};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
