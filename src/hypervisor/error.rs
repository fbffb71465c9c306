/// Errors surfaced by the hypervisor client.
///
/// The daemon reports failures as free-form messages, so errors carry the
/// failed call for context rather than trying to re-classify them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to connect to hypervisor at `{uri}`: {detail}")]
    Connect { uri: String, detail: String },

    #[error("hypervisor call `{call}` failed: {detail}")]
    Api { call: &'static str, detail: String },
}

impl Error {
    pub fn connect(uri: impl Into<String>, detail: impl ToString) -> Self {
        Self::Connect {
            uri: uri.into(),
            detail: detail.to_string(),
        }
    }

    pub fn api(call: &'static str, detail: impl ToString) -> Self {
        Self::Api {
            call,
            detail: detail.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
