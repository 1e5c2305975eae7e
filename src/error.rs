use derive_more::{Display, Error};

/// What went wrong, carried as the context of every `Report<ErrorKind>`.
///
/// Transport failures keep the underlying `reqwest` error as a child report,
/// so the variants themselves only hold what is needed to tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ErrorKind {
    #[display("missing environment variables: {}", missing.join(", "))]
    Config { missing: Vec<String> },
    #[display("network error")]
    Network,
    #[display("upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[display("could not decode response body")]
    Decode,
    #[display("zone '{zone}' not found")]
    NotFound { zone: String },
}
