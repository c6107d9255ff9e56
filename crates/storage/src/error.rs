/// All errors that can be returned by a DraftStorage implementation.
///
/// The draft service deliberately keeps a single coarse variant: the service
/// boundary reports every storage fault as one generic failure and absence
/// of a draft is not an error at all (`load_draft` returns `Ok(None)`).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A backend-specific storage error (DB connection, serialization, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
