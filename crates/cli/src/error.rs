use leadbook_engine::EngineError;
use leadbook_storage::StorageError;

/// Errors surfaced by `leadbook` subcommands.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}
