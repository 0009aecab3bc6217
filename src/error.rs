use thiserror::Error;

/// Failure talking to the blockchain RPC provider (transport, node error or timeout).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Blockchain RPC error: {0}")]
pub struct ProviderError(pub String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Empty address input")]
    EmptyInput,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Name not found: {0}")]
    NameNotFound(String),

    #[error(transparent)]
    ProviderError(#[from] ProviderError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Key-value store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Key-value store returned an error: {0}")]
    Remote(String),

    #[error("Stored record is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),

    #[error("Telegram request timed out")]
    Timeout,
}

/// Everything that can stop a command from producing its normal reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Command not recognised")]
    UnknownCommand,

    #[error("No address given and no stored address for this user")]
    NoAddress,

    #[error("Name not found: {0}")]
    NameNotFound(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Key-value store failure: {0}")]
    Store(String),
}

impl CommandError {
    /// Short text sent back to the chat.
    pub fn user_message(&self) -> &'static str {
        match self {
            CommandError::InvalidInput(_) => "Address not understood",
            CommandError::UnknownCommand => "Command not understood",
            CommandError::NoAddress => {
                "No address given. Pass an address or name, or use /generate first"
            }
            CommandError::NameNotFound(_) => "Invalid Ethereum address",
            CommandError::Provider(_) => "Error fetching balance",
            CommandError::Store(_) => "Error accessing stored key pair",
        }
    }
}

impl From<ResolutionError> for CommandError {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::EmptyInput => CommandError::InvalidInput(String::new()),
            ResolutionError::InvalidAddress(input) => CommandError::InvalidInput(input),
            ResolutionError::NameNotFound(name) => CommandError::NameNotFound(name),
            ResolutionError::ProviderError(e) => CommandError::Provider(e),
        }
    }
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        CommandError::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_errors_map_to_command_errors() {
        assert_eq!(
            CommandError::from(ResolutionError::EmptyInput),
            CommandError::InvalidInput(String::new())
        );
        assert_eq!(
            CommandError::from(ResolutionError::NameNotFound("x.eth".into())),
            CommandError::NameNotFound("x.eth".into())
        );
        let provider = ProviderError("connection refused".into());
        assert_eq!(
            CommandError::from(ResolutionError::from(provider.clone())),
            CommandError::Provider(provider)
        );
    }

    #[test]
    fn test_name_miss_and_provider_failure_read_differently() {
        let miss = CommandError::NameNotFound("x.eth".into()).user_message();
        let down = CommandError::Provider(ProviderError("timeout".into())).user_message();
        assert_ne!(miss, down);
    }

    #[test]
    fn test_store_error_converts_with_message() {
        let err = CommandError::from(StoreError::Remote("WRONGPASS".into()));
        assert!(matches!(err, CommandError::Store(ref msg) if msg.contains("WRONGPASS")));
    }
}
