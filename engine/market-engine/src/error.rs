use order_book::BookConfigError;
use thiserror::Error;

use crate::config::EngineConfigError;

/// Construction-time failures. Runtime rejections are structured results on
/// the trading API, never errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine config: {0}")]
    Config(#[from] EngineConfigError),

    #[error("book config: {0}")]
    Book(#[from] BookConfigError),
}
