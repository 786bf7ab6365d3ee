use thiserror::Error;

#[derive(Error, Debug)]
pub enum BooksError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Invalid scheduled transaction: {0}")]
    InvalidScheduledTransaction(String),

    #[error("Invalid budget: {0}")]
    InvalidBudget(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid storage file: {0}")]
    InvalidStorageFile(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BooksError>;
