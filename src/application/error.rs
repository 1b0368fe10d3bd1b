use thiserror::Error;

use crate::domain::{PeriodError, RecognitionError, YearMonth};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    #[error("User {0} is not connected to a partner")]
    CoupleRequired(String),

    #[error("User {0} is already connected to a partner")]
    AlreadyInCouple(String),

    #[error("User {0} cannot be paired with themself")]
    SelfPairing(String),

    #[error("No record for {user} in {period}")]
    RecordNotFound { user: String, period: YearMonth },

    #[error("Invalid period: {0}")]
    InvalidPeriod(#[from] PeriodError),

    #[error("Recognition failed: {0}")]
    Recognition(#[from] RecognitionError),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
