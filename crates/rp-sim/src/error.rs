use rp_core::{CoreError, EntityId};
use rp_data::DataError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("replay configuration error: {0}")]
    Core(#[from] CoreError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("no manifest loaded; call `load_data` first")]
    NotLoaded,

    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
}

pub type SimResult<T> = Result<T, SimError>;
