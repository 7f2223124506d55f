use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("rpc error: {0}")]
    Rpc(String),
}
