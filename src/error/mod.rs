mod catalog;
mod io;
mod overrides;
mod scan;

pub use catalog::CatalogError;
pub use io::IoError;
pub use overrides::OverrideError;
pub use scan::ScanError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Override(#[from] OverrideError),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

pub type Result<T> = std::result::Result<T, Error>;
