//! OBS data transfer.
//!
//! The sink ([`ObsDataSink`]) uploads each [`Part`] as one object through a
//! multipart upload, cutting the stream into fixed-size chunks. The source
//! ([`ObsDataSource`]) lists a bucket prefix and hands out lazily opened
//! [`ObsPart`]s. The factories build either side from a [`DataAddress`],
//! resolving the temporary credential named by its `keyName`.
//!
//! [`DataAddress`]: edc_hw_core::DataAddress

mod error;
mod factory;
mod part;
mod sink;
mod source;
mod validator;

pub use error::{StreamResult, TransferError};
pub use factory::{ObsDataSinkFactory, ObsDataSourceFactory};
pub use part::{BytesPart, FilePart, Part};
pub use sink::{ObsDataSink, TransferSummary, UploadSession, UploadedObject};
pub use source::{ObsDataSource, ObsPart};
pub use validator::{ObsDataAddressValidator, ValidationResult};
