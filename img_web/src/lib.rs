pub mod conversion_api;
pub mod converter;
pub mod encoder;
pub mod error;
pub mod formats;
pub mod scheduler;

pub use conversion_api::{
    plan_job, required_targets, ConversionJob, EncodeStrategy, InputFile, PlannedTarget,
    TargetAction,
};
pub use converter::{
    convert_file, process_file, ConvertOptions, FileOutcome, FileResult, TargetFailure,
};
pub use encoder::{EncoderBackend, ExternalEncoder};
pub use error::{ConvertError, Result};
pub use formats::TargetFormat;
pub use scheduler::{run_batch, BatchConfig, BatchRun};
