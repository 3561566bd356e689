//! Everything needed to turn a planned [`crate::job::CompilationJob`] into a running `solc`
//! process: acquiring the right binary and driving it with Standard JSON.

pub mod solc;

pub use solc::Solc;
#[cfg(feature = "svm-solc")]
pub use solc::{acquire, AcquisitionError, SolcBuild};
