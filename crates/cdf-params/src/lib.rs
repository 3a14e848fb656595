//! Parameter-file layer: sectioned key-value configs, munger configuration,
//! results descriptors, and the jurisdiction dictionary.

pub mod descriptor;
pub mod dictionary;
pub mod munger;
pub mod sections;

pub use descriptor::ResultsDescriptor;
pub use dictionary::Dictionary;
pub use munger::{LookupSpec, MungerConfig};
pub use sections::{ParamFile, ParamType, ParamValue, SectionReader};
