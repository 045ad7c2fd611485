//! The persisted model artefact: not classifier weights, but the
//! (kind, tuned options) pair needed to rebuild and retrain the winner on
//! demand (§3.1: `<PROJECT>_best.model` "carries classifier type and tuned
//! options"). The orchestrator retrains from this descriptor rather than
//! deserializing weights, and the what-if simulator does the same (§4.12
//! step 1: "re-apply the tuned options, re-train").

use bincode::config;

use crate::classifier::kind::ClassifierKind;
use crate::error::{ModelError, ModelResult};

#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub struct TrainedModelDescriptor {
    pub kind: ClassifierKind,
    pub options: String,
}

impl TrainedModelDescriptor {
    pub fn new(kind: ClassifierKind, options: impl Into<String>) -> Self {
        Self {
            kind,
            options: options.into(),
        }
    }

    pub fn to_bytes(&self) -> ModelResult<Vec<u8>> {
        bincode::encode_to_vec(self, config::standard()).map_err(|e| ModelError::Codec(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> ModelResult<Self> {
        bincode::decode_from_slice(bytes, config::standard())
            .map(|(value, _)| value)
            .map_err(|_| ModelError::corrupt_model("model blob does not match the expected descriptor layout"))
    }

    /// Rebuild an untrained classifier from this descriptor's kind and options.
    pub fn build(&self) -> ModelResult<Box<dyn crate::classifier::Classifier>> {
        crate::classifier::kind::build_with_options(self.kind, &self.options)
    }
}
