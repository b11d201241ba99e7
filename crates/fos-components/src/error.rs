//! Component errors

use fos_dom::CustomElementError;

/// Errors raised while defining or setting up components
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComponentError {
    /// A hook was registered after its factory returned
    #[error("{hook} must be called inside a component")]
    OutsideSetup { hook: &'static str },

    /// The host registry rejected the tag
    #[error("cannot define <{tag}>: {source}")]
    Registry {
        tag: String,
        #[source]
        source: CustomElementError,
    },
}
