use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum DispenseError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("command channel closed")]
    ChannelClosed,
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing pumps")]
    MissingPumps,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

/// Map any error coming out of a pump or command source to a typed
/// `DispenseError`, with special handling for known hardware errors.
pub(crate) fn map_hw_error_dyn(e: &(dyn std::error::Error + 'static)) -> DispenseError {
    #[cfg(feature = "hardware-errors")]
    if let Some(hw) = e.downcast_ref::<refresher_hardware::error::HwError>() {
        use refresher_hardware::error::HwError;
        return match hw {
            HwError::InputClosed => DispenseError::ChannelClosed,
            other => DispenseError::HardwareFault(other.to_string()),
        };
    }
    DispenseError::Hardware(e.to_string())
}
