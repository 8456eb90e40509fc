use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("no AlphaSmart Neo device found")]
    DeviceNotFound,
    #[error("more than one AlphaSmart Neo device is connected")]
    MultipleDevicesFound,
    #[error("USB transfer failed: {0}")]
    Usb(#[from] rusb::Error),
    #[error("cannot find a bulk {direction} endpoint on the device's comms interface")]
    EndpointNotFound { direction: &'static str },
    #[error("device did not re-enumerate as a comms-mode device within the expected time")]
    ReenumerationTimedOut,
}
