use std::time::Duration;

use rusb::{Device, DeviceHandle, Direction, GlobalContext, TransferType};
use tracing::{debug, info};

use crate::constants::*;
use crate::Error;

/// The chunked bulk-transfer surface `neotools-dialogue` builds the ASM
/// message format on top of. Exists as a trait, not just inherent methods
/// on [`Transport`], so the dialogue layer can be exercised in tests
/// against a mock without a physical device attached.
pub trait RawIo {
    fn read(&self, length: usize, timeout: Duration) -> Result<Vec<u8>, Error>;
    fn write(&self, data: &[u8], timeout: Duration) -> Result<(), Error>;
}

/// An open USB connection to a single AlphaSmart Neo, already in comms mode
/// and with bulk IN/OUT endpoints bound.
///
/// This is the lowest layer: it knows how to move bytes across the bus and
/// how to flip the device's USB personality. It does not speak the ASM
/// message format; that's `neotools-dialogue`'s job.
pub struct Transport {
    handle: DeviceHandle<GlobalContext>,
    in_endpoint: u8,
    out_endpoint: u8,
    kernel_driver_detached: bool,
    original_product_id: u16,
    flipped_to_comms: bool,
}

impl Transport {
    /// Finds the single attached Neo, optionally flips it into comms mode,
    /// and binds its bulk endpoints.
    pub fn connect(flip_to_comms: bool) -> Result<Self, Error> {
        let device = Self::find()?;
        let original_product_id = device.device_descriptor()?.product_id();
        let mut handle = device.open()?;

        let mut kernel_driver_detached = false;
        let mut flipped_to_comms = false;
        if flip_to_comms && original_product_id == HID_PRODUCT_ID {
            if handle.kernel_driver_active(0).unwrap_or(false) {
                debug!("detaching kernel driver");
                handle.detach_kernel_driver(0)?;
                kernel_driver_detached = true;
            }
            flip_to_comms_mode(&mut handle)?;
            drop(handle);
            handle = Self::wait_for_comms_device()?;
            flipped_to_comms = true;
        }

        let (in_endpoint, out_endpoint) = bind_bulk_endpoints(&handle)?;

        Ok(Transport {
            handle,
            in_endpoint,
            out_endpoint,
            kernel_driver_detached,
            original_product_id,
            flipped_to_comms,
        })
    }

    fn find() -> Result<Device<GlobalContext>, Error> {
        info!("searching for device");
        let matches: Vec<_> = rusb::devices()?
            .iter()
            .filter(|dev| {
                dev.device_descriptor()
                    .map(|desc| desc.vendor_id() == VENDOR_ID)
                    .unwrap_or(false)
            })
            .collect();
        match matches.len() {
            0 => Err(Error::DeviceNotFound),
            1 => Ok(matches.into_iter().next().unwrap()),
            _ => Err(Error::MultipleDevicesFound),
        }
    }

    fn wait_for_comms_device() -> Result<DeviceHandle<GlobalContext>, Error> {
        info!("connecting to Neo in communication mode");
        for _ in 0..REENUMERATE_MAX_ATTEMPTS {
            std::thread::sleep(REENUMERATE_POLL_INTERVAL);
            if let Ok(handle) = rusb::open_device_with_vid_pid(VENDOR_ID, COM_PRODUCT_ID)
                .ok_or(rusb::Error::NoDevice)
            {
                return Ok(handle);
            }
        }
        Err(Error::ReenumerationTimedOut)
    }

    /// The product ID the device presented when first opened, before any
    /// mode flip; `HID_PRODUCT_ID` or `COM_PRODUCT_ID`.
    pub fn original_product_id(&self) -> u16 {
        self.original_product_id
    }

    /// Whether this session actually flipped a HID-mode Neo into comms mode
    /// (as opposed to finding it already in comms mode, or being asked not
    /// to flip at all).
    pub fn flipped_to_comms(&self) -> bool {
        self.flipped_to_comms
    }

    /// Flips a device that started out as comms-mode-by-user-request back to
    /// keyboard mode by issuing the restart request. Transport-layer callers
    /// only trigger the physical re-flip; `neotools-dialogue` is responsible
    /// for sending the ASM restart message beforehand.
    pub fn dispose(self) {
        if self.kernel_driver_detached {
            debug!("leaving kernel driver detached after dispose");
        }
    }
}

impl RawIo for Transport {
    /// Reads exactly `length` bytes in 8-byte bulk chunks, stopping early on
    /// a short chunk as the device does when it has nothing more to send.
    fn read(&self, length: usize, timeout: Duration) -> Result<Vec<u8>, Error> {
        let mut result = Vec::with_capacity(length);
        let mut remaining = length;
        while remaining > 0 {
            let chunk_len = remaining.min(BULK_CHUNK_SIZE);
            let mut chunk = vec![0u8; chunk_len];
            let n = self.handle.read_bulk(self.in_endpoint, &mut chunk, timeout)?;
            result.extend_from_slice(&chunk[..n]);
            remaining -= n;
            if n != BULK_CHUNK_SIZE {
                break;
            }
        }
        Ok(result)
    }

    /// Writes `data` in 8-byte bulk chunks.
    fn write(&self, data: &[u8], timeout: Duration) -> Result<(), Error> {
        let mut offset = 0;
        while offset != data.len() {
            let chunk_len = (data.len() - offset).min(BULK_CHUNK_SIZE);
            self.handle
                .write_bulk(self.out_endpoint, &data[offset..offset + chunk_len], timeout)?;
            offset += chunk_len;
        }
        Ok(())
    }
}

fn flip_to_comms_mode(handle: &mut DeviceHandle<GlobalContext>) -> Result<(), Error> {
    info!("switching Neo to communication mode");
    handle.set_active_configuration(1).or_else(|err| match err {
        rusb::Error::Busy => Ok(()),
        other => Err(other),
    })?;
    let request_type = rusb::request_type(
        rusb::Direction::Out,
        rusb::RequestType::Class,
        rusb::Recipient::Device,
    );
    for &report in COMMS_MODE_FLIP_REPORTS.iter() {
        handle.write_control(
            request_type,
            9, // SET_CONFIGURATION
            (0x02 << 8) | 0,
            1,
            &[report],
            DEFAULT_TIMEOUT,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_match_known_device_ids() {
        assert_eq!(VENDOR_ID, 0x081e);
        assert_eq!(HID_PRODUCT_ID, 0xbd04);
        assert_eq!(COM_PRODUCT_ID, 0xbd01);
    }

    #[test]
    fn comms_mode_flip_sequence_is_five_reports_in_order() {
        assert_eq!(COMMS_MODE_FLIP_REPORTS, [0xe0, 0xe1, 0xe2, 0xe3, 0xe4]);
    }
}

fn bind_bulk_endpoints(handle: &DeviceHandle<GlobalContext>) -> Result<(u8, u8), Error> {
    let device = handle.device();
    let config = device.active_config_descriptor()?;
    let mut in_endpoint = None;
    let mut out_endpoint = None;
    for interface in config.interfaces() {
        for descriptor in interface.descriptors() {
            for endpoint in descriptor.endpoint_descriptors() {
                if endpoint.transfer_type() != TransferType::Bulk {
                    continue;
                }
                match endpoint.direction() {
                    Direction::In => in_endpoint.get_or_insert(endpoint.address()),
                    Direction::Out => out_endpoint.get_or_insert(endpoint.address()),
                };
            }
        }
    }
    Ok((
        in_endpoint.ok_or(Error::EndpointNotFound { direction: "in" })?,
        out_endpoint.ok_or(Error::EndpointNotFound { direction: "out" })?,
    ))
}
