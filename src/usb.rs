//! Finding an FT232R and the `nusb`-backed [`Transport`].
//!
//! [`find_devices`] lists every device with a given VID/PID.
//! [`find_device`] narrows that list with a [`DeviceFilter`] (product string,
//! serial number, position) using the strings the OS already cached at
//! enumeration, so no candidate is opened just to be compared.
//! [`UsbTransport`] then opens the chosen device, detaches the kernel serial
//! driver, and carries the control transfers.

use std::time::Duration;

use nusb::transfer::{ControlIn, ControlOut, ControlType, Recipient, TransferError};
use nusb::{self, DeviceInfo, MaybeFuture};

use crate::constants::*;
use crate::error::{Error, Result};
use crate::gpio::CbusGpio;
use crate::transport::Transport;

/// FT232R has a single interface.
const INTERFACE_NUM: u8 = 0;

/// Which FT232R to open.
///
/// The default selects the first device with FTDI's stock FT232R IDs.
/// Boards with a custom PID, or several adapters on one host, narrow it
/// down with the builder methods.
///
/// # Example
///
/// ```no_run
/// use ftdi_cbus::{CbusGpio, DeviceFilter};
///
/// let gpio = CbusGpio::open(&DeviceFilter::default().serial("A50285BI"))?;
/// # Ok::<(), ftdi_cbus::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DeviceFilter {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Exact USB product string, e.g. `"FT232R USB UART"`.
    pub description: Option<String>,
    /// Exact USB serial number string.
    pub serial: Option<String>,
    /// Position among the devices that pass every other check.
    pub index: usize,
}

impl Default for DeviceFilter {
    fn default() -> Self {
        Self::new(FTDI_VID, pid::FT232)
    }
}

impl DeviceFilter {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
            description: None,
            serial: None,
            index: 0,
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    fn matches_ids(&self, vendor: u16, product: u16) -> bool {
        vendor == self.vendor_id && product == self.product_id
    }

    /// An unset criterion accepts anything; a set one needs an exact match,
    /// so a device that reports no string never matches it.
    fn matches_strings(&self, product: Option<&str>, serial: Option<&str>) -> bool {
        let accepts = |wanted: &Option<String>, got: Option<&str>| match wanted {
            Some(wanted) => got == Some(wanted.as_str()),
            None => true,
        };
        accepts(&self.description, product) && accepts(&self.serial, serial)
    }

    fn matches(&self, dev: &DeviceInfo) -> bool {
        self.matches_ids(dev.vendor_id(), dev.product_id())
            && self.matches_strings(dev.product_string(), dev.serial_number())
    }
}

/// List all connected devices with the given vendor and product IDs.
///
/// # Example
///
/// ```no_run
/// use ftdi_cbus::{find_devices, constants::{pid, FTDI_VID}};
///
/// for dev in find_devices(FTDI_VID, pid::FT232)? {
///     println!("{:?} serial {:?}", dev.product_string(), dev.serial_number());
/// }
/// # Ok::<(), ftdi_cbus::Error>(())
/// ```
pub fn find_devices(vendor: u16, product: u16) -> Result<Vec<DeviceInfo>> {
    let filter = DeviceFilter::new(vendor, product);
    Ok(nusb::list_devices()
        .wait()?
        .filter(|dev| filter.matches_ids(dev.vendor_id(), dev.product_id()))
        .collect())
}

/// Select the device described by `filter`.
///
/// Returns [`Error::DeviceNotFound`] when fewer than `filter.index + 1`
/// devices match.
pub fn find_device(filter: &DeviceFilter) -> Result<DeviceInfo> {
    let found = nusb::list_devices()
        .wait()?
        .filter(|dev| filter.matches(dev))
        .nth(filter.index);

    match found {
        Some(dev) => {
            log::debug!(
                "selected {:04x}:{:04x} serial {:?}",
                dev.vendor_id(),
                dev.product_id(),
                dev.serial_number()
            );
            Ok(dev)
        }
        None => Err(Error::DeviceNotFound),
    }
}

/// An opened FT232R, carrying vendor control transfers over `nusb`.
///
/// Transfers block for at most [`timeout`](Self::timeout) (5 s by
/// default); an expired transfer is reported as [`Error::Timeout`].
pub struct UsbTransport {
    #[allow(dead_code)] // Kept to ensure the USB device stays open
    device: nusb::Device,
    interface: nusb::Interface,
    timeout: Duration,
}

impl std::fmt::Debug for UsbTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsbTransport")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl UsbTransport {
    /// Open the first device matching the given vendor and product IDs.
    pub fn open(vendor: u16, product: u16) -> Result<Self> {
        Self::open_with_filter(&DeviceFilter::new(vendor, product))
    }

    /// Open a device from a [`DeviceFilter`].
    pub fn open_with_filter(filter: &DeviceFilter) -> Result<Self> {
        let dev_info = find_device(filter)?;
        Self::from_device_info(dev_info)
    }

    /// Open a device from an already-discovered [`nusb::DeviceInfo`].
    ///
    /// Fails with [`Error::UnsupportedChip`] unless the device reports the
    /// FT232R's bcdDevice.
    pub fn from_device_info(dev_info: DeviceInfo) -> Result<Self> {
        let device = dev_info.open().wait()?;

        let bcd_device = device.device_descriptor().device_version();
        if bcd_device != FT232R_BCD_DEVICE {
            return Err(Error::UnsupportedChip { bcd_device });
        }

        // Detach kernel driver and claim interface
        let interface = device.detach_and_claim_interface(INTERFACE_NUM).wait()?;

        Ok(Self {
            device,
            interface,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set the timeout for control transfers.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Get the current control transfer timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// nusb cancels a control transfer when its timeout expires.
fn map_transfer_error(err: TransferError) -> Error {
    match err {
        TransferError::Cancelled => Error::Timeout,
        other => Error::Transfer(other),
    }
}

impl Transport for UsbTransport {
    fn control_in(&mut self, request: u8, value: u16, index: u16, length: u16) -> Result<Vec<u8>> {
        self.interface
            .control_in(
                ControlIn {
                    control_type: ControlType::Vendor,
                    recipient: Recipient::Device,
                    request,
                    value,
                    index,
                    length,
                },
                self.timeout,
            )
            .wait()
            .map_err(map_transfer_error)
    }

    fn control_out(&mut self, request: u8, value: u16, index: u16) -> Result<()> {
        self.interface
            .control_out(
                ControlOut {
                    control_type: ControlType::Vendor,
                    recipient: Recipient::Device,
                    request,
                    value,
                    index,
                    data: &[],
                },
                self.timeout,
            )
            .wait()
            .map_err(map_transfer_error)
    }
}

impl CbusGpio<UsbTransport> {
    /// Open the device selected by `filter` and attach to it.
    pub fn open(filter: &DeviceFilter) -> Result<Self> {
        let transport = UsbTransport::open_with_filter(filter)?;
        Self::attach(transport, INTERFACE_NUM as u16)
    }
}
