//! Finding the amp among connected USB devices.

use crate::error::{AmpError, TransportError};
use rusb::{Context, UsbContext};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
}

/// One scan of the bus; the scan itself belongs to the USB library
pub trait UsbBus {
    type Device;

    fn scan(&self) -> Result<Vec<(DeviceIdentity, Self::Device)>, TransportError>;
}

impl UsbBus for Context {
    type Device = rusb::Device<Context>;

    fn scan(&self) -> Result<Vec<(DeviceIdentity, Self::Device)>, TransportError> {
        let mut found = Vec::new();
        for device in self.devices()?.iter() {
            match device.device_descriptor() {
                Ok(descriptor) => {
                    let identity = DeviceIdentity {
                        vendor_id: descriptor.vendor_id(),
                        product_id: descriptor.product_id(),
                    };
                    found.push((identity, device));
                }
                Err(err) => debug!("Skipping device without descriptor: {}", err),
            }
        }
        Ok(found)
    }
}

/// Single pass, no retry. Candidates are tried in order, the first product id
/// with a connected device wins even if a later candidate was enumerated first.
pub fn locate<B: UsbBus>(
    bus: &B,
    vendor_id: u16,
    product_ids: &[u16],
) -> Result<(DeviceIdentity, B::Device), AmpError> {
    let mut devices = bus.scan()?;
    let position = product_ids.iter().find_map(|product_id| {
        devices.iter().position(|(identity, _)| {
            identity.vendor_id == vendor_id && identity.product_id == *product_id
        })
    });
    match position {
        Some(index) => Ok(devices.swap_remove(index)),
        None => Err(TransportError::DeviceNotFound {
            vendor_id,
            product_ids: product_ids.to_vec(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::fender::mustang::{PRODUCT_IDS, VENDOR_ID};

    struct FakeBus(Vec<(u16, u16, &'static str)>);

    impl UsbBus for FakeBus {
        type Device = &'static str;

        fn scan(&self) -> Result<Vec<(DeviceIdentity, Self::Device)>, TransportError> {
            Ok(self
                .0
                .iter()
                .map(|(vendor_id, product_id, name)| {
                    (DeviceIdentity { vendor_id: *vendor_id, product_id: *product_id }, *name)
                })
                .collect())
        }
    }

    #[test]
    fn should_find_mustang() {
        let bus = FakeBus(vec![(0x046d, 0xc52b, "mouse"), (VENDOR_ID, 0x0005, "mustang")]);
        let (identity, device) = locate(&bus, VENDOR_ID, PRODUCT_IDS).unwrap();
        assert_eq!(identity, DeviceIdentity { vendor_id: VENDOR_ID, product_id: 0x0005 });
        assert_eq!(device, "mustang");
    }

    #[test]
    fn should_prefer_earlier_candidate() {
        let bus = FakeBus(vec![(VENDOR_ID, 0x0014, "v2"), (VENDOR_ID, 0x0004, "v1")]);
        let (identity, device) = locate(&bus, VENDOR_ID, PRODUCT_IDS).unwrap();
        assert_eq!(identity.product_id, 0x0004);
        assert_eq!(device, "v1");
    }

    #[test]
    fn should_ignore_other_vendor_with_same_product() {
        let bus = FakeBus(vec![(0x1234, 0x0004, "impostor")]);
        assert!(matches!(
            locate(&bus, VENDOR_ID, PRODUCT_IDS),
            Err(AmpError::Transport(TransportError::DeviceNotFound { vendor_id: VENDOR_ID, .. }))
        ));
    }

    #[test]
    fn should_report_not_found_on_empty_bus() {
        let bus = FakeBus(vec![]);
        assert!(locate(&bus, VENDOR_ID, PRODUCT_IDS).is_err());
    }
}
