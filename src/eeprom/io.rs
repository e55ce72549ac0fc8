//! Reading the physical EEPROM over control transfers.

use crate::constants::*;
use crate::error::{Error, Result};
use crate::transport::Transport;

use super::EepromImage;

/// Read the entire EEPROM from the device.
///
/// Performs 128 USB control transfers (2 bytes each, addressed by word
/// index) to assemble the full 256-byte image. Any failed or short
/// transfer aborts the read with [`Error::EepromReadFailed`]; a partial
/// image is never returned.
pub fn read_eeprom<T: Transport + ?Sized>(transport: &mut T) -> Result<EepromImage> {
    let mut buf = [0u8; FTDI_MAX_EEPROM_SIZE];

    for (word, chunk) in buf.chunks_exact_mut(2).enumerate() {
        let word = word as u16;
        let data = transport
            .control_in(SIO_READ_EEPROM_REQUEST, 0, word, 2)
            .and_then(|data| match data.len() {
                2 => Ok(data),
                actual => Err(Error::ShortTransfer {
                    expected: 2,
                    actual,
                }),
            })
            .map_err(|source| {
                log::warn!("error reading EEPROM word {word:#04x}: {source}");
                Error::EepromReadFailed {
                    word,
                    source: Box::new(source),
                }
            })?;
        chunk.copy_from_slice(&data);
    }

    Ok(EepromImage::from_array(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::{FakeTransport, Request};

    fn counting_image() -> Vec<u8> {
        (0..FTDI_MAX_EEPROM_SIZE).map(|i| i as u8).collect()
    }

    #[test]
    fn reads_all_words_in_order() {
        let mut fake = FakeTransport::with_eeprom(&counting_image());
        let image = read_eeprom(&mut fake).unwrap();

        assert_eq!(image.as_bytes().to_vec(), counting_image());
        assert_eq!(fake.requests.len(), FTDI_MAX_EEPROM_SIZE / 2);
        for (i, req) in fake.requests.iter().enumerate() {
            assert_eq!(
                *req,
                Request::In {
                    request: 0x90,
                    value: 0,
                    index: i as u16,
                    length: 2,
                }
            );
        }
    }

    #[test]
    fn short_transfer_aborts() {
        let mut fake = FakeTransport::with_eeprom(&counting_image());
        fake.short_eeprom_at = Some(0x20);

        let err = read_eeprom(&mut fake).unwrap_err();
        match err {
            Error::EepromReadFailed { word, source } => {
                assert_eq!(word, 0x20);
                assert!(matches!(
                    *source,
                    Error::ShortTransfer {
                        expected: 2,
                        actual: 1
                    }
                ));
            }
            other => panic!("expected EepromReadFailed, got {:?}", other),
        }
        // No retries and nothing after the failing word.
        assert_eq!(fake.requests.len(), 0x21);
    }

    #[test]
    fn transport_error_aborts() {
        let mut fake = FakeTransport::with_eeprom(&counting_image());
        fake.failures.push_back(Error::Timeout);

        let err = read_eeprom(&mut fake).unwrap_err();
        assert!(matches!(err, Error::EepromReadFailed { word: 0, .. }));
        assert_eq!(fake.requests.len(), 1);
    }
}
