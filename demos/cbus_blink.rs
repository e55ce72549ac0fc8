//! CBUS GPIO example.
//!
//! Lists the CBUS lines of the first connected FT232R that are in IO mode,
//! then blinks the first one. Connect an LED (with an appropriate resistor)
//! to observe the output. Use FT_Prog or ftdi_eeprom to put a CBUS line in
//! "I/O MODE" first.
//!
//! Usage: cargo run --example cbus_blink [serial]

use std::thread;
use std::time::Duration;

use ftdi_cbus::{CbusGpio, DeviceFilter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut filter = DeviceFilter::default();
    if let Some(serial) = std::env::args().nth(1) {
        filter = filter.serial(serial);
    }

    println!("Opening FT232R...");
    let gpio = CbusGpio::open(&filter)?;
    for pin in gpio.pins() {
        println!("GPIO {} -> CBUS{}", pin.index(), pin.line());
    }

    let pin = gpio.pin(0)?;
    pin.set_output(false)?;

    for cycle in 0..10u32 {
        let high = cycle % 2 == 0;
        pin.write(high)?;

        let level = pin.read()?;
        println!(
            "Cycle {cycle}: wrote {}, read {}, register 0x{:02X}",
            u8::from(high),
            u8::from(level),
            gpio.state().raw()
        );

        thread::sleep(Duration::from_millis(500));
    }

    // Leave the line released
    pin.set_input()?;
    gpio.detach();
    println!("Done.");

    Ok(())
}
