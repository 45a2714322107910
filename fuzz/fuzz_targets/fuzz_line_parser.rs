#![no_main]
use std::io::Cursor;
use std::time::Duration;

use libfuzzer_sys::fuzz_target;
use toaster_hardware::SerialSensor;
use toaster_hardware::line::{parse_channels, parse_lab};
use toaster_traits::ColorSensor;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = parse_channels(s);
        let _ = parse_lab(s);
    }
    // Arbitrary bytes through the sensor must end in a closed port, never a panic.
    let mut sensor = SerialSensor::new(Cursor::new(data.to_vec()));
    for _ in 0..=data.len() {
        if sensor.read(Duration::from_millis(1)).is_err() {
            break;
        }
    }
});
