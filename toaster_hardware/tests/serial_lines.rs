use std::io::Cursor;
use std::time::Duration;

use rstest::rstest;
use toaster_hardware::error::HwError;
use toaster_hardware::SerialSensor;
use toaster_traits::ColorSensor;

fn sensor(text: &str) -> SerialSensor<Cursor<Vec<u8>>> {
    SerialSensor::new(Cursor::new(text.as_bytes().to_vec()))
}

fn reds(text: &str) -> Vec<Option<u32>> {
    let mut s = sensor(text);
    let mut out = Vec::new();
    loop {
        match s.read(Duration::from_secs(1)) {
            Ok(sample) => out.push(sample.map(|c| c.red)),
            Err(e) => {
                assert!(matches!(e.downcast_ref::<HwError>(), Some(HwError::Closed)));
                return out;
            }
        }
    }
}

#[rstest]
#[case::pair(
    "Ambient: 400 Red: 150 Green: 120 Blue: 90\nL: 50.1 a: 10.2 b: 20.3\n",
    vec![Some(150)]
)]
#[case::crlf(
    "Ambient: 400 Red: 150 Green: 120 Blue: 90\r\nL: 50.1 a: 10.2 b: 20.3\r\n",
    vec![Some(150)]
)]
#[case::banner_then_pair(
    "TCS34725 ready\nAmbient: 1 Red: 2 Green: 3 Blue: 4\nL: 1 a: 2 b: 3\n",
    vec![None, Some(2)]
)]
#[case::malformed_channels_do_not_consume_next_line(
    "Ambient: x Red: 2 Green: 3 Blue: 4\nAmbient: 1 Red: 7 Green: 3 Blue: 4\nL: 1 a: 2 b: 3\n",
    vec![None, Some(7)]
)]
#[case::unpaired_channel_line_consumes_its_successor(
    "Ambient: 1 Red: 2 Green: 3 Blue: 4\nAmbient: 1 Red: 9 Green: 3 Blue: 4\nL: 1 a: 2 b: 3\n",
    vec![None, None]
)]
#[case::lab_without_channels(
    "L: 1 a: 2 b: 3\n",
    vec![None]
)]
fn readings_and_skips(#[case] text: &str, #[case] want: Vec<Option<u32>>) {
    assert_eq!(reds(text), want);
}

#[test]
fn end_of_stream_is_a_closed_port() {
    let mut s = sensor("");
    let err = s.read(Duration::from_secs(1)).expect_err("eof");
    assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::Closed)));
}

#[test]
fn silent_port_times_out() {
    let mut s = SerialSensor::with_timeouts(Cursor::new(Vec::new()));
    let err = s.read(Duration::from_millis(20)).expect_err("silent port");
    assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::Timeout)));
}

#[test]
fn garbled_bytes_skip_the_cycle_on_a_port() {
    let mut s = SerialSensor::with_timeouts(Cursor::new(b"\xff\xfe\n".to_vec()));
    assert!(s.read(Duration::from_secs(1)).unwrap().is_none());
}

#[test]
fn lab_values_come_through() {
    let mut s = sensor("Ambient: 400 Red: 150 Green: 120 Blue: 90\nL: 50.5 a: -2.25 b: 20\n");
    let sample = s.read(Duration::from_secs(1)).unwrap().unwrap();
    assert_eq!(sample.ambient, 400);
    assert_eq!(sample.green, 120);
    assert_eq!(sample.blue, 90);
    assert_eq!(sample.lab.l, 50.5);
    assert_eq!(sample.lab.a, -2.25);
    assert_eq!(sample.lab.b, 20.0);
}
