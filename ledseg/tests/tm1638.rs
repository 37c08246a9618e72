mod common;

use common::{RecordingBusDriver, Tm1638Frame};
use embassy_futures::block_on;
use ledseg::{Alignment, Error, LedColor, SegmentDisplay, Tm1638, Tm1638Model};

#[test]
fn init_blanks_and_activates() {
    let mut bus = RecordingBusDriver::default();
    let mut tm = Tm1638::new(&mut bus, Tm1638Model::LedAndKey);

    block_on(tm.init()).unwrap();
    drop(tm);

    assert_eq!(
        vec![
            Tm1638Frame::Command(0x40),
            Tm1638Frame::Write(0xC0, vec![0; 16]),
            Tm1638Frame::Command(0x8A),
        ],
        bus.frames
    );
}

#[test]
fn text_is_written_digit_by_digit() {
    let mut bus = RecordingBusDriver::default();
    let mut tm = Tm1638::new(&mut bus, Tm1638Model::LedAndKey);

    let dots = block_on(tm.display_text("12.3", 0, Alignment::Left)).unwrap();
    assert_eq!(1, dots);
    drop(tm);

    assert_eq!(Tm1638Frame::Command(0x44), bus.frames[0]);
    assert_eq!(
        vec![
            (0xC0, vec![0x06]),
            (0xC2, vec![0x5B | 0x80]),
            (0xC4, vec![0x4F]),
            (0xC6, vec![0x00]),
            (0xC8, vec![0x00]),
            (0xCA, vec![0x00]),
            (0xCC, vec![0x00]),
            (0xCE, vec![0x00]),
        ],
        bus.writes()
    );
}

#[test]
fn addressing_mode_is_only_sent_when_it_changes() {
    let mut bus = RecordingBusDriver::default();
    let mut tm = Tm1638::new(&mut bus, Tm1638Model::LedAndKey);

    block_on(async {
        tm.set_display_mask(0, 0x3F).await?;
        tm.set_display_mask(7, 0x06).await?;
        tm.blank_display().await?;
        tm.set_display_mask(1, 0x5B).await
    })
    .unwrap();
    drop(tm);

    assert_eq!(
        vec![
            Tm1638Frame::Command(0x44),
            Tm1638Frame::Write(0xC0, vec![0x3F]),
            Tm1638Frame::Write(0xCE, vec![0x06]),
            Tm1638Frame::Command(0x40),
            Tm1638Frame::Write(0xC0, vec![0; 16]),
            Tm1638Frame::Command(0x44),
            Tm1638Frame::Write(0xC2, vec![0x5B]),
        ],
        bus.frames
    );
}

#[test]
fn writes_past_the_last_digit_are_rejected() {
    let mut bus = RecordingBusDriver::default();
    let mut tm = Tm1638::new(&mut bus, Tm1638Model::LedAndKey);

    assert_eq!(
        Err(Error::InvalidPosition(8)),
        block_on(tm.set_display_mask(8, 0xFF))
    );
    drop(tm);

    assert!(bus.frames.is_empty());
}

#[test]
fn monochrome_leds() {
    let mut bus = RecordingBusDriver::default();
    let mut tm = Tm1638::new(&mut bus, Tm1638Model::LedAndKey);

    block_on(async {
        tm.set_led_color(0, LedColor::Red).await?;
        tm.set_led_color(7, LedColor::Green).await?;
        tm.set_led_color(3, LedColor::Off).await
    })
    .unwrap();
    drop(tm);

    assert_eq!(
        vec![(0xC1, vec![0x01]), (0xCF, vec![0x01]), (0xC7, vec![0x00])],
        bus.writes()
    );
}

#[test]
fn bicolor_leds() {
    let mut bus = RecordingBusDriver::default();
    let mut tm = Tm1638::new(&mut bus, Tm1638Model::BiColorLedAndKey);

    // LED 0 red, LED 1 green, LED 2 both
    block_on(tm.set_leds(0b0000_0101 | 0b0000_0110 << 8)).unwrap();
    drop(tm);

    let writes = bus.writes();
    assert_eq!(8, writes.len());
    assert_eq!((0xC1, vec![0x02]), writes[0]);
    assert_eq!((0xC3, vec![0x01]), writes[1]);
    assert_eq!((0xC5, vec![0x03]), writes[2]);
    assert_eq!((0xC7, vec![0x00]), writes[3]);
}

#[test]
fn monochrome_leds_ignore_the_high_byte() {
    let mut bus = RecordingBusDriver::default();
    let mut tm = Tm1638::new(&mut bus, Tm1638Model::LedAndKey);

    block_on(tm.set_leds(0xFF80)).unwrap();
    drop(tm);

    let masks: Vec<u8> = bus.writes().iter().map(|(_, data)| data[0]).collect();
    assert_eq!(vec![0, 0, 0, 0, 0, 0, 0, 1], masks);
}

#[test]
fn sixteen_key_board_has_no_leds() {
    let mut bus = RecordingBusDriver::default();
    let mut tm = Tm1638::new(
        &mut bus,
        Tm1638Model::SixteenKey {
            swap_nibbles: false,
        },
    );

    assert_eq!(Err(Error::Unsupported), block_on(tm.set_leds(0x0001)));
    assert_eq!(
        Err(Error::Unsupported),
        block_on(tm.set_led_color(0, LedColor::Red))
    );
}

#[test]
fn sixteen_key_board_is_written_by_segment() {
    let mut bus = RecordingBusDriver::default();
    let mut tm = Tm1638::new(
        &mut bus,
        Tm1638Model::SixteenKey {
            swap_nibbles: false,
        },
    );

    // '8' on the leftmost digit lights segments a to g of digit 0, which is bit 7 of each
    // segment line
    block_on(tm.set_display_mask(0, 0x7F)).unwrap();
    drop(tm);

    assert_eq!(
        vec![
            (0xC0, vec![0x80]),
            (0xC2, vec![0x80]),
            (0xC4, vec![0x80]),
            (0xC6, vec![0x80]),
            (0xC8, vec![0x80]),
            (0xCA, vec![0x80]),
            (0xCC, vec![0x80]),
            (0xCE, vec![0x00]),
        ],
        bus.writes()
    );
}

#[test]
fn sixteen_key_board_keeps_the_other_digits() {
    let mut bus = RecordingBusDriver::default();
    let mut tm = Tm1638::new(
        &mut bus,
        Tm1638Model::SixteenKey {
            swap_nibbles: false,
        },
    );

    block_on(async {
        tm.set_display_mask(0, 0x01).await?;
        tm.set_display_mask(7, 0x01).await
    })
    .unwrap();
    drop(tm);

    // The second flush still has digit 0 lit on segment a
    let writes = bus.writes();
    assert_eq!(16, writes.len());
    assert_eq!((0xC0, vec![0x81]), writes[8]);
    assert_eq!((0xC2, vec![0x00]), writes[9]);
}

#[test]
fn sixteen_key_board_with_swapped_nibbles() {
    let mut bus = RecordingBusDriver::default();
    let mut tm = Tm1638::new(&mut bus, Tm1638Model::SixteenKey { swap_nibbles: true });

    block_on(tm.set_display_mask(0, 0x01)).unwrap();
    drop(tm);

    assert_eq!((0xC0, vec![0x08]), bus.writes()[0]);
}

#[test]
fn segment_masks_need_the_sixteen_key_board() {
    let mut bus = RecordingBusDriver::default();
    let mut tm = Tm1638::new(&mut bus, Tm1638Model::LedAndKey);

    assert_eq!(Err(Error::Unsupported), block_on(tm.set_segment_mask(0, 0xFF)));
}

#[test]
fn key_scan() {
    let mut bus = RecordingBusDriver {
        // KS1 and KS6, which are S1 and S7 on the LED & KEY board
        key_scan: [0x01, 0x00, 0x10, 0x00],
        ..Default::default()
    };
    let mut tm = Tm1638::new(&mut bus, Tm1638Model::LedAndKey);

    let keys = block_on(tm.read_keys()).unwrap();
    drop(tm);

    assert_eq!(0b0100_0001, keys.led_and_key_buttons());
    assert_eq!(vec![Tm1638Frame::Read(0x42, 4)], bus.frames);
}

#[test]
fn sixteen_key_scan() {
    let mut bus = RecordingBusDriver {
        // S3
        key_scan: [0x00, 0x04, 0x00, 0x00],
        ..Default::default()
    };
    let mut tm = Tm1638::new(
        &mut bus,
        Tm1638Model::SixteenKey {
            swap_nibbles: false,
        },
    );

    let keys = block_on(tm.read_keys()).unwrap();

    assert_eq!(3, keys.sixteen_key_number());
    assert_eq!(0b0000_0000_0000_0100, keys.sixteen_key_mask());
}

#[test]
fn numbers_through_the_engine() {
    let mut bus = RecordingBusDriver::default();
    let mut tm = Tm1638::new(&mut bus, Tm1638Model::LedAndKey);

    block_on(tm.display_hex_nibbles(0x1F, 0x0A, 0, Alignment::RightZeroFilled)).unwrap();
    drop(tm);

    let digits: Vec<u8> = bus.writes().iter().map(|(_, data)| data[0]).collect();
    // "001F000A"
    assert_eq!(
        vec![0x3F, 0x3F, 0x06, 0x71, 0x3F, 0x3F, 0x3F, 0x77],
        digits
    );
}
