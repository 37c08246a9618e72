mod common;

use common::{FlakyI2c, RecordingDelay};
use embassy_futures::block_on;
use embedded_hal_1::i2c::ErrorKind;
use ledseg::ht16k33::{Blink, Ht16k33, RetryPolicy, DEFAULT_ADDRESS};
use ledseg::{Alignment, Error, Font, SegmentDisplay};

fn commands(i2c: &FlakyI2c) -> Vec<Vec<u8>> {
    i2c.writes.iter().map(|(_, bytes)| bytes.clone()).collect()
}

#[test]
fn init_sequence() {
    let mut i2c = FlakyI2c::default();
    let mut delay = RecordingDelay::default();
    let mut ht: Ht16k33<_, _, 4> =
        Ht16k33::new(&mut i2c, &mut delay, DEFAULT_ADDRESS, Font::SEVEN_SEGMENT);

    block_on(ht.init(9, Blink::OneHz)).unwrap();
    drop(ht);

    assert_eq!(vec![vec![0x21], vec![0xE9], vec![0x85]], commands(&i2c));
    assert!(i2c.writes.iter().all(|(address, _)| *address == 0x70));
}

#[test]
fn brightness_is_clamped() {
    let mut i2c = FlakyI2c::default();
    let mut delay = RecordingDelay::default();
    let mut ht: Ht16k33<_, _, 4> = Ht16k33::new(&mut i2c, &mut delay, 0x71, Font::SEVEN_SEGMENT);

    block_on(ht.set_brightness(200)).unwrap();
    drop(ht);

    assert_eq!(vec![(0x71, vec![0xEF])], i2c.writes);
}

#[test]
fn display_on_keeps_the_blink_rate() {
    let mut i2c = FlakyI2c::default();
    let mut delay = RecordingDelay::default();
    let mut ht: Ht16k33<_, _, 4> =
        Ht16k33::new(&mut i2c, &mut delay, DEFAULT_ADDRESS, Font::SEVEN_SEGMENT);

    block_on(async {
        ht.set_blink(Blink::HalfHz).await?;
        ht.display_off().await?;
        ht.display_on().await?;
        ht.sleep().await?;
        ht.normal().await?;
        ht.reset_to_defaults().await
    })
    .unwrap();
    drop(ht);

    assert_eq!(
        vec![
            vec![0x87],
            vec![0x80],
            vec![0x87],
            vec![0x20],
            vec![0x21],
            vec![0x21],
            vec![0xE7],
            vec![0x81],
        ],
        commands(&i2c)
    );
}

#[test]
fn digits_go_out_in_one_transaction() {
    let mut i2c = FlakyI2c::default();
    let mut delay = RecordingDelay::default();
    let mut ht: Ht16k33<_, _, 4> =
        Ht16k33::new(&mut i2c, &mut delay, DEFAULT_ADDRESS, Font::SEVEN_SEGMENT);

    block_on(ht.display_integer(-12, Alignment::Right)).unwrap();
    drop(ht);

    assert_eq!(
        vec![vec![0x00, 0x00, 0x00, 0x40, 0x00, 0x06, 0x00, 0x5B, 0x00]],
        commands(&i2c)
    );
}

#[test]
fn fourteen_segment_digits_use_both_bytes() {
    let mut i2c = FlakyI2c::default();
    let mut delay = RecordingDelay::default();
    let mut ht: Ht16k33<_, _, 4> =
        Ht16k33::new(&mut i2c, &mut delay, DEFAULT_ADDRESS, Font::FOURTEEN_SEGMENT);

    block_on(ht.display_text("A.", 0, Alignment::Left)).unwrap();
    drop(ht);

    let a = Font::FOURTEEN_SEGMENT.lookup('A').unwrap() | 0x4000;
    let [lo, hi] = a.to_le_bytes();
    assert_eq!(vec![0x00, lo, hi, 0, 0, 0, 0, 0, 0], commands(&i2c)[0]);
}

#[test]
fn raw_writes() {
    let mut i2c = FlakyI2c::default();
    let mut delay = RecordingDelay::default();
    let mut ht: Ht16k33<_, _, 4> =
        Ht16k33::new(&mut i2c, &mut delay, DEFAULT_ADDRESS, Font::FOURTEEN_SEGMENT);

    block_on(ht.write_raw(3, 0x1234)).unwrap();
    assert_eq!(
        Err(Error::InvalidPosition(4)),
        block_on(ht.write_raw(4, 0x1234))
    );
    drop(ht);

    assert_eq!(vec![vec![0x06, 0x34, 0x12]], commands(&i2c));
}

#[test]
fn failed_writes_are_retried() {
    let mut i2c = FlakyI2c {
        failures: 2,
        ..Default::default()
    };
    let mut delay = RecordingDelay::default();
    let mut ht: Ht16k33<_, _, 4> =
        Ht16k33::new(&mut i2c, &mut delay, DEFAULT_ADDRESS, Font::SEVEN_SEGMENT);

    block_on(ht.normal()).unwrap();
    drop(ht);

    assert_eq!(2, i2c.failed);
    assert_eq!(vec![vec![0x21]], commands(&i2c));
    assert_eq!(vec![100, 100], delay.delays_ms);
}

#[test]
fn retries_run_out() {
    let mut i2c = FlakyI2c {
        failures: 10,
        ..Default::default()
    };
    let mut delay = RecordingDelay::default();
    let mut ht: Ht16k33<_, _, 4> =
        Ht16k33::new(&mut i2c, &mut delay, DEFAULT_ADDRESS, Font::SEVEN_SEGMENT)
            .with_retry_policy(RetryPolicy {
                retries: 1,
                delay_ms: 5,
            });

    assert_eq!(
        Err(Error::Transport(ErrorKind::Other)),
        block_on(ht.normal())
    );
    drop(ht);

    assert_eq!(2, i2c.failed);
    assert_eq!(vec![5], delay.delays_ms);
}

#[test]
fn no_retries() {
    let mut i2c = FlakyI2c {
        failures: 1,
        ..Default::default()
    };
    let mut delay = RecordingDelay::default();
    let mut ht: Ht16k33<_, _, 4> =
        Ht16k33::new(&mut i2c, &mut delay, DEFAULT_ADDRESS, Font::SEVEN_SEGMENT)
            .with_retry_policy(RetryPolicy::NONE);

    assert!(block_on(ht.normal()).is_err());
    drop(ht);

    assert!(delay.delays_ms.is_empty());
}

#[test]
fn connection_check() {
    let mut i2c = FlakyI2c::default();
    let mut delay = RecordingDelay::default();
    let mut ht: Ht16k33<_, _, 4> = Ht16k33::new(&mut i2c, &mut delay, 0x72, Font::SEVEN_SEGMENT);

    block_on(ht.check_connection()).unwrap();
    drop(ht);
    assert_eq!(vec![(0x72, 1)], i2c.reads);

    let mut i2c = FlakyI2c {
        absent: true,
        ..Default::default()
    };
    let mut ht: Ht16k33<_, _, 4> = Ht16k33::new(&mut i2c, &mut delay, 0x72, Font::SEVEN_SEGMENT);
    assert_eq!(
        Err(Error::Transport(ErrorKind::Other)),
        block_on(ht.check_connection())
    );
}
