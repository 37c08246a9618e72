//! Demo of the LED & KEY TM1638 board on an RP2040 board like the Pi Pico.
//!
//! Each button lights its LED and shows its number; with no button down the display counts.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_time::Timer;
use ledseg::{Alignment, SegmentDisplay, Tm1638, Tm1638Model};
use {defmt_rtt as _, panic_probe as _};

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    // Bit-bang the TM1638 bus on GPIO 6 (STB), 7 (CLK) and 8 (DIO), timed with `embassy-time`
    let mut tm1638 = Tm1638::builder()
        .model(Tm1638Model::LedAndKey)
        .with_embassy_timer()
        .with_embassy_rp_pins(p.PIN_6, p.PIN_7, p.PIN_8)
        .build();
    tm1638.init().await.unwrap();

    tm1638
        .display_text("HELLO.PI", 0, Alignment::Left)
        .await
        .unwrap();
    Timer::after_millis(1500).await;

    debug!("Press one of the buttons on the board!");

    let mut count: i32 = 0;
    let mut last_buttons = 0u8;

    loop {
        let keys = tm1638.read_keys().await.unwrap();
        let buttons = keys.led_and_key_buttons();

        if buttons != last_buttons {
            // Bit n of the buttons is S(n+1), which sits under LED n
            tm1638.set_leds(buttons as u16).await.unwrap();

            for (col, row) in keys.clone() {
                debug!("col {}, row {}", col, row);
            }

            if buttons != 0 {
                let button = buttons.trailing_zeros() as i32 + 1;
                tm1638
                    .display_integer(button, Alignment::Right)
                    .await
                    .unwrap();

                let s = tm1638.font().glyph_or_default('S') as u8;
                tm1638.set_display_mask(0, s).await.unwrap();
            }

            last_buttons = buttons;
        }

        if buttons == 0 {
            tm1638
                .display_fixed_point(count as f32 / 100.0, 2, Alignment::Right)
                .await
                .unwrap();
            count = (count + 1) % 1_000_000;
        }

        Timer::after_millis(10).await;
    }
}
