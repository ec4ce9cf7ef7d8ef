use emu_chip8::Chip8System;
use emu_core::System;
use std::env;

/// Cycles through the hex glyphs 0-F, one per instruction batch
const DEMO: [u16; 9] = [
    0x6A08, // VA = 8
    0x6B08, // VB = 8
    0x00E0, // clear
    0xF029, // I = glyph for V0
    0xDAB5, // draw at (VA, VB)
    0x7001, // V0 += 1
    0x4010, // skip unless V0 == 0x10
    0x6000, // V0 = 0
    0x1204, // loop back to the clear
];

fn main() {
    let ticks: u32 = env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(30);

    let rom: Vec<u8> = DEMO.iter().flat_map(|w| w.to_be_bytes()).collect();
    let mut sys = Chip8System::with_seed(0);
    sys.mount("Program", &rom).unwrap();

    let mut frame = None;
    for _ in 0..ticks {
        frame = Some(sys.step_frame().unwrap());
    }

    if let Some(frame) = frame {
        println!("Headless CHIP-8 frame: {}x{}", frame.width, frame.height);
    }
    print!("{}", sys.machine().framebuffer().to_text());
    println!("Save-state: {}", serde_json::to_string_pretty(&sys.save_state()).unwrap());
}
