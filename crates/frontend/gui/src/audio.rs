//! Buzzer for the sound timer

use rodio::source::{SineWave, Source};
use rodio::{OutputStream, OutputStreamHandle, Sink};

const BEEP_HZ: f32 = 440.0;
const VOLUME: f32 = 0.15;

/// Continuous tone that is paused and resumed instead of restarted, so
/// short beeps do not click.
pub struct Beeper {
    // Dropping the stream stops playback
    _stream: OutputStream,
    _handle: OutputStreamHandle,
    sink: Sink,
}

impl Beeper {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let (stream, handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&handle)?;
        sink.append(SineWave::new(BEEP_HZ).amplify(VOLUME));
        sink.pause();
        Ok(Self {
            _stream: stream,
            _handle: handle,
            sink,
        })
    }

    pub fn set_active(&self, active: bool) {
        match (active, self.sink.is_paused()) {
            (true, true) => self.sink.play(),
            (false, false) => self.sink.pause(),
            _ => {}
        }
    }
}
