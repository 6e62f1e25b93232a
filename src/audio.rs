//! Audio system using Web Audio API
//!
//! Sound effects are tiny synthesized beeps; background music streams from an
//! `<audio>` element whose volume is tweened for ducking.

use web_sys::{AudioContext, GainNode, HtmlAudioElement, OscillatorNode, OscillatorType};

use crate::sim::{MusicCue, SoundEffect};

/// Looping background track
const MUSIC_SRC: &str = "assets/music.mp3";
/// Music volume while ducked for a jump-scare
const DUCK_VOLUME: f32 = 0.06;
const DUCK_MS: f64 = 120.0;
const RESTORE_MS: f64 = 240.0;

/// One synthesized blip
#[derive(Debug, Clone, Copy)]
struct Beep {
    freq: f32,
    /// Seconds
    dur: f64,
    osc: OscillatorType,
    gain: f32,
    /// Frequency change over the beep (Hz)
    slide: f32,
    /// Start offset in seconds
    delay: f64,
}

impl Beep {
    const fn new(freq: f32, dur: f64, osc: OscillatorType, gain: f32, slide: f32) -> Self {
        Self {
            freq,
            dur,
            osc,
            gain,
            slide,
            delay: 0.0,
        }
    }

    const fn after(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }
}

fn beeps_for(effect: SoundEffect) -> &'static [Beep] {
    use OscillatorType::{Sine, Square, Triangle};
    const HIT: [Beep; 1] = [Beep::new(560.0, 0.05, Triangle, 0.06, 240.0)];
    const BONUS: [Beep; 2] = [
        Beep::new(760.0, 0.06, Square, 0.045, 260.0),
        Beep::new(1040.0, 0.07, Square, 0.04, 160.0).after(0.045),
    ];
    const MISS: [Beep; 1] = [Beep::new(165.0, 0.08, Sine, 0.04, -70.0)];
    const START: [Beep; 1] = [Beep::new(420.0, 0.09, Triangle, 0.05, 190.0)];
    const END: [Beep; 1] = [Beep::new(220.0, 0.14, Sine, 0.04, -90.0)];
    const COMBO: [Beep; 1] = [Beep::new(860.0, 0.06, Triangle, 0.05, 90.0)];

    match effect {
        SoundEffect::Hit => &HIT,
        SoundEffect::Bonus => &BONUS,
        SoundEffect::Miss => &MISS,
        SoundEffect::Start => &START,
        SoundEffect::End => &END,
        SoundEffect::Combo => &COMBO,
    }
}

/// Sound effect player
pub struct AudioManager {
    ctx: Option<AudioContext>,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // Try to create audio context (may fail if not in secure context)
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self { ctx }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    pub fn play(&self, effect: SoundEffect) {
        let Some(ctx) = &self.ctx else { return };

        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        for beep in beeps_for(effect) {
            if self.play_beep(ctx, beep).is_none() {
                log::warn!("Dropped {:?} sound", effect);
            }
        }
    }

    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    fn play_beep(&self, ctx: &AudioContext, beep: &Beep) -> Option<()> {
        let (osc, gain) = self.create_osc(ctx, beep.freq, beep.osc)?;
        let t = ctx.current_time() + beep.delay;

        osc.frequency().set_value_at_time(beep.freq, t).ok()?;
        if beep.slide != 0.0 {
            osc.frequency()
                .linear_ramp_to_value_at_time(beep.freq + beep.slide, t + beep.dur)
                .ok()?;
        }
        gain.gain()
            .set_value_at_time(beep.gain, t)
            .ok()?;
        gain.gain()
            .exponential_ramp_to_value_at_time(0.0001, t + beep.dur)
            .ok()?;

        osc.start_with_when(t).ok()?;
        osc.stop_with_when(t + beep.dur).ok()?;
        Some(())
    }
}

/// Linear volume fade
#[derive(Debug, Clone, Copy)]
struct VolumeTween {
    from: f32,
    to: f32,
    start: f64,
    duration: f64,
}

impl VolumeTween {
    fn sample(&self, now: f64) -> (f32, bool) {
        let t = ((now - self.start) / self.duration).clamp(0.0, 1.0) as f32;
        (self.from + (self.to - self.from) * t, t >= 1.0)
    }
}

/// Background music with ducking
pub struct MusicPlayer {
    element: Option<HtmlAudioElement>,
    target_volume: f32,
    tween: Option<VolumeTween>,
}

impl MusicPlayer {
    pub fn new(target_volume: f32) -> Self {
        Self {
            element: None,
            target_volume: target_volume.clamp(0.0, 1.0),
            tween: None,
        }
    }

    /// Lazily create the element on first play
    fn element(&mut self) -> Option<&HtmlAudioElement> {
        if self.element.is_none() {
            match HtmlAudioElement::new_with_src(MUSIC_SRC) {
                Ok(el) => {
                    el.set_loop(true);
                    el.set_preload("auto");
                    el.set_volume(self.target_volume as f64);
                    self.element = Some(el);
                }
                Err(e) => log::warn!("Failed to create music element: {:?}", e),
            }
        }
        self.element.as_ref()
    }

    pub fn handle(&mut self, cue: MusicCue, now: f64) {
        match cue {
            MusicCue::Play => self.play(),
            MusicCue::Stop => self.stop(),
            MusicCue::Duck => self.fade_to(DUCK_VOLUME, DUCK_MS, now),
            MusicCue::Restore => self.fade_to(self.target_volume, RESTORE_MS, now),
        }
    }

    fn play(&mut self) {
        let Some(el) = self.element() else { return };
        match el.play() {
            Ok(promise) => {
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(e) = wasm_bindgen_futures::JsFuture::from(promise).await {
                        log::warn!("Music play blocked: {:?}", e);
                    }
                });
            }
            Err(e) => log::warn!("Music play failed: {:?}", e),
        }
    }

    fn stop(&mut self) {
        self.tween = None;
        if let Some(el) = &self.element {
            let _ = el.pause();
            el.set_volume(self.target_volume as f64);
        }
    }

    fn fade_to(&mut self, to: f32, duration: f64, now: f64) {
        let Some(el) = &self.element else { return };
        self.tween = Some(VolumeTween {
            from: el.volume() as f32,
            to,
            start: now,
            duration,
        });
    }

    /// Advance any running fade (call once per frame)
    pub fn update(&mut self, now: f64) {
        let (Some(tween), Some(el)) = (self.tween, &self.element) else {
            return;
        };
        let (volume, done) = tween.sample(now);
        el.set_volume(volume as f64);
        if done {
            self.tween = None;
        }
    }
}
