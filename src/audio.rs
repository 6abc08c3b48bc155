//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed. A low
//! ambient drone runs for the whole playing phase; one-shot cues fire from
//! gameplay events. Every cue is fire-and-forget: any node that fails to
//! build silently drops the cue.

use web_sys::{
    AudioBuffer, AudioContext, BiquadFilterType, GainNode, OscillatorNode, OscillatorType,
};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Interceptor launched - kick plus filtered noise burst
    Shot,
    /// Raider entering the field - FM screech
    SpawnScreech,
    /// Normal detonation
    Blast,
    /// Massive detonation (breach, game over)
    MassiveBlast,
    /// Level threshold crossed - slow triad swell
    LevelUp,
}

/// Held nodes for one drone voice so it can be ramped down later
struct DroneVoice {
    osc: OscillatorNode,
    lfo: OscillatorNode,
    gain: GainNode,
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    master: Option<GainNode>,
    noise_buffer: Option<AudioBuffer>,
    drone_voices: Vec<DroneVoice>,
    master_volume: f32,
    muted: bool,
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
        let master = ctx.as_ref().and_then(|ctx| {
            let gain = ctx.create_gain().ok()?;
            gain.gain().set_value(1.0);
            gain.connect_with_audio_node(&ctx.destination()).ok()?;
            Some(gain)
        });
        let noise_buffer = ctx.as_ref().and_then(build_noise_buffer);

        Self {
            ctx,
            master,
            noise_buffer,
            drone_voices: Vec::new(),
            master_volume: 0.8,
            muted: false,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master_volume }
    }

    /// Start the ambient drone: three detuned sawtooths through slowly
    /// wobbling lowpass filters. Replaces any drone already running.
    pub fn start_drone(&mut self) {
        self.stop_drone();
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };
        let Some(master) = &self.master else { return };

        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        for freq in [55.0, 58.0, 110.0] {
            let Some(voice) = build_drone_voice(ctx, master, freq, vol) else {
                continue;
            };
            self.drone_voices.push(voice);
        }
    }

    /// Ramp the drone out over two seconds and release the nodes
    pub fn stop_drone(&mut self) {
        let Some(ctx) = &self.ctx else {
            self.drone_voices.clear();
            return;
        };
        let t = ctx.current_time();
        for voice in self.drone_voices.drain(..) {
            voice
                .gain
                .gain()
                .exponential_ramp_to_value_at_time(0.001, t + 2.0)
                .ok();
            voice.osc.stop_with_when(t + 2.0).ok();
            voice.lfo.stop_with_when(t + 2.0).ok();
        }
    }

    /// Play a one-shot sound effect
    pub fn play(&self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match effect {
            SoundEffect::Shot => self.play_shot(ctx, vol),
            SoundEffect::SpawnScreech => self.play_spawn_screech(ctx, vol),
            SoundEffect::Blast => self.play_explosion(ctx, vol, false),
            SoundEffect::MassiveBlast => self.play_explosion(ctx, vol, true),
            SoundEffect::LevelUp => self.play_level_up(ctx, vol),
        }
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope, routed through the master
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let master = self.master.as_ref()?;
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(master).ok()?;

        Some((osc, gain))
    }

    /// A noise source routed through a lowpass filter and gain envelope
    fn create_noise(
        &self,
        ctx: &AudioContext,
    ) -> Option<(web_sys::AudioBufferSourceNode, web_sys::BiquadFilterNode, GainNode)> {
        let master = self.master.as_ref()?;
        let buffer = self.noise_buffer.as_ref()?;

        let src = ctx.create_buffer_source().ok()?;
        src.set_buffer(Some(buffer));
        let filter = ctx.create_biquad_filter().ok()?;
        filter.set_type(BiquadFilterType::Lowpass);
        let gain = ctx.create_gain().ok()?;

        src.connect_with_audio_node(&filter).ok()?;
        filter.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(master).ok()?;

        Some((src, filter, gain))
    }

    /// Shot - low kick sweep plus a short filtered noise blast
    fn play_shot(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();

        // The kick
        if let Some((osc, gain)) = self.create_osc(ctx, 150.0, OscillatorType::Sine) {
            gain.gain().set_value_at_time(vol * 0.8, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.001, t + 0.15)
                .ok();
            osc.frequency().set_value_at_time(150.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(10.0, t + 0.15)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.2).ok();
        }

        // The muzzle blast
        if let Some((src, filter, gain)) = self.create_noise(ctx) {
            filter.frequency().set_value_at_time(1000.0, t).ok();
            filter
                .frequency()
                .exponential_ramp_to_value_at_time(100.0, t + 0.1)
                .ok();
            gain.gain().set_value_at_time(vol * 0.6, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.001, t + 0.1)
                .ok();
            src.start().ok();
            src.stop_with_when(t + 0.2).ok();
        }
    }

    /// Spawn screech - rising sawtooth carrier with a harsh square FM
    /// modulator, softened by a lowpass
    fn play_spawn_screech(&self, ctx: &AudioContext, vol: f32) {
        let Some(master) = &self.master else { return };
        let t = ctx.current_time();

        let Ok(carrier) = ctx.create_oscillator() else {
            return;
        };
        let Ok(modulator) = ctx.create_oscillator() else {
            return;
        };
        let Ok(gain) = ctx.create_gain() else { return };
        let Ok(mod_gain) = ctx.create_gain() else {
            return;
        };
        let Ok(filter) = ctx.create_biquad_filter() else {
            return;
        };

        carrier.set_type(OscillatorType::Sawtooth);
        carrier.frequency().set_value_at_time(100.0, t).ok();
        carrier
            .frequency()
            .linear_ramp_to_value_at_time(400.0, t + 0.6)
            .ok();

        modulator.set_type(OscillatorType::Square);
        modulator.frequency().set_value(73.0);
        mod_gain.gain().set_value(300.0);
        modulator.connect_with_audio_node(&mod_gain).ok();
        mod_gain.connect_with_audio_param(&carrier.frequency()).ok();

        filter.set_type(BiquadFilterType::Lowpass);
        filter.frequency().set_value(1500.0);

        gain.gain().set_value_at_time(vol * 0.3, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.001, t + 0.6)
            .ok();

        carrier.connect_with_audio_node(&filter).ok();
        filter.connect_with_audio_node(&gain).ok();
        gain.connect_with_audio_node(master).ok();

        carrier.start().ok();
        modulator.start().ok();
        carrier.stop_with_when(t + 0.6).ok();
        modulator.stop_with_when(t + 0.6).ok();
    }

    /// Explosion - the noise buffer through a collapsing lowpass. Massive
    /// blasts open lower, louder and ring far longer.
    fn play_explosion(&self, ctx: &AudioContext, vol: f32, massive: bool) {
        let Some((src, filter, gain)) = self.create_noise(ctx) else {
            return;
        };
        let t = ctx.current_time();
        let duration = if massive { 2.5 } else { 0.8 };
        let open = if massive { 300.0 } else { 500.0 };
        let peak = if massive { 2.0 } else { 0.8 };

        filter.frequency().set_value_at_time(open, t).ok();
        filter
            .frequency()
            .exponential_ramp_to_value_at_time(20.0, t + duration)
            .ok();
        gain.gain().set_value_at_time(vol * peak, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.001, t + duration)
            .ok();

        src.start().ok();
        src.stop_with_when(t + duration).ok();
    }

    /// Level up - low triangle triad swelling in over a second
    fn play_level_up(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();
        for freq in [110.0, 130.0, 196.0] {
            if let Some((osc, gain)) = self.create_osc(ctx, freq, OscillatorType::Triangle) {
                gain.gain().set_value_at_time(0.0, t).ok();
                gain.gain()
                    .linear_ramp_to_value_at_time(vol * 0.4, t + 1.0)
                    .ok();
                gain.gain().linear_ramp_to_value_at_time(0.0, t + 2.0).ok();
                osc.start().ok();
                osc.stop_with_when(t + 2.0).ok();
            }
        }
    }
}

/// Two seconds of white noise, shared by every noise-based cue
fn build_noise_buffer(ctx: &AudioContext) -> Option<AudioBuffer> {
    let sample_rate = ctx.sample_rate();
    let len = (sample_rate * 2.0) as u32;
    let buffer = ctx.create_buffer(1, len, sample_rate).ok()?;

    let mut data = vec![0.0f32; len as usize];
    for sample in &mut data {
        *sample = (js_sys::Math::random() as f32) * 2.0 - 1.0;
    }
    buffer.copy_to_channel(&mut data, 0).ok()?;

    Some(buffer)
}

/// One drone voice: sawtooth through a lowpass whose cutoff is wobbled by a
/// very slow LFO
fn build_drone_voice(
    ctx: &AudioContext,
    master: &GainNode,
    freq: f32,
    vol: f32,
) -> Option<DroneVoice> {
    let osc = ctx.create_oscillator().ok()?;
    let gain = ctx.create_gain().ok()?;
    let filter = ctx.create_biquad_filter().ok()?;
    let lfo = ctx.create_oscillator().ok()?;
    let lfo_gain = ctx.create_gain().ok()?;

    osc.set_type(OscillatorType::Sawtooth);
    osc.frequency().set_value(freq);

    filter.set_type(BiquadFilterType::Lowpass);
    filter.frequency().set_value(180.0);

    lfo.set_type(OscillatorType::Sine);
    lfo.frequency().set_value(0.1);
    lfo_gain.gain().set_value(50.0);
    lfo.connect_with_audio_node(&lfo_gain).ok()?;
    lfo_gain.connect_with_audio_param(&filter.frequency()).ok()?;

    gain.gain().set_value(vol * 0.2);

    osc.connect_with_audio_node(&filter).ok()?;
    filter.connect_with_audio_node(&gain).ok()?;
    gain.connect_with_audio_node(master).ok()?;

    osc.start().ok()?;
    lfo.start().ok()?;

    Some(DroneVoice { osc, lfo, gain })
}
