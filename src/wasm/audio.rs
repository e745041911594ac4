//! WebAudio: Web Audio API backend for the ambient bed
//!
//! The `AudioContext` is created on first use, which the scheduler only
//! does from a user gesture.

use std::cell::RefCell;
use wasm_bindgen::JsValue;
use web_sys::{AudioBufferSourceNode, AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::audio::{Ambient, AudioBackend};
use crate::error::{ThemeError, ThemeResult};

const FALLBACK_SAMPLE_RATE: u32 = 44_100;

fn unavailable(e: JsValue) -> ThemeError {
    ThemeError::AudioUnavailable(format!("{e:?}"))
}

#[derive(Default)]
pub struct WebAudio {
    context: RefCell<Option<AudioContext>>,
    tone: Option<OscillatorNode>,
    noise: Option<AudioBufferSourceNode>,
}

impl WebAudio {
    pub fn new() -> Self {
        Self::default()
    }

    fn context(&self) -> ThemeResult<AudioContext> {
        if let Some(ctx) = self.context.borrow().as_ref() {
            return Ok(ctx.clone());
        }
        let ctx = AudioContext::new().map_err(unavailable)?;
        *self.context.borrow_mut() = Some(ctx.clone());
        Ok(ctx)
    }

    fn build(
        ctx: &AudioContext,
        ambient: &Ambient,
    ) -> ThemeResult<(OscillatorNode, AudioBufferSourceNode)> {
        let tone = ctx.create_oscillator().map_err(unavailable)?;
        tone.set_type(OscillatorType::Sine);
        tone.frequency().set_value(ambient.tone_hz);
        tone.connect_with_audio_node(&Self::gain(ctx, ambient.tone_gain)?)
            .map_err(unavailable)?;
        tone.start().map_err(unavailable)?;

        let buffer = ctx
            .create_buffer(1, ambient.noise.len() as u32, ambient.sample_rate as f32)
            .map_err(unavailable)?;
        buffer.copy_to_channel(&ambient.noise, 0).map_err(unavailable)?;
        let noise = ctx.create_buffer_source().map_err(unavailable)?;
        noise.set_buffer(Some(&buffer));
        noise.set_loop(true);
        noise.connect_with_audio_node(&Self::gain(ctx, ambient.noise_gain)?)
            .map_err(unavailable)?;
        noise.start().map_err(unavailable)?;
        Ok((tone, noise))
    }

    fn gain(ctx: &AudioContext, value: f32) -> ThemeResult<GainNode> {
        let gain = ctx.create_gain().map_err(unavailable)?;
        gain.gain().set_value(value);
        gain.connect_with_audio_node(&ctx.destination()).map_err(unavailable)?;
        Ok(gain)
    }
}

impl AudioBackend for WebAudio {
    fn sample_rate(&self) -> u32 {
        self.context()
            .map(|ctx| ctx.sample_rate() as u32)
            .unwrap_or(FALLBACK_SAMPLE_RATE)
    }

    fn start(&mut self, ambient: &Ambient) -> ThemeResult<()> {
        let ctx = self.context()?;
        match Self::build(&ctx, ambient) {
            Ok((tone, noise)) => {
                self.tone = Some(tone);
                self.noise = Some(noise);
                Ok(())
            }
            Err(e) => {
                // Whatever already started stops with the context
                self.close();
                Err(e)
            }
        }
    }

    fn set_tone_frequency(&mut self, hz: f32) {
        if let Some(tone) = &self.tone {
            tone.frequency().set_value(hz);
        }
    }

    fn close(&mut self) {
        self.tone = None;
        self.noise = None;
        if let Some(ctx) = self.context.borrow_mut().take() {
            let _ = ctx.close();
        }
    }
}
