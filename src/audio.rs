//! Feedback cue queue for the external audio collaborator
//!
//! Simulation events are turned into timed tones with relative offsets.
//! Multi-note sequences (arpeggios, fanfares) are queued up front and
//! released as the caller's clock advances; nothing reaches back into the
//! simulation.

use serde::{Deserialize, Serialize};

use crate::settings::MatchSettings;
use crate::sim::events::GameEvent;
use crate::sim::special::SpecialState;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Ball hits paddle
    PaddleHit,
    /// Ball clipped by an arc tip
    EdgeHit,
    SpecialHit,
    PowerUpCollect,
    /// An AI grabbed a pickup
    PowerUpDenied,
    EffectExpire,
    RingSwitch,
    RingSwitchBlocked,
    /// Paddles bumped
    PaddleBump,
    NearMiss,
    BallLost,
    SpecialSpawn,
    ForceCapture,
    Capture,
    ComboMilestone,
    RoundOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// A single oscillator note
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    pub effect: SoundEffect,
    pub waveform: Waveform,
    /// Hz
    pub frequency: f32,
    /// 0..1 after volume scaling
    pub gain: f32,
    /// Seconds
    pub duration: f32,
}

/// A tone scheduled relative to the event that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cue {
    /// Seconds after the triggering event
    pub offset: f32,
    pub tone: Tone,
}

fn cue(offset: f32, effect: SoundEffect, waveform: Waveform, frequency: f32, gain: f32, duration: f32) -> Cue {
    Cue {
        offset,
        tone: Tone {
            effect,
            waveform,
            frequency,
            gain,
            duration,
        },
    }
}

/// Evenly spaced notes
fn sequence(effect: SoundEffect, waveform: Waveform, notes: &[f32], spacing: f32, gain: f32, duration: f32) -> Vec<Cue> {
    notes
        .iter()
        .enumerate()
        .map(|(i, &freq)| cue(i as f32 * spacing, effect, waveform, freq, gain, duration))
        .collect()
}

/// Unscaled cues for one event
pub fn cues_for(event: &GameEvent) -> Vec<Cue> {
    use SoundEffect as S;
    use Waveform as W;

    match event {
        GameEvent::PaddleHit { edge_hit, momentum, .. } => {
            // Faster paddles thump harder
            let gain = (0.45 + 0.25 * (momentum - 1.0)).min(0.8);
            let mut cues = vec![cue(0.0, S::PaddleHit, W::Sine, 150.0, gain, 0.12)];
            if *edge_hit {
                cues.push(cue(0.02, S::EdgeHit, W::Triangle, 620.0, 0.3, 0.08));
            }
            cues
        }
        GameEvent::SpecialHit { .. } => vec![
            cue(0.0, S::SpecialHit, W::Triangle, 220.0, 0.5, 0.15),
            cue(0.05, S::SpecialHit, W::Sine, 330.0, 0.35, 0.15),
        ],
        GameEvent::SpecialSpawned { .. } => sequence(S::SpecialSpawn, W::Sine, &[196.0, 294.0], 0.12, 0.35, 0.25),
        GameEvent::SpecialStateChanged {
            state: SpecialState::ForceCapture,
        } => sequence(S::ForceCapture, W::Sawtooth, &[300.0, 400.0, 500.0, 600.0], 0.04, 0.2, 0.06),
        GameEvent::SpecialStateChanged { .. } => Vec::new(),
        GameEvent::PowerUpCollected { kind, .. } => {
            if kind.is_negative() {
                sequence(S::PowerUpCollect, W::Square, &[392.0, 311.0], 0.07, 0.3, 0.1)
            } else {
                sequence(S::PowerUpCollect, W::Sine, &[523.0, 659.0, 784.0], 0.06, 0.4, 0.1)
            }
        }
        GameEvent::PowerUpDenied { .. } => vec![cue(0.0, S::PowerUpDenied, W::Square, 180.0, 0.25, 0.12)],
        GameEvent::EffectExpired { .. } => vec![cue(0.0, S::EffectExpire, W::Triangle, 260.0, 0.2, 0.1)],
        GameEvent::RingSwitchOk { .. } => vec![cue(0.0, S::RingSwitch, W::Sine, 440.0, 0.25, 0.08)],
        GameEvent::RingSwitchBlocked { .. } => vec![cue(0.0, S::RingSwitchBlocked, W::Square, 110.0, 0.3, 0.1)],
        GameEvent::PaddleCollision { intensity, .. } => {
            vec![cue(0.0, S::PaddleBump, W::Sine, 90.0, 0.5 * intensity.clamp(0.1, 1.0), 0.1)]
        }
        GameEvent::NearMiss { .. } => vec![cue(0.0, S::NearMiss, W::Sine, 880.0, 0.2, 0.06)],
        GameEvent::BallEscaped { .. } => vec![cue(0.0, S::BallLost, W::Sine, 120.0, 0.2, 0.2)],
        GameEvent::BallCaptured { .. } => {
            sequence(S::Capture, W::Triangle, &[523.0, 659.0, 784.0, 1047.0], 0.08, 0.5, 0.18)
        }
        GameEvent::ComboMilestone { level } => {
            // Longer arpeggio for higher milestones
            let notes = [440.0, 554.0, 659.0, 880.0, 1109.0, 1319.0];
            let count = (2 + (*level as usize / 10)).min(notes.len());
            sequence(S::ComboMilestone, W::Sine, &notes[..count], 0.07, 0.4, 0.12)
        }
        GameEvent::SpecialEscaped => vec![cue(0.0, S::BallLost, W::Sawtooth, 100.0, 0.4, 0.4)],
        GameEvent::RoundEnded { .. } => sequence(S::RoundOver, W::Triangle, &[392.0, 330.0, 262.0, 196.0], 0.15, 0.45, 0.3),
    }
}

#[derive(Debug, Clone)]
struct Pending {
    due: f32,
    seq: u64,
    tone: Tone,
}

/// Timed cue queue with master/sfx volume applied
#[derive(Debug, Clone)]
pub struct CueQueue {
    pending: Vec<Pending>,
    clock: f32,
    seq: u64,
    volume: f32,
}

impl Default for CueQueue {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl CueQueue {
    pub fn new(volume: f32) -> Self {
        Self {
            pending: Vec::new(),
            clock: 0.0,
            seq: 0,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    pub fn from_settings(settings: &MatchSettings) -> Self {
        Self::new(settings.effective_volume())
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Queue cues for a batch of events, relative to the current clock
    pub fn push_events(&mut self, events: &[GameEvent]) {
        if self.volume <= 0.0 {
            return;
        }
        for event in events {
            for cue in cues_for(event) {
                let mut tone = cue.tone;
                tone.gain = (tone.gain * self.volume).clamp(0.0, 1.0);
                self.pending.push(Pending {
                    due: self.clock + cue.offset,
                    seq: self.seq,
                    tone,
                });
                self.seq += 1;
            }
        }
    }

    /// Advance the clock and release every tone now due, in schedule order
    pub fn drain_due(&mut self, dt: f32) -> Vec<Tone> {
        self.clock += dt.max(0.0);
        let clock = self.clock;
        let (mut due, rest): (Vec<Pending>, Vec<Pending>) =
            self.pending.drain(..).partition(|p| p.due <= clock);
        self.pending = rest;
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|p| p.tone).collect()
    }

    /// Drop everything still waiting
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::RoundStats;

    #[test]
    fn test_edge_hit_adds_ping() {
        let plain = GameEvent::PaddleHit {
            paddle: 1,
            ball: 2,
            edge_hit: false,
            momentum: 1.0,
            points: 10,
        };
        let edge = GameEvent::PaddleHit {
            paddle: 1,
            ball: 2,
            edge_hit: true,
            momentum: 1.0,
            points: 10,
        };
        assert_eq!(cues_for(&plain).len(), 1);
        assert_eq!(cues_for(&edge).len(), 2);
    }

    #[test]
    fn test_sequences_released_over_time() {
        let mut queue = CueQueue::new(1.0);
        queue.push_events(&[GameEvent::BallCaptured { bonus: 60 }]);
        assert_eq!(queue.len(), 4);

        let first = queue.drain_due(0.0);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].frequency, 523.0);

        let next = queue.drain_due(0.1);
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].frequency, 659.0);

        let rest = queue.drain_due(1.0);
        assert_eq!(rest.iter().map(|t| t.frequency).collect::<Vec<_>>(), vec![784.0, 1047.0]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_muted_queue_stays_empty() {
        let settings = MatchSettings {
            muted: true,
            ..MatchSettings::default()
        };
        let mut queue = CueQueue::from_settings(&settings);
        queue.push_events(&[GameEvent::RoundEnded {
            score: 10,
            stats: RoundStats::default(),
        }]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_volume_scales_gain() {
        let mut queue = CueQueue::new(0.5);
        queue.push_events(&[GameEvent::NearMiss {
            ball: 1,
            paddle: 1,
            bonus: 3,
        }]);
        let tones = queue.drain_due(0.0);
        assert!((tones[0].gain - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_bigger_milestones_play_longer() {
        let small = cues_for(&GameEvent::ComboMilestone { level: 5 });
        let big = cues_for(&GameEvent::ComboMilestone { level: 35 });
        assert!(big.len() > small.len());
    }
}
