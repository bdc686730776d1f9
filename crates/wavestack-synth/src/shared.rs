//! Cross-thread control of a [`Synth`].
//!
//! [`Synth::split`] hands out two halves:
//!
//! - [`SynthController`] lives on the control thread. It writes scalar
//!   parameters into lock-free atomics, queues note events and publishes
//!   rebuilt table banks.
//! - [`SynthRenderer`] lives on the audio thread and owns the engine. At the
//!   start of every block it picks up a new table bank, re-reads the
//!   parameters if their generation changed, and drains queued events.
//!
//! # Thread Safety
//!
//! - **Parameters**: `AtomicU32` (f32 bits), `AtomicUsize`, `AtomicBool`,
//!   plus an `AtomicU64` generation bumped after every write.
//! - **Note events**: bounded `crossbeam_channel`; the audio side only uses
//!   `try_recv`, the control side `try_send`. Hold travels in this queue
//!   too, so it takes effect in order with the note-offs around it.
//! - **Table bank**: `ArcSwap<TableBank>`. The renderer swaps its table
//!   references between blocks, never mid-block, and sends the bank it
//!   stopped using back over a second channel. The controller drops it, so
//!   the audio thread never frees table memory.
//!
//! The renderer neither logs nor allocates. Notes it had to drop are
//! counted in [`SharedParams::dropped_notes`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};

use arc_swap::ArcSwap;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use wavestack_core::{TableBank, TableError, Waveshape};

use crate::allocator::NoteOn;
use crate::engine::Synth;
use crate::mixer::MAX_STACKS;
use crate::stack::StackSettings;

/// Capacity of the control-to-audio event queue.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Retired table banks the renderer can hand back before the controller
/// collects them. While full, the renderer keeps playing its current bank.
const RETIRED_QUEUE_CAPACITY: usize = 4;

/// Discrete event sent from the control thread to the audio thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Start a key.
    NoteOn(u8),
    /// Stop a key.
    NoteOff(u8),
    /// Free every slot.
    AllNotesOff,
    /// Move every oscillator phase to zero.
    ResetPhases,
    /// Randomise every oscillator phase.
    RandomisePhases,
    /// Turn hold on or off.
    SetHold(bool),
}

/// Atomic mirror of one stack's [`StackSettings`].
struct StackParams {
    enabled: AtomicBool,
    waveshape: AtomicUsize,
    voices: AtomicUsize,
    detune: AtomicU32,
    amplitude: AtomicU32,
}

impl StackParams {
    fn new(settings: &StackSettings) -> Self {
        Self {
            enabled: AtomicBool::new(settings.enabled),
            waveshape: AtomicUsize::new(settings.waveshape.index()),
            voices: AtomicUsize::new(settings.voices),
            detune: AtomicU32::new(settings.detune.to_bits()),
            amplitude: AtomicU32::new(settings.amplitude.to_bits()),
        }
    }

    fn load(&self) -> StackSettings {
        StackSettings {
            enabled: self.enabled.load(Ordering::Relaxed),
            waveshape: Waveshape::from_index(self.waveshape.load(Ordering::Relaxed))
                .unwrap_or_default(),
            voices: self.voices.load(Ordering::Relaxed),
            detune: f32::from_bits(self.detune.load(Ordering::Relaxed)),
            amplitude: f32::from_bits(self.amplitude.load(Ordering::Relaxed)),
        }
    }
}

/// Scalar parameters shared between [`SynthController`] and [`SynthRenderer`].
///
/// Writers store the value, then bump the generation with `Release`;
/// the reader loads the generation with `Acquire` before reading values,
/// so a changed generation always exposes the write that caused it.
pub struct SharedParams {
    stacks: [StackParams; MAX_STACKS],
    stack_count: AtomicUsize,
    master_amplitude: AtomicU32,
    hold: AtomicBool,
    generation: AtomicU64,
    dropped_notes: AtomicU64,
}

impl SharedParams {
    fn from_synth<const N: usize>(synth: &Synth<N>) -> Self {
        Self {
            stacks: core::array::from_fn(|i| {
                StackParams::new(&synth.stack_settings(i).unwrap_or_default())
            }),
            stack_count: AtomicUsize::new(synth.stack_count()),
            master_amplitude: AtomicU32::new(synth.master_amplitude().to_bits()),
            hold: AtomicBool::new(synth.hold()),
            generation: AtomicU64::new(0),
            dropped_notes: AtomicU64::new(0),
        }
    }

    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// Number of parameter writes so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Snapshot of stack `stack`'s settings.
    pub fn stack(&self, stack: usize) -> Option<StackSettings> {
        self.stacks.get(stack).map(StackParams::load)
    }

    /// Number of contributing stacks.
    pub fn stack_count(&self) -> usize {
        self.stack_count.load(Ordering::Relaxed)
    }

    /// Master amplitude.
    pub fn master_amplitude(&self) -> f32 {
        f32::from_bits(self.master_amplitude.load(Ordering::Relaxed))
    }

    /// Whether hold is on, as last queued by the controller.
    pub fn hold(&self) -> bool {
        self.hold.load(Ordering::Relaxed)
    }

    /// Note-ons the renderer dropped (no free slot) or rejected (bad key).
    pub fn dropped_notes(&self) -> u64 {
        self.dropped_notes.load(Ordering::Relaxed)
    }
}

/// Control-thread half of a split [`Synth`].
///
/// Cheap to clone; every clone talks to the same renderer.
#[derive(Clone)]
pub struct SynthController {
    params: Arc<SharedParams>,
    events: Sender<ControlEvent>,
    bank: Arc<ArcSwap<TableBank>>,
    retired: Receiver<Arc<TableBank>>,
}

impl SynthController {
    /// Shared parameter store.
    pub fn params(&self) -> &SharedParams {
        &self.params
    }

    /// Table bank the renderer will play from its next block on.
    pub fn bank(&self) -> Arc<TableBank> {
        self.bank.load_full()
    }

    fn send(&self, event: ControlEvent) -> bool {
        match self.events.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!(?event, "control event queue full, event dropped");
                false
            }
            Err(TrySendError::Disconnected(event)) => {
                tracing::debug!(?event, "renderer gone, event dropped");
                false
            }
        }
    }

    /// Queue a note-on. Returns `false` if the queue is full or the renderer is gone.
    pub fn note_on(&self, key: u8) -> bool {
        self.send(ControlEvent::NoteOn(key))
    }

    /// Queue a note-off.
    pub fn note_off(&self, key: u8) -> bool {
        self.send(ControlEvent::NoteOff(key))
    }

    /// Queue an all-notes-off.
    pub fn all_notes_off(&self) -> bool {
        self.send(ControlEvent::AllNotesOff)
    }

    /// Queue a phase reset of every oscillator.
    pub fn reset_phases(&self) -> bool {
        self.send(ControlEvent::ResetPhases)
    }

    /// Queue a phase randomisation of every oscillator.
    pub fn randomise_phases(&self) -> bool {
        self.send(ControlEvent::RandomisePhases)
    }

    fn with_stack(&self, stack: usize, write: impl FnOnce(&StackParams)) -> bool {
        let Some(params) = self.params.stacks.get(stack) else {
            return false;
        };
        write(params);
        self.params.bump();
        true
    }

    /// Set the waveshape of `stack`. Returns `false` if `stack` is out of range.
    pub fn set_waveshape(&self, stack: usize, shape: Waveshape) -> bool {
        tracing::debug!(stack, %shape, "set waveshape");
        self.with_stack(stack, |p| p.waveshape.store(shape.index(), Ordering::Relaxed))
    }

    /// Set the unison voice count of `stack`.
    pub fn set_voices(&self, stack: usize, voices: usize) -> bool {
        tracing::debug!(stack, voices, "set voices");
        self.with_stack(stack, |p| p.voices.store(voices, Ordering::Relaxed))
    }

    /// Set the detune of `stack` in percent.
    pub fn set_detune(&self, stack: usize, detune: f32) -> bool {
        tracing::debug!(stack, detune, "set detune");
        self.with_stack(stack, |p| p.detune.store(detune.to_bits(), Ordering::Relaxed))
    }

    /// Set the amplitude of `stack`.
    pub fn set_amplitude(&self, stack: usize, amplitude: f32) -> bool {
        tracing::debug!(stack, amplitude, "set amplitude");
        self.with_stack(stack, |p| {
            p.amplitude.store(amplitude.to_bits(), Ordering::Relaxed)
        })
    }

    /// Enable or disable `stack`.
    pub fn set_enabled(&self, stack: usize, enabled: bool) -> bool {
        tracing::debug!(stack, enabled, "set enabled");
        self.with_stack(stack, |p| p.enabled.store(enabled, Ordering::Relaxed))
    }

    /// Apply a full settings snapshot to `stack`.
    pub fn set_stack(&self, stack: usize, settings: &StackSettings) -> bool {
        tracing::debug!(stack, ?settings, "set stack");
        self.with_stack(stack, |p| {
            p.enabled.store(settings.enabled, Ordering::Relaxed);
            p.waveshape.store(settings.waveshape.index(), Ordering::Relaxed);
            p.voices.store(settings.voices, Ordering::Relaxed);
            p.detune.store(settings.detune.to_bits(), Ordering::Relaxed);
            p.amplitude.store(settings.amplitude.to_bits(), Ordering::Relaxed);
        })
    }

    /// Set the number of contributing stacks.
    pub fn set_stack_count(&self, count: usize) {
        tracing::debug!(count, "set stack count");
        self.params.stack_count.store(count, Ordering::Relaxed);
        self.params.bump();
    }

    /// Set the master amplitude.
    pub fn set_master_amplitude(&self, amplitude: f32) {
        tracing::debug!(amplitude, "set master amplitude");
        self.params
            .master_amplitude
            .store(amplitude.to_bits(), Ordering::Relaxed);
        self.params.bump();
    }

    /// Queue a hold change.
    ///
    /// Hold is ordered with the note events: a note-off queued before
    /// `set_hold(true)` still releases its key.
    pub fn set_hold(&self, hold: bool) -> bool {
        tracing::debug!(hold, "set hold");
        let sent = self.send(ControlEvent::SetHold(hold));
        if sent {
            self.params.hold.store(hold, Ordering::Relaxed);
        }
        sent
    }

    /// Drop the table banks the renderer has stopped using.
    ///
    /// Returns how many were freed. Also called by
    /// [`rebuild_tables`](Self::rebuild_tables).
    pub fn release_retired_banks(&self) -> usize {
        let mut released = 0;
        while let Ok(bank) = self.retired.try_recv() {
            drop(bank);
            released += 1;
        }
        if released > 0 {
            tracing::debug!(released, "freed retired table banks");
        }
        released
    }

    /// Build a new table bank for `base_frequency` and publish it.
    ///
    /// Runs on the calling thread; the renderer switches to the new
    /// tables at its next block.
    pub fn rebuild_tables(&self, base_frequency: f64) -> Result<(), TableError> {
        self.release_retired_banks();
        let sample_rate = self.bank.load().sample_rate();
        let bank = TableBank::build(base_frequency, sample_rate)?;
        self.bank.store(Arc::new(bank));
        tracing::debug!(base_frequency, sample_rate, "published rebuilt table bank");
        Ok(())
    }
}

/// Audio-thread half of a split [`Synth`].
pub struct SynthRenderer<const N: usize> {
    synth: Synth<N>,
    params: Arc<SharedParams>,
    events: Receiver<ControlEvent>,
    bank: Arc<ArcSwap<TableBank>>,
    retired: Sender<Arc<TableBank>>,
    retiring: Option<Arc<TableBank>>,
    seen_generation: u64,
}

impl<const N: usize> SynthRenderer<N> {
    /// Engine state as of the last rendered block.
    pub fn synth(&self) -> &Synth<N> {
        &self.synth
    }

    /// Pick up new tables, parameters and events.
    ///
    /// Called by [`render`](Self::render) and
    /// [`render_interleaved`](Self::render_interleaved); never blocks.
    pub fn sync(&mut self) {
        // A new bank is only taken once the previous one has been handed back.
        self.hand_back_retired();
        if self.retiring.is_none() {
            let bank = self.bank.load();
            if !Arc::ptr_eq(&*bank, self.synth.bank()) {
                self.retiring = Some(self.synth.replace_bank(Arc::clone(&*bank)));
                self.hand_back_retired();
            }
        }

        let generation = self.params.generation();
        if generation != self.seen_generation {
            self.seen_generation = generation;
            self.apply_params();
        }

        while let Ok(event) = self.events.try_recv() {
            self.apply_event(event);
        }
    }

    fn hand_back_retired(&mut self) {
        let Some(bank) = self.retiring.take() else {
            return;
        };
        match self.retired.try_send(bank) {
            Ok(()) => {}
            Err(TrySendError::Full(bank)) => self.retiring = Some(bank),
            // Every controller is gone; nobody else can free it.
            Err(TrySendError::Disconnected(bank)) => drop(bank),
        }
    }

    fn apply_params(&mut self) {
        for stack in 0..MAX_STACKS {
            if let Some(settings) = self.params.stack(stack) {
                self.synth.apply_stack_settings(stack, &settings);
            }
        }
        self.synth.set_stack_count(self.params.stack_count());
        self.synth.set_master_amplitude(self.params.master_amplitude());
    }

    fn apply_event(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::NoteOn(key) => {
                if let NoteOn::Dropped | NoteOn::Rejected = self.synth.note_on(key) {
                    self.params.dropped_notes.fetch_add(1, Ordering::Relaxed);
                }
            }
            ControlEvent::NoteOff(key) => {
                self.synth.note_off(key);
            }
            ControlEvent::AllNotesOff => self.synth.all_notes_off(),
            ControlEvent::ResetPhases => self.synth.reset_phases(),
            ControlEvent::RandomisePhases => self.synth.randomise_phases(),
            ControlEvent::SetHold(hold) => self.synth.set_hold(hold),
        }
    }

    /// Sync, then fill `output` with consecutive samples.
    pub fn render(&mut self, output: &mut [f32]) {
        self.sync();
        self.synth.render(output);
    }

    /// Sync, then fill interleaved `output` across `channels`.
    pub fn render_interleaved(&mut self, output: &mut [f32], channels: usize) {
        self.sync();
        self.synth.render_interleaved(output, channels);
    }
}

impl<const N: usize> Synth<N> {
    /// Split into a control half and an audio half.
    ///
    /// The current parameters and table bank become the shared starting
    /// state. Held notes keep sounding.
    pub fn split(self) -> (SynthController, SynthRenderer<N>) {
        let params = Arc::new(SharedParams::from_synth(&self));
        let bank = Arc::new(ArcSwap::new(Arc::clone(self.bank())));
        let (tx, rx) = crossbeam_channel::bounded(EVENT_QUEUE_CAPACITY);
        let (retired_tx, retired_rx) = crossbeam_channel::bounded(RETIRED_QUEUE_CAPACITY);

        let controller = SynthController {
            params: Arc::clone(&params),
            events: tx,
            bank: Arc::clone(&bank),
            retired: retired_rx,
        };
        let renderer = SynthRenderer {
            synth: self,
            params,
            events: rx,
            bank,
            retired: retired_tx,
            retiring: None,
            seen_generation: 0,
        };
        (controller, renderer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DEFAULT_SAMPLE_RATE;

    fn split() -> (SynthController, SynthRenderer<8>) {
        let synth: Synth<8> = Synth::with_defaults(DEFAULT_SAMPLE_RATE).unwrap();
        synth.split()
    }

    #[test]
    fn test_events_applied_on_render() {
        let (ctrl, mut renderer) = split();
        assert!(ctrl.note_on(69));
        assert!(renderer.synth().allocator().is_empty());

        let mut block = [0.0f32; 64];
        renderer.render(&mut block);
        assert_eq!(renderer.synth().allocator().slot_of(69), Some(0));
        assert!(block.iter().any(|&s| s != 0.0));

        ctrl.note_off(69);
        renderer.render(&mut block);
        assert!(renderer.synth().allocator().is_empty());
        assert!(block.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_params_applied_once_per_generation() {
        let (ctrl, mut renderer) = split();
        let before = ctrl.params().generation();
        ctrl.set_voices(0, 4);
        ctrl.set_detune(0, 25.0);
        ctrl.set_waveshape(0, Waveshape::Square);
        assert_eq!(ctrl.params().generation(), before + 3);

        renderer.sync();
        let settings = renderer.synth().stack_settings(0).unwrap();
        assert_eq!(settings.voices, 4);
        assert_eq!(settings.detune, 25.0);
        assert_eq!(settings.waveshape, Waveshape::Square);
    }

    #[test]
    fn test_out_of_range_values_clamped_by_renderer() {
        let (ctrl, mut renderer) = split();
        ctrl.set_voices(0, 50);
        ctrl.set_master_amplitude(3.0);
        ctrl.set_stack_count(9);
        assert!(!ctrl.set_voices(MAX_STACKS, 2));

        renderer.sync();
        let synth = renderer.synth();
        assert_eq!(synth.stack_settings(0).unwrap().voices, 8);
        assert_eq!(synth.master_amplitude(), crate::mixer::MAX_MASTER_AMPLITUDE);
        assert_eq!(synth.stack_count(), MAX_STACKS);
    }

    #[test]
    fn test_hold_through_controller() {
        let (ctrl, mut renderer) = split();
        ctrl.set_hold(true);
        ctrl.note_on(60);
        ctrl.note_off(60);
        renderer.sync();
        assert_eq!(renderer.synth().allocator().slot_of(60), Some(0));

        ctrl.set_hold(false);
        renderer.sync();
        assert!(renderer.synth().allocator().is_empty());
    }

    #[test]
    fn test_note_off_before_hold_releases() {
        let (ctrl, mut renderer) = split();
        let mut block = [0.0f32; 64];
        ctrl.note_on(60);
        renderer.render(&mut block);

        ctrl.note_off(60);
        assert!(ctrl.set_hold(true));
        renderer.render(&mut block);

        assert_eq!(renderer.synth().allocator().slot_of(60), None);
        assert!(renderer.synth().hold());
        assert!(block.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_hold_does_not_bump_generation() {
        let (ctrl, _renderer) = split();
        let before = ctrl.params().generation();
        ctrl.set_hold(true);
        assert_eq!(ctrl.params().generation(), before);
        assert!(ctrl.params().hold());
    }

    #[test]
    fn test_dropped_notes_counted() {
        let (ctrl, mut renderer) = split();
        for key in 60..69 {
            ctrl.note_on(key);
        }
        ctrl.note_on(200);
        renderer.sync();
        assert_eq!(ctrl.params().dropped_notes(), 2);
    }

    #[test]
    fn test_retired_bank_handed_back() {
        let (ctrl, mut renderer) = split();
        let old = ctrl.bank();
        ctrl.rebuild_tables(40.0).unwrap();
        renderer.sync();

        // Parked in the retired queue until the controller collects it.
        drop(renderer);
        assert_eq!(Arc::strong_count(&old), 2);
        assert_eq!(ctrl.release_retired_banks(), 1);
        assert_eq!(Arc::strong_count(&old), 1);
    }

    #[test]
    fn test_rebuilt_bank_swapped_between_blocks() {
        let (ctrl, mut renderer) = split();
        let old = ctrl.bank();
        ctrl.rebuild_tables(40.0).unwrap();
        assert!(Arc::ptr_eq(renderer.synth().bank(), &old));

        renderer.sync();
        assert!(!Arc::ptr_eq(renderer.synth().bank(), &old));
        assert_eq!(renderer.synth().bank().base_frequency(), 40.0);
    }

    #[test]
    fn test_rebuild_rejects_bad_base() {
        let (ctrl, _renderer) = split();
        assert!(ctrl.rebuild_tables(-1.0).is_err());
        assert_eq!(ctrl.bank().base_frequency(), 20.0);
    }

    #[test]
    fn test_full_queue_reports_drop() {
        let (ctrl, _renderer) = split();
        for _ in 0..EVENT_QUEUE_CAPACITY {
            assert!(ctrl.reset_phases());
        }
        assert!(!ctrl.note_on(60));
    }

    #[test]
    fn test_disconnected_renderer() {
        let (ctrl, renderer) = split();
        drop(renderer);
        assert!(!ctrl.note_on(60));
    }

    #[test]
    fn test_renderer_moves_to_thread() {
        let (ctrl, mut renderer) = split();
        ctrl.note_on(69);
        let handle = std::thread::spawn(move || {
            let mut block = [0.0f32; 256];
            renderer.render(&mut block);
            block.iter().any(|&s| s != 0.0)
        });
        assert!(handle.join().unwrap());
    }
}
