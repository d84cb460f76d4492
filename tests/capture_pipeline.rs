// End-to-end capture pipeline tests
// Scripted audio input driving detector -> dataset -> spectrogram ->
// classifier -> MIDI, with persistence verified on disk

use hitbox::{
    AudioInput, Classifier, Dataset, MidiMap, MidiTrigger, Session, SessionConfig, Spectrogram,
    WriterSink,
};

/// Serves queued chunks, zero-padding to each requested size, and records
/// every read size the detector issues.
struct ScriptedInput {
    chunks: Vec<Vec<i16>>,
    next: usize,
    reads: std::rc::Rc<std::cell::RefCell<Vec<usize>>>,
}

impl AudioInput for ScriptedInput {
    fn read(&mut self, n: usize) -> (Vec<i16>, Vec<u8>) {
        self.reads.borrow_mut().push(n);
        let mut wave = if self.next < self.chunks.len() {
            let chunk = self.chunks[self.next].clone();
            self.next += 1;
            chunk
        } else {
            Vec::new()
        };
        wave.resize(n, 0);
        let raw = hitbox::audio::samples_to_bytes(&wave);
        (wave, raw)
    }
}

struct FirstBandClassifier;

impl Classifier for FirstBandClassifier {
    fn classify(&self, spectrogram: &Spectrogram) -> usize {
        // Stand-in for a trained model; only the shape contract matters here
        assert_eq!(spectrogram.shape(), (100, 100));
        0
    }
}

fn chunk_with_peak(peak: i16) -> Vec<i16> {
    let mut chunk = vec![0i16; 128];
    chunk[64] = peak;
    chunk
}

fn pipeline_config() -> SessionConfig {
    let mut config = SessionConfig::default();
    config.detector.threshold = 5000;
    config.detector.detection_sample_size = 128;
    config.detector.recording_length = 4096;
    config
}

#[test]
fn loud_event_flows_from_device_to_disk_and_midi() {
    let root = tempfile::tempdir().unwrap();
    let dataset = Dataset::create(root.path(), "live").unwrap();

    let reads = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let input = ScriptedInput {
        chunks: vec![chunk_with_peak(6000), vec![1200; 4096]],
        next: 0,
        reads: std::rc::Rc::clone(&reads),
    };

    let mut session = Session::new(input, dataset, pipeline_config());
    session.set_classifier(Box::new(FirstBandClassifier));

    let map = MidiMap::new(vec![MidiTrigger {
        channel: 0,
        note: 36,
        velocity: 100,
    }]);
    session.set_midi_sink(Box::new(WriterSink::new(map, SharedBuffer::default())));

    let outcome = session.tick().unwrap().expect("capture expected");

    // Detection read then a fresh full-length capture read
    assert_eq!(*reads.borrow(), vec![128, 4096]);
    assert_eq!(outcome.peak, 6000);
    assert_eq!(outcome.class, Some(0));

    // Persisted under the default label with id 1
    assert!(root.path().join("live/default/1.wav").is_file());

    // Note-on and note-off both left the sink
    assert_eq!(
        SHARED_BYTES.with(|b| b.borrow().clone()),
        vec![0x90, 36, 100, 0x80, 36, 0]
    );
}

#[test]
fn quiet_event_issues_no_capture_read() {
    let root = tempfile::tempdir().unwrap();
    let dataset = Dataset::create(root.path(), "live").unwrap();

    let reads = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let input = ScriptedInput {
        chunks: vec![chunk_with_peak(3000)],
        next: 0,
        reads: std::rc::Rc::clone(&reads),
    };

    let mut session = Session::new(input, dataset, pipeline_config());
    assert!(session.tick().unwrap().is_none());

    assert_eq!(*reads.borrow(), vec![128]);
    assert!(session.dataset().is_empty());
    assert!(!root.path().join("live/default/1.wav").exists());
}

#[test]
fn captured_sample_reloads_with_correct_spectrogram_shape() {
    let root = tempfile::tempdir().unwrap();
    let dataset = Dataset::create(root.path(), "live").unwrap();

    let input = ScriptedInput {
        chunks: vec![chunk_with_peak(9000), vec![800; 4096]],
        next: 0,
        reads: Default::default(),
    };

    let config = pipeline_config();
    let spectrogram_config = config.spectrogram.clone();
    let sample_rate = config.audio.sample_rate;

    let mut session = Session::new(input, dataset, config);
    session.tick().unwrap().expect("capture expected");
    drop(session);

    let mut reloaded = Dataset::load(root.path(), "live").unwrap();
    assert_eq!(reloaded.count_for("default"), Some(1));

    let sample = reloaded.get_sample_mut("default", 0).unwrap();
    assert_eq!(sample.wave().len(), 4096);
    let spectrogram = sample.spectrogram(&spectrogram_config, sample_rate);
    assert_eq!(spectrogram.shape(), (100, 100));
    assert!(spectrogram.values().iter().all(|&v| (20.0..=240.0).contains(&v)));
}

// Thread-local capture buffer so the WriterSink's bytes can be inspected
// after ownership moves into the session
thread_local! {
    static SHARED_BYTES: std::cell::RefCell<Vec<u8>> = const { std::cell::RefCell::new(Vec::new()) };
}

#[derive(Default)]
struct SharedBuffer;

impl std::io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        SHARED_BYTES.with(|b| b.borrow_mut().extend_from_slice(buf));
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
