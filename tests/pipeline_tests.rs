//! End-to-end pipeline tests: mock source → windowing → mock classifier →
//! hysteresis control → bus → feed server, all over the in-memory bus.

use adhop::app::App;
use adhop::audio::source::MockAudioSource;
use adhop::bus::{Bus, MemoryBus};
use adhop::classify::classifier::{Label, MockClassifier};
use adhop::config::{AudioConfig, Config, HubConfig};
use adhop::control::state_machine::ControlState;
use adhop::control::tuner::MockTuner;
use adhop::defaults;
use adhop::protocol::{ClassificationMessage, Feed, StateMessage, SubscribeRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

const PRIMARY: f64 = 100.304e6;
const SECONDARY: f64 = 104.5e6;

/// Small units so tests assemble windows quickly: 100-sample batches,
/// 1000-sample (10-batch) windows.
fn test_config() -> Config {
    Config {
        audio: AudioConfig {
            sample_rate: 1000,
            batch_ms: 100,
            window_secs: 1,
        },
        hub: HubConfig {
            listen: "127.0.0.1:0".to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// A source scripted to produce `windows` windows worth of batches, with
/// `lead_in_empties` empty reads first (each costs one poll interval) so
/// consumers have time to attach. Stays live afterwards.
fn scripted_source(windows: usize, lead_in_empties: usize) -> MockAudioSource {
    let mut reads = vec![Vec::new(); lead_in_empties];
    for _ in 0..windows * 10 {
        reads.push(vec![0.25f32; 100]);
    }
    MockAudioSource::new().as_live_source().with_reads(reads)
}

async fn recv_json<T>(sub: &mut Box<dyn adhop::bus::BusSubscriber>) -> T
where
    T: serde::de::DeserializeOwned,
{
    let payload = tokio::time::timeout(Duration::from_secs(5), sub.next())
        .await
        .expect("bus message expected")
        .expect("bus channel open");
    serde_json::from_slice(&payload).expect("valid JSON payload")
}

#[tokio::test]
async fn full_pipeline_hops_on_ads_and_returns() {
    let bus = Arc::new(MemoryBus::new());
    // Pre-made subscriptions see everything the pipeline publishes.
    let mut classifier_sub = bus.subscribe(defaults::CHANNEL_CLASSIFIER).await.unwrap();
    let mut state_sub = bus.subscribe(defaults::CHANNEL_STATE).await.unwrap();

    let tuner = MockTuner::new();
    let classifier = MockClassifier::new("scripted")
        .with_script([Label::Song, Label::Ad, Label::Ad, Label::Ad, Label::Ad]);

    let app = App::new(test_config()).quiet();
    let handle = app
        .start(
            bus.clone(),
            Box::new(scripted_source(5, 0)),
            Arc::new(classifier),
            Arc::new(tuner.clone()),
        )
        .await
        .unwrap();

    // Five windows, five classifications, in order.
    let labels: Vec<Label> = [
        recv_json::<ClassificationMessage>(&mut classifier_sub).await,
        recv_json::<ClassificationMessage>(&mut classifier_sub).await,
        recv_json::<ClassificationMessage>(&mut classifier_sub).await,
        recv_json::<ClassificationMessage>(&mut classifier_sub).await,
        recv_json::<ClassificationMessage>(&mut classifier_sub).await,
    ]
    .iter()
    .map(|m| m.label)
    .collect();
    assert_eq!(
        labels,
        vec![Label::Song, Label::Ad, Label::Ad, Label::Ad, Label::Ad]
    );

    // Four state changes: song is a no-op, each ad advances the machine.
    let states: Vec<StateMessage> = vec![
        recv_json(&mut state_sub).await,
        recv_json(&mut state_sub).await,
        recv_json(&mut state_sub).await,
        recv_json(&mut state_sub).await,
    ];
    assert_eq!(
        states.iter().map(|s| s.state).collect::<Vec<_>>(),
        vec![
            ControlState::PatienceFromPrimary,
            ControlState::Secondary,
            ControlState::PatienceFromSecondary,
            ControlState::Primary,
        ]
    );
    assert_eq!(
        states.iter().map(|s| s.station).collect::<Vec<_>>(),
        vec![PRIMARY, SECONDARY, SECONDARY, PRIMARY]
    );

    // Exactly two station hops: out during the ad break, back after it.
    assert_eq!(tuner.retunes(), vec![SECONDARY, PRIMARY]);

    tokio::time::timeout(Duration::from_secs(5), handle.stop())
        .await
        .expect("pipeline should stop promptly");
}

#[tokio::test]
async fn steady_song_stream_never_touches_the_tuner() {
    let bus = Arc::new(MemoryBus::new());
    let mut classifier_sub = bus.subscribe(defaults::CHANNEL_CLASSIFIER).await.unwrap();
    let mut state_sub = bus.subscribe(defaults::CHANNEL_STATE).await.unwrap();

    let tuner = MockTuner::new();
    let app = App::new(test_config()).quiet();
    let handle = app
        .start(
            bus.clone(),
            Box::new(scripted_source(3, 0)),
            Arc::new(MockClassifier::new("all-song")),
            Arc::new(tuner.clone()),
        )
        .await
        .unwrap();

    // Classifications flow...
    for _ in 0..3 {
        let msg: ClassificationMessage = recv_json(&mut classifier_sub).await;
        assert_eq!(msg.label, Label::Song);
    }

    // ...but the state channel stays silent and the tuner untouched.
    let nothing = tokio::time::timeout(Duration::from_millis(200), state_sub.next()).await;
    assert!(nothing.is_err(), "no state change expected on steady songs");
    assert!(tuner.retunes().is_empty());

    handle.stop().await;
}

async fn connect_feed(addr: std::net::SocketAddr, feed: Feed) -> TcpStream {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let line = format!("{}\n", SubscribeRequest { feed }.to_json().unwrap());
    stream.write_all(line.as_bytes()).await.unwrap();
    stream
}

#[tokio::test]
async fn live_consumers_receive_all_three_feeds() {
    let bus = Arc::new(MemoryBus::new());
    let tuner = MockTuner::new();
    let classifier = MockClassifier::new("scripted").with_script([Label::Ad, Label::Ad]);

    let app = App::new(test_config()).quiet();
    // 30 empty lead-in reads ≈ 300ms: time for consumers to attach before
    // any audio flows.
    let handle = app
        .start(
            bus.clone(),
            Box::new(scripted_source(2, 30)),
            Arc::new(classifier),
            Arc::new(tuner.clone()),
        )
        .await
        .unwrap();

    let addr = handle.feed_addr();
    let mut audio = connect_feed(addr, Feed::Audio).await;
    let classifier_feed = connect_feed(addr, Feed::Classifier).await;
    let state_feed = connect_feed(addr, Feed::State).await;

    // Audio feed: raw f32le PCM, one 100-sample batch = 400 bytes.
    let mut batch = [0u8; 400];
    tokio::time::timeout(Duration::from_secs(5), audio.read_exact(&mut batch))
        .await
        .expect("audio batch expected")
        .unwrap();
    let sample = f32::from_le_bytes([batch[0], batch[1], batch[2], batch[3]]);
    assert_eq!(sample, 0.25);

    // Classifier feed: one JSON line per window.
    let mut reader = BufReader::new(classifier_feed);
    let mut line = String::new();
    tokio::time::timeout(Duration::from_secs(5), reader.read_line(&mut line))
        .await
        .expect("classification line expected")
        .unwrap();
    let msg = ClassificationMessage::from_json(line.trim()).unwrap();
    assert_eq!(msg.label, Label::Ad);

    // State feed: JSON lines for patience entry, then the hop.
    let mut reader = BufReader::new(state_feed);
    let mut line = String::new();
    tokio::time::timeout(Duration::from_secs(5), reader.read_line(&mut line))
        .await
        .expect("state line expected")
        .unwrap();
    let msg = StateMessage::from_json(line.trim()).unwrap();
    assert_eq!(msg.state, ControlState::PatienceFromPrimary);

    line.clear();
    tokio::time::timeout(Duration::from_secs(5), reader.read_line(&mut line))
        .await
        .expect("second state line expected")
        .unwrap();
    let msg = StateMessage::from_json(line.trim()).unwrap();
    assert_eq!(msg.state, ControlState::Secondary);
    assert_eq!(msg.station, SECONDARY);

    handle.stop().await;
}

#[tokio::test]
async fn consumer_disconnect_does_not_disturb_the_pipeline() {
    let bus = Arc::new(MemoryBus::new());
    let tuner = MockTuner::new();
    let mut state_sub = bus.subscribe(defaults::CHANNEL_STATE).await.unwrap();

    let classifier = MockClassifier::new("scripted").with_script([Label::Ad, Label::Ad]);
    let app = App::new(test_config()).quiet();
    let handle = app
        .start(
            bus.clone(),
            Box::new(scripted_source(2, 30)),
            Arc::new(classifier),
            Arc::new(tuner.clone()),
        )
        .await
        .unwrap();

    // A consumer connects and immediately hangs up mid-stream.
    let audio = connect_feed(handle.feed_addr(), Feed::Audio).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(audio);

    // The pipeline still classifies and hops.
    let _: StateMessage = recv_json(&mut state_sub).await;
    let msg: StateMessage = recv_json(&mut state_sub).await;
    assert_eq!(msg.state, ControlState::Secondary);
    assert_eq!(tuner.retunes(), vec![SECONDARY]);

    handle.stop().await;
}

#[tokio::test]
async fn pipeline_with_zero_consumers_runs_and_stops_cleanly() {
    let bus = Arc::new(MemoryBus::new());
    let tuner = MockTuner::new();
    let mut state_sub = bus.subscribe(defaults::CHANNEL_STATE).await.unwrap();

    let classifier = MockClassifier::new("scripted").with_script([Label::Ad, Label::Ad]);
    let app = App::new(test_config()).quiet();
    let handle = app
        .start(
            bus.clone(),
            Box::new(scripted_source(2, 0)),
            Arc::new(classifier),
            Arc::new(tuner.clone()),
        )
        .await
        .unwrap();

    // Nobody is connected to any feed; the control loop still works.
    let _: StateMessage = recv_json(&mut state_sub).await;
    let msg: StateMessage = recv_json(&mut state_sub).await;
    assert_eq!(msg.state, ControlState::Secondary);

    tokio::time::timeout(Duration::from_secs(5), handle.stop())
        .await
        .expect("pipeline should stop promptly with zero consumers");
}

#[tokio::test]
async fn oracle_failures_drop_windows_but_pipeline_survives() {
    let bus = Arc::new(MemoryBus::new());
    let mut classifier_sub = bus.subscribe(defaults::CHANNEL_CLASSIFIER).await.unwrap();

    let app = App::new(test_config()).quiet();
    let handle = app
        .start(
            bus.clone(),
            Box::new(scripted_source(3, 0)),
            Arc::new(MockClassifier::new("broken").with_failure()),
            Arc::new(MockTuner::new()),
        )
        .await
        .unwrap();

    // Every window fails: nothing is ever published.
    let nothing = tokio::time::timeout(Duration::from_millis(300), classifier_sub.next()).await;
    assert!(nothing.is_err(), "failed windows must publish nothing");

    // And shutdown still works.
    tokio::time::timeout(Duration::from_secs(5), handle.stop())
        .await
        .expect("pipeline should stop promptly after oracle failures");
}
