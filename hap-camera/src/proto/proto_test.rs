use super::*;
use crate::message::*;
use crate::sender::mock::{Call, MockSender};
use sansio::Protocol;
use tlv8::Tlv8;

const SESSION: [u8; 16] = [0x42; 16];

fn setup_request(session: &[u8]) -> Vec<u8> {
    let srtp_params = Tlv8::new()
        .with(srtp::CRYPTO_SUITE, [CryptoSuite::AesCm128HmacSha1_80 as u8])
        .with(srtp::MASTER_KEY, [0x01; 16])
        .with(srtp::MASTER_SALT, [0x02; 14]);
    Tlv8::new()
        .with(setup::SESSION_ID, session)
        .with_nested(
            setup::ADDRESS,
            &Tlv8::new()
                .with(address::IP_VERSION, [IpVersion::V4 as u8])
                .with(address::ADDRESS, "192.168.1.30")
                .with(address::VIDEO_RTP_PORT, 50100u16.to_le_bytes())
                .with(address::AUDIO_RTP_PORT, 50102u16.to_le_bytes()),
        )
        .with_nested(setup::VIDEO_SRTP_PARAMS, &srtp_params)
        .with_nested(setup::AUDIO_SRTP_PARAMS, &srtp_params)
        .encode()
        .to_vec()
}

fn selection(session: &[u8], kind: u8) -> Vec<u8> {
    Tlv8::new()
        .with_nested(
            selected::SESSION,
            &Tlv8::new()
                .with(session_control::SESSION_ID, session)
                .with(session_control::COMMAND, [kind]),
        )
        .encode()
        .to_vec()
}

fn write(characteristic: Characteristic, raw: &[u8]) -> CharacteristicWrite {
    CharacteristicWrite {
        characteristic,
        value: to_base64(raw),
    }
}

fn drain(camera: &mut CameraStreamManagement<MockSender>) -> (Vec<CharacteristicValue>, Vec<CameraEvent>) {
    let mut values = vec![];
    while let Some(value) = camera.poll_write() {
        values.push(value);
    }
    let mut events = vec![];
    while let Some(event) = camera.poll_event() {
        events.push(event);
    }
    (values, events)
}

fn new_camera() -> CameraStreamManagement<MockSender> {
    let mut camera = CameraStreamManagement::new(CameraConfig::default(), MockSender::default());
    drain(&mut camera);
    camera
}

#[test]
fn test_new_publishes_capabilities() {
    let mut camera = CameraStreamManagement::new(CameraConfig::default(), MockSender::default());
    let (values, events) = drain(&mut camera);

    assert_eq!(values.len(), 4);
    assert_eq!(
        values[0],
        CharacteristicValue::new(Characteristic::SupportedRtpConfiguration, &[0x02, 0x01, 0x00])
    );
    assert_eq!(
        values[1].decode().unwrap(),
        camera.capabilities().video.to_vec()
    );
    assert_eq!(
        values[2].decode().unwrap(),
        camera.capabilities().audio.to_vec()
    );
    assert_eq!(values[3].characteristic, Characteristic::StreamingStatus);
    assert_eq!(values[3].value, "AQEA");
    assert!(events.is_empty());

    assert_eq!(camera.value(Characteristic::SetupEndpoints), None);
    assert_eq!(camera.value(Characteristic::SelectedRtpStreamConfiguration), None);
    assert_eq!(camera.poll_timeout(), None);
}

#[test]
fn test_setup_publishes_response() {
    let mut camera = new_camera();
    camera
        .handle_read(write(Characteristic::SetupEndpoints, &setup_request(&SESSION)))
        .unwrap();

    let (values, events) = drain(&mut camera);
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].characteristic, Characteristic::SetupEndpoints);
    assert_eq!(
        camera.value(Characteristic::SetupEndpoints),
        Some(values[0].value.clone())
    );

    let response = Tlv8::decode(&values[0].decode().unwrap()).unwrap();
    assert_eq!(&response.get(setup::SESSION_ID, "id").unwrap()[..], &SESSION);
    assert_eq!(
        events,
        vec![CameraEvent::SessionConfigured(SessionId::new(SESSION))]
    );
    assert!(camera.sessions().contains(&SessionId::new(SESSION)));
}

#[test]
fn test_start_stop_publishes_status() {
    let mut camera = new_camera();
    let id = SessionId::new(SESSION);
    camera.negotiate(&setup_request(&SESSION)).unwrap();
    drain(&mut camera);

    camera
        .handle_read(write(
            Characteristic::SelectedRtpStreamConfiguration,
            &selection(&SESSION, 1),
        ))
        .unwrap();
    let (values, events) = drain(&mut camera);
    assert_eq!(
        values,
        vec![CharacteristicValue::new(
            Characteristic::StreamingStatus,
            &[0x01, 0x01, 0x01]
        )]
    );
    assert_eq!(
        events,
        vec![
            CameraEvent::StreamStarted(id.clone()),
            CameraEvent::StreamingStatusChanged(StreamingStatus::Streaming),
        ]
    );
    assert_eq!(camera.streaming_status(), StreamingStatus::Streaming);
    assert!(camera.value(Characteristic::SelectedRtpStreamConfiguration).is_some());

    camera.handle_selected_configuration(&selection(&SESSION, 0)).unwrap();
    let (values, events) = drain(&mut camera);
    assert_eq!(values[0].value, "AQEA");
    assert_eq!(
        events,
        vec![
            CameraEvent::StreamStopped(id.clone()),
            CameraEvent::StreamingStatusChanged(StreamingStatus::Available),
        ]
    );
    assert!(camera.sessions().is_empty());
    assert_eq!(camera.sender().calls().len(), 2);
}

#[test]
fn test_unknown_kind_publishes_nothing() {
    let mut camera = new_camera();
    camera.negotiate(&setup_request(&SESSION)).unwrap();
    camera.handle_selected_configuration(&selection(&SESSION, 1)).unwrap();
    drain(&mut camera);

    let result = camera.handle_selected_configuration(&selection(&SESSION, 9));
    assert_eq!(result, Err(Error::ErrUnsupportedRequestKind(9)));
    let (values, events) = drain(&mut camera);
    assert!(values.is_empty());
    assert!(events.is_empty());
    assert_eq!(camera.streaming_status(), StreamingStatus::Streaming);
}

#[test]
fn test_setup_again_releases_stream() {
    let mut camera = new_camera();
    camera.negotiate(&setup_request(&SESSION)).unwrap();
    camera.handle_selected_configuration(&selection(&SESSION, 1)).unwrap();
    drain(&mut camera);
    assert_eq!(camera.sender().live_count(), 1);

    camera.negotiate(&setup_request(&SESSION)).unwrap();
    assert_eq!(camera.sender().live_count(), 0);
    assert_eq!(camera.streaming_status(), StreamingStatus::Available);

    let (values, events) = drain(&mut camera);
    assert_eq!(values.len(), 2);
    assert_eq!(values[1].value, "AQEA");
    assert_eq!(
        events[1],
        CameraEvent::StreamingStatusChanged(StreamingStatus::Available)
    );
}

#[test]
fn test_read_only_characteristic() {
    let mut camera = new_camera();
    let result = camera.handle_read(write(Characteristic::StreamingStatus, &[0x01, 0x01, 0x01]));
    assert!(matches!(result, Err(Error::Other(_))));
    assert_eq!(camera.streaming_status(), StreamingStatus::Available);
}

#[test]
fn test_invalid_base64() {
    let mut camera = new_camera();
    let result = camera.handle_read(CharacteristicWrite {
        characteristic: Characteristic::SetupEndpoints,
        value: "%%%".to_string(),
    });
    assert!(matches!(result, Err(Error::Base64(_))));
    assert!(camera.sessions().is_empty());
}

#[test]
fn test_close_stops_everything() {
    let mut camera = new_camera();
    camera.negotiate(&setup_request(&SESSION)).unwrap();
    camera.handle_selected_configuration(&selection(&SESSION, 1)).unwrap();
    drain(&mut camera);

    camera.close().unwrap();
    assert!(camera.sessions().is_empty());
    assert_eq!(camera.sender().live_count(), 0);
    assert!(matches!(camera.sender().calls()[1], Call::Stop(Some(1))));

    let (values, _) = drain(&mut camera);
    assert_eq!(values.last().map(|v| v.value.as_str()), Some("AQEA"));

    let result = camera.handle_read(write(Characteristic::SetupEndpoints, &setup_request(&SESSION)));
    assert_eq!(result, Err(Error::ErrClosed));
    assert!(camera.close().is_ok());
}

struct FixedSnapshot;

impl SnapshotProvider for FixedSnapshot {
    fn snapshot(&mut self, width: u16, height: u16) -> Result<Bytes> {
        Ok(Bytes::from(format!("{width}x{height}")))
    }
}

#[test]
fn test_snapshot() {
    let mut camera = new_camera();
    assert_eq!(camera.get_snapshot(640, 480), Err(Error::ErrNoSnapshotProvider));

    let mut camera = camera.with_snapshot_provider(Box::new(FixedSnapshot));
    assert_eq!(&camera.get_snapshot(640, 480).unwrap()[..], b"640x480");
}
