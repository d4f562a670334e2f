mod common;

use bytes::BytesMut;
use common::{
    DemoMessage, FLAG_FAULT, FLAG_READY, HEARTBEAT_ID, Heartbeat, Recorder, SYNC, Status, Text,
    demo_stack,
};
use fieldwire::field::Field;
use fieldwire::protocol::{Error, ErrorStatus, Message, MessageSet, NoopHandler, Protocol};
use fieldwire::stack::LayerKind;

fn frame_of(mut message: DemoMessage) -> Vec<u8> {
    message.refresh();
    demo_stack().encode(&message).unwrap().to_vec()
}

#[test]
fn test_reference_frame() {
    let mut text = Text::new("");
    text.fields_mut()[0]
        .as_blob_mut()
        .unwrap()
        .set_value(vec![0x01, 0x02]);
    let frame = demo_stack().encode(&DemoMessage::Text(text)).unwrap();
    // Text has id 3; the same layout with id 5 is covered in the crate docs.
    assert_eq!(frame.as_ref(), &[SYNC, 0x03, 0x00, 0x02, 0x01, 0x02, 0x08]);
}

#[test]
fn test_single_frame_consumed_exactly() {
    let frame = frame_of(DemoMessage::Heartbeat(Heartbeat::new(0x0102)));
    assert_eq!(frame, vec![SYNC, 0x01, 0x00, 0x02, 0x01, 0x02, 0x06]);

    let mut protocol = Protocol::new(demo_stack(), Recorder::default());
    let mut buffer = BytesMut::from(&frame[..]);
    let messages = protocol.read(&mut buffer);

    assert_eq!(messages.len(), 1);
    assert!(buffer.is_empty());
    assert_eq!(messages[0].id(), HEARTBEAT_ID);
    assert_eq!(protocol.handler().events, vec!["heartbeat:258"]);
}

#[test]
fn test_truncated_frame_left_buffered() {
    let frame = frame_of(DemoMessage::Text(Text::new("hello")));
    let mut protocol = Protocol::new(demo_stack(), NoopHandler);

    for cut in 1..frame.len() {
        let mut buffer = BytesMut::from(&frame[..cut]);
        assert!(protocol.read(&mut buffer).is_empty(), "cut at {cut}");
        assert_eq!(buffer.len(), cut);
    }
    assert_eq!(protocol.stats().resyncs, 0);

    let mut buffer = BytesMut::from(&frame[..]);
    assert_eq!(protocol.read(&mut buffer).len(), 1);
}

#[test]
fn test_status_fields_on_the_wire() {
    let mut status = Status::new();
    status.flags_mut().set_bits(FLAG_READY | FLAG_FAULT);
    status.set_mode_level(5, 17);
    status.set_temperature(-123);
    let frame = frame_of(DemoMessage::Status(status));

    // flags, mode | level << 3, temperature LE
    let payload = &frame[4..frame.len() - 1];
    assert_eq!(payload, &[0x81, 0x8D, 0x85, 0xFF]);

    let (decoded, used) = demo_stack().decode(&frame).unwrap();
    assert_eq!(used, frame.len());
    let DemoMessage::Status(status) = decoded else {
        panic!("expected status");
    };
    assert!(status.flags().has_all_bits(FLAG_READY | FLAG_FAULT));
    assert_eq!(status.mode(), 5);
    assert_eq!(status.level(), 17);
    assert_eq!(status.temperature(), -123);
}

#[test]
fn test_out_of_range_field_rejected() {
    let mut status = Status::new();
    status.set_temperature(2000);
    assert!(!status.valid());

    let frame = frame_of(DemoMessage::Status(status));
    let err = demo_stack().decode(&frame).unwrap_err();
    assert_eq!(err.status(), ErrorStatus::InvalidMsgData);
}

#[test]
fn test_unknown_id() {
    // id 9, length 0, sum 9
    let err = demo_stack()
        .decode(&[SYNC, 0x09, 0x00, 0x00, 0x09])
        .unwrap_err();
    assert_eq!(err, Error::UnknownMessageId { id: 9 });
    assert_eq!(err.status(), ErrorStatus::ProtocolError);
}

#[test]
fn test_length_mismatch() {
    // Heartbeat payload is two bytes; declare three.
    let frame = [SYNC, 0x01, 0x00, 0x03, 0x00, 0x07, 0xEE, 0xF9];
    let err = demo_stack().decode(&frame).unwrap_err();
    assert_eq!(
        err,
        Error::LengthMismatch {
            declared: 3,
            actual: 2
        }
    );
}

#[test]
fn test_inspect_exposes_framing_fields() {
    let frame = frame_of(DemoMessage::Heartbeat(Heartbeat::new(7)));
    let mut transport = demo_stack().inspect(&frame).unwrap();

    assert_eq!(transport.message_id(), Some(HEARTBEAT_ID));
    assert_eq!(transport.payload(), Some(&[0x00, 0x07][..]));
    assert_eq!(transport.checksum(), Some(u64::from(frame[frame.len() - 1])));
    assert_eq!(
        transport
            .field(LayerKind::Length)
            .and_then(|f| f.as_int())
            .map(|f| f.value()),
        Some(2)
    );
    assert_eq!(transport.encode().unwrap().as_ref(), &frame[..]);
}

#[test]
fn test_transport_prototype() {
    let prototype = demo_stack().transport_message();
    assert_eq!(prototype.length(), 5);
    assert!(prototype.fields().iter().all(Field::valid));
}

#[test]
fn test_from_id_covers_every_message() {
    for id in 1..=3 {
        let msg = DemoMessage::from_id(id).unwrap();
        assert_eq!(msg.id(), id);
        assert!(msg.valid(), "{}", msg.name());
    }
    assert!(DemoMessage::from_id(0).is_none());
}
