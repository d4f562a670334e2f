//! Small demo protocol shared by the integration tests.

#![allow(dead_code)]

use fieldwire::field::{
    AnyField, BitfieldField, BitmaskField, BlobField, Endian, FieldOption, FieldOptions, IntField,
    IntType,
};
use fieldwire::protocol::{Handler, Message, MessageSet};
use fieldwire::stack::{ChecksumKind, ChecksumLayer, IdLayer, LengthLayer, PayloadLayer, Stack, SyncLayer};

pub const SYNC: u8 = 0xAB;

pub const HEARTBEAT_ID: u64 = 1;
pub const STATUS_ID: u64 = 2;
pub const TEXT_ID: u64 = 3;

/// Status flag bits.
pub const FLAG_READY: u64 = 0x01;
pub const FLAG_FAULT: u64 = 0x80;

/// `seq: u16`
#[derive(Debug, Clone)]
pub struct Heartbeat {
    fields: Vec<AnyField>,
}

impl Heartbeat {
    pub fn new(seq: u16) -> Self {
        let mut field = IntField::of(IntType::U16);
        field.set_value(i128::from(seq));
        Self {
            fields: vec![field.into()],
        }
    }

    pub fn seq(&self) -> i128 {
        self.fields[0].as_int().map_or(0, IntField::value)
    }
}

/// `flags: bitmask(1)`, `mode:3 | level:5`, `temperature: i16 LE` (tenths of
/// a degree, -40.0..=125.0).
#[derive(Debug, Clone)]
pub struct Status {
    fields: Vec<AnyField>,
}

impl Status {
    pub fn new() -> Self {
        let flags = BitmaskField::new(FieldOptions::new().fixed_length(1))
            .expect("flags definition");
        let packed = BitfieldField::new(&[3, 5], FieldOptions::new())
            .expect("mode/level definition");
        let options = FieldOptions::resolve([
            FieldOption::Validator(fieldwire::field::Validator::new(|t: &i128| {
                (-400..=1250).contains(t)
            })),
            FieldOption::Endian(Endian::Little),
        ])
        .expect("temperature options");
        let temperature = IntField::new(IntType::I16, options).expect("temperature definition");
        Self {
            fields: vec![flags.into(), packed.into(), temperature.into()],
        }
    }

    pub fn flags(&self) -> &BitmaskField {
        self.fields[0].as_bitmask().expect("flags")
    }

    pub fn flags_mut(&mut self) -> &mut BitmaskField {
        self.fields[0].as_bitmask_mut().expect("flags")
    }

    pub fn mode(&self) -> u64 {
        self.fields[1].as_bitfield().and_then(|f| f.member(0)).unwrap_or(0)
    }

    pub fn level(&self) -> u64 {
        self.fields[1].as_bitfield().and_then(|f| f.member(1)).unwrap_or(0)
    }

    pub fn set_mode_level(&mut self, mode: u64, level: u64) {
        let packed = self.fields[1].as_bitfield_mut().expect("mode/level");
        packed.set_member(0, mode);
        packed.set_member(1, level);
    }

    pub fn temperature(&self) -> i128 {
        self.fields[2].as_int().map_or(0, IntField::value)
    }

    pub fn set_temperature(&mut self, tenths: i128) {
        if let Some(field) = self.fields[2].as_int_mut() {
            field.set_value(tenths);
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::new()
    }
}

/// `text: blob` to the end of the payload.
#[derive(Debug, Clone)]
pub struct Text {
    fields: Vec<AnyField>,
}

impl Text {
    pub fn new(text: &str) -> Self {
        let mut blob = BlobField::variable();
        blob.set_value(text.as_bytes());
        Self {
            fields: vec![blob.into()],
        }
    }

    pub fn text(&self) -> String {
        let bytes = self.fields[0].as_blob().map_or(&[][..], BlobField::value);
        String::from_utf8_lossy(bytes).into_owned()
    }
}

macro_rules! impl_message {
    ($ty:ident, $id:expr) => {
        impl Message for $ty {
            fn id(&self) -> u64 {
                $id
            }

            fn name(&self) -> &'static str {
                stringify!($ty)
            }

            fn fields(&self) -> &[AnyField] {
                &self.fields
            }

            fn fields_mut(&mut self) -> &mut [AnyField] {
                &mut self.fields
            }
        }
    };
}

impl_message!(Heartbeat, HEARTBEAT_ID);
impl_message!(Status, STATUS_ID);
impl_message!(Text, TEXT_ID);

/// Every message of the demo protocol.
#[derive(Debug, Clone)]
pub enum DemoMessage {
    Heartbeat(Heartbeat),
    Status(Status),
    Text(Text),
}

impl DemoMessage {
    fn inner(&self) -> &dyn Message {
        match self {
            Self::Heartbeat(msg) => msg,
            Self::Status(msg) => msg,
            Self::Text(msg) => msg,
        }
    }

    /// Route to the matching callback of `handler`.
    pub fn dispatch<H: DemoHandler + ?Sized>(&self, handler: &mut H) {
        match self {
            Self::Heartbeat(msg) => handler.handle_heartbeat(msg),
            Self::Status(msg) => handler.handle_status(msg),
            Self::Text(msg) => handler.handle_text(msg),
        }
    }
}

impl Message for DemoMessage {
    fn id(&self) -> u64 {
        self.inner().id()
    }

    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn fields(&self) -> &[AnyField] {
        self.inner().fields()
    }

    fn fields_mut(&mut self) -> &mut [AnyField] {
        match self {
            Self::Heartbeat(msg) => msg.fields_mut(),
            Self::Status(msg) => msg.fields_mut(),
            Self::Text(msg) => msg.fields_mut(),
        }
    }
}

impl MessageSet for DemoMessage {
    fn from_id(id: u64) -> Option<Self> {
        match id {
            HEARTBEAT_ID => Some(Self::Heartbeat(Heartbeat::new(0))),
            STATUS_ID => Some(Self::Status(Status::new())),
            TEXT_ID => Some(Self::Text(Text::new(""))),
            _ => None,
        }
    }
}

/// Visitor over the demo messages; callbacks fall back to `handle_default`.
pub trait DemoHandler {
    fn handle_default(&mut self, msg: &dyn Message);

    fn handle_heartbeat(&mut self, msg: &Heartbeat) {
        self.handle_default(msg);
    }

    fn handle_status(&mut self, msg: &Status) {
        self.handle_default(msg);
    }

    fn handle_text(&mut self, msg: &Text) {
        self.handle_default(msg);
    }
}

/// Records one line per handled message.
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<String>,
}

impl DemoHandler for Recorder {
    fn handle_default(&mut self, msg: &dyn Message) {
        self.events.push(format!("default:{}", msg.name()));
    }

    fn handle_heartbeat(&mut self, msg: &Heartbeat) {
        self.events.push(format!("heartbeat:{}", msg.seq()));
    }

    fn handle_status(&mut self, msg: &Status) {
        self.events
            .push(format!("status:{}:{}:{}", msg.mode(), msg.level(), msg.temperature()));
    }
}

impl Handler<DemoMessage> for Recorder {
    fn handle(&mut self, message: &DemoMessage) {
        message.dispatch(self);
    }
}

/// `[SYNC 0xAB] [ID u8] [LENGTH u16 BE] [PAYLOAD] [SUM8 over ID..PAYLOAD]`
pub fn demo_stack() -> Stack<DemoMessage> {
    Stack::builder()
        .layer(SyncLayer::new([SYNC]).expect("sync"))
        .layer(ChecksumLayer::new(ChecksumKind::Sum8))
        .layer(IdLayer::new(1).expect("id"))
        .layer(LengthLayer::new(2).expect("length"))
        .layer(PayloadLayer)
        .build()
        .expect("demo stack")
}

/// Deterministic byte source for chunking and corruption.
#[derive(Default)]
pub struct Lcg(pub u64);

impl Lcg {
    pub fn next(&mut self) -> u64 {
        const A: u64 = 6364136223846793005;
        const C: u64 = 1442695040888963407;
        self.0 = self.0.wrapping_mul(A).wrapping_add(C);
        self.0 >> 33
    }
}
