//! End-to-end request/response over serial channel 0

use error_manager::ErrorDetailsResponse;
use message_router::{MessageHeader, Payload};
use power_controller::{modules, serial_update, sys, App, BoardError, ControllerConfig};
use serial_protocol::{
    decode_response, encode_command, frame_crc, SerialConfig, StatisticsResponse, UartHandle,
};
use soft_timer::Timebase;

struct Harness {
    app: App,
    clock: Timebase,
    uart: UartHandle,
    next_id: u16,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    fn with_config(config: ControllerConfig) -> Self {
        let clock = Timebase::new();
        let app = App::init(&config, clock.clone()).unwrap();
        let uart = app.board.serial.channel(0).unwrap().uart();
        Self {
            app,
            clock,
            uart,
            next_id: 1,
        }
    }

    fn config(&self) -> SerialConfig {
        self.app.board.serial.config().clone()
    }

    fn send_raw(&mut self, bytes: &[u8]) {
        assert_eq!(self.uart.receive(bytes), bytes.len());
    }

    fn send(&mut self, module: u16, command: u16, data: &[u8]) -> MessageHeader {
        let header = MessageHeader::new(module, command, self.next_id);
        self.next_id += 1;
        let mut out = [0u8; 128];
        let len = encode_command(&header, data, 0, &mut out).unwrap();
        self.send_raw(&out[..len]);
        header
    }

    fn run(&mut self) {
        self.clock.advance(1);
        serial_update(&mut self.app);
    }

    fn output(&self) -> Vec<u8> {
        let mut out = vec![0u8; 512];
        let len = self.uart.transmit(&mut out);
        out.truncate(len);
        out
    }

    fn reply(&self) -> (MessageHeader, Vec<u8>) {
        decode_response(&self.output(), &self.config()).unwrap()
    }

    fn request(&mut self, module: u16, command: u16, data: &[u8]) -> Vec<u8> {
        let header = self.send(module, command, data);
        self.run();
        let (reply, payload) = self.reply();
        assert_eq!(reply, header);
        payload
    }
}

#[test]
fn test_sys_identity() {
    let mut h = Harness::new();
    let version = h.request(modules::SYS, sys::commands::GET_APPLICATION_VERSION, &[]);
    assert_eq!(version, vec![0, 0, 0, 0, 1, 0]);

    let id = h.request(modules::SYS, sys::commands::GET_PRODUCT_ID, &[]);
    assert_eq!(u16::from_le_bytes([id[0], id[1]]), 28388);

    let name = h.request(modules::SYS, sys::commands::GET_PRODUCT_NAME, &[]);
    assert_eq!(name.len(), sys::PRODUCT_NAME_SIZE);
    assert!(name.starts_with(b"PowerCore\0"));
}

#[test]
fn test_uptime_follows_tick() {
    let mut h = Harness::new();
    h.clock.set(4_999);
    let uptime = h.request(modules::SYS, sys::commands::GET_UPTIME_MILLISECONDS, &[]);
    assert_eq!(uptime, 5_000u32.to_le_bytes());
}

#[test]
fn test_exact_reply_bytes() {
    let mut h = Harness::new();
    h.send(modules::SYS, sys::commands::GET_PRODUCT_ID, &[]);
    h.run();

    let header = MessageHeader::new(modules::SYS, sys::commands::GET_PRODUCT_ID, 1);
    let data = 28388u16.to_le_bytes();
    let crc = frame_crc(0, &header, &data);
    let expected = format!(
        ">01020102{:02X}{:02X}{:02X}{:02X}\r",
        data[0],
        data[1],
        crc & 0xFF,
        crc >> 8
    );
    assert_eq!(h.output(), expected.into_bytes());
}

#[test]
fn test_error_manager_over_the_wire() {
    let mut h = Harness::new();
    let over_temp = BoardError::OverTemp as u8;

    h.clock.set(1_000);
    let reply = h.request(
        modules::ERROR_MANAGER,
        error_manager::commands::SET_ERROR_STATE,
        &[over_temp, 0, 1, 0],
    );
    assert!(reply.is_empty());
    assert!(h.app.board.errors.do_any_critical_errors_exist());

    let flags = h.request(modules::ERROR_MANAGER, error_manager::commands::GET_ALL_ERRORS, &[]);
    assert_eq!(flags, (1u32 << over_temp).to_le_bytes());

    h.clock.set(1_500);
    let details = h.request(
        modules::ERROR_MANAGER,
        error_manager::commands::GET_ERROR_DETAILS,
        &[over_temp, 0],
    );
    let details = ErrorDetailsResponse::read_from(&details);
    assert!(details.details.is_critical);
    assert_eq!(details.details.current.module_id.0, modules::ERROR_MANAGER);
    assert_eq!(details.details.current.timestamp, 1_001);
    assert_eq!(details.details.current.age, 500);

    h.request(modules::ERROR_MANAGER, error_manager::commands::CLEAR_ALL_ERRORS, &[]);
    let exist = h.request(modules::ERROR_MANAGER, error_manager::commands::DO_ERRORS_EXIST, &[]);
    assert_eq!(exist, vec![0, 0]);
}

#[test]
fn test_unknown_module_and_command() {
    let mut h = Harness::new();
    assert!(h.request(0x55, 0x01, &[]).is_empty());
    assert!(h.request(modules::SYS, 0x40, &[]).is_empty());
    // Reserved rows answer empty without running anything
    assert!(h.request(modules::SYS, sys::commands::RESET, &[]).is_empty());
}

#[test]
fn test_corrupted_crc_gets_empty_reply() {
    let mut h = Harness::new();
    let header = MessageHeader::new(modules::SYS, sys::commands::GET_PRODUCT_ID, 9);
    let mut out = [0u8; 64];
    let len = encode_command(&header, &[], 0, &mut out).unwrap();
    // Flip one CRC digit
    out[len - 2] = if out[len - 2] == b'0' { b'1' } else { b'0' };
    h.send_raw(&out[..len]);
    h.run();

    let (reply, data) = h.reply();
    assert_eq!(reply, header);
    assert!(data.is_empty());
}

#[test]
fn test_recovers_after_garbage() {
    let mut h = Harness::new();
    h.send_raw(b"noise<01zz");
    let header = h.send(modules::SYS, sys::commands::GET_PRODUCT_ID, &[]);
    h.run();

    let (reply, data) = h.reply();
    assert_eq!(reply, header);
    assert_eq!(data, 28388u16.to_le_bytes());
}

#[test]
fn test_one_frame_per_update() {
    let mut h = Harness::new();
    let first = h.send(modules::SYS, sys::commands::GET_PRODUCT_ID, &[]);
    let second = h.send(modules::SYS, sys::commands::GET_UPTIME_MILLISECONDS, &[]);

    h.run();
    assert_eq!(h.reply().0, first);
    h.run();
    assert_eq!(h.reply().0, second);
    h.run();
    assert!(h.output().is_empty());
}

#[test]
fn test_serial_statistics_over_the_wire() {
    let mut h = Harness::new();
    h.request(modules::SYS, sys::commands::GET_PRODUCT_ID, &[]);
    let stats = h.request(
        modules::SERIAL,
        serial_protocol::commands::GET_SERIAL_STATISTICS,
        &[0, 0],
    );
    let stats = StatisticsResponse::read_from(&stats);
    assert_eq!(stats.messages_received, 2);
    assert_eq!(stats.messages_sent, 1);
    assert_eq!(stats.ms_since_last_message, 0);
}

#[test]
fn test_ignore_crc_policy() {
    let mut config = ControllerConfig::default();
    config.serial.crc_policy = serial_protocol::CrcPolicy::Ignore;
    config.serial.response_crc = false;
    let mut h = Harness::with_config(config);

    // Length mismatch is still answered, with no data
    h.send_raw(b"<0102050000000\r");
    h.run();
    let (reply, data) = h.reply();
    assert_eq!(reply, MessageHeader::new(1, 2, 5));
    assert!(data.is_empty());

    h.send_raw(b"<010205000000\r");
    h.run();
    let (reply, data) = h.reply();
    assert_eq!(reply, MessageHeader::new(1, 2, 5));
    assert_eq!(data, 28388u16.to_le_bytes());
}
